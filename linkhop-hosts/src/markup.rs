//! scraper helpers shared by the markup strategies

use linkhop_core::text::{absolutize, collapse_whitespace};
use scraper::{ElementRef, Html, Selector};

/// Visible text of an element with whitespace collapsed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text of the first match, if it has any
pub(crate) fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// `href` of the first match, made absolute against `base`
pub(crate) fn first_href(document: &Html, selector: &Selector, base: &str) -> Option<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr("href"))
        .find_map(|href| absolutize(base, href))
}
