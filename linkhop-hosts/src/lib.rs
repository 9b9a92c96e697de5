// Linkhop Hosts
//
// Concrete extraction strategies for file-hosting and video-hosting sites.
// Each module owns one backend family; `default_registry()` wires them in
// priority order.

mod classify;
mod markup;

pub mod gdflix;
pub mod hubcloud;
pub mod pixeldrain;
pub mod player_embed;

pub use gdflix::GdFlix;
pub use hubcloud::HubCloud;
pub use pixeldrain::PixelDrain;
pub use player_embed::PlayerEmbed;

use linkhop_core::StrategyRegistry;

/// Registry with every built-in strategy.
///
/// Order matters only for URLs several strategies could claim; the first
/// registered match wins:
/// 1. PixelDrain (no page fetch)
/// 2. HubCloud
/// 3. GDFlix
/// 4. PlayerEmbed
#[must_use]
pub fn default_registry() -> StrategyRegistry {
    StrategyRegistry::builder()
        .register(PixelDrain)
        .register(HubCloud)
        .register(GdFlix)
        .register(PlayerEmbed)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry();
        assert_eq!(registry.names(), ["PixelDrain", "HubCloud", "GDFlix", "PlayerEmbed"]);
    }

    #[test]
    fn test_selection() {
        let registry = default_registry();
        let cases = [
            ("https://pixeldrain.com/u/abc", "PixelDrain"),
            ("https://hubcloud.one/drive/abc", "HubCloud"),
            ("https://new4.gdflix.dad/file/abc", "GDFlix"),
            ("https://streamwish.to/e/abc", "PlayerEmbed"),
            ("https://vidhidepro.com/v/abc", "PlayerEmbed"),
        ];
        for (url, expected) in cases {
            assert_eq!(registry.select(url).unwrap().name(), expected, "{url}");
        }
        assert!(registry.select("https://example.com/").is_err());
    }
}
