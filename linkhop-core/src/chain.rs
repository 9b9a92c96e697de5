// Chain Follower
//
// Turns one candidate into direct links by running its hop: nothing for
// direct links, a manual redirect walk for probes, or a second fetch plus the
// strategy's embed pass for embed pages.

use tracing::debug;

use crate::context::ResolveContext;
use crate::error::FetchError;
use crate::model::{Hop, HopOutcome, RawCandidate, RedirectProbe};
use crate::strategy::Strategy;
use crate::text::{absolutize, param_value};

/// Hop runner for candidates found on one page
pub struct ChainFollower<'a> {
    ctx: ResolveContext<'a>,
    strategy: &'a dyn Strategy,
    /// Page the candidates came from, sent as referer on every hop
    page_url: &'a str,
}

impl<'a> ChainFollower<'a> {
    #[must_use]
    pub const fn new(
        ctx: ResolveContext<'a>,
        strategy: &'a dyn Strategy,
        page_url: &'a str,
    ) -> Self {
        Self {
            ctx,
            strategy,
            page_url,
        }
    }

    /// Run the candidate's hop.
    ///
    /// `Hop::Delegate` yields nothing here; delegation needs the registry and
    /// is handled by the resolver.
    pub async fn follow(&self, candidate: &RawCandidate) -> Result<HopOutcome, FetchError> {
        match candidate.hop {
            Hop::Direct => Ok(HopOutcome::single(
                candidate.href.as_str(),
                candidate.label.clone(),
            )),
            Hop::RedirectProbe(probe) => {
                let url = self.probe(&candidate.href, probe).await?;
                Ok(HopOutcome::single(url, candidate.label.clone()))
            }
            Hop::EmbedPage => {
                let page = self
                    .ctx
                    .fetch(&candidate.href, Some(self.page_url), true)
                    .await?;
                Ok(self.strategy.extract_embed(&page, candidate))
            }
            Hop::Delegate => Ok(HopOutcome::default()),
        }
    }

    /// Walk redirect headers without letting the client follow them.
    ///
    /// Returns an empty string when the header is missing or the chain runs
    /// past `max_redirect_hops`; the normalizer drops empty URLs.
    pub async fn probe(&self, link: &str, probe: RedirectProbe) -> Result<String, FetchError> {
        let mut current = match probe.path_suffix {
            Some(suffix) => format!("{}{suffix}", link.trim_end_matches('/')),
            None => link.to_string(),
        };

        for _ in 0..self.ctx.config.max_redirect_hops {
            let response = self.ctx.fetch(&current, Some(self.page_url), false).await?;

            let Some(raw) = response.header(probe.header).map(str::trim).filter(|v| !v.is_empty())
            else {
                debug!(url = %current, header = probe.header, "redirect header missing");
                return Ok(String::new());
            };

            let target = if probe.join_base {
                absolutize(&current, raw).unwrap_or_default()
            } else {
                raw.to_string()
            };

            match probe.stop_param {
                None => return Ok(target),
                Some(param) => {
                    if let Some(value) = param_value(&target, param) {
                        return Ok(value);
                    }
                    current = target;
                }
            }
        }

        debug!(
            link,
            max_hops = self.ctx.config.max_redirect_hops,
            "redirect chain too long"
        );
        Ok(String::new())
    }
}
