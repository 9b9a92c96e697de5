// Resolution Pipeline
//
// select -> fetch_page -> extract -> follow hops -> normalize -> sink

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt};
use tracing::{debug, info, warn};

use crate::chain::ChainFollower;
use crate::config::ResolveConfig;
use crate::context::ResolveContext;
use crate::error::{ResolveError, Result};
use crate::fetch::PageFetcher;
use crate::model::{
    CandidateFailure, Hop, HopOutcome, RawCandidate, Resolution, ResolutionRequest,
    ResolutionSink,
};
use crate::normalize::{is_media_url, PageMeta, StreamNormalizer};
use crate::registry::StrategyRegistry;

/// What one candidate turned into
enum CandidateOutput {
    Hop(HopOutcome),
    Delegated(Resolution),
}

/// Resolves page URLs into stream and subtitle descriptors
///
/// Holds only immutable state, so one resolver can serve concurrent calls.
#[derive(Clone)]
pub struct Resolver {
    registry: StrategyRegistry,
    fetcher: Arc<dyn PageFetcher>,
    config: ResolveConfig,
}

impl Resolver {
    pub fn new(
        registry: StrategyRegistry,
        fetcher: Arc<dyn PageFetcher>,
        config: ResolveConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            config,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Resolve a request and collect everything it produced.
    ///
    /// Streams keep page order unless `rank_by_quality` is set.
    pub async fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution> {
        let mut resolution = Resolution::default();
        self.resolve_into(request, &mut resolution).await?;
        if self.config.rank_by_quality {
            resolution.rank_by_quality();
        }
        Ok(resolution)
    }

    /// Resolve a request, pushing descriptors into `sink` in page order.
    ///
    /// Fails only when no strategy claims the URL, a required referer is
    /// missing, or the initial page fetch fails. Candidate failures go to
    /// `ResolutionSink::on_failure` and never stop their siblings.
    pub async fn resolve_into(
        &self,
        request: &ResolutionRequest,
        sink: &mut dyn ResolutionSink,
    ) -> Result<()> {
        if self.config.require_referer && request.referer().is_none() {
            return Err(ResolveError::MissingReferer(request.page_url.clone()));
        }
        self.run(request, 0, sink).await
    }

    fn run<'a>(
        &'a self,
        request: &'a ResolutionRequest,
        depth: usize,
        sink: &'a mut dyn ResolutionSink,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let strategy = self.registry.select(&request.page_url)?;
            let ctx = ResolveContext::new(request, self.fetcher.as_ref(), &self.config);

            let page = strategy.fetch_page(&ctx).await.map_err(|e| {
                warn!(
                    strategy = strategy.name(),
                    url = %request.page_url,
                    error = %e,
                    "Initial page fetch failed"
                );
                e
            })?;

            let extraction = strategy.extract(&page);
            debug!(
                strategy = strategy.name(),
                url = %page.final_url,
                candidates = extraction.candidates.len(),
                subtitles = extraction.subtitles.len(),
                depth,
                "Extracted page"
            );

            let meta = PageMeta {
                strategy: strategy.name(),
                title: extraction.title.as_deref(),
                size: extraction.size.as_deref(),
                header: extraction.header.as_deref(),
                page_url: &page.final_url,
                referer: request.referer().unwrap_or(page.final_url.as_str()),
            };
            let mut normalizer = StreamNormalizer::new();

            for subtitle in extraction.subtitles.iter().cloned() {
                if let Some(subtitle) = normalizer.subtitle(&meta, subtitle) {
                    sink.on_subtitle(subtitle);
                }
            }

            let follower = ChainFollower::new(ctx, strategy.as_ref(), &page.final_url);
            let outputs: Vec<_> = stream::iter(0..extraction.candidates.len())
                .map(|index| {
                    let candidate = &extraction.candidates[index];
                    let follower = &follower;
                    let page_url = page.final_url.as_str();
                    async move {
                        let output = self.follow(follower, candidate, page_url, depth).await;
                        (index, candidate, output)
                    }
                })
                .buffered(self.config.max_concurrent_hops.max(1))
                .collect()
                .await;

            let mut emitted = 0usize;
            for (index, candidate, output) in outputs {
                match output {
                    Ok(CandidateOutput::Hop(outcome)) => {
                        for link in &outcome.links {
                            if let Some(stream) = normalizer.stream(&meta, candidate, link) {
                                sink.on_stream(stream);
                                emitted += 1;
                            }
                        }
                        for subtitle in outcome.subtitles {
                            if let Some(subtitle) = normalizer.subtitle(&meta, subtitle) {
                                sink.on_subtitle(subtitle);
                            }
                        }
                    }
                    Ok(CandidateOutput::Delegated(resolution)) => {
                        for stream in resolution.streams {
                            if let Some(stream) = normalizer.admit(stream) {
                                sink.on_stream(stream);
                                emitted += 1;
                            }
                        }
                        for subtitle in resolution.subtitles {
                            if let Some(subtitle) = normalizer.subtitle(&meta, subtitle) {
                                sink.on_subtitle(subtitle);
                            }
                        }
                        for failure in resolution.failures {
                            sink.on_failure(CandidateFailure {
                                index,
                                server: candidate.server.clone(),
                                url: failure.url,
                                reason: failure.reason,
                            });
                        }
                    }
                    Err(e) => {
                        warn!(
                            strategy = strategy.name(),
                            server = %candidate.server,
                            url = %candidate.href,
                            error = %e,
                            "Candidate failed"
                        );
                        sink.on_failure(CandidateFailure {
                            index,
                            server: candidate.server.clone(),
                            url: candidate.href.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            info!(
                strategy = strategy.name(),
                url = %request.page_url,
                streams = emitted,
                depth,
                "Resolved page"
            );
            Ok(())
        }
        .boxed()
    }

    async fn follow(
        &self,
        follower: &ChainFollower<'_>,
        candidate: &RawCandidate,
        page_url: &str,
        depth: usize,
    ) -> Result<CandidateOutput> {
        if candidate.hop == Hop::Delegate {
            return self.delegate(candidate, page_url, depth).await;
        }
        Ok(CandidateOutput::Hop(follower.follow(candidate).await?))
    }

    /// Generic best-effort resolution for links no classifier recognized.
    ///
    /// Re-enters the registry while depth allows; otherwise, or when no
    /// strategy claims the link, keeps it only if it points at a media file.
    async fn delegate(
        &self,
        candidate: &RawCandidate,
        page_url: &str,
        depth: usize,
    ) -> Result<CandidateOutput> {
        let claimed = depth < self.config.max_delegation_depth
            && self.registry.select(&candidate.href).is_ok();

        if claimed {
            let request = ResolutionRequest::new(candidate.href.as_str()).with_referer(page_url);
            let mut nested = Resolution::default();
            self.run(&request, depth + 1, &mut nested).await?;
            return Ok(CandidateOutput::Delegated(nested));
        }

        if is_media_url(&candidate.href) {
            return Ok(CandidateOutput::Hop(HopOutcome::single(
                candidate.href.as_str(),
                candidate.label.clone(),
            )));
        }

        debug!(url = %candidate.href, depth, "No strategy for delegated link, skipping");
        Ok(CandidateOutput::Hop(HopOutcome::default()))
    }
}
