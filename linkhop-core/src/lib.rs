// Linkhop Core
//
// Link-resolution pipeline for file-hosting and video-hosting pages.
//
// Flow:
//   ResolutionRequest
//     -> StrategyRegistry::select      (first registered strategy whose domain matches)
//     -> Strategy::fetch_page          (initial fetch, fatal on failure)
//     -> Strategy::extract             (zero or more RawCandidates, classified by SourceFamily)
//     -> ChainFollower::follow         (per-candidate hop, failures isolated)
//     -> StreamNormalizer              (quality, display name, absolute-URL check, dedup)
//     -> ResolutionSink                (streams and subtitles on separate channels)
//
// Concrete strategies live in `linkhop-hosts`.

pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod quality;
pub mod registry;
pub mod resolver;
pub mod strategy;
pub mod text;

pub use config::{Config, LoggingConfig, ResolveConfig};
pub use context::ResolveContext;
pub use error::{FetchError, ResolveError, Result};
pub use fetch::{CannedResponse, FetchRequest, FetchedPage, HttpFetcher, MemoryFetcher, PageFetcher};
pub use model::{
    CandidateFailure, Hop, HopOutcome, RawCandidate, RedirectProbe, Resolution,
    ResolutionRequest, ResolutionSink, ResolvedLink, SourceFamily, StreamDescriptor,
    SubtitleDescriptor,
};
pub use quality::QualityRank;
pub use registry::{StrategyRegistry, StrategyRegistryBuilder};
pub use resolver::Resolver;
pub use strategy::{Extraction, Strategy};
