// Strategy Registry
//
// Immutable, ordered list of strategies built once at startup

use std::sync::Arc;

use crate::error::{ResolveError, Result};
use crate::strategy::Strategy;

/// Ordered strategy registry
///
/// Selection walks the strategies in registration order and the first one
/// whose `matches()` accepts the URL wins, so registration order is the
/// tie-break for overlapping domains. The registry cannot change after
/// `build()`, so it can be shared between tasks without locking.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: Arc<Vec<Arc<dyn Strategy>>>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn builder() -> StrategyRegistryBuilder {
        StrategyRegistryBuilder::default()
    }

    /// Strategy responsible for `url`
    pub fn select(&self, url: &str) -> Result<Arc<dyn Strategy>> {
        self.strategies
            .iter()
            .find(|strategy| strategy.matches(url))
            .cloned()
            .ok_or_else(|| ResolveError::UnsupportedUrl(url.to_string()))
    }

    /// Strategy names in priority order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// Collects strategies before the registry is frozen
#[derive(Default)]
pub struct StrategyRegistryBuilder {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl StrategyRegistryBuilder {
    /// Append a strategy; earlier registrations take priority
    #[must_use]
    pub fn register<S>(mut self, strategy: S) -> Self
    where
        S: Strategy + 'static,
    {
        self.strategies.push(Arc::new(strategy));
        self
    }

    #[must_use]
    pub fn build(self) -> StrategyRegistry {
        StrategyRegistry {
            strategies: Arc::new(self.strategies),
        }
    }
}
