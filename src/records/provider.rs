//! Interfaces to the external analysis and load-order services, plus the
//! resolver that turns their output into override chains.

use tracing::{debug, warn};

use super::chain::{RecordAnalysisChain, Sourced};
use super::key::{RecordKey, RecordKeyLike};
use crate::error::Result;

/// Source of per-plugin record analyses.
pub trait AnalysisProvider<T>: Send + Sync {
    /// Every record key known to the load order.
    fn record_keys(&self) -> Vec<RecordKey>;

    /// Analyses of one record, ordered by load order (earliest first).
    ///
    /// Non-empty for any key returned by [`Self::record_keys`].
    fn analyses(&self, key: &RecordKey) -> Vec<Sourced<T>>;
}

/// Read-only view of the load order.
pub trait LoadOrder: Send + Sync {
    /// Plugin names in load order.
    fn plugins(&self) -> Vec<String>;

    fn is_enabled(&self, plugin_name: &str) -> bool;

    /// Direct masters of a plugin.
    fn masters(&self, plugin_name: &str) -> Vec<String>;

    /// Masters of `plugin_name` that are missing or disabled.
    fn missing_masters(&self, plugin_name: &str) -> Vec<String> {
        self.masters(plugin_name)
            .into_iter()
            .filter(|m| !self.is_enabled(m))
            .collect()
    }

    /// Transitive masters of a plugin, without duplicates.
    fn all_masters(&self, plugin_name: &str) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        let mut pending = self.masters(plugin_name);
        while let Some(next) = pending.pop() {
            if seen.iter().any(|s| super::key::eq_ignore_case(s, &next)) {
                continue;
            }
            pending.extend(self.masters(&next));
            seen.push(next);
        }
        seen
    }

    /// Whether analyses from this plugin may take part in merging.
    fn is_eligible(&self, plugin_name: &str) -> bool {
        self.is_enabled(plugin_name) && self.missing_masters(plugin_name).is_empty()
    }
}

/// Builds override chains from a provider, dropping ineligible plugins.
pub struct ChainResolver<'a, T> {
    provider: &'a dyn AnalysisProvider<T>,
    load_order: &'a dyn LoadOrder,
}

impl<'a, T: RecordKeyLike> ChainResolver<'a, T> {
    #[must_use]
    pub fn new(provider: &'a dyn AnalysisProvider<T>, load_order: &'a dyn LoadOrder) -> Self {
        Self {
            provider,
            load_order,
        }
    }

    /// Chain for one key, or `None` if no eligible plugin touches it.
    pub fn resolve(&self, key: &RecordKey) -> Result<Option<RecordAnalysisChain<T>>> {
        let analyses = self.provider.analyses(key);
        let total = analyses.len();
        let eligible: Vec<Sourced<T>> = analyses
            .into_iter()
            .filter(|x| {
                let ok = self.load_order.is_eligible(&x.plugin_name);
                if !ok {
                    debug!(record = %key, plugin = %x.plugin_name, "Skipping ineligible plugin");
                }
                ok
            })
            .collect();
        if eligible.is_empty() {
            if total > 0 {
                warn!(record = %key, "No eligible plugins remain for record");
            }
            return Ok(None);
        }
        RecordAnalysisChain::new(eligible).map(Some)
    }

    /// Chains for every key the provider knows, in provider order.
    pub fn resolve_all(&self) -> Result<Vec<RecordAnalysisChain<T>>> {
        let mut chains = Vec::new();
        for key in self.provider.record_keys() {
            if let Some(chain) = self.resolve(&key)? {
                chains.push(chain);
            }
        }
        Ok(chains)
    }
}
