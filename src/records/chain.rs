//! Per-record override chains.
//!
//! A chain holds every plugin's analysis of one record, in load order. The
//! chain never reorders its input; the last element always wins.

use std::collections::HashMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::key::{RecordKey, RecordKeyLike};
use crate::error::{NpcError, Result};

/// An analysis paired with the plugin it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub plugin_name: String,
    pub analysis: T,
}

impl<T> Sourced<T> {
    #[must_use]
    pub fn new(plugin_name: impl Into<String>, analysis: T) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            analysis,
        }
    }
}

fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Ordered, immutable chain of analyses for a single record.
#[derive(Debug, Clone)]
pub struct RecordAnalysisChain<T> {
    key: RecordKey,
    items: Vec<Sourced<T>>,
    master_index: usize,
    by_plugin: HashMap<String, usize>,
}

impl<T: RecordKeyLike> RecordAnalysisChain<T> {
    /// Builds a chain from analyses already sorted by load order.
    ///
    /// The input must not be empty; callers only request chains for keys that
    /// exist in the load order.
    pub fn new(items: impl IntoIterator<Item = Sourced<T>>) -> Result<Self> {
        let items: Vec<Sourced<T>> = items.into_iter().collect();
        let Some(first) = items.first() else {
            error!("Attempted to build an override chain with no analyses");
            return Err(NpcError::PreconditionViolated(
                "override chain requires at least one analysis".to_string(),
            ));
        };

        let key = RecordKey::from_key(&first.analysis);
        let master_index = items
            .iter()
            .position(|x| key.is_declared_by(&x.plugin_name))
            .unwrap_or(0);

        let mut by_plugin = HashMap::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let folded = fold_case(&item.plugin_name);
            if by_plugin.contains_key(&folded) {
                warn!(
                    record = %key,
                    plugin = %item.plugin_name,
                    "Plugin appears more than once in override chain; keeping first occurrence"
                );
                continue;
            }
            by_plugin.insert(folded, index);
        }

        Ok(Self {
            key,
            items,
            master_index,
            by_plugin,
        })
    }
}

impl<T> RecordAnalysisChain<T> {
    /// Key of the record, taken from the first analysis.
    #[must_use]
    pub const fn key(&self) -> &RecordKey {
        &self.key
    }

    #[must_use]
    pub fn master(&self) -> &Sourced<T> {
        &self.items[self.master_index]
    }

    /// Position of the master element in load order.
    #[must_use]
    pub const fn master_index(&self) -> usize {
        self.master_index
    }

    /// The load-order-last analysis.
    #[must_use]
    pub fn winner(&self) -> &Sourced<T> {
        // Non-empty by construction.
        &self.items[self.items.len() - 1]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a constructed chain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, plugin_name: &str) -> Option<&Sourced<T>> {
        self.index_of(plugin_name).map(|i| &self.items[i])
    }

    #[must_use]
    pub fn index_of(&self, plugin_name: &str) -> Option<usize> {
        self.by_plugin.get(&fold_case(plugin_name)).copied()
    }

    #[must_use]
    pub fn contains(&self, plugin_name: &str) -> bool {
        self.by_plugin.contains_key(&fold_case(plugin_name))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sourced<T>> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Sourced<T>] {
        &self.items
    }
}

impl<T> Index<usize> for RecordAnalysisChain<T> {
    type Output = Sourced<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a RecordAnalysisChain<T> {
    type Item = &'a Sourced<T>;
    type IntoIter = std::slice::Iter<'a, Sourced<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
