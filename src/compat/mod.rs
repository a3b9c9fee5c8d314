//! Compatibility rule chain
//!
//! Records pass through an ordered list of predicates before they are merged.
//! The chain is fail-safe: a rule that errors counts as "unsupported" and
//! evaluation stops there.

pub mod rules;

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{Level, debug, error, info, trace, warn};

use crate::error::{NpcError, Result};

pub use rules::{FaceGenHeadRule, NoChildrenRule, npc_rule_set, standard_rules};

/// Name shown when a record's name cannot be determined.
pub const UNKNOWN_RECORD_NAME: &str = "(failed to get record name)";

/// A stateless predicate deciding whether a record can be merged.
pub trait CompatibilityRule<T>: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Level used when this rule rejects a record.
    fn log_level(&self) -> Level {
        Level::INFO
    }

    fn is_supported(&self, record: &T) -> Result<bool>;
}

type NameSelector<T> = Box<dyn Fn(&T) -> Result<String> + Send + Sync>;

/// Ordered set of rules sharing one record-name selector.
pub struct CompatibilityRuleSet<T> {
    rules: Vec<Box<dyn CompatibilityRule<T>>>,
    name_selector: NameSelector<T>,
}

impl<T> CompatibilityRuleSet<T> {
    pub fn new<F>(name_selector: F) -> Self
    where
        F: Fn(&T) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            rules: Vec::new(),
            name_selector: Box::new(name_selector),
        }
    }

    #[must_use]
    pub fn add<R>(mut self, rule: R) -> Self
    where
        R: CompatibilityRule<T> + 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    #[must_use]
    pub fn add_range<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn CompatibilityRule<T>>>,
    {
        self.rules.extend(rules);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name())
    }

    /// Runs every rule in registration order.
    ///
    /// Returns `false` at the first rule that rejects or errors; later rules
    /// are not consulted.
    pub fn is_supported(&self, record: &T) -> bool {
        for rule in &self.rules {
            let outcome = catch_unwind(AssertUnwindSafe(|| rule.is_supported(record)))
                .unwrap_or_else(|payload| Err(NpcError::from_panic(payload.as_ref())));
            match outcome {
                Ok(true) => {}
                Ok(false) => {
                    let name = self.record_name(record);
                    log_at(
                        rule.log_level(),
                        rule.name(),
                        &name,
                        "Record rejected by compatibility rule",
                    );
                    return false;
                }
                Err(err) => {
                    let name = self.record_name(record);
                    error!(
                        rule = %rule.name(),
                        record = %name,
                        error = %err,
                        "Compatibility rule failed; treating record as unsupported"
                    );
                    return false;
                }
            }
        }
        true
    }

    /// Summary of the configured rules, one `"  - {name}: {description}"`
    /// line each.
    pub fn report_configuration(&self) -> String {
        let mut report = String::from("Compatibility rules:");
        if self.rules.is_empty() {
            report.push_str("\n  (none)");
        }
        for rule in &self.rules {
            report.push_str(&format!("\n  - {}: {}", rule.name(), rule.description()));
        }
        info!(rules = self.rules.len(), "{report}");
        report
    }

    fn record_name(&self, record: &T) -> String {
        match catch_unwind(AssertUnwindSafe(|| (self.name_selector)(record))) {
            Ok(Ok(name)) => name,
            Ok(Err(err)) => {
                debug!(error = %err, "Record name selector failed");
                UNKNOWN_RECORD_NAME.to_string()
            }
            Err(_) => {
                debug!("Record name selector panicked");
                UNKNOWN_RECORD_NAME.to_string()
            }
        }
    }
}

impl<T> std::fmt::Debug for CompatibilityRuleSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompatibilityRuleSet")
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn log_at(level: Level, rule: &str, record: &str, message: &str) {
    if level == Level::ERROR {
        error!(rule = %rule, record = %record, "{message}");
    } else if level == Level::WARN {
        warn!(rule = %rule, record = %record, "{message}");
    } else if level == Level::INFO {
        info!(rule = %rule, record = %record, "{message}");
    } else if level == Level::DEBUG {
        debug!(rule = %rule, record = %record, "{message}");
    } else {
        trace!(rule = %rule, record = %record, "{message}");
    }
}
