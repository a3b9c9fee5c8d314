//! Record identity and override chains

pub mod chain;
pub mod key;
pub mod provider;

pub use chain::{RecordAnalysisChain, Sourced};
pub use key::{RecordKey, RecordKeyLike, eq_ignore_case, hash_key, keys_equal};
pub use provider::{AnalysisProvider, ChainResolver, LoadOrder};
