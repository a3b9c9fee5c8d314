//! Property-based test suite entry point.

mod chain_tests;
mod key_tests;
