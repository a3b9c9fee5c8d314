//! Record identity.
//!
//! A record is identified by the plugin that declares it plus its local form
//! id, both compared case-insensitively. Any type that exposes those two
//! fields through [`RecordKeyLike`] compares equal to a [`RecordKey`] with the
//! same values, regardless of its concrete type.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NpcError, Result};

/// Separator used by the canonical text form `"{formid}:{plugin}"`.
pub const KEY_SEPARATOR: char = ':';

/// Anything that can identify a record.
pub trait RecordKeyLike {
    fn base_plugin_name(&self) -> &str;
    fn local_form_id_hex(&self) -> &str;

    /// Whether `plugin_name` is the plugin that declares this record.
    fn is_declared_by(&self, plugin_name: &str) -> bool {
        eq_ignore_case(self.base_plugin_name(), plugin_name)
    }
}

/// Case-insensitive string equality, consistent with [`hash_ignore_case`].
#[must_use]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Feeds the case-folded characters of `s` into `state`.
pub fn hash_ignore_case<H: Hasher>(s: &str, state: &mut H) {
    for c in s.chars().flat_map(char::to_lowercase) {
        c.hash(state);
    }
    // Terminator so ("ab", "c") and ("a", "bc") hash differently.
    0xffu8.hash(state);
}

/// Structural key equality across any two key-like values.
#[must_use]
pub fn keys_equal<A, B>(a: &A, b: &B) -> bool
where
    A: RecordKeyLike + ?Sized,
    B: RecordKeyLike + ?Sized,
{
    eq_ignore_case(a.base_plugin_name(), b.base_plugin_name())
        && eq_ignore_case(a.local_form_id_hex(), b.local_form_id_hex())
}

/// Case-insensitive hash of a key-like value, consistent with [`keys_equal`].
pub fn hash_key<K, H>(key: &K, state: &mut H)
where
    K: RecordKeyLike + ?Sized,
    H: Hasher,
{
    hash_ignore_case(key.local_form_id_hex(), state);
    hash_ignore_case(key.base_plugin_name(), state);
}

/// Canonical record key.
///
/// Serializes as its canonical text form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordKey {
    base_plugin_name: String,
    local_form_id_hex: String,
}

impl RecordKey {
    #[must_use]
    pub fn new(base_plugin_name: impl Into<String>, local_form_id_hex: impl Into<String>) -> Self {
        Self {
            base_plugin_name: base_plugin_name.into(),
            local_form_id_hex: local_form_id_hex.into(),
        }
    }

    /// Copies the identity out of any key-like value.
    #[must_use]
    pub fn from_key<K: RecordKeyLike + ?Sized>(key: &K) -> Self {
        Self::new(key.base_plugin_name(), key.local_form_id_hex())
    }

    /// Parses the canonical `"{formid}:{plugin}"` form.
    ///
    /// Blank input is an argument error; anything other than exactly one
    /// separator is a format error.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(NpcError::Argument("record key text is empty".to_string()));
        }
        let mut parts = text.split(KEY_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(form_id), Some(plugin), None) => Ok(Self::new(plugin, form_id)),
            _ => Err(NpcError::Format(format!(
                "expected exactly one '{KEY_SEPARATOR}' in '{text}'"
            ))),
        }
    }

    /// Whether this key identifies the same record as `other`.
    #[must_use]
    pub fn matches<K: RecordKeyLike + ?Sized>(&self, other: &K) -> bool {
        keys_equal(self, other)
    }
}

impl RecordKeyLike for RecordKey {
    fn base_plugin_name(&self) -> &str {
        &self.base_plugin_name
    }

    fn local_form_id_hex(&self) -> &str {
        &self.local_form_id_hex
    }
}

impl<K: RecordKeyLike + ?Sized> RecordKeyLike for &K {
    fn base_plugin_name(&self) -> &str {
        (**self).base_plugin_name()
    }

    fn local_form_id_hex(&self) -> &str {
        (**self).local_form_id_hex()
    }
}

impl PartialEq for RecordKey {
    fn eq(&self, other: &Self) -> bool {
        keys_equal(self, other)
    }
}

impl Eq for RecordKey {}

impl Hash for RecordKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_key(self, state);
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}",
            self.local_form_id_hex, self.base_plugin_name
        )
    }
}

impl TryFrom<String> for RecordKey {
    type Error = NpcError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RecordKey> for String {
    fn from(key: RecordKey) -> Self {
        key.to_string()
    }
}

impl FromStr for RecordKey {
    type Err = NpcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
