//! Record keys compare and hash case-insensitively.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use npc_merge::records::RecordKey;
use proptest::prelude::*;

fn hash_of(key: &RecordKey) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #[test]
    fn case_changes_keep_keys_equal(plugin in "[A-Za-z][A-Za-z0-9 ]{0,20}\\.es[mpl]", id in "[0-9A-Fa-f]{6}") {
        let a = RecordKey::new(plugin.clone(), id.clone());
        let b = RecordKey::new(plugin.to_uppercase(), id.to_lowercase());
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn different_ids_are_different_keys(plugin in "[A-Za-z]{1,12}\\.esp", a in 0u32..0xFFFFFF, b in 0u32..0xFFFFFF) {
        prop_assume!(a != b);
        let left = RecordKey::new(plugin.clone(), format!("{a:06X}"));
        let right = RecordKey::new(plugin, format!("{b:06X}"));
        prop_assert_ne!(left, right);
    }

    #[test]
    fn text_form_parses_back(plugin in "[A-Za-z][A-Za-z0-9 _-]{0,20}\\.esp", id in "[0-9A-F]{6}") {
        let key = RecordKey::new(plugin, id);
        let parsed = RecordKey::parse(&key.to_string()).unwrap();
        prop_assert_eq!(parsed, key);
    }

    #[test]
    fn parse_never_panics(text in ".{0,40}") {
        let _ = RecordKey::parse(&text);
    }
}
