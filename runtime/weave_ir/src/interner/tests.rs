use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_intern_is_idempotent() {
    let interner = StringInterner::new();
    let a = interner.intern("greet");
    let b = interner.intern("greet");
    assert_eq!(a, b);
    assert_eq!(interner.lookup(a), "greet");
}

#[test]
fn test_distinct_strings_get_distinct_names() {
    let interner = StringInterner::new();
    let a = interner.intern("greet");
    let b = interner.intern("farewell");
    assert_ne!(a, b);
}

#[test]
fn test_empty_string_is_pre_interned() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.lookup(Name::EMPTY), "");
}

#[test]
fn test_kernel_names_are_pre_interned() {
    let interner = StringInterner::new();
    for name in KERNEL_NAMES {
        assert!(interner.get(name).is_some(), "{name} should be pre-interned");
    }
    assert_eq!(interner.len(), KERNEL_NAMES.len() + 1);
    assert!(!interner.is_empty());
}

#[test]
fn test_get_does_not_intern() {
    let interner = StringInterner::new();
    let before = interner.len();
    assert_eq!(interner.get("never_seen"), None);
    assert_eq!(interner.len(), before);
}

#[test]
fn test_lookup_foreign_name_is_empty() {
    let interner = StringInterner::new();
    assert_eq!(interner.lookup(Name::from_raw(9_999)), "");
}

#[test]
fn test_shared_interner_clones_share_table() {
    let shared = SharedInterner::new();
    let other = shared.clone();
    let name = shared.intern("tap");
    assert_eq!(other.get("tap"), Some(name));
}
