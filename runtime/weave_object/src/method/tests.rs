use super::*;
use crate::value::Value;
use pretty_assertions::assert_eq;

fn void_method() -> Method {
    Method::new(|_, _| Ok(Value::Void))
}

#[test]
fn test_clone_shares_body() {
    let method = void_method();
    let copy = method.clone();
    assert!(method.same_body(&copy));
    assert!(!method.same_body(&void_method()));
}

#[test]
fn test_overriding_marks_calls_next() {
    assert!(!void_method().calls_next());
    assert!(Method::overriding(|rt, call| call.next(rt, &[])).calls_next());
}

#[test]
fn test_slot_for_method_picks_wrapper() {
    let plain = void_method();
    let chained = Method::overriding(|rt, call| call.next(rt, &[]));
    assert!(matches!(Slot::for_method(&plain), Slot::Direct(_)));
    assert!(matches!(Slot::for_method(&chained), Slot::Chained(_)));
}

#[test]
fn test_gate_stub_is_not_defined() {
    let stub = Method::gate_stub(|_, _| Ok(Value::Void));
    assert!(stub.is_gate_stub());
    assert!(!Slot::for_method(&stub).is_defined());
    assert!(Slot::for_method(&void_method()).is_defined());
}

#[test]
fn test_method_table_insert_replaces() {
    let name = Name::from_raw(7);
    let first = void_method();
    let second = void_method();
    let mut table = MethodTable::new();
    assert!(table.insert(name, first.clone()).is_none());
    let previous = table.insert(name, second.clone());
    assert!(previous.is_some_and(|m| m.same_body(&first)));
    assert!(table.get(name).is_some_and(|m| m.same_body(&second)));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_slot_table_sync_writes_only_changes() {
    let a = Name::from_raw(1);
    let b = Name::from_raw(2);
    let ma = void_method();
    let mb = void_method();

    let mut table = SlotTable::default();
    let mut fresh = FxHashMap::default();
    fresh.insert(a, Slot::for_method(&ma));
    fresh.insert(b, Slot::for_method(&mb));
    assert_eq!(table.sync(fresh.clone()), 2);

    // Same bodies again: nothing to write.
    assert_eq!(table.sync(fresh.clone()), 0);

    // Replace one body.
    fresh.insert(b, Slot::for_method(&void_method()));
    assert_eq!(table.sync(fresh), 1);
    assert!(table.get(a).is_some_and(|slot| slot.method().same_body(&ma)));
}

#[test]
fn test_slot_table_sync_drops_stale_entries() {
    let a = Name::from_raw(1);
    let mut table = SlotTable::default();
    let mut fresh = FxHashMap::default();
    fresh.insert(a, Slot::for_method(&void_method()));
    table.sync(fresh);
    table.sync(FxHashMap::default());
    assert!(table.is_empty());
}
