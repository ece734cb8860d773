use super::*;
use crate::error::GateError;
use serde_json::json;

fn sample() -> GuardedMap<String, i32> {
    [("a", 1), ("b", 2), ("c", 3)]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn read_only() -> GuardedMap<String, i32> {
    GuardedMap::from_entries(
        [("a".to_string(), 1), ("b".to_string(), 2)],
        PartialPerm::write(false),
    )
}

fn denied<T: fmt::Debug>(result: Result<T>, access: Access) -> bool {
    matches!(result, Err(GateError::PermissionDenied(a)) if a == access)
}

fn keys_of(map: &GuardedMap<String, i32>) -> Vec<String> {
    map.keys().unwrap().cloned().collect()
}

#[test]
fn test_guarded_map_set_get() {
    let mut map = GuardedMap::new();
    map.set("x".to_string(), 1).unwrap().set("y".to_string(), 2).unwrap();

    assert_eq!(map.get("x").unwrap(), Some(&1));
    assert_eq!(map.get("z").unwrap(), None);
    assert!(map.has("y").unwrap());
    assert_eq!(map.size().unwrap(), 2);
    assert!(!map.is_empty().unwrap());
}

#[test]
fn test_guarded_map_reset_keeps_position() {
    let mut map = sample();
    map.set("a".to_string(), 10).unwrap();

    assert_eq!(keys_of(&map), vec!["a", "b", "c"]);
    assert_eq!(map.get("a").unwrap(), Some(&10));
    assert_eq!(map.first().unwrap(), Some((&"a".to_string(), &10)));
    assert_eq!(map.last().unwrap(), Some((&"c".to_string(), &3)));
}

#[test]
fn test_guarded_map_bulk_operations() {
    let mut map = sample();
    let wanted = ["a".to_string(), "z".to_string()];
    assert!(map.has_some(&wanted).unwrap());
    assert!(!map.has_every(&wanted).unwrap());
    assert!(map.has_every(["a".to_string(), "c".to_string()]).unwrap());

    map.set_many_to(["d".to_string(), "e".to_string()], 0).unwrap();
    map.set_many([("f".to_string(), 6)]).unwrap();
    assert_eq!(keys_of(&map), vec!["a", "b", "c", "d", "e", "f"]);

    map.delete_many(["b".to_string(), "d".to_string(), "missing".to_string()])
        .unwrap();
    assert_eq!(keys_of(&map), vec!["a", "c", "e", "f"]);

    assert!(map.delete("a").unwrap());
    assert!(!map.delete("a").unwrap());

    map.clear().unwrap();
    assert!(map.is_empty().unwrap());
    assert_eq!(map.first().unwrap(), None);
}

#[test]
fn test_guarded_map_get_many() {
    let map = sample();
    let picked = map
        .get_many(["c".to_string(), "missing".to_string(), "a".to_string()])
        .unwrap();

    assert_eq!(keys_of(&picked), vec!["c", "a"]);
    assert_eq!(picked.permissions(), map.permissions());
}

#[test]
fn test_guarded_map_transforms() {
    let map = sample();

    let doubled = map.map(|value, _, _| value * 2).unwrap();
    assert_eq!(doubled.values().unwrap().copied().collect::<Vec<_>>(), vec![2, 4, 6]);

    let odd = map.filter(|value, _, _| value % 2 == 1).unwrap();
    assert_eq!(keys_of(&odd), vec!["a", "c"]);

    let labels = map
        .filter_map(|value, _, _| *value > 1, |value, key, _| format!("{key}{value}"))
        .unwrap();
    assert_eq!(
        labels.values().unwrap().cloned().collect::<Vec<_>>(),
        vec!["b2".to_string(), "c3".to_string()]
    );

    assert_eq!(map.find(|value, _, _| *value > 1).unwrap(), Some(&2));
    assert_eq!(map.find_key(|value, _, _| *value == 3).unwrap().map(String::as_str), Some("c"));
    assert_eq!(map.find(|value, _, _| *value > 10).unwrap(), None);
    assert!(map.some(|_, key, _| key == "b").unwrap());
    assert!(map.every(|value, _, whole| *value <= whole.size().unwrap() as i32).unwrap());

    let mut total = 0;
    map.for_each(|value, _, _| total += value).unwrap();
    assert_eq!(total, 6);
}

#[test]
fn test_guarded_map_set_algebra() {
    let left = sample();
    let right: GuardedMap<String, i32> = [("b".to_string(), 20), ("d".to_string(), 40)]
        .into_iter()
        .collect();

    let both = left.intersection(&right).unwrap();
    assert_eq!(both.entries().unwrap().collect::<Vec<_>>(), vec![(&"b".to_string(), &2)]);

    let either = left.union(&right).unwrap();
    assert_eq!(keys_of(&either), vec!["a", "b", "c", "d"]);
    assert_eq!(either.get("b").unwrap(), Some(&2));

    let only_left = left.difference(&right).unwrap();
    assert_eq!(keys_of(&only_left), vec!["a", "c"]);

    let chained = left.chain(&right).unwrap();
    assert_eq!(keys_of(&chained), vec!["a", "b", "c", "d"]);
    assert_eq!(chained.get("b").unwrap(), Some(&20));
}

#[test]
fn test_guarded_map_read_only_fails_mutators() {
    let mut map = read_only();

    assert!(denied(map.set("c".to_string(), 3), Access::Write));
    assert!(denied(map.set_many_to(["c".to_string()], 3), Access::Write));
    assert!(denied(map.set_many([("c".to_string(), 3)]), Access::Write));
    assert!(denied(map.delete("a"), Access::Write));
    assert!(denied(map.delete_many(["a".to_string()]), Access::Write));
    assert!(denied(map.clear(), Access::Write));

    // Reads still succeed and the store is untouched
    assert_eq!(map.size().unwrap(), 2);
    assert!(map.has("a").unwrap());
    assert_eq!(map.get("b").unwrap(), Some(&2));
    assert!(map.has_some(["a".to_string()]).unwrap());
    assert!(map.some(|value, _, _| *value == 1).unwrap());
    assert!(map.try_clone().is_ok());
    assert_eq!(map.to_json().unwrap(), json!([["a", 1], ["b", 2]]));
}

#[test]
fn test_guarded_map_read_only_derivations_fail_fast() {
    let map = read_only();

    assert!(denied(map.map(|value, _, _| *value), Access::Write));
    assert!(denied(map.filter(|_, _, _| true), Access::Write));
    assert!(denied(map.get_many(["a".to_string()]), Access::Write));
    assert!(denied(map.union(&sample()), Access::Write));

    // Nothing to insert, nothing to check
    assert!(map.filter(|_, _, _| false).unwrap().is_empty().unwrap());
    assert!(map.get_many(["zzz".to_string()]).is_ok());
}

#[test]
fn test_guarded_map_write_only_fails_reads() {
    let mut map: GuardedMap<String, i32> = GuardedMap::with_permissions(PartialPerm::read(false));
    map.set("a".to_string(), 1).unwrap();

    assert!(denied(map.size(), Access::Read));
    assert!(denied(map.get("a"), Access::Read));
    assert!(denied(map.entries().map(|_| ()), Access::Read));
    assert!(denied(map.to_json(), Access::Read));
    assert!(serde_json::to_value(&map).is_err());
    assert_eq!(map.to_string(), "GuardedMap (read denied)");

    let readable = sample();
    assert!(denied(readable.intersection(&map), Access::Read));
}

#[test]
fn test_guarded_map_derived_permissions_are_independent() {
    let map = sample();
    let mut copy = map.try_clone().unwrap();
    copy.set("d".to_string(), 4).unwrap();

    assert!(!map.has("d").unwrap());
    assert_eq!(copy.size().unwrap(), 4);
    assert!(copy.can_write());
    assert!(map.can_read());
}

#[test]
fn test_guarded_map_json() {
    let map = sample();
    assert_eq!(map.to_json().unwrap(), json!([["a", 1], ["b", 2], ["c", 3]]));
    assert_eq!(map.to_string(), r#"[["a",1],["b",2],["c",3]]"#);

    let parsed: GuardedMap<String, i32> = serde_json::from_str(&map.to_string()).unwrap();
    assert_eq!(keys_of(&parsed), vec!["a", "b", "c"]);
}
