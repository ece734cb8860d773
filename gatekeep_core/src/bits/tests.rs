use super::*;
use serde_json::json;

fn sample() -> Bits<&'static str> {
    Bits::new([("b", false), ("a", true), ("c", true)]).unwrap()
}

#[test]
fn test_bits_sorted_domain() {
    let bits = sample();
    assert_eq!(bits.domain(), &["a", "b", "c"]);
    assert_eq!(bits.raw(), 0b101);
    assert_eq!(bits.at(&"c").unwrap(), 2);
}

#[test]
fn test_bits_enable_disable_toggle() {
    let mut bits = sample();

    bits.enable(&"b").unwrap();
    assert!(bits.get(&"b").unwrap());

    bits.disable(&"a").unwrap();
    assert!(!bits.get(&"a").unwrap());

    let before = bits.get(&"c").unwrap();
    bits.toggle(&"c").unwrap().toggle(&"c").unwrap();
    assert_eq!(bits.get(&"c").unwrap(), before);
}

#[test]
fn test_bits_unknown_key() {
    let mut bits = sample();
    let raw = bits.raw();

    assert!(matches!(bits.enable(&"z"), Err(GateError::UnknownKey(_))));
    assert!(matches!(bits.toggle(&"z"), Err(GateError::UnknownKey(_))));
    assert!(matches!(bits.get(&"z"), Err(GateError::UnknownKey(_))));
    assert!(matches!(bits.at(&"z"), Err(GateError::UnknownKey(_))));
    assert_eq!(bits.raw(), raw);
}

#[test]
fn test_bits_set_value_rejects_non_boolean() {
    let mut bits = sample();

    bits.set_value(&"b", &json!(true)).unwrap();
    assert!(bits.get(&"b").unwrap());

    let err = bits.set_value(&"b", &json!("yes")).unwrap_err();
    assert!(matches!(err, GateError::InvalidValue(_)));
    assert!(bits.get(&"b").unwrap());
}

#[test]
fn test_bits_fill_reset_flood() {
    let mut bits = sample();

    bits.flood();
    assert!(bits.values().all(|flag| flag));

    bits.reset();
    assert!(bits.values().all(|flag| !flag));
    assert_eq!(bits.raw(), 0);

    bits.fill(true);
    assert_eq!(bits.raw(), 0b111);
    bits.fill(false);
    assert_eq!(bits.raw(), 0);
}

#[test]
fn test_bits_data_and_clone_are_independent() {
    let bits = sample();
    let mut copy = bits.clone();
    copy.flood();

    assert_eq!(
        bits.data(),
        BTreeMap::from([("a", true), ("b", false), ("c", true)])
    );
    assert!(copy.get(&"b").unwrap());
    assert!(!bits.get(&"b").unwrap());
}

#[test]
fn test_bits_load_unload_round_trip() {
    let domain = ["w", "x", "y", "z"];
    for raw in 0u32..16 {
        let record: BTreeMap<&str, bool> = domain
            .iter()
            .enumerate()
            .map(|(index, key)| (*key, raw & (1 << index) != 0))
            .collect();
        let packed = Bits::load(record.clone()).unwrap();
        assert_eq!(packed, raw);
        assert_eq!(Bits::unload(packed, &domain).unwrap(), record);
    }
}

#[test]
fn test_bits_unload_keeps_caller_order() {
    // "a" is bit 0 when packed, but the caller hands the keys back reversed
    let packed = Bits::load([("a", true), ("b", false)]).unwrap();
    let record = Bits::unload(packed, &["b", "a"]).unwrap();
    assert_eq!(record, BTreeMap::from([("a", false), ("b", true)]));
}

#[test]
fn test_bits_domain_too_large() {
    let record = (0..=MAX_FLAGS).map(|index| (index, true));
    assert!(matches!(
        Bits::new(record),
        Err(GateError::DomainTooLarge { len: 33, max: 32 })
    ));

    let full = Bits::new((0..MAX_FLAGS).map(|index| (index, true))).unwrap();
    assert_eq!(full.raw(), u32::MAX);

    let keys: Vec<usize> = (0..=MAX_FLAGS).collect();
    assert!(Bits::unload(0, &keys).is_err());
}

#[test]
fn test_bits_iteration_is_restartable() {
    let bits = sample();
    let first: Vec<_> = bits.entries().collect();
    let second: Vec<_> = (&bits).into_iter().collect();
    assert_eq!(first, vec![(&"a", true), (&"b", false), (&"c", true)]);
    assert_eq!(first, second);
    assert_eq!(bits.keys().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn test_bits_json() {
    let bits = Bits::from_json(&json!({ "write": false, "read": true })).unwrap();
    assert_eq!(bits.domain(), &["read".to_string(), "write".to_string()]);
    assert_eq!(bits.to_json().unwrap(), json!({ "read": true, "write": false }));
    assert_eq!(bits.to_string(), r#"{"read":true,"write":false}"#);

    let restored: Bits<String> = serde_json::from_str(&bits.to_string()).unwrap();
    assert_eq!(restored, bits);

    assert!(matches!(
        Bits::from_json(&json!({ "read": 1 })),
        Err(GateError::InvalidValue(_))
    ));
    assert!(matches!(
        Bits::from_json(&json!([true])),
        Err(GateError::InvalidValue(_))
    ));
}
