use rangeset::{IntRange, RangeSet};

const REGISTER_BLOCKS: &[(u32, u32)] = &[(0, 1), (3, 5), (20, 28), (404, 406), (412, 418)];

fn register_blocks() -> RangeSet {
    REGISTER_BLOCKS
        .iter()
        .map(|&(first, last)| IntRange::new(first, last).unwrap())
        .collect()
}

#[test]
fn build_and_coalesce_register_blocks() {
    let set = register_blocks();
    assert_eq!(set.len(), 5);
    assert_eq!(set.address_count(), 2 + 3 + 9 + 3 + 7);

    let combined = set.coalesce(32);
    assert_eq!(combined.to_string(), "[0-28, 404-418]");

    // the original set is left alone
    assert_eq!(set.len(), 5);
}

#[test]
fn union_of_two_sets() {
    let mut config = RangeSet::new();
    config.add_range(0, 5).unwrap();
    config.add_range(10, 19).unwrap();

    let mut runtime = RangeSet::new();
    runtime.add_range(6, 9).unwrap();
    runtime.add_range(40, 41).unwrap();

    config.extend_from(&runtime);
    assert_eq!(config.to_string(), "[0-19, 40-41]");
}

#[test]
fn serializes_as_list_of_ranges() {
    let set = register_blocks().coalesce(32);
    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "ranges": [
                {"first": 0, "last": 28},
                {"first": 404, "last": 418}
            ]
        })
    );
    let back: RangeSet = serde_json::from_value(json).unwrap();
    assert_eq!(back, set);
}

#[test]
fn deserialize_rejects_inverted_range() {
    let err = serde_json::from_str::<RangeSet>(r#"{"ranges":[{"first":5,"last":1}]}"#)
        .unwrap_err();
    assert!(err.to_string().contains("invalid range 5-1"));
    assert!(serde_json::from_str::<IntRange>(r#"{"first":9,"last":8}"#).is_err());
}

#[test]
fn deserialize_normalizes_ranges() {
    let set: RangeSet = serde_json::from_str(
        r#"{"ranges":[{"first":100,"last":101},{"first":0,"last":1},{"first":2,"last":4},{"first":3,"last":3}]}"#,
    )
    .unwrap();
    assert_eq!(set.to_string(), "[0-4, 100-101]");
    assert!(set.contains(0));
    assert_eq!(set.address_count(), 7);
    assert_eq!(set.coalesce(32).to_string(), "[0-4, 100-101]");
    assert_eq!(set.coalesce(128).to_string(), "[0-101]");
}
