//! Property-based tests: outputs decode back to the input under serde_json,
//! encoding is deterministic, and sorted maps are ordered by rendered key.

use jsonplan::{encode, json, reflect_struct, to_string, Flags, Map, Typed, Value};
use proptest::prelude::*;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};

fn decode<T: DeserializeOwned>(value: &impl Typed, flags: Flags) -> T {
    let mut buf = Vec::new();
    encode(&mut buf, value, flags).unwrap();
    serde_json::from_slice(&buf).unwrap_or_else(|e| {
        panic!("decoding {:?} failed: {e}", String::from_utf8_lossy(&buf))
    })
}

struct Record {
    id: u64,
    name: String,
    score: Option<i32>,
    tags: Vec<String>,
}

reflect_struct!(Record {
    id: u64,
    name: String,
    score: Option<i32> = "score,omitempty",
    tags: Vec<String>,
});

#[derive(serde::Deserialize, Debug, PartialEq)]
struct DecodedRecord {
    id: u64,
    name: String,
    score: Option<i32>,
    tags: Vec<String>,
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map>())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_i64(n in any::<i64>()) {
        prop_assert_eq!(decode::<i64>(&n, Flags::STANDARD), n);
    }

    #[test]
    fn prop_u64(n in any::<u64>()) {
        prop_assert_eq!(decode::<u64>(&n, Flags::FASTEST), n);
    }

    #[test]
    fn prop_f64_shortest_round_trip(f in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
        let text = to_string(&f).unwrap();
        prop_assert!(!text.contains('e'));
        prop_assert_eq!(text.parse::<f64>().unwrap(), f);
    }

    #[test]
    fn prop_f32_shortest_round_trip(f in any::<f32>().prop_filter("finite", |f| f.is_finite())) {
        let text = to_string(&f).unwrap();
        prop_assert_eq!(text.parse::<f32>().unwrap(), f);
    }

    #[test]
    fn prop_strings(s in any::<String>()) {
        prop_assert_eq!(&decode::<String>(&s, Flags::STANDARD), &s);
        prop_assert_eq!(&decode::<String>(&s, Flags::FASTEST), &s);
    }

    #[test]
    fn prop_vec_option(v in prop::collection::vec(proptest::option::of(any::<i32>()), 0..20)) {
        prop_assert_eq!(decode::<Vec<Option<i32>>>(&v, Flags::STANDARD), v);
    }

    #[test]
    fn prop_struct(
        id in any::<u64>(),
        name in ".{0,12}",
        score in proptest::option::of(any::<i32>()),
        tags in prop::collection::vec("[a-z<>&]{0,5}", 0..4),
    ) {
        let record = Record { id, name, score, tags };
        let decoded: DecodedRecord = decode(&record, Flags::STANDARD);
        prop_assert_eq!(decoded, DecodedRecord {
            id: record.id,
            name: record.name.clone(),
            score: record.score,
            tags: record.tags.clone(),
        });
    }

    #[test]
    fn prop_sorted_map_keys(map in prop::collection::hash_map(any::<u16>(), any::<bool>(), 0..16)) {
        let text = to_string(&map).unwrap();
        let decoded: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(decoded.len(), map.len());

        // Keys appear in the output in byte order of their rendered text.
        let mut rendered: Vec<String> = map.keys().map(u16::to_string).collect();
        rendered.sort();
        let quoted: Vec<String> = rendered.iter().map(|k| format!("\"{k}\":")).collect();
        let positions: Vec<usize> = quoted.iter().map(|k| text.find(k.as_str()).unwrap()).collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_unsorted_map_has_same_entries(map in prop::collection::hash_map("[a-z]{1,5}", any::<i16>(), 0..16)) {
        let decoded: HashMap<String, i16> = decode(&map, Flags::FASTEST);
        prop_assert_eq!(decoded, map);
    }

    #[test]
    fn prop_dynamic_values(value in arb_value()) {
        let decoded: Value = decode(&value, Flags::FASTEST);
        prop_assert_eq!(&decoded, &value);

        let first = to_string(&value).unwrap();
        prop_assert_eq!(first, to_string(&value).unwrap());
    }

    #[test]
    fn prop_pretty_decodes_the_same(value in arb_value()) {
        let compact: serde_json::Value = decode(&value, Flags::STANDARD);
        let pretty: serde_json::Value = decode(&value, Flags::STANDARD | Flags::PRETTY);
        prop_assert_eq!(compact, pretty);
    }
}

#[test]
fn test_btree_and_hash_maps_agree_when_sorted() {
    let hashed: HashMap<String, Value> = [
        ("b".to_string(), json!(1)),
        ("a".to_string(), json!([true])),
    ]
    .into();
    let ordered: BTreeMap<String, Value> = hashed.clone().into_iter().collect();
    assert_eq!(to_string(&hashed).unwrap(), to_string(&ordered).unwrap());
}
