// SPDX-License-Identifier: Apache-2.0

// Public API behaviour: inputs, limits, memory and value access.

use pooljson::{
    ChunkReader, DeserializationError, DeserializeOptions, Document, Filter, NestingLimit,
    StaticDocument, ValueKind,
};
use test_log::test;

const SENSOR: &str = r#"{
    "sensor": "gps",
    "time": 1351824120,
    "data": [48.756080, 2.302038],
    "tags": {'unit': "deg", quoted: "it\"s"}
}"#;

#[test]
fn test_value_access() {
    let mut doc: StaticDocument<512> = Document::new([0u8; 512]);
    doc.deserialize_str(SENSOR, DeserializeOptions::new()).unwrap();
    let root = doc.root();

    assert_eq!(root.kind(), ValueKind::Object);
    assert_eq!(root.len(), 4);
    assert_eq!(root.get("sensor").as_str(), "gps");
    assert_eq!(root.get("time").as_int(), 1351824120);
    assert_eq!(root.get("data").at(1).as_f64(), 2.302038);
    assert_eq!(root.get("tags").get("unit").as_str(), "deg");
    assert_eq!(root.get("tags").get("quoted").as_str(), "it\"s");
    assert!(root.get("missing").is_null());
    assert!(root.get("data").at(7).is_null());

    let keys: Vec<&str> = root.members().map(|(key, _)| key).collect();
    assert_eq!(keys, ["sensor", "time", "data", "tags"]);
    let sum: f64 = root.get("data").elements().map(|v| v.as_f64()).sum();
    assert!((sum - 51.058118).abs() < 1e-9);
}

#[test]
fn test_literals_and_numbers() {
    let mut doc = Document::new([0u8; 256]);
    doc.deserialize_str(
        "[true, false, null, -0, 12, -3.5e2, 1E3, 9223372036854775808]",
        DeserializeOptions::new(),
    )
    .unwrap();
    let root = doc.root();
    assert!(root.at(0).as_bool());
    assert_eq!(root.at(1).kind(), ValueKind::Bool);
    assert!(root.at(2).is_null());
    assert_eq!(root.at(3).as_int(), 0);
    assert!(root.at(4).is_integer());
    assert_eq!(root.at(5).as_f64(), -350.0);
    assert!(root.at(6).is_float());
    // Out of integer range falls back to a float
    assert!(root.at(7).is_float());
}

#[test]
fn test_malformed_literals() {
    let mut doc = Document::new([0u8; 64]);
    for (input, expected) in [
        ("[tru]", DeserializationError::InvalidInput),
        ("[nul", DeserializationError::IncompleteInput),
        ("nul", DeserializationError::IncompleteInput),
        ("-", DeserializationError::IncompleteInput),
        ("[1e]", DeserializationError::InvalidInput),
        ("[.]", DeserializationError::InvalidInput),
        ("[01x]", DeserializationError::InvalidInput),
        ("[Infinity]", DeserializationError::InvalidInput),
        ("", DeserializationError::IncompleteInput),
        ("   ", DeserializationError::IncompleteInput),
        ("{\"a\" 1}", DeserializationError::InvalidInput),
        ("[1 2]", DeserializationError::InvalidInput),
    ] {
        assert_eq!(
            doc.deserialize_str(input, DeserializeOptions::new()),
            Err(expected),
            "input {:?}",
            input
        );
        assert!(doc.root().is_null());
    }
}

#[test]
fn test_nesting_limit() {
    let mut doc = Document::new([0u8; 256]);
    let limit = |n| DeserializeOptions::new().with_nesting_limit(NestingLimit(n));

    assert_eq!(doc.deserialize_str("[[[1]]]", limit(3)), Ok(48));
    assert_eq!(
        doc.deserialize_str("[[[1]]]", limit(2)),
        Err(DeserializationError::TooDeep)
    );
    assert_eq!(doc.deserialize_str("42", limit(0)), Ok(0));
    assert_eq!(
        doc.deserialize_str("{}", limit(0)),
        Err(DeserializationError::TooDeep)
    );

    // Skipped containers count too: twelve levels deep
    let deep = format!("[1, {}{}]", "[".repeat(11), "]".repeat(11));
    for (n, expected) in [
        (10, Err(DeserializationError::TooDeep)),
        (11, Err(DeserializationError::TooDeep)),
        (12, Ok(0)),
    ] {
        assert_eq!(
            doc.deserialize_str(&deep, limit(n).with_filter(Filter::deny())),
            expected,
            "limit {}",
            n
        );
    }
}

#[test]
fn test_default_nesting_limit_is_ten() {
    let mut doc = Document::new([0u8; 512]);
    let ten = "[[[[[[[[[[]]]]]]]]]]";
    let eleven = "[[[[[[[[[[[]]]]]]]]]]]";
    assert!(doc.deserialize_str(ten, DeserializeOptions::new()).is_ok());
    assert_eq!(
        doc.deserialize_str(eleven, DeserializeOptions::new()),
        Err(DeserializationError::TooDeep)
    );
}

#[test]
fn test_no_memory_on_fixed_pool() {
    let mut doc = Document::new([0u8; 48]);
    assert_eq!(doc.deserialize_str("[1,2,3]", DeserializeOptions::new()), Ok(48));
    assert_eq!(
        doc.deserialize_str("[1,2,3,4]", DeserializeOptions::new()),
        Err(DeserializationError::NoMemory)
    );
    assert!(doc.root().is_null());
    assert_eq!(doc.memory_usage(), 0);

    // Skipped input needs no memory at all
    let mut filter_doc = Document::new([0u8; 16]);
    filter_doc.deserialize_str("[true]", DeserializeOptions::new()).unwrap();
    let options = DeserializeOptions::new().with_filter(filter_doc.as_filter());
    assert_eq!(doc.deserialize_str("[1,2,3,4,5,6,7,8,9]", options), Ok(16));
}

#[test]
fn test_streamed_input() {
    for chunk_size in [1, 2, 5, 64] {
        let mut doc = Document::new([0u8; 512]);
        let used = doc
            .deserialize_reader(
                ChunkReader::new(SENSOR.as_bytes(), chunk_size),
                DeserializeOptions::new(),
            )
            .unwrap();
        assert_eq!(doc.root().get("tags").get("quoted").as_str(), "it\"s");
        assert!(!doc.root().get("sensor").is_borrowed_str());

        let mut sliced = Document::new([0u8; 512]);
        let zero_copy = sliced.deserialize_str(SENSOR, DeserializeOptions::new()).unwrap();
        assert_eq!(doc.root(), sliced.root(), "chunk size {}", chunk_size);
        assert!(used > zero_copy);
    }
}

#[test]
fn test_streamed_filtered_usage() {
    let mut filter_doc = Document::new([0u8; 16]);
    filter_doc.deserialize_str("true", DeserializeOptions::new()).unwrap();
    let options = DeserializeOptions::new().with_filter(filter_doc.as_filter());

    let mut doc = Document::new([0u8; 256]);
    let input = br#"{"abcdefg":"hijklmn"}"#;
    assert_eq!(
        doc.deserialize_reader(ChunkReader::new(input, 3), options),
        Ok(32 + 7 + 7)
    );
    assert_eq!(doc.root().to_string(), r#"{"abcdefg":"hijklmn"}"#);

    // Keys of dropped members give their memory back
    let mut filter_doc = Document::new([0u8; 64]);
    filter_doc
        .deserialize_str(r#"{"b":true}"#, DeserializeOptions::new())
        .unwrap();
    let options = DeserializeOptions::new().with_filter(filter_doc.as_filter());
    let input = br#"{"aaaaaaaa":1,"b":2,"cccccccc":[3]}"#;
    assert_eq!(
        doc.deserialize_reader(ChunkReader::new(input, 4), options),
        Ok(32 + 1)
    );
}

#[test]
fn test_streamed_incomplete_input() {
    let mut doc = Document::new([0u8; 256]);
    assert_eq!(
        doc.deserialize_reader(
            ChunkReader::new(br#"{"a": "unterminated"#, 3),
            DeserializeOptions::new()
        ),
        Err(DeserializationError::IncompleteInput)
    );
    assert!(doc.root().is_null());
}

#[test]
fn test_unicode_escapes() {
    let mut doc = Document::new([0u8; 256]);
    doc.deserialize_str(
        r#"["caf\u00e9", "\ud83d\ude00", "tab\there", "sl\/ash", "snow ☃"]"#,
        DeserializeOptions::new(),
    )
    .unwrap();
    let root = doc.root();
    assert_eq!(root.at(0).as_str(), "café");
    assert_eq!(root.at(1).as_str(), "😀");
    assert_eq!(root.at(2).as_str(), "tab\there");
    assert_eq!(root.at(3).as_str(), "sl/ash");
    assert_eq!(root.at(4).as_str(), "snow ☃");
    assert!(root.at(4).is_borrowed_str());
}

#[test]
fn test_display_round_trips_through_parser() {
    let mut doc = Document::new([0u8; 512]);
    doc.deserialize_str(SENSOR, DeserializeOptions::new()).unwrap();
    let rendered = doc.root().to_string();
    assert_eq!(
        rendered,
        r#"{"sensor":"gps","time":1351824120,"data":[48.75608,2.302038],"tags":{"unit":"deg","quoted":"it\"s"}}"#
    );

    let mut again = Document::new([0u8; 512]);
    again.deserialize_str(&rendered, DeserializeOptions::new()).unwrap();
    assert_eq!(doc.root(), again.root());
}

#[test]
fn test_integral_floats_stay_floats_after_round_trip() {
    let mut doc = Document::new([0u8; 128]);
    doc.deserialize_str("[1E3, -3.5e2, 2, 0.5]", DeserializeOptions::new())
        .unwrap();
    let rendered = doc.root().to_string();
    assert_eq!(rendered, "[1000.0,-350.0,2,0.5]");

    let mut again = Document::new([0u8; 128]);
    again.deserialize_str(&rendered, DeserializeOptions::new()).unwrap();
    assert!(again.root().at(0).is_float());
    assert!(again.root().at(2).is_integer());
    assert_eq!(doc.root(), again.root());
}

#[cfg(feature = "alloc")]
#[test]
fn test_growable_pool_keeps_tree_intact() {
    use pooljson::DynamicDocument;

    let mut input = String::from("[");
    for i in 0..100 {
        if i > 0 {
            input.push(',');
        }
        input.push_str(&format!(r#"{{"id":{},"name":"item {}"}}"#, i, i));
    }
    input.push(']');

    let mut doc = DynamicDocument::growable(64, 1 << 16);
    let used = doc.deserialize_str(&input, DeserializeOptions::new()).unwrap();
    assert!(doc.capacity() >= used);
    assert!(doc.capacity() > 64);
    let root = doc.root();
    assert_eq!(root.len(), 100);
    assert_eq!(root.at(0).get("name").as_str(), "item 0");
    assert_eq!(root.at(99).get("id").as_int(), 99);
    assert_eq!(root.at(57).get("name").as_str(), "item 57");
}
