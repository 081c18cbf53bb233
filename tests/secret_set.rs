//! Secret file format tests.

use nsm::core::domain::{validate_key, SecretSet};
use nsm::error::ParseError;

#[test]
fn test_parse_sample_with_edge_cases() {
    let set = SecretSet::parse(
        r#"
# This is a comment
SIMPLE=value
QUOTED="quoted value"
SINGLE_QUOTED='single quoted'
SPACES_IN_VALUE=hello world
  INDENTED = padded
SPECIAL_CHARS=p@ssw0rd!#$%
"#,
    )
    .unwrap();

    assert_eq!(set.len(), 6);
    assert_eq!(set.get("QUOTED"), Some("quoted value"));
    assert_eq!(set.get("SINGLE_QUOTED"), Some("single quoted"));
    assert_eq!(set.get("SPACES_IN_VALUE"), Some("hello world"));
    assert_eq!(set.get("INDENTED"), Some("padded"));
    assert_eq!(set.get("SPECIAL_CHARS"), Some("p@ssw0rd!#$%"));
}

#[test]
fn test_crlf_line_endings() {
    let set = SecretSet::parse("A=1\r\nB=2\r\n").unwrap();
    assert_eq!(set.get("A"), Some("1"));
    assert_eq!(set.get("B"), Some("2"));
}

#[test]
fn test_malformed_line_number_counts_comments() {
    let err = SecretSet::parse("# one\n\nA=1\nbroken\n").unwrap_err();
    assert!(matches!(err, ParseError::MalformedLine { line: 4, .. }));
}

#[test]
fn test_serialize_keeps_insertion_order() {
    let mut set = SecretSet::new();
    set.insert("Z", "1").unwrap();
    set.insert("A", "2").unwrap();
    set.insert("Z", "3").unwrap();

    assert_eq!(set.serialize(), "Z=3\nA=2\n");
}

#[test]
fn test_remove() {
    let mut set = SecretSet::parse("A=1\nB=2\n").unwrap();

    assert_eq!(set.remove("A"), Some("1".to_string()));
    assert_eq!(set.remove("A"), None);
    assert_eq!(set.serialize(), "B=2\n");
}

#[test]
fn test_insert_refuses_keys_the_parser_cannot_read() {
    let mut set = SecretSet::new();

    let err = set.insert("DB=URL", "x").unwrap_err();
    assert!(matches!(err, ParseError::InvalidKey { .. }));
    assert!(set.insert("#NOTE", "y").is_err());
    assert!(set.insert("", "z").is_err());
    assert_eq!(set.serialize(), "");
}

#[test]
fn test_debug_hides_values() {
    let set = SecretSet::parse("TOKEN=super-secret\n").unwrap();
    let debug = format!("{:?}", set);

    assert!(debug.contains("TOKEN"));
    assert!(!debug.contains("super-secret"));
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> impl Strategy<Value = String> {
        "[^\n\r=]{1,20}".prop_filter("readable key", |k| validate_key(k).is_ok())
    }

    fn entries() -> impl Strategy<Value = Vec<(String, String)>> {
        proptest::collection::vec((key(), any::<String>()), 0..12)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn roundtrip_arbitrary_values(pairs in entries()) {
            let set = SecretSet::from_pairs(pairs).unwrap();
            let parsed = SecretSet::parse(&set.serialize()).unwrap();
            prop_assert_eq!(parsed, set);
        }

        #[test]
        fn accepted_keys_round_trip(key in any::<String>(), value in any::<String>()) {
            let mut set = SecretSet::new();
            if set.insert(key.clone(), value).is_ok() {
                let parsed = SecretSet::parse(&set.serialize()).unwrap();
                prop_assert_eq!(parsed.keys().collect::<Vec<_>>(), vec![key.as_str()]);
                prop_assert_eq!(parsed, set);
            }
        }

        #[test]
        fn parser_no_panic(content in "[^\x00]*") {
            let _ = SecretSet::parse(&content);
        }
    }
}
