//! Property-based tests for value decoding
//!
//! These complement the integration tests by checking the decoding rules
//! over generated cells and whole generated logs.

use brolog::types::{ScalarType, FALSE_LITERALS, TRUE_LITERALS};
use brolog::{read_all_str, CastError, Error, Value};
use proptest::prelude::*;

/// Builds a tab-separated log with one column per `(name, type)` and the
/// given data rows.
fn build_log(columns: &[(&str, &str)], rows: &[Vec<String>]) -> String {
    let names: Vec<&str> = columns.iter().map(|(n, _)| *n).collect();
    let types: Vec<&str> = columns.iter().map(|(_, t)| *t).collect();
    let mut log = format!(
        "#separator \\x09\n#set_separator\t,\n#empty_field\t(empty)\n#unset_field\t-\n#fields\t{}\n#types\t{}\n",
        names.join("\t"),
        types.join("\t")
    );
    for row in rows {
        log.push_str(&row.join("\t"));
        log.push('\n');
    }
    log
}

proptest! {
    #[test]
    fn prop_port_in_range(p in 0u32..65536) {
        prop_assert_eq!(ScalarType::Port.cast(&p.to_string()), Ok(Value::Port(p as u16)));
    }

    #[test]
    fn prop_port_out_of_range(p in 65536u64..10_000_000) {
        prop_assert_eq!(
            ScalarType::Port.cast(&p.to_string()),
            Err(CastError::NotBelowMaximum { value: i128::from(p), max: 65536 })
        );
    }

    #[test]
    fn prop_negative_count_rejected(n in 1i64..i64::MAX) {
        prop_assert_eq!(
            ScalarType::Count.cast(&format!("-{}", n)),
            Err(CastError::BelowMinimum { value: -i128::from(n), min: 0 })
        );
    }

    #[test]
    fn prop_count(n in any::<u64>()) {
        prop_assert_eq!(ScalarType::Count.cast(&n.to_string()), Ok(Value::Count(n)));
    }

    #[test]
    fn prop_int(n in any::<i64>()) {
        prop_assert_eq!(ScalarType::Int.cast(&n.to_string()), Ok(Value::Int(n)));
    }

    #[test]
    fn prop_bool_literals(i in 0usize..5) {
        prop_assert_eq!(ScalarType::Bool.cast(TRUE_LITERALS[i]), Ok(Value::Bool(true)));
        prop_assert_eq!(ScalarType::Bool.cast(FALSE_LITERALS[i]), Ok(Value::Bool(false)));
    }

    #[test]
    fn prop_bool_rejects_other_text(s in "[a-zA-Z0-9]{2,8}") {
        prop_assert_eq!(ScalarType::Bool.cast(&s), Err(CastError::InvalidBool { value: s.clone() }));
    }

    #[test]
    fn prop_strings_kept_verbatim(s in "[a-zA-Z0-9.,:/_][a-zA-Z0-9 .,:/_()-]{0,19}") {
        prop_assume!(s != "-");
        let log = build_log(&[("s", "string")], &[vec![s.clone()]]);
        let records = read_all_str(&log).unwrap();
        prop_assert_eq!(&records[0]["s"], &Value::String(s));
    }

    #[test]
    fn prop_unset_is_null_for_every_type(
        ty in prop::sample::select(vec![
            "addr", "bool", "count", "double", "enum", "int", "interval", "port",
            "string", "subnet", "time", "set[count]", "vector[string]",
        ])
    ) {
        let log = build_log(&[("x", ty)], &[vec!["-".to_string()]]);
        let records = read_all_str(&log).unwrap();
        prop_assert!(records[0]["x"].is_null());
    }

    #[test]
    fn prop_vector_keeps_order_and_duplicates(items in prop::collection::vec(0u64..1000, 1..20)) {
        let cell = items.iter().map(u64::to_string).collect::<Vec<_>>().join(",");
        let log = build_log(&[("v", "vector[count]")], &[vec![cell]]);
        let records = read_all_str(&log).unwrap();
        let expected: Vec<Value> = items.iter().copied().map(Value::Count).collect();
        prop_assert_eq!(&records[0]["v"], &Value::Vector(expected));
    }

    #[test]
    fn prop_set_collapses_duplicates(items in prop::collection::vec(0u64..10, 1..30)) {
        let cell = items.iter().map(u64::to_string).collect::<Vec<_>>().join(",");
        let log = build_log(&[("s", "set[count]")], &[vec![cell]]);
        let records = read_all_str(&log).unwrap();

        let mut distinct = items.clone();
        distinct.sort_unstable();
        distinct.dedup();
        let set = records[0]["s"].as_set().unwrap();
        prop_assert_eq!(set.len(), distinct.len());
        for n in distinct {
            prop_assert!(set.contains(&Value::Count(n)));
        }
    }

    #[test]
    fn prop_wrong_cell_count(extra in 1usize..5) {
        let row: Vec<String> = (0..2 + extra).map(|i| i.to_string()).collect();
        let log = build_log(&[("a", "count"), ("b", "count")], &[row]);
        match read_all_str(&log) {
            Err(Error::FieldCount { expected, found, .. }) => {
                prop_assert_eq!(expected, 2);
                prop_assert_eq!(found, 2 + extra);
            }
            other => prop_assert!(false, "unexpected result {:?}", other),
        }
    }

    #[test]
    fn prop_record_keys_follow_header(n in 1usize..12) {
        let columns: Vec<(String, &str)> = (0..n).map(|i| (format!("f{}", i), "count")).collect();
        let borrowed: Vec<(&str, &str)> = columns.iter().map(|(c, t)| (c.as_str(), *t)).collect();
        let row: Vec<String> = (0..n).map(|i| i.to_string()).collect();
        let records = read_all_str(&build_log(&borrowed, &[row])).unwrap();

        let keys: Vec<&str> = records[0].keys().collect();
        let expected: Vec<&str> = borrowed.iter().map(|(c, _)| *c).collect();
        prop_assert_eq!(keys, expected);
    }
}
