//! Timestamp decoding at the edges of the representable range.
//!
//! These tests change the process timezone, so they live in their own test
//! binary.

use brolog::types::ScalarType;
use brolog::{read_all_str, CastError, Error, Value};
use chrono::{Local, NaiveDateTime, Offset, TimeZone};

fn east_of_utc() {
    std::env::set_var("TZ", "JST-9");
}

#[test]
fn test_time_past_local_range_is_an_error() {
    east_of_utc();
    let last = NaiveDateTime::MAX.and_utc().timestamp();
    let raw = format!("{}.0", last);

    let offset = Local
        .offset_from_utc_datetime(&NaiveDateTime::MAX)
        .fix()
        .local_minus_utc();
    let result = ScalarType::Time.cast(&raw);
    if offset > 0 {
        assert_eq!(
            result,
            Err(CastError::OutOfRange {
                value: raw.clone(),
                target: "time"
            })
        );
    } else {
        assert!(result.is_ok());
    }
}

#[test]
fn test_time_past_local_range_fails_only_its_line() {
    east_of_utc();
    let last = NaiveDateTime::MAX.and_utc().timestamp();
    let log = format!("#fields ts\n#types time\n{}\n0\n", last);

    let results: Vec<_> = brolog::from_str(&log).unwrap().collect();
    assert_eq!(results.len(), 2);
    if Local
        .offset_from_utc_datetime(&NaiveDateTime::MAX)
        .fix()
        .local_minus_utc()
        > 0
    {
        assert!(matches!(
            results[0],
            Err(Error::Decode {
                line: 3,
                source: CastError::OutOfRange { .. },
                ..
            })
        ));
    }
    assert!(results[1].is_ok());
}

#[test]
fn test_epoch_in_shifted_timezone() {
    east_of_utc();
    let records = read_all_str("#fields ts\n#types time\n0.5\n").unwrap();
    let expected = chrono::DateTime::from_timestamp_micros(500_000)
        .unwrap()
        .with_timezone(&Local)
        .naive_local();
    assert_eq!(records[0]["ts"], Value::Time(expected));
}
