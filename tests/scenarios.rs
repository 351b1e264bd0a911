//! Integration tests for the batch driver end to end.

use std::io::Write;
use std::sync::{Arc, Mutex};

use aoristic::{run, run_with, BatchOptions, ColumnSpec, WeeklyBucketIndex};
use proptest::prelude::*;
use rstest::rstest;
use serde_json::{json, Value};

const EPS: f64 = 1e-9;

fn columns() -> ColumnSpec {
    ColumnSpec {
        x_col: "x".into(),
        y_col: "y".into(),
        start_col: "start".into(),
        end_col: "end".into(),
    }
}

fn event(start: Value, end: Value) -> Value {
    json!({ "x": 30.25, "y": -97.75, "start": start, "end": end })
}

fn bucket(n: u16) -> WeeklyBucketIndex {
    WeeklyBucketIndex::new(n).unwrap()
}

// 2024-03-03 is a Sunday; bucket 1 = Sunday 00:00.
#[test]
fn monday_night_into_tuesday() {
    let table = vec![event(json!("2024-03-04 23:30"), json!("2024-03-05 00:45"))];
    let output = run(&table, &columns()).unwrap();
    let row = &output.rows[0];

    assert_eq!(row.duration_minutes, Some(75));
    assert!((row.weights.get(bucket(48)) - 30.0 / 75.0).abs() < EPS);
    assert!((row.weights.get(bucket(49)) - 45.0 / 75.0).abs() < EPS);
    assert_eq!(row.weights.non_zero().count(), 2);
    assert_eq!(output.diagnostics.logic_error, 0);
}

#[test]
fn sunday_without_end() {
    let table = vec![event(json!("2024-03-03 10:15"), Value::Null)];
    let output = run(&table, &columns()).unwrap();
    let row = &output.rows[0];

    assert_eq!(row.duration_minutes, Some(1));
    assert_eq!(row.weights.get(bucket(11)), 1.0);
    assert_eq!(row.weights.non_zero().count(), 1);
    assert_eq!(output.diagnostics.missing_end, 1);
}

#[test]
fn missing_start_is_kept_with_zero_weights() {
    let table = vec![
        event(json!("2024-03-03 10:15"), json!("2024-03-03 11:15")),
        event(Value::Null, json!("2024-03-05 00:45")),
    ];
    let output = run(&table, &columns()).unwrap();

    assert_eq!(output.rows.len(), 2);
    assert!(output.rows[1].skipped());
    assert_eq!(output.rows[1].weights.sum(), 0.0);
    assert_eq!(output.skipped_rows(), vec![1]);
    assert_eq!(output.diagnostics.skipped, 1);

    let payload = output.into_payload();
    assert_eq!(payload.rows[1]["duration"], Value::Null);
    assert_eq!(payload.rows[1]["hour1"], json!(0.0));
}

#[test]
fn wednesday_zero_duration() {
    let table = vec![event(json!("2024-03-06 08:00"), json!("2024-03-06 08:00"))];
    let output = run(&table, &columns()).unwrap();
    let row = &output.rows[0];

    assert_eq!(row.duration_minutes, Some(0));
    assert_eq!(row.weights.get(bucket(81)), 1.0);
    assert_eq!(row.weights.non_zero().count(), 1);
}

#[test]
fn end_before_start_goes_to_start_bucket() {
    let table = vec![event(json!("2024-03-06 08:20"), json!("2024-03-06 06:00"))];
    let output = run(&table, &columns()).unwrap();
    let row = &output.rows[0];

    assert_eq!(row.duration_minutes, Some(-140));
    assert_eq!(row.weights.get(bucket(81)), 1.0);
    assert_eq!(row.weights.non_zero().count(), 1);
    assert_eq!(output.diagnostics.logic_error, 1);
}

#[test]
fn saturday_night_wraps_to_sunday() {
    let table = vec![event(json!("2024-03-09 23:00"), json!("2024-03-10 02:00"))];
    let output = run(&table, &columns()).unwrap();
    let weights = &output.rows[0].weights;

    for n in [168, 1, 2] {
        assert!((weights.get(bucket(n)) - 1.0 / 3.0).abs() < EPS);
    }
    assert_eq!(weights.non_zero().count(), 3);
}

#[test]
fn long_event_is_flat() {
    let table = vec![event(json!("2024-03-01 00:00"), json!("2024-03-12 00:00"))];
    let output = run(&table, &columns()).unwrap();
    let weights = &output.rows[0].weights;

    assert!(weights.as_slice().iter().all(|w| *w == 1.0 / 168.0));
}

#[test]
fn leap_second_is_counted_as_rogue() {
    let table = vec![event(json!("2016-12-31T23:59:60Z"), json!("2017-01-01T00:30:00Z"))];
    let output = run(&table, &columns()).unwrap();

    assert_eq!(output.diagnostics.rogue_na, 1);
    assert_eq!(output.diagnostics.unfixable, 0);
    assert_eq!(output.rows[0].duration_minutes, Some(30));
    // the repaired interval is Sunday 00:00:00-00:30:01, all in bucket 1
    let weights = &output.rows[0].weights;
    assert!((weights.get(bucket(1)) - 1.0).abs() < EPS);
    assert_eq!(weights.get(bucket(168)), 0.0);
    assert_eq!(weights.non_zero().count(), 1);
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn missing_start_logs_warning() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let table = vec![
        event(json!("2024-03-03 10:15"), json!("2024-03-03 11:15")),
        event(Value::Null, json!("2024-03-05 00:45")),
    ];
    let output = tracing::subscriber::with_default(subscriber, || {
        run_with(&table, &columns(), &BatchOptions { parallel: false }).unwrap()
    });

    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let warnings: Vec<&str> = text.lines().filter(|l| l.contains("WARN")).collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("row 1 skipped"));
    assert_eq!(output.rows[1].weights.sum(), 0.0);
}

#[rstest]
#[case("2024-03-06 08:00", "2024-03-06 08:01", 1, 1)]
#[case("2024-03-06 08:59", "2024-03-06 09:01", 2, 2)]
#[case("2024-03-06 08:00", "2024-03-06 08:02", 2, 1)]
fn one_and_two_minute_boundary(
    #[case] start: &str,
    #[case] end: &str,
    #[case] duration: i64,
    #[case] buckets: usize,
) {
    let output = run(&[event(json!(start), json!(end))], &columns()).unwrap();
    let row = &output.rows[0];

    assert_eq!(row.duration_minutes, Some(duration));
    assert_eq!(row.weights.non_zero().count(), buckets);
    assert!((row.weights.sum() - 1.0).abs() < EPS);
}

#[test]
fn fields_pass_through_in_order() {
    let table = vec![json!({ "id": "A-17", "y": 1.0, "x": 2.0, "start": "2024-03-04 10:00", "end": null })];
    let payload = run(&table, &columns()).unwrap().into_payload();
    let keys: Vec<&str> = payload.rows[0].keys().map(String::as_str).collect();

    assert_eq!(&keys[..6], ["id", "y", "x", "start", "end", "duration"]);
    assert_eq!(keys[6], "hour1");
    assert_eq!(keys.len(), 6 + 168);
    assert_eq!(payload.rows[0]["id"], json!("A-17"));
}

#[test]
fn parallel_and_sequential_agree() {
    let table: Vec<Value> = (0..200)
        .map(|i| {
            let start = format!("2024-03-{:02} {:02}:{:02}", 1 + i % 28, i % 24, (i * 7) % 60);
            let end = if i % 5 == 0 {
                Value::Null
            } else {
                json!(format!("2024-03-{:02} {:02}:{:02}", 1 + (i + i % 3) % 28, (i * 5) % 24, (i * 11) % 60))
            };
            event(json!(start), end)
        })
        .collect();

    let parallel = run_with(&table, &columns(), &BatchOptions { parallel: true }).unwrap();
    let sequential = run_with(&table, &columns(), &BatchOptions { parallel: false }).unwrap();

    assert_eq!(parallel, sequential);
    assert_eq!(parallel.rows.len(), 200);
    assert!(parallel.rows.iter().enumerate().all(|(i, r)| r.row == i));
    assert_eq!(parallel.diagnostics.missing_end, 40);
}

proptest! {
    #[test]
    fn spans_under_a_week_sum_to_one(offset in 0i64..10_080, duration in 2i64..10_080) {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 3, 3).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let start = base + chrono::TimeDelta::minutes(offset);
        let end = start + chrono::TimeDelta::minutes(duration);
        let fmt = "%Y-%m-%d %H:%M";
        let table = vec![event(json!(start.format(fmt).to_string()), json!(end.format(fmt).to_string()))];

        let output = run(&table, &columns()).unwrap();
        prop_assert_eq!(output.rows[0].duration_minutes, Some(duration));
        prop_assert!((output.rows[0].weights.sum() - 1.0).abs() < EPS);
    }
}
