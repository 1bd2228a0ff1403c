//! Aggregated timing report.

use std::io::{self, Write};
use std::time::Duration;

use serde::Serialize;

use crate::timing::Timings;

/// Aggregated samples of one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationTimes {
    pub name: String,
    pub runs: usize,
    /// Mean in milliseconds, `None` when the operation has no samples.
    pub average_ms: Option<f64>,
    /// Every sample in milliseconds, in recording order.
    pub times_ms: Vec<f64>,
}

impl OperationTimes {
    /// Aggregate the samples of one operation.
    ///
    /// The mean is the integer-truncated nanosecond average, converted to
    /// milliseconds afterwards.
    pub fn from_samples(name: impl Into<String>, samples: &[Duration]) -> Self {
        let sum: u128 = samples.iter().map(Duration::as_nanos).sum();
        let average_ms = sum
            .checked_div(samples.len() as u128)
            .map(|mean| mean as f64 / 1_000_000.0);

        Self {
            name: name.into(),
            runs: samples.len(),
            average_ms,
            times_ms: samples.iter().map(|d| d.as_nanos() as f64 / 1_000_000.0).collect(),
        }
    }
}

/// The table printed at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub operations: Vec<OperationTimes>,
    /// Database size after the update phase of the last iteration.
    pub db_size: Option<u64>,
}

impl Report {
    /// Build a report for the given operations, or for every recorded
    /// operation when `order` is empty.
    pub fn new(timings: &Timings, order: &[&str]) -> Self {
        let names: Vec<&str> = if order.is_empty() {
            timings.operations().collect()
        } else {
            order.to_vec()
        };

        let operations = names
            .into_iter()
            .map(|name| OperationTimes::from_samples(name, timings.samples(name)))
            .collect();

        Self {
            operations,
            db_size: None,
        }
    }

    /// Attach the measured database size.
    pub fn with_db_size(mut self, size: u64) -> Self {
        self.db_size = Some(size);
        self
    }

    /// Write the tab-separated table.
    pub fn write_table<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Function\tRuns\tAverage ms\tAll times")?;

        for op in &self.operations {
            match op.average_ms {
                Some(avg) => write!(out, "{}\t{}\t{:.6}", op.name, op.runs, avg)?,
                None => write!(out, "{}\t{}\tNaN", op.name, op.runs)?,
            }
            for ms in &op.times_ms {
                write!(out, "\t{:.6}", ms)?;
            }
            writeln!(out)?;
        }

        if let Some(size) = self.db_size {
            writeln!(out, "DB size after update, before remove: {}", size)?;
        }

        Ok(())
    }

    /// Write the report as a single JSON document.
    pub fn write_json<W: Write>(&self, out: &mut W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out).map_err(serde_json::Error::io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(report: &Report) -> String {
        let mut out = Vec::new();
        report.write_table(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_mean_truncates_nanoseconds() {
        let samples = [Duration::from_nanos(1_000_001), Duration::from_nanos(1_000_002)];
        let op = OperationTimes::from_samples("PutBulk", &samples);

        // (2_000_003 / 2) truncates to 1_000_001 ns
        assert_eq!(op.average_ms, Some(1.000001));
        assert_eq!(op.runs, 2);
        assert_eq!(op.times_ms, vec![1.000001, 1.000002]);
    }

    #[test]
    fn test_table_rows_follow_order() {
        let mut timings = Timings::new();
        timings.record("ReadAll", Duration::from_millis(2));
        timings.record("PutBulk", Duration::from_millis(1));
        timings.record("PutBulk", Duration::from_millis(3));

        let report = Report::new(&timings, &["PutBulk", "ReadAll"]).with_db_size(4096);
        let text = table(&report);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Function\tRuns\tAverage ms\tAll times");
        assert_eq!(lines[1], "PutBulk\t2\t2.000000\t1.000000\t3.000000");
        assert_eq!(lines[2], "ReadAll\t1\t2.000000\t2.000000");
        assert_eq!(lines[3], "DB size after update, before remove: 4096");
    }

    #[test]
    fn test_row_has_one_value_per_sample() {
        let mut timings = Timings::new();
        for ms in 1..=5 {
            timings.record("RemoveAll", Duration::from_millis(ms));
        }

        let text = table(&Report::new(&timings, &["RemoveAll"]));
        let row = text.lines().nth(1).unwrap();
        let fields: Vec<&str> = row.split('\t').collect();

        // name, runs, average, then the samples
        assert_eq!(fields.len(), 3 + 5);
        assert_eq!(&fields[3..], &["1.000000", "2.000000", "3.000000", "4.000000", "5.000000"]);
    }

    #[test]
    fn test_empty_order_reports_everything() {
        let mut timings = Timings::new();
        timings.record("Init", Duration::from_millis(1));
        timings.record("Close", Duration::from_millis(1));

        let report = Report::new(&timings, &[]);
        let names: Vec<&str> = report.operations.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Close", "Init"]);
    }

    #[test]
    fn test_operation_without_samples() {
        let report = Report::new(&Timings::new(), &["Query100IdsBetween"]);
        assert_eq!(report.operations[0].average_ms, None);
        assert_eq!(table(&report).lines().nth(1), Some("Query100IdsBetween\t0\tNaN"));
    }

    #[test]
    fn test_json_report() {
        let mut timings = Timings::new();
        timings.record("PutBulk", Duration::from_millis(1));
        let report = Report::new(&timings, &["PutBulk"]).with_db_size(10);

        let mut out = Vec::new();
        report.write_json(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["db_size"], 10);
        assert_eq!(value["operations"][0]["name"], "PutBulk");
        assert_eq!(value["operations"][0]["runs"], 1);
    }
}
