//! Per-operation timing series.
//!
//! Operation names are never written by hand: [`timed!`] and
//! [`operation_name!`] derive them from the enclosing function, so
//! `fn query_100_ids_between` records under `Query100IdsBetween`.

use std::collections::BTreeMap;
use std::time::Duration;

/// Elapsed durations indexed by operation name, in recording order.
#[derive(Debug, Default, Clone)]
pub struct Timings {
    samples: BTreeMap<String, Vec<Duration>>,
}

impl Timings {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample for an operation.
    pub fn record(&mut self, operation: impl Into<String>, elapsed: Duration) {
        self.samples.entry(operation.into()).or_default().push(elapsed);
    }

    /// Samples recorded for an operation, empty if it never ran.
    pub fn samples(&self, operation: &str) -> &[Duration] {
        self.samples
            .get(operation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Names of all recorded operations, sorted.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    /// Total number of samples across all operations.
    pub fn len(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[doc(hidden)]
pub fn type_name_of<T>(_: T) -> &'static str {
    std::any::type_name::<T>()
}

/// Turn the type path of a marker fn declared inside a method into the
/// PascalCase name of that method.
#[doc(hidden)]
pub fn operation_from_path(path: &str) -> String {
    let function = path
        .rsplit("::")
        .filter(|segment| *segment != "{{closure}}")
        .nth(1)
        .unwrap_or(path);
    pascal_case(function)
}

/// `query_100_ids_between` -> `Query100IdsBetween`.
pub fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Name of the enclosing function, in PascalCase.
macro_rules! operation_name {
    () => {{
        fn marker() {}
        $crate::timing::operation_from_path($crate::timing::type_name_of(marker))
    }};
}

/// Evaluate an expression and record its wall-clock time in `$timings`
/// under the enclosing function's name.
macro_rules! timed {
    ($timings:expr, $body:expr) => {{
        let start = ::std::time::Instant::now();
        let result = $body;
        let elapsed = start.elapsed();
        $timings.record($crate::timing::operation_name!(), elapsed);
        result
    }};
}

pub(crate) use operation_name;
pub(crate) use timed;

#[cfg(test)]
mod tests {
    use super::*;

    fn query_100_ids_between() -> String {
        operation_name!()
    }

    fn remove_bulk(timings: &mut Timings) -> usize {
        timed!(timings, 7)
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("init"), "Init");
        assert_eq!(pascal_case("put_bulk"), "PutBulk");
        assert_eq!(pascal_case("query_100_ids_between"), "Query100IdsBetween");
        assert_eq!(pascal_case("query_string_prefix"), "QueryStringPrefix");
    }

    #[test]
    fn test_operation_name_from_enclosing_fn() {
        assert_eq!(query_100_ids_between(), "Query100IdsBetween");
    }

    #[test]
    fn test_operation_name_skips_closures() {
        let name = (|| operation_name!())();
        assert_eq!(name, "TestOperationNameSkipsClosures");
    }

    #[test]
    fn test_operation_from_generic_impl_path() {
        let path = "dbperf_core::executor::<impl dbperf_core::executor::Executor<E>>::put_async::{{closure}}::marker";
        assert_eq!(operation_from_path(path), "PutAsync");
        assert_eq!(operation_from_path("read_all"), "ReadAll");
    }

    #[test]
    fn test_timed_records_under_caller_name() {
        let mut timings = Timings::new();
        assert_eq!(remove_bulk(&mut timings), 7);
        assert_eq!(remove_bulk(&mut timings), 7);
        assert_eq!(timings.samples("RemoveBulk").len(), 2);
        assert_eq!(timings.len(), 2);
    }

    #[test]
    fn test_samples_keep_recording_order() {
        let mut timings = Timings::new();
        timings.record("PutBulk", Duration::from_millis(3));
        timings.record("PutBulk", Duration::from_millis(1));
        timings.record("ReadAll", Duration::from_millis(2));

        assert_eq!(
            timings.samples("PutBulk"),
            &[Duration::from_millis(3), Duration::from_millis(1)]
        );
        assert!(timings.samples("Missing").is_empty());
        assert_eq!(
            timings.operations().collect::<Vec<_>>(),
            vec!["PutBulk", "ReadAll"]
        );
    }
}
