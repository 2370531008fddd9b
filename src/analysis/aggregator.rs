//! Rejection aggregation and count ordering.
//!
//! A single pass over captured output lines builds the per-descriptor and
//! per-test tallies; the per-format tally is derived from the distinct
//! descriptors afterwards.

use super::patterns;
use crate::cli::LineEnding;
use crate::error::{Result, TallyError};
use crate::models::{FormatId, RejectionTallies, TallyEntry};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::hash::Hash;
use tracing::{debug, trace};

/// Split captured output into lines.
///
/// `Crlf` splits on `"\r\n"` only, so LF-only output stays a single line.
pub fn split_lines(text: &str, line_ending: LineEnding) -> Vec<&str> {
    match line_ending {
        LineEnding::Crlf => text.split("\r\n").collect(),
        LineEnding::Lf => text.split('\n').collect(),
        LineEnding::Any => text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect(),
    }
}

/// Tally rejections in `text`.
///
/// The current test name starts empty and changes only on a `RUN` line.
/// A line may both start a test and report a rejection; the new name applies.
pub fn aggregate(text: &str, line_ending: LineEnding) -> RejectionTallies {
    let mut tallies = RejectionTallies::default();
    let mut current_test = "";

    for line in split_lines(text, line_ending) {
        if let Some(name) = patterns::test_name(line) {
            trace!("Test started: {}", name);
            current_test = name;
        }

        let Some(descriptor) = patterns::rejected_descriptor(line) else {
            continue;
        };

        tallies.record(descriptor, current_test);
    }

    debug!(
        "Found {} rejections across {} resources",
        tallies.total_rejections(),
        tallies.unique_resources()
    );

    tallies
}

/// Count distinct rejected descriptors per `"Format"` value.
///
/// Each descriptor contributes once, however often it was rejected.
pub fn format_counts(tallies: &RejectionTallies) -> Result<IndexMap<FormatId, usize>> {
    let mut counts: IndexMap<FormatId, usize> = IndexMap::new();

    for descriptor in tallies.by_resource.keys() {
        let format = descriptor_format(descriptor)?;
        *counts.entry(format).or_default() += 1;
    }

    Ok(counts)
}

/// Read the `"Format"` field of a descriptor.
pub fn descriptor_format(descriptor: &str) -> Result<FormatId> {
    let value: Value = serde_json::from_str(descriptor).map_err(|source| TallyError::Parse {
        descriptor: descriptor.to_string(),
        source,
    })?;

    match value.get("Format") {
        Some(format) => Ok(FormatId::from_value(format)),
        None => Err(TallyError::MissingFormat {
            descriptor: descriptor.to_string(),
        }),
    }
}

/// Entries sorted ascending by count. Ties keep map order.
pub fn sorted_by_count<K: Hash + Eq>(map: &IndexMap<K, usize>) -> Vec<(&K, usize)> {
    let mut entries: Vec<(&K, usize)> = map.iter().map(|(k, v)| (k, *v)).collect();
    entries.sort_by_key(|(_, count)| *count);
    entries
}

/// Sorted report entries for a tally, named by each key's display text.
pub fn to_entries<K: Hash + Eq + fmt::Display>(map: &IndexMap<K, usize>) -> Vec<TallyEntry> {
    sorted_by_count(map)
        .into_iter()
        .map(|(name, count)| TallyEntry::new(name.to_string(), count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_line(test: &str) -> String {
        format!("[ RUN      ] {}/D3D12_Intel_R_UHD_Graphics_630", test)
    }

    fn rejection_line(format: u32, width: u32) -> String {
        format!(
            "Resource alignment is rejected, resource : {{ \"Dimension\": 3, \"Alignment\": 4096, \
             \"Width\": {}, \"Height\": 1, \"Format\": {}, \"SampleDesc\": {{ \"Count\": 1, \
             \"Quality\": 0 }},\"Flags\": 0 }}",
            width, format
        )
    }

    fn crlf(lines: &[String]) -> String {
        lines.join("\r\n")
    }

    #[test]
    fn test_no_rejections() {
        let text = crlf(&[run_line("BufferTests.MapRead"), "[       OK ]".to_string()]);
        let tallies = aggregate(&text, LineEnding::Crlf);
        assert!(tallies.is_empty());
        assert!(tallies.by_test.is_empty());
        assert_eq!(tallies.unique_resources(), 0);
    }

    #[test]
    fn test_identical_descriptors_counted_once_as_unique() {
        let text = crlf(&[
            run_line("TextureTests.Copy"),
            rejection_line(28, 64),
            rejection_line(28, 64),
        ]);
        let tallies = aggregate(&text, LineEnding::Crlf);

        assert_eq!(tallies.unique_resources(), 1);
        assert_eq!(tallies.by_resource.values().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_rejections_attributed_to_current_test() {
        let text = crlf(&[
            run_line("TestA"),
            rejection_line(28, 64),
            rejection_line(28, 128),
            run_line("TestB"),
            rejection_line(28, 256),
        ]);
        let tallies = aggregate(&text, LineEnding::Crlf);

        assert_eq!(tallies.by_test.get("TestA"), Some(&2));
        assert_eq!(tallies.by_test.get("TestB"), Some(&1));
    }

    #[test]
    fn test_rejection_before_any_test_uses_empty_name() {
        let text = crlf(&[rejection_line(10, 64)]);
        let tallies = aggregate(&text, LineEnding::Crlf);
        assert_eq!(tallies.by_test.get(""), Some(&1));
    }

    #[test]
    fn test_format_counts_distinct_descriptors() {
        let text = crlf(&[
            run_line("TestA"),
            rejection_line(10, 64),
            rejection_line(10, 64),
            rejection_line(10, 64),
            rejection_line(10, 128),
            rejection_line(12, 64),
        ]);
        let tallies = aggregate(&text, LineEnding::Crlf);
        let formats = format_counts(&tallies).unwrap();

        assert_eq!(formats.get(&FormatId::from_value(&Value::from(10))), Some(&2));
        assert_eq!(formats.get(&FormatId::from_value(&Value::from(12))), Some(&1));

        let sorted: Vec<(String, usize)> = sorted_by_count(&formats)
            .into_iter()
            .map(|(format, count)| (format.to_string(), count))
            .collect();
        assert_eq!(sorted, vec![("12".to_string(), 1), ("10".to_string(), 2)]);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let text = crlf(&[
            run_line("TestA"),
            rejection_line(10, 64),
            run_line("TestB"),
            rejection_line(12, 64),
        ]);
        assert_eq!(
            aggregate(&text, LineEnding::Crlf),
            aggregate(&text, LineEnding::Crlf)
        );
    }

    #[test]
    fn test_crlf_split_does_not_split_lf_output() {
        let text = [run_line("TestA"), rejection_line(10, 64), rejection_line(12, 64)].join("\n");

        assert_eq!(split_lines(&text, LineEnding::Crlf).len(), 1);

        // The whole text is one line, so at most one rejection is matched.
        let tallies = aggregate(&text, LineEnding::Crlf);
        assert_eq!(tallies.total_rejections(), 1);
    }

    #[test]
    fn test_any_split_handles_both_terminators() {
        let text = format!(
            "{}\r\n{}\n{}\r\n",
            run_line("TestA"),
            rejection_line(10, 64),
            rejection_line(12, 64)
        );

        let lines = split_lines(&text, LineEnding::Any);
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| !l.ends_with('\r')));

        let tallies = aggregate(&text, LineEnding::Any);
        assert_eq!(tallies.total_rejections(), 2);
        assert_eq!(tallies.by_test.get("TestA"), Some(&2));
    }

    #[test]
    fn test_lf_split() {
        let text = [run_line("TestA"), rejection_line(10, 64)].join("\n");
        let tallies = aggregate(&text, LineEnding::Lf);
        assert_eq!(tallies.by_test.get("TestA"), Some(&1));
    }

    #[test]
    fn test_descriptor_format_values() {
        assert_eq!(descriptor_format("{ \"Format\": 28 }").unwrap().to_string(), "28");
        assert_eq!(
            descriptor_format("{ \"Format\": \"R8G8B8A8_UNORM\" }")
                .unwrap()
                .to_string(),
            "R8G8B8A8_UNORM"
        );
    }

    #[test]
    fn test_descriptor_format_errors() {
        assert!(matches!(
            descriptor_format("{ \"Format\": 28, }"),
            Err(TallyError::Parse { .. })
        ));
        assert!(matches!(
            descriptor_format("{ \"Width\": 64 }"),
            Err(TallyError::MissingFormat { .. })
        ));
    }

    #[test]
    fn test_format_counts_keys_by_json_value() {
        let mut tallies = RejectionTallies::default();
        tallies.record("{\"Format\": 10}", "TestA");
        tallies.record("{\"Format\": \"10\"}", "TestA");
        tallies.record("{\"Format\": true}", "TestA");

        let entries = to_entries(&format_counts(&tallies).unwrap());
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["10", "10", "True"]);
        assert!(entries.iter().all(|e| e.count == 1));
    }

    #[test]
    fn test_format_counts_propagates_parse_error() {
        let mut tallies = RejectionTallies::default();
        tallies.record("{ not json }", "TestA");
        assert!(format_counts(&tallies).is_err());
    }

    #[test]
    fn test_sorted_by_count_is_stable() {
        let mut map: IndexMap<String, usize> = IndexMap::new();
        map.insert("first".to_string(), 2);
        map.insert("second".to_string(), 1);
        map.insert("third".to_string(), 2);

        let entries = to_entries(&map);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first", "third"]);
    }
}
