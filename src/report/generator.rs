//! Report generation.
//!
//! The text report's wording is consumed by scripts scraping this tool's
//! output and must not change.

use crate::analysis::{format_counts, sorted_by_count, to_entries};
use crate::error::Result;
use crate::models::{RejectionReport, RejectionTallies, ReportMetadata};
use anyhow::Result as AnyResult;

/// Generate the plain text report.
///
/// With no rejections only the unique-resource line and a blank line are
/// produced, and descriptors are never parsed.
pub fn generate_text_report(tallies: &RejectionTallies) -> Result<String> {
    let mut output = String::new();

    output.push_str(&generate_unique_section(tallies));
    if tallies.is_empty() {
        return Ok(output);
    }

    output.push_str(&generate_test_section(tallies));

    let formats = format_counts(tallies)?;
    output.push_str("Total occurrences (by format):\n");
    for (format_id, count) in sorted_by_count(&formats) {
        output.push_str(&format!("Format ID:{} ({}).\n", format_id, count));
    }
    output.push('\n');

    Ok(output)
}

/// Generate the unique resource count section.
fn generate_unique_section(tallies: &RejectionTallies) -> String {
    format!(
        "Unique resources alignment rejected: {}\n\n",
        tallies.unique_resources()
    )
}

/// Generate the per-test section.
fn generate_test_section(tallies: &RejectionTallies) -> String {
    let mut section = String::from("Occurrences by test:\n");

    for (test_name, count) in sorted_by_count(&tallies.by_test) {
        section.push_str(&format!("{} ({}).\n", test_name, count));
    }
    section.push('\n');

    section
}

/// Build the serialisable report.
pub fn build_report(tallies: &RejectionTallies, metadata: ReportMetadata) -> Result<RejectionReport> {
    let formats = format_counts(tallies)?;

    Ok(RejectionReport {
        metadata,
        unique_resources: tallies.unique_resources(),
        total_rejections: tallies.total_rejections(),
        by_resource: to_entries(&tallies.by_resource),
        by_test: to_entries(&tallies.by_test),
        by_format: to_entries(&formats),
    })
}

/// Generate a JSON report.
pub fn generate_json_report(report: &RejectionReport) -> AnyResult<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;
    use crate::models::OutputSource;
    use chrono::Utc;

    fn create_test_tallies() -> RejectionTallies {
        let mut tallies = RejectionTallies::default();
        tallies.record("{ \"Format\": 10, \"Width\": 64 }", "TestA");
        tallies.record("{ \"Format\": 10, \"Width\": 64 }", "TestA");
        tallies.record("{ \"Format\": 10, \"Width\": 128 }", "TestB");
        tallies.record("{ \"Format\": 12, \"Width\": 64 }", "TestA");
        tallies
    }

    fn create_test_metadata() -> ReportMetadata {
        ReportMetadata {
            generated_at: Utc::now(),
            backend: "d3d12".to_string(),
            adapter_vendor_id: "0x8086".to_string(),
            source: OutputSource::Replay {
                path: "captured.log".to_string(),
            },
            lines_scanned: 12,
        }
    }

    #[test]
    fn test_empty_report() {
        let report = generate_text_report(&RejectionTallies::default()).unwrap();
        assert_eq!(report, "Unique resources alignment rejected: 0\n\n");
    }

    #[test]
    fn test_full_text_report() {
        let report = generate_text_report(&create_test_tallies()).unwrap();

        let expected = "Unique resources alignment rejected: 3\n\
                        \n\
                        Occurrences by test:\n\
                        TestB (1).\n\
                        TestA (3).\n\
                        \n\
                        Total occurrences (by format):\n\
                        Format ID:12 (1).\n\
                        Format ID:10 (2).\n\
                        \n";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_text_report_propagates_parse_error() {
        let mut tallies = RejectionTallies::default();
        tallies.record("{ \"Format\": }", "TestA");

        let err = generate_text_report(&tallies).unwrap_err();
        assert!(matches!(err, TallyError::Parse { .. }));
    }

    #[test]
    fn test_build_report() {
        let report = build_report(&create_test_tallies(), create_test_metadata()).unwrap();

        assert_eq!(report.unique_resources, 3);
        assert_eq!(report.total_rejections, 4);
        assert_eq!(report.by_test[0].name, "TestB");
        assert_eq!(report.by_test[1].count, 3);
        assert_eq!(report.by_format[0].name, "12");
        assert_eq!(report.by_format[1].count, 2);
        assert_eq!(report.by_resource.last().map(|e| e.count), Some(2));
    }

    #[test]
    fn test_build_report_empty() {
        let report = build_report(&RejectionTallies::default(), create_test_metadata()).unwrap();

        assert_eq!(report.unique_resources, 0);
        assert_eq!(report.total_rejections, 0);
        assert!(report.by_resource.is_empty());
        assert!(report.by_test.is_empty());
        assert!(report.by_format.is_empty());

        let json = generate_json_report(&report).unwrap();
        assert!(json.contains("\"unique_resources\": 0"));
        assert!(json.contains("\"by_test\": []"));
        assert!(json.contains("\"by_format\": []"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = build_report(&create_test_tallies(), create_test_metadata()).unwrap();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"unique_resources\": 3"));
        assert!(json.contains("\"by_format\""));
        assert!(json.contains("\"kind\": \"replay\""));
    }
}
