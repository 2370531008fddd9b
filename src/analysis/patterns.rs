//! Log line patterns recognised in end2end test output.

use regex::Regex;
use std::sync::LazyLock;

/// gtest start marker, e.g. `[ RUN      ] BufferTests.MapRead/D3D12_Intel`.
///
/// The capture is greedy and ends at the last `/` on the line.
static TEST_START_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RUN.*\] (.*)/").expect("Invalid test start regex"));

/// Allocator log line for a rejected small-alignment request, capturing the
/// JSON resource descriptor.
static REJECTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*Resource alignment.*resource : (\{.*\})").expect("Invalid rejection regex")
});

/// Test name from a gtest `RUN` line, if `line` is one.
pub fn test_name(line: &str) -> Option<&str> {
    TEST_START_REGEX
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Rejected resource descriptor text, if `line` reports one.
pub fn rejected_descriptor(line: &str) -> Option<&str> {
    REJECTION_REGEX
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
