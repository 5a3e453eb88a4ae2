// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    TestTrie,
    errors::{ActualResultsParseError, AggregateError, MetadataParseError},
    exit_codes::JsonResultsExitCode,
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{fmt, str::FromStr};

/// The version of the JSON test results format produced by this crate.
pub const FORMAT_VERSION: u32 = 3;

/// The default delimiter between path segments of a test name.
pub static DEFAULT_PATH_DELIMITER: &str = ".";

/// Top-level keys with a fixed meaning. Metadata may not use these.
pub static RESERVED_KEYS: &[&str] = &[
    "interrupted",
    "path_delimiter",
    "version",
    "seconds_since_epoch",
    "num_failures_by_type",
    "tests",
];

/// The root of a JSON test results document.
///
/// Usually produced by [`aggregate`](crate::aggregate), but may also be built up by hand or parsed
/// from an existing document with [`FullResults::from_str`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FullResults {
    /// Whether the test run was interrupted before completing.
    pub interrupted: bool,

    /// The delimiter between segments of a test name in [`Self::tests`].
    pub path_delimiter: String,

    /// The format version. Always [`FORMAT_VERSION`] for documents produced by this crate.
    pub version: u32,

    /// The time at which the test run started, as seconds since the Unix epoch.
    pub seconds_since_epoch: f64,

    // Serialized as top-level keys, so only settable through `insert_metadata`.
    #[serde(flatten)]
    metadata: IndexMap<String, String>,

    /// Summary counts for the final outcome of each test.
    pub num_failures_by_type: NumFailuresByType,

    /// The tests, organized by path segment.
    pub tests: TestTrie,
}

impl FullResults {
    /// Creates a new, empty `FullResults` for a run started at `seconds_since_epoch`.
    pub fn new(seconds_since_epoch: f64) -> Self {
        Self {
            interrupted: false,
            path_delimiter: DEFAULT_PATH_DELIMITER.to_owned(),
            version: FORMAT_VERSION,
            seconds_since_epoch,
            metadata: IndexMap::new(),
            num_failures_by_type: NumFailuresByType::default(),
            tests: TestTrie::new(),
        }
    }

    /// Sets the path delimiter.
    pub fn set_path_delimiter(&mut self, path_delimiter: impl Into<String>) -> &mut Self {
        self.path_delimiter = path_delimiter.into();
        self
    }

    /// Sets the start time of the run.
    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) -> &mut Self {
        self.seconds_since_epoch = timestamp.timestamp() as f64
            + f64::from(timestamp.timestamp_subsec_nanos()) / 1_000_000_000.0;
        self
    }

    /// Returns the start time of the run, or `None` if `seconds_since_epoch` is out of range.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        if !self.seconds_since_epoch.is_finite() {
            return None;
        }
        let secs = self.seconds_since_epoch.floor();
        let nanos = ((self.seconds_since_epoch - secs) * 1_000_000_000.0).round() as u32;
        DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
    }

    /// Returns the caller-supplied metadata, such as the builder name, in insertion order.
    ///
    /// These are serialized as top-level keys alongside the fixed ones.
    pub fn metadata(&self) -> &IndexMap<String, String> {
        &self.metadata
    }

    /// Adds a metadata entry of the form `key=value`.
    ///
    /// The entry is split on the first `=`, so the value may itself contain `=`. A later entry
    /// with the same key replaces the value of an earlier one.
    pub fn add_metadata_entry(&mut self, entry: &str) -> Result<&mut Self, AggregateError> {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| MetadataParseError::new(entry))?;
        self.insert_metadata(key, value)
    }

    /// Inserts a metadata key-value pair.
    ///
    /// Returns an error if `key` is one of the [`RESERVED_KEYS`].
    pub fn insert_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self, AggregateError> {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(AggregateError::ReservedMetadataKey { key });
        }
        self.metadata.insert(key, value.into());
        Ok(self)
    }

    /// Returns the number of tests whose final outcome was a failure.
    pub fn num_failures(&self) -> usize {
        self.num_failures_by_type.fail
    }

    /// Returns the process exit code corresponding to this document.
    ///
    /// This is [`JsonResultsExitCode::OK`] if no tests failed, and
    /// [`JsonResultsExitCode::TESTS_FAILED`] otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.num_failures() > 0 {
            JsonResultsExitCode::TESTS_FAILED
        } else {
            JsonResultsExitCode::OK
        }
    }
}

/// The number of tests by final outcome.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NumFailuresByType {
    /// Tests whose final attempt failed.
    #[serde(rename = "FAIL")]
    pub fail: usize,

    /// Tests that were run and did not fail on their final attempt.
    #[serde(rename = "PASS")]
    pub pass: usize,

    /// Tests that were not run.
    #[serde(rename = "SKIP")]
    pub skip: usize,
}

impl NumFailuresByType {
    /// Returns the total number of tests.
    pub fn total(&self) -> usize {
        self.fail + self.pass + self.skip
    }
}

/// The result of a single test, stored at the leaves of a [`TestTrie`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestLeaf {
    /// The expected result.
    pub expected: ResultType,

    /// The observed results, one per attempt in which the test ran.
    pub actual: ActualResults,

    /// True if the final result was a failure. Omitted from the output if false.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_unexpected: bool,
}

impl TestLeaf {
    /// Creates a leaf for a test that was not run.
    pub fn skipped() -> Self {
        Self {
            expected: ResultType::Skip,
            actual: ActualResults::skipped(),
            is_unexpected: false,
        }
    }

    /// Creates a leaf for a test that was expected to pass, marking it as unexpected if its final
    /// result was a failure.
    pub fn expecting_pass(actual: ActualResults) -> Self {
        let is_unexpected = actual.last() == Some(ResultType::Fail);
        Self {
            expected: ResultType::Pass,
            actual,
            is_unexpected,
        }
    }
}

/// The outcome of one attempt of a test.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultType {
    /// The test passed.
    Pass,

    /// The test failed or errored.
    Fail,

    /// The test was not run.
    Skip,
}

impl ResultType {
    /// Returns the string representation used in the JSON output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skip => "SKIP",
        }
    }

    /// All result types.
    pub const ALL: &'static [Self] = &[Self::Pass, Self::Fail, Self::Skip];

    /// Returns the string representations of all known result types.
    pub fn variants() -> &'static [&'static str] {
        const VARIANTS: &[&str] = &[
            ResultType::ALL[0].as_str(),
            ResultType::ALL[1].as_str(),
            ResultType::ALL[2].as_str(),
        ];
        VARIANTS
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultType {
    type Err = ActualResultsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|result| result.as_str() == s)
            .ok_or_else(|| ActualResultsParseError::UnknownResultType {
                token: s.to_owned(),
            })
    }
}

/// The sequence of results a test produced across attempts, in attempt order.
///
/// Serialized as a space-separated string, e.g. `"FAIL PASS"`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActualResults {
    results: Vec<ResultType>,
}

impl ActualResults {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    /// Creates the sequence used for tests that were not run.
    pub fn skipped() -> Self {
        Self {
            results: vec![ResultType::Skip],
        }
    }

    /// Appends a result.
    pub fn push(&mut self, result: ResultType) -> &mut Self {
        self.results.push(result);
        self
    }

    /// Returns the final result, if any.
    pub fn last(&self) -> Option<ResultType> {
        self.results.last().copied()
    }

    /// Returns true if no results have been recorded.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Iterates over the results in attempt order.
    pub fn iter(&self) -> impl Iterator<Item = ResultType> + '_ {
        self.results.iter().copied()
    }
}

impl Default for ActualResults {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<ResultType> for ActualResults {
    fn from_iter<I: IntoIterator<Item = ResultType>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ActualResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, result) in self.results.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(result.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for ActualResults {
    type Err = ActualResultsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let results = s
            .split_ascii_whitespace()
            .map(ResultType::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if results.is_empty() {
            return Err(ActualResultsParseError::Empty);
        }
        Ok(Self { results })
    }
}

impl Serialize for ActualResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActualResults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
