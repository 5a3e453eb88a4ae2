// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging the results of a test run and its retries into a [`FullResults`] document.
//!
//! The first attempt runs every test. Each later attempt only re-runs the tests that failed in
//! the attempt before it, so a test that passes on a retry must have failed just prior.

use crate::{
    ActualResults, DEFAULT_PATH_DELIMITER, FullResults, NumFailuresByType, ResultType, TestLeaf,
    config::JsonResultsConfig, errors::AggregateError,
};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// A single test and the detail recorded for its outcome, such as a failure message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestOutcome {
    /// The full name of the test.
    pub test_name: String,

    /// Free-form detail about the outcome.
    pub detail: String,
}

impl TestOutcome {
    /// Creates a new `TestOutcome`.
    pub fn new(test_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            detail: detail.into(),
        }
    }
}

/// The results of one attempt at running the test suite.
#[derive(Clone, Debug, Default)]
pub struct TestRunResult {
    failures: Vec<TestOutcome>,
    errors: Vec<TestOutcome>,
    successes: Vec<TestOutcome>,
}

impl TestRunResult {
    /// Creates an empty `TestRunResult`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a test that failed an assertion.
    pub fn add_failure(
        &mut self,
        test_name: impl Into<String>,
        detail: impl Into<String>,
    ) -> &mut Self {
        self.failures.push(TestOutcome::new(test_name, detail));
        self
    }

    /// Records a test that errored, for example by panicking outside an assertion.
    pub fn add_error(&mut self, test_name: impl Into<String>, detail: impl Into<String>) -> &mut Self {
        self.errors.push(TestOutcome::new(test_name, detail));
        self
    }

    /// Records a test that passed.
    pub fn add_success(
        &mut self,
        test_name: impl Into<String>,
        detail: impl Into<String>,
    ) -> &mut Self {
        self.successes.push(TestOutcome::new(test_name, detail));
        self
    }

    /// Returns the recorded failures.
    pub fn failures(&self) -> &[TestOutcome] {
        &self.failures
    }

    /// Returns the recorded errors.
    pub fn errors(&self) -> &[TestOutcome] {
        &self.errors
    }

    /// Returns the recorded successes.
    pub fn successes(&self) -> &[TestOutcome] {
        &self.successes
    }

    /// Returns the names of tests that failed or errored in this attempt.
    pub fn failing_test_names(&self) -> BTreeSet<&str> {
        self.failures
            .iter()
            .chain(&self.errors)
            .map(|outcome| outcome.test_name.as_str())
            .collect()
    }

    /// Returns the names of tests that passed in this attempt.
    pub fn passing_test_names(&self) -> BTreeSet<&str> {
        self.successes
            .iter()
            .map(|outcome| outcome.test_name.as_str())
            .collect()
    }
}

/// Builds [`FullResults`] documents from test run results.
#[derive(Clone, Debug)]
pub struct Aggregator {
    path_delimiter: String,
    default_metadata: Vec<String>,
}

impl Aggregator {
    /// Creates an aggregator using the default path delimiter and no default metadata.
    pub fn new() -> Self {
        Self {
            path_delimiter: DEFAULT_PATH_DELIMITER.to_owned(),
            default_metadata: Vec::new(),
        }
    }

    /// Creates an aggregator from configuration.
    pub fn from_config(config: &JsonResultsConfig) -> Self {
        Self {
            path_delimiter: config.path_delimiter().to_owned(),
            default_metadata: config.metadata().to_vec(),
        }
    }

    /// Sets the delimiter used to split test names into trie paths.
    pub fn set_path_delimiter(&mut self, path_delimiter: impl Into<String>) -> &mut Self {
        self.path_delimiter = path_delimiter.into();
        self
    }

    /// Adds a `key=value` metadata entry applied before the per-call metadata.
    pub fn add_default_metadata(&mut self, entry: impl Into<String>) -> &mut Self {
        self.default_metadata.push(entry.into());
        self
    }

    /// Aggregates `run_results` into a new [`FullResults`] document.
    ///
    /// * `metadata` is a list of `key=value` entries, applied in order.
    /// * `all_test_names` is every test that was scheduled to run, in output order. Names that
    ///   appear in `run_results` but not here are ignored.
    /// * `run_results` contains one entry per attempt, starting with the initial run. Tests with no
    ///   result in the initial run are skipped, and must not appear in any later attempt.
    ///
    /// Test names are split on the path delimiter, and every segment must be non-empty: names
    /// such as `a.` or `a..b` are rejected with [`TrieInsertError::EmptySegment`].
    ///
    /// [`TrieInsertError::EmptySegment`]: crate::TrieInsertError::EmptySegment
    pub fn aggregate<M, T>(
        &self,
        metadata: &[M],
        seconds_since_epoch: f64,
        all_test_names: &[T],
        run_results: &[TestRunResult],
    ) -> Result<FullResults, AggregateError>
    where
        M: AsRef<str>,
        T: AsRef<str>,
    {
        let mut full_results = FullResults::new(seconds_since_epoch);
        full_results.set_path_delimiter(self.path_delimiter.clone());
        for entry in self.default_metadata.iter().map(String::as_str) {
            full_results.add_metadata_entry(entry)?;
        }
        for entry in metadata {
            full_results.add_metadata_entry(entry.as_ref())?;
        }

        let failing: Vec<_> = run_results
            .iter()
            .map(TestRunResult::failing_test_names)
            .collect();
        let passing: Vec<_> = run_results
            .iter()
            .map(TestRunResult::passing_test_names)
            .collect();
        let (Some(first_failing), Some(first_passing), Some(last_failing)) =
            (failing.first(), passing.first(), failing.last())
        else {
            return Err(AggregateError::NoRunResults);
        };

        let universe: HashSet<&str> = all_test_names.iter().map(AsRef::as_ref).collect();
        warn_unknown_tests(&universe, failing.iter().chain(&passing));

        // Only the initial attempt determines whether a test ran at all.
        let skipped: HashSet<&str> = universe
            .iter()
            .copied()
            .filter(|name| !first_passing.contains(name) && !first_failing.contains(name))
            .collect();
        check_skipped_not_retried(all_test_names, &skipped, &failing, &passing)?;

        let fail = last_failing
            .iter()
            .filter(|name| universe.contains(*name))
            .count();
        let skip = skipped.len();
        let num_failures_by_type = NumFailuresByType {
            fail,
            pass: all_test_names.len() - fail - skip,
            skip,
        };
        debug!(
            attempts = run_results.len(),
            tests = all_test_names.len(),
            fail = num_failures_by_type.fail,
            pass = num_failures_by_type.pass,
            skip = num_failures_by_type.skip,
            "aggregated test run results"
        );
        full_results.num_failures_by_type = num_failures_by_type;

        for test_name in all_test_names.iter().map(AsRef::as_ref) {
            let leaf = if skipped.contains(test_name) {
                TestLeaf::skipped()
            } else {
                TestLeaf::expecting_pass(actual_results_for_test(test_name, &failing, &passing)?)
            };
            full_results
                .tests
                .insert(test_name, &self.path_delimiter, leaf)?;
        }

        Ok(full_results)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregates `run_results` into a new [`FullResults`] document, using the default path
/// delimiter.
///
/// See [`Aggregator::aggregate`] for details.
pub fn aggregate<M, T>(
    metadata: &[M],
    seconds_since_epoch: f64,
    all_test_names: &[T],
    run_results: &[TestRunResult],
) -> Result<FullResults, AggregateError>
where
    M: AsRef<str>,
    T: AsRef<str>,
{
    Aggregator::new().aggregate(metadata, seconds_since_epoch, all_test_names, run_results)
}

/// Retries only re-run tests that failed, so a test without a result in the first attempt must
/// not show up in any later one.
fn check_skipped_not_retried<T: AsRef<str>>(
    all_test_names: &[T],
    skipped: &HashSet<&str>,
    failing: &[BTreeSet<&str>],
    passing: &[BTreeSet<&str>],
) -> Result<(), AggregateError> {
    for test_name in all_test_names.iter().map(AsRef::as_ref) {
        if !skipped.contains(test_name) {
            continue;
        }
        let retried = failing
            .iter()
            .zip(passing)
            .position(|(f, p)| f.contains(test_name) || p.contains(test_name));
        if let Some(attempt) = retried {
            return Err(AggregateError::AbsentFromFirstAttempt {
                test_name: test_name.to_owned(),
                attempt,
            });
        }
    }
    Ok(())
}

fn actual_results_for_test(
    test_name: &str,
    failing: &[BTreeSet<&str>],
    passing: &[BTreeSet<&str>],
) -> Result<ActualResults, AggregateError> {
    let mut actual = ActualResults::new();
    for (attempt, (attempt_failing, attempt_passing)) in failing.iter().zip(passing).enumerate() {
        if attempt_failing.contains(test_name) {
            actual.push(ResultType::Fail);
        } else if attempt_passing.contains(test_name) {
            if attempt > 0 && !failing[attempt - 1].contains(test_name) {
                return Err(AggregateError::UnexpectedPass {
                    test_name: test_name.to_owned(),
                    attempt,
                });
            }
            actual.push(ResultType::Pass);
        }
    }

    if actual.is_empty() {
        return Err(AggregateError::MissingResult {
            test_name: test_name.to_owned(),
        });
    }
    Ok(actual)
}

fn warn_unknown_tests<'a>(
    universe: &HashSet<&str>,
    attempt_sets: impl Iterator<Item = &'a BTreeSet<&'a str>>,
) {
    let unknown: BTreeSet<&str> = attempt_sets
        .flatten()
        .copied()
        .filter(|name| !universe.contains(name))
        .collect();
    if !unknown.is_empty() {
        warn!(
            count = unknown.len(),
            "ignoring results for tests not in the list of all tests: {}",
            unknown.iter().copied().collect::<Vec<_>>().join(", "),
        );
    }
}
