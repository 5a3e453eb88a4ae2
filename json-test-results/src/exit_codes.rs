// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for processes reporting JSON test results.
///
/// See [`FullResults::exit_code`](crate::FullResults::exit_code).
pub enum JsonResultsExitCode {}

impl JsonResultsExitCode {
    /// No tests failed.
    pub const OK: i32 = 0;

    /// One or more tests failed on their final attempt.
    pub const TESTS_FAILED: i32 = 1;
}
