// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Build, serialize and upload test results in the JSON test results format (version 3).
//!
//! The typical flow is:
//!
//! 1. Record one [`TestRunResult`] per attempt: the initial run, then one per retry of the tests
//!    that failed.
//! 2. Merge them into a [`FullResults`] document with [`aggregate`] (or an [`Aggregator`] built
//!    from a [`JsonResultsConfig`]).
//! 3. Write the document out with [`FullResults::write_to_path`], or build an [`UploadRequest`]
//!    for a test results server.
//! 4. Exit with [`FullResults::exit_code`].
//!
//! ```
//! use json_test_results::{TestRunResult, UploadRequest, aggregate};
//!
//! let mut first = TestRunResult::new();
//! first.add_failure("x", "assertion failed").add_success("y", "");
//! let mut retry = TestRunResult::new();
//! retry.add_success("x", "");
//!
//! let full_results = aggregate(&["builder=linux"], 1413000000.0, &["x", "y", "z"], &[first, retry])?;
//! assert_eq!(full_results.num_failures_by_type.pass, 2);
//! assert_eq!(full_results.num_failures_by_type.skip, 1);
//! assert_eq!(full_results.exit_code(), 0);
//!
//! let request = UploadRequest::new("localhost", "linux-rel", "tryserver", "unit_tests", &full_results)?;
//! assert_eq!(request.url(), "http://localhost/testfile/upload");
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

mod aggregate;
pub mod config;
pub mod errors;
mod exit_codes;
mod report;
mod serialize;
mod trie;
mod upload;

pub use aggregate::*;
pub use config::JsonResultsConfig;
pub use errors::*;
pub use exit_codes::*;
pub use report::*;
pub use trie::*;
pub use upload::*;
