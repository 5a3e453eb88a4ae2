// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while building, serializing and uploading JSON test results.

use crate::ResultType;
use camino::Utf8PathBuf;
use thiserror::Error;

/// A metadata entry was not of the form `key=value`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("metadata entry `{input}` is not of the form `key=value`")]
pub struct MetadataParseError {
    input: String,
}

impl MetadataParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// An error that occurs while inserting a test into a [`TestTrie`](crate::TestTrie).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrieInsertError {
    /// The test path was empty, or contained an empty segment.
    #[error("test path `{path}` contains an empty segment")]
    EmptySegment {
        /// The full test path.
        path: String,
    },

    /// A prefix of the path was already recorded as a test result.
    #[error("cannot insert `{path}`: `{prefix}` is already a test result")]
    PrefixIsLeaf {
        /// The full test path.
        path: String,

        /// The prefix that is already a leaf.
        prefix: String,
    },

    /// The full path was already present in the trie.
    #[error("test path `{path}` is already present")]
    AlreadyPresent {
        /// The full test path.
        path: String,
    },

    /// Other tests are already nested under the path.
    #[error("cannot insert `{path}`: other tests are nested under it")]
    HasChildren {
        /// The full test path.
        path: String,
    },
}

/// An error that occurs while aggregating test run results into a
/// [`FullResults`](crate::FullResults) document.
///
/// These all represent contract violations by the caller: the inputs describe
/// test runs that could not have happened.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AggregateError {
    /// A metadata entry could not be parsed.
    #[error("error parsing metadata")]
    Metadata(#[from] MetadataParseError),

    /// A metadata key would overwrite one of the fixed top-level keys.
    #[error("metadata key `{key}` is reserved")]
    ReservedMetadataKey {
        /// The key.
        key: String,
    },

    /// No run results were provided.
    #[error("no run results were provided")]
    NoRunResults,

    /// A test that was not skipped had no results in any attempt.
    #[error("no result data found for test `{test_name}`")]
    MissingResult {
        /// The name of the test.
        test_name: String,
    },

    /// A test passed on a retry without having failed in the previous attempt.
    #[error(
        "test `{test_name}` passed on attempt {attempt} but did not fail on attempt {}",
        .attempt - 1
    )]
    UnexpectedPass {
        /// The name of the test.
        test_name: String,

        /// The zero-based attempt on which the test passed. Always greater than zero.
        attempt: usize,
    },

    /// A test with no result in the first attempt had a result in a later one.
    #[error("test `{test_name}` has a result on attempt {attempt} but did not run on attempt 0")]
    AbsentFromFirstAttempt {
        /// The name of the test.
        test_name: String,

        /// The zero-based attempt in which the test first had a result.
        attempt: usize,
    },

    /// The test could not be inserted into the results trie.
    #[error("error building test results trie")]
    Trie(#[from] TrieInsertError),
}

/// An error that occurs while parsing an [`ActualResults`](crate::ActualResults) string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActualResultsParseError {
    /// The string was empty.
    #[error("actual results string is empty")]
    Empty,

    /// A token was not a known result type.
    #[error("unknown result type `{token}` (known values: {})", ResultType::variants().join(", "))]
    UnknownResultType {
        /// The token that could not be parsed.
        token: String,
    },
}

/// An error that occurs while serializing a [`FullResults`](crate::FullResults).
///
/// Returned by [`FullResults::serialize`](crate::FullResults::serialize) and
/// [`FullResults::to_string`](crate::FullResults::to_string).
#[derive(Debug, Error)]
#[error("error serializing JSON test results")]
pub struct SerializeError {
    #[from]
    inner: serde_json::Error,
}

/// An error that occurs while deserializing a [`FullResults`](crate::FullResults).
#[derive(Debug, Error)]
#[error("error deserializing JSON test results")]
pub struct DeserializeError {
    #[from]
    inner: serde_json::Error,
}

/// An error that occurs while writing a [`FullResults`](crate::FullResults) to disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// The document could not be serialized.
    #[error("error serializing JSON test results for `{path}`")]
    Serialize {
        /// The path that was being written.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// An I/O error occurred while writing the file.
    #[error("error writing JSON test results to `{path}`")]
    Write {
        /// The path that was being written.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<std::io::Error>,
    },
}

/// An error that occurs while building an [`UploadRequest`](crate::UploadRequest).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UploadError {
    /// The document could not be serialized.
    #[error("error serializing upload payload")]
    Serialize(#[from] SerializeError),

    /// The multipart boundary was empty.
    #[error("multipart boundary must not be empty")]
    EmptyBoundary,

    /// The multipart boundary delimiter occurs inside a part, which would corrupt the body.
    #[error("multipart boundary `{boundary}` occurs inside the `{part}` part")]
    BoundaryInPayload {
        /// The boundary.
        boundary: String,

        /// The name of the part containing the boundary.
        part: String,
    },

    /// The upload could not be turned into an HTTP request.
    #[error("error building HTTP upload request for `{url}`")]
    Http {
        /// The URL of the request.
        url: String,

        /// The underlying error.
        #[source]
        error: http::Error,
    },
}

/// An error that occurred while parsing the JSON results config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseError {
    /// The config file could not be read.
    #[error("failed to read JSON results config at `{path}`")]
    Read {
        /// The path to the config file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The config was not valid TOML, or did not match the expected schema.
    #[error("failed to parse JSON results config")]
    Toml(#[from] toml::de::Error),

    /// The path delimiter was empty.
    #[error("`path-delimiter` must not be empty")]
    EmptyPathDelimiter,
}
