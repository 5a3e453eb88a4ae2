// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for JSON test results, read from TOML.
//!
//! ```toml
//! path-delimiter = "."
//! metadata = ["builder=linux-rel"]
//!
//! [upload]
//! server = "test-results.example.com"
//! builder = "linux-rel"
//! master = "tryserver"
//! test-type = "unit_tests"
//! ```

use crate::{
    DEFAULT_PATH_DELIMITER, FullResults, UploadRequest,
    errors::{ConfigParseError, UploadError},
    upload::DEFAULT_BOUNDARY,
};
use camino::Utf8Path;
use serde::Deserialize;
use tracing::debug;

/// Settings for building and uploading JSON test results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonResultsConfig {
    path_delimiter: String,
    metadata: Vec<String>,
    upload: Option<UploadConfig>,
}

impl JsonResultsConfig {
    /// Parses configuration from a TOML string.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigParseError> {
        let data: JsonResultsConfigImpl = toml::from_str(input)?;
        Self::from_impl(data)
    }

    /// Reads and parses configuration from a TOML file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ConfigParseError> {
        let input = std::fs::read_to_string(path).map_err(|error| ConfigParseError::Read {
            path: path.to_owned(),
            error,
        })?;
        debug!("read JSON results config from `{path}`");
        Self::from_toml_str(&input)
    }

    /// Returns the delimiter between test name segments.
    pub fn path_delimiter(&self) -> &str {
        &self.path_delimiter
    }

    /// Returns the `key=value` metadata entries added to every document.
    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }

    /// Returns the upload settings, if any.
    pub fn upload(&self) -> Option<&UploadConfig> {
        self.upload.as_ref()
    }

    fn from_impl(data: JsonResultsConfigImpl) -> Result<Self, ConfigParseError> {
        let path_delimiter = data
            .path_delimiter
            .unwrap_or_else(|| DEFAULT_PATH_DELIMITER.to_owned());
        if path_delimiter.is_empty() {
            return Err(ConfigParseError::EmptyPathDelimiter);
        }
        Ok(Self {
            path_delimiter,
            metadata: data.metadata,
            upload: data.upload.map(UploadConfig::from_impl),
        })
    }
}

impl Default for JsonResultsConfig {
    fn default() -> Self {
        Self {
            path_delimiter: DEFAULT_PATH_DELIMITER.to_owned(),
            metadata: Vec::new(),
            upload: None,
        }
    }
}

/// Where and how to upload JSON test results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadConfig {
    server: String,
    builder: String,
    master: String,
    test_type: String,
    boundary: String,
}

impl UploadConfig {
    /// Returns the host (and optional port) of the results server.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Returns the builder name.
    pub fn builder(&self) -> &str {
        &self.builder
    }

    /// Returns the master name.
    pub fn master(&self) -> &str {
        &self.master
    }

    /// Returns the test type, e.g. the name of the test binary.
    pub fn test_type(&self) -> &str {
        &self.test_type
    }

    /// Returns the multipart boundary.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Builds an upload request for `full_results` using these settings.
    pub fn request(&self, full_results: &FullResults) -> Result<UploadRequest, UploadError> {
        UploadRequest::with_boundary(
            &self.server,
            &self.builder,
            &self.master,
            &self.test_type,
            full_results,
            &self.boundary,
        )
    }

    fn from_impl(data: UploadConfigImpl) -> Self {
        Self {
            server: data.server,
            builder: data.builder,
            master: data.master,
            test_type: data.test_type,
            boundary: data
                .boundary
                .unwrap_or_else(|| DEFAULT_BOUNDARY.to_owned()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct JsonResultsConfigImpl {
    #[serde(default)]
    path_delimiter: Option<String>,
    #[serde(default)]
    metadata: Vec<String>,
    #[serde(default)]
    upload: Option<UploadConfigImpl>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct UploadConfigImpl {
    server: String,
    builder: String,
    master: String,
    test_type: String,
    #[serde(default)]
    boundary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn parse_full() {
        let config = JsonResultsConfig::from_toml_str(indoc! {r#"
            path-delimiter = "::"
            metadata = ["builder=linux-rel", "os=linux"]

            [upload]
            server = "localhost:8080"
            builder = "linux-rel"
            master = "tryserver"
            test-type = "unit_tests"
            boundary = "custom-boundary"
        "#})
        .unwrap();

        assert_eq!(config.path_delimiter(), "::");
        assert_eq!(config.metadata(), ["builder=linux-rel", "os=linux"]);
        let upload = config.upload().unwrap();
        assert_eq!(upload.server(), "localhost:8080");
        assert_eq!(upload.builder(), "linux-rel");
        assert_eq!(upload.master(), "tryserver");
        assert_eq!(upload.test_type(), "unit_tests");
        assert_eq!(upload.boundary(), "custom-boundary");

        let request = upload.request(&FullResults::new(0.0)).unwrap();
        assert_eq!(request.url(), "http://localhost:8080/testfile/upload");
        assert_eq!(
            request.content_type(),
            "multipart/form-data; boundary=custom-boundary"
        );
    }

    #[test]
    fn parse_defaults() {
        let config = JsonResultsConfig::from_toml_str("").unwrap();
        assert_eq!(config, JsonResultsConfig::default());
        assert_eq!(config.path_delimiter(), ".");
        assert!(config.upload().is_none());

        let config = JsonResultsConfig::from_toml_str(indoc! {r#"
            [upload]
            server = "localhost"
            builder = "b"
            master = "m"
            test-type = "t"
        "#})
        .unwrap();
        assert_eq!(config.upload().unwrap().boundary(), DEFAULT_BOUNDARY);
    }

    #[test_case(
        r#"path-delimiter = """#,
        "`path-delimiter` must not be empty"
        ; "empty delimiter"
    )]
    #[test_case(
        r#"unknown-key = 1"#,
        "failed to parse JSON results config"
        ; "unknown key"
    )]
    #[test_case(
        indoc! {r#"
            [upload]
            server = "localhost"
        "#},
        "failed to parse JSON results config"
        ; "missing upload fields"
    )]
    fn parse_invalid(input: &str, message: &str) {
        let err = JsonResultsConfig::from_toml_str(input).unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn from_path() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("json-results.toml");
        std::fs::write(&path, "metadata = [\"master=tryserver\"]\n").unwrap();

        let config = JsonResultsConfig::from_path(&path).unwrap();
        assert_eq!(config.metadata(), ["master=tryserver"]);

        let err = JsonResultsConfig::from_path(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigParseError::Read { .. }), "{err:?}");
    }
}
