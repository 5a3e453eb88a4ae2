// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encoding JSON test results as a `multipart/form-data` upload to a test results server.
//!
//! This module only builds the pieces of the request. Sending it is up to the caller.

use crate::{FullResults, errors::UploadError};
use swrite::{SWrite, swrite};
use tracing::debug;

/// The multipart boundary used unless another is specified.
pub static DEFAULT_BOUNDARY: &str = "-M-A-G-I-C---B-O-U-N-D-A-R-Y-";

static UPLOAD_PATH: &str = "/testfile/upload";
static FILE_PART_NAME: &str = "file";
static FILE_NAME: &str = "full_results.json";
static FILE_CONTENT_TYPE: &str = "application/json";

/// A request to upload [`FullResults`] to a test results server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadRequest {
    url: String,
    content_type: String,
    body: String,
}

impl UploadRequest {
    /// Builds an upload request using [`DEFAULT_BOUNDARY`].
    ///
    /// `server` is the host (and optional port) of the results server.
    pub fn new(
        server: &str,
        builder: &str,
        master: &str,
        test_type: &str,
        full_results: &FullResults,
    ) -> Result<Self, UploadError> {
        Self::with_boundary(
            server,
            builder,
            master,
            test_type,
            full_results,
            DEFAULT_BOUNDARY,
        )
    }

    /// Builds an upload request with a custom multipart boundary.
    ///
    /// Returns an error if the boundary occurs within any of the parts.
    pub fn with_boundary(
        server: &str,
        builder: &str,
        master: &str,
        test_type: &str,
        full_results: &FullResults,
        boundary: &str,
    ) -> Result<Self, UploadError> {
        if boundary.is_empty() {
            return Err(UploadError::EmptyBoundary);
        }

        let url = format!("http://{server}{UPLOAD_PATH}");
        let payload = full_results.to_string()?;

        let fields = [
            ("builder", builder),
            ("master", master),
            ("testtype", test_type),
        ];
        for (name, value) in fields.iter().chain(&[(FILE_PART_NAME, payload.as_str())]) {
            if value.contains(boundary) {
                return Err(UploadError::BoundaryInPayload {
                    boundary: boundary.to_owned(),
                    part: (*name).to_owned(),
                });
            }
        }

        let mut body = String::with_capacity(payload.len() + 512);
        for (name, value) in fields {
            swrite!(body, "--{boundary}\r\n");
            swrite!(body, "Content-Disposition: form-data; name=\"{name}\"\r\n");
            swrite!(body, "\r\n");
            swrite!(body, "{value}\r\n");
        }
        swrite!(body, "--{boundary}\r\n");
        swrite!(
            body,
            "Content-Disposition: form-data; name=\"{FILE_PART_NAME}\"; filename=\"{FILE_NAME}\"\r\n"
        );
        swrite!(body, "Content-Type: {FILE_CONTENT_TYPE}\r\n");
        swrite!(body, "\r\n");
        swrite!(body, "{payload}\r\n");
        swrite!(body, "--{boundary}--\r\n");

        debug!(%url, body_len = body.len(), "built JSON test results upload request");

        Ok(Self {
            url,
            content_type: format!("multipart/form-data; boundary={boundary}"),
            body,
        })
    }

    /// Returns the URL to `POST` to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the value of the `Content-Type` header.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the encoded request body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the URL, content type and body.
    pub fn into_parts(self) -> (String, String, String) {
        (self.url, self.content_type, self.body)
    }

    /// Converts this into a `POST` request with the `Content-Type` header set.
    pub fn into_http_request(self) -> Result<http::Request<Vec<u8>>, UploadError> {
        let Self {
            url,
            content_type,
            body,
        } = self;
        http::Request::post(url.as_str())
            .header(http::header::CONTENT_TYPE, content_type)
            .body(body.into_bytes())
            .map_err(|error| UploadError::Http { url, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TestRunResult, aggregate};
    use pretty_assertions::assert_eq;

    fn sample_results() -> FullResults {
        let mut run = TestRunResult::new();
        run.add_failure("suite.fails", "boom").add_success("suite.passes", "");
        aggregate(&["os=linux"], 1_413_000_000.0, &["suite.fails", "suite.passes"], &[run])
            .unwrap()
    }

    #[test]
    fn encode_default_boundary() {
        let full_results = sample_results();
        let request = UploadRequest::new(
            "test-results.example.com",
            "linux-rel",
            "tryserver",
            "unit_tests",
            &full_results,
        )
        .unwrap();

        assert_eq!(
            request.url(),
            "http://test-results.example.com/testfile/upload"
        );
        assert_eq!(
            request.content_type(),
            "multipart/form-data; boundary=-M-A-G-I-C---B-O-U-N-D-A-R-Y-"
        );

        let payload = full_results.to_string().unwrap();
        let expected = [
            "---M-A-G-I-C---B-O-U-N-D-A-R-Y-",
            "Content-Disposition: form-data; name=\"builder\"",
            "",
            "linux-rel",
            "---M-A-G-I-C---B-O-U-N-D-A-R-Y-",
            "Content-Disposition: form-data; name=\"master\"",
            "",
            "tryserver",
            "---M-A-G-I-C---B-O-U-N-D-A-R-Y-",
            "Content-Disposition: form-data; name=\"testtype\"",
            "",
            "unit_tests",
            "---M-A-G-I-C---B-O-U-N-D-A-R-Y-",
            "Content-Disposition: form-data; name=\"file\"; filename=\"full_results.json\"",
            "Content-Type: application/json",
            "",
            payload.as_str(),
            "---M-A-G-I-C---B-O-U-N-D-A-R-Y---",
            "",
        ]
        .join("\r\n");
        assert_eq!(request.body(), expected);

        // The file part round-trips to the original document.
        let (_, _, body) = request.into_parts();
        let json_line = body
            .split("\r\n")
            .find(|line| line.starts_with('{'))
            .unwrap();
        assert_eq!(json_line.parse::<FullResults>().unwrap(), full_results);
    }

    #[test]
    fn boundary_in_payload() {
        let full_results = sample_results();
        let err = UploadRequest::with_boundary(
            "localhost",
            "linux-rel",
            "tryserver",
            "unit_tests",
            &full_results,
            "fails",
        )
        .unwrap_err();
        assert!(
            matches!(&err, UploadError::BoundaryInPayload { part, .. } if part == "file"),
            "{err:?}"
        );

        let err = UploadRequest::with_boundary(
            "localhost",
            "builder-xyz",
            "tryserver",
            "unit_tests",
            &full_results,
            "xyz",
        )
        .unwrap_err();
        assert!(
            matches!(&err, UploadError::BoundaryInPayload { part, .. } if part == "builder"),
            "{err:?}"
        );

        let err = UploadRequest::with_boundary("localhost", "b", "m", "t", &full_results, "")
            .unwrap_err();
        assert!(matches!(err, UploadError::EmptyBoundary), "{err:?}");
    }

    #[test]
    fn into_http_request() {
        let full_results = sample_results();
        let request = UploadRequest::new("localhost:8080", "b", "m", "t", &full_results).unwrap();
        let body = request.body().to_owned();

        let http_request = request.into_http_request().unwrap();
        assert_eq!(http_request.method(), http::Method::POST);
        assert_eq!(
            http_request.uri().to_string(),
            "http://localhost:8080/testfile/upload"
        );
        assert_eq!(
            http_request.headers()[http::header::CONTENT_TYPE],
            "multipart/form-data; boundary=-M-A-G-I-C---B-O-U-N-D-A-R-Y-"
        );
        assert_eq!(http_request.body(), body.as_bytes());
    }

    #[test]
    fn invalid_server() {
        let full_results = sample_results();
        let request = UploadRequest::new("bad host", "b", "m", "t", &full_results).unwrap();
        let err = request.into_http_request().unwrap_err();
        assert!(matches!(err, UploadError::Http { .. }), "{err:?}");
    }
}
