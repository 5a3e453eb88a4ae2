// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize and deserialize a `FullResults`.

use crate::{
    FullResults,
    errors::{DeserializeError, SerializeError, WriteReportError},
};
use camino::Utf8Path;
use std::{io, io::Write as _, str::FromStr};
use tracing::debug;

impl FullResults {
    /// Serialize this document as compact JSON to the given writer.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Serialize this document as indented JSON to the given writer.
    pub fn serialize_pretty(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Serialize this document to a compact JSON string.
    pub fn to_string(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize this document to an indented JSON string.
    pub fn to_string_pretty(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a document from the given reader.
    pub fn from_reader(reader: impl io::Read) -> Result<Self, DeserializeError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Atomically write this document to `path` as indented JSON, followed by a newline.
    pub fn write_to_path(&self, path: &Utf8Path) -> Result<(), WriteReportError> {
        let mut contents =
            serde_json::to_vec_pretty(self).map_err(|error| WriteReportError::Serialize {
                path: path.to_owned(),
                error,
            })?;
        contents.push(b'\n');

        atomicwrites::AtomicFile::new(path, atomicwrites::AllowOverwrite)
            .write(|file| file.write_all(&contents))
            .map_err(|error| WriteReportError::Write {
                path: path.to_owned(),
                error,
            })?;

        debug!(
            "wrote JSON test results ({} tests, {} failures) to `{path}`",
            self.num_failures_by_type.total(),
            self.num_failures(),
        );
        Ok(())
    }
}

impl FromStr for FullResults {
    type Err = DeserializeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}
