// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::path::PathBuf;

/// Errors surfaced while translating GN descs into blueprints.
///
/// [`TranslateError::RebaseEscape`] and README [`TranslateError::Io`] errors
/// are recovered by the blueprint assembler; everything else aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("target {label} has unknown type {kind:?}")]
    UnknownTargetKind { label: String, kind: String },

    #[error("target {label} uses unsupported action script {script}")]
    UnknownActionScript { label: String, script: String },

    #[error("{label} has different values for {attribute} between archs")]
    InconsistentArchAttribute { label: String, attribute: String },

    #[error("{module} has conflicting C++ standards: {first} and {second}")]
    ConflictingCppStd {
        module: String,
        first: String,
        second: String,
    },

    #[error("{module} references more than one linker script: {scripts:?}")]
    MultipleLinkerScripts { module: String, scripts: Vec<String> },

    #[error("{module} cannot be moved to {directory}: {path} is outside of it")]
    RebaseEscape {
        module: String,
        directory: String,
        path: String,
    },

    #[error("dependency cycle detected at {label}")]
    CyclicDependency { label: String },

    #[error("target {label} is not present in the GN desc")]
    MissingTarget { label: String },

    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to render blueprint template")]
    Template(#[from] tera::Error),
}

pub type Result<T, E = TranslateError> = std::result::Result<T, E>;
