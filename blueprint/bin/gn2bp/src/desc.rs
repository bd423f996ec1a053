// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Loading of `gn desc --format=json --all-toolchains` dumps and of the Rust
//! build-script outputs produced next to them.

use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::Path,
};

use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    arch::Arch,
    error::{Result, TranslateError},
};

/// The `public` field of a target: either `"*"` or an explicit header list.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum PublicHeaders {
    All(String),
    List(Vec<String>),
}

impl Default for PublicHeaders {
    fn default() -> Self {
        PublicHeaders::All("*".to_string())
    }
}

/// One entry of a GN desc. Only the fields the translator consumes are
/// declared; GN emits many more and they are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TargetDesc {
    #[serde(rename = "type")]
    pub kind: String,
    pub toolchain: String,
    pub testonly: bool,
    pub sources: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub script: Option<String>,
    pub args: Vec<String>,
    pub response_file_contents: Vec<String>,
    pub cflags: Vec<String>,
    pub cflags_cc: Vec<String>,
    pub defines: Vec<String>,
    pub include_dirs: Vec<String>,
    pub ldflags: Vec<String>,
    pub libs: Vec<String>,
    pub deps: Vec<String>,
    pub public: PublicHeaders,
    pub output_name: Option<String>,
    pub crate_name: Option<String>,
    pub crate_root: Option<String>,
    pub rustflags: Vec<String>,
    pub rustenv: Vec<String>,
    pub metadata: BTreeMap<String, Vec<Value>>,
}

impl TargetDesc {
    /// Returns the string values stored under `key` in the target metadata.
    pub fn metadata_strings(&self, key: &str) -> Vec<String> {
        self.metadata
            .get(key)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|value| value.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A whole desc dump: label (with toolchain suffix for non-default
/// toolchains) to target.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct GnDesc(BTreeMap<String, TargetDesc>);

impl GnDesc {
    pub fn new(targets: BTreeMap<String, TargetDesc>) -> Self {
        Self(targets)
    }

    pub fn get(&self, label: &str) -> Option<&TargetDesc> {
        self.0.get(label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Infers the Android arch this dump was generated for from the most
    /// common Android toolchain among its targets.
    pub fn arch(&self) -> Option<Arch> {
        self.0
            .values()
            .map(|desc| Arch::from_toolchain(&desc.toolchain, false))
            .filter(|arch| arch.is_android())
            .counts()
            .into_iter()
            .max_by_key(|(arch, count)| (*count, *arch))
            .map(|(arch, _)| arch)
    }
}

/// Flags emitted by the Rust build-script runner: label → arch → rustc flags.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct BuildScriptOutputs(BTreeMap<String, BTreeMap<String, Vec<String>>>);

impl BuildScriptOutputs {
    pub fn new(outputs: BTreeMap<String, BTreeMap<String, Vec<String>>>) -> Self {
        Self(outputs)
    }

    /// Returns the flags the build script of `label` produced for `arch`.
    pub fn flags(&self, label: &str, arch: Arch) -> &[String] {
        self.0
            .get(label)
            .and_then(|arches| arches.get(arch.as_ref()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|source| TranslateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| TranslateError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads one GN desc dump.
pub fn load_desc(path: &Path) -> Result<GnDesc> {
    let desc: GnDesc = load_json(path)?;
    tracing::debug!(
        "Loaded {} targets from {} ({})",
        desc.len(),
        path.display(),
        desc.arch().map(|arch| arch.to_string()).unwrap_or_else(|| "no android toolchain".into())
    );
    Ok(desc)
}

/// Reads the build-script output mapping.
pub fn load_build_script_outputs(path: &Path) -> Result<BuildScriptOutputs> {
    load_json(path)
}
