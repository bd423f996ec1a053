// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! License metadata read from `README.chromium` files.

use std::{collections::BTreeSet, fs, path::Path};

use crate::{
    error::{Result, TranslateError},
    module::{Module, ModuleType},
};

pub const README_FILE: &str = "README.chromium";

/// `License:` values mapped to Soong license kinds.
const LICENSE_KINDS: &[(&str, &str)] = &[
    ("Apache 2.0", "SPDX-license-identifier-Apache-2.0"),
    ("Apache-2.0", "SPDX-license-identifier-Apache-2.0"),
    ("BSD", "SPDX-license-identifier-BSD"),
    ("BSD-2-Clause", "SPDX-license-identifier-BSD-2-Clause"),
    ("BSD-3-Clause", "SPDX-license-identifier-BSD-3-Clause"),
    ("BSL-1.0", "SPDX-license-identifier-BSL-1.0"),
    ("ICU", "SPDX-license-identifier-ICU"),
    ("ISC", "SPDX-license-identifier-ISC"),
    ("MIT", "SPDX-license-identifier-MIT"),
    ("MPL 2.0", "SPDX-license-identifier-MPL-2.0"),
    ("NCSA", "SPDX-license-identifier-NCSA"),
    ("OpenSSL", "SPDX-license-identifier-OpenSSL"),
    ("Unicode-3.0", "SPDX-license-identifier-Unicode-3.0"),
    ("Unicode-DFS-2016", "SPDX-license-identifier-Unicode-DFS"),
    ("Zlib", "SPDX-license-identifier-Zlib"),
];

/// The license fields of a README.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReadmeLicense {
    pub kinds: BTreeSet<String>,
    /// License files relative to the README's directory.
    pub files: BTreeSet<String>,
}

fn license_kind(name: &str) -> Option<&'static str> {
    LICENSE_KINDS
        .iter()
        .find(|(license, _)| license.eq_ignore_ascii_case(name))
        .map(|(_, kind)| *kind)
}

/// Extracts `License:` and `License File:` from README contents. `dir` is
/// the README's directory relative to the repo root; it is used to make
/// `//`-absolute license files relative.
pub fn parse_readme(contents: &str, dir: &str) -> ReadmeLicense {
    let mut license = ReadmeLicense::default();
    for line in contents.lines() {
        if let Some(value) = line.strip_prefix("License File:") {
            for file in value.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                let file = match file.strip_prefix("//") {
                    Some(absolute) => match absolute.strip_prefix(&format!("{dir}/")) {
                        Some(relative) => relative.to_string(),
                        None => {
                            tracing::warn!("{dir}: license file {file} is outside the package");
                            continue;
                        }
                    },
                    None => file.trim_start_matches('/').to_string(),
                };
                license.files.insert(file);
            }
        } else if let Some(value) = line.strip_prefix("License:") {
            for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                match license_kind(name) {
                    Some(kind) => {
                        license.kinds.insert(kind.to_string());
                    }
                    None => tracing::warn!("{dir}: unknown license {name:?}"),
                }
            }
        }
    }
    license
}

/// Reads the README of `dir`, if there is one.
pub fn read_readme(repo_root: &Path, dir: &str) -> Result<Option<ReadmeLicense>> {
    let path = repo_root.join(dir).join(README_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(&path).map_err(|source| TranslateError::Io { path, source })?;
    Ok(Some(parse_readme(&contents, dir)))
}

/// Name of the license module declared in the blueprint of `dir`.
pub fn license_module_name(tree_path: &str, dir: &str) -> String {
    format!("{}_{}_license", tree_path, dir).replace(['/', '-', '.'], "_")
}

pub fn license_module(name: &str, license: &ReadmeLicense) -> Module {
    let mut module = Module::new(ModuleType::License, name, None);
    module.visibility.insert(":__subpackages__".to_string());
    module.license_kinds = license.kinds.clone();
    module.license_text = license.files.clone();
    module
}
