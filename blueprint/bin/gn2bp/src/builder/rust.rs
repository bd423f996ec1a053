// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::fmt;

use super::defaults;
use crate::{
    arch::Arch,
    graph::Target,
    module::{Module, ModuleType},
};

const DEFAULT_EDITION: &str = "2021";

/// cfg only present to force a rebuild when rustc rolls.
const REVISION_CFG: &str = "cr_rustc_revision";

/// Flags taking their value as the next argument when not written as
/// `--flag=value`.
const FLAGS_WITH_VALUE: &[&str] = &[
    "--cap-lints",
    "--cfg",
    "--color",
    "--edition",
    "--extern",
    "--sysroot",
    "--target",
];

/// Flags Soong sets itself.
const DENIED_FLAGS: &[&str] = &[
    "--color",
    "--extern",
    "--sysroot",
    "--target",
    "-Clinker-plugin-lto",
];

/// A rustc flag split into its key and optional value.
#[derive(Clone, Debug, Eq, PartialEq)]
struct RustFlag {
    key: String,
    value: Option<String>,
}

impl RustFlag {
    fn is_denied(&self, arch: Arch) -> bool {
        DENIED_FLAGS.contains(&self.key.as_str())
            || (self.key == "-Cembed-bitcode" && self.value.as_deref() == Some("no"))
            || self.key.starts_with('@')
            || self.key.starts_with("-Z")
            || (arch.is_host() && self.key == "-Cpanic")
    }
}

impl fmt::Display for RustFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.key, value),
            None => write!(f, "{}", self.key),
        }
    }
}

fn split_value(flag: &str) -> RustFlag {
    match flag.split_once('=') {
        Some((key, value)) => RustFlag {
            key: key.to_string(),
            value: Some(value.to_string()),
        },
        None => RustFlag {
            key: flag.to_string(),
            value: None,
        },
    }
}

/// Splits rustc flags into key/value pairs, accepting `--key value`,
/// `--key=value`, `-C key=value` and `-Ckey=value`.
fn parse_rust_flags(flags: &[String]) -> Vec<RustFlag> {
    let mut parsed = Vec::new();
    let mut iter = flags.iter();
    while let Some(flag) = iter.next() {
        if flag == "-C" || flag == "-Z" {
            if let Some(option) = iter.next() {
                parsed.push(split_value(&format!("{flag}{option}")));
            }
        } else if FLAGS_WITH_VALUE.contains(&flag.as_str()) {
            parsed.push(RustFlag {
                key: flag.clone(),
                value: iter.next().cloned(),
            });
        } else {
            parsed.push(split_value(flag));
        }
    }
    parsed
}

/// Sets the crate properties of a Rust module and translates its rustc flags
/// into Soong's dedicated fields where one exists.
pub(super) fn apply_rust_properties(module: &mut Module, target: &Target) {
    module.crate_name = target.crate_name.clone();
    module.crate_root = target.crate_root.clone();
    if let Some(version) = &target.rust_package_version {
        module.cargo_pkg_version = Some(version.clone());
        module.cargo_env_compat = Some(true);
    }
    if module.ty != ModuleType::RustProcMacro {
        module.apex_available.insert(defaults::APEX.to_string());
        module.min_sdk_version = Some(defaults::MIN_SDK_VERSION.to_string());
    }

    for (arch, data) in target.all_archs() {
        for flag in parse_rust_flags(&data.rust_flags) {
            if flag.is_denied(arch) {
                continue;
            }
            match (flag.key.as_str(), flag.value.as_deref()) {
                ("--edition", Some(edition)) => module.edition = Some(edition.to_string()),
                ("--cfg", Some(cfg)) => {
                    if let Some(feature) = cfg.strip_prefix("feature=") {
                        module
                            .arch_mut(arch)
                            .features
                            .insert(feature.trim_matches('"').to_string());
                    } else if !cfg.starts_with(REVISION_CFG) {
                        module.arch_mut(arch).cfgs.insert(cfg.replace('"', "\\\""));
                    }
                }
                _ => module.arch_mut(arch).flags.push(flag.to_string()),
            }
        }
    }
    if module.edition.is_none() {
        module.edition = Some(DEFAULT_EDITION.to_string());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn flags_are_split_into_keys_and_values() {
        let parsed = parse_rust_flags(&strings(&[
            "--cfg",
            "feature=\"std\"",
            "-C",
            "opt-level=3",
            "--edition=2018",
            "-Zdep-info-omit-d-target",
        ]));
        assert_eq!(
            parsed.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
            vec![
                "--cfg=feature=\"std\"",
                "-Copt-level=3",
                "--edition=2018",
                "-Zdep-info-omit-d-target",
            ]
        );
    }

    #[test]
    fn panic_strategy_is_left_to_soong_on_host() {
        let flag = split_value("-Cpanic=abort");
        assert!(flag.is_denied(Arch::Host));
        assert!(!flag.is_denied(Arch::AndroidArm64));
        assert!(split_value("-Cembed-bitcode=no").is_denied(Arch::AndroidArm));
        assert!(split_value("@rsp").is_denied(Arch::AndroidArm));
    }
}
