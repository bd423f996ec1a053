// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Compiler and linker flags of C/C++ modules.

use std::collections::BTreeSet;

use crate::{
    arch::Arch,
    config::TranslatorConfig,
    error::{Result, TranslateError},
    graph::{ArchData, Target},
    label::label_to_module_name,
    module::{Module, ModuleType},
};

/// Machine flags passed through; everything else comes from the defaults.
const CFLAG_ALLOWLIST: &[&str] = &[
    "-maes",
    "-mavx",
    "-mavx2",
    "-mfma",
    "-mfpu=neon",
    "-mpclmul",
    "-msse4.1",
    "-msse4.2",
    "-mssse3",
];

/// Arm64 flag enabling the memory tagging extension the way Soong spells it.
const MEMTAG_CFLAG: &str = "-march=armv8-a+memtag";

/// ldflags Soong already applies on its own.
const LDFLAG_DENYLIST: &[&str] = &[
    "--sysroot",
    "--target=",
    "-Wl,--thinlto-cache-dir",
    "-Wl,--thinlto-cache-policy",
    "-Wl,--thinlto-jobs",
    "-flto",
    "-Wl,--lto-O",
    "-Wl,-z,max-page-size",
    "-Wl,--strip-debug",
    "-Wl,--strip-all",
    "-Wl,-z,force-bti",
];

const VERSION_SCRIPT_FLAG: &str = "-Wl,--version-script=";

/// System libraries that are linked as platform shared libraries.
const SYSTEM_LIBS: &[&str] = &["android", "log"];

fn is_allowed_cflag(flag: &str) -> bool {
    flag.starts_with("-D") || flag.starts_with("-U") || CFLAG_ALLOWLIST.contains(&flag)
}

fn is_denied_ldflag(flag: &str) -> bool {
    LDFLAG_DENYLIST.iter().any(|prefix| flag.starts_with(prefix))
}

/// cflags of one arch: allowlisted GN flags followed by the defines.
fn arch_cflags(arch: Arch, data: &ArchData) -> Vec<String> {
    let mut cflags: Vec<String> = data
        .cflags
        .iter()
        .filter(|flag| is_allowed_cflag(flag))
        .cloned()
        .collect();
    if arch == Arch::AndroidArm64 && data.cflags.iter().any(|flag| flag.contains("+mte")) {
        cflags.push(MEMTAG_CFLAG.to_string());
    }
    cflags.extend(
        data.defines
            .iter()
            .map(|define| format!("-D{}", define.replace('"', "\\\""))),
    );
    cflags
}

/// Maps a GN include dir to one inside the Android tree. Generated include
/// dirs are dropped; their headers arrive through generated_headers.
fn source_include_dir(config: &TranslatorConfig, dir: &str) -> Option<String> {
    if dir.starts_with("//out/") {
        return None;
    }
    Some(tree_include_dir(
        config,
        dir.trim_start_matches("//").trim_end_matches('/'),
    ))
}

/// `dir` relative to the Android tree.
pub(super) fn tree_include_dir(config: &TranslatorConfig, dir: &str) -> String {
    if dir.is_empty() || dir == "." {
        config.tree_path.clone()
    } else {
        format!("{}/{dir}", config.tree_path)
    }
}

/// Applies the flags, include dirs, system libs and C++ standard of `target`
/// to `module`. Returns the filegroup exposing its linker script, if any.
pub(super) fn apply_cc_flags(
    config: &TranslatorConfig,
    module: &mut Module,
    target: &Target,
) -> Result<Option<Module>> {
    let module_name = module.name.clone();
    let mut cpp_std: Option<String> = None;
    let mut version_scripts = BTreeSet::new();

    for (arch, data) in target.all_archs() {
        let props = module.arch_mut(arch);
        props.cflags = arch_cflags(arch, data);
        props.include_dirs.extend(
            data.include_dirs
                .iter()
                .filter_map(|dir| source_include_dir(config, dir)),
        );
        for flag in &data.ldflags {
            if let Some(script) = flag.strip_prefix(VERSION_SCRIPT_FLAG) {
                version_scripts.insert(script.trim_start_matches("../").to_string());
            } else if !is_denied_ldflag(flag) {
                props.ldflags.push(flag.clone());
            }
        }
        props.shared_libs.extend(
            data.libs
                .iter()
                .filter(|lib| SYSTEM_LIBS.contains(&lib.as_str()))
                .map(|lib| format!("lib{lib}")),
        );

        if let Some(std) = data.cflags.iter().rev().find_map(|flag| flag.strip_prefix("-std=")) {
            match &cpp_std {
                Some(first) if first != std => {
                    return Err(TranslateError::ConflictingCppStd {
                        module: module_name,
                        first: first.clone(),
                        second: std.to_string(),
                    });
                }
                _ => cpp_std = Some(std.to_string()),
            }
        }
    }
    if cpp_std.is_some() {
        module.cpp_std = cpp_std;
    }

    match version_scripts.len() {
        0 => Ok(None),
        1 => {
            let script = version_scripts.into_iter().next().unwrap_or_default();
            Ok(Some(version_script_filegroup(config, module, script)))
        }
        _ => Err(TranslateError::MultipleLinkerScripts {
            module: module_name,
            scripts: version_scripts.into_iter().collect(),
        }),
    }
}

/// Exposes a linker script to Soong, which only takes module references in
/// `version_script`.
fn version_script_filegroup(config: &TranslatorConfig, module: &mut Module, script: String) -> Module {
    let name = label_to_module_name(&config.module_prefix, &format!("//{script}"));
    let mut filegroup = Module::new(ModuleType::Filegroup, name.clone(), module.gn_target.as_deref());
    filegroup.common.srcs.insert(script);
    module.common.version_script = Some(format!(":{name}"));
    filegroup
}
