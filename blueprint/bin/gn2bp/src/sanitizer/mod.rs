// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Rewriters turning GN actions into commands a Soong genrule can run.
//!
//! Every recognized action script has an [`ActionSanitizer`] implementor;
//! [`new_sanitizer`] picks one from the script path.

pub mod bindgen;
mod common;
mod jni_zero;

use std::collections::BTreeSet;

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

pub use self::jni_zero::{jni_zero_target_type, is_placeholder_srcjar, JNI_ZERO_SCRIPT};
use self::{common::*, jni_zero::JniZeroSanitizer};
use crate::{
    arch::Arch,
    config::TranslatorConfig,
    error::{Result, TranslateError},
    graph::{ArchData, Target, TargetKind},
    label::{label_name, label_to_module_name, TESTING_SUFFIX},
    module::ModuleType,
};

/// Copy targets that are turned into genrules instead of being dissolved
/// into their dependents.
pub const COPY_ACTION_TARGETS: &[&str] = &[
    "//base:build_date_header",
    "//net/data/ssl/chrome_root_store:gen_root_store_inc",
];

/// Sentinel GN substitutes with the path of the response file.
const RESPONSE_FILE_SENTINEL: &str = "{{response_file_contents}}";

lazy_static! {
    static ref SOURCE_ROOT_PREFIX: Regex = Regex::new(r"^(\.\./)+").unwrap();
    static ref GEN_DIR_PREFIX: Regex = Regex::new(r"^(clang_[^/]+/)?gen(/|$)").unwrap();
}

/// Strips the `../../` leading back to the source tree and points
/// generated paths into the genrule's output directory.
pub fn sanitize_filepath(path: &str) -> String {
    let path = SOURCE_ROOT_PREFIX.replace(path, "");
    GEN_DIR_PREFIX.replace(&path, "$$(genDir)$2").into_owned()
}

pub fn location_tag(path: &str) -> String {
    format!("$(location {path})")
}

/// Files a genrule consumes as `tool_files` rather than `srcs`.
fn is_tool_file(path: &str) -> bool {
    path.ends_with(".py") || path.ends_with(".pydeps")
}

/// The view of one GN action for one arch, plus the context its rewrite
/// rules need.
#[derive(Clone, Debug)]
pub struct ActionState {
    pub label: String,
    /// Name of the genrule module being generated.
    pub name: String,
    pub arch: Arch,
    pub module_type: ModuleType,
    /// Repo-relative path of the action script.
    pub script: String,
    pub args: Vec<String>,
    pub sources: BTreeSet<String>,
    pub inputs: BTreeSet<String>,
    pub outputs: BTreeSet<String>,
    pub response_file_contents: String,
    pub deps: BTreeSet<String>,
    pub is_test: bool,
    pub module_prefix: String,
    pub tree_path: String,
    /// Extra `tools` and `tool_files` accumulated by the rewrite rules.
    pub tools: BTreeSet<String>,
    pub extra_tool_files: BTreeSet<String>,
    pub extra_srcs: BTreeSet<String>,
    /// Shell commands run before the script, joined with `&&`.
    pub pre_commands: Vec<String>,
    /// All JNI-annotated Java sources of the build graph.
    pub jni_java_sources: BTreeSet<String>,
}

impl ActionState {
    pub fn new(
        config: &TranslatorConfig,
        target: &Target,
        arch: Arch,
        name: String,
        module_type: ModuleType,
        jni_java_sources: &BTreeSet<String>,
    ) -> Self {
        let common = target.common();
        let data = target.arch.get(&arch);
        let merge = |get: fn(&ArchData) -> &BTreeSet<String>| -> BTreeSet<String> {
            get(common)
                .iter()
                .chain(data.into_iter().flat_map(get))
                .cloned()
                .collect()
        };
        let args = match data {
            Some(data) if !data.args.is_empty() => data.args.clone(),
            _ => common.args.clone(),
        };
        let response_file_contents = match data {
            Some(data) if !data.response_file_contents.is_empty() => {
                data.response_file_contents.clone()
            }
            _ => common.response_file_contents.clone(),
        };
        Self {
            label: target.label.clone(),
            name,
            arch,
            module_type,
            script: target
                .script
                .as_deref()
                .map(|script| script.trim_start_matches("//").to_string())
                .unwrap_or_default(),
            args,
            sources: merge(|d| &d.sources),
            inputs: merge(|d| &d.inputs),
            outputs: merge(|d| &d.outputs),
            response_file_contents,
            deps: merge(|d| &d.deps),
            is_test: target.is_testing(),
            module_prefix: config.module_prefix.clone(),
            tree_path: config.tree_path.clone(),
            tools: BTreeSet::new(),
            extra_tool_files: BTreeSet::new(),
            extra_srcs: BTreeSet::new(),
            pre_commands: Vec::new(),
            jni_java_sources: jni_java_sources.clone(),
        }
    }

    fn position(&self, flag: &str) -> Option<usize> {
        self.args.iter().position(|arg| arg == flag)
    }

    pub fn has_arg(&self, flag: &str) -> bool {
        self.position(flag).is_some()
    }

    /// Value following `flag`, if present.
    pub fn value_arg(&self, flag: &str) -> Option<&str> {
        self.position(flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Replaces the value following `flag`. Returns whether the flag exists.
    pub fn set_value_arg(&mut self, flag: &str, value: impl Into<String>) -> bool {
        match self.position(flag) {
            Some(i) if i + 1 < self.args.len() => {
                self.args[i + 1] = value.into();
                true
            }
            _ => false,
        }
    }

    /// Applies `rewrite` to the value following every occurrence of `flag`.
    pub fn update_value_args(&mut self, flag: &str, rewrite: impl Fn(&str) -> String) {
        for i in 0..self.args.len().saturating_sub(1) {
            if self.args[i] == flag {
                self.args[i + 1] = rewrite(&self.args[i + 1]);
            }
        }
    }

    /// Removes `flag` together with its value.
    pub fn delete_value_arg(&mut self, flag: &str) {
        if let Some(i) = self.position(flag) {
            let end = (i + 2).min(self.args.len());
            self.args.drain(i..end);
        }
    }

    pub fn append_value_arg(&mut self, flag: &str, value: impl Into<String>) {
        self.args.push(flag.to_string());
        self.args.push(value.into());
    }

    /// Splits `--flag=value` into two arguments and escapes double quotes.
    pub fn normalize_args(&mut self) {
        self.args = self
            .args
            .iter()
            .flat_map(|arg| match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    vec![flag.to_string(), value.to_string()]
                }
                _ => vec![arg.clone()],
            })
            .map(|arg| arg.replace('"', "\\\""))
            .collect();
    }

    /// Rewrites every path-looking argument and location-tags the ones
    /// naming a source or input of the action.
    pub fn sanitize_paths(&mut self) {
        let known: BTreeSet<String> = self.sources.union(&self.inputs).cloned().collect();
        for arg in self.args.iter_mut() {
            if arg.starts_with('-') || arg.starts_with("$(") {
                continue;
            }
            let path = sanitize_filepath(arg);
            *arg = if known.contains(&path) {
                location_tag(&path)
            } else {
                path
            };
        }
    }

    /// Replaces `{{response_file_contents}}` with `/dev/stdin`. The contents
    /// are fed through a here-string by [`ActionState::default_cmd`].
    pub fn redirect_response_file(&mut self) {
        for arg in self.args.iter_mut() {
            if arg == RESPONSE_FILE_SENTINEL {
                *arg = "/dev/stdin".to_string();
            }
        }
    }

    /// Sources a genrule can take as `srcs`: everything the action reads
    /// that is not a tool.
    pub fn default_srcs(&self) -> BTreeSet<String> {
        self.sources
            .iter()
            .chain(self.inputs.iter())
            .filter(|path| !is_tool_file(path))
            .cloned()
            .chain(self.extra_srcs.iter().cloned())
            .collect()
    }

    pub fn default_tool_files(&self) -> BTreeSet<String> {
        self.sources
            .iter()
            .chain(self.inputs.iter())
            .filter(|path| is_tool_file(path))
            .cloned()
            .chain(self.extra_tool_files.iter().cloned())
            .chain(std::iter::once(self.script.clone()))
            .collect()
    }

    /// `mkdir` commands for every directory outputs are written to.
    fn output_dir_commands(&self) -> Vec<String> {
        self.outputs
            .iter()
            .filter_map(|out| out.rsplit_once('/').map(|(dir, _)| dir))
            .unique()
            .map(|dir| format!("mkdir -p $(genDir)/{dir}"))
            .collect()
    }

    /// The script invocation, one argument per line.
    pub fn default_cmd(&self) -> String {
        let mut lines = self.output_dir_commands();
        lines.extend(self.pre_commands.iter().cloned());
        let mut invocation = vec![location_tag(&self.script)];
        invocation.extend(self.args.iter().cloned());
        let invocation = invocation.join("\n");
        let mut cmd = lines.into_iter().map(|line| format!("{line} &&")).join("\n");
        if !cmd.is_empty() {
            cmd.push('\n');
        }
        cmd.push_str(&invocation);
        if !self.response_file_contents.is_empty() {
            cmd.push_str(&format!("\n<<< \\\"{}\\\"", self.response_file_contents));
        }
        cmd
    }

    /// Module name of a dep label.
    pub fn module_name(&self, label: &str) -> String {
        label_to_module_name(&self.module_prefix, label)
    }

    /// Module name of the translator-built protoc.
    pub fn protoc_module(&self) -> String {
        let suffix = if self.is_test { TESTING_SUFFIX } else { "" };
        self.module_name(&format!("//third_party/protobuf:protoc{suffix}"))
    }

    /// The GN dep whose target name matches `binary` (e.g. `./clang_x64/foo`).
    pub fn dep_for_binary(&self, binary: &str) -> Option<&String> {
        let file = binary.rsplit('/').next().unwrap_or(binary);
        self.deps.iter().find(|dep| {
            label_name(dep).trim_end_matches(TESTING_SUFFIX) == file
        })
    }
}

/// Rewrites one GN action into a genrule.
pub trait ActionSanitizer {
    fn state(&self) -> &ActionState;
    fn state_mut(&mut self) -> &mut ActionState;

    /// Script-specific argument rewrites, run after the common ones.
    fn sanitize_args(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> String {
        self.state().name.clone()
    }

    fn sanitize(&mut self) -> Result<()> {
        let state = self.state_mut();
        state.normalize_args();
        state.redirect_response_file();
        state.sanitize_paths();
        self.sanitize_args()
    }

    fn srcs(&self) -> BTreeSet<String> {
        self.state().default_srcs()
    }

    fn tool_files(&self) -> BTreeSet<String> {
        self.state().default_tool_files()
    }

    fn tools(&self) -> BTreeSet<String> {
        self.state().tools.clone()
    }

    fn outputs(&self) -> BTreeSet<String> {
        self.state().outputs.clone()
    }

    fn deps(&self) -> BTreeSet<String> {
        self.state().deps.clone()
    }

    fn cmd(&self) -> String {
        self.state().default_cmd()
    }

    fn is_header_generated(&self) -> bool {
        self.outputs().iter().any(|out| out.ends_with(".h"))
    }
}

/// Picks the sanitizer for `state`'s script.
pub fn new_sanitizer(kind: TargetKind, state: ActionState) -> Result<Box<dyn ActionSanitizer>> {
    if kind == TargetKind::Copy {
        return Ok(Box::new(CopySanitizer(state)));
    }
    let sanitizer: Box<dyn ActionSanitizer> = match state.script.as_str() {
        "build/write_buildflag_header.py" => Box::new(WriteBuildFlagHeaderSanitizer(state)),
        "build/write_build_date_header.py" => Box::new(WriteBuildDateHeaderSanitizer(state)),
        "build/util/version.py" => Box::new(VersionSanitizer(state)),
        "build/android/gyp/java_cpp_enum.py"
        | "build/android/gyp/java_cpp_features.py"
        | "build/android/gyp/java_cpp_strings.py" => Box::new(JavaCppSanitizer(state)),
        "net/tools/dafsa/make_dafsa.py" => Box::new(MakeDafsaSanitizer(state)),
        "build/android/gyp/write_native_libraries_java.py" => {
            Box::new(WriteNativeLibrariesSanitizer(state))
        }
        "build/gn_run_binary.py" => Box::new(GnRunBinarySanitizer(state)),
        "build/protoc_java.py" => Box::new(ProtocJavaSanitizer(state)),
        script if script == JNI_ZERO_SCRIPT.trim_start_matches("//") => {
            Box::new(JniZeroSanitizer(state))
        }
        _ => {
            return Err(TranslateError::UnknownActionScript {
                label: state.label,
                script: state.script,
            })
        }
    };
    Ok(sanitizer)
}
