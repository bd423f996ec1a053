// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The merged, per-arch view of every GN target reachable from the roots.


use std::collections::{BTreeMap, BTreeSet, HashSet};

use itertools::Itertools;
use strum_macros::{Display, EnumString};

use crate::{
    arch::Arch,
    desc::{BuildScriptOutputs, GnDesc, PublicHeaders, TargetDesc},
    error::{Result, TranslateError},
    label::{label_dir, label_to_path, normalize_output, strip_toolchain, TESTING_SUFFIX},
    sanitizer::COPY_ACTION_TARGETS,
};

pub const PROTOC_WRAPPER_SCRIPT: &str = "//tools/protoc_wrapper/protoc_wrapper.py";
pub const AIDL_SCRIPT: &str = "//build/android/gyp/aidl.py";
pub const BINDGEN_SCRIPT: &str = "//build/rust/run_bindgen.py";
pub const RUST_BUILD_SCRIPT: &str = "//build/rust/run_build_script.py";

/// Crates vendored from crates.io live five levels deep:
/// `third_party/rust/chromium_crates_io/vendor/<crate>-<version>`.
const RUST_VENDOR_PREFIX: &str = "third_party/rust/chromium_crates_io/vendor/";

/// Defines that only exist to force a rebuild when the toolchain rolls.
const REBUILD_ONLY_DEFINES: &[&str] = &[
    "CR_CLANG_REVISION",
    "CR_LIBCXX_REVISION",
    "CR_SYSROOT_KEY",
    "CR_XCODE_VERSION",
];

/// Metadata key holding the JNI-annotated Java sources of a jni_zero action.
const JNI_SOURCES_METADATA: &str = "jni_source_files";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TargetKind {
    StaticLibrary,
    SharedLibrary,
    Executable,
    Group,
    Action,
    ActionForeach,
    SourceSet,
    ProtoLibrary,
    Copy,
    GeneratedFile,
    RustLibrary,
    RustProcMacro,
    RustExecutable,
    RustBindgen,
    JavaLibrary,
    AidlInterface,
}

impl TargetKind {
    /// Whether targets of this kind are compiled and linked.
    pub fn is_linker_unit(self) -> bool {
        matches!(
            self,
            TargetKind::StaticLibrary
                | TargetKind::SharedLibrary
                | TargetKind::Executable
                | TargetKind::SourceSet
                | TargetKind::RustLibrary
                | TargetKind::RustProcMacro
                | TargetKind::RustExecutable
        )
    }

    pub fn is_rust(self) -> bool {
        matches!(
            self,
            TargetKind::RustLibrary
                | TargetKind::RustProcMacro
                | TargetKind::RustExecutable
                | TargetKind::RustBindgen
        )
    }

    pub fn is_action(self) -> bool {
        matches!(self, TargetKind::Action | TargetKind::ActionForeach)
    }
}

/// Attributes of a target for one arch.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ArchData {
    pub sources: BTreeSet<String>,
    pub inputs: BTreeSet<String>,
    pub outputs: BTreeSet<String>,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
    pub rust_flags: Vec<String>,
    pub defines: BTreeSet<String>,
    pub include_dirs: BTreeSet<String>,
    pub libs: BTreeSet<String>,
    pub deps: BTreeSet<String>,
    pub transitive_static_libs_deps: BTreeSet<String>,
    pub args: Vec<String>,
    pub response_file_contents: String,
}

impl ArchData {
    /// Folds `other` into `self` without duplicating list entries.
    fn absorb(&mut self, other: &ArchData) {
        for flag in &other.cflags {
            if !self.cflags.contains(flag) {
                self.cflags.push(flag.clone());
            }
        }
        for flag in &other.ldflags {
            if !self.ldflags.contains(flag) {
                self.ldflags.push(flag.clone());
            }
        }
        self.defines.extend(other.defines.iter().cloned());
        self.include_dirs.extend(other.include_dirs.iter().cloned());
        self.libs.extend(other.libs.iter().cloned());
        self.deps.extend(other.deps.iter().cloned());
    }
}

/// One GN target after cross-arch merging.
#[derive(Clone, Debug)]
pub struct Target {
    pub label: String,
    pub kind: TargetKind,
    pub testonly: bool,
    /// Per-arch sections, always including [`Arch::Common`].
    pub arch: BTreeMap<Arch, ArchData>,
    pub script: Option<String>,
    pub proto_paths: BTreeSet<String>,
    pub proto_exports: BTreeSet<String>,
    pub proto_in_dir: String,
    pub proto_plugin: Option<String>,
    pub proto_plugin_options: Option<String>,
    pub crate_name: Option<String>,
    pub crate_root: Option<String>,
    pub rust_package_version: Option<String>,
    pub rust_source_dir: Option<String>,
    pub allowed_hosts: Option<BTreeSet<String>>,
    pub java_jar_excluded_patterns: Vec<String>,
    pub java_jar_included_patterns: Vec<String>,
    pub output_name: Option<String>,
    pub rtti: bool,
    pub public_headers: BTreeSet<String>,
    pub build_file_path: String,
    pub transitive_jni_java_sources: BTreeSet<String>,
}

impl Target {
    fn new(label: String, kind: TargetKind) -> Self {
        let build_file_path = label_dir(&label).to_string();
        Self {
            label,
            kind,
            testonly: false,
            arch: BTreeMap::from([(Arch::Common, ArchData::default())]),
            script: None,
            proto_paths: BTreeSet::new(),
            proto_exports: BTreeSet::new(),
            proto_in_dir: String::new(),
            proto_plugin: None,
            proto_plugin_options: None,
            crate_name: None,
            crate_root: None,
            rust_package_version: None,
            rust_source_dir: None,
            allowed_hosts: None,
            java_jar_excluded_patterns: Vec::new(),
            java_jar_included_patterns: Vec::new(),
            output_name: None,
            rtti: false,
            public_headers: BTreeSet::new(),
            build_file_path,
            transitive_jni_java_sources: BTreeSet::new(),
        }
    }

    pub fn common(&self) -> &ArchData {
        &self.arch[&Arch::Common]
    }

    /// Iterates over the arches the target is built for.
    pub fn real_archs(&self) -> impl Iterator<Item = (Arch, &ArchData)> {
        self.arch
            .iter()
            .filter(|(arch, _)| arch.is_real())
            .map(|(arch, data)| (*arch, data))
    }

    /// Iterates over the common section followed by every real arch.
    pub fn all_archs(&self) -> impl Iterator<Item = (Arch, &ArchData)> {
        self.arch.iter().map(|(arch, data)| (*arch, data))
    }

    pub fn is_testing(&self) -> bool {
        self.label.ends_with(TESTING_SUFFIX)
    }

    pub fn host_supported(&self) -> bool {
        self.arch.keys().any(|arch| arch.is_host())
    }

    pub fn device_supported(&self) -> bool {
        self.arch.keys().any(|arch| arch.is_android())
    }

    /// Every dep label, paired with the arch section it appears in.
    pub fn all_deps(&self) -> Vec<(String, Arch)> {
        self.all_archs()
            .flat_map(|(arch, data)| data.deps.iter().map(move |dep| (dep.clone(), arch)))
            .collect()
    }

    /// Union of an attribute over the common section and every arch.
    pub fn union_of<'a, F, I>(&'a self, get: F) -> BTreeSet<String>
    where
        F: Fn(&'a ArchData) -> I,
        I: IntoIterator<Item = &'a String>,
    {
        self.arch
            .values()
            .flat_map(get)
            .cloned()
            .collect()
    }

    /// Returns the value of a `--flag value` action argument, looking at the
    /// common section first.
    pub fn arg_value(&self, arch: Arch, flag: &str) -> Option<String> {
        let data = match self.arch.get(&arch) {
            Some(data) if !data.args.is_empty() => data,
            _ => self.common(),
        };
        find_arg_value(&data.args, flag)
    }

    /// Moves the values shared by every real arch into the common section.
    ///
    /// Set attributes keep their intersection in `common`; list and string
    /// attributes move only when every arch carries the same non-empty value.
    /// Calling this more than once is harmless.
    pub fn finalize(&mut self) {
        let archs = self.arch.keys().copied().filter(|arch| arch.is_real()).collect_vec();
        if archs.len() < 2 {
            return;
        }

        macro_rules! finalize_set {
            ($($field:ident),*) => {$(
                let common: BTreeSet<String> = archs
                    .iter()
                    .map(|arch| &self.arch[arch].$field)
                    .fold(None, |acc: Option<BTreeSet<String>>, values| match acc {
                        None => Some(values.clone()),
                        Some(acc) => Some(acc.intersection(values).cloned().collect()),
                    })
                    .unwrap_or_default();
                for arch in &archs {
                    if let Some(data) = self.arch.get_mut(arch) {
                        data.$field.retain(|value| !common.contains(value));
                    }
                }
                if let Some(data) = self.arch.get_mut(&Arch::Common) {
                    data.$field.extend(common);
                }
            )*};
        }

        macro_rules! finalize_value {
            ($($field:ident),*) => {$(
                let first = self.arch[&archs[0]].$field.clone();
                let shared = !first.is_empty()
                    && archs.iter().all(|arch| self.arch[arch].$field == first);
                if shared {
                    for arch in &archs {
                        if let Some(data) = self.arch.get_mut(arch) {
                            data.$field = Default::default();
                        }
                    }
                    if let Some(data) = self.arch.get_mut(&Arch::Common) {
                        data.$field = first;
                    }
                }
            )*};
        }

        finalize_set!(sources, defines, include_dirs, deps, inputs, outputs, libs);
        finalize_value!(cflags, args, response_file_contents, ldflags, rust_flags);
    }
}

/// Finds the value following `flag` in an argument list, accepting both the
/// `--flag value` and `--flag=value` spellings.
pub fn find_arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    args.iter().enumerate().find_map(|(i, arg)| {
        if arg == flag {
            args.get(i + 1).cloned()
        } else {
            arg.strip_prefix(&prefix).map(str::to_string)
        }
    })
}

/// Every value given for `flag`, in either spelling.
pub fn find_arg_values(args: &[String], flag: &str) -> Vec<String> {
    let prefix = format!("{flag}=");
    args.iter()
        .enumerate()
        .filter_map(|(i, arg)| {
            if arg == flag {
                args.get(i + 1).cloned()
            } else {
                arg.strip_prefix(&prefix).map(str::to_string)
            }
        })
        .collect()
}

fn strip_source_root(path: &str) -> String {
    path.trim_start_matches("../").to_string()
}

/// Formats response file contents as one line of a Blueprint-quoted shell
/// command: `["--a", "--b=x y"]` becomes `--a --b=\\\"x y\\\"`, which the
/// shell reads back as `--b="x y"`.
fn format_response_file_contents(contents: &[String]) -> String {
    contents
        .iter()
        .map(|flag| match flag.split_once('=') {
            Some((key, value)) => format!("{key}=\\\\\\\"{value}\\\\\\\""),
            None => flag.clone(),
        })
        .join(" ")
}

fn is_rebuild_only_define(define: &str) -> bool {
    let name = define.split_once('=').map_or(define, |(name, _)| name);
    REBUILD_ONLY_DEFINES.contains(&name)
}

fn is_java_library(desc: &TargetDesc) -> bool {
    desc.metadata_strings("target_type").iter().any(|t| t == "java_library")
        || desc.metadata.keys().any(|key| key.starts_with("java_library_"))
}

/// Recognizes the kind of a target, applying the script- and
/// metadata-based special cases before falling back to the GN type.
fn infer_kind(label: &str, desc: &TargetDesc) -> Result<TargetKind> {
    let kind = match desc.script.as_deref() {
        Some(PROTOC_WRAPPER_SCRIPT) => TargetKind::ProtoLibrary,
        Some(AIDL_SCRIPT) => TargetKind::AidlInterface,
        Some(BINDGEN_SCRIPT) => TargetKind::RustBindgen,
        Some(RUST_BUILD_SCRIPT) => TargetKind::GeneratedFile,
        _ if desc.kind == "executable" && desc.crate_root.is_some() => TargetKind::RustExecutable,
        _ if is_java_library(desc) => TargetKind::JavaLibrary,
        _ => desc
            .kind
            .parse()
            .map_err(|_| TranslateError::UnknownTargetKind {
                label: label.to_string(),
                kind: desc.kind.clone(),
            })?,
    };
    Ok(kind)
}

/// Dependency edges of the target being visited, replayed once every dep
/// has been fully parsed.
struct PendingMerge {
    label: String,
    arch: Arch,
    deps: Vec<(String, Arch)>,
}

enum Visit {
    Enter(String),
    Exit(PendingMerge),
}

/// All targets parsed so far, keyed by label without toolchain.
#[derive(Debug, Default)]
pub struct TargetGraph {
    targets: BTreeMap<String, Target>,
    builtin_deps: BTreeSet<String>,
    build_script_outputs: BuildScriptOutputs,
    jni_java_sources: BTreeSet<String>,
}

impl TargetGraph {
    /// Creates an empty graph. Labels in `builtin_deps` are replaced by AOSP
    /// modules and are never parsed.
    pub fn new(
        builtin_deps: impl IntoIterator<Item = impl Into<String>>,
        build_script_outputs: BuildScriptOutputs,
    ) -> Self {
        Self {
            targets: BTreeMap::new(),
            builtin_deps: builtin_deps.into_iter().map(Into::into).collect(),
            build_script_outputs,
            jni_java_sources: BTreeSet::new(),
        }
    }

    pub fn get(&self, label: &str) -> Option<&Target> {
        self.targets.get(label)
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn is_builtin(&self, label: &str) -> bool {
        self.builtin_deps
            .contains(label.strip_suffix(TESTING_SUFFIX).unwrap_or(label))
    }

    /// Every JNI-annotated Java source seen in the graph.
    pub fn jni_java_sources(&self) -> &BTreeSet<String> {
        &self.jni_java_sources
    }

    /// The graph key of `gn_label` when reached from a root of the given
    /// kind.
    pub fn canonical_label(gn_label: &str, is_test_target: bool) -> String {
        let label = strip_toolchain(gn_label);
        if is_test_target && !label.ends_with(TESTING_SUFFIX) {
            format!("{label}{TESTING_SUFFIX}")
        } else {
            label.to_string()
        }
    }

    /// Parses the dependency closure of `label` from one per-arch desc and
    /// merges it into the graph.
    ///
    /// Targets reached from a testing root get [`TESTING_SUFFIX`] appended so
    /// that they never collide with their production variants.
    pub fn parse(&mut self, desc: &GnDesc, label: &str, is_test_target: bool) -> Result<()> {
        let mut stack = vec![Visit::Enter(label.to_string())];
        let mut in_progress: HashSet<(String, Arch)> = HashSet::new();

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(gn_label) => {
                    let name = Self::canonical_label(&gn_label, is_test_target);
                    if self.is_builtin(&name) {
                        continue;
                    }
                    let target_desc =
                        desc.get(&gn_label)
                            .ok_or_else(|| TranslateError::MissingTarget {
                                label: gn_label.clone(),
                            })?;
                    let arch = Arch::from_toolchain(&target_desc.toolchain, is_test_target);

                    if in_progress.contains(&(name.clone(), arch)) {
                        return Err(TranslateError::CyclicDependency { label: name });
                    }
                    if self
                        .targets
                        .get(&name)
                        .map_or(false, |target| target.arch.contains_key(&arch))
                    {
                        continue;
                    }

                    let deps = self.populate(&name, target_desc, arch)?;
                    let deps = deps
                        .into_iter()
                        .map(|dep| {
                            let dep_arch = desc
                                .get(&dep)
                                .map(|d| Arch::from_toolchain(&d.toolchain, is_test_target))
                                .unwrap_or(arch);
                            (dep, dep_arch)
                        })
                        .collect_vec();

                    in_progress.insert((name.clone(), arch));
                    let children = deps.iter().rev().map(|(dep, _)| dep.clone()).collect_vec();
                    stack.push(Visit::Exit(PendingMerge {
                        label: name,
                        arch,
                        deps,
                    }));
                    stack.extend(children.into_iter().map(Visit::Enter));
                }
                Visit::Exit(pending) => {
                    self.merge_deps(&pending, is_test_target);
                    in_progress.remove(&(pending.label, pending.arch));
                }
            }
        }
        Ok(())
    }

    /// Records the attributes of one target for one arch and returns the GN
    /// labels of the deps to visit next.
    fn populate(
        &mut self,
        name: &str,
        desc: &TargetDesc,
        arch: Arch,
    ) -> Result<Vec<String>> {
        let kind = infer_kind(name, desc)?;
        let build_script_flags = self
            .build_script_outputs
            .flags(name.strip_suffix(TESTING_SUFFIX).unwrap_or(name), arch)
            .to_vec();
        let target = self
            .targets
            .entry(name.to_string())
            .or_insert_with(|| Target::new(name.to_string(), kind));
        target.testonly = desc.testonly;
        target.output_name = desc.output_name.clone().or(target.output_name.take());

        let jni_sources = desc.metadata_strings(JNI_SOURCES_METADATA);
        target.transitive_jni_java_sources.extend(jni_sources.iter().cloned());
        self.jni_java_sources.extend(jni_sources);

        let allowed_hosts = desc.metadata_strings("allowed_hosts");
        if !allowed_hosts.is_empty() {
            target.allowed_hosts = Some(allowed_hosts.into_iter().collect());
        }

        if let PublicHeaders::List(headers) = &desc.public {
            target.public_headers.extend(headers.iter().map(|h| label_to_path(h)));
        }

        let mut data = ArchData {
            defines: desc
                .defines
                .iter()
                .filter(|define| !is_rebuild_only_define(define))
                .cloned()
                .collect(),
            include_dirs: desc.include_dirs.iter().cloned().collect(),
            libs: desc.libs.iter().cloned().collect(),
            ldflags: desc.ldflags.iter().cloned().unique().collect(),
            cflags: desc
                .cflags
                .iter()
                .chain(desc.cflags_cc.iter())
                .cloned()
                .unique()
                .collect(),
            ..Default::default()
        };
        if data.cflags.iter().any(|flag| flag == "-frtti") {
            target.rtti = true;
        }

        let mut deps = desc.deps.clone();

        match kind {
            TargetKind::ProtoLibrary => {
                target.script = desc.script.clone();
                target.proto_paths.extend(
                    find_arg_values(&desc.args, "--import-dir")
                        .iter()
                        .map(|dir| strip_source_root(dir)),
                );
                target
                    .proto_exports
                    .extend(desc.metadata_strings("exports"));
                if let Some(dir) = find_arg_value(&desc.args, "--proto-in-dir") {
                    target.proto_in_dir = strip_source_root(&dir);
                }
                target.proto_plugin = find_arg_value(&desc.args, "--plugin");
                target.proto_plugin_options = find_arg_value(&desc.args, "--plugin-options");
                data.sources.extend(desc.sources.iter().map(|s| label_to_path(s)));
                data.inputs.extend(desc.inputs.iter().map(|s| label_to_path(s)));
                data.outputs.extend(desc.outputs.iter().map(|o| normalize_output(o)));
                data.args = desc.args.clone();
            }
            TargetKind::GeneratedFile => {
                // The build-script runner already staged these files; nothing
                // behind this target needs to be visited.
                target.script = desc.script.clone();
                data.outputs.extend(desc.outputs.iter().map(|o| normalize_output(o)));
                deps.clear();
            }
            TargetKind::Action
            | TargetKind::ActionForeach
            | TargetKind::Copy
            | TargetKind::AidlInterface
            | TargetKind::RustBindgen => {
                target.script = desc.script.clone();
                data.sources.extend(desc.sources.iter().map(|s| label_to_path(s)));
                data.inputs.extend(desc.inputs.iter().map(|s| label_to_path(s)));
                data.outputs.extend(desc.outputs.iter().map(|o| normalize_output(o)));
                data.args = desc.args.clone();
                data.response_file_contents =
                    format_response_file_contents(&desc.response_file_contents);
            }
            TargetKind::JavaLibrary => {
                data.sources.extend(
                    desc.metadata_strings("java_library_sources")
                        .iter()
                        .map(|s| label_to_path(s)),
                );
                target.java_jar_excluded_patterns =
                    desc.metadata_strings("java_library_jar_excluded_patterns");
                target.java_jar_included_patterns =
                    desc.metadata_strings("java_library_jar_included_patterns");
                deps = desc.metadata_strings("java_library_deps");
            }
            _ if kind.is_linker_unit() => {
                data.sources.extend(
                    desc.sources
                        .iter()
                        .filter(|source| !source.starts_with("//out"))
                        .map(|s| label_to_path(s)),
                );
                if kind.is_rust() {
                    target.crate_name = desc.crate_name.clone();
                    target.crate_root = desc.crate_root.as_deref().map(label_to_path);
                    target.rust_source_dir = target.crate_root.as_deref().map(rust_source_dir);
                    target.rust_package_version = desc
                        .rustenv
                        .iter()
                        .find_map(|env| env.strip_prefix("CARGO_PKG_VERSION="))
                        .map(str::to_string);
                    data.rust_flags = desc.rustflags.clone();
                    data.rust_flags.extend(build_script_flags);
                }
            }
            _ => {}
        }

        if let Some(allowed) = &target.allowed_hosts {
            deps.retain(|dep| {
                let root = label_dir(dep).split('/').next().unwrap_or_default();
                let keep = allowed.contains(root);
                if !keep {
                    tracing::debug!("{}: dropping {} outside of allowed hosts", name, dep);
                }
                keep
            });
        }

        target.arch.insert(arch, data);
        Ok(deps.into_iter().unique().collect())
    }

    /// Folds the parsed deps of `pending` into its arch section: groups and
    /// plain copies are dissolved into their dependents, everything else
    /// becomes a dep edge.
    fn merge_deps(&mut self, pending: &PendingMerge, is_test_target: bool) {
        let Some(caller_kind) = self.targets.get(&pending.label).map(|t| t.kind) else {
            return;
        };
        let propagates_static_libs =
            caller_kind.is_linker_unit() || caller_kind == TargetKind::Group;

        let mut merged = ArchData::default();
        let mut transitive_static = BTreeSet::new();
        let mut jni_sources = BTreeSet::new();

        for (gn_dep, dep_arch) in &pending.deps {
            let dep_name = Self::canonical_label(gn_dep, is_test_target);
            let Some(dep) = self.targets.get(&dep_name) else {
                // Built-in deps stay as plain edges for the module builder.
                merged.deps.insert(dep_name);
                continue;
            };
            let dep_data = dep.arch.get(dep_arch);

            let dissolve = dep.kind == TargetKind::Group
                || (dep.kind == TargetKind::Copy
                    && !COPY_ACTION_TARGETS.contains(&strip_testing(&dep_name)));
            if dissolve {
                if let Some(dep_data) = dep_data {
                    merged.absorb(dep_data);
                    transitive_static.extend(dep_data.transitive_static_libs_deps.iter().cloned());
                }
            } else {
                merged.deps.insert(dep_name.clone());
            }

            if matches!(dep.kind, TargetKind::StaticLibrary | TargetKind::SourceSet) {
                transitive_static.insert(dep_name.clone());
            }
            if *dep_arch == pending.arch {
                if let Some(dep_data) = dep_data {
                    transitive_static.extend(dep_data.transitive_static_libs_deps.iter().cloned());
                }
            }
            jni_sources.extend(dep.transitive_jni_java_sources.iter().cloned());
        }

        let Some(target) = self.targets.get_mut(&pending.label) else {
            return;
        };
        target.transitive_jni_java_sources.extend(jni_sources);
        let data = target.arch.entry(pending.arch).or_default();
        data.absorb(&merged);
        if propagates_static_libs {
            data.deps.extend(transitive_static.iter().cloned());
            data.transitive_static_libs_deps.extend(transitive_static);
        }
    }

    /// Deduplicates the per-arch attributes of every target. Must be called
    /// once every desc has been parsed.
    pub fn finalize(&mut self) {
        for target in self.targets.values_mut() {
            target.finalize();
        }
    }
}

fn strip_testing(label: &str) -> &str {
    label.strip_suffix(TESTING_SUFFIX).unwrap_or(label)
}

/// Directory a Rust crate's sources live in. Vendored crates are rooted at
/// their versioned vendor directory rather than next to the crate root.
fn rust_source_dir(crate_root: &str) -> String {
    if crate_root.starts_with(RUST_VENDOR_PREFIX) {
        crate_root.split('/').take(5).join("/")
    } else {
        crate_root
            .rsplit_once('/')
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default()
    }
}
