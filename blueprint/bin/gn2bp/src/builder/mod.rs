// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Conversion of [`Target`]s into Soong [`Module`]s.
//!
//! Modules are created depth-first: a module is finished only after every
//! module it depends on, so dependency propagation can read the finished
//! dep modules.

mod action;
pub mod builtins;
mod defaults;
mod flags;
mod headers;
mod java;
pub mod postprocess;
mod proto;
mod rust;
#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};

use tracing::instrument;

use crate::{
    arch::Arch,
    config::TranslatorConfig,
    error::{Result, TranslateError},
    graph::{Target, TargetGraph, TargetKind},
    label::{label_name, label_to_module_name, rust_module_name, TESTING_SUFFIX},
    module::{Module, ModuleType},
    sanitizer::{bindgen::BindgenArgs, COPY_ACTION_TARGETS},
};

pub use self::defaults::cc_defaults_module;

/// Source extensions a C/C++ module compiles.
const CC_SOURCE_EXTENSIONS: &[&str] = &[".c", ".cc", ".cpp", ".S", ".s"];

/// The language of the module asking for a dependency, which decides the
/// genrule type an action turns into.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Flavor {
    Cc,
    Java,
}

/// Merges a set-valued property of `$dep` into `$module` for the arch a
/// dependency edge was declared in.
macro_rules! merge_set {
    ($module:expr, $dep:expr, $arch:expr, $field:ident) => {{
        if $arch == Arch::Common {
            $module.common.$field.extend($dep.common.$field.iter().cloned());
            for (dep_arch, props) in &$dep.target {
                $module
                    .arch_mut(*dep_arch)
                    .$field
                    .extend(props.$field.iter().cloned());
            }
        } else {
            let values: Vec<String> = $dep
                .common
                .$field
                .iter()
                .chain($dep.target.get(&$arch).into_iter().flat_map(|p| p.$field.iter()))
                .cloned()
                .collect();
            $module.arch_mut($arch).$field.extend(values);
        }
    }};
}
pub(crate) use merge_set;

pub struct ModuleBuilder<'a> {
    config: &'a TranslatorConfig,
    graph: &'a TargetGraph,
    modules: BTreeMap<String, Module>,
    /// Module names dependents link against, per label and flavor.
    built: HashMap<(String, Flavor), Vec<String>>,
}

impl<'a> ModuleBuilder<'a> {
    pub fn new(config: &'a TranslatorConfig, graph: &'a TargetGraph) -> Self {
        let mut builder = Self {
            config,
            graph,
            modules: BTreeMap::new(),
            built: HashMap::new(),
        };
        builder.add_module(cc_defaults_module(config));
        builder
    }

    /// Creates the modules of every root and everything they depend on, then
    /// applies the post-processing table.
    #[instrument(skip_all)]
    pub fn build(mut self, roots: &[String]) -> Result<BTreeMap<String, Module>> {
        for root in roots {
            self.create_modules(root, Flavor::Cc)?;
        }
        postprocess::apply_all(self.config, &mut self.modules);
        Ok(self.modules)
    }

    fn add_module(&mut self, module: Module) {
        tracing::debug!("Emitting {} {}", module.ty, module.name);
        self.modules.insert(module.name.clone(), module);
    }

    /// Name of the primary module generated for `target`.
    pub(crate) fn module_name(&self, target: &Target) -> String {
        let prefix = &self.config.module_prefix;
        match target.kind {
            TargetKind::RustLibrary | TargetKind::RustProcMacro => {
                let crate_name = target
                    .crate_name
                    .clone()
                    .unwrap_or_else(|| bindgen_crate_name(&target.label));
                rust_module_name(prefix, &target.label, &crate_name)
            }
            TargetKind::RustBindgen => {
                rust_module_name(prefix, &target.label, &bindgen_crate_name(&target.label))
            }
            TargetKind::StaticLibrary | TargetKind::SourceSet
                if self.is_static_inline_companion(target) =>
            {
                format!("lib{}", label_to_module_name(prefix, &target.label))
            }
            _ => label_to_module_name(prefix, &target.label),
        }
    }

    /// Whether `target` compiles the static-inline shims of a bindgen
    /// target. Soong wants such libraries to be named `lib*`.
    fn is_static_inline_companion(&self, target: &Target) -> bool {
        target.all_deps().iter().any(|(dep, _)| {
            self.graph.get(dep).map_or(false, |dep| {
                dep.kind == TargetKind::RustBindgen
                    && dep
                        .all_archs()
                        .any(|(_, data)| data.args.iter().any(|arg| arg == "--wrap-static-fns"))
            })
        })
    }

    /// Creates the modules for `label` if needed and returns the names of
    /// the modules dependents should reference.
    pub(crate) fn create_modules(&mut self, label: &str, flavor: Flavor) -> Result<Vec<String>> {
        let graph = self.graph;
        let target = graph.get(label).ok_or_else(|| TranslateError::MissingTarget {
            label: label.to_string(),
        })?;
        // Only actions turn into different modules depending on the consumer.
        let flavor = if target.kind.is_action() || target.kind == TargetKind::Copy {
            flavor
        } else {
            Flavor::Cc
        };
        let key = (label.to_string(), flavor);
        if let Some(names) = self.built.get(&key) {
            return Ok(names.clone());
        }

        let names = match target.kind {
            TargetKind::Group | TargetKind::GeneratedFile => Vec::new(),
            TargetKind::Copy
                if !COPY_ACTION_TARGETS
                    .contains(&label.strip_suffix(TESTING_SUFFIX).unwrap_or(label)) =>
            {
                Vec::new()
            }
            TargetKind::Copy | TargetKind::Action | TargetKind::ActionForeach => {
                self.create_action_modules(target, flavor)?
            }
            TargetKind::ProtoLibrary => self.create_proto_modules(target)?,
            TargetKind::JavaLibrary => vec![self.create_java_modules(target)?],
            TargetKind::AidlInterface => vec![self.create_aidl_modules(target)],
            TargetKind::RustBindgen => vec![self.create_bindgen_module(target)?],
            TargetKind::StaticLibrary
            | TargetKind::SharedLibrary
            | TargetKind::Executable
            | TargetKind::SourceSet
            | TargetKind::RustLibrary
            | TargetKind::RustProcMacro
            | TargetKind::RustExecutable => vec![self.create_linked_module(target)?],
        };
        self.built.insert(key, names.clone());
        Ok(names)
    }

    fn create_linked_module(&mut self, target: &Target) -> Result<String> {
        let ty = match target.kind {
            TargetKind::Executable if target.testonly => ModuleType::CcTest,
            TargetKind::Executable => ModuleType::CcBinary,
            TargetKind::SharedLibrary => ModuleType::CcLibraryShared,
            TargetKind::RustLibrary => ModuleType::RustFfiStatic,
            TargetKind::RustProcMacro => ModuleType::RustProcMacro,
            TargetKind::RustExecutable => ModuleType::RustBinary,
            _ => ModuleType::CcLibraryStatic,
        };
        let mut module = Module::new(ty, self.module_name(target), Some(&target.label));
        module.build_file_path = Some(target.build_file_path.clone());
        if target.host_supported() {
            module.host_supported = Some(true);
        }
        if !target.device_supported() {
            module.device_supported = Some(false);
        }
        if matches!(target.kind, TargetKind::SharedLibrary | TargetKind::Executable) {
            module.stem = target.output_name.clone();
        }

        if ty.is_cc() {
            module.defaults.push(self.config.cc_defaults_module());
            if target.rtti {
                module.rtti = Some(true);
            }
            for (arch, data) in target.all_archs() {
                let props = module.arch_mut(arch);
                props.srcs.extend(
                    data.sources
                        .iter()
                        .filter(|source| {
                            CC_SOURCE_EXTENSIONS.iter().any(|ext| source.ends_with(ext))
                        })
                        .cloned(),
                );
            }
            if let Some(version_script) = flags::apply_cc_flags(self.config, &mut module, target)? {
                self.add_module(version_script);
            }
        } else {
            rust::apply_rust_properties(&mut module, target);
        }

        self.link_deps(&mut module, target)?;

        if ty.is_cc() {
            for concatenated in self.concatenate_headers(&mut module) {
                self.add_module(concatenated);
            }
            if ty == ModuleType::CcLibraryStatic {
                for (_, props) in module.target.iter_mut() {
                    props.export_generated_headers = props.generated_headers.clone();
                }
                module.common.export_generated_headers = module.common.generated_headers.clone();
            }
        }

        let name = module.name.clone();
        self.add_module(module);
        Ok(name)
    }

    /// Creates the modules of every dep of `target` and propagates their
    /// properties into `module`.
    fn link_deps(&mut self, module: &mut Module, target: &Target) -> Result<()> {
        for (dep, arch) in target.all_deps() {
            self.link_dep(module, &dep, arch)?;
        }
        Ok(())
    }

    fn link_dep(&mut self, module: &mut Module, dep: &str, arch: Arch) -> Result<()> {
        if let Some(callback) = builtins::lookup(dep) {
            callback(module, arch);
            return Ok(());
        }
        let flavor = if module.ty.is_java() {
            Flavor::Java
        } else {
            Flavor::Cc
        };
        for dep_name in self.create_modules(dep, flavor)? {
            let Some(dep_module) = self.modules.get(&dep_name) else {
                continue;
            };
            propagate(module, dep_module, arch);

            if dep_module.ty == ModuleType::RustBindgen && module.ty == ModuleType::CcLibraryStatic
            {
                let include_dirs = module.union_of(|p| &p.include_dirs);
                if let Some(bindgen) = self.modules.get_mut(&dep_name) {
                    bindgen.static_inline_library = Some(module.name.clone());
                    bindgen.common.include_dirs.extend(include_dirs);
                }
            }
        }
        Ok(())
    }

    fn create_aidl_modules(&mut self, target: &Target) -> String {
        let name = label_to_module_name(&self.config.module_prefix, &target.label);
        let sources = target.union_of(|data| &data.sources);

        let mut filegroup = Module::new(
            ModuleType::Filegroup,
            format!("{name}_aidl_files"),
            Some(&target.label),
        );
        filegroup.build_file_path = Some(target.build_file_path.clone());
        filegroup.path = sources.iter().find_map(|source| java_package_root(source));
        filegroup.common.srcs = sources;

        let mut interface = Module::new(ModuleType::AidlInterface, name.clone(), Some(&target.label));
        interface.build_file_path = Some(target.build_file_path.clone());
        interface.common.srcs.insert(format!(":{}", filegroup.name));
        interface.unstable = Some(true);
        interface.min_sdk_version = Some(defaults::MIN_SDK_VERSION.to_string());
        interface.apex_available.insert(defaults::APEX.to_string());

        self.add_module(filegroup);
        self.add_module(interface);
        name
    }

    fn create_bindgen_module(&mut self, target: &Target) -> Result<String> {
        let args = target
            .all_archs()
            .find(|(_, data)| !data.args.is_empty())
            .map(|(_, data)| data.args.clone())
            .unwrap_or_default();
        let parsed = BindgenArgs::parse(&args);

        let mut module = Module::new(
            ModuleType::RustBindgen,
            self.module_name(target),
            Some(&target.label),
        );
        module.build_file_path = Some(target.build_file_path.clone());
        module.crate_name = Some(bindgen_crate_name(&target.label));
        module.source_stem = Some("bindings".to_string());
        module.wrapper_src = parsed.wrapper_src.clone();
        module.bindgen_flags = parsed.bindgen_flags.clone();
        module.common.cflags = parsed.forwarded_cflags();
        if parsed.cpp {
            module.common.cflags.extend(["-x".to_string(), "c++".to_string()]);
            module.cpp_std = Some(defaults::CPP_STD.to_string());
        }
        module.common.include_dirs = parsed
            .include_dirs()
            .iter()
            .map(|dir| flags::tree_include_dir(self.config, dir))
            .collect();
        if parsed.wrap_static_fns {
            module.handle_static_inline = Some(true);
        }
        module.apex_available.insert(defaults::APEX.to_string());
        module.min_sdk_version = Some(defaults::MIN_SDK_VERSION.to_string());

        self.link_deps(&mut module, target)?;

        // rust_bindgen cannot take generated_headers; wrap them into a header
        // library.
        let headers = module.union_of(|p| &p.transitive_generated_headers_modules);
        if !headers.is_empty() {
            let mut wrapper = Module::new(
                ModuleType::CcLibraryHeaders,
                format!("{}_generated_headers", module.name),
                Some(&target.label),
            );
            wrapper.build_file_path = module.build_file_path.clone();
            wrapper.common.generated_headers = headers.clone();
            wrapper.common.export_generated_headers = headers;
            wrapper.apex_available.insert(defaults::APEX.to_string());
            wrapper.min_sdk_version = Some(defaults::MIN_SDK_VERSION.to_string());
            module.common.header_libs.insert(wrapper.name.clone());
            self.add_module(wrapper);
        }

        let name = module.name.clone();
        self.add_module(module);
        Ok(name)
    }
}

/// Crate name used for bindgen targets, which GN does not name.
fn bindgen_crate_name(label: &str) -> String {
    label_name(label)
        .trim_end_matches(TESTING_SUFFIX)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Directory containing the Java package hierarchy of an AIDL/Java source.
fn java_package_root(path: &str) -> Option<String> {
    let components: Vec<&str> = path.split('/').collect();
    let index = components
        .iter()
        .position(|component| matches!(*component, "org" | "com" | "android"))?;
    Some(components[..index].join("/"))
}

/// Applies the propagation rule for one finished dep module.
fn propagate(module: &mut Module, dep: &Module, arch: Arch) {
    let consumer = module.ty;
    match dep.ty {
        ModuleType::CcLibraryShared => {
            module.arch_mut(arch).shared_libs.insert(dep.name.clone());
        }
        ModuleType::RustFfiStatic if consumer.is_rust() => {
            module.arch_mut(arch).rustlibs.insert(dep.name.clone());
        }
        ModuleType::CcLibraryStatic | ModuleType::RustFfiStatic => {
            if consumer.is_final_link() && !dep.is_omitted() {
                module.arch_mut(arch).whole_static_libs.insert(dep.name.clone());
            }
            merge_set!(module, dep, arch, transitive_generated_headers_modules);
            merge_set!(module, dep, arch, shared_libs);
            merge_set!(module, dep, arch, header_libs);
        }
        ModuleType::RustProcMacro => {
            module.arch_mut(arch).proc_macros.insert(dep.name.clone());
        }
        // C++ consumers reach bindgen output through `static_inline_library`.
        ModuleType::RustBindgen if consumer.is_rust() => {
            module.arch_mut(arch).srcs.insert(format!(":{}", dep.name));
        }
        ModuleType::AidlInterface => {
            let props = module.arch_mut(arch);
            if consumer.is_cc() {
                props.srcs.insert(format!(":{}-ndk-source", dep.name));
                props.generated_headers.insert(format!("{}-ndk-source", dep.name));
            } else if consumer.is_java() {
                props.srcs.insert(format!(":{}-java-source", dep.name));
            } else if consumer.is_rust() {
                props.srcs.insert(format!(":{}-rust-source", dep.name));
            }
        }
        ModuleType::CcGenrule | ModuleType::Genrule => {
            let takes_headers = !consumer.is_rust() || consumer == ModuleType::RustBindgen;
            let props = module.arch_mut(arch);
            if takes_headers {
                props
                    .transitive_generated_headers_modules
                    .extend(dep.genrule_headers.iter().cloned());
            }
            props.srcs.extend(dep.genrule_srcs.iter().cloned());
            props
                .shared_libs
                .extend(dep.genrule_shared_libs.iter().cloned());
        }
        _ => {}
    }
}
