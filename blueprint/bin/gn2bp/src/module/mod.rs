// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! In-memory Soong modules, ready to be serialized.

use std::collections::{BTreeMap, BTreeSet};

use strum_macros::{AsRefStr, Display, EnumString};

use crate::arch::Arch;

/// The Soong module types the translator emits.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ModuleType {
    AidlInterface,
    CcBinary,
    CcDefaults,
    CcGenrule,
    CcLibraryHeaders,
    CcLibraryShared,
    CcLibraryStatic,
    CcPreprocessNoConfiguration,
    CcTest,
    #[default]
    Filegroup,
    Genrule,
    JavaGenrule,
    JavaImport,
    JavaLibrary,
    License,
    Package,
    RustBindgen,
    RustBinary,
    RustFfiStatic,
    RustProcMacro,
}

impl ModuleType {
    /// Modules compiled from C/C++ sources.
    pub fn is_compiled(self) -> bool {
        matches!(
            self,
            ModuleType::CcBinary
                | ModuleType::CcTest
                | ModuleType::CcLibraryShared
                | ModuleType::CcLibraryStatic
        )
    }

    pub fn is_cc(self) -> bool {
        self.as_ref().starts_with("cc_")
    }

    pub fn is_rust(self) -> bool {
        self.as_ref().starts_with("rust_")
    }

    pub fn is_java(self) -> bool {
        self.as_ref().starts_with("java_")
    }

    pub fn is_genrule(self) -> bool {
        matches!(
            self,
            ModuleType::Genrule | ModuleType::CcGenrule | ModuleType::JavaGenrule
        )
    }

    /// Whether the module ends up in a linked binary, i.e. static
    /// dependencies must be whole-archived into it.
    pub fn is_final_link(self) -> bool {
        matches!(
            self,
            ModuleType::CcBinary
                | ModuleType::CcTest
                | ModuleType::CcLibraryShared
                | ModuleType::RustBinary
        )
    }
}

/// Which half of the jni_zero code generator an action runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JniZeroTargetType {
    /// Per-library generator producing proxies and native headers.
    Generator,
    /// Whole-program generator producing the registration code.
    RegistrationGenerator,
}

/// Properties that may be set either at the top level of a module or
/// inside one of its `target: { <arch>: { ... } }` blocks.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ArchModule {
    pub srcs: BTreeSet<String>,
    pub shared_libs: BTreeSet<String>,
    pub static_libs: BTreeSet<String>,
    pub whole_static_libs: BTreeSet<String>,
    pub header_libs: BTreeSet<String>,
    pub generated_headers: BTreeSet<String>,
    pub export_generated_headers: BTreeSet<String>,
    pub export_include_dirs: BTreeSet<String>,
    pub include_dirs: BTreeSet<String>,
    pub libs: BTreeSet<String>,
    pub rustlibs: BTreeSet<String>,
    pub proc_macros: BTreeSet<String>,
    pub features: BTreeSet<String>,
    pub cfgs: BTreeSet<String>,
    pub flags: Vec<String>,
    pub cflags: Vec<String>,
    pub cppflags: Vec<String>,
    pub ldflags: Vec<String>,
    pub tools: BTreeSet<String>,
    pub tool_files: BTreeSet<String>,
    pub out: BTreeSet<String>,
    pub cmd: Option<String>,
    pub version_script: Option<String>,
    pub enabled: Option<bool>,
    /// Genrules whose headers must be visible when compiling this module.
    /// Propagation-only.
    pub transitive_generated_headers_modules: BTreeSet<String>,
}

impl ArchModule {
    /// Whether nothing would be serialized for this block.
    pub fn is_empty(&self) -> bool {
        let without_propagation = ArchModule {
            transitive_generated_headers_modules: BTreeSet::new(),
            ..self.clone()
        };
        without_propagation == ArchModule::default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Module {
    pub ty: ModuleType,
    pub name: String,
    /// GN label the module was generated from, emitted as a comment.
    pub gn_target: Option<String>,
    /// Top-level properties.
    pub common: ArchModule,
    /// Per-arch properties, keyed by the arch's Soong name.
    pub target: BTreeMap<Arch, ArchModule>,

    pub defaults: Vec<String>,
    pub stem: Option<String>,
    pub cpp_std: Option<String>,
    pub c_std: Option<String>,
    pub stl: Option<String>,
    pub sdk_version: Option<String>,
    pub min_sdk_version: Option<String>,
    pub apex_available: BTreeSet<String>,
    pub compile_multilib: Option<String>,
    pub host_supported: Option<bool>,
    pub device_supported: Option<bool>,
    pub rtti: Option<bool>,
    pub unstable: Option<bool>,
    pub path: Option<String>,
    pub crate_name: Option<String>,
    pub crate_root: Option<String>,
    pub edition: Option<String>,
    pub cargo_env_compat: Option<bool>,
    pub cargo_pkg_version: Option<String>,
    pub source_stem: Option<String>,
    pub wrapper_src: Option<String>,
    pub bindgen_flags: Vec<String>,
    pub handle_static_inline: Option<bool>,
    pub static_inline_library: Option<String>,
    pub whole_program_vtables: Option<bool>,
    pub jarjar_rules: Option<String>,
    pub jars: BTreeSet<String>,
    pub errorprone_javacflags: Vec<String>,
    pub processor_class: Option<String>,
    pub javacflags: Vec<String>,
    pub plugins: BTreeSet<String>,
    pub sanitize: BTreeMap<String, bool>,
    pub visibility: BTreeSet<String>,
    pub default_applicable_licenses: BTreeSet<String>,
    pub default_visibility: BTreeSet<String>,
    pub license_kinds: BTreeSet<String>,
    pub license_text: BTreeSet<String>,
    pub include_build_directory: Option<bool>,

    /// Directory (relative to the GN root) the module would live in.
    pub build_file_path: Option<String>,
    /// Lets the assembler move genrule-like modules out of the top level.
    pub allow_rebasing: bool,
    pub post_processed: bool,
    pub java_unfiltered_module: Option<String>,
    pub jni_zero_target_type: Option<JniZeroTargetType>,
    /// Outputs of a header-producing genrule, consumed via
    /// `generated_headers` by dependents.
    pub genrule_headers: BTreeSet<String>,
    /// Source modules (`:name`) a dependent should compile.
    pub genrule_srcs: BTreeSet<String>,
    pub genrule_shared_libs: BTreeSet<String>,
}

impl Module {
    pub fn new(ty: ModuleType, name: impl Into<String>, gn_target: Option<&str>) -> Self {
        Self {
            ty,
            name: name.into(),
            gn_target: gn_target.map(str::to_string),
            ..Default::default()
        }
    }

    /// Properties for `arch`; [`Arch::Common`] maps to the top level.
    pub fn arch(&self, arch: Arch) -> Option<&ArchModule> {
        match arch {
            Arch::Common => Some(&self.common),
            _ => self.target.get(&arch),
        }
    }

    pub fn arch_mut(&mut self, arch: Arch) -> &mut ArchModule {
        match arch {
            Arch::Common => &mut self.common,
            _ => self.target.entry(arch).or_default(),
        }
    }

    /// The top level followed by every per-arch block.
    pub fn all_archs(&self) -> impl Iterator<Item = (Arch, &ArchModule)> {
        std::iter::once((Arch::Common, &self.common))
            .chain(self.target.iter().map(|(arch, props)| (*arch, props)))
    }

    /// Union of a set-valued property over the top level and every arch.
    pub fn union_of<F>(&self, get: F) -> BTreeSet<String>
    where
        F: Fn(&ArchModule) -> &BTreeSet<String>,
    {
        self.all_archs()
            .flat_map(|(_, props)| get(props).iter().cloned())
            .collect()
    }

    pub fn is_compiled(&self) -> bool {
        self.ty.is_compiled()
    }

    /// A static library contributing neither objects nor headers is not
    /// worth emitting; its attributes already reached its dependents.
    pub fn is_omitted(&self) -> bool {
        self.ty == ModuleType::CcLibraryStatic
            && self.union_of(|p| &p.srcs).is_empty()
            && self.union_of(|p| &p.export_generated_headers).is_empty()
    }

    /// Whether any output of this genrule, in any arch, is a header.
    pub fn has_header_outputs(&self) -> bool {
        self.union_of(|p| &p.out).iter().any(|out| out.ends_with(".h"))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn module_types_use_soong_names() {
        assert_eq!(ModuleType::CcLibraryStatic.to_string(), "cc_library_static");
        assert_eq!(
            ModuleType::from_str("cc_preprocess_no_configuration").unwrap(),
            ModuleType::CcPreprocessNoConfiguration
        );
        assert!(ModuleType::RustFfiStatic.is_rust());
        assert!(ModuleType::JavaGenrule.is_genrule());
        assert!(!ModuleType::CcLibraryStatic.is_final_link());
    }

    #[test]
    fn empty_static_libraries_are_omitted() {
        let mut module = Module::new(ModuleType::CcLibraryStatic, "lib", None);
        assert!(module.is_omitted());

        module
            .arch_mut(Arch::AndroidArm)
            .export_generated_headers
            .insert("gen".into());
        assert!(!module.is_omitted());

        let mut module = Module::new(ModuleType::CcLibraryStatic, "lib", None);
        module.common.srcs.insert("a.cc".into());
        assert!(!module.is_omitted());
    }

    #[test]
    fn arch_blocks_ignore_propagation_sets() {
        let mut props = ArchModule::default();
        props.transitive_generated_headers_modules.insert("x".into());
        assert!(props.is_empty());
        props.cflags.push("-DX".into());
        assert!(!props.is_empty());
    }
}
