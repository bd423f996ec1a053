// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Hand-curated tweaks applied to specific modules once the whole graph is
//! built.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    arch::Arch,
    config::TranslatorConfig,
    label::TESTING_SUFFIX,
    module::{ArchModule, Module},
};

/// Set-valued properties a tweak can touch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetAttr {
    ApexAvailable,
    HeaderLibs,
    SharedLibs,
    Srcs,
    StaticLibs,
}

/// List-valued properties a tweak can touch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListAttr {
    Cflags,
    Flags,
    Ldflags,
}

/// A scalar property together with the value it is set to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scalar {
    CompileMultilib(&'static str),
    Rtti(bool),
    Stem(&'static str),
    Stl(&'static str),
}

/// A scalar property to clear.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarField {
    CompileMultilib,
    CppStd,
    Rtti,
    Stl,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PostProcessOp {
    /// Adds values to a set at the top level.
    AppendSet(SetAttr, &'static [&'static str]),
    /// Appends values to a list at the top level.
    ExtendList(ListAttr, &'static [&'static str]),
    /// Sets a scalar unless the module already has a value for it.
    SetScalar(Scalar),
    SetNone(ScalarField),
    /// Replaces a set inside one arch block.
    ReplaceArchAttr(Arch, SetAttr, &'static [&'static str]),
    /// Adds an entry to the `sanitize` map.
    InsertDict(&'static str, bool),
}

/// Tweaks keyed by module name without the channel prefix.
const POST_PROCESS_TABLE: &[(&str, &[PostProcessOp])] = &[
    (
        "components_cronet_android_cronet",
        &[
            PostProcessOp::InsertDict("hwaddress", false),
            PostProcessOp::AppendSet(SetAttr::SharedLibs, &["libandroid"]),
        ],
    ),
    (
        "buildtools_third_party_libc___libc__",
        &[
            PostProcessOp::SetScalar(Scalar::Stl("none")),
            PostProcessOp::SetScalar(Scalar::Rtti(true)),
        ],
    ),
    (
        "buildtools_third_party_libc__abi_libc__abi",
        &[PostProcessOp::SetScalar(Scalar::Rtti(true))],
    ),
    (
        "base_allocator_partition_allocator_src_partition_alloc_allocator_base",
        &[PostProcessOp::ExtendList(
            ListAttr::Cflags,
            &["-Wno-unused-variable"],
        )],
    ),
    (
        "third_party_icu_icuuc_private",
        &[PostProcessOp::ReplaceArchAttr(
            Arch::Host,
            SetAttr::SharedLibs,
            &[],
        )],
    ),
];

fn set_mut(props: &mut ArchModule, attr: SetAttr) -> Option<&mut BTreeSet<String>> {
    match attr {
        SetAttr::HeaderLibs => Some(&mut props.header_libs),
        SetAttr::SharedLibs => Some(&mut props.shared_libs),
        SetAttr::Srcs => Some(&mut props.srcs),
        SetAttr::StaticLibs => Some(&mut props.static_libs),
        SetAttr::ApexAvailable => None,
    }
}

fn strings<'a>(values: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
    values.iter().map(|value| value.to_string())
}

impl PostProcessOp {
    pub fn apply(&self, module: &mut Module) {
        match *self {
            PostProcessOp::AppendSet(SetAttr::ApexAvailable, values) => {
                module.apex_available.extend(strings(values));
            }
            PostProcessOp::AppendSet(attr, values) => {
                if let Some(set) = set_mut(&mut module.common, attr) {
                    set.extend(strings(values));
                }
            }
            PostProcessOp::ExtendList(attr, values) => {
                let list = match attr {
                    ListAttr::Cflags => &mut module.common.cflags,
                    ListAttr::Flags => &mut module.common.flags,
                    ListAttr::Ldflags => &mut module.common.ldflags,
                };
                list.extend(strings(values));
            }
            PostProcessOp::SetScalar(scalar) => match scalar {
                Scalar::CompileMultilib(value) => {
                    module.compile_multilib.get_or_insert_with(|| value.to_string());
                }
                Scalar::Rtti(value) => {
                    module.rtti.get_or_insert(value);
                }
                Scalar::Stem(value) => {
                    module.stem.get_or_insert_with(|| value.to_string());
                }
                Scalar::Stl(value) => {
                    module.stl.get_or_insert_with(|| value.to_string());
                }
            },
            PostProcessOp::SetNone(field) => match field {
                ScalarField::CompileMultilib => module.compile_multilib = None,
                ScalarField::CppStd => module.cpp_std = None,
                ScalarField::Rtti => module.rtti = None,
                ScalarField::Stl => module.stl = None,
            },
            PostProcessOp::ReplaceArchAttr(arch, attr, values) => {
                if let Some(set) = set_mut(module.arch_mut(arch), attr) {
                    *set = strings(values).collect();
                }
            }
            PostProcessOp::InsertDict(key, value) => {
                module.sanitize.insert(key.to_string(), value);
            }
        }
    }
}

/// Applies the table to every module. Modules already processed are left
/// alone, so running this twice is harmless.
pub fn apply_all(config: &TranslatorConfig, modules: &mut BTreeMap<String, Module>) {
    let table: BTreeMap<&str, &[PostProcessOp]> = POST_PROCESS_TABLE.iter().copied().collect();
    for module in modules.values_mut() {
        if module.post_processed {
            continue;
        }
        module.post_processed = true;
        let key = module
            .name
            .strip_prefix(config.module_prefix.as_str())
            .unwrap_or(&module.name);
        let key = key.strip_suffix(TESTING_SUFFIX).unwrap_or(key);
        let Some(ops) = table.get(key).copied() else {
            continue;
        };
        tracing::debug!("Post-processing {}", module.name);
        for op in ops {
            op.apply(module);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{config::Channel, module::ModuleType};

    #[test]
    fn ops_follow_attribute_semantics() {
        let mut module = Module::new(ModuleType::CcLibraryShared, "m", None);
        module.stl = Some("libc++_static".to_string());
        module.arch_mut(Arch::Host).shared_libs.insert("libicu".to_string());

        for op in [
            PostProcessOp::AppendSet(SetAttr::SharedLibs, &["liblog"]),
            PostProcessOp::ExtendList(ListAttr::Cflags, &["-DA"]),
            PostProcessOp::ExtendList(ListAttr::Cflags, &["-DA"]),
            PostProcessOp::SetScalar(Scalar::Stl("none")),
            PostProcessOp::SetScalar(Scalar::Stem("libm")),
            PostProcessOp::ReplaceArchAttr(Arch::Host, SetAttr::SharedLibs, &[]),
            PostProcessOp::InsertDict("cfi", false),
        ] {
            op.apply(&mut module);
        }

        assert!(module.common.shared_libs.contains("liblog"));
        assert_eq!(module.common.cflags, vec!["-DA", "-DA"]);
        assert_eq!(module.stl.as_deref(), Some("libc++_static"));
        assert_eq!(module.stem.as_deref(), Some("libm"));
        assert!(module.target[&Arch::Host].shared_libs.is_empty());
        assert_eq!(module.sanitize.get("cfi"), Some(&false));

        PostProcessOp::SetNone(ScalarField::Stl).apply(&mut module);
        assert_eq!(module.stl, None);
    }

    #[test]
    fn table_is_applied_once() {
        let config = TranslatorConfig::new(Channel::Tot, "/src");
        let name = "cronet_aml_base_allocator_partition_allocator_src_partition_alloc_allocator_base";
        let mut modules = BTreeMap::from([(
            name.to_string(),
            Module::new(ModuleType::CcLibraryStatic, name, None),
        )]);

        apply_all(&config, &mut modules);
        apply_all(&config, &mut modules);

        assert_eq!(modules[name].common.cflags, vec!["-Wno-unused-variable"]);
        assert!(modules[name].post_processed);
    }
}
