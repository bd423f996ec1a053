// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Genrules for GN actions, one sanitizer run per arch.

use std::collections::BTreeSet;

use itertools::Itertools;

use super::{Flavor, ModuleBuilder};
use crate::{
    arch::Arch,
    error::{Result, TranslateError},
    graph::{Target, TargetKind},
    label::{label_to_module_name, short_module_name, TESTING_SUFFIX},
    module::{Module, ModuleType},
    sanitizer::{jni_zero_target_type, new_sanitizer, ActionState},
};

/// Actions whose output does not depend on the arch. They are translated
/// for `android_arm` only.
const ARM_ONLY_ACTIONS: &[&str] = &["//build/android:native_libraries_gen"];

/// What the sanitizer produced for one arch.
struct ArchGenrule {
    arch: Arch,
    cmd: String,
    srcs: BTreeSet<String>,
    out: BTreeSet<String>,
    tool_files: BTreeSet<String>,
    tools: BTreeSet<String>,
    header: bool,
}

impl ModuleBuilder<'_> {
    pub(super) fn create_action_modules(
        &mut self,
        target: &Target,
        flavor: Flavor,
    ) -> Result<Vec<String>> {
        let ty = match flavor {
            Flavor::Cc => ModuleType::CcGenrule,
            Flavor::Java => ModuleType::JavaGenrule,
        };
        let base = self.action_module_name(target, flavor);
        let archs = action_archs(target);

        // Tools and upstream genrules referenced by the command.
        for (dep, _) in target.all_deps() {
            if !self.graph.is_builtin(&dep) {
                self.create_modules(&dep, flavor)?;
            }
        }

        let mut names = Vec::new();
        if target.kind == TargetKind::ActionForeach {
            let sources = target.union_of(|data| &data.sources);
            for (index, source) in sources.iter().enumerate() {
                let foreach = ForeachSource {
                    source,
                    all: &sources,
                };
                let module = self.create_genrule(
                    target,
                    ty,
                    &archs,
                    format!("{base}_{index}"),
                    Some(foreach),
                )?;
                names.push(module.name.clone());
                self.add_module(module);
            }
        } else {
            let module = self.create_genrule(target, ty, &archs, base, None)?;
            names.push(module.name.clone());
            self.add_module(module);
        }
        Ok(names)
    }

    pub(super) fn action_module_name(&self, target: &Target, flavor: Flavor) -> String {
        let prefix = &self.config.module_prefix;
        let name = if jni_zero_target_type(target).is_some() {
            short_module_name(prefix, &target.label)
        } else {
            label_to_module_name(prefix, &target.label)
        };
        match flavor {
            Flavor::Cc => name,
            Flavor::Java => format!("{name}__java"),
        }
    }

    /// Runs the sanitizer for every arch and merges the results into one
    /// genrule. Arch-dependent commands are guarded by shell conditionals.
    fn create_genrule(
        &self,
        target: &Target,
        ty: ModuleType,
        archs: &[Arch],
        name: String,
        foreach: Option<ForeachSource<'_>>,
    ) -> Result<Module> {
        let mut generated = Vec::new();
        for &arch in archs {
            let mut state = ActionState::new(
                self.config,
                target,
                arch,
                name.clone(),
                ty,
                self.graph.jni_java_sources(),
            );
            if let Some(foreach) = &foreach {
                foreach.restrict(&mut state);
            }
            let mut sanitizer = new_sanitizer(target.kind, state)?;
            sanitizer.sanitize()?;
            generated.push(ArchGenrule {
                arch,
                cmd: sanitizer.cmd(),
                srcs: sanitizer.srcs(),
                out: sanitizer.outputs(),
                tool_files: sanitizer.tool_files(),
                tools: sanitizer.tools(),
                header: sanitizer.is_header_generated(),
            });
        }

        let inconsistent = |attribute: &str| TranslateError::InconsistentArchAttribute {
            label: target.label.clone(),
            attribute: attribute.to_string(),
        };
        let (first, rest) = generated.split_first().ok_or_else(|| inconsistent("arch"))?;
        for other in rest {
            if other.srcs != first.srcs {
                return Err(inconsistent("srcs"));
            }
            if other.out != first.out {
                return Err(inconsistent("out"));
            }
            if other.tool_files != first.tool_files {
                return Err(inconsistent("tool_files"));
            }
        }

        let cmd = if rest.iter().all(|other| other.cmd == first.cmd) {
            first.cmd.clone()
        } else if ty == ModuleType::JavaGenrule {
            // java_genrule has a single variant; there is nothing to switch on.
            return Err(inconsistent("cmd"));
        } else {
            generated
                .iter()
                .map(|g| match g.arch.cmd_condition() {
                    Some(condition) => format!("if [[ {condition} ]];\nthen\n{};\nfi;", g.cmd),
                    None => g.cmd.clone(),
                })
                .join("\n")
        };

        let mut module = Module::new(ty, name, Some(&target.label));
        module.build_file_path = Some(target.build_file_path.clone());
        module.common.cmd = Some(cmd);
        module.common.srcs = first.srcs.clone();
        module.common.out = first.out.clone();
        module.common.tool_files = first.tool_files.clone();
        module.common.tools = generated.iter().flat_map(|g| g.tools.iter().cloned()).collect();
        module.jni_zero_target_type = jni_zero_target_type(target);
        if ty == ModuleType::CcGenrule {
            if first.header {
                module.genrule_headers.insert(module.name.clone());
            } else {
                module.genrule_srcs.insert(format!(":{}", module.name));
            }
        }
        Ok(module)
    }
}

fn action_archs(target: &Target) -> Vec<Arch> {
    let label = target.label.strip_suffix(TESTING_SUFFIX).unwrap_or(&target.label);
    if ARM_ONLY_ACTIONS.contains(&label) && target.arch.contains_key(&Arch::AndroidArm) {
        return vec![Arch::AndroidArm];
    }
    let archs = target.real_archs().map(|(arch, _)| arch).collect_vec();
    if archs.is_empty() {
        vec![Arch::Common]
    } else {
        archs
    }
}

/// GN's `{{source_name_part}}`: the file name without its last extension.
fn source_name_part(source: &str) -> &str {
    let file = source.rsplit('/').next().unwrap_or(source);
    file.rsplit_once('.').map_or(file, |(name, _)| name)
}

/// One source of an `action_foreach`, with its siblings to tell apart
/// which outputs it produces.
#[derive(Clone, Copy)]
struct ForeachSource<'a> {
    source: &'a str,
    all: &'a BTreeSet<String>,
}

impl ForeachSource<'_> {
    /// The source whose name part is the longest one `out` is named after.
    /// The name part must be followed by the end of the name or by one of
    /// `.`, `_` and `-`, so `a` does not claim `ab.h`.
    fn owner_of(&self, out: &str) -> Option<&str> {
        let out_file = out.rsplit('/').next().unwrap_or(out);
        self.all
            .iter()
            .map(String::as_str)
            .filter(|source| {
                out_file
                    .strip_prefix(source_name_part(source))
                    .map_or(false, |rest| {
                        rest.is_empty() || rest.starts_with(['.', '_', '-'])
                    })
            })
            .max_by_key(|source| source_name_part(source).len())
    }

    /// Narrows an `action_foreach` state down to this source, expanding the
    /// `{{source*}}` placeholders GN leaves in the arguments.
    fn restrict(&self, state: &mut ActionState) {
        let source = self.source;
        let (dir, file) = source.rsplit_once('/').unwrap_or(("", source));
        let name_part = source_name_part(source);

        state.sources = BTreeSet::from([source.to_string()]);
        let outputs = std::mem::take(&mut state.outputs);
        state.outputs = outputs
            .into_iter()
            .filter(|out| self.owner_of(out) == Some(source))
            .collect();
        for arg in state.args.iter_mut() {
            *arg = arg
                .replace("{{source}}", &format!("../../{source}"))
                .replace("{{source_name_part}}", name_part)
                .replace("{{source_file_part}}", file)
                .replace("{{source_gen_dir}}", &format!("gen/{dir}"));
        }
    }
}
