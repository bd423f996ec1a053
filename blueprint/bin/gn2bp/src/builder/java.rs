// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The Java pipeline.
//!
//! Every `java_library` target turns into three modules:
//!
//! * `<base>__unfiltered` compiles the sources (or imports the jars).
//! * `<base>__filtered` runs `filter_zip` over the compiled jar, applying
//!   the target's `jar_excluded_patterns` and `jar_included_patterns`.
//! * `<base>` is what dependents link against. It has no sources of its own
//!   and statically includes the filtered jar.
//!
//! Top-level modules depend on each other through `static_libs`, while
//! unfiltered modules see each other through the non-propagating `libs` so
//! that javac's classpath matches Chromium's.

use std::collections::BTreeSet;

use itertools::Itertools;

use super::{builtins, defaults, propagate, Flavor, ModuleBuilder};
use crate::{
    arch::Arch,
    error::Result,
    graph::Target,
    label::{label_to_module_name, TESTING_SUFFIX},
    module::{JniZeroTargetType, Module, ModuleType},
    sanitizer::{is_placeholder_srcjar, location_tag},
};

const SDK_VERSION: &str = "module_current";
pub(super) const SYSTEM_SDK_VERSION: &str = "system_current";

/// Exclusion patterns replacing the ones GN declares. `build_java` ships
/// placeholder classes; only the ones the translator regenerates may be
/// dropped from its jar.
const FILTER_OVERRIDES: &[(&str, &[&str])] = &[(
    "//build/android:build_java",
    &["*/NativeLibraries.class", "*/NativeLibraries##*.class"],
)];

fn apply_java_defaults(module: &mut Module) {
    module.sdk_version = Some(SDK_VERSION.to_string());
    module.min_sdk_version = Some(defaults::MIN_SDK_VERSION.to_string());
    module.apex_available.insert(defaults::APEX.to_string());
}

/// Encodes patterns as the GN string list `filter_zip` parses, quoted for
/// the shell and escaped for a Blueprint string.
fn gn_string_list(patterns: &[String]) -> String {
    let list = format!("[{}]", patterns.iter().map(|p| format!("\"{p}\"")).join(", "));
    shell_escape::unix::escape(list.into()).replace('"', "\\\"")
}

impl ModuleBuilder<'_> {
    pub(super) fn create_java_modules(&mut self, target: &Target) -> Result<String> {
        let base = label_to_module_name(&self.config.module_prefix, &target.label);

        // Generated sources arrive through genrule deps.
        let all_sources = target.union_of(|data| &data.sources);
        let sources: BTreeSet<String> = all_sources
            .iter()
            .filter(|source| !source.starts_with("out/"))
            .cloned()
            .collect();
        let imports_jars = !sources.is_empty() && sources.iter().all(|s| s.ends_with(".jar"));

        let mut unfiltered = Module::new(
            if imports_jars {
                ModuleType::JavaImport
            } else {
                ModuleType::JavaLibrary
            },
            format!("{base}__unfiltered"),
            Some(&target.label),
        );
        unfiltered.build_file_path = Some(target.build_file_path.clone());
        apply_java_defaults(&mut unfiltered);
        if imports_jars {
            unfiltered.jars = sources;
        } else {
            unfiltered.common.srcs = sources;
        }

        let mut top = Module::new(ModuleType::JavaLibrary, base.clone(), Some(&target.label));
        top.build_file_path = Some(target.build_file_path.clone());
        apply_java_defaults(&mut top);
        top.java_unfiltered_module = Some(unfiltered.name.clone());

        let listed_files: BTreeSet<&str> = all_sources
            .iter()
            .map(|source| source.rsplit('/').next().unwrap_or(source))
            .collect();

        for (dep, _) in target.all_deps() {
            if let Some(callback) = builtins::lookup(&dep) {
                callback(&mut unfiltered, Arch::Common);
                continue;
            }
            for dep_name in self.create_modules(&dep, Flavor::Java)? {
                let Some(dep_module) = self.modules.get(&dep_name).cloned() else {
                    continue;
                };
                match dep_module.ty {
                    ModuleType::JavaLibrary if dep_module.java_unfiltered_module.is_some() => {
                        top.common.static_libs.insert(dep_name.clone());
                        let Some(dep_unfiltered) = dep_module
                            .java_unfiltered_module
                            .as_ref()
                            .and_then(|name| self.modules.get(name))
                        else {
                            continue;
                        };
                        unfiltered.common.libs.insert(dep_unfiltered.name.clone());
                        unfiltered
                            .common
                            .libs
                            .extend(dep_unfiltered.common.libs.iter().cloned());
                        if dep_unfiltered.sdk_version.as_deref() == Some(SYSTEM_SDK_VERSION) {
                            unfiltered.sdk_version = Some(SYSTEM_SDK_VERSION.to_string());
                        }
                    }
                    ModuleType::JavaGenrule
                        if dep_module.jni_zero_target_type == Some(JniZeroTargetType::Generator) =>
                    {
                        let lists_placeholder = dep_module.common.out.iter().any(|out| {
                            is_placeholder_srcjar(out)
                                && listed_files.contains(out.rsplit('/').next().unwrap_or(out))
                        });
                        let src = if lists_placeholder {
                            dep_module.name.clone()
                        } else {
                            self.proxy_only_module(&dep_module)
                        };
                        unfiltered.common.srcs.insert(format!(":{src}"));
                    }
                    ModuleType::JavaGenrule => {
                        unfiltered.common.srcs.insert(format!(":{dep_name}"));
                    }
                    ModuleType::AidlInterface => propagate(&mut unfiltered, &dep_module, Arch::Common),
                    _ => {}
                }
            }
        }

        if unfiltered.sdk_version.as_deref() == Some(SYSTEM_SDK_VERSION) {
            top.sdk_version = Some(SYSTEM_SDK_VERSION.to_string());
        }

        let filtered = self.filter_module(target, &base, &unfiltered.name);
        top.common.static_libs.insert(filtered.name.clone());

        self.add_module(unfiltered);
        self.add_module(filtered);
        self.add_module(top);
        Ok(base)
    }

    fn filter_module(&self, target: &Target, base: &str, unfiltered: &str) -> Module {
        let label = target.label.strip_suffix(TESTING_SUFFIX).unwrap_or(&target.label);
        let excluded = FILTER_OVERRIDES
            .iter()
            .find(|(overridden, _)| *overridden == label)
            .map(|(_, patterns)| patterns.iter().map(|p| p.to_string()).collect_vec())
            .unwrap_or_else(|| target.java_jar_excluded_patterns.clone());

        let filter_zip = self.config.filter_zip_module();
        let name = format!("{base}__filtered");
        let mut module = Module::new(ModuleType::JavaGenrule, name.clone(), Some(&target.label));
        module.build_file_path = Some(target.build_file_path.clone());
        module.common.srcs.insert(format!(":{unfiltered}"));
        module.common.out.insert(format!("{name}.jar"));
        module.common.cmd = Some(
            [
                location_tag(&filter_zip),
                "--input".to_string(),
                "$(in)".to_string(),
                "--output".to_string(),
                "$(out)".to_string(),
                "--exclude-globs".to_string(),
                gn_string_list(&excluded),
                "--include-globs".to_string(),
                gn_string_list(&target.java_jar_included_patterns),
            ]
            .join("\n"),
        );
        module.common.tools.insert(filter_zip);
        module
    }

    /// A genrule exposing only the proxy srcjar of a jni_zero generator, for
    /// consumers that bring their own implementation of the placeholders.
    fn proxy_only_module(&mut self, generator: &Module) -> String {
        let name = format!("{}__proxy", generator.name);
        if self.modules.contains_key(&name) {
            return name;
        }
        let mut module = Module::new(
            ModuleType::JavaGenrule,
            name.clone(),
            generator.gn_target.as_deref(),
        );
        module.build_file_path = generator.build_file_path.clone();
        module.common.srcs.insert(format!(":{}", generator.name));
        if let Some(proxy) = generator
            .common
            .out
            .iter()
            .find(|out| !is_placeholder_srcjar(out))
        {
            let file = proxy.rsplit('/').next().unwrap_or(proxy);
            module.common.out.insert(proxy.clone());
            module.common.cmd = Some(format!(
                "for f in $(in); do if [[ $$f == */{file} ]]; then cp $$f $(out); fi; done"
            ));
        }
        self.add_module(module);
        name
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn patterns_are_gn_lists() {
        assert_eq!(gn_string_list(&[]), "'[]'");
        assert_eq!(
            gn_string_list(&["*/R.class".to_string(), "*/R$*.class".to_string()]),
            r#"'[\"*/R.class\", \"*/R$*.class\"]'"#
        );
    }
}
