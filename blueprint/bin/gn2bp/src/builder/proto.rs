// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::BTreeSet;

use super::{Flavor, ModuleBuilder};
use crate::{
    arch::Arch,
    error::{Result, TranslateError},
    graph::Target,
    label::{label_name, label_to_module_name, normalize_output, short_module_name, TESTING_SUFFIX},
    module::{Module, ModuleType},
    sanitizer::location_tag,
};

/// Import dir of the protobuf well-known types in the GN checkout.
const PROTOBUF_SRC: &str = "third_party/protobuf/src";
/// The same files inside the Android tree.
const AOSP_PROTOBUF_SRC: &str = "external/protobuf/src";
/// Runtime generated sources link against.
const PROTOBUF_RUNTIME: &str = "libprotobuf-cpp-lite";

impl ModuleBuilder<'_> {
    /// Creates the header and source genrules of a `protoc_wrapper` action.
    /// Dependents reference the source module only.
    pub(super) fn create_proto_modules(&mut self, target: &Target) -> Result<Vec<String>> {
        let outputs = target.union_of(|data| &data.outputs);
        if !outputs.is_empty() && outputs.iter().all(|out| out.ends_with(".descriptor")) {
            tracing::debug!("Skipping descriptor-only proto target {}", target.label);
            return Ok(Vec::new());
        }

        let cc_out_dir = proto_cc_out_dir(target)?;
        let prefix = &self.config.module_prefix;
        let short_name = short_module_name(prefix, &target.label);
        let header_name = format!("{short_name}_gen_headers");
        let source_name = format!("{short_name}_gen");

        let testing_suffix = if target.is_testing() { TESTING_SUFFIX } else { "" };
        let protoc = label_to_module_name(prefix, &format!("//third_party/protobuf:protoc{testing_suffix}"));
        let mut tools = BTreeSet::from([protoc.clone()]);

        // protoc itself, plugins and the protos this one imports.
        let mut dep_headers = BTreeSet::new();
        for (dep, _) in target.all_deps() {
            if self.graph.is_builtin(&dep) {
                continue;
            }
            for name in self.create_modules(&dep, Flavor::Cc)? {
                if let Some(module) = self.modules.get(&name) {
                    dep_headers.extend(module.genrule_headers.iter().cloned());
                }
            }
        }

        let tree_path = &self.config.tree_path;
        let in_dir = if target.proto_in_dir.is_empty() {
            tree_path.clone()
        } else {
            format!("{tree_path}/{}", target.proto_in_dir)
        };
        let mut cmd = vec![location_tag(&protoc), format!("--proto_path={in_dir}")];
        cmd.extend(
            target
                .proto_paths
                .iter()
                .map(|path| format!("--proto_path={tree_path}/{path}")),
        );
        if target.proto_paths.contains(PROTOBUF_SRC) {
            cmd.push(format!("--proto_path={AOSP_PROTOBUF_SRC}"));
        }
        cmd.push(format!("--cpp_out=lite=true:$(genDir)/{cc_out_dir}"));

        if let Some(plugin) = &target.proto_plugin {
            let binary = plugin.rsplit('/').next().unwrap_or(plugin);
            let plugin_dep = target
                .all_deps()
                .into_iter()
                .map(|(dep, _)| dep)
                .find(|dep| label_name(dep).trim_end_matches(TESTING_SUFFIX) == binary);
            match plugin_dep {
                Some(dep) => {
                    let plugin_module = label_to_module_name(prefix, &dep);
                    cmd.push(format!(
                        "--plugin=protoc-gen-plugin={}",
                        location_tag(&plugin_module)
                    ));
                    cmd.push(format!(
                        "--plugin_out={}:$(genDir)/{cc_out_dir}",
                        target.proto_plugin_options.as_deref().unwrap_or_default()
                    ));
                    tools.insert(plugin_module);
                }
                None => tracing::warn!("{}: no dep provides plugin {}", target.label, plugin),
            }
        }
        cmd.push("$(in)".to_string());
        let cmd = cmd.join("\n");

        let srcs: BTreeSet<String> = target
            .union_of(|data| &data.sources)
            .into_iter()
            .filter(|source| source.ends_with(".proto"))
            .collect();

        let new_genrule = |name: &str, extension: &str| {
            let mut module = Module::new(ModuleType::CcGenrule, name, Some(&target.label));
            module.build_file_path = Some(target.build_file_path.clone());
            module.common.srcs = srcs.clone();
            module.common.tools = tools.clone();
            module.common.cmd = Some(cmd.clone());
            module.common.out = outputs
                .iter()
                .filter(|out| out.ends_with(extension))
                .cloned()
                .collect();
            module
        };

        let mut header = new_genrule(&header_name, ".h");
        header.common.export_include_dirs =
            BTreeSet::from([".".to_string(), "protos".to_string(), cc_out_dir.clone()]);

        let mut source = new_genrule(&source_name, ".cc");
        source.genrule_headers.insert(header_name);
        source.genrule_headers.extend(dep_headers);
        source.genrule_srcs.insert(format!(":{source_name}"));
        source.genrule_shared_libs.insert(PROTOBUF_RUNTIME.to_string());

        self.add_module(header);
        self.add_module(source);
        Ok(vec![source_name])
    }
}

/// The `--cc-out-dir` of a proto action, relative to the gen dir. Every
/// arch must agree on it.
fn proto_cc_out_dir(target: &Target) -> Result<String> {
    let mut archs: Vec<Arch> = target.real_archs().map(|(arch, _)| arch).collect();
    if archs.is_empty() {
        archs.push(Arch::Common);
    }
    let values: BTreeSet<Option<String>> = archs
        .into_iter()
        .map(|arch| target.arg_value(arch, "--cc-out-dir"))
        .collect();
    match values.into_iter().collect::<Vec<_>>().as_slice() {
        [Some(dir)] => Ok(normalize_output(&format!("{dir}/"))
            .trim_end_matches('/')
            .to_string()),
        _ => Err(TranslateError::InconsistentArchAttribute {
            label: target.label.clone(),
            attribute: "--cc-out-dir".to_string(),
        }),
    }
}
