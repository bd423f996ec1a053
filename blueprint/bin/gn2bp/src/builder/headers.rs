// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::BTreeSet;

use super::ModuleBuilder;
use crate::{
    arch::Arch,
    module::{Module, ModuleType},
};

/// Copies every input back under its path relative to the gen dir it was
/// generated in.
const CONCATENATE_CMD: &str = "for f in $(in); do dst=$(genDir)/$${f#*/gen/}; \
                               mkdir -p $$(dirname $$dst); cp -f $$f $$dst; done";

impl ModuleBuilder<'_> {
    /// Replaces the transitive header genrules of `module` with one
    /// aggregate genrule per arch, so that the compile command lists a
    /// single generated include dir. Headers of modules generated elsewhere
    /// (e.g. by aidl_interface) stay direct `generated_headers`.
    ///
    /// Returns the aggregate modules to emit.
    pub(super) fn concatenate_headers(&self, module: &mut Module) -> Vec<Module> {
        let mut archs: Vec<Arch> = module.target.keys().copied().filter(|arch| arch.is_real()).collect();
        if archs.is_empty() {
            archs.push(Arch::Common);
        }

        let mut aggregates = Vec::new();
        for arch in archs {
            let headers: BTreeSet<String> = module
                .common
                .transitive_generated_headers_modules
                .iter()
                .chain(
                    module
                        .target
                        .get(&arch)
                        .into_iter()
                        .flat_map(|props| props.transitive_generated_headers_modules.iter()),
                )
                .cloned()
                .collect();
            let (ours, foreign): (Vec<String>, Vec<String>) = headers
                .into_iter()
                .partition(|name| self.modules.get(name).map_or(false, |m| m.ty.is_genrule()));

            let name = match arch {
                Arch::Common => format!("{}__concatenated_headers", module.name),
                _ => format!("{}__concatenated_headers_{}", module.name, arch),
            };
            let props = module.arch_mut(arch);
            props.generated_headers.extend(foreign);
            if ours.is_empty() {
                continue;
            }

            let mut aggregate = Module::new(ModuleType::CcGenrule, name.clone(), module.gn_target.as_deref());
            aggregate.build_file_path = module.build_file_path.clone();
            aggregate.common.cmd = Some(CONCATENATE_CMD.to_string());
            for header_module in &ours {
                aggregate.common.srcs.insert(format!(":{header_module}"));
                if let Some(header_module) = self.modules.get(header_module) {
                    aggregate.common.out.extend(header_module.union_of(|p| &p.out));
                }
            }
            module.arch_mut(arch).generated_headers.insert(name);
            aggregates.push(aggregate);
        }
        aggregates
    }
}
