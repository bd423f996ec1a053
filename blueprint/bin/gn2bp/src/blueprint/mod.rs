// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Distribution of modules over per-directory blueprints.

pub mod license;

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use tracing::instrument;

use crate::{
    config::TranslatorConfig,
    error::{Result, TranslateError},
    module::{Module, ModuleType},
};

/// Build files whose modules belong to another directory's blueprint.
const RELOCATIONS: &[(&str, &str)] = &[
    ("base/allocator/partition_allocator/src/partition_alloc", "base/allocator/partition_allocator"),
    ("third_party/abseil-cpp/absl", "third_party/abseil-cpp"),
    ("third_party/boringssl/src", "third_party/boringssl"),
    ("third_party/icu/source", "third_party/icu"),
];

/// Vendored crates live in `third_party/rust/chromium_crates_io/vendor/<crate>`.
const RUST_VENDOR_DIR: &str = "third_party/rust/chromium_crates_io/vendor/";
const RUST_VENDOR_DEPTH: usize = 5;

/// Prebuilt Android dependencies stay where the extras blueprint expects them.
const ANDROID_DEPS_DIR: &str = "third_party/android_deps";

/// One Android.bp file.
#[derive(Clone, Debug, Default)]
pub struct Blueprint {
    /// Directory relative to the repo root; empty for the root blueprint.
    pub dir: String,
    pub modules: BTreeMap<String, Module>,
    pub package: Option<Module>,
    pub license: Option<Module>,
}

impl Blueprint {
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.dir.is_empty()
    }

    pub fn add_module(&mut self, module: Module) {
        self.modules.insert(module.name.clone(), module);
    }
}

/// Module kinds only moved when they ask for it: their commands and outputs
/// are spelled relative to the root blueprint.
fn is_pinned_type(ty: ModuleType) -> bool {
    ty.is_genrule()
        || matches!(
            ty,
            ModuleType::Package | ModuleType::CcPreprocessNoConfiguration
        )
}

/// Directory `module` would like to live in.
fn candidate_dir(module: &Module) -> Option<String> {
    let build_file_path = module.build_file_path.as_deref()?;
    if let Some((_, dir)) = RELOCATIONS.iter().find(|(from, _)| *from == build_file_path) {
        return Some(dir.to_string());
    }
    if module.ty.is_rust() {
        if let Some(crate_root) = module
            .crate_root
            .as_deref()
            .filter(|root| root.starts_with(RUST_VENDOR_DIR))
        {
            return Some(crate_root.split('/').take(RUST_VENDOR_DEPTH).join("/"));
        }
    }
    Some(build_file_path.to_string())
}

/// Makes `path` relative to `dir`. Module references and Soong variables
/// are left alone.
fn rebase_path(module: &str, dir: &str, path: &str) -> Result<String> {
    if path.starts_with(':') || path.starts_with("$(") {
        return Ok(path.to_string());
    }
    path.strip_prefix(dir)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(str::to_string)
        .ok_or_else(|| TranslateError::RebaseEscape {
            module: module.to_string(),
            directory: dir.to_string(),
            path: path.to_string(),
        })
}

fn rebase_set(module: &str, dir: &str, paths: &BTreeSet<String>) -> Result<BTreeSet<String>> {
    paths.iter().map(|path| rebase_path(module, dir, path)).collect()
}

fn rebase_option(module: &str, dir: &str, path: &Option<String>) -> Result<Option<String>> {
    path.as_deref()
        .map(|path| rebase_path(module, dir, path))
        .transpose()
}

/// Returns a copy of `module` with every path relative to `dir`, or
/// [`TranslateError::RebaseEscape`] if one of them lies outside of it.
pub fn rebase(module: &Module, dir: &str) -> Result<Module> {
    let name = module.name.as_str();
    let mut rebased = module.clone();
    rebased.crate_root = rebase_option(name, dir, &module.crate_root)?;
    rebased.path = rebase_option(name, dir, &module.path)?;
    rebased.wrapper_src = rebase_option(name, dir, &module.wrapper_src)?;
    rebased.jars = rebase_set(name, dir, &module.jars)?;
    rebased.common.srcs = rebase_set(name, dir, &module.common.srcs)?;
    for (arch, props) in rebased.target.iter_mut() {
        if let Some(original) = module.target.get(arch) {
            props.srcs = rebase_set(name, dir, &original.srcs)?;
        }
    }
    Ok(rebased)
}

/// Splits the translated modules into blueprints keyed by directory and
/// attaches package and license modules.
pub struct BlueprintAssembler<'a> {
    config: &'a TranslatorConfig,
    blueprints: BTreeMap<String, Blueprint>,
}

impl<'a> BlueprintAssembler<'a> {
    pub fn new(config: &'a TranslatorConfig) -> Self {
        Self {
            config,
            blueprints: BTreeMap::from([(String::new(), Blueprint::new(""))]),
        }
    }

    fn blueprint_mut(&mut self, dir: &str) -> &mut Blueprint {
        self.blueprints
            .entry(dir.to_string())
            .or_insert_with(|| Blueprint::new(dir))
    }

    /// Places `module` in the blueprint of its directory if all of its
    /// paths can be rebased there, and in the root blueprint otherwise.
    pub fn add_module(&mut self, module: Module) {
        if module.allow_rebasing || !is_pinned_type(module.ty) {
            if let Some(dir) = candidate_dir(&module)
                .filter(|dir| !dir.is_empty() && !dir.starts_with(ANDROID_DEPS_DIR))
            {
                match rebase(&module, &dir) {
                    Ok(rebased) => {
                        self.blueprint_mut(&dir).add_module(rebased);
                        return;
                    }
                    Err(err) => tracing::warn!("{err}; keeping it in the root blueprint"),
                }
            }
        }
        self.blueprint_mut("").add_module(module);
    }

    /// Attaches a package module to every non-root blueprint and, when
    /// enabled, the license modules.
    fn attach_packages(&mut self) {
        let mut licenses: BTreeMap<String, String> = BTreeMap::new();
        // Parents sort before their children.
        for (dir, blueprint) in self.blueprints.iter_mut() {
            if blueprint.is_root() {
                continue;
            }
            let mut package = Module::new(ModuleType::Package, "", None);
            package
                .default_visibility
                .insert(":__subpackages__".to_string());

            if self.config.generate_licenses {
                let readme = match license::read_readme(&self.config.repo_root, dir) {
                    Ok(readme) => readme,
                    Err(err) => {
                        tracing::warn!("{err}; falling back to the parent license");
                        None
                    }
                };
                let license_name = match readme {
                    Some(readme) => {
                        let name = license::license_module_name(&self.config.tree_path, dir);
                        blueprint.license = Some(license::license_module(&name, &readme));
                        name
                    }
                    None => nearest_license(&licenses, dir)
                        .unwrap_or_else(|| self.config.project_license()),
                };
                package.default_applicable_licenses.insert(license_name.clone());
                licenses.insert(dir.clone(), license_name);
            }
            blueprint.package = Some(package);
        }
    }

    #[instrument(skip_all)]
    pub fn assemble(
        mut self,
        modules: impl IntoIterator<Item = Module>,
    ) -> BTreeMap<String, Blueprint> {
        for module in modules {
            self.add_module(module);
        }
        self.attach_packages();
        tracing::info!("Assembled {} blueprints", self.blueprints.len());
        self.blueprints
    }
}

/// License of the closest ancestor of `dir` that has a blueprint.
fn nearest_license(licenses: &BTreeMap<String, String>, dir: &str) -> Option<String> {
    let mut current = dir;
    while let Some((parent, _)) = current.rsplit_once('/') {
        if let Some(name) = licenses.get(parent) {
            return Some(name.clone());
        }
        current = parent;
    }
    None
}
