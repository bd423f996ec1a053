// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Translates GN build descriptions of Cronet into Soong `Android.bp` files.

use std::collections::BTreeMap;

use tracing::instrument;

pub mod arch;
pub mod blueprint;
pub mod builder;
pub mod config;
pub mod desc;
pub mod error;
pub mod graph;
pub mod label;
pub mod module;
pub mod sanitizer;
pub mod serialize;

#[cfg(test)]
pub(crate) mod testutils;

use crate::{
    blueprint::{Blueprint, BlueprintAssembler},
    builder::{builtins::builtin_labels, ModuleBuilder},
    config::TranslatorConfig,
    desc::{BuildScriptOutputs, GnDesc},
    error::Result,
    graph::TargetGraph,
};

/// A GN label the translation starts from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Root {
    pub label: String,
    /// Testing roots and their closures get separate, suffixed modules.
    pub is_test: bool,
}

impl Root {
    pub fn new(label: impl Into<String>, is_test: bool) -> Self {
        Self {
            label: label.into(),
            is_test,
        }
    }
}

/// Runs every translation phase on already loaded descs and returns the
/// blueprints keyed by their directory.
#[instrument(skip_all)]
pub fn translate(
    config: &TranslatorConfig,
    descs: &[GnDesc],
    build_script_outputs: BuildScriptOutputs,
    roots: &[Root],
) -> Result<BTreeMap<String, Blueprint>> {
    let mut graph = TargetGraph::new(builtin_labels(), build_script_outputs);
    for desc in descs {
        for root in roots {
            graph.parse(desc, &root.label, root.is_test)?;
        }
    }
    graph.finalize();

    let root_labels: Vec<String> = roots
        .iter()
        .map(|root| TargetGraph::canonical_label(&root.label, root.is_test))
        .collect();
    let modules = ModuleBuilder::new(config, &graph).build(&root_labels)?;
    tracing::info!("Built {} modules", modules.len());

    Ok(BlueprintAssembler::new(config).assemble(modules.into_values()))
}
