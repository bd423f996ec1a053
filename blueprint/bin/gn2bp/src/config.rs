// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::path::{Path, PathBuf};

use strum_macros::{Display, EnumString};

/// The release channel the blueprints are generated for. Each channel lives in
/// its own AOSP directory and uses its own module-name prefix so that both
/// can coexist in one Android tree.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    #[default]
    Tot,
    Stable,
}

/// Settings fixed at startup and read-only for the rest of the run.
#[derive(Clone, Debug)]
pub struct TranslatorConfig {
    pub channel: Channel,
    /// Prefix prepended to every generated module name.
    pub module_prefix: String,
    /// Location of the GN checkout inside the Android tree.
    pub tree_path: String,
    /// Root of the GN checkout on the local filesystem.
    pub repo_root: PathBuf,
    /// Whether license and package modules are synthesized.
    pub generate_licenses: bool,
}

impl TranslatorConfig {
    pub fn new(channel: Channel, repo_root: impl AsRef<Path>) -> Self {
        let (module_prefix, tree_path) = match channel {
            Channel::Tot => ("cronet_aml_", "external/cronet/tot"),
            Channel::Stable => ("stable_cronet_", "external/cronet/stable"),
        };
        Self {
            channel,
            module_prefix: module_prefix.to_string(),
            tree_path: tree_path.to_string(),
            repo_root: repo_root.as_ref().to_path_buf(),
            generate_licenses: true,
        }
    }

    pub fn with_licenses(mut self, enable: bool) -> Self {
        self.generate_licenses = enable;
        self
    }

    /// Name of the defaults module every compiled C++ module inherits.
    pub fn cc_defaults_module(&self) -> String {
        format!("{}cc_defaults", self.module_prefix)
    }

    /// Name of the license applied to blueprints without a license of their
    /// own or of an ancestor.
    pub fn project_license(&self) -> String {
        format!(
            "{}_license",
            self.tree_path.replace(['/', '-', '.'], "_")
        )
    }

    /// Name of the Java jar filtering tool declared in the extras blueprint.
    pub fn filter_zip_module(&self) -> String {
        format!("{}filter_zip", self.module_prefix)
    }
}
