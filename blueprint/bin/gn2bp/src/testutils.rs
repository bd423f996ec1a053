// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use serde_json::Value;

use crate::{
    builder::builtins::builtin_labels,
    config::{Channel, TranslatorConfig},
    desc::{BuildScriptOutputs, GnDesc},
    graph::TargetGraph,
};

pub const ARM: &str = "//build/toolchain/android:android_clang_arm";
pub const ARM64: &str = "//build/toolchain/android:android_clang_arm64";
pub const X86: &str = "//build/toolchain/android:android_clang_x86";
pub const X64: &str = "//build/toolchain/android:android_clang_x64";
pub const HOST: &str = "//build/toolchain/linux:clang_x64";

pub fn desc(value: Value) -> GnDesc {
    serde_json::from_value(value).unwrap()
}

pub fn new_graph() -> TargetGraph {
    TargetGraph::new(builtin_labels(), BuildScriptOutputs::default())
}

/// Parses every `(desc, roots)` pair into one finalized graph.
pub fn parse_all(descs: &[GnDesc], roots: &[&str]) -> TargetGraph {
    let mut graph = new_graph();
    for desc in descs {
        for root in roots {
            graph.parse(desc, root, false).unwrap();
        }
    }
    graph.finalize();
    graph
}

pub fn test_config() -> TranslatorConfig {
    TranslatorConfig::new(Channel::Tot, "/nonexistent").with_licenses(false)
}
