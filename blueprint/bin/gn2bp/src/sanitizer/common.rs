// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::BTreeSet;

use super::{location_tag, ActionSanitizer, ActionState};
use crate::error::Result;

macro_rules! impl_state {
    ($name:ident) => {
        pub struct $name(pub ActionState);
    };
}

macro_rules! state_accessors {
    () => {
        fn state(&self) -> &ActionState {
            &self.0
        }

        fn state_mut(&mut self) -> &mut ActionState {
            &mut self.0
        }
    };
}

impl_state!(WriteBuildFlagHeaderSanitizer);
impl_state!(WriteBuildDateHeaderSanitizer);
impl_state!(VersionSanitizer);
impl_state!(JavaCppSanitizer);
impl_state!(MakeDafsaSanitizer);
impl_state!(WriteNativeLibrariesSanitizer);
impl_state!(GnRunBinarySanitizer);
impl_state!(ProtocJavaSanitizer);
impl_state!(CopySanitizer);

impl ActionSanitizer for WriteBuildFlagHeaderSanitizer {
    state_accessors!();

    fn sanitize_args(&mut self) -> Result<()> {
        self.0.set_value_arg("--gen-dir", ".");
        self.0.set_value_arg("--output", "$(out)");
        Ok(())
    }
}

impl ActionSanitizer for WriteBuildDateHeaderSanitizer {
    state_accessors!();

    fn sanitize_args(&mut self) -> Result<()> {
        if let Some(first) = self.0.args.first_mut() {
            *first = "$(out)".to_string();
        }
        Ok(())
    }
}

impl ActionSanitizer for VersionSanitizer {
    state_accessors!();

    fn sanitize_args(&mut self) -> Result<()> {
        let state = &mut self.0;
        state.set_value_arg("-o", "$(out)");
        // Positional arguments are template files.
        let mut after_flag = false;
        for arg in state.args.iter_mut() {
            let is_flag = arg.starts_with('-');
            if !is_flag && !after_flag && !arg.starts_with("$(") {
                *arg = location_tag(arg);
            }
            after_flag = is_flag;
        }
        state.update_value_args("-f", |path| {
            if path.starts_with("$(") {
                path.to_string()
            } else {
                location_tag(path)
            }
        });
        state
            .extra_tool_files
            .insert("build/util/android_chrome_version.py".to_string());
        Ok(())
    }
}

impl ActionSanitizer for JavaCppSanitizer {
    state_accessors!();

    fn sanitize_args(&mut self) -> Result<()> {
        self.0.set_value_arg("--srcjar", "$(out)");
        Ok(())
    }
}

impl ActionSanitizer for MakeDafsaSanitizer {
    state_accessors!();

    fn sanitize_args(&mut self) -> Result<()> {
        if let Some(last) = self.0.args.last_mut() {
            *last = "$(out)".to_string();
        }
        Ok(())
    }

    // The generated `.cc` file is #included, never compiled on its own.
    fn is_header_generated(&self) -> bool {
        true
    }
}

impl ActionSanitizer for WriteNativeLibrariesSanitizer {
    state_accessors!();

    fn sanitize_args(&mut self) -> Result<()> {
        self.0.set_value_arg("--output", "$(out)");
        Ok(())
    }
}

impl ActionSanitizer for GnRunBinarySanitizer {
    state_accessors!();

    fn sanitize_args(&mut self) -> Result<()> {
        let state = &mut self.0;
        let Some(binary) = state.args.first().cloned() else {
            return Ok(());
        };
        if let Some(dep) = state.dep_for_binary(&binary).cloned() {
            let tool = state.module_name(&dep);
            state.args[0] = location_tag(&tool);
            state.tools.insert(tool);
        }
        Ok(())
    }

    fn deps(&self) -> BTreeSet<String> {
        // The binary is run as a tool, not linked.
        let state = &self.0;
        let binary = state.args.first().cloned().unwrap_or_default();
        state
            .deps
            .iter()
            .filter(|dep| state.dep_for_binary(&binary) != Some(*dep))
            .cloned()
            .collect()
    }
}

impl ActionSanitizer for ProtocJavaSanitizer {
    state_accessors!();

    fn sanitize_args(&mut self) -> Result<()> {
        let state = &mut self.0;
        state.delete_value_arg("--depfile");
        let protoc = state.protoc_module();
        state.set_value_arg("--protoc", location_tag(&protoc));
        state.tools.insert(protoc);
        let tree_path = state.tree_path.clone();
        state.update_value_args("--proto-path", |dir| format!("{tree_path}/{dir}"));
        state.set_value_arg("--srcjar", "$(out)");
        if let Some(last) = state.args.last_mut() {
            if !last.starts_with("$(") {
                *last = location_tag(last);
            }
        }
        Ok(())
    }
}

impl ActionSanitizer for CopySanitizer {
    state_accessors!();

    fn srcs(&self) -> BTreeSet<String> {
        let state = &self.0;
        match state.deps.iter().collect::<Vec<_>>().as_slice() {
            [dep] => BTreeSet::from([format!(":{}", state.module_name(dep))]),
            _ => state.default_srcs(),
        }
    }

    fn tool_files(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn cmd(&self) -> String {
        "cp $(in) $(out)".to_string()
    }
}
