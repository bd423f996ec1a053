// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::BTreeSet;

use super::{location_tag, ActionSanitizer, ActionState};
use crate::{
    error::Result,
    graph::Target,
    label::label_to_path,
    module::{JniZeroTargetType, ModuleType},
};

pub const JNI_ZERO_SCRIPT: &str = "//third_party/jni_zero/jni_zero.py";

/// Package the generated JNI classes are moved to for AOSP builds.
const PACKAGE_PREFIX: &str = "android.net.http.internal";

/// File jni_zero reads its Java source list from inside the sandbox.
const JAVA_SOURCES_LIST: &str = "$(genDir)/java.sources";

/// Classifies a jni_zero action; `None` for any other target.
pub fn jni_zero_target_type(target: &Target) -> Option<JniZeroTargetType> {
    if target.script.as_deref() != Some(JNI_ZERO_SCRIPT) {
        return None;
    }
    let first_arg = target
        .all_archs()
        .find_map(|(_, data)| data.args.first())
        .map(String::as_str);
    Some(if first_arg == Some("generate-final") {
        JniZeroTargetType::RegistrationGenerator
    } else {
        JniZeroTargetType::Generator
    })
}

/// Placeholder srcjars hold stub classes that are replaced at link time.
pub fn is_placeholder_srcjar(path: &str) -> bool {
    path.ends_with(".srcjar") && path.rsplit('/').next().unwrap_or(path).contains("placeholder")
}

pub struct JniZeroSanitizer(pub ActionState);

impl JniZeroSanitizer {
    fn target_type(&self) -> JniZeroTargetType {
        if self.0.args.first().map(String::as_str) == Some("generate-final") {
            JniZeroTargetType::RegistrationGenerator
        } else {
            JniZeroTargetType::Generator
        }
    }

    fn is_java(&self) -> bool {
        self.0.module_type == ModuleType::JavaGenrule
    }
}

impl ActionSanitizer for JniZeroSanitizer {
    fn state(&self) -> &ActionState {
        &self.0
    }

    fn state_mut(&mut self) -> &mut ActionState {
        &mut self.0
    }

    fn sanitize_args(&mut self) -> Result<()> {
        let state = &mut self.0;
        let uses_jar_file = state.has_arg("--jar-file");
        if uses_jar_file {
            state.set_value_arg("--jar-file", location_tag(":current_android_jar"));
            state.extra_srcs.insert(":current_android_jar".to_string());
        }
        if state.has_arg("--javap") {
            state.set_value_arg("--javap", location_tag("javap"));
            state.tools.insert("javap".to_string());
        }
        if !state.is_test && !uses_jar_file && !state.has_arg("--package-prefix") {
            state.append_value_arg("--package-prefix", PACKAGE_PREFIX);
        }
        if state.set_value_arg("--java-sources-file", JAVA_SOURCES_LIST) {
            state
                .pre_commands
                .push(format!("echo $(in) | tr ' ' '\\\\n' > {JAVA_SOURCES_LIST}"));
        }
        Ok(())
    }

    fn srcs(&self) -> BTreeSet<String> {
        let state = &self.0;
        match self.target_type() {
            JniZeroTargetType::RegistrationGenerator if self.is_java() => state
                .jni_java_sources
                .iter()
                .map(|source| label_to_path(source))
                .chain(state.extra_srcs.iter().cloned())
                .collect(),
            JniZeroTargetType::RegistrationGenerator => state
                .inputs
                .iter()
                .filter(|input| input.ends_with(".java"))
                .cloned()
                .chain(state.extra_srcs.iter().cloned())
                .collect(),
            JniZeroTargetType::Generator => state.default_srcs(),
        }
    }

    fn outputs(&self) -> BTreeSet<String> {
        let outputs = self.0.outputs.iter();
        if !self.is_java() {
            return outputs.filter(|out| out.ends_with(".h")).cloned().collect();
        }
        match self.target_type() {
            JniZeroTargetType::RegistrationGenerator => outputs
                .filter(|out| out.ends_with(".srcjar") && !is_placeholder_srcjar(out))
                .cloned()
                .collect(),
            JniZeroTargetType::Generator => outputs
                .filter(|out| out.ends_with(".srcjar"))
                .cloned()
                .collect(),
        }
    }
}
