// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! GN targets replaced by modules the Android platform already provides.

use std::collections::BTreeMap;

use lazy_static::lazy_static;

use super::java::SYSTEM_SDK_VERSION;
use crate::{arch::Arch, label::TESTING_SUFFIX, module::Module};

/// Splices the platform replacement of a GN dep into the depending module.
pub type BuiltinCallback = fn(&mut Module, Arch);

fn link_zlib(module: &mut Module, arch: Arch) {
    module.arch_mut(arch).shared_libs.insert("libz".to_string());
}

fn link_boringssl(module: &mut Module, arch: Arch) {
    let props = module.arch_mut(arch);
    props.shared_libs.insert("libcrypto".to_string());
    props.shared_libs.insert("libssl".to_string());
}

/// The platform toolchain already provides these.
fn drop_dep(_module: &mut Module, _arch: Arch) {}

fn link_androidx_annotation(module: &mut Module, _arch: Arch) {
    module
        .common
        .libs
        .insert("androidx.annotation_annotation".to_string());
}

fn use_system_sdk(module: &mut Module, _arch: Arch) {
    module.sdk_version = Some(SYSTEM_SDK_VERSION.to_string());
}

lazy_static! {
    static ref BUILTIN_DEPS: BTreeMap<&'static str, BuiltinCallback> = BTreeMap::from([
        ("//third_party/zlib:zlib", link_zlib as BuiltinCallback),
        ("//third_party/boringssl:boringssl", link_boringssl),
        ("//third_party/boringssl:boringssl_asm", drop_dep),
        ("//buildtools/third_party/libunwind:libunwind", drop_dep),
        ("//build/config/compiler:compiler_buildflags", drop_dep),
        (
            "//third_party/androidx:androidx_annotation_annotation_java",
            link_androidx_annotation,
        ),
        (
            "//third_party/androidx:androidx_annotation_annotation_jvm_java",
            link_androidx_annotation,
        ),
        ("//third_party/android_sdk:android_sdk_java", use_system_sdk),
    ]);
}

/// Labels the graph must not descend into.
pub fn builtin_labels() -> Vec<&'static str> {
    BUILTIN_DEPS.keys().copied().collect()
}

/// The callback for `label`, ignoring the testing suffix.
pub fn lookup(label: &str) -> Option<BuiltinCallback> {
    let label = label.strip_suffix(TESTING_SUFFIX).unwrap_or(label);
    BUILTIN_DEPS.get(label).copied()
}
