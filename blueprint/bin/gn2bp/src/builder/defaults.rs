// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    arch::Arch,
    config::TranslatorConfig,
    module::{Module, ModuleType},
};

/// The APEX every module is built into.
pub(crate) const APEX: &str = "com.android.tethering";
pub(crate) const MIN_SDK_VERSION: &str = "30";
pub(crate) const CPP_STD: &str = "c++20";
const C_STD: &str = "gnu11";

/// Flags every compiled module gets on top of its own.
const DEFAULT_CFLAGS: &[&str] = &[
    "-DGOOGLE_PROTOBUF_NO_RTTI",
    "-DBORINGSSL_SHARED_LIBRARY",
    "-Wno-error=return-type",
    "-Wno-non-virtual-dtor",
    "-Wno-macro-redefined",
    "-Wno-missing-field-initializers",
    "-Wno-sign-compare",
    "-Wno-sign-promo",
    "-Wno-unused-parameter",
    "-Wno-null-pointer-subtraction",
    "-Wno-ambiguous-reversed-operator",
    "-Wno-unreachable-code-loop-increment",
    "-fvisibility=hidden",
    "-Oz",
    "-fdata-sections",
    "-ffunction-sections",
    "-fvisibility-inlines-hidden",
    "-fstack-protector",
    "-fno-unwind-tables",
    "-fno-asynchronous-unwind-tables",
];

/// Platform modules only the device variant may depend on.
const ANDROID_HEADER_LIBS: &[&str] = &["jni_headers"];
const ANDROID_SHARED_LIBS: &[&str] = &["liblog"];

/// The `cc_defaults` module every compiled C/C++ module inherits.
pub fn cc_defaults_module(config: &TranslatorConfig) -> Module {
    let mut module = Module::new(ModuleType::CcDefaults, config.cc_defaults_module(), None);
    module.common.cflags = DEFAULT_CFLAGS.iter().map(|flag| flag.to_string()).collect();
    module.cpp_std = Some(CPP_STD.to_string());
    module.c_std = Some(C_STD.to_string());
    module.stl = Some("none".to_string());
    module.min_sdk_version = Some(MIN_SDK_VERSION.to_string());
    module.apex_available.insert(APEX.to_string());
    module.whole_program_vtables = Some(true);

    let android = module.arch_mut(Arch::Android);
    android
        .header_libs
        .extend(ANDROID_HEADER_LIBS.iter().map(|lib| lib.to_string()));
    android
        .shared_libs
        .extend(ANDROID_SHARED_LIBS.iter().map(|lib| lib.to_string()));
    module
}
