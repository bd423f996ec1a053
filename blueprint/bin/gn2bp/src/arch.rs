// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// An architecture section of a target or module.
///
/// The variants are declared in the lexicographic order of their Blueprint
/// names so that the derived [`Ord`] matches the order Soong files list them.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, AsRefStr, Display, EnumIter, EnumString,
)]
pub enum Arch {
    /// Soong-only variant covering every Android arch. It never appears in a
    /// GN desc; it is used for properties such as the defaults module's
    /// platform-restricted libraries.
    #[strum(serialize = "android")]
    Android,
    #[strum(serialize = "android_arm")]
    AndroidArm,
    #[strum(serialize = "android_arm64")]
    AndroidArm64,
    #[strum(serialize = "android_riscv64")]
    AndroidRiscv64,
    #[strum(serialize = "android_x86")]
    AndroidX86,
    #[strum(serialize = "android_x86_64")]
    AndroidX86_64,
    /// Pseudo-arch holding the values shared by every real arch.
    #[strum(serialize = "common")]
    Common,
    #[strum(serialize = "glibc")]
    Glibc,
    #[strum(serialize = "host")]
    Host,
}

impl Arch {
    /// Maps a GN toolchain label to the arch it builds for.
    ///
    /// Every toolchain that is not one of the Android clang toolchains is a
    /// host toolchain. Testing variants build their host side against glibc.
    pub fn from_toolchain(toolchain: &str, is_test_target: bool) -> Self {
        match toolchain {
            "//build/toolchain/android:android_clang_x86" => Arch::AndroidX86,
            "//build/toolchain/android:android_clang_x64" => Arch::AndroidX86_64,
            "//build/toolchain/android:android_clang_arm" => Arch::AndroidArm,
            "//build/toolchain/android:android_clang_arm64" => Arch::AndroidArm64,
            "//build/toolchain/android:android_clang_riscv64" => Arch::AndroidRiscv64,
            _ if is_test_target => Arch::Glibc,
            _ => Arch::Host,
        }
    }

    /// Whether this is an arch a GN target is actually built for, as opposed
    /// to one of the pseudo-arches.
    pub fn is_real(self) -> bool {
        !matches!(self, Arch::Common | Arch::Android)
    }

    pub fn is_android(self) -> bool {
        matches!(
            self,
            Arch::AndroidArm
                | Arch::AndroidArm64
                | Arch::AndroidRiscv64
                | Arch::AndroidX86
                | Arch::AndroidX86_64
        )
    }

    pub fn is_host(self) -> bool {
        matches!(self, Arch::Host | Arch::Glibc)
    }

    /// Shell condition selecting this arch inside a `cc_genrule` command.
    pub fn cmd_condition(self) -> Option<&'static str> {
        Some(match self {
            Arch::AndroidX86_64 => "( $$CC_ARCH == 'x86_64' && $$CC_OS == 'android' )",
            Arch::AndroidX86 => "( $$CC_ARCH == 'x86' && $$CC_OS == 'android' )",
            Arch::AndroidArm => "( $$CC_ARCH == 'arm' && $$CC_OS == 'android' )",
            Arch::AndroidArm64 => "( $$CC_ARCH == 'arm64' && $$CC_OS == 'android' )",
            Arch::AndroidRiscv64 => "( $$CC_ARCH == 'riscv64' && $$CC_OS == 'android' )",
            Arch::Host | Arch::Glibc => "$$CC_OS != 'android'",
            Arch::Android | Arch::Common => return None,
        })
    }
}
