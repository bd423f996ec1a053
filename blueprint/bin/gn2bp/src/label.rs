// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Helpers for GN labels and the module names derived from them.

use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Suffix appended to the labels of every target reached from a testing root.
pub const TESTING_SUFFIX: &str = "__testing";

lazy_static! {
    static ref NON_IDENTIFIER: Regex = Regex::new(r"[^a-zA-Z0-9_]").unwrap();
    static ref OUT_DIR_PREFIX: Regex = Regex::new(r"^//out/[^/]+/").unwrap();
    static ref GEN_DIR_PREFIX: Regex = Regex::new(r"^(clang_[^/]+/)?gen/").unwrap();
}

/// Strips the `(//toolchain:label)` suffix GN adds for non-default toolchains.
pub fn strip_toolchain(label: &str) -> &str {
    match label.find('(') {
        Some(index) => &label[..index],
        None => label,
    }
}

/// Converts a source-absolute GN path (`//foo/bar.cc`) to a repo-relative one.
pub fn label_to_path(label: &str) -> String {
    label.trim_start_matches("//").to_string()
}

/// Directory part of a label: `//foo/bar:baz` → `foo/bar`.
pub fn label_dir(label: &str) -> &str {
    let label = strip_toolchain(label).trim_start_matches("//");
    match label.split_once(':') {
        Some((dir, _)) => dir,
        None => label,
    }
}

/// Target name part of a label: `//foo/bar:baz` → `baz`, `//foo/bar` → `bar`.
pub fn label_name(label: &str) -> &str {
    let label = strip_toolchain(label);
    match label.rsplit_once(':') {
        Some((_, name)) => name,
        None => label.rsplit('/').next().unwrap_or(label),
    }
}

/// Strips the output directory and `gen/` prefix GN puts on generated files:
/// `//out/Release/gen/foo/bar.h` and `gen/foo/bar.h` both become `foo/bar.h`.
pub fn normalize_output(path: &str) -> String {
    let path = OUT_DIR_PREFIX.replace(path, "");
    GEN_DIR_PREFIX.replace(&path, "").into_owned()
}

/// Returns the first `len` hex digits of the SHA-256 of `value`.
pub fn short_hash(value: &str, len: usize) -> String {
    let digest = hex::encode(Sha256::digest(value.as_bytes()));
    digest[..len.min(digest.len())].to_string()
}

/// Turns a GN label (e.g. `//foo:bar`) into a module name (`<prefix>foo_bar`).
pub fn label_to_module_name(prefix: &str, label: &str) -> String {
    let label = strip_toolchain(label);
    let trimmed = label
        .strip_prefix("//:")
        .or_else(|| label.strip_prefix("//"))
        .unwrap_or(label);
    let module = NON_IDENTIFIER.replace_all(trimmed, "_");
    if module.starts_with(prefix) {
        module.into_owned()
    } else {
        format!("{prefix}{module}")
    }
}

/// Module name for intermediate modules whose names end up inside long
/// command lines: the directory part is replaced by its 8-digit hash.
pub fn short_module_name(prefix: &str, label: &str) -> String {
    let label = strip_toolchain(label);
    let name = NON_IDENTIFIER.replace_all(label_name(label), "_");
    format!("{prefix}{}_{name}", short_hash(label_dir(label), 8))
}

/// Soong requires Rust library modules to be named `lib<crate_name>`; the
/// 2-digit hash of the full module name keeps versions of a crate apart.
pub fn rust_module_name(prefix: &str, label: &str, crate_name: &str) -> String {
    let full_name = label_to_module_name(prefix, label);
    format!("lib{crate_name}_{prefix}{}", short_hash(&full_name, 2))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_strip_toolchain() {
        assert_eq!(
            strip_toolchain("//foo:bar(//build/toolchain/linux:clang_x64)"),
            "//foo:bar"
        );
        assert_eq!(strip_toolchain("//foo:bar"), "//foo:bar");
    }

    #[test]
    fn test_label_parts() {
        assert_eq!(label_dir("//foo/bar:baz"), "foo/bar");
        assert_eq!(label_name("//foo/bar:baz"), "baz");
        assert_eq!(label_dir("//:root"), "");
        assert_eq!(label_to_path("//foo/a.cc"), "foo/a.cc");
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("//out/Release/gen/foo/p.pb.h"), "foo/p.pb.h");
        assert_eq!(normalize_output("gen/foo/p.pb.cc"), "foo/p.pb.cc");
        assert_eq!(normalize_output("clang_x64/gen/foo/p.h"), "foo/p.h");
        assert_eq!(normalize_output("//out/Release/obj/foo.o"), "obj/foo.o");
    }

    #[test]
    fn test_module_names() {
        assert_eq!(
            label_to_module_name("cronet_aml_", "//net/third_party:quic-core"),
            "cronet_aml_net_third_party_quic_core"
        );
        assert_eq!(
            label_to_module_name("cronet_aml_", "//:gn_all__testing"),
            "cronet_aml_gn_all__testing"
        );
        let short = short_module_name("cronet_aml_", "//net/very/long/path:proto");
        assert!(short.starts_with("cronet_aml_"));
        assert!(short.ends_with("_proto"));
        assert_eq!(short.len(), "cronet_aml_".len() + 8 + "_proto".len());

        let rust = rust_module_name("cronet_aml_", "//third_party/rust/foo/v1:lib", "foo");
        assert!(rust.starts_with("libfoo_cronet_aml_"));
        assert_eq!(rust.len(), "libfoo_cronet_aml_".len() + 2);
    }
}
