// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::{collections::BTreeSet, fs};

use anyhow::Result;
use gn2bp::{
    arch::Arch,
    config::{Channel, TranslatorConfig},
    desc::{BuildScriptOutputs, GnDesc},
    module::ModuleType,
    serialize::{render_blueprint, write_blueprints, OutputOptions},
    translate, Root,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const ARM: &str = "//build/toolchain/android:android_clang_arm";
const ARM64: &str = "//build/toolchain/android:android_clang_arm64";
const X86: &str = "//build/toolchain/android:android_clang_x86";
const X64: &str = "//build/toolchain/android:android_clang_x64";

const EXTRAS: &str = "Android.extras.bp";

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Builds one desc per toolchain from a template taking the toolchain.
fn descs(toolchains: &[&str], template: impl Fn(&str) -> Value) -> Result<Vec<GnDesc>> {
    toolchains
        .iter()
        .map(|toolchain| Ok(serde_json::from_value(template(toolchain))?))
        .collect()
}

fn config(repo_root: &std::path::Path) -> TranslatorConfig {
    TranslatorConfig::new(Channel::Tot, repo_root)
}

fn static_library(toolchain: &str) -> Value {
    json!({
        "//foo:bar": {
            "type": "static_library",
            "toolchain": toolchain,
            "sources": ["//foo/a.cc", "//foo/b.cc"],
            "include_dirs": ["//foo/include/"],
            "cflags": ["-UFOO", "-Wall"],
            "defines": ["FOO=1", "BAR"],
        },
    })
}

#[test]
fn empty_descs_produce_only_the_root_blueprint() -> Result<()> {
    let repo = tempfile::tempdir()?;
    let descs = vec![GnDesc::default(), GnDesc::default()];
    let blueprints = translate(&config(repo.path()), &descs, BuildScriptOutputs::default(), &[])?;

    assert_eq!(blueprints.keys().cloned().collect::<Vec<_>>(), vec![String::new()]);
    let root = &blueprints[""];
    assert_eq!(
        root.modules.keys().cloned().collect::<Vec<_>>(),
        vec!["cronet_aml_cc_defaults"]
    );
    assert!(root.package.is_none());

    let text = render_blueprint(root, Some(EXTRAS))?;
    assert_eq!(text.matches("\n}\n").count(), 1);
    assert!(text.contains("\ncc_defaults {\n"));
    assert!(text.ends_with("\nbuild = [\"Android.extras.bp\"]\n"));
    Ok(())
}

#[test]
fn static_library_lands_in_its_own_blueprint() -> Result<()> {
    let repo = tempfile::tempdir()?;
    fs::create_dir_all(repo.path().join("foo"))?;
    fs::write(
        repo.path().join("foo/README.chromium"),
        "Name: foo\nLicense: MIT\nLicense File: LICENSE\n",
    )?;

    let descs = descs(&[ARM, X86], static_library)?;
    let blueprints = translate(
        &config(repo.path()),
        &descs,
        BuildScriptOutputs::default(),
        &[Root::new("//foo:bar", false)],
    )?;

    let foo = &blueprints["foo"];
    let bar = &foo.modules["cronet_aml_foo_bar"];
    assert_eq!(bar.ty, ModuleType::CcLibraryStatic);
    assert_eq!(bar.common.srcs, set(&["a.cc", "b.cc"]));
    assert!(bar
        .common
        .include_dirs
        .iter()
        .any(|dir| dir.ends_with("/foo/include")));
    assert_eq!(bar.defaults, vec!["cronet_aml_cc_defaults"]);
    assert_eq!(bar.build_file_path.as_deref(), Some("foo"));

    let license = foo.license.as_ref().map(|license| license.name.as_str());
    assert_eq!(license, Some("external_cronet_tot_foo_license"));
    let package = foo.package.as_ref().map(|package| &package.default_applicable_licenses);
    assert_eq!(package, Some(&set(&["external_cronet_tot_foo_license"])));

    let written = write_blueprints(
        repo.path(),
        &blueprints,
        &OutputOptions {
            suffix: String::new(),
            extras: Some(EXTRAS.to_string()),
        },
    )?;
    assert_eq!(written.len(), 2);
    let text = fs::read_to_string(repo.path().join("foo/Android.bp"))?;
    assert!(text.contains("// GN: //foo:bar\ncc_library_static {\n    name: \"cronet_aml_foo_bar\",\n"));
    assert!(!text.contains("build = ["));
    assert!(fs::read_to_string(repo.path().join("Android.bp"))?.contains("build = ["));
    Ok(())
}

#[test]
fn undefine_define_pairs_keep_their_order() -> Result<()> {
    let repo = tempfile::tempdir()?;
    let descs = descs(&[ARM, X86], static_library)?;
    let blueprints = translate(
        &config(repo.path()).with_licenses(false),
        &descs,
        BuildScriptOutputs::default(),
        &[Root::new("//foo:bar", false)],
    )?;

    let text = render_blueprint(&blueprints["foo"], None)?;
    assert!(text.contains(
        "    cflags: [\n        \"-DBAR\",\n        \"-UFOO\",\n        \"-DFOO=1\",\n    ],\n"
    ));
    assert!(!text.contains("-Wall"));
    Ok(())
}

#[test]
fn sources_shared_by_every_arch_move_to_the_top_level() -> Result<()> {
    let repo = tempfile::tempdir()?;
    let descs = descs(&[ARM, ARM64, X86, X64], |toolchain| {
        let sources = if toolchain == ARM || toolchain == X86 {
            json!(["//foo/x.cc", "//foo/y.cc"])
        } else {
            json!(["//foo/x.cc"])
        };
        json!({
            "//foo:set": {"type": "source_set", "toolchain": toolchain, "sources": sources},
        })
    })?;
    let blueprints = translate(
        &config(repo.path()).with_licenses(false),
        &descs,
        BuildScriptOutputs::default(),
        &[Root::new("//foo:set", false)],
    )?;

    let module = &blueprints["foo"].modules["cronet_aml_foo_set"];
    assert_eq!(module.common.srcs, set(&["x.cc"]));
    for arch in [Arch::AndroidArm, Arch::AndroidX86] {
        assert_eq!(module.target[&arch].srcs, set(&["y.cc"]));
    }
    for arch in [Arch::AndroidArm64, Arch::AndroidX86_64] {
        assert!(module.arch(arch).map_or(true, |props| props.srcs.is_empty()));
    }
    Ok(())
}

#[test]
fn testing_roots_get_separate_modules() -> Result<()> {
    let repo = tempfile::tempdir()?;
    let descs = descs(&[ARM, X86], static_library)?;
    let blueprints = translate(
        &config(repo.path()).with_licenses(false),
        &descs,
        BuildScriptOutputs::default(),
        &[Root::new("//foo:bar", false), Root::new("//foo:bar", true)],
    )?;
    let names: Vec<_> = blueprints["foo"].modules.keys().cloned().collect();
    assert_eq!(names, vec!["cronet_aml_foo_bar", "cronet_aml_foo_bar__testing"]);
    Ok(())
}

#[test]
fn missing_roots_fail_the_translation() -> Result<()> {
    let repo = tempfile::tempdir()?;
    let descs = descs(&[ARM], static_library)?;
    let result = translate(
        &config(repo.path()),
        &descs,
        BuildScriptOutputs::default(),
        &[Root::new("//foo:missing", false)],
    );
    assert!(result.is_err());
    Ok(())
}

#[test]
fn output_is_byte_identical_across_runs() -> Result<()> {
    let repo = tempfile::tempdir()?;
    let options = OutputOptions {
        suffix: ".gn2bp".to_string(),
        extras: Some(EXTRAS.to_string()),
    };

    let mut runs = Vec::new();
    for _ in 0..2 {
        let descs = descs(&[ARM, ARM64, X86, X64], static_library)?;
        let blueprints = translate(
            &config(repo.path()),
            &descs,
            BuildScriptOutputs::default(),
            &[Root::new("//foo:bar", false)],
        )?;
        let written = write_blueprints(repo.path(), &blueprints, &options)?;
        let contents = written
            .iter()
            .map(|path| fs::read(path))
            .collect::<std::io::Result<Vec<_>>>()?;
        runs.push(contents);
    }
    assert_eq!(runs[0], runs[1]);
    Ok(())
}
