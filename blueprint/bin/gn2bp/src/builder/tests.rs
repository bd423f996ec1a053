// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use super::*;
use crate::{graph::BINDGEN_SCRIPT, label::short_module_name, testutils::*};

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Translates one arm desc rooted at `roots`.
fn build(targets: Value, roots: &[&str]) -> Result<BTreeMap<String, Module>> {
    let graph = parse_all(&[desc(targets)], roots);
    let config = test_config();
    let roots: Vec<String> = roots.iter().map(|root| root.to_string()).collect();
    ModuleBuilder::new(&config, &graph).build(&roots)
}

fn buildflag_action() -> Value {
    json!({
        "type": "action",
        "toolchain": ARM,
        "script": "//build/write_buildflag_header.py",
        "args": ["--output", "foo/buildflags.h", "--rulename", "//foo:flags",
                 "--gen-dir", "gen", "--definitions", "../../foo/flags.txt"],
        "inputs": ["//foo/flags.txt"],
        "outputs": ["//out/Release/gen/foo/buildflags.h"],
    })
}

#[test]
fn defaults_module_is_always_emitted() -> anyhow::Result<()> {
    let graph = new_graph();
    let config = test_config();
    let modules = ModuleBuilder::new(&config, &graph).build(&[])?;
    assert_eq!(
        modules.keys().cloned().collect::<Vec<_>>(),
        vec!["cronet_aml_cc_defaults"]
    );
    Ok(())
}

#[test]
fn static_libraries_are_whole_archived_into_final_links() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:lib": {"type": "shared_library", "toolchain": ARM,
                          "sources": ["//foo/lib.cc"], "deps": ["//foo:a"],
                          "output_name": "libfoo"},
            "//foo:a": {"type": "static_library", "toolchain": ARM,
                        "sources": ["//foo/a.cc", "//foo/a.h"], "deps": ["//foo:b"]},
            "//foo:b": {"type": "source_set", "toolchain": ARM, "sources": ["//foo/b.c"],
                        "libs": ["log", "m"]},
        }),
        &["//foo:lib"],
    )?;

    let lib = &modules["cronet_aml_foo_lib"];
    assert_eq!(lib.ty, ModuleType::CcLibraryShared);
    assert_eq!(lib.stem.as_deref(), Some("libfoo"));
    assert_eq!(lib.defaults, vec!["cronet_aml_cc_defaults"]);
    let arm = &lib.target[&Arch::AndroidArm];
    assert_eq!(arm.srcs, set(&["foo/lib.cc"]));
    assert_eq!(
        arm.whole_static_libs,
        set(&["cronet_aml_foo_a", "cronet_aml_foo_b"])
    );
    assert_eq!(arm.shared_libs, set(&["liblog"]));

    let a = &modules["cronet_aml_foo_a"];
    assert_eq!(a.ty, ModuleType::CcLibraryStatic);
    assert_eq!(a.target[&Arch::AndroidArm].srcs, set(&["foo/a.cc"]));
    assert!(a.union_of(|p| &p.whole_static_libs).is_empty());
    Ok(())
}

#[test]
fn empty_static_libraries_are_not_linked() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:bin": {"type": "executable", "toolchain": ARM,
                          "sources": ["//foo/main.cc"], "deps": ["//foo:headers"]},
            "//foo:headers": {"type": "source_set", "toolchain": ARM,
                              "sources": ["//foo/api.h"]},
        }),
        &["//foo:bin"],
    )?;
    assert_eq!(modules["cronet_aml_foo_bin"].ty, ModuleType::CcBinary);
    assert!(modules["cronet_aml_foo_headers"].is_omitted());
    assert!(modules["cronet_aml_foo_bin"]
        .union_of(|p| &p.whole_static_libs)
        .is_empty());
    Ok(())
}

#[test]
fn header_genrules_are_concatenated_per_arch() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:lib": {"type": "shared_library", "toolchain": ARM,
                          "sources": ["//foo/lib.cc"], "deps": ["//foo:flags"]},
            "//foo:flags": buildflag_action(),
        }),
        &["//foo:lib"],
    )?;

    let flags = &modules["cronet_aml_foo_flags"];
    assert_eq!(flags.ty, ModuleType::CcGenrule);
    assert_eq!(flags.genrule_headers, set(&["cronet_aml_foo_flags"]));

    let aggregate_name = "cronet_aml_foo_lib__concatenated_headers_android_arm";
    let aggregate = &modules[aggregate_name];
    assert_eq!(aggregate.common.srcs, set(&[":cronet_aml_foo_flags"]));
    assert_eq!(aggregate.common.out, set(&["foo/buildflags.h"]));
    assert_eq!(
        modules["cronet_aml_foo_lib"].target[&Arch::AndroidArm].generated_headers,
        set(&[aggregate_name])
    );
    Ok(())
}

#[test]
fn static_libraries_export_their_generated_headers() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:a": {"type": "static_library", "toolchain": ARM,
                        "sources": ["//foo/a.cc"], "deps": ["//foo:flags"]},
            "//foo:flags": buildflag_action(),
        }),
        &["//foo:a"],
    )?;
    let arm = &modules["cronet_aml_foo_a"].target[&Arch::AndroidArm];
    assert_eq!(arm.export_generated_headers, arm.generated_headers);
    assert!(!arm.export_generated_headers.is_empty());
    Ok(())
}

#[test]
fn actions_are_translated_once_per_flavor() -> anyhow::Result<()> {
    let graph = parse_all(
        &[desc(json!({
            "//foo:enums": {
                "type": "action",
                "toolchain": ARM,
                "script": "//build/android/gyp/java_cpp_enum.py",
                "args": ["--srcjar=gen/foo/enums.srcjar", "../../foo/a.h"],
                "sources": ["//foo/a.h"],
                "outputs": ["//out/Release/gen/foo/enums.srcjar"],
            },
        }))],
        &["//foo:enums"],
    );
    let config = test_config();
    let mut builder = ModuleBuilder::new(&config, &graph);

    assert_eq!(
        builder.create_modules("//foo:enums", Flavor::Cc)?,
        vec!["cronet_aml_foo_enums"]
    );
    assert_eq!(
        builder.create_modules("//foo:enums", Flavor::Java)?,
        vec!["cronet_aml_foo_enums__java"]
    );
    assert_eq!(
        builder.create_modules("//foo:enums", Flavor::Java)?,
        vec!["cronet_aml_foo_enums__java"]
    );

    assert_eq!(builder.modules["cronet_aml_foo_enums"].ty, ModuleType::CcGenrule);
    let java = &builder.modules["cronet_aml_foo_enums__java"];
    assert_eq!(java.ty, ModuleType::JavaGenrule);
    assert_eq!(java.common.out, set(&["foo/enums.srcjar"]));
    assert!(java.genrule_srcs.is_empty());
    Ok(())
}

#[test]
fn arch_specific_commands_are_guarded() -> anyhow::Result<()> {
    let action = |toolchain: &str, arch_flag: &str| {
        desc(json!({
            "//foo:flags": {
                "type": "action",
                "toolchain": toolchain,
                "script": "//build/write_buildflag_header.py",
                "args": ["--output", "foo/buildflags.h", "--flags", arch_flag],
                "outputs": ["//out/Release/gen/foo/buildflags.h"],
            },
        }))
    };
    let graph = parse_all(&[action(ARM, "ARM"), action(ARM64, "ARM64")], &["//foo:flags"]);
    let config = test_config();
    let mut builder = ModuleBuilder::new(&config, &graph);
    builder.create_modules("//foo:flags", Flavor::Cc)?;

    let cmd = builder.modules["cronet_aml_foo_flags"]
        .common
        .cmd
        .clone()
        .unwrap_or_default();
    assert!(cmd.starts_with("if [[ "));
    assert!(cmd.contains("--flags\nARM;\nfi;"));
    assert!(cmd.contains("--flags\nARM64;\nfi;"));
    Ok(())
}

#[test]
fn copy_targets_read_the_output_of_their_action() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//base:build_date_header": {
                "type": "copy",
                "toolchain": ARM,
                "sources": ["//out/Release/gen/base/generated_build_date.h"],
                "outputs": ["//out/Release/gen/base/build_date.h"],
                "deps": ["//base:generate_build_date"],
            },
            "//base:generate_build_date": {
                "type": "action",
                "toolchain": ARM,
                "script": "//build/write_build_date_header.py",
                "args": ["gen/base/generated_build_date.h", "default"],
                "outputs": ["//out/Release/gen/base/generated_build_date.h"],
            },
        }),
        &["//base:build_date_header"],
    )?;

    let copy = &modules["cronet_aml_base_build_date_header"];
    assert_eq!(copy.ty, ModuleType::CcGenrule);
    assert_eq!(copy.common.srcs, set(&[":cronet_aml_base_generate_build_date"]));
    assert_eq!(copy.common.out, set(&["base/build_date.h"]));
    assert!(copy.common.cmd.as_deref().unwrap_or_default().starts_with("cp"));

    let action = &modules["cronet_aml_base_generate_build_date"];
    assert!(action.common.cmd.as_deref().unwrap_or_default().contains("$(out)"));
    Ok(())
}

#[test]
fn protos_split_into_header_and_source_genrules() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:lib": {"type": "static_library", "toolchain": ARM,
                          "sources": ["//foo/lib.cc"], "deps": ["//foo:proto_gen"]},
            "//foo:proto_gen": {
                "type": "action",
                "toolchain": ARM,
                "script": "//tools/protoc_wrapper/protoc_wrapper.py",
                "args": ["--proto-in-dir", "../../foo", "--cc-out-dir", "gen/foo",
                         "--import-dir=../../third_party/protobuf/src", "p.proto"],
                "sources": ["//foo/p.proto"],
                "outputs": ["//out/Release/gen/foo/p.pb.h", "//out/Release/gen/foo/p.pb.cc"],
            },
        }),
        &["//foo:lib"],
    )?;

    let short_name = short_module_name("cronet_aml_", "//foo:proto_gen");
    let header = &modules[&format!("{short_name}_gen_headers")];
    let source = &modules[&format!("{short_name}_gen")];

    assert_eq!(header.common.out, set(&["foo/p.pb.h"]));
    assert_eq!(header.common.export_include_dirs, set(&[".", "protos", "foo"]));
    assert_eq!(source.common.out, set(&["foo/p.pb.cc"]));
    assert_eq!(header.common.srcs, set(&["foo/p.proto"]));
    assert!(source
        .common
        .tools
        .contains("cronet_aml_third_party_protobuf_protoc"));

    let cmd = source.common.cmd.clone().unwrap_or_default();
    assert!(cmd.starts_with("$(location cronet_aml_third_party_protobuf_protoc)"));
    assert!(cmd.contains("--proto_path=external/cronet/tot/foo"));
    assert!(cmd.contains("--proto_path=external/protobuf/src"));
    assert!(cmd.contains("--cpp_out=lite=true:$(genDir)/foo"));
    assert!(cmd.ends_with("$(in)"));

    let lib = &modules["cronet_aml_foo_lib"].target[&Arch::AndroidArm];
    assert!(lib.srcs.contains(&format!(":{short_name}_gen")));
    assert!(lib.shared_libs.contains("libprotobuf-cpp-lite"));
    Ok(())
}

#[test]
fn java_libraries_become_three_modules() -> anyhow::Result<()> {
    let java = |sources: &[&str], deps: &[&str]| {
        json!({
            "type": "group",
            "toolchain": ARM,
            "metadata": {
                "target_type": ["java_library"],
                "java_library_sources": sources,
                "java_library_deps": deps,
                "java_library_jar_excluded_patterns": ["*/R.class"],
            },
        })
    };
    let modules = build(
        json!({
            "//foo:java": java(&["//foo/org/chromium/A.java"], &["//foo:dep_java"]),
            "//foo:dep_java": java(&["//foo/org/chromium/B.java"], &[]),
        }),
        &["//foo:java"],
    )?;

    let top = &modules["cronet_aml_foo_java"];
    assert_eq!(top.ty, ModuleType::JavaLibrary);
    assert!(top.common.srcs.is_empty());
    assert_eq!(
        top.common.static_libs,
        set(&["cronet_aml_foo_dep_java", "cronet_aml_foo_java__filtered"])
    );

    let unfiltered = &modules["cronet_aml_foo_java__unfiltered"];
    assert_eq!(unfiltered.common.srcs, set(&["foo/org/chromium/A.java"]));
    assert_eq!(unfiltered.common.libs, set(&["cronet_aml_foo_dep_java__unfiltered"]));
    assert_eq!(unfiltered.sdk_version.as_deref(), Some("module_current"));

    let filtered = &modules["cronet_aml_foo_java__filtered"];
    assert_eq!(filtered.ty, ModuleType::JavaGenrule);
    assert_eq!(filtered.common.srcs, set(&[":cronet_aml_foo_java__unfiltered"]));
    assert_eq!(filtered.common.tools, set(&["cronet_aml_filter_zip"]));
    assert!(filtered
        .common
        .cmd
        .as_deref()
        .unwrap_or_default()
        .contains("*/R.class"));
    Ok(())
}

#[test]
fn platform_sdk_deps_upgrade_the_sdk_version() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:java": {
                "type": "group",
                "toolchain": ARM,
                "metadata": {
                    "target_type": ["java_library"],
                    "java_library_sources": ["//foo/A.java"],
                    "java_library_deps": ["//third_party/android_sdk:android_sdk_java"],
                },
            },
        }),
        &["//foo:java"],
    )?;
    assert_eq!(
        modules["cronet_aml_foo_java"].sdk_version.as_deref(),
        Some("system_current")
    );
    Ok(())
}

#[test]
fn conflicting_cpp_standards_are_fatal() {
    let lib = |toolchain: &str, std: &str| {
        desc(json!({
            "//foo:lib": {"type": "static_library", "toolchain": toolchain,
                          "sources": ["//foo/a.cc"], "cflags_cc": [format!("-std={std}")]},
        }))
    };
    let graph = parse_all(&[lib(ARM, "c++17"), lib(ARM64, "c++20")], &["//foo:lib"]);
    let config = test_config();
    let err = ModuleBuilder::new(&config, &graph)
        .build(&["//foo:lib".to_string()])
        .unwrap_err();
    assert!(matches!(err, TranslateError::ConflictingCppStd { .. }));
}

#[test]
fn linker_scripts_become_filegroups() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:lib": {"type": "shared_library", "toolchain": ARM,
                          "sources": ["//foo/a.cc"],
                          "ldflags": ["-Wl,--version-script=../../foo/lib.lst", "-Wl,--gc-sections"]},
        }),
        &["//foo:lib"],
    )?;
    let lib = &modules["cronet_aml_foo_lib"];
    assert_eq!(
        lib.common.version_script.as_deref(),
        Some(":cronet_aml_foo_lib_lst")
    );
    assert_eq!(lib.target[&Arch::AndroidArm].ldflags, vec!["-Wl,--gc-sections"]);
    assert_eq!(
        modules["cronet_aml_foo_lib_lst"].common.srcs,
        set(&["foo/lib.lst"])
    );
    Ok(())
}

#[test]
fn multiple_linker_scripts_are_fatal() {
    let result = build(
        json!({
            "//foo:lib": {"type": "shared_library", "toolchain": ARM,
                          "ldflags": ["-Wl,--version-script=../../foo/a.lst",
                                      "-Wl,--version-script=../../foo/b.lst"]},
        }),
        &["//foo:lib"],
    );
    assert!(matches!(
        result,
        Err(TranslateError::MultipleLinkerScripts { .. })
    ));
}

#[test]
fn rust_crates_link_through_rustlibs() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:bin": {"type": "executable", "toolchain": ARM,
                          "crate_root": "//foo/main.rs", "crate_name": "foo_bin",
                          "deps": ["//foo:lib"]},
            "//foo:lib": {"type": "rust_library", "toolchain": ARM,
                          "crate_root": "//foo/lib.rs", "crate_name": "foo",
                          "rustflags": ["--edition=2018", "--cfg", "feature=\"std\"",
                                        "--cfg", "cr_rustc_revision=\"abc\""]},
        }),
        &["//foo:bin"],
    )?;

    let lib_name = rust_module_name("cronet_aml_", "//foo:lib", "foo");
    let lib = &modules[&lib_name];
    assert_eq!(lib.ty, ModuleType::RustFfiStatic);
    assert_eq!(lib.edition.as_deref(), Some("2018"));
    assert_eq!(lib.crate_root.as_deref(), Some("foo/lib.rs"));
    assert_eq!(lib.target[&Arch::AndroidArm].features, set(&["std"]));
    assert!(lib.target[&Arch::AndroidArm].cfgs.is_empty());

    let bin = &modules["cronet_aml_foo_bin"];
    assert_eq!(bin.ty, ModuleType::RustBinary);
    assert_eq!(bin.edition.as_deref(), Some("2021"));
    assert_eq!(bin.target[&Arch::AndroidArm].rustlibs, set(&[lib_name.as_str()]));
    Ok(())
}

#[test]
fn static_inline_shims_are_wired_to_their_bindgen() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:shims": {"type": "static_library", "toolchain": ARM,
                            "sources": ["//foo/shims.c"], "deps": ["//foo:bindings"]},
            "//foo:bindings": {
                "type": "action",
                "toolchain": ARM,
                "script": BINDGEN_SCRIPT,
                "args": ["--header", "../../foo/api.h", "--wrap-static-fns",
                         "gen/foo/shims.c", "--", "-DFOO", "-I../../foo/include"],
            },
        }),
        &["//foo:shims"],
    )?;

    let bindgen = &modules[&rust_module_name("cronet_aml_", "//foo:bindings", "bindings")];
    assert_eq!(bindgen.ty, ModuleType::RustBindgen);
    assert_eq!(bindgen.wrapper_src.as_deref(), Some("foo/api.h"));
    assert_eq!(bindgen.handle_static_inline, Some(true));
    assert_eq!(
        bindgen.static_inline_library.as_deref(),
        Some("libcronet_aml_foo_shims")
    );
    assert_eq!(bindgen.common.cflags, vec!["-DFOO"]);
    assert!(bindgen
        .common
        .include_dirs
        .contains("external/cronet/tot/foo/include"));

    let shims = &modules["libcronet_aml_foo_shims"];
    assert!(shims.union_of(|p| &p.srcs).iter().all(|src| !src.starts_with(':')));
    Ok(())
}

#[test]
fn builtin_deps_are_replaced_by_platform_modules() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:lib": {"type": "shared_library", "toolchain": ARM,
                          "sources": ["//foo/a.cc"],
                          "deps": ["//third_party/zlib:zlib", "//third_party/boringssl:boringssl"]},
        }),
        &["//foo:lib"],
    )?;
    assert_eq!(
        modules["cronet_aml_foo_lib"].target[&Arch::AndroidArm].shared_libs,
        set(&["libcrypto", "libssl", "libz"])
    );
    assert!(!modules.keys().any(|name| name.contains("zlib")));
    Ok(())
}

#[test]
fn missing_roots_are_reported() {
    let graph = new_graph();
    let config = test_config();
    let err = ModuleBuilder::new(&config, &graph)
        .build(&["//foo:gone".to_string()])
        .unwrap_err();
    assert!(matches!(err, TranslateError::MissingTarget { .. }));
}

#[test]
fn foreach_actions_split_outputs_by_source() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:gen": {
                "type": "action_foreach",
                "toolchain": ARM,
                "script": "//build/gn_run_binary.py",
                "args": ["./clang_x64/idl_gen", "{{source}}",
                         "--out", "gen/foo/{{source_name_part}}.h"],
                "sources": ["//foo/a.idl", "//foo/ab.idl", "//foo/x.test.idl"],
                "outputs": ["//out/Release/gen/foo/a.h", "//out/Release/gen/foo/ab.h",
                            "//out/Release/gen/foo/x.test.h"],
            },
        }),
        &["//foo:gen"],
    )?;

    let expected = [
        ("cronet_aml_foo_gen_0", "foo/a.idl", "foo/a.h"),
        ("cronet_aml_foo_gen_1", "foo/ab.idl", "foo/ab.h"),
        ("cronet_aml_foo_gen_2", "foo/x.test.idl", "foo/x.test.h"),
    ];
    for (name, source, out) in expected {
        let module = &modules[name];
        assert_eq!(module.ty, ModuleType::CcGenrule);
        assert_eq!(module.common.srcs, set(&[source]));
        assert_eq!(module.common.out, set(&[out]));
        let cmd = module.common.cmd.clone().unwrap_or_default();
        assert!(cmd.contains(&format!("$(location {source})")));
        assert!(cmd.contains(&format!("$(genDir)/{out}")));
    }
    assert!(!modules.contains_key("cronet_aml_foo_gen_3"));
    Ok(())
}

#[test]
fn jni_generators_expose_only_the_proxy_srcjar() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:java": {
                "type": "group",
                "toolchain": ARM,
                "metadata": {
                    "target_type": ["java_library"],
                    "java_library_sources": ["//foo/org/chromium/A.java"],
                    "java_library_deps": ["//foo:jni"],
                },
            },
            "//foo:jni": {
                "type": "action",
                "toolchain": ARM,
                "script": "//third_party/jni_zero/jni_zero.py",
                "args": ["generate-from-source", "--srcjar-path", "gen/foo/jni.srcjar",
                         "--placeholder-srcjar-path", "gen/foo/jni_placeholder.srcjar",
                         "--output-dir", "gen/foo", "../../foo/org/chromium/A.java"],
                "sources": ["//foo/org/chromium/A.java"],
                "outputs": ["//out/Release/gen/foo/jni.srcjar",
                            "//out/Release/gen/foo/jni_placeholder.srcjar",
                            "//out/Release/gen/foo/A_jni.h"],
            },
        }),
        &["//foo:java"],
    )?;

    let generator_name = format!("{}__java", short_module_name("cronet_aml_", "//foo:jni"));
    let generator = &modules[&generator_name];
    assert_eq!(generator.ty, ModuleType::JavaGenrule);
    assert_eq!(
        generator.common.out,
        set(&["foo/jni.srcjar", "foo/jni_placeholder.srcjar"])
    );

    let proxy_name = format!("{generator_name}__proxy");
    let proxy = &modules[&proxy_name];
    assert_eq!(proxy.ty, ModuleType::JavaGenrule);
    assert_eq!(proxy.common.srcs, set(&[format!(":{generator_name}").as_str()]));
    assert_eq!(proxy.common.out, set(&["foo/jni.srcjar"]));
    let cmd = proxy.common.cmd.clone().unwrap_or_default();
    assert!(cmd.contains("*/jni.srcjar"));
    assert!(cmd.contains("cp $$f $(out)"));

    let unfiltered = &modules["cronet_aml_foo_java__unfiltered"];
    assert!(unfiltered.common.srcs.contains(&format!(":{proxy_name}")));
    assert!(!unfiltered.common.srcs.contains(&format!(":{generator_name}")));
    assert!(!unfiltered
        .common
        .srcs
        .iter()
        .any(|src| src.contains("placeholder")));
    Ok(())
}

#[test]
fn aidl_targets_become_a_filegroup_and_an_interface() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:java": {
                "type": "group",
                "toolchain": ARM,
                "metadata": {
                    "target_type": ["java_library"],
                    "java_library_sources": ["//foo/java/src/org/chromium/A.java"],
                    "java_library_deps": ["//foo:aidl"],
                },
            },
            "//foo:aidl": {
                "type": "action",
                "toolchain": ARM,
                "script": "//build/android/gyp/aidl.py",
                "sources": ["//foo/java/src/org/chromium/IFoo.aidl"],
                "outputs": ["//out/Release/gen/foo/aidl.srcjar"],
            },
        }),
        &["//foo:java"],
    )?;

    let files = &modules["cronet_aml_foo_aidl_aidl_files"];
    assert_eq!(files.ty, ModuleType::Filegroup);
    assert_eq!(files.path.as_deref(), Some("foo/java/src"));
    assert_eq!(files.common.srcs, set(&["foo/java/src/org/chromium/IFoo.aidl"]));

    let interface = &modules["cronet_aml_foo_aidl"];
    assert_eq!(interface.ty, ModuleType::AidlInterface);
    assert_eq!(interface.common.srcs, set(&[":cronet_aml_foo_aidl_aidl_files"]));
    assert_eq!(interface.unstable, Some(true));

    assert!(modules["cronet_aml_foo_java__unfiltered"]
        .common
        .srcs
        .contains(":cronet_aml_foo_aidl-java-source"));
    Ok(())
}

#[test]
fn proto_plugins_run_as_tools() -> anyhow::Result<()> {
    let modules = build(
        json!({
            "//foo:proto_gen": {
                "type": "action",
                "toolchain": ARM,
                "script": "//tools/protoc_wrapper/protoc_wrapper.py",
                "args": ["--proto-in-dir", "../../foo", "--cc-out-dir", "gen/foo",
                         "--plugin", "./clang_x64/my_plugin",
                         "--plugin-options", "wrapper", "p.proto"],
                "sources": ["//foo/p.proto"],
                "outputs": ["//out/Release/gen/foo/p.pb.h", "//out/Release/gen/foo/p.pb.cc"],
                "deps": ["//foo:my_plugin(//build/toolchain/linux:clang_x64)"],
            },
            "//foo:my_plugin(//build/toolchain/linux:clang_x64)": {
                "type": "executable", "toolchain": HOST, "sources": ["//foo/plugin.cc"],
            },
        }),
        &["//foo:proto_gen"],
    )?;

    let short_name = short_module_name("cronet_aml_", "//foo:proto_gen");
    let source = &modules[&format!("{short_name}_gen")];
    assert_eq!(
        source.common.tools,
        set(&["cronet_aml_foo_my_plugin", "cronet_aml_third_party_protobuf_protoc"])
    );
    let cmd = source.common.cmd.clone().unwrap_or_default();
    assert!(cmd.contains("--plugin=protoc-gen-plugin=$(location cronet_aml_foo_my_plugin)"));
    assert!(cmd.contains("--plugin_out=wrapper:$(genDir)/foo"));
    assert_eq!(modules["cronet_aml_foo_my_plugin"].ty, ModuleType::CcBinary);
    Ok(())
}
