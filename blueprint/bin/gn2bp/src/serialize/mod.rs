// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Rendering of blueprints to `Android.bp` text.
//!
//! Module stanzas are produced from a fixed property order so that the
//! output is stable across runs; the file layout around them comes from a
//! Tera template.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use lazy_static::lazy_static;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::instrument;

use crate::{
    blueprint::Blueprint,
    error::{Result, TranslateError},
    module::{ArchModule, Module},
};

const INDENT: &str = "    ";

lazy_static! {
    static ref TEMPLATES: Tera = {
        let mut tera: Tera = Default::default();
        tera.add_raw_template("Android.bp", include_str!("templates/Android.bp"))
            .unwrap();
        tera
    };
}

/// A Blueprint property value.
#[derive(Clone, Debug, PartialEq)]
enum Value {
    Bool(bool),
    Str(String),
    /// A string spread over several lines of `+` concatenations.
    Lines(Vec<String>),
    List(Vec<String>),
    Map(Properties),
}

/// Properties of a module or a nested map, in emission order. Empty values
/// are never recorded.
#[derive(Clone, Debug, Default, PartialEq)]
struct Properties(Vec<(String, Value)>);

impl Properties {
    fn push(&mut self, key: &str, value: Value) {
        self.0.push((key.to_string(), value));
    }

    fn str(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(key, Value::Str(value.to_string()));
        }
    }

    fn bool(&mut self, key: &str, value: Option<bool>) {
        if let Some(value) = value {
            self.push(key, Value::Bool(value));
        }
    }

    fn set(&mut self, key: &str, values: &BTreeSet<String>) {
        if !values.is_empty() {
            self.push(key, Value::List(values.iter().cloned().collect()));
        }
    }

    fn list(&mut self, key: &str, values: &[String]) {
        if !values.is_empty() {
            self.push(key, Value::List(values.to_vec()));
        }
    }

    fn cflags(&mut self, key: &str, values: &[String]) {
        if !values.is_empty() {
            self.push(key, Value::List(sort_cflags(values)));
        }
    }

    /// Multi-line strings are emitted one line per concatenation operand.
    fn multiline(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) if value.contains('\n') => {
                self.push(key, Value::Lines(value.lines().map(str::to_string).collect()));
            }
            _ => self.str(key, value),
        }
    }

    fn map(&mut self, key: &str, properties: Properties) {
        if !properties.0.is_empty() {
            self.push(key, Value::Map(properties));
        }
    }
}

/// Stable-sorts cflags by the macro they define or undefine, keeping every
/// `-U`/`-D` pair of a macro in its original order. Other flags stay in
/// front in their original order.
pub fn sort_cflags(flags: &[String]) -> Vec<String> {
    let macro_name = |flag: &str| -> String {
        flag.strip_prefix("-D")
            .or_else(|| flag.strip_prefix("-U"))
            .map(|definition| definition.split('=').next().unwrap_or(definition).to_string())
            .unwrap_or_default()
    };
    let mut sorted = flags.to_vec();
    sorted.sort_by_key(|flag| macro_name(flag));
    sorted
}

/// Properties that may appear both at the top level and in arch blocks.
fn arch_properties(props: &ArchModule) -> Properties {
    let mut out = Properties::default();
    out.set("srcs", &props.srcs);
    out.set("shared_libs", &props.shared_libs);
    out.set("static_libs", &props.static_libs);
    out.set("whole_static_libs", &props.whole_static_libs);
    out.set("tools", &props.tools);
    out.multiline("cmd", props.cmd.as_deref());
    out.set("out", &props.out);
    out.set("export_include_dirs", &props.export_include_dirs);
    out.set("generated_headers", &props.generated_headers);
    out.set("export_generated_headers", &props.export_generated_headers);
    out.cflags("cflags", &props.cflags);
    out.cflags("cppflags", &props.cppflags);
    out.set("include_dirs", &props.include_dirs);
    out.set("header_libs", &props.header_libs);
    out.set("tool_files", &props.tool_files);
    out.cflags("ldflags", &props.ldflags);
    out.str("version_script", props.version_script.as_deref());
    out.set("libs", &props.libs);
    out.set("rustlibs", &props.rustlibs);
    out.set("proc_macros", &props.proc_macros);
    out.set("features", &props.features);
    out.set("cfgs", &props.cfgs);
    out.list("flags", &props.flags);
    out.bool("enabled", props.enabled);
    out
}

fn module_properties(module: &Module) -> Properties {
    let mut out = Properties::default();
    if !module.name.is_empty() {
        out.str("name", Some(module.name.as_str()));
    }
    out.list("defaults", &module.defaults);
    out.bool("host_supported", module.host_supported);
    out.bool("device_supported", module.device_supported);
    out.0.extend(arch_properties(&module.common).0);

    out.str("stem", module.stem.as_deref());
    out.str("stl", module.stl.as_deref());
    out.str("cpp_std", module.cpp_std.as_deref());
    out.str("c_std", module.c_std.as_deref());
    out.bool("rtti", module.rtti);
    out.str("crate_name", module.crate_name.as_deref());
    out.str("crate_root", module.crate_root.as_deref());
    out.str("edition", module.edition.as_deref());
    out.bool("cargo_env_compat", module.cargo_env_compat);
    out.str("cargo_pkg_version", module.cargo_pkg_version.as_deref());
    out.str("source_stem", module.source_stem.as_deref());
    out.str("wrapper_src", module.wrapper_src.as_deref());
    out.list("bindgen_flags", &module.bindgen_flags);
    out.bool("handle_static_inline", module.handle_static_inline);
    out.str("static_inline_library", module.static_inline_library.as_deref());
    out.bool("whole_program_vtables", module.whole_program_vtables);
    out.str("path", module.path.as_deref());
    out.bool("unstable", module.unstable);
    out.set("jars", &module.jars);
    out.str("jarjar_rules", module.jarjar_rules.as_deref());
    out.list("javacflags", &module.javacflags);
    let mut errorprone = Properties::default();
    errorprone.list("javacflags", &module.errorprone_javacflags);
    out.map("errorprone", errorprone);
    out.str("processor_class", module.processor_class.as_deref());
    out.set("plugins", &module.plugins);
    out.str("sdk_version", module.sdk_version.as_deref());
    out.str("min_sdk_version", module.min_sdk_version.as_deref());
    out.str("compile_multilib", module.compile_multilib.as_deref());
    out.set("apex_available", &module.apex_available);
    let mut sanitize = Properties::default();
    for (key, value) in &module.sanitize {
        sanitize.push(key, Value::Bool(*value));
    }
    out.map("sanitize", sanitize);
    out.set("license_kinds", &module.license_kinds);
    out.set("license_text", &module.license_text);
    out.set("visibility", &module.visibility);
    out.set("default_visibility", &module.default_visibility);
    out.set("default_applicable_licenses", &module.default_applicable_licenses);
    out.bool("include_build_directory", module.include_build_directory);

    let mut target = Properties::default();
    for (arch, props) in &module.target {
        if !props.is_empty() {
            target.push(arch.as_ref(), Value::Map(arch_properties(props)));
        }
    }
    out.map("target", target);
    out
}

fn write_value(out: &mut String, indent: &str, key: &str, value: &Value) {
    match value {
        Value::Bool(value) => out.push_str(&format!("{indent}{key}: {value},\n")),
        Value::Str(value) => out.push_str(&format!("{indent}{key}: \"{value}\",\n")),
        Value::Lines(lines) => {
            let continuation = format!("{indent}{}", " ".repeat(key.len() + 2));
            for (i, line) in lines.iter().enumerate() {
                let lead = if i == 0 {
                    format!("{indent}{key}: ")
                } else {
                    continuation.clone()
                };
                if i + 1 == lines.len() {
                    out.push_str(&format!("{lead}\"{line}\",\n"));
                } else {
                    out.push_str(&format!("{lead}\"{line} \" +\n"));
                }
            }
        }
        Value::List(values) => {
            out.push_str(&format!("{indent}{key}: [\n"));
            for value in values {
                out.push_str(&format!("{indent}{INDENT}\"{value}\",\n"));
            }
            out.push_str(&format!("{indent}],\n"));
        }
        Value::Map(properties) => {
            out.push_str(&format!("{indent}{key}: {{\n"));
            write_properties(out, &format!("{indent}{INDENT}"), properties);
            out.push_str(&format!("{indent}}},\n"));
        }
    }
}

fn write_properties(out: &mut String, indent: &str, properties: &Properties) {
    for (key, value) in &properties.0 {
        write_value(out, indent, key, value);
    }
}

/// Renders one module stanza, without a trailing newline.
pub fn render_module(module: &Module) -> String {
    let mut out = String::new();
    if let Some(label) = &module.gn_target {
        out.push_str(&format!("// GN: {label}\n"));
    }
    out.push_str(&format!("{} {{\n", module.ty));
    write_properties(&mut out, INDENT, &module_properties(module));
    out.push('}');
    out
}

#[derive(Serialize)]
struct BlueprintContext<'a> {
    stanzas: Vec<String>,
    build: Vec<&'a str>,
}

/// Renders a whole blueprint. `extras` is referenced through a `build`
/// directive from the root blueprint only.
pub fn render_blueprint(blueprint: &Blueprint, extras: Option<&str>) -> Result<String> {
    let stanzas = blueprint
        .package
        .iter()
        .chain(blueprint.license.iter())
        .chain(blueprint.modules.values().filter(|module| !module.is_omitted()))
        .map(render_module)
        .collect();
    let build = match extras {
        Some(extras) if blueprint.is_root() => vec![extras],
        _ => Vec::new(),
    };
    let context = BlueprintContext { stanzas, build };
    Ok(TEMPLATES.render("Android.bp", &Context::from_serialize(context)?)?)
}

/// How blueprint files are named and linked.
#[derive(Clone, Debug, Default)]
pub struct OutputOptions {
    /// Appended to `Android.bp`.
    pub suffix: String,
    /// Hand-written blueprint the root blueprint pulls in.
    pub extras: Option<String>,
}

pub fn blueprint_path(repo_root: &Path, dir: &str, suffix: &str) -> PathBuf {
    repo_root.join(dir).join(format!("Android.bp{suffix}"))
}

/// Renders every blueprint, then writes them under `repo_root`. Nothing is
/// written if any of them fails to render.
#[instrument(skip_all)]
pub fn write_blueprints(
    repo_root: &Path,
    blueprints: &BTreeMap<String, Blueprint>,
    options: &OutputOptions,
) -> Result<Vec<PathBuf>> {
    let rendered = blueprints
        .values()
        .map(|blueprint| {
            Ok((
                blueprint_path(repo_root, &blueprint.dir, &options.suffix),
                render_blueprint(blueprint, options.extras.as_deref())?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut written = Vec::new();
    for (path, contents) in rendered {
        let io_error = |source| TranslateError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&path, contents).map_err(io_error)?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
