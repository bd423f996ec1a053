// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Extraction of the `run_bindgen.py` invocation into `rust_bindgen`
//! properties.

use super::sanitize_filepath;

/// What a `run_bindgen.py` action asks bindgen to do.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BindgenArgs {
    /// Header bindings are generated for.
    pub wrapper_src: Option<String>,
    /// Whether the header is parsed as C++ (`-x c++` after `--`).
    pub cpp: bool,
    /// Whether static inline functions get C shims (`--wrap-static-fns`).
    pub wrap_static_fns: bool,
    /// Options forwarded to bindgen itself, with their `--` restored.
    pub bindgen_flags: Vec<String>,
    /// Clang arguments following `--`.
    pub clang_args: Vec<String>,
}

impl BindgenArgs {
    pub fn parse(args: &[String]) -> Self {
        let mut parsed = BindgenArgs::default();
        let (script_args, clang_args) = match args.iter().position(|arg| arg == "--") {
            Some(i) => (&args[..i], &args[i + 1..]),
            None => (args, &[][..]),
        };

        let mut iter = script_args.iter().peekable();
        while let Some(arg) = iter.next() {
            let (flag, inline_value) = match arg.split_once('=') {
                Some((flag, value)) => (flag, Some(value.to_string())),
                None => (arg.as_str(), None),
            };
            match flag {
                "--header" => {
                    let value = inline_value.or_else(|| iter.next().cloned());
                    parsed.wrapper_src = value.map(|path| sanitize_filepath(&path));
                }
                "--wrap-static-fns" => {
                    parsed.wrap_static_fns = true;
                    // The shim output path is chosen by Soong.
                    if inline_value.is_none()
                        && iter.peek().map_or(false, |next| !next.starts_with("--"))
                    {
                        iter.next();
                    }
                }
                "--bindgen-flags" => {
                    if let Some(value) = inline_value {
                        parsed.bindgen_flags.push(format!("--{value}"));
                    }
                    while let Some(next) = iter.peek() {
                        if next.starts_with("--") {
                            break;
                        }
                        parsed.bindgen_flags.push(format!("--{next}"));
                        iter.next();
                    }
                }
                _ => {}
            }
        }

        parsed.cpp = clang_args
            .windows(2)
            .any(|pair| pair[0] == "-x" && pair[1] == "c++")
            || clang_args.iter().any(|arg| arg == "-xc++");
        parsed.clang_args = clang_args.to_vec();
        parsed
    }

    /// Clang flags worth forwarding: defines and warnings. Include paths,
    /// sysroot and target flags are supplied by Soong.
    pub fn forwarded_cflags(&self) -> Vec<String> {
        self.clang_args
            .iter()
            .filter(|arg| arg.starts_with("-D") || arg.starts_with("-U") || arg.starts_with("-W"))
            .cloned()
            .collect()
    }

    /// Include directories from `-I` clang arguments, relative to the
    /// source root.
    pub fn include_dirs(&self) -> Vec<String> {
        self.clang_args
            .iter()
            .filter_map(|arg| arg.strip_prefix("-I"))
            .map(sanitize_filepath)
            .filter(|dir| !dir.starts_with("$("))
            .collect()
    }
}
