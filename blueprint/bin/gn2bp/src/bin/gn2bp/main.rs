// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{ensure, Context, Result};
use clap::{ArgAction, Parser};
use cliutil::{cli_main, handle_top_level_result, ConfigBuilder};
use gn2bp::{
    config::{Channel, TranslatorConfig},
    desc::{load_build_script_outputs, load_desc, BuildScriptOutputs},
    serialize::{write_blueprints, OutputOptions},
    translate, Root,
};

/// Roots translated when no target is given on the command line.
const DEFAULT_TARGETS: &[&str] = &[
    "//components/cronet/android:cronet_api_java",
    "//components/cronet/android:cronet_impl_native_java",
    "//components/cronet/android:cronet_jni_registration_java",
    "//components/cronet/android:cronet_shared_jni_registration_java",
    "//components/cronet/android:cronet",
    "//components/cronet:cronet_package_android",
];

/// Default roots that are test suites. Their closures are emitted as
/// separate `__testing` modules.
const DEFAULT_TESTS: &[&str] = &[
    "//components/cronet/android:cronet_unittests_android__library",
    "//net:net_unittests__library",
    "//components/cronet/android:cronet_tests",
    "//components/cronet/android:cronet_javatests",
    "//third_party/netty4:netty_all_java",
];

/// Generates Android.bp files from GN desc dumps.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// GN desc JSON of one Android arch. Pass once per arch.
    #[arg(long, required = true)]
    desc: Vec<PathBuf>,

    /// JSON file with the rustc flags printed by Rust build scripts.
    #[arg(long = "build_script_output")]
    build_script_output: Option<PathBuf>,

    /// Root of the Chromium checkout the blueprints are written into.
    #[arg(long = "repo_root", default_value = ".")]
    repo_root: PathBuf,

    /// Ignored; blueprints are always written under --repo_root.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Hand-written blueprint included from the root blueprint.
    #[arg(long, default_value = "Android.extras.bp")]
    extras: String,

    /// Appended to the name of every generated blueprint.
    #[arg(long, default_value = "")]
    suffix: String,

    /// Release channel; selects module prefix and tree location.
    #[arg(long, default_value_t = Channel::Tot)]
    channel: Channel,

    /// Generate license modules from README.chromium files.
    #[arg(long, overrides_with = "no_license")]
    license: bool,

    /// Do not generate license modules.
    #[arg(long = "no-license", overrides_with = "license")]
    no_license: bool,

    /// Logs more; may be repeated.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// GN labels to translate. Without any, the built-in Cronet roots and
    /// their test suites are translated.
    #[arg()]
    targets: Vec<String>,
}

impl Args {
    fn roots(&self) -> Vec<Root> {
        if self.targets.is_empty() {
            DEFAULT_TARGETS
                .iter()
                .map(|label| Root::new(*label, false))
                .chain(DEFAULT_TESTS.iter().map(|label| Root::new(*label, true)))
                .collect()
        } else {
            self.targets
                .iter()
                .map(|label| Root::new(label.clone(), DEFAULT_TESTS.contains(&label.as_str())))
                .collect()
        }
    }
}

fn do_main(args: Args) -> Result<()> {
    ensure!(
        args.repo_root.is_dir(),
        "{} is not a directory",
        args.repo_root.display()
    );
    if let Some(output) = &args.output {
        tracing::debug!("Ignoring --output {}", output.display());
    }

    let descs = args
        .desc
        .iter()
        .map(|path| load_desc(path).with_context(|| format!("loading {}", path.display())))
        .collect::<Result<Vec<_>>>()?;
    let build_script_outputs = match &args.build_script_output {
        Some(path) => load_build_script_outputs(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BuildScriptOutputs::default(),
    };

    let config = TranslatorConfig::new(args.channel, &args.repo_root).with_licenses(!args.no_license);
    let blueprints = translate(&config, &descs, build_script_outputs, &args.roots())
        .context("translating GN targets")?;

    let options = OutputOptions {
        suffix: args.suffix.clone(),
        extras: Some(args.extras.clone()),
    };
    let written = write_blueprints(&args.repo_root, &blueprints, &options)
        .context("writing blueprints")?;
    tracing::info!("Wrote {} blueprints", written.len());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = match ConfigBuilder::new().verbosity(args.verbose).build() {
        Ok(config) => config,
        Err(err) => return handle_top_level_result::<(), _>(Err(err)),
    };
    cli_main(|| do_main(args), config)
}
