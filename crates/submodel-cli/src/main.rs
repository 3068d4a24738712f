// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Submodel CLI entrypoint.
//!
//! Builds the bundled early-vision model from an optional JSON options file
//! and reports on it: the sheet/projection summary, the parameters that
//! differ from their defaults, or the full instantiation plan with its BLAKE3
//! digest.
//!
//! # Usage
//! ```text
//! submodel [--config options.json] [--legacy-order] <summary|modifications|plan|options>
//! ```
// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use submodel_core::demo::early_vision::{early_vision_definition, legacy_connection_order};
use submodel_core::{
    order_projections, Component, Model, ModelOptions, RecordingRuntime, RuntimeCall,
};
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "submodel")]
#[command(about = "Inspect and plan declarative sheet/projection models")]
struct Cli {
    /// Path to a JSON options file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Use the historical connection order when the options give none
    #[arg(long, global = true)]
    legacy_order: bool,
    /// Maximum log level written to stderr
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print each sheet followed by its incoming projections
    Summary,
    /// List parameters that differ from their defaults
    Modifications {
        /// Components to report; every component when omitted
        #[arg(long, value_enum)]
        component: Vec<ComponentArg>,
    },
    /// Instantiate into an in-memory runtime and print the call log
    Plan {
        /// Print only the digest
        #[arg(long)]
        digest_only: bool,
    },
    /// Print the effective options as JSON
    Options,
}

#[derive(Clone, Copy, ValueEnum)]
enum ComponentArg {
    Model,
    Sheets,
    Projections,
}

impl From<ComponentArg> for Component {
    fn from(value: ComponentArg) -> Self {
        match value {
            ComponentArg::Model => Self::Model,
            ComponentArg::Sheets => Self::Sheets,
            ComponentArg::Projections => Self::Projections,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let options = load_options(&cli)?;
    match cli.command {
        Commands::Summary => println!("{}", build_model(&options)?.summary()),
        Commands::Modifications { component } => {
            let components: Vec<Component> = if component.is_empty() {
                Component::ALL.to_vec()
            } else {
                component.into_iter().map(Component::from).collect()
            };
            println!("{}", build_model(&options)?.modifications(&components));
        }
        Commands::Plan { digest_only } => {
            let model = build_model(&options)?;
            let mut runtime = RecordingRuntime::new();
            model.instantiate(&mut runtime, &options.instantiate, options.verbose)?;
            if !digest_only {
                for call in runtime.calls() {
                    println!("{}", render_call(call));
                }
            }
            println!("digest {}", runtime.digest_hex());
        }
        Commands::Options => println!("{}", serde_json::to_string_pretty(&options)?),
    }
    Ok(())
}

fn load_options(cli: &Cli) -> Result<ModelOptions> {
    let mut options = match &cli.config {
        Some(path) => ModelOptions::from_path(path)
            .with_context(|| format!("failed to load options from {}", path.display()))?,
        None => ModelOptions::default(),
    };
    if cli.legacy_order && options.connection_order.is_none() {
        options.connection_order = Some(legacy_connection_order());
    }
    if !options.time_dependent && options.connection_order.is_none() {
        warn!(
            "time_dependent is false but no connection_order is set; \
             plan order follows construction order"
        );
    }
    Ok(options)
}

fn build_model(options: &ModelOptions) -> Result<Model> {
    let definition = early_vision_definition()?;
    let mut model = Model::new(definition, options).context("model setup failed")?;
    if let Some(order) = &options.connection_order {
        debug!(entries = order.len(), "applying connection order");
        order_projections(&mut model, order).context("connection order rejected")?;
    }
    Ok(model)
}

fn render_call(call: &RuntimeCall) -> String {
    match call {
        RuntimeCall::Register { name, type_name } => format!("register {name} : {type_name}"),
        RuntimeCall::Connect {
            src,
            dest,
            type_name,
            name,
        } => format!("connect {src} -> {dest} {name} : {type_name}"),
    }
}
