//! # Command Line Interface
//!
//! Synthesizes, deploys and inspects the gateway stack described by the
//! layered configuration.

pub mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::config::{load_observability, load_validated, AppConfig, ConfigOverrides};
use crate::engine::{DeploymentEngine, FileSystemEngine, OutputRegistry};
use crate::observability::{check_log_level, init_logging, log_config_info};
use crate::resolver::StaticEndpointResolver;
use crate::template::{synthesize, Template};
use crate::topology::{build_topology, Topology};
use output::{print_outputs, render_template, OutputFormat};

/// Default directory deployments are written to
pub const DEFAULT_OUT_DIR: &str = "gatelink.out";

#[derive(Parser)]
#[command(name = "gatelink")]
#[command(about = "Private API gateway in front of a network load balancer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML or YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Deployment stage name override
    #[arg(long, global = true)]
    pub stage: Option<String>,

    /// Load balancer handle override
    #[arg(long, global = true)]
    pub target: Option<String>,

    /// Allowed source CIDR; repeat for several. Replaces the configured list.
    #[arg(long = "allowed-ip", global = true)]
    pub allowed_ips: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print or write the synthesized template
    Synth {
        /// Output format (json or yaml)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Deploy the stack into a local output directory
    Deploy {
        #[arg(long, default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
    },

    /// Show the outputs of a deployed stack
    Outputs {
        #[arg(long, default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,

        /// Stack name (defaults to the configured stack)
        #[arg(long)]
        stack: Option<String>,

        /// Output format (json, yaml, or table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Check configuration and build the topology without deploying
    Validate,
}

impl Cli {
    /// Load the configuration this command needs. Reading a named stack's
    /// outputs never builds anything, so the stack section is not checked.
    fn load_config(&self) -> crate::errors::Result<AppConfig> {
        match &self.command {
            Commands::Outputs { stack: Some(_), .. } => {
                load_observability(self.config.as_deref(), self.overrides())
            }
            _ => load_validated(self.config.as_deref(), self.overrides()),
        }
    }

    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            stage_name: self.stage.clone(),
            target_endpoint_handle: self.target.clone(),
            allowed_source_ips: self.allowed_ips.clone(),
            log_level: self.verbose.then(|| "debug".to_string()),
        }
    }
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    // Missing .env is fine
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    let config = cli.load_config().context("Failed to load configuration")?;

    check_log_level(&config.observability.log_level)?;
    init_logging(&config.observability)?;
    log_config_info(&config);

    match cli.command {
        Commands::Synth { format, out } => handle_synth(&config, &format, out).await?,
        Commands::Deploy { out_dir } => handle_deploy(&config, out_dir).await?,
        Commands::Outputs { out_dir, stack, format } => {
            let stack = stack.unwrap_or_else(|| config.stack.stack_name());
            handle_outputs(out_dir, &stack, &format).await?
        }
        Commands::Validate => handle_validate(&config)?,
    }

    Ok(())
}

/// Build the topology and its template from validated configuration
pub fn plan(config: &AppConfig) -> anyhow::Result<(Topology, Template)> {
    let resolver = StaticEndpointResolver::from_catalog(&config.stack.endpoints)?;
    let topology = build_topology(config.stack.clone(), resolver)?;
    let template = synthesize(&topology)?;
    Ok((topology, template))
}

async fn handle_synth(config: &AppConfig, format: &str, out: Option<PathBuf>) -> anyhow::Result<()> {
    let format = OutputFormat::parse(format)?;
    let (_, template) = plan(config)?;
    let rendered = render_template(&template, format)?;

    match out {
        Some(path) => {
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Template written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

async fn handle_deploy(config: &AppConfig, out_dir: PathBuf) -> anyhow::Result<()> {
    let (topology, template) = plan(config)?;
    let engine = FileSystemEngine::new(out_dir);
    let receipt = engine.submit(&topology.identity, &template).await?;

    info!(stack = %receipt.stack_name, "Deployment complete");
    println!("Deployed stack {}", receipt.stack_name);
    for (name, value) in &receipt.outputs {
        println!("  {} = {}", name, value);
    }
    Ok(())
}

async fn handle_outputs(out_dir: PathBuf, stack: &str, format: &str) -> anyhow::Result<()> {
    let format = OutputFormat::parse(format)?;
    let record = OutputRegistry::new(out_dir).read(stack).await?;
    print_outputs(&record, format)
}

fn handle_validate(config: &AppConfig) -> anyhow::Result<()> {
    let (topology, template) = plan(config)?;
    println!(
        "Configuration valid: stack {} exposes {} method(s) on stage {} ({} resources)",
        topology.identity.name,
        topology.gateway().integrations().len(),
        topology.stage.name(),
        template.resources.len()
    );
    Ok(())
}
