//! # Command Line Interface
//!
//! `envref resolve` materializes an env file, `envref check` reports which
//! references resolve, `envref secret` manages values in one backend and
//! `envref backends` shows the fallback order.

pub mod output;
pub mod secret;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::envfile::EnvDocument;
use crate::observability::{init_logging, LogFormat};
use crate::resolver::{resolve, ResolveResult};
use crate::secrets::BackendRegistry;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "envref")]
#[command(about = "Resolve ref:// secret references in env files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to envref.toml (default: searched upwards from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log format: text or json
    #[arg(long, global = true, env = "ENVREF_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve all references and print the materialized env
    Resolve(ResolveArgs),

    /// Report which references resolve, without printing values
    Check(SourceArgs),

    /// Manage secrets in a single backend
    Secret {
        #[command(subcommand)]
        command: secret::SecretCommands,
    },

    /// List configured backends in fallback order
    Backends,
}

/// Which env file to read.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Env file to resolve (overrides the configured file and profile)
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Profile whose env file to resolve
    #[arg(long, env = "ENVREF_PROFILE")]
    pub profile: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Env)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit output even when some references failed
    #[arg(long)]
    pub allow_partial: bool,
}

/// Run CLI commands
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_format);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve(args) => handle_resolve(&config, args).await,
        Commands::Check(args) => handle_check(&config, args).await,
        Commands::Secret { command } => {
            let registry = build_registry(&config).await?;
            secret::handle_secret_command(command, &registry, &config.project).await
        }
        Commands::Backends => handle_backends(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<ProjectConfig> {
    match path {
        Some(path) => ProjectConfig::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("Unable to determine current directory")?;
            ProjectConfig::discover(&cwd).context("Failed to load project configuration")
        }
    }
}

async fn build_registry(config: &ProjectConfig) -> Result<BackendRegistry> {
    config.build_registry().await.context("Failed to initialise secret backends")
}

/// Parse the selected env file and resolve it.
async fn resolve_source(config: &ProjectConfig, source: &SourceArgs) -> Result<ResolveResult> {
    let path = match &source.env_file {
        Some(path) => path.clone(),
        None => config.env_file_path(source.profile.as_deref())?,
    };

    let document = EnvDocument::load(&path)
        .await
        .with_context(|| format!("Failed to load env file: {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        entries = document.len(),
        references = document.references().count(),
        "Parsed env file"
    );

    let registry = build_registry(config).await?;
    Ok(resolve(&document, &registry, &config.project).await?)
}

async fn handle_resolve(config: &ProjectConfig, args: ResolveArgs) -> Result<()> {
    let result = resolve_source(config, &args.source).await?;

    if !result.is_resolved() {
        for err in &result.errors {
            eprintln!("error: {}", err);
        }
        if !args.allow_partial {
            anyhow::bail!("{} secret reference(s) could not be resolved", result.errors.len());
        }
    }

    let rendered = output::render(&result.entries, args.format)?;
    match args.output {
        Some(path) => {
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote resolved env file");
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

async fn handle_check(config: &ProjectConfig, args: SourceArgs) -> Result<()> {
    let result = resolve_source(config, &args).await?;

    print!("{}", output::render_check(&result, std::io::stdout().is_terminal()));

    if !result.is_resolved() {
        anyhow::bail!("{} secret reference(s) could not be resolved", result.errors.len());
    }
    Ok(())
}

fn handle_backends(config: &ProjectConfig) -> Result<()> {
    if config.backends.is_empty() {
        println!("No backends configured");
        return Ok(());
    }

    println!("Project: {}", config.project);
    for (position, backend) in config.backends.iter().enumerate() {
        println!("{:>3}. {:<20} {}", position + 1, backend.name, backend.kind.type_name());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve_flags() {
        let cli = Cli::try_parse_from([
            "envref",
            "--verbose",
            "resolve",
            "--profile",
            "prod",
            "--format",
            "json",
            "--allow-partial",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.source.profile.as_deref(), Some("prod"));
                assert_eq!(args.format, OutputFormat::Json);
                assert!(args.allow_partial);
                assert!(args.output.is_none());
            }
            _ => panic!("expected resolve command"),
        }
    }

    #[test]
    fn test_parse_secret_set() {
        let cli = Cli::try_parse_from([
            "envref", "secret", "set", "--backend", "keychain", "db_pass", "s3cret",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Secret { command: secret::SecretCommands::Set { ref backend, ref key, .. } }
                if backend == "keychain" && key == "db_pass"
        ));
    }

    #[tokio::test]
    async fn test_resolve_source_with_explicit_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join("custom.env");
        std::fs::write(&env_path, "HOST=localhost\nDB_PASS=ref://scratch/db_pass\n").unwrap();

        let config = ProjectConfig::from_toml_str(
            r#"
project = "myapp"

[[backends]]
name = "scratch"
type = "memory"
values = { "myapp/db_pass" = "s3cret" }
"#,
            dir.path(),
        )
        .unwrap();

        let source = SourceArgs { env_file: Some(env_path), profile: None };
        let result = resolve_source(&config, &source).await.unwrap();

        assert!(result.is_resolved());
        assert_eq!(result.get("DB_PASS").unwrap().value, "s3cret");
    }
}
