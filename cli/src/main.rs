//! Agent Studio CLI: manage Power Platform environments and Copilot Studio
//! solutions through the Power Platform CLI (`pac`).
//!
//! All real work is delegated to `pac` via `PacFacade`; this binary only parses
//! arguments, prints results, and remembers a little local state.

use std::path::{Path, PathBuf};

use agent_studio::{DEFAULT_PROFILE_NAME, LocalState, PacFacade, StudioConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "agent-studio.toml";
const STATE_FILE: &str = "state.toml";
const APP_DIR: &str = "agent-studio";
const PAC_INSTALL_URL: &str = "https://learn.microsoft.com/power-platform/developer/cli/introduction";

/// Agent Studio: manage Power Platform environments and Copilot Studio solutions.
#[derive(Parser)]
#[command(
    name = "agent-studio",
    version,
    about = "Manage Power Platform environments and Copilot Studio solutions"
)]
struct Cli {
    /// Path to agent-studio.toml [default: ./agent-studio.toml or ~/.config/agent-studio/agent-studio.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage Power Platform authentication
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Manage Power Platform environments
    #[command(alias = "environment")]
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
    /// Manage Power Platform solutions
    #[command(alias = "sol")]
    Solution {
        #[command(subcommand)]
        command: SolutionCommands,
    },
    /// Check that the Power Platform CLI is installed and print its version
    Doctor,
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Authenticate to a Power Platform environment
    Login {
        /// Environment URL (must start with https://)
        #[arg(short, long)]
        url: String,
        /// Profile name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List authentication profiles
    List,
    /// Select an authentication profile
    Select {
        /// Profile name or index
        name: String,
    },
}

#[derive(Subcommand)]
enum EnvCommands {
    /// List available environments
    List,
    /// Remember an environment URL as the default
    Use {
        /// Environment URL
        url: String,
    },
}

#[derive(Subcommand)]
enum SolutionCommands {
    /// List solutions in the current environment
    List,
    /// Export a solution
    Export {
        /// Solution unique name
        name: String,
        /// Output file path
        #[arg(short, long, default_value = "./solution.zip")]
        output: PathBuf,
        /// Export as managed solution
        #[arg(short, long)]
        managed: bool,
    },
    /// Import a solution
    Import {
        /// Path to solution zip file
        path: PathBuf,
        /// Do not activate plugins after import
        #[arg(long)]
        no_activate: bool,
    },
    /// Clone a solution to a local directory
    Clone {
        /// Solution unique name
        name: String,
        /// Output directory
        #[arg(short, long, default_value = "./")]
        output: PathBuf,
    },
    /// Show recently exported or cloned solutions
    Recent,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with env filter (RUST_LOG controls verbosity)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match resolve_config(cli.config)? {
        Some(path) => load_config(&path).await?,
        None => StudioConfig::default(),
    };

    // One facade for the whole process, passed by reference to every handler.
    let facade = PacFacade::from_config(&config).context("Invalid configuration")?;
    let state_path = state_path();

    match cli.command {
        Commands::Auth { command } => run_auth(&facade, command, state_path.as_deref()).await,
        Commands::Env { command } => run_env(&facade, command, state_path.as_deref()).await,
        Commands::Solution { command } => {
            run_solution(&facade, command, state_path.as_deref()).await
        }
        Commands::Doctor => run_doctor(&facade).await,
    }
}

async fn run_auth(facade: &PacFacade, command: AuthCommands, state: Option<&Path>) -> Result<()> {
    match command {
        AuthCommands::Login { url, name } => {
            ensure_installed(facade).await?;

            let name = name.unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string());
            facade
                .authenticate(&url, Some(&name))
                .await
                .context("Authentication failed")?;
            println!("Successfully authenticated to {}", url);

            update_state(state, |s| s.set_last_used_profile(name)).await;
        }
        AuthCommands::List => {
            let profiles = facade.list_auth_profiles().await;
            if profiles.is_empty() {
                println!("No authentication profiles found");
                println!("Run \"agent-studio auth login\" to authenticate");
                return Ok(());
            }

            println!("\nAuthentication Profiles:\n");
            for profile in profiles {
                let active = if profile.is_active { " ✓ (active)" } else { "" };
                println!("{} - {}{}", profile.name, profile.url, active);
            }
            println!();
        }
        AuthCommands::Select { name } => {
            facade
                .select_auth_profile(&name)
                .await
                .context("Error selecting profile")?;
            println!("Selected profile: {}", name);

            update_state(state, |s| s.set_last_used_profile(name)).await;
        }
    }
    Ok(())
}

async fn run_env(facade: &PacFacade, command: EnvCommands, state: Option<&Path>) -> Result<()> {
    match command {
        EnvCommands::List => {
            let environments = facade.list_environments().await.context(
                "Error listing environments. Make sure you are authenticated with \"agent-studio auth login\"",
            )?;
            if environments.is_empty() {
                println!("No environments found");
                println!("Make sure you are authenticated with \"agent-studio auth login\"");
                return Ok(());
            }

            println!("\nAvailable Environments:\n");
            for env in environments {
                println!("{} - {}", env.display_name, env.url);
            }
            println!();
        }
        EnvCommands::Use { url } => {
            if !url.starts_with("https://") {
                anyhow::bail!("URL must start with https://");
            }
            println!("Default environment: {}", url);
            update_state(state, |s| s.set_default_environment(url)).await;
        }
    }
    Ok(())
}

async fn run_solution(
    facade: &PacFacade,
    command: SolutionCommands,
    state: Option<&Path>,
) -> Result<()> {
    match command {
        SolutionCommands::List => {
            let solutions = facade.list_solutions().await;
            if solutions.is_empty() {
                println!("No solutions found in current environment");
                return Ok(());
            }

            println!("\nAvailable Solutions:\n");
            for sol in solutions {
                println!("{} - {}", sol.unique_name, sol.friendly_name);
            }
            println!();
        }
        SolutionCommands::Export {
            name,
            output,
            managed,
        } => {
            let output = absolute(&output)?;
            println!("Exporting solution \"{}\"...", name);
            facade
                .export_solution(&name, &output, managed)
                .await
                .context("Export failed")?;
            println!("Solution exported to: {}", output);

            update_state(state, |s| s.add_recent_solution(&name)).await;
        }
        SolutionCommands::Import { path, no_activate } => {
            let path = absolute(&path)?;
            println!("Importing solution from \"{}\"...", path);
            facade
                .import_solution(&path, !no_activate)
                .await
                .context("Import failed")?;
            println!("Solution imported successfully");
        }
        SolutionCommands::Clone { name, output } => {
            let output = absolute(&output)?;
            println!("Cloning solution \"{}\"...", name);
            facade
                .clone_solution(&name, &output)
                .await
                .context("Clone failed")?;
            println!("Solution cloned to: {}", output);

            update_state(state, |s| s.add_recent_solution(&name)).await;
        }
        SolutionCommands::Recent => {
            let Some(path) = state else {
                println!("No recent solutions");
                return Ok(());
            };
            let local = LocalState::load(path).await?;
            if local.recent_solutions().is_empty() {
                println!("No recent solutions");
                return Ok(());
            }
            for name in local.recent_solutions() {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

async fn run_doctor(facade: &PacFacade) -> Result<()> {
    ensure_installed(facade).await?;
    println!("Configured tool: {}", facade.program());
    Ok(())
}

/// Fail with install guidance unless `pac --version` succeeds; print the version.
async fn ensure_installed(facade: &PacFacade) -> Result<()> {
    if !facade.is_installed().await {
        eprintln!("PAC CLI is not installed");
        eprintln!("\nPlease install PAC CLI first:");
        eprintln!("{}", PAC_INSTALL_URL);
        anyhow::bail!("'{}' is not available", facade.program());
    }

    let version = facade.version().await?;
    println!("PAC CLI version: {}", version);
    Ok(())
}

/// Load, mutate, and save local state. Persistence failures are logged, not fatal.
async fn update_state(path: Option<&Path>, mutate: impl FnOnce(&mut LocalState)) {
    let Some(path) = path else {
        tracing::warn!("no config directory available; local state not saved");
        return;
    };

    let mut local = match LocalState::load(path).await {
        Ok(local) => local,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable local state");
            LocalState::default()
        }
    };
    mutate(&mut local);
    if let Err(e) = local.save(path).await {
        tracing::warn!(error = %e, "failed to save local state");
    }
}

fn state_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(STATE_FILE))
}

fn absolute(path: &Path) -> Result<String> {
    let resolved = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve path {:?}", path))?;
    Ok(resolved.display().to_string())
}

/// Resolve config file path: explicit flag → ./agent-studio.toml →
/// ~/.config/agent-studio/agent-studio.toml. `None` means built-in defaults.
fn resolve_config(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file {:?} does not exist", path);
        }
        return Ok(Some(path));
    }

    let local = Path::new(CONFIG_FILE);
    if local.exists() {
        return Ok(Some(local.to_path_buf()));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let xdg = config_dir.join(APP_DIR).join(CONFIG_FILE);
        if xdg.exists() {
            return Ok(Some(xdg));
        }
    }

    Ok(None)
}

/// Load and parse an agent-studio.toml config file.
async fn load_config(config_path: &Path) -> Result<StudioConfig> {
    let content = tokio::fs::read_to_string(config_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", config_path, e))?;
    let config: StudioConfig = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file {:?}: {}", config_path, e))?;
    Ok(config)
}
