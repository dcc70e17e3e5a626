//! ysafe command-line client
//!
//! ## Usage
//!
//! ```bash
//! # Credentials from the environment
//! export YSAFE_TOKEN=... YSAFE_PIN=123456
//!
//! ysafe whoami
//! ysafe folder create proj_abc
//! ysafe folder policy proj_abc
//! ysafe folder set-policy proj_abc --max-size 1073741824 --remove-older-versions true
//! ysafe pin add ci-runner --pin 654321 --expiry 86400
//! ysafe pin delete ci-runner --token-data <b64> --id <b64>
//! ```

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use ysafe_client::protocol::{AllowedPinOp, Status};
use ysafe_client::{
    AccessToken, Config, Credentials, FolderPolicy, NewPin, PolicyField, SessionConfig,
    SessionRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "ysafe")]
#[command(about = "Client for the ysafe file service")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service WebSocket URL (overrides config)
    #[arg(long, env = "YSAFE_ENDPOINT")]
    endpoint: Option<String>,

    /// Base64 token generated with the pin
    #[arg(long, env = "YSAFE_TOKEN", hide_env_values = true)]
    token: String,

    /// Six-digit pin
    #[arg(long, env = "YSAFE_PIN", hide_env_values = true)]
    pin: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and print the account identity
    Whoami,
    /// Folder operations
    #[command(subcommand)]
    Folder(FolderCommand),
    /// Access-token (pin) operations
    #[command(subcommand)]
    Pin(PinCommand),
}

#[derive(Subcommand, Debug)]
enum FolderCommand {
    /// Show the lookup status of a folder
    Stat { name: String },
    /// Create a folder under the root
    Create { name: String },
    /// Move a folder to the trash
    Remove { name: String },
    /// Print a folder's policy attributes
    Policy { name: String },
    /// Encode a policy update for the given attributes
    SetPolicy {
        name: String,
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct PolicyArgs {
    /// Maximum size of the folder including all files and versions
    #[arg(long)]
    max_size: Option<u64>,
    /// Maximum size of a single file
    #[arg(long)]
    max_file_size: Option<u64>,
    /// Versions kept per file
    #[arg(long)]
    max_file_versions: Option<u64>,
    /// Prune older versions as new ones are uploaded
    #[arg(long)]
    remove_older_versions: Option<bool>,
    /// Seconds before a file is deleted after its latest change
    #[arg(long)]
    default_ttl_for_files: Option<u64>,
}

impl PolicyArgs {
    fn into_policy(self) -> FolderPolicy {
        FolderPolicy {
            max_size: self.max_size,
            max_file_size: self.max_file_size,
            max_file_versions: self.max_file_versions,
            remove_older_versions: self.remove_older_versions,
            default_ttl_for_files: self.default_ttl_for_files,
        }
    }
}

#[derive(Subcommand, Debug)]
enum PinCommand {
    /// Create a secondary pin and print its token material
    Add {
        label: String,
        #[arg(long)]
        pin: String,
        /// Seconds the pin is valid from creation
        #[arg(long)]
        expiry: Option<u64>,
        #[arg(long = "op", value_parser = parse_op)]
        ops: Vec<AllowedPinOp>,
    },
    /// Delete a secondary pin
    Delete {
        label: String,
        #[command(flatten)]
        material: TokenMaterial,
    },
    /// Replace the operations a pin may perform
    UpdateOps {
        label: String,
        #[command(flatten)]
        material: TokenMaterial,
        #[arg(long = "op", value_parser = parse_op)]
        ops: Vec<AllowedPinOp>,
    },
}

#[derive(ClapArgs, Debug)]
struct TokenMaterial {
    /// Base64 token returned by `pin add`
    #[arg(long)]
    token_data: String,
    /// Base64 id returned by `pin add`
    #[arg(long, default_value = "")]
    id: String,
}

fn parse_op(value: &str) -> Result<AllowedPinOp, String> {
    match value {
        "read" => Ok(AllowedPinOp::Read),
        "write" => Ok(AllowedPinOp::Write),
        "delete" => Ok(AllowedPinOp::Delete),
        "list" => Ok(AllowedPinOp::List),
        other => Err(format!("unknown operation '{}'", other)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ysafe_client=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load config
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(ysafe_client::config::default_config_path);
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // Apply CLI overrides
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    debug!(config = ?config, "Configuration loaded");
    config
        .endpoint_url()
        .with_context(|| format!("invalid endpoint '{}'", config.endpoint))?;

    let registry = SessionRegistry::new(SessionConfig::from(&config));
    let credentials = Credentials::new(args.token, args.pin);
    let session = registry
        .get_or_connect(&credentials)
        .await
        .context("failed to create client; check the token and pin")?;
    debug!(endpoint = %session.endpoint(), email = %session.email(), "Session ready");

    match args.command {
        Command::Whoami => println!("{}", session.email()),
        Command::Folder(cmd) => run_folder(&session, cmd).await?,
        Command::Pin(cmd) => run_pin(&session, cmd).await?,
    }

    session.disconnect().await;
    info!("Done");
    Ok(())
}

async fn run_folder(session: &ysafe_client::Session, cmd: FolderCommand) -> anyhow::Result<()> {
    let folders = session.folders();
    match cmd {
        FolderCommand::Stat { name } => {
            let lookup = folders.stat(&name).await?;
            match Status::try_from(lookup.status) {
                Ok(status) => println!("{}: {:?}", name, status),
                Err(_) => println!("{}: unknown status {}", name, lookup.status),
            }
        }
        FolderCommand::Create { name } => {
            folders.create(&name).await?;
            println!("created /{}", name);
        }
        FolderCommand::Remove { name } => {
            folders.remove(&name).await?;
            println!("removed /{}", name);
        }
        FolderCommand::Policy { name } => {
            let policy = folders.policy(&name).await?;
            print_policy(&policy);
        }
        FolderCommand::SetPolicy { name, policy } => {
            let desired = policy.into_policy();
            let current = folders.policy(&name).await?;
            let changed = desired.changed_fields(&current);
            let update = folders
                .prepare_policy_update(&name, &desired, &changed)
                .await?;
            for attr in &update.attr_to_value {
                println!("{} = {:02x?}", attr.attribute, attr.value);
            }
        }
    }
    Ok(())
}

async fn run_pin(session: &ysafe_client::Session, cmd: PinCommand) -> anyhow::Result<()> {
    let pins = session.pins();
    match cmd {
        PinCommand::Add {
            label,
            pin,
            expiry,
            ops,
        } => {
            let token = pins
                .add(NewPin {
                    label,
                    pin,
                    expiry,
                    allowed_ops: ops,
                    allowed_objects: Vec::new(),
                })
                .await?;
            println!("label = {}", token.label);
            println!("token = {}", token.token);
            println!("id_sent_to_client = {}", token.id_sent_to_client);
        }
        PinCommand::Delete { label, material } => {
            pins.delete(&access_token(label, material)).await?;
        }
        PinCommand::UpdateOps {
            label,
            material,
            ops,
        } => {
            pins.update_ops(&access_token(label, material), &ops, Vec::new())
                .await?;
        }
    }
    Ok(())
}

fn access_token(label: String, material: TokenMaterial) -> AccessToken {
    AccessToken {
        label,
        token: material.token_data,
        id_sent_to_client: material.id,
    }
}

fn print_policy(policy: &FolderPolicy) {
    if policy.is_empty() {
        println!("(no policy attributes set)");
        return;
    }
    let show = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            println!("{} = {}", name, value);
        }
    };
    show(PolicyField::MaxSize.name(), policy.max_size.map(|v| v.to_string()));
    show(PolicyField::MaxFileSize.name(), policy.max_file_size.map(|v| v.to_string()));
    show(PolicyField::MaxFileVersions.name(), policy.max_file_versions.map(|v| v.to_string()));
    show(
        PolicyField::RemoveOlderVersions.name(),
        policy.remove_older_versions.map(|v| v.to_string()),
    );
    show(
        PolicyField::DefaultTtlForFiles.name(),
        policy.default_ttl_for_files.map(|v| v.to_string()),
    );
}
