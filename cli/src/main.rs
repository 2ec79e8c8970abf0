//! Gatelink Control CLI
//!
//! Issues and inspects authentication credentials with the gateway's shared
//! secret, and breaks client identities into their fields.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use gatelink_crypto::CipherSuite;
use gatelink_gate::{ClientId, CredentialCodec, GateConfig};
use gatelink_protocol::{Action, AuthCredentials, ClientTicket, EncryptedCredential, Message};
use std::time::{SystemTime, UNIX_EPOCH};
use tabled::{Table, Tabled};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "gatelinkctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to gateway configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Shared secret (overrides auth.secret)
    #[arg(long)]
    secret: Option<String>,

    /// Cipher name (overrides auth.cipher)
    #[arg(long)]
    cipher: Option<String>,

    /// Run in verbose mode
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a credential the way the business service does
    Issue {
        /// User id
        #[arg(long)]
        user: String,
        /// Device id
        #[arg(long, default_value = "")]
        device: String,
        /// Client type
        #[arg(long = "type", default_value_t = 0)]
        client_type: i32,
        /// Client connection id
        #[arg(long, default_value = "")]
        connection: String,
        /// Ticket secret
        #[arg(long)]
        ticket: Option<String>,
        /// Issuance timestamp (defaults to now, seconds)
        #[arg(long)]
        timestamp: Option<i64>,
        /// Wrap the credential in an authenticate message
        #[arg(long)]
        message: bool,
    },
    /// Decrypt a credential (bare base64, credential JSON or authenticate message JSON)
    Inspect {
        credential: String,
    },
    /// Show the fields of a client identity
    Id {
        id: String,
    },
}

#[derive(Tabled)]
struct FieldRow {
    field: &'static str,
    value: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Commands::Issue {
            ref user,
            ref device,
            client_type,
            ref connection,
            ref ticket,
            timestamp,
            message,
        } => {
            let codec = codec(&args).await?;
            let credentials = AuthCredentials {
                client_type,
                user_id: user.clone(),
                device_id: device.clone(),
                ticket: ticket.clone().map(|secret| ClientTicket { secret }),
                connection_id: connection.clone(),
                timestamp: timestamp.unwrap_or_else(now_secs),
            };

            let encrypted = codec.issue(&credentials)?;
            info!("Issued credential for {} with {}", user, codec.suite());

            let output = if message {
                serde_json::to_string(&Message::new(0, Action::authenticate(), &encrypted)?)?
            } else {
                serde_json::to_string(&encrypted)?
            };
            println!("{}", output);
        }
        Commands::Inspect { ref credential } => {
            let codec = codec(&args).await?;
            let encrypted = parse_credential(credential)?;
            debug!("Credential version {}", encrypted.version);

            let credentials = codec.decrypt(&encrypted)?;
            println!("{}", serde_json::to_string_pretty(&credentials)?);
        }
        Commands::Id { ref id } => {
            let id = ClientId::parse(id);
            let rows = vec![
                FieldRow {
                    field: "gateway",
                    value: id.gateway().to_string(),
                },
                FieldRow {
                    field: "user",
                    value: id.user().to_string(),
                },
                FieldRow {
                    field: "device",
                    value: id.device().to_string(),
                },
                FieldRow {
                    field: "temporary",
                    value: id.is_temporary().to_string(),
                },
                FieldRow {
                    field: "well_formed",
                    value: id.is_well_formed().to_string(),
                },
            ];
            println!("{}", Table::new(rows));
        }
    }

    Ok(())
}

/// Build the credential codec from the config file and command-line overrides
async fn codec(args: &Args) -> Result<CredentialCodec> {
    let mut config = match &args.config {
        Some(path) => GateConfig::load(path)
            .await
            .with_context(|| format!("loading {}", path))?,
        None => GateConfig::default(),
    };

    if let Some(secret) = &args.secret {
        config.auth.secret = Some(secret.clone());
    }
    if let Some(name) = &args.cipher {
        config.auth.cipher =
            CipherSuite::from_name(name).ok_or_else(|| anyhow!("unknown cipher {}", name))?;
    }

    Ok(CredentialCodec::new(config.auth.build_cipher()?))
}

/// Accept an authenticate message, a credential object or a bare base64 string
fn parse_credential(input: &str) -> Result<EncryptedCredential> {
    let input = input.trim();
    if let Ok(message) = serde_json::from_str::<Message>(input) {
        if message.action.is(Action::AUTHENTICATE) {
            return Ok(message.data_as()?);
        }
    }
    if let Ok(credential) = serde_json::from_str::<EncryptedCredential>(input) {
        return Ok(credential);
    }
    Ok(EncryptedCredential {
        version: 0,
        credential: input.to_string(),
    })
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
