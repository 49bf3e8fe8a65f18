//! event-anchor command line.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                           event-anchor                           │
//!   │                                                                  │
//!   │  ┌─────────┐   ┌─────────┐   ┌─────────────┐   ┌──────────────┐  │
//!   │  │ record  │──▶│ signer  │──▶│ chain       │──▶│ anchor       │──┼──▶ ledger
//!   │  │ Event / │   │ Wallet  │   │ EventChain  │   │ AnchorClient │  │
//!   │  │ Message │   └─────────┘   │ anchor_map  │   └──────────────┘  │
//!   │  └────┬────┘                 └─────────────┘                     │
//!   │       │ SignedMessage                                            │
//!   │       ▼                                                          │
//!   │  ┌─────────────┐                                                 │
//!   │  │ RelayClient │─────────────────────────────────────────────────┼──▶ relay
//!   │  └─────────────┘                                                 │
//!   │                                                                  │
//!   │  config · observability · lifecycle · session                    │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use alloy::primitives::{Address, B256};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;

use event_anchor::blockchain::{BlockchainClient, Wallet};
use event_anchor::chain::EventChain;
use event_anchor::config::{load_config, AppConfig};
use event_anchor::lifecycle::{shutdown_on_signal, Shutdown};
use event_anchor::observability::{logging, metrics};
use event_anchor::record::{Event, MediaType, Meta, SignedEvent, SignedMessage};
use event_anchor::relay::{ListOptions, RelayServer};
use event_anchor::session::Session;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "event-anchor")]
#[command(about = "Sign, chain, anchor and relay event records", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network the wallet is on (defaults to the anchor target).
    #[arg(long, global = true)]
    network: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay liveness and RPC chain id
    Status,
    /// Event chain operations
    #[command(subcommand)]
    Event(EventCommand),
    /// Relay message operations
    #[command(subcommand)]
    Message(MessageCommand),
    /// Verify a signed event or message stored as JSON
    Verify { file: PathBuf },
    /// Reference relay server
    #[command(subcommand)]
    Relay(RelayCommand),
}

#[derive(Subcommand)]
enum EventCommand {
    /// Sign and append an event to a chain file
    Append(AppendArgs),
    /// Anchor the current state of a chain
    Anchor {
        #[arg(long)]
        chain: PathBuf,
    },
    /// Verify a chain file and print its anchor map
    Show {
        #[arg(long)]
        chain: PathBuf,
    },
}

#[derive(Args)]
struct AppendArgs {
    /// Chain file; created when missing.
    #[arg(long)]
    chain: PathBuf,
    /// Chain identifier, required when the chain file does not exist yet.
    #[arg(long)]
    chain_id: Option<String>,
    /// Event payload.
    #[arg(long)]
    data: String,
    #[arg(long, default_value = MediaType::JSON)]
    media_type: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long = "type")]
    kind: Option<String>,
}

#[derive(Subcommand)]
enum MessageCommand {
    /// Sign a message and submit it to the relay
    Send(SendArgs),
    /// List messages addressed to ADDR (defaults to the wallet address)
    List {
        address: Option<Address>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Fetch a full message
    Get {
        address: Address,
        hash: B256,
        /// Download and inline an externally stored payload.
        #[arg(long)]
        resolve: bool,
    },
}

#[derive(Args)]
struct SendArgs {
    #[arg(long)]
    to: Address,
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    content: Option<String>,
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long)]
    media_type: Option<String>,
    #[arg(long)]
    title: Option<String>,
    /// Also anchor the message hash.
    #[arg(long)]
    anchor: bool,
}

#[derive(Subcommand)]
enum RelayCommand {
    /// Run the reference relay until interrupted
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("warning: logging not initialized: {}", e);
    }

    match run(cli.command, cli.network, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, network: Option<u64>, config: AppConfig) -> CliResult {
    match command {
        Commands::Status => status(&config).await,
        Commands::Event(command) => {
            let session = connect(config, network).await?;
            match command {
                EventCommand::Append(args) => append_event(&session, args).await,
                EventCommand::Anchor { chain } => {
                    let chain = read_chain(&chain)?;
                    let result = session.anchor_chain(&chain).await?;
                    print_json(&result)
                }
                EventCommand::Show { chain } => show_chain(&chain),
            }
        }
        Commands::Message(command) => match command {
            MessageCommand::Send(args) => {
                let session = connect(config, network).await?;
                send_message(&session, args).await
            }
            MessageCommand::List {
                address,
                limit,
                offset,
            } => {
                let session = Session::new(config)?;
                let address = match address {
                    Some(address) => address,
                    None => load_wallet(session.config(), network)?.address(),
                };
                let limit = limit.unwrap_or(session.config().relay.message_limit);
                let summaries = session
                    .relay()
                    .list_summaries(address, ListOptions::new(limit).offset(offset))
                    .await?;
                print_json(&summaries)
            }
            MessageCommand::Get {
                address,
                hash,
                resolve,
            } => {
                let session = Session::new(config)?;
                let mut message = session.relay().fetch_full(address, hash).await?;
                if resolve {
                    message = session.relay().resolve(message).await?;
                }
                if !message.verify() {
                    tracing::warn!(hash = %hash, "Fetched message does not verify");
                }
                print_json(&message)
            }
        },
        Commands::Verify { file } => verify_file(&file),
        Commands::Relay(RelayCommand::Serve { bind }) => serve(config, bind).await,
    }
}

fn load_wallet(config: &AppConfig, network: Option<u64>) -> CliResult<Wallet> {
    let chain_id = network.unwrap_or(config.anchor.target_chain_id);
    Ok(Wallet::from_env(chain_id)?)
}

async fn connect(config: AppConfig, network: Option<u64>) -> CliResult<Session> {
    let wallet = load_wallet(&config, network)?;
    let mut session = Session::new(config)?;
    session.connect_wallet(wallet).await?;
    Ok(session)
}

async fn status(config: &AppConfig) -> CliResult {
    let session = Session::new(config.clone())?;
    match session.relay().health().await {
        Ok(status) => println!(
            "relay    {}  {} (v{}, {} messages)",
            session.relay().base_url(),
            status.status,
            status.version,
            status.messages
        ),
        Err(e) => println!("relay    {}  unavailable: {}", session.relay().base_url(), e),
    }

    if config.anchor.simulate {
        println!("anchor   simulated (chain {})", config.anchor.target_chain_id);
        return Ok(());
    }

    match config.target_network() {
        Some(network) => {
            let client = BlockchainClient::new(network.clone(), config.anchor.rpc_timeout_secs)?;
            match client.verify_chain_id().await {
                Ok(()) => println!(
                    "rpc      {}  chain {} (contract {})",
                    network.rpc_url,
                    network.chain_id,
                    network.anchor_contract.as_deref().unwrap_or("none")
                ),
                Err(e) => println!("rpc      {}  {}", network.rpc_url, e),
            }
        }
        None => println!("rpc      no network for chain {}", config.anchor.target_chain_id),
    }
    Ok(())
}

fn read_chain(path: &Path) -> CliResult<EventChain> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_chain(path: &Path, chain: &EventChain) -> CliResult {
    std::fs::write(path, serde_json::to_string_pretty(chain)?)?;
    Ok(())
}

async fn append_event(session: &Session, args: AppendArgs) -> CliResult {
    let mut chain = if args.chain.exists() {
        read_chain(&args.chain)?
    } else {
        let id = args
            .chain_id
            .ok_or("--chain-id is required to start a new chain")?;
        session.new_chain(id)?
    };

    let meta = Meta {
        kind: args.kind,
        title: args.title,
        ..Meta::default()
    };
    let media_type: MediaType = args.media_type.parse()?;
    let event = Event::create(args.data.into_bytes(), media_type, Some(meta))?;

    let signed = session.append_event(&mut chain, event).await?;
    write_chain(&args.chain, &chain)?;

    println!("{}", signed.hash());
    Ok(())
}

fn show_chain(path: &Path) -> CliResult {
    let chain = read_chain(path)?;
    print_json(&serde_json::json!({
        "id": chain.id(),
        "owner": chain.owner(),
        "events": chain.len(),
        "head": chain.head(),
        "anchor_map": chain.anchor_map(),
    }))
}

async fn send_message(session: &Session, args: SendArgs) -> CliResult {
    let (payload, default_media) = match (args.content, args.file) {
        (Some(text), _) => (text.into_bytes(), MediaType::text()),
        (None, Some(path)) => (std::fs::read(path)?, MediaType::binary()),
        (None, None) => return Err("either --content or --file is required".into()),
    };
    let media_type = match args.media_type {
        Some(value) => value.parse()?,
        None => default_media,
    };
    let meta = args.title.map(Meta::titled);

    let message = session
        .compose_message(args.to, payload, media_type, meta)
        .await?;
    let hash = session.send_message(&message).await?;
    println!("{}", hash);

    if args.anchor {
        let result = session.anchor_message(&message).await?;
        print_json(&result)?;
    }
    Ok(())
}

fn verify_file(path: &Path) -> CliResult {
    let content = std::fs::read_to_string(path)?;

    let (kind, valid, hash) = if let Ok(event) = serde_json::from_str::<SignedEvent>(&content) {
        ("event", event.verify(), event.hash())
    } else {
        let message: SignedMessage = serde_json::from_str(&content)?;
        ("message", message.verify(), message.hash())
    };

    println!("{} {} {}", kind, hash, if valid { "valid" } else { "INVALID" });
    if valid {
        Ok(())
    } else {
        Err(format!("{} signature does not verify", kind).into())
    }
}

async fn serve(mut config: AppConfig, bind: Option<String>) -> CliResult {
    if let Some(bind) = bind {
        config.relay_server.bind_address = bind;
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.relay_server.bind_address).await?;
    let server = RelayServer::new(&config.relay_server);

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    server.run(listener, &shutdown).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
