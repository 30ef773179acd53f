//! shallot CLI
//!
//! Runs the directory, relays and users of a shallot onion-routing network,
//! and drives them from the command line.

mod config;

use clap::{Parser, Subcommand};
use shallot_core::node::{NodeClient, NodeHandle, RegistryNode, RelayNode, UserNode};
use shallot_core::{NetworkPlan, UserId};
use shallot_crypto::{KeyPair, codec};
use shallot_discovery::{DirectoryClient, NodeId};
use std::path::PathBuf;

use config::Config;

/// shallot - layered-encryption message relay
#[derive(Parser)]
#[command(name = "shallot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the directory service
    Registry,

    /// Run one relay
    Relay {
        /// Relay id
        #[arg(long)]
        id: NodeId,
    },

    /// Run one user
    User {
        /// User id
        #[arg(long)]
        id: UserId,
    },

    /// Run a directory, relays and users in one process
    Network {
        /// Number of relays
        #[arg(long, default_value_t = 10)]
        relays: u32,

        /// Number of users
        #[arg(long, default_value_t = 2)]
        users: u32,
    },

    /// Ask a running user to send a message
    Send {
        /// Sending user id
        #[arg(long)]
        from: UserId,

        /// Receiving user id
        #[arg(long)]
        to: UserId,

        /// Message text
        message: String,
    },

    /// Print what a running node last saw
    Inspect {
        #[command(subcommand)]
        target: InspectTarget,
    },

    /// Show configuration and registered relays
    Status,

    /// Generate a fresh key pair
    Keygen,
}

#[derive(Subcommand)]
enum InspectTarget {
    /// Inspect a relay
    Relay {
        /// Relay id
        #[arg(long)]
        id: NodeId,
    },

    /// Inspect a user
    User {
        /// User id
        #[arg(long)]
        id: UserId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    config.validate()?;
    let plan = config.plan()?;

    match cli.command {
        Commands::Registry => run_registry(&plan).await?,
        Commands::Relay { id } => {
            config.check_id("relay", id)?;
            run_relay(id, &plan).await?;
        }
        Commands::User { id } => {
            config.check_id("user", id)?;
            run_user(id, &plan).await?;
        }
        Commands::Network { relays, users } => {
            config.check_id("relay", relays.saturating_sub(1))?;
            config.check_id("user", users.saturating_sub(1))?;
            run_network(relays, users, &plan).await?;
        }
        Commands::Send { from, to, message } => send_message(from, to, &message, &plan).await?,
        Commands::Inspect { target } => inspect(target, &plan).await?,
        Commands::Status => show_status(&config, &plan).await?,
        Commands::Keygen => generate_keypair(),
    }

    Ok(())
}

/// Wait for Ctrl-C
async fn wait_for_shutdown() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}

/// Print what a service handled before it stopped
fn report(name: &str, handle: &NodeHandle) {
    println!("{name}: {}", handle.stats());
}

/// Run the directory until interrupted
async fn run_registry(plan: &NetworkPlan) -> anyhow::Result<()> {
    let registry = RegistryNode::start(plan).await?;
    println!("Directory listening on {}", registry.local_addr());
    wait_for_shutdown().await?;
    report("Directory", registry.handle());
    Ok(())
}

/// Run one relay until interrupted
async fn run_relay(id: NodeId, plan: &NetworkPlan) -> anyhow::Result<()> {
    let relay = RelayNode::start(id, plan).await?;
    println!("Relay {id} listening on {}", relay.local_addr());
    wait_for_shutdown().await?;
    report(&format!("Relay {id}"), relay.handle());
    Ok(())
}

/// Run one user until interrupted
async fn run_user(id: UserId, plan: &NetworkPlan) -> anyhow::Result<()> {
    let user = UserNode::start(id, plan).await?;
    println!("User {id} listening on {}", user.local_addr());
    wait_for_shutdown().await?;
    report(&format!("User {id}"), user.handle());
    Ok(())
}

/// Run a whole network in this process until interrupted
async fn run_network(relays: u32, users: u32, plan: &NetworkPlan) -> anyhow::Result<()> {
    let registry = RegistryNode::start(plan).await?;
    println!("Directory listening on {}", registry.local_addr());

    let mut relay_nodes = Vec::with_capacity(relays as usize);
    for id in 0..relays {
        relay_nodes.push(RelayNode::start(id, plan).await?);
    }
    println!("{relays} relays registered");

    let mut user_nodes = Vec::with_capacity(users as usize);
    for id in 0..users {
        let user = UserNode::start(id, plan).await?;
        println!("User {id} listening on {}", user.local_addr());
        user_nodes.push(user);
    }

    if (relays as usize) < plan.circuit_length {
        tracing::warn!(
            "only {relays} relays for circuits of {}; sends will fail",
            plan.circuit_length
        );
    }

    wait_for_shutdown().await?;
    report("Directory", registry.handle());
    for relay in &relay_nodes {
        report(&format!("Relay {}", relay.node_id()), relay.handle());
    }
    for user in &user_nodes {
        report(&format!("User {}", user.user_id()), user.handle());
    }
    Ok(())
}

/// Ask user `from` to send `message` to user `to`
async fn send_message(
    from: UserId,
    to: UserId,
    message: &str,
    plan: &NetworkPlan,
) -> anyhow::Result<()> {
    // The sender's reply waits for every hop of the circuit.
    let client = NodeClient::with_timeout(plan.send_budget());

    let sender = plan.resolve(plan.user_address(from)?);
    client.send_message(sender, message, to).await?;

    let circuit = client.last_circuit(sender).await?;
    println!("Sent via relays {circuit:?}");
    Ok(())
}

/// Print a node's introspection values
async fn inspect(target: InspectTarget, plan: &NetworkPlan) -> anyhow::Result<()> {
    let client = NodeClient::with_timeout(plan.request_timeout);

    match target {
        InspectTarget::Relay { id } => {
            let addr = plan.resolve(plan.relay_address(id)?);
            client.status(addr).await?;
            println!("Relay {id} ({addr})");
            println!(
                "  Last received encrypted: {}",
                show(client.last_received_encrypted(addr).await?)
            );
            println!(
                "  Last received decrypted: {}",
                show(client.last_received_decrypted(addr).await?)
            );
            println!(
                "  Last destination:        {}",
                show(client.last_destination(addr).await?)
            );
        }
        InspectTarget::User { id } => {
            let addr = plan.resolve(plan.user_address(id)?);
            client.status(addr).await?;
            println!("User {id} ({addr})");
            println!(
                "  Last received: {}",
                show(client.last_received_message(addr).await?)
            );
            println!(
                "  Last sent:     {}",
                show(client.last_sent_message(addr).await?)
            );
            println!("  Last circuit:  {:?}", client.last_circuit(addr).await?);
        }
    }

    Ok(())
}

fn show<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Show configuration and the directory's relay list
async fn show_status(config: &Config, plan: &NetworkPlan) -> anyhow::Result<()> {
    println!("shallot status");
    println!("  Host:           {}", plan.host);
    println!("  Directory:      {}", plan.registry_addr());
    println!(
        "  Relay ports:    {}..{}",
        plan.base_relay_port,
        u32::from(plan.base_relay_port) + u32::from(config.network.max_nodes)
    );
    println!(
        "  User ports:     {}..{}",
        plan.base_user_port,
        u32::from(plan.base_user_port) + u32::from(config.network.max_nodes)
    );
    println!("  Circuit length: {}", plan.circuit_length);
    println!("  Timeout:        {:?}", plan.request_timeout);

    let directory = DirectoryClient::with_timeout(plan.registry_addr(), plan.request_timeout);
    match directory.fetch_relays().await {
        Ok(relays) => {
            println!("  Relays:         {}", relays.len());
            for relay in relays {
                println!("    {:>5}  {}", relay.node_id, relay.public_key);
            }
        }
        Err(e) => println!("  Directory unreachable: {e}"),
    }

    Ok(())
}

/// Print a fresh encoded key pair
fn generate_keypair() {
    let pair = KeyPair::generate(&mut rand_core::OsRng);
    println!("Public key:  {}", codec::encode_public_key(pair.public_key()));
    if let Some(private) = codec::encode_private_key(Some(pair.private_key())) {
        println!("Private key: {private}");
    }
}
