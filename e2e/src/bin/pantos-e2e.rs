//! Operator CLI for the e2e harness: bring stacks up, tear them down, or
//! wait for service-node readiness without running the test suite.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pantos_e2e::{
    poller,
    stack::{self, ComponentConfig, StackConfig, StackId},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(about)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bring up the contracts, service-node and validator-node stacks.
    Up(UpArgs),
    /// Dump logs and remove the stacks for a stack identifier.
    Down(DownArgs),
    /// Poll the service node until it advertises bids.
    Wait,
}

#[derive(Args, Debug)]
struct UpArgs {
    /// Number of service node instances.
    #[clap(long, default_value_t = 2)]
    service_nodes: u32,

    /// Number of validator node instances.
    #[clap(long, default_value_t = 1)]
    validator_nodes: u32,

    /// Stack identifier to use instead of a random one.
    #[clap(long)]
    stack_id: Option<String>,

    /// Port group for running several stacks side by side.
    #[clap(long, default_value_t = 0)]
    port_group: u32,
}

#[derive(Args, Debug)]
struct DownArgs {
    /// Stack identifier the stacks were brought up with.
    #[clap(long)]
    stack_id: String,
}

fn init_tracing() {
    let default_level = match std::env::var("DEBUG") {
        Ok(value) if value.eq_ignore_ascii_case("true") => "debug",
        _ => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Up(args) => {
            let stack_id = args
                .stack_id
                .map(StackId::new)
                .unwrap_or_else(StackId::random);
            let config = StackConfig {
                ethereum_contracts: Some(ComponentConfig {
                    instance_count: 1,
                    port_group: args.port_group,
                }),
                service_node: Some(ComponentConfig {
                    instance_count: args.service_nodes,
                    port_group: args.port_group,
                }),
                validator_node: Some(ComponentConfig {
                    instance_count: args.validator_nodes,
                    port_group: args.port_group,
                }),
            };
            stack::configure(&config, &stack_id).await?;
            println!("Stack {stack_id} is up");
        }
        Commands::Down(args) => {
            stack::teardown(&StackId::new(args.stack_id)).await?;
        }
        Commands::Wait => {
            poller::wait_for_service_node().await?;
        }
    }
    Ok(())
}
