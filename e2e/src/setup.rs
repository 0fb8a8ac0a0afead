//! Module-level setup and teardown.
//!
//! A scenario module launches one [`TestStack`] before its first test and
//! tears it down afterwards. Because the environment resolver mutates the
//! process environment table, setup must finish before any test body runs.

use std::env;

use crate::{
    chain::Network,
    client::PantosClient,
    env as env_resolver,
    error::Result,
    keystore::Keystore,
    poller,
    stack::{self, StackConfig, StackId},
};

pub const EXISTING_ENVIRONMENT_VAR: &str = "PANTOS_EXISTING_ENVIRONMENT";
pub const WORKER_ID_VAR: &str = "PANTOS_TEST_WORKER";

/// True when the harness should attach to an operator-provided environment
/// instead of generating Docker stacks.
pub fn existing_environment() -> bool {
    env::var(EXISTING_ENVIRONMENT_VAR)
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Port group for this worker, derived from ids of the form `gw<N>`
/// (`master` and anything unparseable map to 0).
pub fn port_group(worker_id: &str) -> u32 {
    worker_id
        .strip_prefix("gw")
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

fn worker_id() -> String {
    env::var(WORKER_ID_VAR).unwrap_or_else(|_| "gw0".to_string())
}

/// A launched test environment. Generated stacks own a stack identifier and
/// are torn down; existing environments are left untouched.
#[derive(Clone, Debug)]
pub enum TestStack {
    Generated { stack_id: StackId },
    Existing,
}

impl TestStack {
    /// Bring up the default stack shape, wait for the service node to
    /// advertise bids, then resolve the client environment. In
    /// existing-environment mode only the operator-supplied environment
    /// file is resolved.
    pub async fn launch<C: PantosClient + ?Sized>(client: &C) -> Result<Self> {
        if existing_environment() {
            env_resolver::configure_client_from_file(client).await?;
            return Ok(TestStack::Existing);
        }
        let stack_id = StackId::random();
        println!("Setting up module environment with stack identifier {stack_id}");
        let config = StackConfig::full(port_group(&worker_id()));
        stack::configure(&config, &stack_id).await?;
        poller::wait_for_service_node().await?;
        env_resolver::configure_client(client, &stack_id, 1).await?;
        Ok(TestStack::Generated { stack_id })
    }

    pub fn stack_id(&self) -> Option<&StackId> {
        match self {
            TestStack::Generated { stack_id } => Some(stack_id),
            TestStack::Existing => None,
        }
    }

    /// Resolve the keystore for `network`, from the generated stack or the
    /// operator environment.
    pub fn keystore(&self, network: Network) -> Result<Keystore> {
        match self {
            TestStack::Generated { stack_id } => {
                let contracts_dir = match env::var(stack::CONTRACTS_DIR_VAR) {
                    Ok(value) if !value.is_empty() => std::path::PathBuf::from(value),
                    _ => {
                        return Err(crate::Error::MissingEnvVar(
                            stack::CONTRACTS_DIR_VAR.to_string(),
                        ));
                    }
                };
                Keystore::resolve(&contracts_dir, stack_id, 1, network)
            }
            TestStack::Existing => Keystore::from_environment(network),
        }
    }

    /// Dump logs and remove the containers of a generated stack.
    pub async fn teardown(&self) -> Result<()> {
        match self {
            TestStack::Generated { stack_id } => stack::teardown(stack_id).await,
            TestStack::Existing => Ok(()),
        }
    }
}
