//! Stack lifecycle controller.
//!
//! Brings Docker stacks for the three external projects up or down through
//! their `make` targets. Planning is kept separate from execution so the
//! exact command lines can be asserted on without Docker.

use std::{
    env, fmt,
    path::{Path, PathBuf},
};

use rand::Rng;
use tracing::warn;

use crate::{
    error::{Error, Result},
    runner::{self, CommandSpec},
};

pub const CONTRACTS_DIR_VAR: &str = "PANTOS_ETHEREUM_CONTRACTS";
pub const SERVICE_NODE_DIR_VAR: &str = "PANTOS_SERVICE_NODE";
pub const VALIDATOR_NODE_DIR_VAR: &str = "PANTOS_VALIDATOR_NODE";

const DEFAULT_VERSION: &str = "development";
const STACK_ID_LEN: usize = 5;

/// Short random identifier scoping one set of Docker stacks and the
/// credential files they generate. Created once per test module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackId(String);

impl StackId {
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self(
            (0..STACK_ID_LEN)
                .map(|_| rng.gen_range(b'a'..=b'z') as char)
                .collect(),
        )
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentConfig {
    pub instance_count: u32,
    /// Reserved for port-offsetting parallel workers.
    pub port_group: u32,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            instance_count: 1,
            port_group: 0,
        }
    }
}

/// Requested stack shape. A `None` component means "tear that component
/// down", not "use defaults".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackConfig {
    pub ethereum_contracts: Option<ComponentConfig>,
    pub service_node: Option<ComponentConfig>,
    pub validator_node: Option<ComponentConfig>,
}

impl StackConfig {
    /// The full default stack: contracts, two service nodes, one validator
    /// node.
    pub fn full(port_group: u32) -> Self {
        Self {
            ethereum_contracts: Some(ComponentConfig {
                instance_count: 1,
                port_group,
            }),
            service_node: Some(ComponentConfig {
                instance_count: 2,
                port_group,
            }),
            validator_node: Some(ComponentConfig {
                instance_count: 1,
                port_group,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ethereum_contracts.is_none()
            && self.service_node.is_none()
            && self.validator_node.is_none()
    }
}

/// Directories and image versions of the three external projects, resolved
/// from the environment before any command runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectEnv {
    pub contracts_dir: PathBuf,
    pub contracts_version: String,
    pub service_node_dir: PathBuf,
    pub service_node_version: String,
    pub validator_node_dir: PathBuf,
    pub validator_node_version: String,
}

impl ProjectEnv {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            contracts_dir: required_dir(CONTRACTS_DIR_VAR)?,
            contracts_version: resolve_version(env::var("PANTOS_ETHEREUM_CONTRACTS_VERSION").ok()),
            service_node_dir: required_dir(SERVICE_NODE_DIR_VAR)?,
            service_node_version: resolve_version(env::var("PANTOS_SERVICE_NODE_VERSION").ok()),
            validator_node_dir: required_dir(VALIDATOR_NODE_DIR_VAR)?,
            validator_node_version: resolve_version(env::var("PANTOS_VALIDATOR_NODE_VERSION").ok()),
        })
    }
}

fn required_dir(name: &str) -> Result<PathBuf> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(PathBuf::from(value)),
        _ => Err(Error::MissingEnvVar(name.to_string())),
    }
}

/// An unset or empty version variable means the development image.
fn resolve_version(value: Option<String>) -> String {
    match value {
        Some(version) if !version.is_empty() => version,
        _ => DEFAULT_VERSION.to_string(),
    }
}

/// Planned commands for one lifecycle operation. Log dumps always run (and
/// finish) before removals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackPlan {
    Teardown {
        log_dumps: Vec<CommandSpec>,
        removals: Vec<CommandSpec>,
    },
    BringUp {
        ethereum_contracts: CommandSpec,
        service_node: CommandSpec,
        validator_node: CommandSpec,
    },
}

pub fn plan(config: &StackConfig, stack_id: &StackId, projects: &ProjectEnv) -> StackPlan {
    if config.is_empty() {
        let log_dumps = vec![
            CommandSpec::new("docker", "docker ps"),
            log_dump("validator_node", &projects.validator_node_dir, stack_id),
            log_dump("service_node", &projects.service_node_dir, stack_id),
            log_dump("ethereum_contracts", &projects.contracts_dir, stack_id),
        ];
        let removals = vec![
            removal("validator_node", &projects.validator_node_dir, stack_id),
            removal("service_node", &projects.service_node_dir, stack_id),
            removal("ethereum_contracts", &projects.contracts_dir, stack_id),
        ];
        return StackPlan::Teardown {
            log_dumps,
            removals,
        };
    }

    let ethereum_contracts = match &config.ethereum_contracts {
        Some(_) => CommandSpec::new("ethereum_contracts", "make docker-local")
            .cwd(&projects.contracts_dir)
            .env("DOCKER_TAG", &projects.contracts_version)
            .env("STACK_IDENTIFIER", stack_id.as_str())
            .env("ARGS", "--no-build"),
        None => removal("ethereum_contracts", &projects.contracts_dir, stack_id),
    };
    let service_node = match &config.service_node {
        // TODO: Allow service nodes to support multiple networks?
        Some(component) => node_bring_up(
            "service_node",
            &projects.service_node_dir,
            &projects.service_node_version,
            component.instance_count,
            stack_id,
        ),
        None => removal("service_node", &projects.service_node_dir, stack_id),
    };
    let validator_node = match &config.validator_node {
        Some(component) => node_bring_up(
            "validator_node",
            &projects.validator_node_dir,
            &projects.validator_node_version,
            component.instance_count,
            stack_id,
        ),
        None => removal("validator_node", &projects.validator_node_dir, stack_id),
    };
    StackPlan::BringUp {
        ethereum_contracts,
        service_node,
        validator_node,
    }
}

fn node_bring_up(
    legend: &str,
    dir: &Path,
    version: &str,
    instance_count: u32,
    stack_id: &StackId,
) -> CommandSpec {
    CommandSpec::new(legend, format!("make docker INSTANCE_COUNT=\"{instance_count}\""))
        .cwd(dir)
        .env("DOCKER_TAG", version)
        .env("STACK_IDENTIFIER", stack_id.as_str())
        // Destination chain of the fixed eth -> bnb transfer scenario.
        .env("ETHEREUM_NETWORK", "1")
        .env("NO_BUILD", "true")
}

fn log_dump(legend: &str, dir: &Path, stack_id: &StackId) -> CommandSpec {
    CommandSpec::new(legend, "make docker-logs")
        .cwd(dir)
        .env("STACK_IDENTIFIER", stack_id.as_str())
}

fn removal(legend: &str, dir: &Path, stack_id: &StackId) -> CommandSpec {
    CommandSpec::new(legend, "make docker-remove")
        .cwd(dir)
        .env("STACK_IDENTIFIER", stack_id.as_str())
}

/// Bring the requested stack up, or tear everything down if the request is
/// empty.
pub async fn configure(config: &StackConfig, stack_id: &StackId) -> Result<()> {
    let projects = ProjectEnv::from_env()?;
    println!(
        "Configuring tests with: Ethereum Contracts {}, Service Node {}, Validator Node {}",
        projects.contracts_version, projects.service_node_version, projects.validator_node_version,
    );
    execute(plan(config, stack_id, &projects)).await
}

async fn execute(plan: StackPlan) -> Result<()> {
    match plan {
        StackPlan::Teardown {
            log_dumps,
            removals,
        } => {
            println!("Tearing down the environment");
            // Log dumps are best-effort; a failed dump must not block
            // container removal.
            for result in runner::run_all(log_dumps).await {
                if let Err(err) = result {
                    warn!("log dump failed: {err}");
                }
            }
            for result in runner::run_all(removals).await {
                result?;
            }
        }
        StackPlan::BringUp {
            ethereum_contracts,
            service_node,
            validator_node,
        } => {
            // The node stacks read addresses generated by the contracts
            // deployment, so that step cannot overlap with them.
            runner::run(&ethereum_contracts).await?;
            for result in runner::run_all(vec![service_node, validator_node]).await {
                result?;
            }
        }
    }
    Ok(())
}

pub async fn teardown(stack_id: &StackId) -> Result<()> {
    configure(&StackConfig::default(), stack_id).await
}
