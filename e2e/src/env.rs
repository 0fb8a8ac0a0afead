//! Environment resolver.
//!
//! Loads the generated per-stack `all.env` files plus the fixed `base.env`
//! into the process environment (already-set variables win, standard dotenv
//! semantics), then asks the client library to re-read its configuration.

use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{
    client::PantosClient,
    error::{Error, Result},
    stack::{CONTRACTS_DIR_VAR, StackId},
};

pub const ENV_FILE_VAR: &str = "PANTOS_ENV_FILE";

/// Fallback environment file colocated with the harness sources.
pub const BASE_ENV_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../base.env");

/// Resolve the environment of a generated stack instance and reload the
/// client configuration from it.
pub async fn configure_client<C: PantosClient + ?Sized>(
    client: &C,
    stack_id: &StackId,
    instance: u32,
) -> Result<()> {
    let contracts_dir = match env::var(CONTRACTS_DIR_VAR) {
        Ok(value) if !value.is_empty() => PathBuf::from(value),
        _ => return Err(Error::MissingEnvVar(CONTRACTS_DIR_VAR.to_string())),
    };
    // TODO: Return one client instance per stack instance.
    load_env_files(&contracts_dir, stack_id, instance, Path::new(BASE_ENV_FILE))?;
    client.reload_configuration(true).await?;
    Ok(())
}

/// Existing-environment mode: a single operator-supplied file named by
/// `PANTOS_ENV_FILE` replaces the generated ones.
pub async fn configure_client_from_file<C: PantosClient + ?Sized>(client: &C) -> Result<()> {
    let path = match env::var(ENV_FILE_VAR) {
        Ok(value) if !value.is_empty() => PathBuf::from(value),
        _ => return Err(Error::MissingEnvVar(ENV_FILE_VAR.to_string())),
    };
    if !path.exists() {
        return Err(Error::EnvFileNotFound(path));
    }
    dotenvy::from_path(&path)?;
    client.reload_configuration(true).await?;
    Ok(())
}

/// Load every file matched by the stack-specific glob and the base file.
/// Either pattern matching nothing is an error before any file is read.
pub fn load_env_files(
    contracts_dir: &Path,
    stack_id: &StackId,
    instance: u32,
    base_env: &Path,
) -> Result<()> {
    let patterns = [
        format!(
            "{}/data/*{stack_id}-{instance}/*/all.env",
            contracts_dir.display()
        ),
        base_env.display().to_string(),
    ];
    for pattern in patterns {
        let resolved = resolve_pattern(&pattern)?;
        for env_file in resolved {
            dotenvy::from_path(&env_file)?;
        }
    }
    Ok(())
}

pub(crate) fn resolve_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let resolved: Vec<PathBuf> = glob::glob(pattern)?.filter_map(|path| path.ok()).collect();
    if resolved.is_empty() {
        return Err(Error::PathNotFound(pattern.to_string()));
    }
    Ok(resolved)
}
