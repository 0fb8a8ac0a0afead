//! Credential loader.
//!
//! Resolves the encrypted keystore generated for a stack instance (or, in
//! existing-environment mode, the operator-supplied credential) and hands
//! decryption to the client library.

use std::{env, fs, path::Path};

use crate::{
    chain::Network,
    client::{BlockchainAddress, ClientResult, PantosClient, PrivateKey},
    error::{Error, Result},
};

/// Receiving address baked into the generated stacks' genesis accounts.
pub const DEFAULT_RECEIVING_ADDRESS: &str = "0xaAE34Ec313A97265635B8496468928549cdd4AB7";

/// An encrypted keystore payload paired with the network it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keystore {
    network: Network,
    payload: String,
}

impl Keystore {
    /// Resolve the keystore file a generated stack wrote for `network`.
    /// Exactly one file must match; anything else is an error.
    pub fn resolve(
        contracts_dir: &Path,
        stack_id: &crate::stack::StackId,
        instance: u32,
        network: Network,
    ) -> Result<Self> {
        let pattern = format!(
            "{}/data/*{stack_id}-{instance}/{network}/keystore",
            contracts_dir.display()
        );
        let resolved: Vec<_> = glob::glob(&pattern)?.filter_map(|path| path.ok()).collect();
        if resolved.is_empty() {
            return Err(Error::PathNotFound(pattern));
        }
        if resolved.len() > 1 {
            return Err(Error::AmbiguousKeystore(resolved));
        }
        let payload = fs::read_to_string(&resolved[0])?;
        Ok(Self { network, payload })
    }

    /// Existing-environment mode: `{PREFIX}_PRIVATE_KEY` either names a
    /// readable file or holds the payload itself.
    pub fn from_environment(network: Network) -> Result<Self> {
        let name = format!("{}_PRIVATE_KEY", network.env_prefix());
        let value = match env::var(&name) {
            Ok(value) if !value.is_empty() => value,
            _ => return Err(Error::MissingEnvVar(name)),
        };
        let payload = fs::read_to_string(&value).unwrap_or(value);
        Ok(Self { network, payload })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Decryption is delegated to the client library. Generated keystores
    /// are always encrypted with an empty passphrase.
    pub fn decrypt<C: PantosClient + ?Sized>(&self, client: &C) -> ClientResult<PrivateKey> {
        client.decrypt_private_key(self.network.blockchain(), &self.payload, "")
    }
}

/// Address the transfer scenarios send tokens to. Fixed for generated
/// stacks, operator-supplied in existing-environment mode.
pub fn receiving_address(network: Network) -> Result<BlockchainAddress> {
    if crate::setup::existing_environment() {
        let name = format!("{}_RECEIVING_ADDRESS", network.env_prefix());
        match env::var(&name) {
            Ok(value) if !value.is_empty() => Ok(BlockchainAddress(value)),
            _ => Err(Error::MissingEnvVar(name)),
        }
    } else {
        Ok(BlockchainAddress(DEFAULT_RECEIVING_ADDRESS.to_string()))
    }
}
