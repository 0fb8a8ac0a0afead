//! Calling seam for the external client library.
//!
//! Transfer submission, balance queries, bid retrieval and keystore
//! decryption are all owned by the client library; the harness only needs a
//! trait to drive them through. Scenario code is generic over
//! [`PantosClient`] so it can run against the real library binding or a
//! scripted stand-in.

use std::fmt;

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use crate::chain::Blockchain;

/// Any failure surfaced by the client library. The harness never retries
/// these; they turn straight into scenario failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("client error: {0}")]
pub struct ClientError(pub String);

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockchainAddress(pub String);

impl fmt::Display for BlockchainAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenSymbol(pub String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskId(pub String);

/// Decrypted private key. Opaque to the harness; the inner value only ever
/// travels back into the client library.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrivateKey(..)")
    }
}

/// One service node bid for a source/destination chain pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceNodeBid {
    pub execution_time: u64,
    pub valid_until: u64,
    pub fee: BigDecimal,
    pub signature: String,
}

/// Response to a submitted transfer; the status poll loop is keyed on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferResponse {
    pub service_node_address: BlockchainAddress,
    pub task_id: TaskId,
}

/// Transfer status on the source chain, as reported by the service node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceNodeTransferStatus {
    Accepted,
    Submitted,
    Reverted,
    Failed,
    Confirmed,
}

/// Transfer status on the destination chain, as reported by the validator
/// node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestinationTransferStatus {
    Nothing,
    Submitted,
    Confirmed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferStatus {
    pub source_transfer_status: ServiceNodeTransferStatus,
    pub destination_transfer_status: DestinationTransferStatus,
}

/// Entry points of the external client library used by the harness.
#[async_trait]
pub trait PantosClient: Send + Sync {
    /// Re-read the library configuration from the process environment.
    /// `force` discards any previously cached configuration.
    async fn reload_configuration(&self, force: bool) -> ClientResult<()>;

    async fn token_balance(
        &self,
        blockchain: Blockchain,
        address: &BlockchainAddress,
        token: &TokenSymbol,
    ) -> ClientResult<BigDecimal>;

    async fn service_node_bids(
        &self,
        source: Blockchain,
        destination: Blockchain,
        return_fee_in_main_unit: bool,
    ) -> ClientResult<Vec<ServiceNodeBid>>;

    async fn transfer_tokens(
        &self,
        source: Blockchain,
        destination: Blockchain,
        sender_key: &PrivateKey,
        recipient: &BlockchainAddress,
        token: &TokenSymbol,
        amount: &BigDecimal,
    ) -> ClientResult<TransferResponse>;

    async fn transfer_status(
        &self,
        source: Blockchain,
        service_node: &BlockchainAddress,
        task_id: &TaskId,
    ) -> ClientResult<TransferStatus>;

    fn decrypt_private_key(
        &self,
        blockchain: Blockchain,
        keystore: &str,
        password: &str,
    ) -> ClientResult<PrivateKey>;
}
