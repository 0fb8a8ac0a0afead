//! Test doubles and shared test plumbing.

use std::{
    collections::VecDeque,
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicU32, Ordering},
    },
};

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use crate::{
    chain::Blockchain,
    client::{
        BlockchainAddress, ClientError, ClientResult, PantosClient, PrivateKey, ServiceNodeBid,
        TaskId, TokenSymbol, TransferResponse, TransferStatus,
    },
};

/// Tests mutating the process environment table must hold this lock; the
/// environment is shared across the whole test binary.
pub fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Client-library stand-in driven by a pre-recorded script of status
/// responses. Everything else answers with fixed values.
pub struct ScriptedClient {
    pub balance: BigDecimal,
    pub bids: Vec<ServiceNodeBid>,
    statuses: Mutex<VecDeque<ClientResult<TransferStatus>>>,
    reloads: AtomicU32,
    status_polls: AtomicU32,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self {
            balance: BigDecimal::from(0),
            bids: Vec::new(),
            statuses: Mutex::new(VecDeque::new()),
            reloads: AtomicU32::new(0),
            status_polls: AtomicU32::new(0),
        }
    }
}

impl ScriptedClient {
    pub fn with_statuses(
        statuses: impl IntoIterator<Item = ClientResult<TransferStatus>>,
    ) -> Self {
        Self {
            statuses: Mutex::new(statuses.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_balance(mut self, balance: BigDecimal) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_bids(mut self, bids: Vec<ServiceNodeBid>) -> Self {
        self.bids = bids;
        self
    }

    pub fn reloads(&self) -> u32 {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn status_polls(&self) -> u32 {
        self.status_polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PantosClient for ScriptedClient {
    async fn reload_configuration(&self, _force: bool) -> ClientResult<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn token_balance(
        &self,
        _blockchain: Blockchain,
        _address: &BlockchainAddress,
        _token: &TokenSymbol,
    ) -> ClientResult<BigDecimal> {
        Ok(self.balance.clone())
    }

    async fn service_node_bids(
        &self,
        _source: Blockchain,
        _destination: Blockchain,
        _return_fee_in_main_unit: bool,
    ) -> ClientResult<Vec<ServiceNodeBid>> {
        Ok(self.bids.clone())
    }

    async fn transfer_tokens(
        &self,
        _source: Blockchain,
        _destination: Blockchain,
        _sender_key: &PrivateKey,
        _recipient: &BlockchainAddress,
        _token: &TokenSymbol,
        _amount: &BigDecimal,
    ) -> ClientResult<TransferResponse> {
        Ok(TransferResponse {
            service_node_address: BlockchainAddress("0xservice".to_string()),
            task_id: TaskId("task-1".to_string()),
        })
    }

    async fn transfer_status(
        &self,
        _source: Blockchain,
        _service_node: &BlockchainAddress,
        _task_id: &TaskId,
    ) -> ClientResult<TransferStatus> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self
            .statuses
            .lock()
            .map_err(|_| ClientError("status script poisoned".to_string()))?;
        match statuses.len() {
            0 => Err(ClientError("status script exhausted".to_string())),
            // The last scripted entry repeats, like a settled transfer would.
            1 => statuses
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ClientError("status script exhausted".to_string()))),
            _ => statuses
                .pop_front()
                .unwrap_or_else(|| Err(ClientError("status script exhausted".to_string()))),
        }
    }

    fn decrypt_private_key(
        &self,
        blockchain: Blockchain,
        _keystore: &str,
        password: &str,
    ) -> ClientResult<PrivateKey> {
        if !password.is_empty() {
            return Err(ClientError("unexpected passphrase".to_string()));
        }
        Ok(PrivateKey::new(format!("decrypted-{blockchain}")))
    }
}
