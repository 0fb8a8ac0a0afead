//! Transfer scenarios run against a scripted client, exercising the same
//! poll loops the Docker-backed suite uses.

use std::{fs, time::Duration};

use bigdecimal::BigDecimal;
use pantos_e2e::{
    Error,
    chain::{Blockchain, Network},
    client::{
        BlockchainAddress, ClientError, DestinationTransferStatus, PantosClient, ServiceNodeBid,
        ServiceNodeTransferStatus, TokenSymbol, TransferStatus,
    },
    keystore::{DEFAULT_RECEIVING_ADDRESS, Keystore},
    stack::StackId,
    testing::ScriptedClient,
    transfer::{self, ConfirmationMode},
};

fn status(
    source: ServiceNodeTransferStatus,
    destination: DestinationTransferStatus,
) -> Result<TransferStatus, ClientError> {
    Ok(TransferStatus {
        source_transfer_status: source,
        destination_transfer_status: destination,
    })
}

fn bid() -> ServiceNodeBid {
    ServiceNodeBid {
        execution_time: 600,
        valid_until: 1_700_000_000,
        fee: BigDecimal::from(1),
        signature: "0xsigned".to_string(),
    }
}

#[tokio::test]
async fn retrieve_token_balance() {
    let client = ScriptedClient::default().with_balance(BigDecimal::from(42));
    let balance = client
        .token_balance(
            Blockchain::BnbChain,
            &BlockchainAddress(DEFAULT_RECEIVING_ADDRESS.to_string()),
            &TokenSymbol("pan".to_string()),
        )
        .await
        .expect("balance query failed");
    assert_eq!(balance, BigDecimal::from(42));
}

#[tokio::test]
async fn retrieve_service_node_bids() {
    let client = ScriptedClient::default().with_bids(vec![bid()]);
    let bids = client
        .service_node_bids(Blockchain::Ethereum, Blockchain::BnbChain, false)
        .await
        .expect("bid query failed");
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].fee, BigDecimal::from(1));
}

#[tokio::test(start_paused = true)]
async fn token_transfer_polls_until_source_confirmation() {
    let client = ScriptedClient::with_statuses([
        status(
            ServiceNodeTransferStatus::Accepted,
            DestinationTransferStatus::Nothing,
        ),
        status(
            ServiceNodeTransferStatus::Submitted,
            DestinationTransferStatus::Nothing,
        ),
        status(
            ServiceNodeTransferStatus::Confirmed,
            DestinationTransferStatus::Nothing,
        ),
    ]);

    let contracts = tempfile::tempdir().unwrap();
    let keystore_dir = contracts.path().join("data/local-fghij-1/eth");
    fs::create_dir_all(&keystore_dir).unwrap();
    fs::write(keystore_dir.join("keystore"), "{\"version\":3}").unwrap();

    let keystore =
        Keystore::resolve(contracts.path(), &StackId::new("fghij"), 1, Network::Eth).unwrap();
    let private_key = keystore.decrypt(&client).expect("decryption failed");

    let response = client
        .transfer_tokens(
            Blockchain::Ethereum,
            Blockchain::BnbChain,
            &private_key,
            &BlockchainAddress(DEFAULT_RECEIVING_ADDRESS.to_string()),
            &TokenSymbol("pan".to_string()),
            &"1.01".parse::<BigDecimal>().unwrap(),
        )
        .await
        .expect("transfer submission failed");

    let final_status = transfer::wait_for_confirmation(
        &client,
        Blockchain::Ethereum,
        &response,
        ConfirmationMode::current(),
        transfer::test_timeout(),
    )
    .await
    .expect("transfer was not confirmed");

    assert_eq!(
        final_status.source_transfer_status,
        ServiceNodeTransferStatus::Confirmed
    );
    assert_eq!(client.status_polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn full_mode_waits_for_destination_confirmation() {
    let client = ScriptedClient::with_statuses([
        status(
            ServiceNodeTransferStatus::Confirmed,
            DestinationTransferStatus::Submitted,
        ),
        status(
            ServiceNodeTransferStatus::Confirmed,
            DestinationTransferStatus::Confirmed,
        ),
    ]);
    let response = client
        .transfer_tokens(
            Blockchain::Ethereum,
            Blockchain::BnbChain,
            &pantos_e2e::client::PrivateKey::new("0xkey"),
            &BlockchainAddress(DEFAULT_RECEIVING_ADDRESS.to_string()),
            &TokenSymbol("pan".to_string()),
            &BigDecimal::from(1),
        )
        .await
        .unwrap();

    transfer::wait_for_confirmation(
        &client,
        Blockchain::Ethereum,
        &response,
        ConfirmationMode::SourceAndDestination,
        Duration::from_secs(300),
    )
    .await
    .expect("transfer was not confirmed");
    assert_eq!(client.status_polls(), 2);
}

#[tokio::test(start_paused = true)]
async fn client_errors_during_polling_fail_immediately() {
    let client = ScriptedClient::with_statuses([
        status(
            ServiceNodeTransferStatus::Submitted,
            DestinationTransferStatus::Nothing,
        ),
        Err(ClientError("service node unreachable".to_string())),
    ]);
    let response = client
        .transfer_tokens(
            Blockchain::Ethereum,
            Blockchain::BnbChain,
            &pantos_e2e::client::PrivateKey::new("0xkey"),
            &BlockchainAddress(DEFAULT_RECEIVING_ADDRESS.to_string()),
            &TokenSymbol("pan".to_string()),
            &BigDecimal::from(1),
        )
        .await
        .unwrap();

    let err = transfer::wait_for_confirmation(
        &client,
        Blockchain::Ethereum,
        &response,
        ConfirmationMode::current(),
        Duration::from_secs(300),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Client(_)));
    assert_eq!(client.status_polls(), 2);
}

#[tokio::test(start_paused = true)]
async fn confirmation_deadline_stops_the_poll_loop() {
    let client = ScriptedClient::with_statuses([status(
        ServiceNodeTransferStatus::Submitted,
        DestinationTransferStatus::Nothing,
    )]);
    let response = client
        .transfer_tokens(
            Blockchain::Ethereum,
            Blockchain::BnbChain,
            &pantos_e2e::client::PrivateKey::new("0xkey"),
            &BlockchainAddress(DEFAULT_RECEIVING_ADDRESS.to_string()),
            &TokenSymbol("pan".to_string()),
            &BigDecimal::from(1),
        )
        .await
        .unwrap();

    let err = transfer::wait_for_confirmation(
        &client,
        Blockchain::Ethereum,
        &response,
        ConfirmationMode::current(),
        Duration::from_secs(12),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::ConfirmationTimeout(12)));
    assert!(client.status_polls() >= 3);
}
