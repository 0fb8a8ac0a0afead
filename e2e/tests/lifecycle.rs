//! Full Docker stack lifecycle. Needs the contracts, service-node and
//! validator-node checkouts (`PANTOS_*` directory variables) plus a local
//! Docker daemon, so it only builds with `--features docker-stack`.

use pantos_e2e::{chain::Network, setup::TestStack, testing::ScriptedClient};

#[tokio::test]
async fn bring_up_wait_and_tear_down() {
    let client = ScriptedClient::default();
    let stack = TestStack::launch(&client)
        .await
        .expect("stack bring-up failed");
    // Launch already waited for a non-empty bid list and resolved the
    // generated environment files.
    assert_eq!(client.reloads(), 1);

    let keystore = stack
        .keystore(Network::Eth)
        .expect("generated keystore missing");
    assert!(!keystore.payload().is_empty());

    stack.teardown().await.expect("teardown failed");
}
