//! Readiness poller for the service node's bid endpoint.

use std::time::Duration;

use serde_json::Value;

use crate::error::{Error, Result};

/// Bid listing for the fixed eth -> bnb scenario pair; the service node is
/// considered ready once it advertises at least one bid here.
pub const BIDS_URL: &str =
    "http://localhost:8081/bids?source_blockchain=0&destination_blockchain=1";

const MAX_ATTEMPTS: u32 = 100;
const RETRY_INTERVAL: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub async fn wait_for_service_node() -> Result<()> {
    wait(BIDS_URL, MAX_ATTEMPTS, RETRY_INTERVAL).await
}

pub(crate) async fn wait(url: &str, max_attempts: u32, interval: Duration) -> Result<()> {
    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    for attempt in 1..=max_attempts {
        match client.get(url).send().await {
            Ok(response) => {
                println!("{}", response.status());
                let bids: Vec<Value> = response.json().await?;
                if !bids.is_empty() {
                    println!("Service node is ready");
                    return Ok(());
                }
            }
            // Only a refused connection is retryable; request timeouts and
            // malformed responses propagate.
            Err(err) if err.is_connect() => {
                println!("Service node not ready yet");
            }
            Err(err) => return Err(err.into()),
        }
        // No point sleeping once the budget is spent.
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }
    Err(Error::ReadinessTimeout)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    /// Minimal HTTP responder: serves `bodies[n]` to the n-th request and
    /// repeats the last entry afterwards.
    async fn serve_bids(bodies: Vec<&'static str>) -> (String, Arc<AtomicU32>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/bids", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicU32::new(0));
        let counter = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst) as usize;
                let body = bodies[n.min(bodies.len() - 1)];
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        (url, requests)
    }

    #[tokio::test]
    async fn returns_on_first_non_empty_bid_list() {
        let (url, requests) = serve_bids(vec!["[]", "[{\"fee\": \"0.1\"}]"]).await;
        wait(&url, 100, Duration::ZERO).await.unwrap();
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_lists_exhaust_the_retry_budget() {
        let (url, requests) = serve_bids(vec!["[]"]).await;
        let err = wait(&url, 3, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, Error::ReadinessTimeout));
        assert_eq!(requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn connection_failures_are_retried_until_the_budget_runs_out() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/bids", listener.local_addr().unwrap());
        drop(listener);
        let err = wait(&url, 2, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, Error::ReadinessTimeout));
    }

    #[tokio::test]
    async fn exhausted_budget_fails_without_a_trailing_sleep() {
        let (url, requests) = serve_bids(vec!["[]"]).await;
        let err = tokio::time::timeout(
            Duration::from_secs(5),
            wait(&url, 1, Duration::from_secs(600)),
        )
        .await
        .expect("the final empty response must not be followed by a retry sleep")
        .unwrap_err();
        assert!(matches!(err, Error::ReadinessTimeout));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_json_responses_propagate() {
        let (url, _) = serve_bids(vec!["not json"]).await;
        let err = wait(&url, 5, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
