//! Submit a certificate and wait for it to finalize.
//!
//! Covers: network selection, open, nonce sync, submit, outcome polling, close
//!
//! Run: cargo run --example submit_certificate
//!
//! Required environment variables:
//!   CIRCULAR_ADDRESS=0x...      (40 hex characters)
//!   CIRCULAR_PRIVATE_KEY=0x...  (64 hex characters)
//!
//! Optional:
//!   CIRCULAR_NETWORK=testnet    (resolved through the discovery service)
//!   CIRCULAR_BLOCKCHAIN=0x...
//!   RUST_LOG=circular_kit=debug

use circular_kit::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let address = std::env::var("CIRCULAR_ADDRESS")?;
    let private_key = std::env::var("CIRCULAR_PRIVATE_KEY")?;
    let network = std::env::var("CIRCULAR_NETWORK").unwrap_or_else(|_| "testnet".to_string());

    let account = AccountBuilder::from_env()?.build()?;

    // ========================================================================
    // 1. Pick a gateway and open the account
    // ========================================================================

    let url = account.set_network(&network).await?;
    println!("Using {network} gateway at {url}");

    account.open(&address)?;
    let nonce = account.update_account().await?;
    println!("Next nonce: {nonce}");

    // ========================================================================
    // 2. Submit and wait
    // ========================================================================

    let submission = match account
        .submit_certificate("Hello from circular-kit", &private_key)
        .await
    {
        Ok(submission) => submission,
        Err(e) => {
            if let Some(response) = e.response() {
                eprintln!("Gateway response: {response}");
            }
            account.close();
            return Err(e.into());
        }
    };
    println!("Submitted {} with nonce {}", submission.tx_id, submission.nonce);

    match account.wait_for_outcome(&submission.tx_id.to_hex()).await {
        Ok(outcome) => println!("Final status: {}\n{:#}", outcome.status, outcome.response),
        Err(e) if e.is_timeout() => println!("Still pending: {e}"),
        Err(e) => {
            account.close();
            return Err(e.into());
        }
    }

    account.close();
    Ok(())
}
