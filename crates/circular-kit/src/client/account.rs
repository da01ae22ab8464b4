//! The account: lifecycle, nonce tracking and certificate submission.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::gateway::GatewayClient;
use super::poller::{PollConfig, poll_until_terminal};
use super::resolver::{DiscoveryResolver, NetworkResolver};
use super::transport::{DEFAULT_REQUEST_TIMEOUT, HttpTransport, Transport};
use crate::encoding::{is_hex, strip_prefix};
use crate::error::{Error, GatewayError};
use crate::types::{
    Address, Certificate, DEFAULT_CHAIN, GatewayTarget, LIB_VERSION, Outcome, SecretKey,
    Timestamp, Transaction, TxId,
};

/// Block range searched by [`Account::get_transaction_outcome`].
const RECENT_BLOCKS: (u64, u64) = (0, 10);

/// Explicit account configuration.
///
/// `Default` targets the public gateway and chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountConfig {
    /// Gateway base URL and node identifier.
    pub gateway: GatewayTarget,
    /// Blockchain identifier, hex with optional `0x`.
    pub blockchain: String,
    /// Protocol version sent with every request.
    pub version: String,
    /// Outcome polling timing.
    pub poll: PollConfig,
    /// Per-request timeout for the default HTTP transport.
    pub request_timeout: Duration,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayTarget::default(),
            blockchain: DEFAULT_CHAIN.to_string(),
            version: LIB_VERSION.to_string(),
            poll: PollConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// A successful certificate submission.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    /// ID of the submitted transaction.
    pub tx_id: TxId,
    /// Nonce the transaction consumed.
    pub nonce: u64,
    /// Raw gateway response.
    pub response: Value,
}

/// Mutable account state. Everything here is reset by `close`.
#[derive(Debug)]
struct AccountState {
    address: Option<Address>,
    /// Next nonce to use.
    nonce: u64,
    latest_tx_id: Option<TxId>,
    gateway: GatewayTarget,
    blockchain: String,
    version: String,
    data: HashMap<String, String>,
    /// Bumped by every open and close so in-flight calls can tell whether
    /// the account they started on still exists.
    session: u64,
}

impl AccountState {
    fn new(config: &AccountConfig, session: u64) -> Self {
        Self {
            address: None,
            nonce: 0,
            latest_tx_id: None,
            gateway: config.gateway.clone(),
            blockchain: config.blockchain.clone(),
            version: config.version.clone(),
            data: HashMap::new(),
            session,
        }
    }
}

/// Values read from the state at the start of a gateway operation.
struct Snapshot {
    address: Address,
    nonce: u64,
    latest_tx_id: Option<TxId>,
    gateway: GatewayTarget,
    blockchain: String,
    version: String,
    session: u64,
}

/// A Circular account.
///
/// Starts closed. [`open`](Self::open) it with an address, sync the nonce
/// with [`update_account`](Self::update_account), then submit certificates.
/// Submissions and nonce syncs on one account are serialized, so a nonce is
/// never consumed twice even when the account is shared between tasks.
///
/// # Example
///
/// ```rust,no_run
/// use circular_kit::*;
///
/// # async fn example() -> Result<(), Error> {
/// let account = Account::builder().build()?;
/// account.set_network("testnet").await?;
/// account.open("0x1234567890abcdef1234567890abcdef12345678")?;
/// account.update_account().await?;
///
/// let submission = account.submit_certificate("hello", "0x...").await?;
/// let outcome = account.wait_for_outcome(&submission.tx_id.to_hex()).await?;
/// println!("{}", outcome.status);
///
/// account.close();
/// # Ok(())
/// # }
/// ```
pub struct Account {
    config: AccountConfig,
    gateway_client: GatewayClient,
    resolver: Arc<dyn NetworkResolver>,
    state: Mutex<AccountState>,
    submissions: tokio::sync::Mutex<()>,
}

impl Account {
    /// A closed account with the default configuration and HTTP transport.
    pub fn new() -> Self {
        AccountBuilder::new().assemble()
    }

    /// Start configuring an account.
    pub fn builder() -> AccountBuilder {
        AccountBuilder::new()
    }

    fn state(&self) -> MutexGuard<'_, AccountState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Result<Snapshot, Error> {
        let state = self.state();
        let address = state.address.clone().ok_or(Error::AccountNotOpen)?;
        Ok(Snapshot {
            address,
            nonce: state.nonce,
            latest_tx_id: state.latest_tx_id,
            gateway: state.gateway.clone(),
            blockchain: state.blockchain.clone(),
            version: state.version.clone(),
            session: state.session,
        })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open the account for `address`.
    ///
    /// On success the nonce, latest transaction ID and scratch data are reset.
    /// An invalid address leaves the account untouched.
    pub fn open(&self, address: impl AsRef<str>) -> Result<(), Error> {
        let address: Address = address.as_ref().parse()?;
        debug!(address = %address, "account opened");
        let mut state = self.state();
        state.address = Some(address);
        state.nonce = 0;
        state.latest_tx_id = None;
        state.data.clear();
        state.session += 1;
        Ok(())
    }

    /// Reset every field to its configured default. Always succeeds.
    pub fn close(&self) {
        let mut state = self.state();
        let session = state.session + 1;
        *state = AccountState::new(&self.config, session);
        debug!("account closed");
    }

    pub fn is_open(&self) -> bool {
        self.state().address.is_some()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn address(&self) -> Option<Address> {
        self.state().address.clone()
    }

    /// The next nonce a submission will use.
    pub fn nonce(&self) -> u64 {
        self.state().nonce
    }

    pub fn latest_tx_id(&self) -> Option<TxId> {
        self.state().latest_tx_id
    }

    pub fn gateway(&self) -> GatewayTarget {
        self.state().gateway.clone()
    }

    pub fn blockchain(&self) -> String {
        self.state().blockchain.clone()
    }

    pub fn version(&self) -> String {
        self.state().version.clone()
    }

    pub fn poll_config(&self) -> PollConfig {
        self.config.poll
    }

    /// Store a value in the scratch store. Cleared by open and close.
    pub fn set_data(&self, key: impl Into<String>, value: impl Into<String>) {
        self.state().data.insert(key.into(), value.into());
    }

    pub fn data(&self, key: &str) -> Option<String> {
        self.state().data.get(key).cloned()
    }

    // ========================================================================
    // Network selection
    // ========================================================================

    /// Resolve `network` to a gateway URL and target it.
    ///
    /// The node identifier becomes the network name. Returns the URL.
    pub async fn set_network(&self, network: impl AsRef<str>) -> Result<String, Error> {
        let network = network.as_ref();
        let url = self.resolver.resolve(network).await?;
        let mut state = self.state();
        state.gateway = GatewayTarget::new(url.clone(), network);
        info!(network, url = %url, "gateway selected");
        Ok(url)
    }

    /// Override the blockchain identifier.
    pub fn set_blockchain(&self, blockchain: impl AsRef<str>) -> Result<(), Error> {
        let blockchain = blockchain.as_ref();
        validate_blockchain(blockchain)?;
        self.state().blockchain = blockchain.to_string();
        Ok(())
    }

    // ========================================================================
    // Nonce and submission
    // ========================================================================

    /// Sync the nonce with the gateway.
    ///
    /// Sets the local nonce to the server's nonce plus one and returns it.
    /// On any error the local nonce is left unchanged.
    pub async fn update_account(&self) -> Result<u64, Error> {
        let _guard = self.submissions.lock().await;
        let snapshot = self.snapshot()?;

        let server_nonce = self
            .gateway_client
            .wallet_nonce(
                &snapshot.gateway,
                &snapshot.blockchain,
                &snapshot.address,
                &snapshot.version,
            )
            .await?;
        let next = next_nonce(server_nonce)?;

        let mut state = self.state();
        if state.session == snapshot.session {
            state.nonce = next;
        }
        info!(address = %snapshot.address, nonce = next, "nonce synced");
        Ok(next)
    }

    /// Sign and submit a certificate carrying `data`.
    ///
    /// `private_key` is 64 hex characters with an optional `0x` prefix.
    pub async fn submit_certificate(
        &self,
        data: &str,
        private_key: &str,
    ) -> Result<Submission, Error> {
        if !self.is_open() {
            return Err(Error::AccountNotOpen);
        }
        let key: SecretKey = private_key.parse()?;
        self.submit_certificate_with_key(data, &key).await
    }

    /// Like [`submit_certificate`](Self::submit_certificate) with a parsed key.
    ///
    /// Only a `Result` 200 from the gateway records the transaction as the
    /// latest and advances the nonce by one. Every failure leaves both
    /// untouched. A rejection carries the raw response, see
    /// [`Error::response`].
    pub async fn submit_certificate_with_key(
        &self,
        data: &str,
        key: &SecretKey,
    ) -> Result<Submission, Error> {
        let _guard = self.submissions.lock().await;
        let snapshot = self.snapshot()?;
        let following = next_nonce(snapshot.nonce)?;

        let mut certificate = Certificate::with_version(snapshot.version.as_str());
        certificate.set_data(data);
        certificate.set_previous_tx_id(snapshot.latest_tx_id.map(|id| id.to_hex()));

        let signed = Transaction::certificate(
            &snapshot.blockchain,
            &snapshot.address,
            &certificate,
            snapshot.nonce,
            Timestamp::now(),
        )
        .sign(key)?;
        let tx_id = *signed.id();

        let response = match self
            .gateway_client
            .add_transaction(&snapshot.gateway, &signed.to_request())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(tx_id = %tx_id, nonce = snapshot.nonce, error = %e, "certificate rejected");
                return Err(e.into());
            }
        };

        {
            let mut state = self.state();
            if state.session == snapshot.session {
                state.latest_tx_id = Some(tx_id);
                state.nonce = following;
            }
        }
        info!(tx_id = %tx_id, nonce = snapshot.nonce, "certificate submitted");

        Ok(Submission {
            tx_id,
            nonce: snapshot.nonce,
            response,
        })
    }

    // ========================================================================
    // Lookup and polling
    // ========================================================================

    /// Look up a transaction in a single block.
    pub async fn get_transaction(&self, block: u64, tx_id: &str) -> Result<Value, Error> {
        self.get_transaction_by_id(tx_id, block, block).await
    }

    /// Look up a transaction in the block range `start..=end`.
    ///
    /// Returns the raw body. `Result` 404 is a normal answer, not an error.
    pub async fn get_transaction_by_id(
        &self,
        tx_id: &str,
        start: u64,
        end: u64,
    ) -> Result<Value, Error> {
        let snapshot = self.snapshot()?;
        let body = self
            .gateway_client
            .transaction_by_id(
                &snapshot.gateway,
                &snapshot.blockchain,
                tx_id,
                start,
                end,
                &snapshot.version,
            )
            .await?;
        Ok(body)
    }

    /// Query the current status of a transaction once.
    pub async fn get_transaction_outcome(&self, tx_id: &str) -> Result<Outcome, Error> {
        let (start, end) = RECENT_BLOCKS;
        let body = self.get_transaction_by_id(tx_id, start, end).await?;
        Ok(Outcome::from_lookup(&body)?)
    }

    /// Poll until the transaction is final, using the configured timing.
    pub async fn wait_for_outcome(&self, tx_id: &str) -> Result<Outcome, Error> {
        self.wait_for_outcome_with(tx_id, &self.config.poll).await
    }

    /// Poll until the transaction is final or `config.timeout` elapses.
    pub async fn wait_for_outcome_with(
        &self,
        tx_id: &str,
        config: &PollConfig,
    ) -> Result<Outcome, Error> {
        poll_until_terminal(tx_id, config, || self.get_transaction_outcome(tx_id)).await
    }
}

impl Default for Account {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Account")
            .field("address", &state.address)
            .field("nonce", &state.nonce)
            .field("gateway", &state.gateway)
            .finish()
    }
}

/// The nonce after `nonce`. The counter never wraps.
fn next_nonce(nonce: u64) -> Result<u64, Error> {
    nonce
        .checked_add(1)
        .ok_or_else(|| GatewayError::invalid_response("nonce out of range").into())
}

fn validate_blockchain(blockchain: &str) -> Result<(), Error> {
    if !is_hex(&strip_prefix(blockchain)) {
        return Err(Error::Config(format!(
            "blockchain '{blockchain}' is not a hex identifier"
        )));
    }
    Ok(())
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for an [`Account`].
///
/// ```rust,no_run
/// use std::time::Duration;
/// use circular_kit::Account;
///
/// # fn example() -> Result<(), circular_kit::Error> {
/// let account = Account::builder()
///     .gateway_url("https://nag.example/NAG.php?cep=")
///     .network_node("testnet")
///     .poll_interval(Duration::from_secs(1))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct AccountBuilder {
    config: AccountConfig,
    transport: Option<Arc<dyn Transport>>,
    resolver: Option<Arc<dyn NetworkResolver>>,
}

impl AccountBuilder {
    fn new() -> Self {
        Self::from_config(AccountConfig::default())
    }

    /// Start from an existing configuration.
    pub fn from_config(config: AccountConfig) -> Self {
        Self {
            config,
            transport: None,
            resolver: None,
        }
    }

    /// Start from the default configuration overridden by environment
    /// variables.
    ///
    /// Reads the optional variables `CIRCULAR_NAG_URL` (gateway base URL),
    /// `CIRCULAR_NETWORK` (node identifier) and `CIRCULAR_BLOCKCHAIN`.
    /// A variable that is set but empty is an error.
    pub fn from_env() -> Result<Self, Error> {
        let mut builder = Self::new();
        if let Some(url) = env_value("CIRCULAR_NAG_URL")? {
            builder = builder.gateway_url(url);
        }
        if let Some(network) = env_value("CIRCULAR_NETWORK")? {
            builder = builder.network_node(network);
        }
        if let Some(blockchain) = env_value("CIRCULAR_BLOCKCHAIN")? {
            builder = builder.blockchain(blockchain);
        }
        Ok(builder)
    }

    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.config.gateway.url = url.into();
        self
    }

    pub fn network_node(mut self, node: impl Into<String>) -> Self {
        self.config.gateway.node = node.into();
        self
    }

    pub fn blockchain(mut self, blockchain: impl Into<String>) -> Self {
        self.config.blockchain = blockchain.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll.interval = interval;
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll.timeout = timeout;
        self
    }

    /// Timeout for each request of the default HTTP transport. Ignored when
    /// a custom transport is set.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Send requests through a custom transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Resolve network names with a custom resolver.
    pub fn resolver(mut self, resolver: Arc<dyn NetworkResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Validate the configuration and build a closed account.
    pub fn build(self) -> Result<Account, Error> {
        self.config.poll.validate()?;
        validate_blockchain(&self.config.blockchain)?;
        if self.config.version.is_empty() {
            return Err(Error::Config("version cannot be empty".to_string()));
        }
        Ok(self.assemble())
    }

    fn assemble(self) -> Account {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::with_timeout(self.config.request_timeout)),
        };
        let gateway_client = GatewayClient::new(transport);
        let resolver: Arc<dyn NetworkResolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(DiscoveryResolver::new(gateway_client.clone())),
        };
        let state = AccountState::new(&self.config, 0);

        Account {
            config: self.config,
            gateway_client,
            resolver,
            state: Mutex::new(state),
            submissions: tokio::sync::Mutex::new(()),
        }
    }
}

fn env_value(name: &str) -> Result<Option<String>, Error> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => {
            Err(Error::Config(format!("{name} is set but empty")))
        }
        Ok(value) => Ok(Some(value)),
        Err(_) => Ok(None),
    }
}
