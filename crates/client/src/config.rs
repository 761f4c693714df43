//! Client construction options
//!
//! The wrapped client library's constructor takes a wide keyword surface and
//! fills in defaults by introspecting its own signature. The explicit
//! replacement is this enumerated option struct: every recognized option,
//! its default, and a small translation table for the deprecated aliases.
//!
//! Networking identity (`host`, `port`, `db`, `path`) stays unset unless the
//! caller supplies it — omitted identity deliberately produces an isolated,
//! unshared server per client.
//!
//! Three options are recognized on top of the wrapped surface and stripped
//! before anything reaches pool construction: `server` (an explicit
//! shared-state handle), `connected` (initial connectivity), and `version`
//! (protocol tag).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mirage_core::{MirageResult, TextEncoding};
use mirage_engine::{ServerState, DEFAULT_PROTOCOL_VERSION};

/// A legacy option translated during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deprecation {
    /// `charset` supplied; use `encoding` instead
    Charset,
    /// `errors` supplied; use `encoding_errors` instead
    Errors,
}

impl fmt::Display for Deprecation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deprecation::Charset => f.write_str("'charset' is deprecated; use 'encoding' instead"),
            Deprecation::Errors => {
                f.write_str("'errors' is deprecated; use 'encoding_errors' instead")
            }
        }
    }
}

/// Full construction surface of a [`crate::client::MirageClient`].
///
/// Defaults mirror the wrapped constructor's defaults for every option the
/// caller does not supply, except the identity parameters, which stay
/// `None` on purpose.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Server host; participates in identity resolution
    pub host: Option<String>,
    /// Server port; participates in identity resolution
    pub port: Option<u16>,
    /// Explicit identity path (unix-socket style); wins over host/port
    pub path: Option<String>,
    /// Database index (`0` when unset)
    pub db: Option<usize>,
    /// Socket timeout of the wrapped surface; carried through to the pool
    pub socket_timeout: Option<Duration>,
    /// Reply text codec name (`utf-8` when unset)
    pub encoding: Option<String>,
    /// Codec error mode (`strict` when unset)
    pub encoding_errors: Option<String>,
    /// Whether replies decode to text
    pub decode_responses: bool,
    /// Retry-on-timeout flag of the wrapped surface
    pub retry_on_timeout: bool,
    /// Pool cap; unlimited when unset
    pub max_connections: Option<usize>,
    /// Health-check interval of the wrapped surface
    pub health_check_interval: Option<Duration>,
    /// Client display name announced on connect
    pub client_name: Option<String>,
    /// Accepted but never forwarded: authentication is not emulated
    pub username: Option<String>,
    /// Accepted but never forwarded: authentication is not emulated
    pub password: Option<String>,

    /// Explicit shared-state handle; skips identity resolution entirely
    pub server: Option<Arc<ServerState>>,
    /// Initial connectivity of a server resolved by identity (`true` when unset)
    pub connected: Option<bool>,
    /// Protocol version tag (`7` when unset)
    pub version: Option<u8>,

    /// Deprecated alias for `encoding`
    pub charset: Option<String>,
    /// Deprecated alias for `encoding_errors`
    pub errors: Option<String>,
}

impl ClientConfig {
    /// Fresh config with every option at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the server port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set an explicit identity path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Select a database index.
    pub fn with_db(mut self, db: usize) -> Self {
        self.db = Some(db);
        self
    }

    /// Decode replies to text.
    pub fn with_decode_responses(mut self) -> Self {
        self.decode_responses = true;
        self
    }

    /// Set the reply text codec.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the codec error mode.
    pub fn with_encoding_errors(mut self, errors: impl Into<String>) -> Self {
        self.encoding_errors = Some(errors.into());
        self
    }

    /// Set the client display name.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    /// Cap the connection pool.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Bind to an explicit shared server state.
    pub fn with_server(mut self, server: Arc<ServerState>) -> Self {
        self.server = Some(server);
        self
    }

    /// Start with the simulated server refusing traffic.
    pub fn disconnected(mut self) -> Self {
        self.connected = Some(false);
        self
    }

    /// Pick the protocol version tag.
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = Some(version);
        self
    }

    /// Effective database index.
    pub fn effective_db(&self) -> usize {
        self.db.unwrap_or(0)
    }

    /// Effective initial connectivity.
    pub fn effective_connected(&self) -> bool {
        self.connected.unwrap_or(true)
    }

    /// Effective protocol version.
    pub fn effective_version(&self) -> u8 {
        self.version.unwrap_or(DEFAULT_PROTOCOL_VERSION)
    }

    /// Translate deprecated aliases onto their current names.
    ///
    /// Returns one [`Deprecation`] per legacy option supplied, whether or
    /// not its value was used: when both the alias and the current name are
    /// set, the current name wins and the alias is discarded — loudly,
    /// never silently.
    pub fn normalize(&mut self) -> Vec<Deprecation> {
        let mut deprecations = Vec::new();
        if let Some(charset) = self.charset.take() {
            if self.encoding.is_none() {
                self.encoding = Some(charset);
            }
            deprecations.push(Deprecation::Charset);
        }
        if let Some(errors) = self.errors.take() {
            if self.encoding_errors.is_none() {
                self.encoding_errors = Some(errors);
            }
            deprecations.push(Deprecation::Errors);
        }
        deprecations
    }

    /// Build the validated decoding policy from the (normalized) options.
    pub fn text_encoding(&self) -> MirageResult<TextEncoding> {
        TextEncoding::new(
            self.encoding.as_deref().unwrap_or("utf-8"),
            self.encoding_errors.as_deref().unwrap_or("strict"),
        )
    }
}

/// The fixed allow-list of options that reach pool construction.
///
/// Everything else on [`ClientConfig`] is consumed by the client itself.
/// Credentials never appear here: authentication is not emulated, so
/// forwarding them could only mislead.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Server host
    pub host: Option<String>,
    /// Server port
    pub port: Option<u16>,
    /// Database index
    pub db: usize,
    /// Socket timeout
    pub socket_timeout: Option<Duration>,
    /// Validated decoding policy (from `encoding` + `encoding_errors`)
    pub encoding: TextEncoding,
    /// Whether replies decode to text
    pub decode_responses: bool,
    /// Retry-on-timeout flag
    pub retry_on_timeout: bool,
    /// Pool cap
    pub max_connections: Option<usize>,
    /// Health-check interval
    pub health_check_interval: Option<Duration>,
    /// Client display name
    pub client_name: Option<String>,
}

impl ClientConfig {
    /// Project the pool-facing subset of these options.
    ///
    /// Fails only when the encoding options do not validate.
    pub fn pool_options(&self) -> MirageResult<PoolOptions> {
        Ok(PoolOptions {
            host: self.host.clone(),
            port: self.port,
            db: self.effective_db(),
            socket_timeout: self.socket_timeout,
            encoding: self.text_encoding()?,
            decode_responses: self.decode_responses,
            retry_on_timeout: self.retry_on_timeout,
            max_connections: self.max_connections,
            health_check_interval: self.health_check_interval,
            client_name: self.client_name.clone(),
        })
    }
}
