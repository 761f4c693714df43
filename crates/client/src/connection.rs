//! Simulated transport connection
//!
//! `MirageConnection` stands in for one pooled transport connection. It owns
//! an engine session instead of a socket, but presents the contract real
//! transport code presents: lazy connect on first use, connection-refused at
//! connect time against a down server, fail-fast reads against a dead
//! server, blocking reads against a live one, and recursive reply decoding.
//!
//! State machine: `Unconnected -> Connected -> (Disconnected | Errored)`.
//! Disconnect is idempotent and safe from a state that never connected.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use mirage_core::{MirageError, MirageResult, TextEncoding, Value};
use mirage_engine::{CommandEngine, EngineSession, Request, ServerState};

use crate::selector::ResponseSelector;

/// Lifecycle state of a simulated connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created but not yet used
    Unconnected,
    /// Engine session attached and usable
    Connected,
    /// Explicitly torn down
    Disconnected,
    /// A connect attempt was refused
    Errored,
}

/// Options controlling one `read_response` call.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Return the reply undecoded even when the connection decodes by default
    pub disable_decoding: bool,
    /// Disconnect before surfacing a connection-lost failure (default on)
    pub disconnect_on_error: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            disable_decoding: false,
            disconnect_on_error: true,
        }
    }
}

/// Everything a factory needs to stamp out one connection.
#[derive(Clone)]
pub struct ConnectionSpec {
    /// Shared server state this connection is bound to
    pub server: Arc<ServerState>,
    /// Identity key the server was resolved under
    pub server_key: String,
    /// Selected database index
    pub db: usize,
    /// Command engine producing sessions
    pub engine: Arc<dyn CommandEngine>,
    /// Reply decoding policy
    pub encoding: TextEncoding,
    /// Whether the owning client asked for decoded responses
    pub decode_responses: bool,
    /// Optional client display name, announced on connect
    pub client_name: Option<String>,
}

impl fmt::Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("server_key", &self.server_key)
            .field("db", &self.db)
            .field("decode_responses", &self.decode_responses)
            .field("client_name", &self.client_name)
            .finish_non_exhaustive()
    }
}

/// Stand-in for a transport connection, redirecting I/O to an in-process
/// command engine bound to shared server state.
pub struct MirageConnection {
    server: Arc<ServerState>,
    server_key: String,
    db: usize,
    engine: Arc<dyn CommandEngine>,
    encoding: TextEncoding,
    decode_responses: bool,
    client_name: Option<String>,
    session: Option<Box<dyn EngineSession>>,
    selector: Option<ResponseSelector>,
    state: ConnectionState,
}

impl MirageConnection {
    /// Create an unconnected connection from a factory spec.
    pub fn new(spec: ConnectionSpec) -> Self {
        MirageConnection {
            server: spec.server,
            server_key: spec.server_key,
            db: spec.db,
            engine: spec.engine,
            encoding: spec.encoding,
            decode_responses: spec.decode_responses,
            client_name: spec.client_name,
            session: None,
            selector: None,
            state: ConnectionState::Unconnected,
        }
    }

    /// Identity key of the bound server.
    pub fn server_key(&self) -> &str {
        &self.server_key
    }

    /// The shared server state this connection observes.
    pub fn server(&self) -> &Arc<ServerState> {
        &self.server
    }

    /// Selected database index.
    pub fn db(&self) -> usize {
        self.db
    }

    /// Client display name, if configured.
    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True while an engine session is attached.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Attach an engine session, or fail exactly as a refused socket would.
    ///
    /// Idempotent while connected. Re-initializes the selector over the
    /// fresh session's reply queue, and announces the configured client
    /// name the way real transport code runs its on-connect sequence.
    pub fn connect(&mut self) -> MirageResult<()> {
        if !self.server.is_connected() {
            self.state = ConnectionState::Errored;
            return Err(MirageError::ConnectionRefused);
        }
        if self.session.is_some() {
            return Ok(());
        }
        let session = self.engine.attach(Arc::clone(&self.server), self.db)?;
        self.selector = Some(ResponseSelector::new(session.replies()));
        self.session = Some(session);
        self.state = ConnectionState::Connected;
        debug!(server = %self.server_key, db = self.db, "connected");
        if let Some(name) = self.client_name.clone() {
            self.announce_client_name(&name);
        }
        Ok(())
    }

    // The on-connect handshake: issue CLIENT SETNAME and swallow its reply
    // so the caller's first read sees its own response, not ours.
    fn announce_client_name(&mut self, name: &str) {
        if let Some(session) = self.session.as_mut() {
            session.submit(vec![
                b"CLIENT".to_vec(),
                b"SETNAME".to_vec(),
                name.as_bytes().to_vec(),
            ]);
            let _ = session.replies().pop();
        }
    }

    /// Whether a reply can be read without blocking.
    ///
    /// Against a down server this returns `true` immediately so the caller's
    /// next read surfaces the connection error instead of blocking: a
    /// readiness check never blocks on a dead server. Connects lazily if
    /// needed; otherwise delegates to the selector with the given timeout
    /// (`Duration::ZERO` polls, positive values wait at most that long).
    pub fn can_read(&mut self, timeout: Duration) -> MirageResult<bool> {
        if !self.server.is_connected() {
            return Ok(true);
        }
        if self.session.is_none() {
            self.connect()?;
        }
        let selector = self
            .selector
            .as_ref()
            .ok_or(MirageError::ConnectionLost)?;
        Ok(selector.check_can_read(timeout))
    }

    /// Submit one request to the engine, connecting lazily on first use.
    ///
    /// Writing to a server that went down after the session attached fails
    /// with `ConnectionLost`, matching a send on a dead socket.
    pub fn send_command(&mut self, request: Request) -> MirageResult<()> {
        if self.session.is_none() {
            self.connect()?;
        } else if !self.server.is_connected() {
            return Err(MirageError::ConnectionLost);
        }
        match self.session.as_mut() {
            Some(session) => {
                session.submit(request);
                Ok(())
            }
            None => Err(MirageError::ConnectionLost),
        }
    }

    /// Fetch the next reply.
    ///
    /// Down server: non-blocking fetch of anything already buffered, then
    /// `ConnectionLost` (optionally disconnecting first, per
    /// [`ReadOptions::disconnect_on_error`]) — an already-dead server fails
    /// fast rather than hanging. Live server: genuine blocking wait for the
    /// next queued reply.
    ///
    /// A fetched [`Value::Error`] propagates as [`MirageError::Remote`]
    /// immediately, bypassing decoding so the engine's message arrives
    /// verbatim. Otherwise the reply decodes recursively unless the caller
    /// opted out or the client asked for raw responses.
    pub fn read_response(&mut self, options: &ReadOptions) -> MirageResult<Value> {
        let response = if !self.server.is_connected() {
            let buffered = self
                .selector
                .as_ref()
                .and_then(|selector| selector.replies().try_pop());
            match buffered {
                Some(response) => response,
                None => {
                    if options.disconnect_on_error {
                        self.disconnect();
                    }
                    return Err(MirageError::ConnectionLost);
                }
            }
        } else {
            if self.session.is_none() {
                self.connect()?;
            }
            match self.selector.as_ref() {
                Some(selector) => selector.replies().pop(),
                None => return Err(MirageError::ConnectionLost),
            }
        };

        if let Value::Error(err) = response {
            return Err(MirageError::Remote(err));
        }
        if options.disable_decoding || !self.decode_responses {
            return Ok(response);
        }
        response.decode(&self.encoding)
    }

    /// Submit a request and fetch its reply with default read options.
    pub fn execute(&mut self, request: Request) -> MirageResult<Value> {
        self.send_command(request)?;
        self.read_response(&ReadOptions::default())
    }

    /// Tear down the engine session.
    ///
    /// Safe to call repeatedly and from a state that never connected. The
    /// reply queue is unregistered from every subscriber set and parked on
    /// the server's deferred-teardown list; shared server state is left
    /// intact for every other connection.
    pub fn disconnect(&mut self) {
        if let Some(selector) = self.selector.take() {
            self.server.retire(selector.replies());
            debug!(server = %self.server_key, db = self.db, "disconnected");
        }
        self.session = None;
        if self.state != ConnectionState::Errored {
            self.state = ConnectionState::Disconnected;
        }
    }
}

impl Drop for MirageConnection {
    fn drop(&mut self) {
        // Dropping the session is enough for weak subscriber decay; retiring
        // eagerly keeps the registries tidy when owners disconnect via drop.
        self.disconnect();
    }
}

impl fmt::Display for MirageConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.server_key)
    }
}

impl fmt::Debug for MirageConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pieces = f.debug_struct("MirageConnection");
        pieces.field("server", &self.server_key).field("db", &self.db);
        if let Some(name) = &self.client_name {
            pieces.field("client_name", name);
        }
        pieces.finish()
    }
}
