//! Command engine interface and the reference engine
//!
//! The connection layer treats the command engine as an opaque
//! request/response processor: [`CommandEngine::attach`] binds a session to
//! a server's database, and the session exposes a submit side plus a reply
//! queue. One reply is enqueued per submitted request — an ordinary value,
//! an array, or a designated error value ([`Value::Error`]); subscription
//! confirmations are the usual exception and arrive one per channel.
//!
//! [`CoreEngine`] is the bundled reference engine: a compact command set
//! sufficient to exercise the substitution layer end to end. It executes
//! synchronously on the submitting thread; replies are queued before
//! `submit` returns.

use std::sync::Arc;

use tracing::trace;

use mirage_core::{MirageResult, RemoteError, Value};

use crate::queue::ReplyQueue;
use crate::server::ServerState;

/// One request as submitted on the transport path: command name plus
/// arguments, each as raw bytes.
pub type Request = Vec<Vec<u8>>;

/// Factory binding sessions to a server's selected database.
pub trait CommandEngine: Send + Sync {
    /// Bind a new session to `server`, initially targeting database `db`.
    fn attach(&self, server: Arc<ServerState>, db: usize) -> MirageResult<Box<dyn EngineSession>>;
}

/// A bound request/response channel to the command engine.
pub trait EngineSession: Send {
    /// Submit one request. Its reply (or replies, for subscription
    /// confirmations) lands on [`EngineSession::replies`].
    fn submit(&mut self, request: Request);

    /// The reply queue this session feeds.
    fn replies(&self) -> Arc<ReplyQueue>;
}

/// Reference command engine with a compact, string-and-pubsub command set.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoreEngine;

impl CoreEngine {
    /// Creates the reference engine.
    pub fn new() -> Self {
        CoreEngine
    }
}

impl CommandEngine for CoreEngine {
    fn attach(&self, server: Arc<ServerState>, db: usize) -> MirageResult<Box<dyn EngineSession>> {
        Ok(Box::new(CoreSession {
            server,
            db,
            replies: Arc::new(ReplyQueue::new()),
            client_name: None,
            channels: Vec::new(),
            patterns: Vec::new(),
        }))
    }
}

/// Session state for [`CoreEngine`]: selected database, client name, and
/// this connection's active subscriptions.
struct CoreSession {
    server: Arc<ServerState>,
    db: usize,
    replies: Arc<ReplyQueue>,
    client_name: Option<String>,
    channels: Vec<String>,
    patterns: Vec<String>,
}

impl EngineSession for CoreSession {
    fn submit(&mut self, request: Request) {
        for reply in self.dispatch(request) {
            self.replies.push(reply);
        }
    }

    fn replies(&self) -> Arc<ReplyQueue> {
        Arc::clone(&self.replies)
    }
}

fn ok() -> Value {
    Value::Bytes(b"OK".to_vec())
}

fn wrong_arity(command: &str) -> Value {
    Value::Error(RemoteError::generic(format!(
        "wrong number of arguments for '{}' command",
        command.to_ascii_lowercase()
    )))
}

fn not_an_integer() -> Value {
    Value::Error(RemoteError::generic(
        "value is not an integer or out of range",
    ))
}

impl CoreSession {
    fn subscription_count(&self) -> i64 {
        (self.channels.len() + self.patterns.len()) as i64
    }

    fn dispatch(&mut self, request: Request) -> Vec<Value> {
        let Some(name) = request.first() else {
            return vec![Value::Error(RemoteError::generic("empty command"))];
        };
        let command = String::from_utf8_lossy(name).to_ascii_uppercase();
        let args = &request[1..];
        trace!(server = %self.server.key(), db = self.db, %command, "dispatch");

        match command.as_str() {
            "PING" => match args {
                [] => vec![Value::Bytes(b"PONG".to_vec())],
                [msg] => vec![Value::Bytes(msg.clone())],
                _ => vec![wrong_arity(&command)],
            },
            "ECHO" => match args {
                [msg] => vec![Value::Bytes(msg.clone())],
                _ => vec![wrong_arity(&command)],
            },
            "GET" => match args {
                [key] => vec![self
                    .server
                    .with_db(self.db, |db| db.get(key).cloned())
                    .unwrap_or(Value::Nil)],
                _ => vec![wrong_arity(&command)],
            },
            "SET" => match args {
                [key, value] => {
                    let (key, value) = (key.clone(), Value::Bytes(value.clone()));
                    self.server.with_db(self.db, |db| db.set(key, value));
                    vec![ok()]
                }
                _ => vec![wrong_arity(&command)],
            },
            "DEL" => {
                if args.is_empty() {
                    return vec![wrong_arity(&command)];
                }
                let removed = self.server.with_db(self.db, |db| {
                    args.iter().filter(|key| db.remove(key)).count()
                });
                vec![Value::Int(removed as i64)]
            }
            "EXISTS" => {
                if args.is_empty() {
                    return vec![wrong_arity(&command)];
                }
                let present = self.server.with_db(self.db, |db| {
                    args.iter().filter(|key| db.contains(key)).count()
                });
                vec![Value::Int(present as i64)]
            }
            "INCR" => match args {
                [key] => vec![self.incr(key)],
                _ => vec![wrong_arity(&command)],
            },
            "DBSIZE" => match args {
                [] => vec![Value::Int(
                    self.server.with_db(self.db, |db| db.len()) as i64
                )],
                _ => vec![wrong_arity(&command)],
            },
            "FLUSHDB" => match args {
                [] => {
                    self.server.with_db(self.db, |db| db.clear());
                    vec![ok()]
                }
                _ => vec![wrong_arity(&command)],
            },
            "FLUSHALL" => match args {
                [] => {
                    self.server.flush_all();
                    vec![ok()]
                }
                _ => vec![wrong_arity(&command)],
            },
            "SELECT" => match args {
                [index] => match parse_int(index) {
                    Some(index) if index >= 0 => {
                        self.db = index as usize;
                        vec![ok()]
                    }
                    _ => vec![not_an_integer()],
                },
                _ => vec![wrong_arity(&command)],
            },
            "LASTSAVE" => match args {
                [] => vec![Value::Int(
                    self.server.lastsave().map(|t| t.timestamp()).unwrap_or(0),
                )],
                _ => vec![wrong_arity(&command)],
            },
            "SAVE" => match args {
                [] => {
                    self.server.mark_saved();
                    vec![ok()]
                }
                _ => vec![wrong_arity(&command)],
            },
            "PUBLISH" => match args {
                [channel, payload] => {
                    let channel = String::from_utf8_lossy(channel).into_owned();
                    vec![Value::Int(self.server.publish(&channel, payload) as i64)]
                }
                _ => vec![wrong_arity(&command)],
            },
            "SUBSCRIBE" => {
                if args.is_empty() {
                    return vec![wrong_arity(&command)];
                }
                self.subscribe_each(args, false)
            }
            "PSUBSCRIBE" => {
                if args.is_empty() {
                    return vec![wrong_arity(&command)];
                }
                self.subscribe_each(args, true)
            }
            "UNSUBSCRIBE" => self.unsubscribe_each(args, false),
            "PUNSUBSCRIBE" => self.unsubscribe_each(args, true),
            "CLIENT" => self.client_subcommand(args),
            _ => vec![Value::Error(RemoteError::generic(format!(
                "unknown command '{}'",
                String::from_utf8_lossy(name)
            )))],
        }
    }

    fn incr(&mut self, key: &[u8]) -> Value {
        self.server.with_db(self.db, |db| {
            let current = match db.get(key) {
                None => Some(0),
                Some(Value::Bytes(bytes)) => parse_int(bytes),
                Some(_) => None,
            };
            match current.and_then(|n| n.checked_add(1)) {
                Some(next) => {
                    db.set(key.to_vec(), Value::Bytes(next.to_string().into_bytes()));
                    Value::Int(next)
                }
                None => not_an_integer(),
            }
        })
    }

    fn subscribe_each(&mut self, args: &[Vec<u8>], pattern: bool) -> Vec<Value> {
        let queue = self.replies();
        let kind: &[u8] = if pattern { b"psubscribe" } else { b"subscribe" };
        let mut confirmations = Vec::with_capacity(args.len());
        for name in args {
            let name_str = String::from_utf8_lossy(name).into_owned();
            let list = if pattern { &mut self.patterns } else { &mut self.channels };
            if !list.contains(&name_str) {
                list.push(name_str.clone());
            }
            if pattern {
                self.server.psubscribe(&name_str, &queue);
            } else {
                self.server.subscribe(&name_str, &queue);
            }
            confirmations.push(Value::Array(vec![
                Value::Bytes(kind.to_vec()),
                Value::Bytes(name.clone()),
                Value::Int(self.subscription_count()),
            ]));
        }
        confirmations
    }

    fn unsubscribe_each(&mut self, args: &[Vec<u8>], pattern: bool) -> Vec<Value> {
        let queue = self.replies();
        let kind: &[u8] = if pattern { b"punsubscribe" } else { b"unsubscribe" };
        let names: Vec<String> = if args.is_empty() {
            // no arguments: drop every active subscription of this kind
            if pattern {
                self.patterns.clone()
            } else {
                self.channels.clone()
            }
        } else {
            args.iter()
                .map(|name| String::from_utf8_lossy(name).into_owned())
                .collect()
        };
        if names.is_empty() {
            return vec![Value::Array(vec![
                Value::Bytes(kind.to_vec()),
                Value::Nil,
                Value::Int(self.subscription_count()),
            ])];
        }
        let mut confirmations = Vec::with_capacity(names.len());
        for name in names {
            if pattern {
                self.server.punsubscribe(&name, &queue);
                self.patterns.retain(|p| p != &name);
            } else {
                self.server.unsubscribe(&name, &queue);
                self.channels.retain(|c| c != &name);
            }
            confirmations.push(Value::Array(vec![
                Value::Bytes(kind.to_vec()),
                Value::Bytes(name.into_bytes()),
                Value::Int(self.subscription_count()),
            ]));
        }
        confirmations
    }

    fn client_subcommand(&mut self, args: &[Vec<u8>]) -> Vec<Value> {
        let Some(sub) = args.first() else {
            return vec![wrong_arity("client")];
        };
        match String::from_utf8_lossy(sub).to_ascii_uppercase().as_str() {
            "SETNAME" => match &args[1..] {
                [name] => {
                    self.client_name = Some(String::from_utf8_lossy(name).into_owned());
                    vec![ok()]
                }
                _ => vec![wrong_arity("client|setname")],
            },
            "GETNAME" => vec![match &self.client_name {
                Some(name) => Value::Bytes(name.clone().into_bytes()),
                None => Value::Nil,
            }],
            other => vec![Value::Error(RemoteError::generic(format!(
                "unknown subcommand '{}'",
                other.to_ascii_lowercase()
            )))],
        }
    }
}

fn parse_int(bytes: &[u8]) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}
