//! Sans-IO server handshake driver.
//!
//! [`ServerHandshake`] owns the handshake state and parameters of one
//! connection. The caller feeds it unprotected records and drains
//! [`Output`]s, applying them to its record layer in order.

use crate::alert::{alert_for_error, Alert, AlertLevel};
use crate::config::ServerConfig;
use crate::handshake::params::SecurityParameters;
use crate::handshake::{self, HandshakeState};
use crate::record::{self, ContentType, Output};
use crate::{CipherSuite, TlsError, TlsVersion};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionState {
    Active,
    Closed,
    Error,
}

/// A server-side TLS 1.0-1.2 handshake.
pub struct ServerHandshake {
    config: Arc<ServerConfig>,
    state: HandshakeState,
    params: SecurityParameters,
    conn_state: ConnectionState,
    pending: VecDeque<Output>,
}

impl ServerHandshake {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        let params = SecurityParameters::new(&config);
        Self {
            config,
            state: HandshakeState::Initial,
            params,
            conn_state: ConnectionState::Active,
            pending: VecDeque::new(),
        }
    }

    /// Process one incoming record, already unprotected by the record layer.
    ///
    /// On error a fatal alert is queued (unless the error is the peer's own
    /// alert) and the handshake refuses all further input.
    pub fn handle_record(&mut self, content_type: ContentType, fragment: &[u8]) -> Result<(), TlsError> {
        match self.conn_state {
            ConnectionState::Active => {}
            ConnectionState::Closed => {
                return Err(TlsError::UnexpectedMessage("connection closed".into()))
            }
            ConnectionState::Error => {
                return Err(TlsError::UnexpectedMessage("connection failed".into()))
            }
        }

        let state = std::mem::replace(&mut self.state, HandshakeState::Initial);
        let params = std::mem::take(&mut self.params);
        match record::handle_record(&self.config, state, params, content_type, fragment) {
            Ok(t) => {
                self.state = t.state;
                self.params = t.params;
                for out in t.outputs {
                    if matches!(out, Output::Closed) {
                        self.conn_state = ConnectionState::Closed;
                    }
                    self.pending.push_back(out);
                }
                if let Some(ctx) = t.switch_decryption {
                    self.pending.push_back(Output::SwitchDecryption(ctx));
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "handshake failed");
                if !e.is_peer_alert() {
                    let alert = Alert::new(AlertLevel::Fatal, alert_for_error(&e));
                    self.pending.push_back(alert.to_output());
                }
                self.conn_state = ConnectionState::Error;
                Err(e)
            }
        }
    }

    /// Ask the client to renegotiate by queueing a HelloRequest.
    pub fn hello_request(&mut self) -> Result<(), TlsError> {
        if self.conn_state != ConnectionState::Active {
            return Err(TlsError::UnexpectedMessage("connection not active".into()));
        }
        let out = handshake::hello_request(&self.config, &self.state)?;
        debug!("queued HelloRequest");
        self.pending.push_back(out);
        Ok(())
    }

    /// Next output for the record layer, if any.
    pub fn poll_output(&mut self) -> Option<Output> {
        self.pending.pop_front()
    }

    pub fn drain_outputs(&mut self) -> Vec<Output> {
        self.pending.drain(..).collect()
    }

    pub fn version(&self) -> Option<TlsVersion> {
        self.params.protocol_version
    }

    pub fn cipher_suite(&self) -> Option<CipherSuite> {
        self.params.ciphersuite
    }

    pub fn server_name(&self) -> Option<&str> {
        self.params.server_name.as_deref()
    }

    pub fn is_established(&self) -> bool {
        self.conn_state == ConnectionState::Active
            && matches!(self.state, HandshakeState::Established)
    }

    pub fn is_closed(&self) -> bool {
        self.conn_state == ConnectionState::Closed
    }

    pub fn has_failed(&self) -> bool {
        self.conn_state == ConnectionState::Error
    }

    pub fn params(&self) -> &SecurityParameters {
        &self.params
    }

    pub fn state(&self) -> &HandshakeState {
        &self.state
    }
}

impl std::fmt::Debug for ServerHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandshake")
            .field("state", &self.state.name())
            .field("conn_state", &self.conn_state)
            .field("params", &self.params)
            .field("pending", &self.pending.len())
            .finish()
    }
}
