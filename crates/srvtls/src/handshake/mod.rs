//! TLS 1.0-1.2 server handshake state machine.
//!
//! Every handler consumes the current [`HandshakeState`] and
//! [`SecurityParameters`] and returns a [`Transition`] carrying their
//! successors plus the outputs to apply.

pub mod codec;
pub mod extensions_codec;
pub mod finished;
pub mod key_exchange;
pub mod negotiate;
pub mod params;
pub mod server;
pub mod signing;

use crate::alert::{Alert, AlertDescription, AlertLevel};
use crate::config::ServerConfig;
use crate::crypt::traffic_keys::CipherContext;
use crate::crypt::transcript::Transcript;
use crate::record::{ContentType, Output};
use params::SecurityParameters;
use srvtls_types::TlsError;
use tracing::{debug, warn};

/// Handshake message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeType {
    HelloRequest = 0,
    ClientHello = 1,
    ServerHello = 2,
    Certificate = 11,
    ServerKeyExchange = 12,
    CertificateRequest = 13,
    ServerHelloDone = 14,
    CertificateVerify = 15,
    ClientKeyExchange = 16,
    Finished = 20,
}

impl HandshakeType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(HandshakeType::HelloRequest),
            1 => Some(HandshakeType::ClientHello),
            2 => Some(HandshakeType::ServerHello),
            11 => Some(HandshakeType::Certificate),
            12 => Some(HandshakeType::ServerKeyExchange),
            13 => Some(HandshakeType::CertificateRequest),
            14 => Some(HandshakeType::ServerHelloDone),
            15 => Some(HandshakeType::CertificateVerify),
            16 => Some(HandshakeType::ClientKeyExchange),
            20 => Some(HandshakeType::Finished),
            _ => None,
        }
    }
}

/// Server handshake state.
#[derive(Debug)]
pub enum HandshakeState {
    /// Waiting for the first ClientHello.
    Initial,
    /// First flight sent; waiting for ClientKeyExchange.
    Handshaking(Transcript),
    /// Keys derived. The contexts are handed out one by one as the
    /// ChangeCipherSpec exchange happens; both are `None` once the
    /// client's ChangeCipherSpec has been processed.
    KeysExchanged {
        server_ctx: Option<CipherContext>,
        client_ctx: Option<CipherContext>,
        transcript: Transcript,
    },
    /// Handshake complete; application data flows.
    Established,
}

impl HandshakeState {
    pub fn name(&self) -> &'static str {
        match self {
            HandshakeState::Initial => "Initial",
            HandshakeState::Handshaking(_) => "Handshaking",
            HandshakeState::KeysExchanged { .. } => "KeysExchanged",
            HandshakeState::Established => "Established",
        }
    }
}

/// Result of a handler: next state, next parameters and outputs in order.
#[derive(Debug)]
pub struct Transition {
    pub state: HandshakeState,
    pub params: SecurityParameters,
    pub outputs: Vec<Output>,
    /// Install this context for incoming records after the outputs.
    pub switch_decryption: Option<CipherContext>,
}

impl Transition {
    pub fn new(state: HandshakeState, params: SecurityParameters) -> Self {
        Self::with_outputs(state, params, Vec::new())
    }

    pub fn with_outputs(
        state: HandshakeState,
        params: SecurityParameters,
        outputs: Vec<Output>,
    ) -> Self {
        Self {
            state,
            params,
            outputs,
            switch_decryption: None,
        }
    }
}

/// Process a handshake record, which may carry several messages.
pub fn handle_handshake(
    config: &ServerConfig,
    state: HandshakeState,
    params: SecurityParameters,
    fragment: &[u8],
) -> Result<Transition, TlsError> {
    if fragment.is_empty() {
        return Err(TlsError::DecodeError("empty handshake record".into()));
    }

    let mut current = Transition::new(state, params);
    let mut pos = 0;
    while pos < fragment.len() {
        let (msg_type, body, used) = codec::parse_handshake_header(&fragment[pos..])?;
        let raw = &fragment[pos..pos + used];
        pos += used;
        debug!(?msg_type, len = body.len(), state = current.state.name(), "handshake message");

        let mut next = handle_message(config, current.state, current.params, msg_type, body, raw)?;
        current.outputs.append(&mut next.outputs);
        if next.switch_decryption.is_some() {
            current.switch_decryption = next.switch_decryption.take();
        }
        current.state = next.state;
        current.params = next.params;
    }
    Ok(current)
}

fn handle_message(
    config: &ServerConfig,
    state: HandshakeState,
    params: SecurityParameters,
    msg_type: HandshakeType,
    body: &[u8],
    raw: &[u8],
) -> Result<Transition, TlsError> {
    match (state, msg_type) {
        (HandshakeState::Initial, HandshakeType::ClientHello) => {
            server::handle_client_hello(config, params, body, raw, false)
        }
        (HandshakeState::Handshaking(transcript), HandshakeType::ClientKeyExchange) => {
            key_exchange::handle_client_key_exchange(params, transcript, body, raw)
        }
        (
            HandshakeState::KeysExchanged {
                server_ctx,
                client_ctx,
                transcript,
            },
            HandshakeType::Finished,
        ) => finished::handle_finished(params, server_ctx, client_ctx, transcript, body, raw),
        (HandshakeState::Established, HandshakeType::ClientHello) => {
            if config.allow_renegotiation {
                server::handle_client_hello(config, params, body, raw, true)
            } else {
                warn!("refusing client-initiated renegotiation");
                let alert = Alert::new(AlertLevel::Warning, AlertDescription::NoRenegotiation);
                Ok(Transition::with_outputs(
                    HandshakeState::Established,
                    params,
                    vec![alert.to_output()],
                ))
            }
        }
        (state, msg_type) => Err(TlsError::UnexpectedMessage(format!(
            "{msg_type:?} in state {}",
            state.name()
        ))),
    }
}

/// Build a HelloRequest asking the client to renegotiate.
///
/// Only valid once established. HelloRequest is never part of the
/// handshake transcript.
pub fn hello_request(config: &ServerConfig, state: &HandshakeState) -> Result<Output, TlsError> {
    if !config.allow_renegotiation {
        return Err(TlsError::NoRenegotiation);
    }
    match state {
        HandshakeState::Established => Ok(Output::Record {
            content_type: ContentType::Handshake,
            data: codec::encode_hello_request(),
        }),
        other => Err(TlsError::UnexpectedMessage(format!(
            "HelloRequest in state {}",
            other.name()
        ))),
    }
}
