//! Record dispatch: routes incoming records by content type and describes
//! what the record layer must do next.

use crate::alert;
use crate::config::ServerConfig;
use crate::crypt::traffic_keys::CipherContext;
use crate::handshake::params::SecurityParameters;
use crate::handshake::{self, finished, HandshakeState, Transition};
use srvtls_types::TlsError;

/// TLS record content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl ContentType {
    /// Convert from u8 to ContentType.
    pub fn from_u8(v: u8) -> Result<Self, u8> {
        match v {
            20 => Ok(ContentType::ChangeCipherSpec),
            21 => Ok(ContentType::Alert),
            22 => Ok(ContentType::Handshake),
            23 => Ok(ContentType::ApplicationData),
            _ => Err(v),
        }
    }
}

/// A directive for the record layer / transport.
///
/// Outputs must be applied in order. A switch directive takes effect for
/// the next record in its direction.
#[derive(Debug)]
pub enum Output {
    /// Send a record with the current write protection.
    Record {
        content_type: ContentType,
        data: Vec<u8>,
    },
    /// Protect every following outgoing record with this context.
    SwitchEncryption(CipherContext),
    /// Unprotect every following incoming record with this context.
    SwitchDecryption(CipherContext),
    /// Hand application data to the application.
    ApplicationData(Vec<u8>),
    /// The peer closed the connection.
    Closed,
}

/// Dispatch one incoming (already unprotected) record.
pub fn handle_record(
    config: &ServerConfig,
    state: HandshakeState,
    params: SecurityParameters,
    content_type: ContentType,
    fragment: &[u8],
) -> Result<Transition, TlsError> {
    match content_type {
        ContentType::Alert => alert::handle_alert(state, params, fragment),
        ContentType::ApplicationData => match state {
            HandshakeState::Established => {
                let out = Output::ApplicationData(fragment.to_vec());
                Ok(Transition::with_outputs(state, params, vec![out]))
            }
            other => Err(TlsError::UnexpectedMessage(format!(
                "application data in state {}",
                other.name()
            ))),
        },
        ContentType::ChangeCipherSpec => {
            finished::handle_change_cipher_spec(state, params, fragment)
        }
        ContentType::Handshake => handshake::handle_handshake(config, state, params, fragment),
    }
}
