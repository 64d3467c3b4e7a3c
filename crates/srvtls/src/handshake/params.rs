//! Negotiated security parameters threaded through the handshake.

use crate::config::{OwnCertificate, ServerConfig};
use crate::crypt::dh::{DhGroup, DhSecret};
use crate::{CipherSuite, TlsVersion};
use srvtls_types::TlsError;
use std::fmt;
use zeroize::Zeroizing;

/// Ephemeral DH state between ServerKeyExchange and ClientKeyExchange.
#[derive(Clone, Default)]
pub enum DhState {
    #[default]
    Idle,
    /// ServerKeyExchange sent with this group and private exponent.
    Sent { group: DhGroup, secret: DhSecret },
}

impl fmt::Debug for DhState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhState::Idle => f.write_str("Idle"),
            DhState::Sent { group, .. } => f
                .debug_struct("Sent")
                .field("prime_bits", &(group.prime_size() * 8))
                .finish_non_exhaustive(),
        }
    }
}

/// Per-connection security parameters.
///
/// Handlers take the previous value by ownership and return the next one.
/// `client_verify_data` / `server_verify_data` survive renegotiation to
/// bind the next handshake to this one.
#[derive(Clone)]
pub struct SecurityParameters {
    pub protocol_version: Option<TlsVersion>,
    /// `client_version` from the ClientHello being served.
    pub client_version: u16,
    pub ciphersuite: Option<CipherSuite>,
    pub server_name: Option<String>,
    pub client_random: [u8; 32],
    pub server_random: [u8; 32],
    pub master_secret: Zeroizing<Vec<u8>>,
    pub client_verify_data: Vec<u8>,
    pub server_verify_data: Vec<u8>,
    pub own_certificate: OwnCertificate,
    pub dh_state: DhState,
}

/// Empty parameters with no certificate.
impl Default for SecurityParameters {
    fn default() -> Self {
        Self {
            protocol_version: None,
            client_version: 0,
            ciphersuite: None,
            server_name: None,
            client_random: [0; 32],
            server_random: [0; 32],
            master_secret: Zeroizing::new(Vec::new()),
            client_verify_data: Vec::new(),
            server_verify_data: Vec::new(),
            own_certificate: OwnCertificate::NoCert,
            dh_state: DhState::Idle,
        }
    }
}

impl SecurityParameters {
    /// Defaults for a new connection.
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            own_certificate: config.certificate.clone(),
            ..Self::default()
        }
    }

    /// The negotiated version; fails before ServerHello has been built.
    pub fn version(&self) -> Result<TlsVersion, TlsError> {
        self.protocol_version
            .ok_or_else(|| TlsError::HandshakeFailure("protocol version not negotiated".into()))
    }

    /// The negotiated cipher suite; fails before ServerHello has been built.
    pub fn suite(&self) -> Result<CipherSuite, TlsError> {
        self.ciphersuite
            .ok_or_else(|| TlsError::HandshakeFailure("cipher suite not negotiated".into()))
    }

    /// Whether a previous handshake on this connection completed.
    pub fn has_completed_handshake(&self) -> bool {
        !self.client_verify_data.is_empty()
    }
}

impl fmt::Debug for SecurityParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityParameters")
            .field("protocol_version", &self.protocol_version)
            .field("client_version", &format_args!("0x{:04x}", self.client_version))
            .field("ciphersuite", &self.ciphersuite)
            .field("server_name", &self.server_name)
            .field("master_secret", &"<redacted>")
            .field("renegotiated", &self.has_completed_handshake())
            .field("own_certificate", &self.own_certificate)
            .field("dh_state", &self.dh_state)
            .finish_non_exhaustive()
    }
}
