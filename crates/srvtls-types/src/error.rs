/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid argument")]
    InvalidArg,
    #[error("invalid key")]
    InvalidKey,

    #[error("random generation failed")]
    RandGenFail,

    // DH errors
    #[error("dh: invalid group parameters")]
    DhInvalidParams,
    #[error("dh: peer public value out of range")]
    DhInvalidPublicKey,

    #[error("kdf: output length overflow")]
    KdfDkLenOverflow,
}

/// TLS handshake errors.
///
/// Each variant corresponds to the TLS alert that terminates the
/// connection when it is returned from a handler.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("handshake failure: {0}")]
    HandshakeFailure(String),
    #[error("no acceptable protocol version")]
    ProtocolVersion,
    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),
    #[error("secure renegotiation not signalled by client")]
    NoRenegotiation,
    #[error("decode error: {0}")]
    DecodeError(String),
    #[error("alert received (fatal: {fatal}): {description}")]
    AlertReceived { fatal: bool, description: u8 },
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl TlsError {
    /// Whether the error was caused by the peer closing or aborting the
    /// connection, in which case no alert must be sent back.
    pub fn is_peer_alert(&self) -> bool {
        matches!(self, TlsError::AlertReceived { .. })
    }
}
