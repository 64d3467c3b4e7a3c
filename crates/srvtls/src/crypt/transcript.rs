//! Handshake transcript for Finished computation.
//!
//! Stores the raw handshake messages exchanged since the current
//! handshake's ClientHello. The hash is computed on demand since the
//! hash function depends on the negotiated version.

use super::hash::digest;
use crate::TlsVersion;
use srvtls_types::HashAlgorithm;

/// Ordered list of raw handshake messages (header included).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Vec<u8>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one complete handshake message.
    pub fn push(&mut self, message: &[u8]) {
        self.messages.push(message.to_vec());
    }

    pub fn messages(&self) -> &[Vec<u8>] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Handshake hash for `version`.
    ///
    /// TLS 1.2 uses SHA-256; TLS 1.0/1.1 use MD5 || SHA-1 (36 bytes).
    pub fn hash(&self, version: TlsVersion) -> Vec<u8> {
        let data = self.messages.concat();
        match version {
            TlsVersion::Tls12 => digest(HashAlgorithm::Sha256, &data),
            TlsVersion::Tls10 | TlsVersion::Tls11 => {
                let mut out = digest(HashAlgorithm::Md5, &data);
                out.extend_from_slice(&digest(HashAlgorithm::Sha1, &data));
                out
            }
        }
    }
}
