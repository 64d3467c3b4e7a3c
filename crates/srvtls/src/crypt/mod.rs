//! TLS cryptographic operations wrapper.
//!
//! Bridges the handshake with the RustCrypto primitives: hashing, the
//! TLS PRF, key derivation, the transcript, and finite-field DH.

pub mod dh;
pub mod hash;
pub mod key_schedule;
pub mod prf;
pub mod traffic_keys;
pub mod transcript;

use crate::{CipherSuite, TlsVersion};
use srvtls_types::{HashAlgorithm, TlsError};

/// TLS 1.0-1.2 key exchange algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchangeAlg {
    /// Static RSA key exchange (client encrypts PMS with server's RSA cert key).
    Rsa,
    /// Ephemeral Diffie-Hellman, parameters signed with the server's RSA key.
    DheRsa,
}

impl KeyExchangeAlg {
    /// Whether the server must send its certificate.
    pub fn requires_certificate(self) -> bool {
        match self {
            KeyExchangeAlg::Rsa | KeyExchangeAlg::DheRsa => true,
        }
    }

    /// Whether the server sends a ServerKeyExchange message.
    pub fn is_ephemeral(self) -> bool {
        matches!(self, KeyExchangeAlg::DheRsa)
    }
}

/// Bulk cipher of a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkCipher {
    Rc4_128,
    TripleDesEdeCbc,
    Aes128Cbc,
    Aes256Cbc,
}

impl BulkCipher {
    pub fn key_len(self) -> usize {
        match self {
            BulkCipher::Rc4_128 | BulkCipher::Aes128Cbc => 16,
            BulkCipher::TripleDesEdeCbc => 24,
            BulkCipher::Aes256Cbc => 32,
        }
    }

    /// Block size in bytes, 0 for stream ciphers.
    pub fn block_size(self) -> usize {
        match self {
            BulkCipher::Rc4_128 => 0,
            BulkCipher::TripleDesEdeCbc => 8,
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => 16,
        }
    }
}

/// Record MAC algorithm of a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacAlg {
    HmacMd5,
    HmacSha1,
    HmacSha256,
}

impl MacAlg {
    pub fn hash(self) -> HashAlgorithm {
        match self {
            MacAlg::HmacMd5 => HashAlgorithm::Md5,
            MacAlg::HmacSha1 => HashAlgorithm::Sha1,
            MacAlg::HmacSha256 => HashAlgorithm::Sha256,
        }
    }

    pub fn key_len(self) -> usize {
        self.hash().output_size()
    }
}

/// Parameters associated with a negotiable cipher suite.
#[derive(Debug, Clone)]
pub struct CipherSuiteParams {
    pub suite: CipherSuite,
    pub kx_alg: KeyExchangeAlg,
    pub cipher: BulkCipher,
    pub mac: MacAlg,
}

impl CipherSuiteParams {
    /// Look up parameters for a cipher suite.
    pub fn from_suite(suite: CipherSuite) -> Result<Self, TlsError> {
        use BulkCipher::*;
        use KeyExchangeAlg::*;
        use MacAlg::*;

        let (kx_alg, cipher, mac) = match suite {
            CipherSuite::TLS_RSA_WITH_RC4_128_MD5 => (Rsa, Rc4_128, HmacMd5),
            CipherSuite::TLS_RSA_WITH_RC4_128_SHA => (Rsa, Rc4_128, HmacSha1),
            CipherSuite::TLS_RSA_WITH_3DES_EDE_CBC_SHA => (Rsa, TripleDesEdeCbc, HmacSha1),
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA => (Rsa, Aes128Cbc, HmacSha1),
            CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA => (Rsa, Aes256Cbc, HmacSha1),
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256 => (Rsa, Aes128Cbc, HmacSha256),
            CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA256 => (Rsa, Aes256Cbc, HmacSha256),
            CipherSuite::TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA => (DheRsa, TripleDesEdeCbc, HmacSha1),
            CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA => (DheRsa, Aes128Cbc, HmacSha1),
            CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA => (DheRsa, Aes256Cbc, HmacSha1),
            CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256 => (DheRsa, Aes128Cbc, HmacSha256),
            CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256 => (DheRsa, Aes256Cbc, HmacSha256),
            _ => {
                return Err(TlsError::HandshakeFailure(format!(
                    "unsupported cipher suite 0x{:04x}",
                    suite.0
                )))
            }
        };
        Ok(Self {
            suite,
            kx_alg,
            cipher,
            mac,
        })
    }

    /// Lowest protocol version the suite may be used with.
    ///
    /// SHA-256 MAC suites are defined by RFC 5246 only.
    pub fn min_version(&self) -> TlsVersion {
        match self.mac {
            MacAlg::HmacSha256 => TlsVersion::Tls12,
            MacAlg::HmacMd5 | MacAlg::HmacSha1 => TlsVersion::Tls10,
        }
    }

    /// Whether the suite can be negotiated at `version`.
    pub fn usable_with(&self, version: TlsVersion) -> bool {
        version >= self.min_version()
    }

    /// Length of the implicit IV taken from the key block.
    ///
    /// Only TLS 1.0 CBC chains its IV from the key block; TLS 1.1+
    /// carries an explicit per-record IV.
    pub fn fixed_iv_len(&self, version: TlsVersion) -> usize {
        match version {
            TlsVersion::Tls10 => self.cipher.block_size(),
            TlsVersion::Tls11 | TlsVersion::Tls12 => 0,
        }
    }

    /// Total key block length (RFC 5246 §6.3).
    pub fn key_block_len(&self, version: TlsVersion) -> usize {
        2 * (self.mac.key_len() + self.cipher.key_len() + self.fixed_iv_len(version))
    }
}
