//! Server handshake configuration with builder pattern.

use crate::crypt::dh::DhGroup;
use crate::{CipherSuite, TlsVersion};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use srvtls_types::{CryptoError, HashAlgorithm, TlsError};
use std::fmt;
use std::sync::Arc;

/// The server's own certificate and signing key.
#[derive(Clone)]
pub enum OwnCertificate {
    /// DER certificate chain (leaf first) and the leaf's RSA private key.
    PrivateCert {
        chain: Vec<Vec<u8>>,
        key: Arc<RsaPrivateKey>,
    },
    /// No certificate; only suites without server authentication can be
    /// negotiated.
    NoCert,
}

impl OwnCertificate {
    /// Build from a DER chain and a PKCS#8 or PKCS#1 DER RSA private key.
    pub fn from_der(chain: Vec<Vec<u8>>, key_der: &[u8]) -> Result<Self, TlsError> {
        let key = RsaPrivateKey::from_pkcs8_der(key_der)
            .or_else(|_| RsaPrivateKey::from_pkcs1_der(key_der))
            .map_err(|_| CryptoError::InvalidKey)?;
        Ok(OwnCertificate::PrivateCert {
            chain,
            key: Arc::new(key),
        })
    }

    pub fn is_private_cert(&self) -> bool {
        matches!(self, OwnCertificate::PrivateCert { .. })
    }
}

impl fmt::Debug for OwnCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnCertificate::PrivateCert { chain, .. } => f
                .debug_struct("PrivateCert")
                .field("chain_len", &chain.len())
                .field("key", &"<redacted>")
                .finish(),
            OwnCertificate::NoCert => f.write_str("NoCert"),
        }
    }
}

/// Server handshake configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Minimum accepted TLS version.
    pub min_version: TlsVersion,
    /// Maximum accepted TLS version.
    pub max_version: TlsVersion,
    /// Enabled cipher suites (in server preference order).
    pub cipher_suites: Vec<CipherSuite>,
    /// Certificate and key presented to clients.
    pub certificate: OwnCertificate,
    /// TLS 1.2 ServerKeyExchange hash preference.
    pub signature_hashes: Vec<HashAlgorithm>,
    /// Group used for DHE_RSA.
    pub dh_group: DhGroup,
    /// Host names served; empty serves any name.
    pub server_names: Vec<String>,
    /// Whether client-initiated renegotiation is accepted.
    pub allow_renegotiation: bool,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("min_version", &self.min_version)
            .field("max_version", &self.max_version)
            .field("cipher_suites", &self.cipher_suites)
            .field("certificate", &self.certificate)
            .field("signature_hashes", &self.signature_hashes)
            .field("dh_prime_bits", &(self.dh_group.prime_size() * 8))
            .field("server_names", &self.server_names)
            .field("allow_renegotiation", &self.allow_renegotiation)
            .finish()
    }
}

impl ServerConfig {
    /// Create a builder for server configuration.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Whether this server answers for `name` (ASCII case-insensitive).
    pub fn serves_name(&self, name: &str) -> bool {
        self.server_names.is_empty()
            || self
                .server_names
                .iter()
                .any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Builder for `ServerConfig`.
pub struct ServerConfigBuilder {
    min_version: TlsVersion,
    max_version: TlsVersion,
    cipher_suites: Vec<CipherSuite>,
    certificate: OwnCertificate,
    signature_hashes: Vec<HashAlgorithm>,
    dh_group: DhGroup,
    server_names: Vec<String>,
    allow_renegotiation: bool,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self {
            min_version: TlsVersion::Tls10,
            max_version: TlsVersion::Tls12,
            cipher_suites: vec![
                CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256,
                CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256,
                CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA,
                CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA,
                CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA256,
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256,
                CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA,
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                CipherSuite::TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA,
                CipherSuite::TLS_RSA_WITH_3DES_EDE_CBC_SHA,
            ],
            certificate: OwnCertificate::NoCert,
            signature_hashes: vec![
                HashAlgorithm::Sha256,
                HashAlgorithm::Sha384,
                HashAlgorithm::Sha512,
                HashAlgorithm::Sha224,
                HashAlgorithm::Sha1,
            ],
            dh_group: DhGroup::ffdhe2048(),
            server_names: Vec::new(),
            allow_renegotiation: true,
        }
    }
}

impl fmt::Debug for ServerConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfigBuilder")
            .field("cipher_suites", &self.cipher_suites)
            .field("certificate", &self.certificate)
            .finish_non_exhaustive()
    }
}

impl ServerConfigBuilder {
    pub fn min_version(mut self, version: TlsVersion) -> Self {
        self.min_version = version;
        self
    }

    pub fn max_version(mut self, version: TlsVersion) -> Self {
        self.max_version = version;
        self
    }

    pub fn cipher_suites(mut self, suites: &[CipherSuite]) -> Self {
        self.cipher_suites = suites.to_vec();
        self
    }

    pub fn certificate(mut self, certificate: OwnCertificate) -> Self {
        self.certificate = certificate;
        self
    }

    pub fn signature_hashes(mut self, hashes: &[HashAlgorithm]) -> Self {
        self.signature_hashes = hashes.to_vec();
        self
    }

    pub fn dh_group(mut self, group: DhGroup) -> Self {
        self.dh_group = group;
        self
    }

    pub fn server_name(mut self, name: &str) -> Self {
        self.server_names.push(name.to_owned());
        self
    }

    pub fn allow_renegotiation(mut self, allow: bool) -> Self {
        self.allow_renegotiation = allow;
        self
    }

    pub fn build(self) -> ServerConfig {
        ServerConfig {
            min_version: self.min_version,
            max_version: self.max_version,
            cipher_suites: self.cipher_suites,
            certificate: self.certificate,
            signature_hashes: self.signature_hashes,
            dh_group: self.dh_group,
            server_names: self.server_names,
            allow_renegotiation: self.allow_renegotiation,
        }
    }
}
