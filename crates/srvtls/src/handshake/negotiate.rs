//! Negotiation policy: version, cipher suite, SNI, secure renegotiation
//! and the TLS 1.2 ServerKeyExchange hash.

use super::extensions_codec::SignatureAndHash;
use crate::config::{OwnCertificate, ServerConfig};
use crate::crypt::{CipherSuiteParams, KeyExchangeAlg};
use crate::{CipherSuite, TlsVersion};
use srvtls_types::{HashAlgorithm, SignatureAlgorithm, TlsError};
use subtle::ConstantTimeEq;
use tracing::debug;

/// Pick the protocol version for a ClientHello.
///
/// The result is the highest configured version not above the client's.
/// On renegotiation `current` is the version in use and the client may
/// not offer less.
pub fn select_version(
    config: &ServerConfig,
    client_version: u16,
    current: Option<TlsVersion>,
) -> Result<TlsVersion, TlsError> {
    if client_version >> 8 != 3 || client_version < TlsVersion::Tls10.wire() {
        return Err(TlsError::ProtocolVersion);
    }
    if let Some(cur) = current {
        if client_version < cur.wire() {
            return Err(TlsError::ProtocolVersion);
        }
    }
    let offered = TlsVersion::from_wire(client_version.min(TlsVersion::Tls12.wire()))
        .ok_or(TlsError::ProtocolVersion)?;
    let version = offered.min(config.max_version);
    if version < config.min_version {
        return Err(TlsError::ProtocolVersion);
    }
    Ok(version)
}

/// Pick the first server-preferred suite the client offered.
///
/// Suites not defined for `version` and suites needing a certificate the
/// server does not have are never selected.
pub fn select_cipher_suite(
    config: &ServerConfig,
    offered: &[CipherSuite],
    version: TlsVersion,
    certificate: &OwnCertificate,
) -> Result<CipherSuiteParams, TlsError> {
    config
        .cipher_suites
        .iter()
        .filter(|s| offered.contains(s))
        .filter_map(|s| CipherSuiteParams::from_suite(*s).ok())
        .find(|p| {
            p.usable_with(version)
                && (!p.kx_alg.requires_certificate() || certificate.is_private_cert())
        })
        .ok_or_else(|| TlsError::HandshakeFailure("no shared cipher suite".into()))
}

fn offers_scsv(offered: &[CipherSuite]) -> bool {
    offered.contains(&CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV)
}

/// RFC 5746 check on an initial ClientHello: the SCSV or an empty
/// `renegotiation_info` must be present.
pub fn check_initial_renegotiation_signal(
    offered: &[CipherSuite],
    renegotiation_info: Option<&[u8]>,
) -> Result<(), TlsError> {
    match renegotiation_info {
        Some(ri) if !ri.is_empty() => Err(TlsError::HandshakeFailure(
            "non-empty renegotiation_info on initial handshake".into(),
        )),
        Some(_) => Ok(()),
        None if offers_scsv(offered) => Ok(()),
        None => Err(TlsError::NoRenegotiation),
    }
}

/// RFC 5746 check on a renegotiating ClientHello: `renegotiation_info`
/// must carry the previous client verify data and the SCSV must be absent.
pub fn check_renegotiation_binding(
    offered: &[CipherSuite],
    renegotiation_info: Option<&[u8]>,
    client_verify_data: &[u8],
) -> Result<(), TlsError> {
    if offers_scsv(offered) {
        return Err(TlsError::HandshakeFailure(
            "renegotiation SCSV during renegotiation".into(),
        ));
    }
    let ri = renegotiation_info.ok_or_else(|| {
        TlsError::HandshakeFailure("renegotiation_info missing on renegotiation".into())
    })?;
    if !bool::from(ri.ct_eq(client_verify_data)) {
        return Err(TlsError::HandshakeFailure(
            "renegotiation_info does not match previous verify data".into(),
        ));
    }
    Ok(())
}

/// Outcome of SNI processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerNameDecision {
    /// Name recorded in the parameters.
    pub server_name: Option<String>,
    /// Whether ServerHello carries the empty `server_name` extension.
    pub acknowledge: bool,
}

/// Resolve the requested host name.
///
/// `previous` is `Some` on renegotiation and holds the name bound by the
/// initial handshake; the new request must match it exactly.
pub fn select_server_name(
    config: &ServerConfig,
    requested: Option<&str>,
    previous: Option<Option<&str>>,
) -> Result<ServerNameDecision, TlsError> {
    if let Some(prev) = previous {
        if prev != requested {
            return Err(TlsError::HandshakeFailure(
                "server name changed on renegotiation".into(),
            ));
        }
    }
    let acknowledge = requested.is_some_and(|name| config.serves_name(name));
    if let Some(name) = requested {
        debug!(server_name = name, acknowledge, "client requested server name");
    }
    Ok(ServerNameDecision {
        server_name: requested.map(str::to_owned),
        acknowledge,
    })
}

/// Pick the ServerKeyExchange signature hash.
///
/// Only TLS 1.2 DHE_RSA signs with a negotiated hash; other cases return
/// `None`. Without a `signature_algorithms` extension the client is
/// assumed to support SHA-1 (RFC 5246 §7.4.1.4.1).
pub fn select_signature_hash(
    config: &ServerConfig,
    version: TlsVersion,
    kx_alg: KeyExchangeAlg,
    client_algs: Option<&[SignatureAndHash]>,
) -> Result<Option<HashAlgorithm>, TlsError> {
    if version != TlsVersion::Tls12 || !kx_alg.is_ephemeral() {
        return Ok(None);
    }
    let Some(client_algs) = client_algs else {
        return Ok(Some(HashAlgorithm::Sha1));
    };
    config
        .signature_hashes
        .iter()
        .copied()
        .find(|h| {
            client_algs.contains(&SignatureAndHash {
                hash: *h as u8,
                signature: SignatureAlgorithm::Rsa as u8,
            })
        })
        .map(Some)
        .ok_or_else(|| TlsError::HandshakeFailure("no shared signature hash".into()))
}
