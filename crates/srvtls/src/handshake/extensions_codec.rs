//! Parse and build the hello extensions the server acts on.

use crate::extensions::{Extension, ExtensionType};
use srvtls_types::TlsError;
use std::collections::HashSet;

/// A `SignatureAndHashAlgorithm` pair (RFC 5246 §7.4.1.4.1), raw codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureAndHash {
    pub hash: u8,
    pub signature: u8,
}

/// Extensions of a ClientHello that influence negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientHelloExtensions {
    /// Requested host name (`server_name`, host_name entry).
    pub server_name: Option<String>,
    /// `renegotiated_connection` of `renegotiation_info`.
    pub renegotiation_info: Option<Vec<u8>>,
    /// `supported_signature_algorithms`.
    pub signature_algorithms: Option<Vec<SignatureAndHash>>,
}

/// Collect the extensions the server understands.
///
/// Duplicate extension types and malformed bodies of known extensions are
/// rejected; unknown extensions are ignored.
pub fn parse_client_hello_extensions(
    extensions: &[Extension],
) -> Result<ClientHelloExtensions, TlsError> {
    let mut seen = HashSet::with_capacity(extensions.len());
    let mut out = ClientHelloExtensions::default();
    for ext in extensions {
        if !seen.insert(ext.extension_type) {
            return Err(TlsError::DecodeError(format!(
                "duplicate extension {}",
                ext.extension_type.0
            )));
        }
        match ext.extension_type {
            ExtensionType::SERVER_NAME => out.server_name = parse_server_name(&ext.data)?,
            ExtensionType::RENEGOTIATION_INFO => {
                out.renegotiation_info = Some(parse_renegotiation_info(&ext.data)?)
            }
            ExtensionType::SIGNATURE_ALGORITHMS => {
                out.signature_algorithms = Some(parse_signature_algorithms(&ext.data)?)
            }
            _ => {}
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// server_name (RFC 6066 §3)
// ---------------------------------------------------------------------------

const NAME_TYPE_HOST_NAME: u8 = 0;

/// Parse `server_name` from ClientHello.
/// Format: server_name_list_length(2) || [name_type(1) || name_length(2) || name]*
///
/// Returns the host_name entry if any; other name types are skipped.
pub fn parse_server_name(data: &[u8]) -> Result<Option<String>, TlsError> {
    let err = |msg: &str| TlsError::DecodeError(format!("server_name: {msg}"));
    if data.len() < 2 {
        return Err(err("too short"));
    }
    let list_len = u16::from_be_bytes([data[0], data[1]]) as usize;
    if data.len() != 2 + list_len || list_len == 0 {
        return Err(err("invalid list length"));
    }

    let mut host = None;
    let mut pos = 2;
    while pos < data.len() {
        if data.len() < pos + 3 {
            return Err(err("truncated entry"));
        }
        let name_type = data[pos];
        let name_len = u16::from_be_bytes([data[pos + 1], data[pos + 2]]) as usize;
        pos += 3;
        if data.len() < pos + name_len {
            return Err(err("name truncated"));
        }
        let name = &data[pos..pos + name_len];
        pos += name_len;

        if name_type != NAME_TYPE_HOST_NAME {
            continue;
        }
        if host.is_some() {
            return Err(err("more than one host_name"));
        }
        if name.is_empty() {
            return Err(err("empty host_name"));
        }
        let name = std::str::from_utf8(name).map_err(|_| err("host_name is not valid UTF-8"))?;
        host = Some(name.to_owned());
    }
    Ok(host)
}

/// Build the empty `server_name` acknowledgement for ServerHello.
pub fn build_server_name_ack() -> Extension {
    Extension::new(ExtensionType::SERVER_NAME, Vec::new())
}

/// Build a `server_name` extension carrying one host name.
pub fn build_server_name(hostname: &str) -> Extension {
    let name = hostname.as_bytes();
    let entry_len = 1 + 2 + name.len();
    let mut data = Vec::with_capacity(2 + entry_len);
    data.extend_from_slice(&(entry_len as u16).to_be_bytes());
    data.push(NAME_TYPE_HOST_NAME);
    data.extend_from_slice(&(name.len() as u16).to_be_bytes());
    data.extend_from_slice(name);
    Extension::new(ExtensionType::SERVER_NAME, data)
}

// ---------------------------------------------------------------------------
// renegotiation_info (RFC 5746 §3.2)
// ---------------------------------------------------------------------------

/// Parse `renegotiation_info`; returns `renegotiated_connection`.
pub fn parse_renegotiation_info(data: &[u8]) -> Result<Vec<u8>, TlsError> {
    if data.is_empty() {
        return Err(TlsError::DecodeError("renegotiation_info: empty".into()));
    }
    let len = data[0] as usize;
    if data.len() != 1 + len {
        return Err(TlsError::DecodeError(
            "renegotiation_info: length mismatch".into(),
        ));
    }
    Ok(data[1..].to_vec())
}

/// Build `renegotiation_info` carrying `client_verify_data || server_verify_data`.
///
/// Both are empty on an initial handshake.
pub fn build_renegotiation_info(client_verify_data: &[u8], server_verify_data: &[u8]) -> Extension {
    let len = client_verify_data.len() + server_verify_data.len();
    let mut data = Vec::with_capacity(1 + len);
    data.push(len as u8);
    data.extend_from_slice(client_verify_data);
    data.extend_from_slice(server_verify_data);
    Extension::new(ExtensionType::RENEGOTIATION_INFO, data)
}

// ---------------------------------------------------------------------------
// signature_algorithms (RFC 5246 §7.4.1.4.1)
// ---------------------------------------------------------------------------

/// Parse `signature_algorithms` from ClientHello.
/// Format: list_length(2) || [hash(1) || signature(1)]*
pub fn parse_signature_algorithms(data: &[u8]) -> Result<Vec<SignatureAndHash>, TlsError> {
    if data.len() < 2 {
        return Err(TlsError::DecodeError(
            "signature_algorithms: too short".into(),
        ));
    }
    let list_len = u16::from_be_bytes([data[0], data[1]]) as usize;
    if data.len() != 2 + list_len || list_len == 0 || list_len % 2 != 0 {
        return Err(TlsError::DecodeError(
            "signature_algorithms: invalid length".into(),
        ));
    }
    Ok(data[2..]
        .chunks_exact(2)
        .map(|c| SignatureAndHash {
            hash: c[0],
            signature: c[1],
        })
        .collect())
}

/// Build a `signature_algorithms` extension.
pub fn build_signature_algorithms(algs: &[SignatureAndHash]) -> Extension {
    let mut data = Vec::with_capacity(2 + algs.len() * 2);
    data.extend_from_slice(&((algs.len() * 2) as u16).to_be_bytes());
    for a in algs {
        data.push(a.hash);
        data.push(a.signature);
    }
    Extension::new(ExtensionType::SIGNATURE_ALGORITHMS, data)
}
