//! TLS 1.0-1.2 handshake message encoding/decoding (RFC 5246 §7.4).
//!
//! Decoders take the message body (after the 4-byte header); encoders
//! return the complete message including the header, ready for the
//! transcript and the record layer.

use crate::extensions::{Extension, ExtensionType};
use crate::CipherSuite;
use srvtls_types::{HashAlgorithm, SignatureAlgorithm, TlsError};

use super::HandshakeType;

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// ClientHello message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub client_version: u16,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<CipherSuite>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<Extension>,
}

/// ServerHello message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub server_version: u16,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suite: CipherSuite,
    pub extensions: Vec<Extension>,
}

/// Ephemeral DH parameters (`ServerDHParams`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDhParams {
    pub p: Vec<u8>,
    pub g: Vec<u8>,
    pub ys: Vec<u8>,
}

/// ServerKeyExchange for DHE_RSA.
///
/// `hash` is the TLS 1.2 signature hash algorithm; it is absent on the
/// wire for TLS 1.0/1.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerKeyExchange {
    pub params: ServerDhParams,
    pub hash: Option<HashAlgorithm>,
    pub signature: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Bounds-checked cursor over a message body.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    ctx: &'static str,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], ctx: &'static str) -> Self {
        Self { data, pos: 0, ctx }
    }

    fn err(&self, msg: &str) -> TlsError {
        TlsError::DecodeError(format!("{}: {msg}", self.ctx))
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], TlsError> {
        if self.remaining() < n {
            return Err(self.err(&format!("truncated {what}")));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u8(&mut self, what: &str) -> Result<u8, TlsError> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16, TlsError> {
        let b = self.take(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn vec8(&mut self, what: &str) -> Result<&'a [u8], TlsError> {
        let len = self.u8(what)? as usize;
        self.take(len, what)
    }

    fn vec16(&mut self, what: &str) -> Result<&'a [u8], TlsError> {
        let len = self.u16(what)? as usize;
        self.take(len, what)
    }

    fn vec24(&mut self, what: &str) -> Result<&'a [u8], TlsError> {
        let len = read_u24(self.take(3, what)?);
        self.take(len, what)
    }

    fn finish(&self) -> Result<(), TlsError> {
        if self.remaining() != 0 {
            return Err(self.err("trailing bytes"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Handshake header
// ---------------------------------------------------------------------------

/// Parse a handshake header: msg_type(1) || length(3).
/// Returns (HandshakeType, body_slice, total_bytes_consumed).
pub fn parse_handshake_header(data: &[u8]) -> Result<(HandshakeType, &[u8], usize), TlsError> {
    if data.len() < 4 {
        return Err(TlsError::DecodeError("handshake header too short".into()));
    }
    let msg_type = HandshakeType::from_u8(data[0]).ok_or_else(|| {
        TlsError::UnexpectedMessage(format!("unknown handshake type: {}", data[0]))
    })?;
    let total = 4 + read_u24(&data[1..4]);
    if data.len() < total {
        return Err(TlsError::DecodeError(
            "handshake message body truncated".into(),
        ));
    }
    Ok((msg_type, &data[4..total], total))
}

/// Wrap a handshake body with the 4-byte header.
pub(crate) fn wrap_handshake(msg_type: HandshakeType, body: &[u8]) -> Vec<u8> {
    let len = body.len();
    let mut out = Vec::with_capacity(4 + len);
    out.push(msg_type as u8);
    out.push((len >> 16) as u8);
    out.push((len >> 8) as u8);
    out.push(len as u8);
    out.extend_from_slice(body);
    out
}

// ---------------------------------------------------------------------------
// ClientHello
// ---------------------------------------------------------------------------

/// Decode a ClientHello body.
pub fn decode_client_hello(body: &[u8]) -> Result<ClientHello, TlsError> {
    let mut r = Reader::new(body, "ClientHello");

    let client_version = r.u16("version")?;
    let mut random = [0u8; 32];
    random.copy_from_slice(r.take(32, "random")?);

    let session_id = r.vec8("session_id")?;
    if session_id.len() > 32 {
        return Err(r.err("session_id longer than 32 bytes"));
    }

    let suites = r.vec16("cipher_suites")?;
    if suites.is_empty() || suites.len() % 2 != 0 {
        return Err(r.err("invalid cipher_suites length"));
    }
    let cipher_suites = suites
        .chunks_exact(2)
        .map(|c| CipherSuite(u16::from_be_bytes([c[0], c[1]])))
        .collect();

    let compression_methods = r.vec8("compression_methods")?;
    if !compression_methods.contains(&0) {
        return Err(r.err("null compression not offered"));
    }

    // Extensions are optional in TLS 1.0-1.2
    let extensions = if r.remaining() > 0 {
        let ext = r.vec16("extensions")?;
        parse_extensions_list(ext)?
    } else {
        Vec::new()
    };
    r.finish()?;

    Ok(ClientHello {
        client_version,
        random,
        session_id: session_id.to_vec(),
        cipher_suites,
        compression_methods: compression_methods.to_vec(),
        extensions,
    })
}

/// Encode a ClientHello as a complete handshake message.
pub fn encode_client_hello(ch: &ClientHello) -> Vec<u8> {
    let mut body = Vec::with_capacity(128);
    body.extend_from_slice(&ch.client_version.to_be_bytes());
    body.extend_from_slice(&ch.random);
    body.push(ch.session_id.len() as u8);
    body.extend_from_slice(&ch.session_id);
    body.extend_from_slice(&((ch.cipher_suites.len() * 2) as u16).to_be_bytes());
    for s in &ch.cipher_suites {
        body.extend_from_slice(&s.0.to_be_bytes());
    }
    body.push(ch.compression_methods.len() as u8);
    body.extend_from_slice(&ch.compression_methods);
    if !ch.extensions.is_empty() {
        let ext = encode_extensions(&ch.extensions);
        body.extend_from_slice(&(ext.len() as u16).to_be_bytes());
        body.extend_from_slice(&ext);
    }
    wrap_handshake(HandshakeType::ClientHello, &body)
}

// ---------------------------------------------------------------------------
// ServerHello
// ---------------------------------------------------------------------------

/// Encode a ServerHello (compression method is always null).
pub fn encode_server_hello(sh: &ServerHello) -> Vec<u8> {
    let mut body = Vec::with_capacity(80);
    body.extend_from_slice(&sh.server_version.to_be_bytes());
    body.extend_from_slice(&sh.random);
    body.push(sh.session_id.len() as u8);
    body.extend_from_slice(&sh.session_id);
    body.extend_from_slice(&sh.cipher_suite.0.to_be_bytes());
    body.push(0);
    if !sh.extensions.is_empty() {
        let ext = encode_extensions(&sh.extensions);
        body.extend_from_slice(&(ext.len() as u16).to_be_bytes());
        body.extend_from_slice(&ext);
    }
    wrap_handshake(HandshakeType::ServerHello, &body)
}

/// Decode a ServerHello body.
pub fn decode_server_hello(body: &[u8]) -> Result<ServerHello, TlsError> {
    let mut r = Reader::new(body, "ServerHello");
    let server_version = r.u16("version")?;
    let mut random = [0u8; 32];
    random.copy_from_slice(r.take(32, "random")?);
    let session_id = r.vec8("session_id")?.to_vec();
    let cipher_suite = CipherSuite(r.u16("cipher_suite")?);
    if r.u8("compression_method")? != 0 {
        return Err(r.err("non-null compression"));
    }
    let extensions = if r.remaining() > 0 {
        parse_extensions_list(r.vec16("extensions")?)?
    } else {
        Vec::new()
    };
    r.finish()?;
    Ok(ServerHello {
        server_version,
        random,
        session_id,
        cipher_suite,
        extensions,
    })
}

// ---------------------------------------------------------------------------
// Certificate
// ---------------------------------------------------------------------------

/// Encode a Certificate message from a DER certificate chain.
pub fn encode_certificate(chain: &[Vec<u8>]) -> Vec<u8> {
    let list_len: usize = chain.iter().map(|c| 3 + c.len()).sum();
    let mut body = Vec::with_capacity(3 + list_len);
    push_u24(&mut body, list_len);
    for cert in chain {
        push_u24(&mut body, cert.len());
        body.extend_from_slice(cert);
    }
    wrap_handshake(HandshakeType::Certificate, &body)
}

/// Decode a Certificate body into its DER entries.
pub fn decode_certificate(body: &[u8]) -> Result<Vec<Vec<u8>>, TlsError> {
    let mut r = Reader::new(body, "Certificate");
    let list = r.vec24("certificate_list")?;
    r.finish()?;
    let mut lr = Reader::new(list, "Certificate");
    let mut chain = Vec::new();
    while lr.remaining() > 0 {
        chain.push(lr.vec24("certificate")?.to_vec());
    }
    Ok(chain)
}

// ---------------------------------------------------------------------------
// ServerKeyExchange
// ---------------------------------------------------------------------------

/// Serialize `ServerDHParams`: dh_p, dh_g, dh_Ys, each `opaque<1..2^16-1>`.
///
/// This is the exact byte string covered by the ServerKeyExchange
/// signature (after the two randoms).
pub fn encode_dh_params(params: &ServerDhParams) -> Vec<u8> {
    let mut out = Vec::with_capacity(6 + params.p.len() + params.g.len() + params.ys.len());
    for v in [&params.p, &params.g, &params.ys] {
        out.extend_from_slice(&(v.len() as u16).to_be_bytes());
        out.extend_from_slice(v);
    }
    out
}

/// Encode a DHE_RSA ServerKeyExchange.
pub fn encode_server_key_exchange(ske: &ServerKeyExchange) -> Vec<u8> {
    let mut body = encode_dh_params(&ske.params);
    if let Some(hash) = ske.hash {
        body.push(hash as u8);
        body.push(SignatureAlgorithm::Rsa as u8);
    }
    body.extend_from_slice(&(ske.signature.len() as u16).to_be_bytes());
    body.extend_from_slice(&ske.signature);
    wrap_handshake(HandshakeType::ServerKeyExchange, &body)
}

/// Decode a DHE_RSA ServerKeyExchange body. `with_hash` selects the
/// TLS 1.2 layout carrying the signature-and-hash prefix.
pub fn decode_server_key_exchange(
    body: &[u8],
    with_hash: bool,
) -> Result<ServerKeyExchange, TlsError> {
    let mut r = Reader::new(body, "ServerKeyExchange");
    let p = r.vec16("dh_p")?.to_vec();
    let g = r.vec16("dh_g")?.to_vec();
    let ys = r.vec16("dh_Ys")?.to_vec();
    if p.is_empty() || g.is_empty() || ys.is_empty() {
        return Err(r.err("empty DH parameter"));
    }
    let hash = if with_hash {
        let h = r.u8("hash")?;
        let s = r.u8("signature")?;
        if s != SignatureAlgorithm::Rsa as u8 {
            return Err(r.err("signature algorithm is not RSA"));
        }
        Some(HashAlgorithm::from_u8(h).ok_or_else(|| r.err("unknown hash algorithm"))?)
    } else {
        None
    };
    let signature = r.vec16("signature")?.to_vec();
    r.finish()?;
    Ok(ServerKeyExchange {
        params: ServerDhParams { p, g, ys },
        hash,
        signature,
    })
}

// ---------------------------------------------------------------------------
// ServerHelloDone / HelloRequest
// ---------------------------------------------------------------------------

/// Encode ServerHelloDone (empty body).
pub fn encode_server_hello_done() -> Vec<u8> {
    wrap_handshake(HandshakeType::ServerHelloDone, &[])
}

/// Encode HelloRequest (empty body).
pub fn encode_hello_request() -> Vec<u8> {
    wrap_handshake(HandshakeType::HelloRequest, &[])
}

// ---------------------------------------------------------------------------
// ClientKeyExchange
// ---------------------------------------------------------------------------

/// Decode an RSA ClientKeyExchange body: `EncryptedPreMasterSecret`
/// with a 2-byte length prefix.
pub fn decode_client_key_exchange_rsa(body: &[u8]) -> Result<Vec<u8>, TlsError> {
    let mut r = Reader::new(body, "ClientKeyExchange");
    let enc = r.vec16("encrypted_pre_master_secret")?;
    r.finish()?;
    Ok(enc.to_vec())
}

/// Decode a DHE ClientKeyExchange body: explicit `dh_Yc<1..2^16-1>`.
pub fn decode_client_key_exchange_dh(body: &[u8]) -> Result<Vec<u8>, TlsError> {
    let mut r = Reader::new(body, "ClientKeyExchange");
    let yc = r.vec16("dh_Yc")?;
    r.finish()?;
    if yc.is_empty() {
        return Err(r.err("empty dh_Yc"));
    }
    Ok(yc.to_vec())
}

/// Encode a ClientKeyExchange carrying one 2-byte-length-prefixed value
/// (RSA-encrypted PMS or DH public value).
pub fn encode_client_key_exchange(exchange_keys: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(2 + exchange_keys.len());
    body.extend_from_slice(&(exchange_keys.len() as u16).to_be_bytes());
    body.extend_from_slice(exchange_keys);
    wrap_handshake(HandshakeType::ClientKeyExchange, &body)
}

// ---------------------------------------------------------------------------
// Finished
// ---------------------------------------------------------------------------

/// Encode a Finished message.
pub fn encode_finished(verify_data: &[u8]) -> Vec<u8> {
    wrap_handshake(HandshakeType::Finished, verify_data)
}

/// Decode a Finished body (exactly 12 bytes of verify_data).
pub fn decode_finished(body: &[u8]) -> Result<Vec<u8>, TlsError> {
    if body.len() != crate::crypt::key_schedule::VERIFY_DATA_LEN {
        return Err(TlsError::DecodeError(format!(
            "Finished: verify_data length {}",
            body.len()
        )));
    }
    Ok(body.to_vec())
}

// ---------------------------------------------------------------------------
// Extensions
// ---------------------------------------------------------------------------

/// Encode a list of extensions (without the outer length prefix).
fn encode_extensions(exts: &[Extension]) -> Vec<u8> {
    let mut buf = Vec::new();
    for ext in exts {
        buf.extend_from_slice(&ext.extension_type.0.to_be_bytes());
        buf.extend_from_slice(&(ext.data.len() as u16).to_be_bytes());
        buf.extend_from_slice(&ext.data);
    }
    buf
}

/// Parse a raw extension list (no length prefix).
fn parse_extensions_list(data: &[u8]) -> Result<Vec<Extension>, TlsError> {
    let mut r = Reader::new(data, "extensions");
    let mut exts = Vec::new();
    while r.remaining() > 0 {
        let extension_type = ExtensionType(r.u16("extension type")?);
        let data = r.vec16("extension data")?.to_vec();
        exts.push(Extension {
            extension_type,
            data,
        });
    }
    Ok(exts)
}

fn read_u24(data: &[u8]) -> usize {
    ((data[0] as usize) << 16) | ((data[1] as usize) << 8) | (data[2] as usize)
}

fn push_u24(buf: &mut Vec<u8>, v: usize) {
    buf.push((v >> 16) as u8);
    buf.push((v >> 8) as u8);
    buf.push(v as u8);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
