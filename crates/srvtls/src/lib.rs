#![forbid(unsafe_code)]
#![doc = "Server-side TLS 1.0-1.2 handshake engine for srvtls."]

pub mod alert;
pub mod config;
pub mod connection;
pub mod crypt;
pub mod extensions;
pub mod handshake;
pub mod record;

pub use srvtls_types::TlsError;

/// TLS protocol version.
///
/// Variants are ordered, so `Tls10 < Tls11 < Tls12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    Tls10,
    Tls11,
    Tls12,
}

impl TlsVersion {
    /// The `ProtocolVersion` wire value (major 3).
    pub fn wire(self) -> u16 {
        match self {
            TlsVersion::Tls10 => 0x0301,
            TlsVersion::Tls11 => 0x0302,
            TlsVersion::Tls12 => 0x0303,
        }
    }

    /// Map an exact wire value onto a supported version.
    pub fn from_wire(v: u16) -> Option<Self> {
        match v {
            0x0301 => Some(TlsVersion::Tls10),
            0x0302 => Some(TlsVersion::Tls11),
            0x0303 => Some(TlsVersion::Tls12),
            _ => None,
        }
    }
}

/// TLS cipher suite identifier.
///
/// Clients may offer any value; only the constants below have
/// parameters (see [`crypt::CipherSuiteParams`]) and can be negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CipherSuite(pub u16);

impl CipherSuite {
    // Static RSA key exchange
    pub const TLS_RSA_WITH_RC4_128_MD5: Self = Self(0x0004);
    pub const TLS_RSA_WITH_RC4_128_SHA: Self = Self(0x0005);
    pub const TLS_RSA_WITH_3DES_EDE_CBC_SHA: Self = Self(0x000A);
    pub const TLS_RSA_WITH_AES_128_CBC_SHA: Self = Self(0x002F);
    pub const TLS_RSA_WITH_AES_256_CBC_SHA: Self = Self(0x0035);
    pub const TLS_RSA_WITH_AES_128_CBC_SHA256: Self = Self(0x003C);
    pub const TLS_RSA_WITH_AES_256_CBC_SHA256: Self = Self(0x003D);

    // Ephemeral DH key exchange, RSA-signed parameters
    pub const TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA: Self = Self(0x0016);
    pub const TLS_DHE_RSA_WITH_AES_128_CBC_SHA: Self = Self(0x0033);
    pub const TLS_DHE_RSA_WITH_AES_256_CBC_SHA: Self = Self(0x0039);
    pub const TLS_DHE_RSA_WITH_AES_128_CBC_SHA256: Self = Self(0x0067);
    pub const TLS_DHE_RSA_WITH_AES_256_CBC_SHA256: Self = Self(0x006B);

    /// Renegotiation signalling value (RFC 5746 §3.3), never selected.
    pub const TLS_EMPTY_RENEGOTIATION_INFO_SCSV: Self = Self(0x00FF);
}
