/// Hash algorithm identifiers, with their TLS 1.2 `HashAlgorithm`
/// registry codes (RFC 5246 §7.4.1.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HashAlgorithm {
    Md5 = 1,
    Sha1 = 2,
    Sha224 = 3,
    Sha256 = 4,
    Sha384 = 5,
    Sha512 = 6,
}

impl HashAlgorithm {
    /// Convert from the wire code. `none(0)` and unknown codes yield `None`.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(HashAlgorithm::Md5),
            2 => Some(HashAlgorithm::Sha1),
            3 => Some(HashAlgorithm::Sha224),
            4 => Some(HashAlgorithm::Sha256),
            5 => Some(HashAlgorithm::Sha384),
            6 => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Digest output size in bytes.
    pub fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

/// Signature algorithm identifiers, TLS 1.2 `SignatureAlgorithm` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SignatureAlgorithm {
    Anonymous = 0,
    Rsa = 1,
    Dsa = 2,
    Ecdsa = 3,
}

impl SignatureAlgorithm {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(SignatureAlgorithm::Anonymous),
            1 => Some(SignatureAlgorithm::Rsa),
            2 => Some(SignatureAlgorithm::Dsa),
            3 => Some(SignatureAlgorithm::Ecdsa),
            _ => None,
        }
    }
}
