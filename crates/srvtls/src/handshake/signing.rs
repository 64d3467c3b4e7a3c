//! ServerKeyExchange signature (RFC 2246 §7.4.3, RFC 5246 §7.4.3).
//!
//! TLS 1.0/1.1 sign the 36-byte `MD5 || SHA-1` digest with PKCS#1 v1.5
//! and no DigestInfo; TLS 1.2 signs a single digest wrapped in
//! DigestInfo for the negotiated hash.

use crate::crypt::hash::digest;
use crate::TlsVersion;
use md5::Md5;
use rand::rngs::OsRng;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use srvtls_types::{HashAlgorithm, TlsError};

/// Padding scheme and hashed input for a signature over `data`.
fn prepare(
    version: TlsVersion,
    hash: Option<HashAlgorithm>,
    data: &[u8],
) -> Result<(Pkcs1v15Sign, Vec<u8>), TlsError> {
    match version {
        TlsVersion::Tls10 | TlsVersion::Tls11 => {
            let mut hashed = digest(HashAlgorithm::Md5, data);
            hashed.extend_from_slice(&digest(HashAlgorithm::Sha1, data));
            Ok((Pkcs1v15Sign::new_unprefixed(), hashed))
        }
        TlsVersion::Tls12 => {
            let hash = hash.ok_or_else(|| {
                TlsError::HandshakeFailure("no signature hash negotiated".into())
            })?;
            let padding = match hash {
                HashAlgorithm::Md5 => Pkcs1v15Sign::new::<Md5>(),
                HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
                HashAlgorithm::Sha224 => Pkcs1v15Sign::new::<Sha224>(),
                HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
                HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
                HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
            };
            Ok((padding, digest(hash, data)))
        }
    }
}

/// Sign `client_random || server_random || ServerDHParams`.
pub fn sign_server_params(
    key: &RsaPrivateKey,
    version: TlsVersion,
    hash: Option<HashAlgorithm>,
    signed_data: &[u8],
) -> Result<Vec<u8>, TlsError> {
    let (padding, hashed) = prepare(version, hash, signed_data)?;
    // A key too small for the DigestInfo of the chosen hash fails here.
    key.sign_with_rng(&mut OsRng, padding, &hashed)
        .map_err(|e| TlsError::HandshakeFailure(format!("ServerKeyExchange signing failed: {e}")))
}

/// Verify a ServerKeyExchange signature with the server's public key.
pub fn verify_server_params(
    key: &RsaPublicKey,
    version: TlsVersion,
    hash: Option<HashAlgorithm>,
    signed_data: &[u8],
    signature: &[u8],
) -> Result<(), TlsError> {
    let (padding, hashed) = prepare(version, hash, signed_data)?;
    key.verify(padding, &hashed, signature)
        .map_err(|_| TlsError::HandshakeFailure("ServerKeyExchange signature invalid".into()))
}
