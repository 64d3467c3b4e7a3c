//! TLS PRF (RFC 2246 §5, RFC 5246 §5).
//!
//! ```text
//! TLS 1.2:      PRF(secret, label, seed) = P_SHA256(secret, label + seed)
//! TLS 1.0/1.1:  PRF(secret, label, seed) = P_MD5(S1, label + seed) XOR
//!                                          P_SHA1(S2, label + seed)
//!
//! P_hash(secret, seed) = HMAC_hash(secret, A(1) + seed) ||
//!                        HMAC_hash(secret, A(2) + seed) || ...
//! A(0) = seed
//! A(i) = HMAC_hash(secret, A(i-1))
//! ```

use super::hash::hmac;
use crate::TlsVersion;
use srvtls_types::{CryptoError, HashAlgorithm, TlsError};

/// Upper bound on a single PRF expansion.
const MAX_OUTPUT_LEN: usize = 1 << 16;

/// Derive `output_len` bytes from `secret`, `label` and `seed` with the
/// PRF of `version`.
pub fn prf(
    version: TlsVersion,
    secret: &[u8],
    label: &str,
    seed: &[u8],
    output_len: usize,
) -> Result<Vec<u8>, TlsError> {
    if output_len > MAX_OUTPUT_LEN {
        return Err(CryptoError::KdfDkLenOverflow.into());
    }

    let mut label_seed = Vec::with_capacity(label.len() + seed.len());
    label_seed.extend_from_slice(label.as_bytes());
    label_seed.extend_from_slice(seed);

    match version {
        TlsVersion::Tls12 => p_hash(HashAlgorithm::Sha256, secret, &label_seed, output_len),
        TlsVersion::Tls10 | TlsVersion::Tls11 => {
            // S1 and S2 share the middle byte when the secret length is odd.
            let half = secret.len().div_ceil(2);
            let s1 = &secret[..half];
            let s2 = &secret[secret.len() - half..];

            let mut out = p_hash(HashAlgorithm::Md5, s1, &label_seed, output_len)?;
            let sha = p_hash(HashAlgorithm::Sha1, s2, &label_seed, output_len)?;
            for (o, s) in out.iter_mut().zip(sha.iter()) {
                *o ^= s;
            }
            Ok(out)
        }
    }
}

/// P_hash expansion function.
fn p_hash(
    alg: HashAlgorithm,
    secret: &[u8],
    seed: &[u8],
    output_len: usize,
) -> Result<Vec<u8>, TlsError> {
    let mut result = Vec::with_capacity(output_len + alg.output_size());

    // A(0) = seed
    let mut a = seed.to_vec();

    while result.len() < output_len {
        a = hmac(alg, secret, &a)?;

        let mut ai_seed = Vec::with_capacity(a.len() + seed.len());
        ai_seed.extend_from_slice(&a);
        ai_seed.extend_from_slice(seed);
        let block = hmac(alg, secret, &ai_seed)?;

        result.extend_from_slice(&block);
    }

    result.truncate(output_len);
    Ok(result)
}
