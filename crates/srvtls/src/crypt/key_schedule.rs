//! Key derivation using the TLS PRF (RFC 5246 §6.3, §7.4.9, §8.1).
//!
//! Derives the master secret from the pre-master secret, expands it into
//! per-direction record keys and computes Finished verify data.

use super::prf::prf;
use super::traffic_keys::{CipherContext, Direction};
use super::transcript::Transcript;
use super::CipherSuiteParams;
use crate::TlsVersion;
use srvtls_types::TlsError;
use zeroize::Zeroizing;

/// Length of Finished verify_data for TLS 1.0-1.2.
pub const VERIFY_DATA_LEN: usize = 12;

/// Length of the master secret.
pub const MASTER_SECRET_LEN: usize = 48;

pub const CLIENT_FINISHED_LABEL: &str = "client finished";
pub const SERVER_FINISHED_LABEL: &str = "server finished";

/// Derive the 48-byte master secret from the pre-master secret.
///
/// ```text
/// master_secret = PRF(pre_master_secret, "master secret",
///                     ClientHello.random + ServerHello.random)[0..47]
/// ```
pub fn derive_master_secret(
    version: TlsVersion,
    pre_master_secret: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
) -> Result<Zeroizing<Vec<u8>>, TlsError> {
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(client_random);
    seed.extend_from_slice(server_random);
    prf(
        version,
        pre_master_secret,
        "master secret",
        &seed,
        MASTER_SECRET_LEN,
    )
    .map(Zeroizing::new)
}

/// Expand the master secret into `(server_write, client_write)` contexts.
///
/// ```text
/// key_block = PRF(master_secret, "key expansion",
///                 ServerHello.random + ClientHello.random)
///
/// client_write_MAC_key || server_write_MAC_key ||
/// client_write_key     || server_write_key     ||
/// client_write_IV      || server_write_IV
/// ```
pub fn derive_cipher_contexts(
    version: TlsVersion,
    params: &CipherSuiteParams,
    master_secret: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
) -> Result<(CipherContext, CipherContext), TlsError> {
    // Seed order is reversed relative to the master secret derivation.
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);

    let total_len = params.key_block_len(version);
    let key_block = Zeroizing::new(prf(
        version,
        master_secret,
        "key expansion",
        &seed,
        total_len,
    )?);

    let mac_len = params.mac.key_len();
    let key_len = params.cipher.key_len();
    let iv_len = params.fixed_iv_len(version);

    let mut offset = 0;
    let mut take = |n: usize| {
        let out = key_block[offset..offset + n].to_vec();
        offset += n;
        out
    };
    let client_mac = take(mac_len);
    let server_mac = take(mac_len);
    let client_key = take(key_len);
    let server_key = take(key_len);
    let client_iv = take(iv_len);
    let server_iv = take(iv_len);

    let server = CipherContext {
        suite: params.suite,
        version,
        direction: Direction::Encrypt,
        mac_key: server_mac,
        key: server_key,
        iv: server_iv,
    };
    let client = CipherContext {
        suite: params.suite,
        version,
        direction: Direction::Decrypt,
        mac_key: client_mac,
        key: client_key,
        iv: client_iv,
    };
    Ok((server, client))
}

/// Compute the Finished verify_data (12 bytes).
///
/// ```text
/// verify_data = PRF(master_secret, finished_label,
///                   Hash(handshake_messages))[0..11]
/// ```
pub fn compute_verify_data(
    version: TlsVersion,
    master_secret: &[u8],
    label: &str,
    transcript: &Transcript,
) -> Result<Vec<u8>, TlsError> {
    prf(
        version,
        master_secret,
        label,
        &transcript.hash(version),
        VERIFY_DATA_LEN,
    )
}
