//! ClientKeyExchange processing: pre-master secret recovery and key
//! derivation.

use super::codec::{decode_client_key_exchange_dh, decode_client_key_exchange_rsa};
use super::params::{DhState, SecurityParameters};
use super::{HandshakeState, Transition};
use crate::config::OwnCertificate;
use crate::crypt::key_schedule::{derive_cipher_contexts, derive_master_secret, MASTER_SECRET_LEN};
use crate::crypt::transcript::Transcript;
use crate::crypt::{CipherSuiteParams, KeyExchangeAlg};
use crate::TlsVersion;
use rand::rngs::OsRng;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use srvtls_types::{CryptoError, TlsError};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use tracing::debug;
use zeroize::Zeroizing;

/// Process a ClientKeyExchange and derive the connection keys.
pub fn handle_client_key_exchange(
    mut params: SecurityParameters,
    mut transcript: Transcript,
    body: &[u8],
    raw: &[u8],
) -> Result<Transition, TlsError> {
    let version = params.version()?;
    let suite = CipherSuiteParams::from_suite(params.suite()?)?;

    let pre_master_secret = match suite.kx_alg {
        KeyExchangeAlg::Rsa => {
            let key = match &params.own_certificate {
                OwnCertificate::PrivateCert { key, .. } => key.clone(),
                OwnCertificate::NoCert => {
                    return Err(TlsError::HandshakeFailure(
                        "RSA key exchange without a private key".into(),
                    ))
                }
            };
            let encrypted = decode_client_key_exchange_rsa(body)?;
            rsa_pre_master_secret(&key, version, params.client_version, &encrypted)?
        }
        KeyExchangeAlg::DheRsa => {
            let yc = decode_client_key_exchange_dh(body)?;
            match std::mem::take(&mut params.dh_state) {
                DhState::Sent { group, secret } => group
                    .compute_shared_secret(&secret, &yc)
                    .map_err(|_| TlsError::HandshakeFailure("invalid DH public value".into()))?,
                DhState::Idle => {
                    return Err(TlsError::HandshakeFailure(
                        "ClientKeyExchange without ServerKeyExchange".into(),
                    ))
                }
            }
        }
    };

    params.master_secret = derive_master_secret(
        version,
        &pre_master_secret,
        &params.client_random,
        &params.server_random,
    )?;
    let (server_ctx, client_ctx) = derive_cipher_contexts(
        version,
        &suite,
        &params.master_secret,
        &params.client_random,
        &params.server_random,
    )?;
    transcript.push(raw);
    debug!(kx = ?suite.kx_alg, "keys derived");

    Ok(Transition::new(
        HandshakeState::KeysExchanged {
            server_ctx: Some(server_ctx),
            client_ctx: Some(client_ctx),
            transcript,
        },
        params,
    ))
}

/// Whether the first two pre-master secret bytes carry an acceptable
/// version. TLS 1.0 tolerates clients that put any version up to 1.2.
fn pms_version_ok(version: TlsVersion, major: u8, minor: u8) -> Choice {
    let major_ok = major.ct_eq(&3);
    let minor_ok = match version {
        TlsVersion::Tls10 => minor.ct_eq(&1) | minor.ct_eq(&2) | minor.ct_eq(&3),
        TlsVersion::Tls11 | TlsVersion::Tls12 => minor.ct_eq(&(version.wire() as u8)),
    };
    major_ok & minor_ok
}

/// Decrypt the RSA-encrypted pre-master secret (RFC 5246 §7.4.7.1).
///
/// Decryption failure, a wrong length and a wrong version all yield a
/// random 48-byte value instead of an error, chosen without branching on
/// the outcome. The mismatch only surfaces at the Finished check.
fn rsa_pre_master_secret(
    key: &RsaPrivateKey,
    version: TlsVersion,
    client_version: u16,
    encrypted: &[u8],
) -> Result<Zeroizing<Vec<u8>>, TlsError> {
    let mut substitute = Zeroizing::new([0u8; MASTER_SECRET_LEN]);
    getrandom::getrandom(&mut substitute[2..]).map_err(|_| CryptoError::RandGenFail)?;
    substitute[..2].copy_from_slice(&client_version.to_be_bytes());

    let decrypted = Zeroizing::new(
        key.decrypt_blinded(&mut OsRng, Pkcs1v15Encrypt, encrypted)
            .unwrap_or_default(),
    );
    let mut candidate = Zeroizing::new([0u8; MASTER_SECRET_LEN]);
    let n = decrypted.len().min(MASTER_SECRET_LEN);
    candidate[..n].copy_from_slice(&decrypted[..n]);

    let valid = (decrypted.len() as u64).ct_eq(&(MASTER_SECRET_LEN as u64))
        & pms_version_ok(version, candidate[0], candidate[1]);

    let mut pms = Zeroizing::new(vec![0u8; MASTER_SECRET_LEN]);
    for (out, (sub, cand)) in pms
        .iter_mut()
        .zip(substitute.iter().zip(candidate.iter()))
    {
        *out = u8::conditional_select(sub, cand, valid);
    }
    Ok(pms)
}
