//! ClientHello processing: negotiation and the server's first flight
//! (ServerHello, Certificate, ServerKeyExchange, ServerHelloDone).

use super::codec::{
    decode_client_hello, encode_certificate, encode_dh_params, encode_server_hello,
    encode_server_hello_done, encode_server_key_exchange, ServerDhParams, ServerHello,
    ServerKeyExchange,
};
use super::extensions_codec::{
    build_renegotiation_info, build_server_name_ack, parse_client_hello_extensions,
};
use super::negotiate::{
    check_initial_renegotiation_signal, check_renegotiation_binding, select_cipher_suite,
    select_server_name, select_signature_hash, select_version,
};
use super::params::{DhState, SecurityParameters};
use super::signing::sign_server_params;
use super::{HandshakeState, Transition};
use crate::config::{OwnCertificate, ServerConfig};
use crate::crypt::transcript::Transcript;
use crate::record::{ContentType, Output};
use srvtls_types::{CryptoError, TlsError};
use tracing::debug;
use zeroize::Zeroizing;

/// Process a ClientHello.
///
/// `renegotiating` is set when the hello arrives on an established
/// connection; the previous verify data and server name then bind the new
/// handshake to the old one.
pub fn handle_client_hello(
    config: &ServerConfig,
    params: SecurityParameters,
    body: &[u8],
    raw: &[u8],
    renegotiating: bool,
) -> Result<Transition, TlsError> {
    let ch = decode_client_hello(body)?;
    let exts = parse_client_hello_extensions(&ch.extensions)?;

    // Renegotiation binding is checked before anything else is negotiated.
    let previous_name = if renegotiating {
        check_renegotiation_binding(
            &ch.cipher_suites,
            exts.renegotiation_info.as_deref(),
            &params.client_verify_data,
        )?;
        Some(params.server_name.as_deref())
    } else {
        check_initial_renegotiation_signal(&ch.cipher_suites, exts.renegotiation_info.as_deref())?;
        None
    };
    let sni = select_server_name(config, exts.server_name.as_deref(), previous_name)?;

    let current = if renegotiating {
        params.protocol_version
    } else {
        None
    };
    let version = select_version(config, ch.client_version, current)?;
    let suite = select_cipher_suite(config, &ch.cipher_suites, version, &params.own_certificate)?;
    let sig_hash = select_signature_hash(
        config,
        version,
        suite.kx_alg,
        exts.signature_algorithms.as_deref(),
    )?;
    debug!(
        ?version,
        suite = format_args!("0x{:04x}", suite.suite.0),
        ?sig_hash,
        renegotiating,
        "negotiated ClientHello"
    );

    let mut server_random = [0u8; 32];
    getrandom::getrandom(&mut server_random).map_err(|_| CryptoError::RandGenFail)?;

    let mut extensions = vec![build_renegotiation_info(
        &params.client_verify_data,
        &params.server_verify_data,
    )];
    if sni.acknowledge {
        extensions.push(build_server_name_ack());
    }
    let server_hello = encode_server_hello(&ServerHello {
        server_version: version.wire(),
        random: server_random,
        session_id: Vec::new(),
        cipher_suite: suite.suite,
        extensions,
    });

    let mut transcript = Transcript::new();
    transcript.push(raw);
    transcript.push(&server_hello);
    let mut flight = server_hello;

    let key = match &params.own_certificate {
        OwnCertificate::PrivateCert { chain, key } if suite.kx_alg.requires_certificate() => {
            let certificate = encode_certificate(chain);
            transcript.push(&certificate);
            flight.extend_from_slice(&certificate);
            Some(key.clone())
        }
        OwnCertificate::PrivateCert { .. } => None,
        // Suite selection never picks an authenticated suite without a cert.
        OwnCertificate::NoCert => {
            return Err(TlsError::HandshakeFailure(
                "no certificate for server authentication".into(),
            ))
        }
    };

    let mut dh_state = DhState::Idle;
    if suite.kx_alg.is_ephemeral() {
        let key = key.ok_or_else(|| {
            TlsError::HandshakeFailure("no signing key for ServerKeyExchange".into())
        })?;
        let group = config.dh_group.clone();
        let (secret, ys) = group.generate_key_pair()?;
        let dh_params = ServerDhParams {
            p: group.p_bytes(),
            g: group.g_bytes(),
            ys,
        };

        let mut signed = Vec::with_capacity(64 + 6 + 2 * group.prime_size());
        signed.extend_from_slice(&ch.random);
        signed.extend_from_slice(&server_random);
        signed.extend_from_slice(&encode_dh_params(&dh_params));
        let signature = sign_server_params(&key, version, sig_hash, &signed)?;

        let ske = encode_server_key_exchange(&ServerKeyExchange {
            params: dh_params,
            hash: sig_hash,
            signature,
        });
        transcript.push(&ske);
        flight.extend_from_slice(&ske);
        dh_state = DhState::Sent { group, secret };
    }

    let done = encode_server_hello_done();
    transcript.push(&done);
    flight.extend_from_slice(&done);

    let next = SecurityParameters {
        protocol_version: Some(version),
        client_version: ch.client_version,
        ciphersuite: Some(suite.suite),
        server_name: sni.server_name,
        client_random: ch.random,
        server_random,
        master_secret: Zeroizing::new(Vec::new()),
        client_verify_data: params.client_verify_data,
        server_verify_data: params.server_verify_data,
        own_certificate: params.own_certificate,
        dh_state,
    };
    let output = Output::Record {
        content_type: ContentType::Handshake,
        data: flight,
    };
    Ok(Transition::with_outputs(
        HandshakeState::Handshaking(transcript),
        next,
        vec![output],
    ))
}
