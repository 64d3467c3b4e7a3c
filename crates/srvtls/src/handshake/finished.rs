//! ChangeCipherSpec and Finished processing.

use super::codec::{decode_finished, encode_finished};
use super::params::SecurityParameters;
use super::{HandshakeState, Transition};
use crate::crypt::key_schedule::{
    compute_verify_data, CLIENT_FINISHED_LABEL, SERVER_FINISHED_LABEL,
};
use crate::crypt::traffic_keys::CipherContext;
use crate::crypt::transcript::Transcript;
use crate::record::{ContentType, Output};
use srvtls_types::TlsError;
use subtle::ConstantTimeEq;
use tracing::debug;

/// Process the client's ChangeCipherSpec.
///
/// The server answers with its own ChangeCipherSpec and switches its write
/// side at once; the read side switch is returned separately and applies
/// to the next incoming record.
pub fn handle_change_cipher_spec(
    state: HandshakeState,
    params: SecurityParameters,
    fragment: &[u8],
) -> Result<Transition, TlsError> {
    if fragment != [1] {
        return Err(TlsError::DecodeError("malformed ChangeCipherSpec".into()));
    }
    match state {
        HandshakeState::KeysExchanged {
            server_ctx: Some(server_ctx),
            client_ctx: Some(client_ctx),
            transcript,
        } => {
            debug!("ChangeCipherSpec: switching cipher contexts");
            let outputs = vec![
                Output::Record {
                    content_type: ContentType::ChangeCipherSpec,
                    data: vec![1],
                },
                Output::SwitchEncryption(server_ctx),
            ];
            let mut t = Transition::with_outputs(
                HandshakeState::KeysExchanged {
                    server_ctx: None,
                    client_ctx: None,
                    transcript,
                },
                params,
                outputs,
            );
            t.switch_decryption = Some(client_ctx);
            Ok(t)
        }
        other => Err(TlsError::UnexpectedMessage(format!(
            "ChangeCipherSpec in state {}",
            other.name()
        ))),
    }
}

/// Verify the client's Finished and answer with the server's.
pub fn handle_finished(
    mut params: SecurityParameters,
    server_ctx: Option<CipherContext>,
    client_ctx: Option<CipherContext>,
    mut transcript: Transcript,
    body: &[u8],
    raw: &[u8],
) -> Result<Transition, TlsError> {
    if server_ctx.is_some() || client_ctx.is_some() {
        return Err(TlsError::UnexpectedMessage(
            "Finished before ChangeCipherSpec".into(),
        ));
    }
    let version = params.version()?;
    let client_verify_data = decode_finished(body)?;

    let expected = compute_verify_data(
        version,
        &params.master_secret,
        CLIENT_FINISHED_LABEL,
        &transcript,
    )?;
    if !bool::from(expected.ct_eq(&client_verify_data)) {
        return Err(TlsError::HandshakeFailure("Finished verify_data mismatch".into()));
    }

    transcript.push(raw);
    let server_verify_data = compute_verify_data(
        version,
        &params.master_secret,
        SERVER_FINISHED_LABEL,
        &transcript,
    )?;
    let finished = encode_finished(&server_verify_data);

    params.client_verify_data = client_verify_data;
    params.server_verify_data = server_verify_data;
    debug!(?version, "handshake established");

    Ok(Transition::with_outputs(
        HandshakeState::Established,
        params,
        vec![Output::Record {
            content_type: ContentType::Handshake,
            data: finished,
        }],
    ))
}
