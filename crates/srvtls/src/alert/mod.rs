//! TLS alert protocol (RFC 5246 §7.2).

use crate::handshake::params::SecurityParameters;
use crate::handshake::{HandshakeState, Transition};
use crate::record::{ContentType, Output};
use srvtls_types::TlsError;
use tracing::{debug, warn};

/// Alert severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertLevel {
    Warning = 1,
    Fatal = 2,
}

/// Alert description codes defined for TLS 1.0-1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertDescription {
    CloseNotify = 0,
    UnexpectedMessage = 10,
    BadRecordMac = 20,
    /// Deprecated in TLS 1.1 (RFC 4346); replaced by BadRecordMac.
    DecryptionFailed = 21,
    RecordOverflow = 22,
    DecompressionFailure = 30,
    HandshakeFailure = 40,
    BadCertificate = 42,
    UnsupportedCertificate = 43,
    CertificateRevoked = 44,
    CertificateExpired = 45,
    CertificateUnknown = 46,
    IllegalParameter = 47,
    UnknownCa = 48,
    AccessDenied = 49,
    DecodeError = 50,
    DecryptError = 51,
    ExportRestriction = 60,
    ProtocolVersion = 70,
    InsufficientSecurity = 71,
    InternalError = 80,
    UserCanceled = 90,
    NoRenegotiation = 100,
    UnsupportedExtension = 110,
    UnrecognizedName = 112,
}

/// A TLS alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl AlertLevel {
    /// Convert from u8 to AlertLevel.
    pub fn from_u8(v: u8) -> Result<Self, u8> {
        match v {
            1 => Ok(AlertLevel::Warning),
            2 => Ok(AlertLevel::Fatal),
            _ => Err(v),
        }
    }
}

impl AlertDescription {
    /// Convert from u8 to AlertDescription.
    pub fn from_u8(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(AlertDescription::CloseNotify),
            10 => Ok(AlertDescription::UnexpectedMessage),
            20 => Ok(AlertDescription::BadRecordMac),
            21 => Ok(AlertDescription::DecryptionFailed),
            22 => Ok(AlertDescription::RecordOverflow),
            30 => Ok(AlertDescription::DecompressionFailure),
            40 => Ok(AlertDescription::HandshakeFailure),
            42 => Ok(AlertDescription::BadCertificate),
            43 => Ok(AlertDescription::UnsupportedCertificate),
            44 => Ok(AlertDescription::CertificateRevoked),
            45 => Ok(AlertDescription::CertificateExpired),
            46 => Ok(AlertDescription::CertificateUnknown),
            47 => Ok(AlertDescription::IllegalParameter),
            48 => Ok(AlertDescription::UnknownCa),
            49 => Ok(AlertDescription::AccessDenied),
            50 => Ok(AlertDescription::DecodeError),
            51 => Ok(AlertDescription::DecryptError),
            60 => Ok(AlertDescription::ExportRestriction),
            70 => Ok(AlertDescription::ProtocolVersion),
            71 => Ok(AlertDescription::InsufficientSecurity),
            80 => Ok(AlertDescription::InternalError),
            90 => Ok(AlertDescription::UserCanceled),
            100 => Ok(AlertDescription::NoRenegotiation),
            110 => Ok(AlertDescription::UnsupportedExtension),
            112 => Ok(AlertDescription::UnrecognizedName),
            _ => Err(v),
        }
    }
}

impl Alert {
    pub fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Self { level, description }
    }

    /// Encode as an alert record fragment.
    pub fn encode(&self) -> Vec<u8> {
        vec![self.level as u8, self.description as u8]
    }

    /// The record the record layer should send for this alert.
    pub fn to_output(self) -> Output {
        Output::Record {
            content_type: ContentType::Alert,
            data: self.encode(),
        }
    }
}

/// Map a handshake error onto the fatal alert that reports it.
///
/// A missing renegotiation signal on the initial hello is reported as
/// `handshake_failure` (RFC 5746 §3.6); `no_renegotiation` is only ever a
/// warning.
pub fn alert_for_error(err: &TlsError) -> AlertDescription {
    match err {
        TlsError::HandshakeFailure(_) | TlsError::NoRenegotiation => {
            AlertDescription::HandshakeFailure
        }
        TlsError::ProtocolVersion => AlertDescription::ProtocolVersion,
        TlsError::UnexpectedMessage(_) => AlertDescription::UnexpectedMessage,
        TlsError::DecodeError(_) => AlertDescription::DecodeError,
        TlsError::AlertReceived { .. } | TlsError::Crypto(_) => AlertDescription::InternalError,
    }
}

/// Handle an incoming alert record.
///
/// `close_notify` is answered with `close_notify` and followed by
/// [`Output::Closed`]; warnings are tolerated; fatal alerts end the
/// connection with [`TlsError::AlertReceived`].
pub fn handle_alert(
    state: HandshakeState,
    params: SecurityParameters,
    fragment: &[u8],
) -> Result<Transition, TlsError> {
    if fragment.len() != 2 {
        return Err(TlsError::DecodeError(format!(
            "alert record of {} bytes",
            fragment.len()
        )));
    }
    let level = AlertLevel::from_u8(fragment[0])
        .map_err(|v| TlsError::DecodeError(format!("unknown alert level {v}")))?;
    let description = fragment[1];

    if description == AlertDescription::CloseNotify as u8 {
        debug!("peer sent close_notify");
        let reply = Alert::new(AlertLevel::Warning, AlertDescription::CloseNotify);
        return Ok(Transition::with_outputs(
            state,
            params,
            vec![reply.to_output(), Output::Closed],
        ));
    }

    match level {
        AlertLevel::Fatal => {
            warn!(description, "peer sent fatal alert");
            Err(TlsError::AlertReceived {
                fatal: true,
                description,
            })
        }
        AlertLevel::Warning => {
            if description == AlertDescription::NoRenegotiation as u8 {
                debug!("peer declined renegotiation");
            } else {
                warn!(description, "ignoring warning alert");
            }
            Ok(Transition::new(state, params))
        }
    }
}
