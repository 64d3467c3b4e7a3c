//! TLS hello extensions understood by the server (SNI, RFC 5746, TLS 1.2
//! signature algorithms).

/// TLS extension type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionType(pub u16);

impl ExtensionType {
    pub const SERVER_NAME: Self = Self(0);
    pub const SUPPORTED_GROUPS: Self = Self(10);
    pub const EC_POINT_FORMATS: Self = Self(11);
    pub const SIGNATURE_ALGORITHMS: Self = Self(13);
    pub const SESSION_TICKET: Self = Self(35);
    pub const RENEGOTIATION_INFO: Self = Self(0xFF01);
}

/// A raw TLS extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub extension_type: ExtensionType,
    pub data: Vec<u8>,
}

impl Extension {
    pub fn new(extension_type: ExtensionType, data: Vec<u8>) -> Self {
        Self {
            extension_type,
            data,
        }
    }
}

/// Find the first extension of the given type.
pub fn find(extensions: &[Extension], ty: ExtensionType) -> Option<&Extension> {
    extensions.iter().find(|e| e.extension_type == ty)
}
