//! Per-direction record protection keys.
//!
//! A [`CipherContext`] is everything the record layer needs to protect
//! one direction of traffic after a ChangeCipherSpec. It is handed over
//! in a switch output and never shared, hence it is not `Clone`.

use crate::{CipherSuite, TlsVersion};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Which way a context protects traffic, from the server's viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Server to client (server write keys).
    Encrypt,
    /// Client to server (client write keys).
    Decrypt,
}

/// Record protection keys for one direction.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CipherContext {
    #[zeroize(skip)]
    pub suite: CipherSuite,
    #[zeroize(skip)]
    pub version: TlsVersion,
    #[zeroize(skip)]
    pub direction: Direction,
    pub mac_key: Vec<u8>,
    pub key: Vec<u8>,
    /// Implicit IV (TLS 1.0 CBC only), empty otherwise.
    pub iv: Vec<u8>,
}

impl fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherContext")
            .field("suite", &format_args!("0x{:04x}", self.suite.0))
            .field("version", &self.version)
            .field("direction", &self.direction)
            .field("mac_key", &"<redacted>")
            .field("key", &"<redacted>")
            .field("iv_len", &self.iv.len())
            .finish()
    }
}
