#![no_main]
use libfuzzer_sys::fuzz_target;
use srvtls::config::ServerConfig;
use srvtls::connection::ServerHandshake;
use srvtls::record::ContentType;
use std::sync::Arc;

// Input: a sequence of `type(1) || len(2) || fragment` records fed to a
// fresh server without a certificate.
fuzz_target!(|data: &[u8]| {
    let mut hs = ServerHandshake::new(Arc::new(ServerConfig::builder().build()));
    let mut rest = data;
    while rest.len() >= 3 {
        let len = u16::from_be_bytes([rest[1], rest[2]]) as usize;
        let Ok(content_type) = ContentType::from_u8(rest[0]) else {
            return;
        };
        let end = (3 + len).min(rest.len());
        if hs.handle_record(content_type, &rest[3..end]).is_err() {
            return;
        }
        hs.drain_outputs();
        rest = &rest[end..];
    }
});
