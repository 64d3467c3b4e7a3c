#![no_main]
use libfuzzer_sys::fuzz_target;
use srvtls::handshake::codec;
use srvtls::handshake::extensions_codec;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let _ = codec::parse_handshake_header(data);
    if data.len() >= 4 {
        let body = &data[4..];
        if let Ok(ch) = codec::decode_client_hello(body) {
            let _ = extensions_codec::parse_client_hello_extensions(&ch.extensions);
        }
        let _ = codec::decode_client_key_exchange_rsa(body);
        let _ = codec::decode_client_key_exchange_dh(body);
        let _ = codec::decode_finished(body);
    }
});
