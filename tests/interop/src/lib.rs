//! End-to-end tests for srvtls.
//! A minimal in-process client drives `ServerHandshake` through full
//! handshakes, renegotiation and failure paths.

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;
    use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
    use srvtls::config::{OwnCertificate, ServerConfig};
    use srvtls::connection::ServerHandshake;
    use srvtls::crypt::dh::DhGroup;
    use srvtls::crypt::key_schedule::{
        compute_verify_data, derive_master_secret, CLIENT_FINISHED_LABEL, SERVER_FINISHED_LABEL,
    };
    use srvtls::crypt::transcript::Transcript;
    use srvtls::extensions::{Extension, ExtensionType};
    use srvtls::handshake::codec::{
        decode_certificate, decode_server_hello, decode_server_key_exchange, encode_client_hello,
        encode_client_key_exchange, encode_dh_params, encode_finished, parse_handshake_header,
        ClientHello, ServerHello,
    };
    use srvtls::handshake::extensions_codec::{
        build_renegotiation_info, build_server_name, build_signature_algorithms, SignatureAndHash,
    };
    use srvtls::handshake::signing::verify_server_params;
    use srvtls::handshake::HandshakeType;
    use srvtls::record::{ContentType, Output};
    use srvtls::{CipherSuite, TlsVersion};
    use srvtls_types::{HashAlgorithm, SignatureAlgorithm, TlsError};
    use std::sync::{Arc, OnceLock};

    const CERT: &[u8] = b"\x30\x03\x02\x01\x01";

    fn server_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).unwrap())
    }

    fn config_with(suites: &[CipherSuite]) -> ServerConfig {
        ServerConfig::builder()
            .cipher_suites(suites)
            .certificate(OwnCertificate::PrivateCert {
                chain: vec![CERT.to_vec()],
                key: Arc::new(server_key().clone()),
            })
            .dh_group(DhGroup::oakley_1024())
            .build()
    }

    fn server(config: ServerConfig) -> ServerHandshake {
        ServerHandshake::new(Arc::new(config))
    }

    fn random() -> [u8; 32] {
        let mut r = [0u8; 32];
        getrandom::getrandom(&mut r).unwrap();
        r
    }

    /// Split the concatenated bodies of all handshake records in `outs`.
    fn handshake_messages(outs: &[Output]) -> Vec<(HandshakeType, Vec<u8>, Vec<u8>)> {
        let mut msgs = Vec::new();
        for out in outs {
            if let Output::Record {
                content_type: ContentType::Handshake,
                data,
            } = out
            {
                let mut pos = 0;
                while pos < data.len() {
                    let (ty, body, used) = parse_handshake_header(&data[pos..]).unwrap();
                    msgs.push((ty, body.to_vec(), data[pos..pos + used].to_vec()));
                    pos += used;
                }
            }
        }
        msgs
    }

    fn types(msgs: &[(HandshakeType, Vec<u8>, Vec<u8>)]) -> Vec<HandshakeType> {
        msgs.iter().map(|(ty, _, _)| *ty).collect()
    }

    /// Client side of one handshake.
    struct TestClient {
        version: u16,
        suites: Vec<CipherSuite>,
        extensions: Vec<Extension>,
        random: [u8; 32],
        transcript: Transcript,
        negotiated: Option<TlsVersion>,
        server_hello: Option<ServerHello>,
        master_secret: Vec<u8>,
        client_verify_data: Vec<u8>,
        server_verify_data: Vec<u8>,
        /// Overrides the RSA pre-master secret or ciphertext.
        pms_override: Option<Vec<u8>>,
        ciphertext_override: Option<Vec<u8>>,
    }

    impl TestClient {
        fn new(version: u16, suites: &[CipherSuite]) -> Self {
            Self {
                version,
                suites: suites.to_vec(),
                extensions: Vec::new(),
                random: random(),
                transcript: Transcript::new(),
                negotiated: None,
                server_hello: None,
                master_secret: Vec::new(),
                client_verify_data: Vec::new(),
                server_verify_data: Vec::new(),
                pms_override: None,
                ciphertext_override: None,
            }
        }

        fn with_scsv(version: u16, suite: CipherSuite) -> Self {
            Self::new(
                version,
                &[suite, CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV],
            )
        }

        fn client_hello(&mut self) -> Vec<u8> {
            let msg = encode_client_hello(&ClientHello {
                client_version: self.version,
                random: self.random,
                session_id: vec![],
                cipher_suites: self.suites.clone(),
                compression_methods: vec![0],
                extensions: self.extensions.clone(),
            });
            self.transcript = Transcript::new();
            self.transcript.push(&msg);
            msg
        }

        /// Consume the server's first flight and build ClientKeyExchange.
        fn client_key_exchange(&mut self, outs: &[Output]) -> Vec<u8> {
            let msgs = handshake_messages(outs);
            let mut pms = Vec::new();
            let mut exchange = Vec::new();
            for (ty, body, raw) in &msgs {
                self.transcript.push(raw);
                match ty {
                    HandshakeType::ServerHello => {
                        let sh = decode_server_hello(body).unwrap();
                        self.negotiated = TlsVersion::from_wire(sh.server_version);
                        self.server_hello = Some(sh);
                    }
                    HandshakeType::Certificate => {
                        assert_eq!(decode_certificate(body).unwrap(), vec![CERT.to_vec()]);
                    }
                    HandshakeType::ServerKeyExchange => {
                        let version = self.negotiated.unwrap();
                        let ske =
                            decode_server_key_exchange(body, version == TlsVersion::Tls12).unwrap();
                        let mut signed = self.random.to_vec();
                        signed.extend_from_slice(&self.server_random());
                        signed.extend_from_slice(&encode_dh_params(&ske.params));
                        verify_server_params(
                            &server_key().to_public_key(),
                            version,
                            ske.hash,
                            &signed,
                            &ske.signature,
                        )
                        .unwrap();

                        let group = DhGroup::new(&ske.params.p, &ske.params.g).unwrap();
                        let (secret, public) = group.generate_key_pair().unwrap();
                        pms = group
                            .compute_shared_secret(&secret, &ske.params.ys)
                            .unwrap()
                            .to_vec();
                        exchange = public;
                    }
                    HandshakeType::ServerHelloDone => {}
                    other => panic!("unexpected {other:?} in server flight"),
                }
            }
            if exchange.is_empty() {
                pms = self.pms_override.clone().unwrap_or_else(|| {
                    let mut pms = self.version.to_be_bytes().to_vec();
                    pms.extend_from_slice(&random()[..23]);
                    pms.extend_from_slice(&random()[..23]);
                    pms
                });
                exchange = match &self.ciphertext_override {
                    Some(ct) => ct.clone(),
                    None => server_key()
                        .to_public_key()
                        .encrypt(&mut OsRng, Pkcs1v15Encrypt, &pms)
                        .unwrap(),
                };
            }

            let version = self.negotiated.unwrap();
            self.master_secret = derive_master_secret(
                version,
                &pms,
                &self.random,
                &self.server_random(),
            )
            .unwrap()
            .to_vec();
            let cke = encode_client_key_exchange(&exchange);
            self.transcript.push(&cke);
            cke
        }

        fn finished(&mut self) -> Vec<u8> {
            let version = self.negotiated.unwrap();
            self.client_verify_data = compute_verify_data(
                version,
                &self.master_secret,
                CLIENT_FINISHED_LABEL,
                &self.transcript,
            )
            .unwrap();
            let msg = encode_finished(&self.client_verify_data);
            self.transcript.push(&msg);
            msg
        }

        fn check_server_finished(&mut self, outs: &[Output]) {
            let version = self.negotiated.unwrap();
            let expected = compute_verify_data(
                version,
                &self.master_secret,
                SERVER_FINISHED_LABEL,
                &self.transcript,
            )
            .unwrap();
            let msgs = handshake_messages(outs);
            assert_eq!(types(&msgs), vec![HandshakeType::Finished]);
            assert_eq!(msgs[0].1, expected);
            self.server_verify_data = expected;
        }

        fn server_random(&self) -> [u8; 32] {
            self.server_hello.as_ref().unwrap().random
        }

        fn server_hello(&self) -> &ServerHello {
            self.server_hello.as_ref().unwrap()
        }
    }

    fn send(hs: &mut ServerHandshake, ct: ContentType, data: &[u8]) -> Vec<Output> {
        hs.handle_record(ct, data).unwrap();
        hs.drain_outputs()
    }

    /// Drive a complete handshake and check every server response.
    fn run_handshake(hs: &mut ServerHandshake, client: &mut TestClient) {
        let ch = client.client_hello();
        let flight = send(hs, ContentType::Handshake, &ch);
        let cke = client.client_key_exchange(&flight);
        assert!(send(hs, ContentType::Handshake, &cke).is_empty());

        let ccs = send(hs, ContentType::ChangeCipherSpec, &[1]);
        assert_eq!(ccs.len(), 3);
        assert!(matches!(
            &ccs[0],
            Output::Record { content_type: ContentType::ChangeCipherSpec, data } if data == &vec![1]
        ));
        assert!(matches!(&ccs[1], Output::SwitchEncryption(_)));
        assert!(matches!(&ccs[2], Output::SwitchDecryption(_)));

        let fin = client.finished();
        let outs = send(hs, ContentType::Handshake, &fin);
        client.check_server_finished(&outs);
        assert!(hs.is_established());
    }

    // -------------------------------------------------------
    // 1. First flight shapes
    // -------------------------------------------------------
    #[test]
    fn test_rsa_first_flight() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::with_scsv(0x0303, suite);
        let flight = send(&mut hs, ContentType::Handshake, &client.client_hello());

        let msgs = handshake_messages(&flight);
        assert_eq!(
            types(&msgs),
            vec![
                HandshakeType::ServerHello,
                HandshakeType::Certificate,
                HandshakeType::ServerHelloDone
            ]
        );
        let sh = decode_server_hello(&msgs[0].1).unwrap();
        assert_eq!(sh.server_version, 0x0303);
        assert_eq!(sh.cipher_suite, suite);
        assert!(matches!(
            hs.state(),
            srvtls::handshake::HandshakeState::Handshaking(_)
        ));
    }

    #[test]
    fn test_no_shared_suite_emits_only_alert() {
        let mut hs = server(config_with(&[CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA]));
        let mut client = TestClient::with_scsv(0x0303, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA);
        let err = hs
            .handle_record(ContentType::Handshake, &client.client_hello())
            .unwrap_err();
        assert!(matches!(err, TlsError::HandshakeFailure(_)));
        let outs = hs.drain_outputs();
        assert!(handshake_messages(&outs).is_empty());
        assert!(matches!(
            &outs[..],
            [Output::Record { content_type: ContentType::Alert, data }] if data == &vec![2, 40]
        ));
    }

    #[test]
    fn test_dhe_server_key_exchange_verifies() {
        let suite = CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256;
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::with_scsv(0x0303, suite);
        let flight = send(&mut hs, ContentType::Handshake, &client.client_hello());
        assert_eq!(
            types(&handshake_messages(&flight)),
            vec![
                HandshakeType::ServerHello,
                HandshakeType::Certificate,
                HandshakeType::ServerKeyExchange,
                HandshakeType::ServerHelloDone
            ]
        );
        // verifies the signature over client_random || server_random || params
        client.client_key_exchange(&flight);
    }

    #[test]
    fn test_client_key_exchange_before_hello() {
        let mut hs = server(config_with(&[CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA]));
        let err = hs
            .handle_record(ContentType::Handshake, &encode_client_key_exchange(&[0; 128]))
            .unwrap_err();
        assert!(matches!(err, TlsError::UnexpectedMessage(_)));
        assert!(hs.has_failed());
    }

    // -------------------------------------------------------
    // 2. Complete handshakes
    // -------------------------------------------------------
    #[test]
    fn test_full_rsa_handshake_all_versions() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        for (wire, version) in [
            (0x0303, TlsVersion::Tls12),
            (0x0302, TlsVersion::Tls11),
            (0x0301, TlsVersion::Tls10),
        ] {
            let mut hs = server(config_with(&[suite]));
            let mut client = TestClient::with_scsv(wire, suite);
            run_handshake(&mut hs, &mut client);
            assert_eq!(hs.version(), Some(version));
            assert_eq!(hs.cipher_suite(), Some(suite));
            assert_eq!(hs.params().client_verify_data, client.client_verify_data);
            assert_eq!(hs.params().server_verify_data, client.server_verify_data);
        }
    }

    #[test]
    fn test_full_dhe_handshake() {
        for (wire, suite) in [
            (0x0303, CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256),
            (0x0303, CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA),
            (0x0301, CipherSuite::TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA),
        ] {
            let mut hs = server(config_with(&[suite]));
            let mut client = TestClient::with_scsv(wire, suite);
            run_handshake(&mut hs, &mut client);
            assert_eq!(hs.cipher_suite(), Some(suite));
        }
    }

    #[test]
    fn test_dhe_with_signature_algorithms() {
        let suite = CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::with_scsv(0x0303, suite);
        client.extensions.push(build_signature_algorithms(&[SignatureAndHash {
            hash: HashAlgorithm::Sha384 as u8,
            signature: SignatureAlgorithm::Rsa as u8,
        }]));
        let flight = send(&mut hs, ContentType::Handshake, &client.client_hello());
        let msgs = handshake_messages(&flight);
        let ske = decode_server_key_exchange(&msgs[2].1, true).unwrap();
        assert_eq!(ske.hash, Some(HashAlgorithm::Sha384));
    }

    #[test]
    fn test_version_negotiation() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;

        // a client above TLS 1.2 gets TLS 1.2
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::with_scsv(0x0304, suite);
        send(&mut hs, ContentType::Handshake, &client.client_hello());
        assert_eq!(hs.version(), Some(TlsVersion::Tls12));

        // SSL 3.0 is refused
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::with_scsv(0x0300, suite);
        let err = hs
            .handle_record(ContentType::Handshake, &client.client_hello())
            .unwrap_err();
        assert!(matches!(err, TlsError::ProtocolVersion));
        assert!(matches!(
            &hs.drain_outputs()[..],
            [Output::Record { content_type: ContentType::Alert, data }] if data == &vec![2, 70]
        ));

        // below the configured minimum
        let mut config = config_with(&[suite]);
        config.min_version = TlsVersion::Tls12;
        let mut hs = server(config);
        let mut client = TestClient::with_scsv(0x0302, suite);
        assert!(matches!(
            hs.handle_record(ContentType::Handshake, &client.client_hello()),
            Err(TlsError::ProtocolVersion)
        ));
    }

    #[test]
    fn test_sha256_suite_skipped_below_tls12() {
        let mut hs = server(config_with(&[
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256,
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
        ]));
        let mut client = TestClient::new(
            0x0302,
            &[
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256,
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV,
            ],
        );
        send(&mut hs, ContentType::Handshake, &client.client_hello());
        assert_eq!(hs.cipher_suite(), Some(CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA));
    }

    #[test]
    fn test_server_preference_wins() {
        let a = CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA;
        let b = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let c = CipherSuite::TLS_RSA_WITH_3DES_EDE_CBC_SHA;
        let scsv = CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV;
        for offer in [[c, b, scsv], [b, c, scsv], [scsv, c, b]] {
            let mut hs = server(config_with(&[a, b, c]));
            let mut client = TestClient::new(0x0303, &offer);
            send(&mut hs, ContentType::Handshake, &client.client_hello());
            assert_eq!(hs.cipher_suite(), Some(b));
        }
    }

    #[test]
    fn test_missing_renegotiation_signal() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::new(0x0303, &[suite]);
        let err = hs
            .handle_record(ContentType::Handshake, &client.client_hello())
            .unwrap_err();
        assert!(matches!(err, TlsError::NoRenegotiation));
        assert!(matches!(
            &hs.drain_outputs()[..],
            [Output::Record { content_type: ContentType::Alert, data }] if data == &vec![2, 40]
        ));

        // an empty renegotiation_info works in place of the SCSV
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::new(0x0303, &[suite]);
        client.extensions.push(build_renegotiation_info(&[], &[]));
        run_handshake(&mut hs, &mut client);
    }

    // -------------------------------------------------------
    // 3. RSA pre-master secret oracle
    // -------------------------------------------------------
    #[test]
    fn test_bad_rsa_ciphertext_fails_only_at_finished() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::with_scsv(0x0303, suite);
        client.ciphertext_override = Some(vec![0x42; 128]);

        let flight = send(&mut hs, ContentType::Handshake, &client.client_hello());
        let cke = client.client_key_exchange(&flight);
        assert!(send(&mut hs, ContentType::Handshake, &cke).is_empty());
        assert_eq!(send(&mut hs, ContentType::ChangeCipherSpec, &[1]).len(), 3);

        let err = hs
            .handle_record(ContentType::Handshake, &client.finished())
            .unwrap_err();
        assert!(matches!(err, TlsError::HandshakeFailure(_)));
    }

    #[test]
    fn test_wrong_pms_version_fails_only_at_finished() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::with_scsv(0x0303, suite);
        let mut pms = vec![3, 1];
        pms.extend_from_slice(&[0x24; 46]);
        client.pms_override = Some(pms);

        let flight = send(&mut hs, ContentType::Handshake, &client.client_hello());
        let cke = client.client_key_exchange(&flight);
        assert!(send(&mut hs, ContentType::Handshake, &cke).is_empty());
        send(&mut hs, ContentType::ChangeCipherSpec, &[1]);
        let err = hs
            .handle_record(ContentType::Handshake, &client.finished())
            .unwrap_err();
        assert!(matches!(err, TlsError::HandshakeFailure(_)));
    }

    // -------------------------------------------------------
    // 4. Ordering
    // -------------------------------------------------------
    #[test]
    fn test_finished_without_change_cipher_spec() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::with_scsv(0x0303, suite);
        let flight = send(&mut hs, ContentType::Handshake, &client.client_hello());
        let cke = client.client_key_exchange(&flight);
        send(&mut hs, ContentType::Handshake, &cke);
        let err = hs
            .handle_record(ContentType::Handshake, &client.finished())
            .unwrap_err();
        assert!(matches!(err, TlsError::UnexpectedMessage(_)));
    }

    #[test]
    fn test_application_data_after_handshake() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        assert!(hs
            .handle_record(ContentType::ApplicationData, b"early")
            .is_err());

        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::with_scsv(0x0303, suite);
        run_handshake(&mut hs, &mut client);
        let outs = send(&mut hs, ContentType::ApplicationData, b"ping");
        assert!(matches!(&outs[..], [Output::ApplicationData(d)] if d == b"ping"));
    }

    // -------------------------------------------------------
    // 5. Renegotiation
    // -------------------------------------------------------
    fn renegotiating_client(first: &TestClient, suite: CipherSuite) -> TestClient {
        let mut next = TestClient::new(first.version, &[suite]);
        next.extensions
            .push(build_renegotiation_info(&first.client_verify_data, &[]));
        next
    }

    #[test]
    fn test_secure_renegotiation() {
        let suite = CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut first = TestClient::with_scsv(0x0303, suite);
        run_handshake(&mut hs, &mut first);

        hs.hello_request().unwrap();
        let outs = hs.drain_outputs();
        assert_eq!(types(&handshake_messages(&outs)), vec![HandshakeType::HelloRequest]);

        let mut second = renegotiating_client(&first, suite);
        run_handshake(&mut hs, &mut second);

        let ri = second
            .server_hello()
            .extensions
            .iter()
            .find(|e| e.extension_type == ExtensionType::RENEGOTIATION_INFO)
            .unwrap();
        let mut expected = vec![24];
        expected.extend_from_slice(&first.client_verify_data);
        expected.extend_from_slice(&first.server_verify_data);
        assert_eq!(ri.data, expected);
        assert_eq!(hs.params().client_verify_data, second.client_verify_data);
    }

    #[test]
    fn test_renegotiation_with_wrong_binding() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut first = TestClient::with_scsv(0x0303, suite);
        run_handshake(&mut hs, &mut first);

        let mut second = TestClient::new(0x0303, &[suite]);
        second
            .extensions
            .push(build_renegotiation_info(&[0u8; 12], &[]));
        let err = hs
            .handle_record(ContentType::Handshake, &second.client_hello())
            .unwrap_err();
        assert!(matches!(err, TlsError::HandshakeFailure(_)));

        // the SCSV alone is not enough on renegotiation
        let mut hs = server(config_with(&[suite]));
        let mut first = TestClient::with_scsv(0x0303, suite);
        run_handshake(&mut hs, &mut first);
        let mut second = TestClient::with_scsv(0x0303, suite);
        assert!(matches!(
            hs.handle_record(ContentType::Handshake, &second.client_hello()),
            Err(TlsError::HandshakeFailure(_))
        ));
    }

    #[test]
    fn test_renegotiation_cannot_lower_version() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut first = TestClient::with_scsv(0x0303, suite);
        run_handshake(&mut hs, &mut first);

        let mut second = renegotiating_client(&first, suite);
        second.version = 0x0302;
        assert!(matches!(
            hs.handle_record(ContentType::Handshake, &second.client_hello()),
            Err(TlsError::ProtocolVersion)
        ));
    }

    #[test]
    fn test_renegotiation_refused_when_disabled() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut config = config_with(&[suite]);
        config.allow_renegotiation = false;
        let mut hs = server(config);
        let mut first = TestClient::with_scsv(0x0303, suite);
        run_handshake(&mut hs, &mut first);

        let mut second = renegotiating_client(&first, suite);
        let outs = send(&mut hs, ContentType::Handshake, &second.client_hello());
        assert!(matches!(
            &outs[..],
            [Output::Record { content_type: ContentType::Alert, data }] if data == &vec![1, 100]
        ));
        assert!(hs.is_established());
        assert!(hs.hello_request().is_err());
    }

    // -------------------------------------------------------
    // 6. Server name indication
    // -------------------------------------------------------
    #[test]
    fn test_server_name_recorded_and_acknowledged() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut config = config_with(&[suite]);
        config.server_names = vec!["mail.example.net".into()];
        let mut hs = server(config);
        let mut client = TestClient::with_scsv(0x0303, suite);
        client.extensions.push(build_server_name("mail.example.net"));
        run_handshake(&mut hs, &mut client);
        assert_eq!(hs.server_name(), Some("mail.example.net"));
        assert!(client
            .server_hello()
            .extensions
            .contains(&Extension::new(ExtensionType::SERVER_NAME, vec![])));
    }

    #[test]
    fn test_unserved_name_not_acknowledged() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut config = config_with(&[suite]);
        config.server_names = vec!["mail.example.net".into()];
        let mut hs = server(config);
        let mut client = TestClient::with_scsv(0x0303, suite);
        client.extensions.push(build_server_name("other.example.net"));
        let outs = send(&mut hs, ContentType::Handshake, &client.client_hello());
        let sh = decode_server_hello(&handshake_messages(&outs)[0].1).unwrap();
        assert!(!sh
            .extensions
            .iter()
            .any(|e| e.extension_type == ExtensionType::SERVER_NAME));
        assert_eq!(hs.server_name(), Some("other.example.net"));
    }

    #[test]
    fn test_renegotiation_with_different_server_name() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut first = TestClient::with_scsv(0x0303, suite);
        first.extensions.push(build_server_name("a.example"));
        run_handshake(&mut hs, &mut first);

        let mut second = renegotiating_client(&first, suite);
        second.extensions.push(build_server_name("b.example"));
        assert!(matches!(
            hs.handle_record(ContentType::Handshake, &second.client_hello()),
            Err(TlsError::HandshakeFailure(_))
        ));

        // same name renegotiates fine
        let mut hs = server(config_with(&[suite]));
        let mut first = TestClient::with_scsv(0x0303, suite);
        first.extensions.push(build_server_name("a.example"));
        run_handshake(&mut hs, &mut first);
        let mut second = renegotiating_client(&first, suite);
        second.extensions.push(build_server_name("a.example"));
        run_handshake(&mut hs, &mut second);
        assert_eq!(hs.server_name(), Some("a.example"));
    }

    // -------------------------------------------------------
    // 7. Alerts
    // -------------------------------------------------------
    #[test]
    fn test_close_notify_after_handshake() {
        let suite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;
        let mut hs = server(config_with(&[suite]));
        let mut client = TestClient::with_scsv(0x0303, suite);
        run_handshake(&mut hs, &mut client);
        let outs = send(&mut hs, ContentType::Alert, &[1, 0]);
        assert!(matches!(
            &outs[..],
            [Output::Record { content_type: ContentType::Alert, data }, Output::Closed]
                if data == &vec![1, 0]
        ));
        assert!(hs.is_closed());
    }
}
