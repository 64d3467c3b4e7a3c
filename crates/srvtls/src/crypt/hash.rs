//! Digest and HMAC dispatch over [`HashAlgorithm`].

use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use srvtls_types::{CryptoError, HashAlgorithm};

/// One-shot digest of `data`.
pub fn digest(alg: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    match alg {
        HashAlgorithm::Md5 => Md5::digest(data).to_vec(),
        HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
        HashAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}

macro_rules! hmac_with {
    ($hash:ty, $key:expr, $data:expr) => {{
        let mut mac =
            <Hmac<$hash> as Mac>::new_from_slice($key).map_err(|_| CryptoError::InvalidKey)?;
        mac.update($data);
        mac.finalize().into_bytes().to_vec()
    }};
}

/// HMAC of `data` under `key`.
pub fn hmac(alg: HashAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let out = match alg {
        HashAlgorithm::Md5 => hmac_with!(Md5, key, data),
        HashAlgorithm::Sha1 => hmac_with!(Sha1, key, data),
        HashAlgorithm::Sha224 => hmac_with!(Sha224, key, data),
        HashAlgorithm::Sha256 => hmac_with!(Sha256, key, data),
        HashAlgorithm::Sha384 => hmac_with!(Sha384, key, data),
        HashAlgorithm::Sha512 => hmac_with!(Sha512, key, data),
    };
    Ok(out)
}
