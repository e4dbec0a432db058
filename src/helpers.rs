use aes::cipher::block_padding::ZeroPadding;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit};
use aes::{Aes128, Aes256};
use sha1::Sha1;

use crate::Error;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;


/// If the condition is not met, return the given error. Borrowed from the
/// `anyhow` crate.
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err);
        }
    };
}

pub(crate) use ensure; // make available throughout crate


/// Byte-wise XOR of two cipher blocks.
#[must_use]
pub(crate) fn xor_block(a: &[u8; 16], b: &[u8; 16]) -> [u8; 16] {
    core::array::from_fn(|i| a[i] ^ b[i])
}


/// AES in ECB mode over single 16-byte blocks, instantiated per call so that
/// concurrent cipher operations never share mutable state. The key length
/// selects the AES strength.
pub(crate) enum AesBlockCipher {
    Aes128(Box<Aes128>),
    Aes256(Box<Aes256>),
}

impl AesBlockCipher {
    pub(crate) fn new(key: &[u8]) -> Result<Self, Error> {
        match key.len() {
            16 => Ok(AesBlockCipher::Aes128(Box::new(
                Aes128::new_from_slice(key)
                    .map_err(|_| Error::SecurityProvider("AES-128 rejected its key"))?,
            ))),
            32 => Ok(AesBlockCipher::Aes256(Box::new(
                Aes256::new_from_slice(key)
                    .map_err(|_| Error::SecurityProvider("AES-256 rejected its key"))?,
            ))),
            _ => Err(Error::SecurityProvider("AES key must be 16 or 32 bytes")),
        }
    }

    #[must_use]
    pub(crate) fn encrypt(&self, block: &[u8; 16]) -> [u8; 16] {
        let mut b = GenericArray::from(*block);
        match self {
            AesBlockCipher::Aes128(c) => c.encrypt_block(&mut b),
            AesBlockCipher::Aes256(c) => c.encrypt_block(&mut b),
        }
        b.into()
    }

    #[must_use]
    pub(crate) fn decrypt(&self, block: &[u8; 16]) -> [u8; 16] {
        let mut b = GenericArray::from(*block);
        match self {
            AesBlockCipher::Aes128(c) => c.decrypt_block(&mut b),
            AesBlockCipher::Aes256(c) => c.decrypt_block(&mut b),
        }
        b.into()
    }
}


/// AES-128-CBC encryption without padding expansion; `data` must be a whole
/// number of 16-byte blocks.
pub(crate) fn aes128_cbc_encrypt(
    key: &[u8], iv: &[u8; 16], data: &[u8],
) -> Result<Vec<u8>, Error> {
    debug_assert_eq!(data.len() % 16, 0, "CBC input not block aligned");
    let enc = Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|_| Error::SecurityProvider("AES-128-CBC rejected its key or IV"))?;
    Ok(enc.encrypt_padded_vec_mut::<ZeroPadding>(data))
}


/// CBC-MAC: the final block of an AES-128-CBC encryption of `data` chained
/// from `iv`.
pub(crate) fn aes128_cbc_mac(key: &[u8], iv: &[u8; 16], data: &[u8]) -> Result<[u8; 16], Error> {
    let buf = aes128_cbc_encrypt(key, iv, data)?;
    let mut mac = [0u8; 16];
    mac.copy_from_slice(&buf[buf.len() - 16..]);
    Ok(mac)
}


/// PBKDF2-HMAC-SHA1 with the crate-wide iteration count.
#[must_use]
pub(crate) fn pbkdf2_sha1(password: &[u8], salt: &[u8], length: usize) -> Vec<u8> {
    let mut out = vec![0u8; length];
    pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, crate::PBKDF2_ITERATIONS, &mut out);
    out
}
