use num_bigint::{BigInt, BigUint};
use num_traits::Signed;

use crate::byte_fns::to_fixed_bytes_be;
use crate::helpers::{ensure, xor_block, AesBlockCipher};
use crate::spaces::IntegerMessageSpace;
use crate::traits::{IntegerCipher, MessageSpace};
use crate::{Error, Key};

// The mixing mask is refreshed through the block cipher every 128 blocks
// instead of being doubled again.
const REFRESH_INTERVAL: usize = 128;

const CYCLE_WALK_LIMIT: usize = 10_000;


/// EME2 (encrypt-mix-encrypt): a wide-block cipher for message spaces of at
/// least 128 bits.
///
/// The input is encoded big-endian into `L = ⌈bits(order)/8⌉` bytes and
/// processed as 16-byte blocks: a masked ECB pass, a mixing layer threading
/// a doubled GF(2¹²⁸) mask (with the tweak folded in through an α-chained
/// digest), and a second masked ECB pass. Results outside the message space
/// cycle-walk back through the cipher.
///
/// The working keys come from [`Key::derive`]: 48 bytes for AES-128 or 64
/// for AES-256, split into the plaintext mask seed `K₂`, the tweak mask
/// seed `K₃` and the AES key.
pub struct Eme2IntegerCipher {
    message_space: IntegerMessageSpace,
    byte_length: usize,
    aes_key_bytes: usize,
}

impl Eme2IntegerCipher {
    /// Builds the cipher over `message_space` with AES-128.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the order is narrower than 128 bits.
    pub fn new(message_space: IntegerMessageSpace) -> Result<Self, Error> {
        Self::with_key_length(message_space, 128)
    }

    /// Builds the cipher with an explicit AES strength of 128 or 256 bits.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when `key_length_bits` is not 128 or 256,
    /// or the order is narrower than 128 bits.
    pub fn with_key_length(
        message_space: IntegerMessageSpace, key_length_bits: usize,
    ) -> Result<Self, Error> {
        ensure!(
            key_length_bits == 128 || key_length_bits == 256,
            Error::InvalidArgument("EME2 key length must be 128 or 256 bits")
        );
        let bits = message_space.bit_length();
        ensure!(bits >= 128, Error::InvalidArgument("message space narrower than 128 bits"));
        let byte_length = usize::try_from((bits + 7) / 8)
            .map_err(|_| Error::InvalidArgument("message space too wide to encode"))?;
        Ok(Eme2IntegerCipher { message_space, byte_length, aes_key_bytes: key_length_bits / 8 })
    }

    fn apply(&self, value: &BigInt, key: &Key, tweak: &[u8], decrypt: bool) -> Result<BigInt, Error> {
        ensure!(!value.is_negative(), Error::InvalidArgument("input must be non-negative"));
        ensure!(
            value <= self.message_space.max_value(),
            Error::OutsideMessageSpace("input exceeds message space maximum")
        );

        // derived layout: K₂ || K₃ || K_AES
        let derived = key.derive(32 + self.aes_key_bytes);
        let k2: [u8; 16] = derived[0..16].try_into().expect("derived key carries K2");
        let k3: [u8; 16] = derived[16..32].try_into().expect("derived key carries K3");
        let aes = AesBlockCipher::new(&derived[32..])?;
        let t_star = tweak_digest(&aes, &k3, tweak);

        let max = self
            .message_space
            .max_value()
            .to_biguint()
            .expect("message space maximum is non-negative");
        let mut data = to_fixed_bytes_be(
            &value.to_biguint().expect("validated non-negative"),
            self.byte_length,
        );
        for _ in 0..CYCLE_WALK_LIMIT {
            data = transform(&data, &aes, &k2, &t_star, decrypt);
            let out = BigUint::from_bytes_be(&data);
            if out <= max {
                return Ok(BigInt::from(out));
            }
        }
        Err(Error::SecurityProvider("cycle walk failed to terminate"))
    }
}

impl IntegerCipher for Eme2IntegerCipher {
    fn message_space(&self) -> &IntegerMessageSpace { &self.message_space }

    fn encrypt(&self, plaintext: &BigInt, key: &Key, tweak: &[u8]) -> Result<BigInt, Error> {
        self.apply(plaintext, key, tweak, false)
    }

    fn decrypt(&self, ciphertext: &BigInt, key: &Key, tweak: &[u8]) -> Result<BigInt, Error> {
        self.apply(ciphertext, key, tweak, true)
    }
}


/// Multiplication by the primitive element α in GF(2¹²⁸) with reduction
/// polynomial x¹²⁸ + x⁷ + x² + x + 1.
///
/// Byte 0 is the low end: each byte is doubled with the carry taken from the
/// previous byte's high bit, and 0x87 is folded into byte 0 when byte 15's
/// high bit was set. This orientation is the mirror of the GCM convention
/// and must be preserved for interoperability.
fn mult_alpha(block: &[u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    let mut carry = 0u8;
    for i in 0..16 {
        out[i] = (block[i] << 1) | carry;
        carry = block[i] >> 7;
    }
    if carry == 1 {
        out[0] ^= 0x87;
    }
    out
}


/// Pads a possibly short block with the 0x80 marker followed by zeros.
fn pad_block(chunk: &[u8]) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[..chunk.len()].copy_from_slice(chunk);
    if chunk.len() < 16 {
        block[chunk.len()] = 0x80;
    }
    block
}


/// The 16-byte tweak digest `T*`. Always runs the block cipher in encrypt
/// direction, also during decryption.
fn tweak_digest(aes: &AesBlockCipher, k3: &[u8; 16], tweak: &[u8]) -> [u8; 16] {
    if tweak.is_empty() {
        return aes.encrypt(k3);
    }
    let mut mask = mult_alpha(k3);
    let mut digest = [0u8; 16];
    for chunk in tweak.chunks(16) {
        let block = pad_block(chunk);
        let e = xor_block(&aes.encrypt(&xor_block(&block, &mask)), &mask);
        digest = xor_block(&digest, &e);
        mask = mult_alpha(&mask);
    }
    digest
}


/// One encrypt-mix-encrypt pass over `data`. Decryption is the identical
/// circuit with the block cipher run in decrypt direction.
#[allow(clippy::too_many_lines)]
fn transform(
    data: &[u8], aes: &AesBlockCipher, k2: &[u8; 16], t_star: &[u8; 16], decrypt: bool,
) -> Vec<u8> {
    let op = |b: &[u8; 16]| if decrypt { aes.decrypt(b) } else { aes.encrypt(b) };
    let m = (data.len() + 15) / 16;
    let last_len = data.len() - 16 * (m - 1);
    let full_last = last_len == 16;
    let last_chunk = &data[16 * (m - 1)..];

    // first pass: masked ECB; a short final block passes through padded
    let mut mask = *k2;
    let mut pp: Vec<[u8; 16]> = Vec::with_capacity(m);
    for i in 0..m - 1 {
        let block: [u8; 16] = data[16 * i..16 * (i + 1)].try_into().expect("full block");
        pp.push(op(&xor_block(&block, &mask)));
        mask = mult_alpha(&mask);
    }
    if full_last {
        pp.push(op(&xor_block(&pad_block(last_chunk), &mask)));
    } else {
        pp.push(pad_block(last_chunk));
    }

    // mixing: fold everything into MP, derive the mask chain seed M
    let mut mp = *t_star;
    for block in &pp {
        mp = xor_block(&mp, block);
    }
    let (mm, mc) = if full_last {
        ([0u8; 16], op(&mp))
    } else {
        let mm = op(&mp);
        (mm, op(&mm))
    };
    let m1 = xor_block(&mp, &mc);
    let mut m_cur = m1;

    let mut cc: Vec<[u8; 16]> = vec![[0u8; 16]; m];
    for i in 1..m - 1 {
        if i % REFRESH_INTERVAL == 0 {
            let mp2 = xor_block(&pp[i], &m1);
            let mc2 = op(&mp2);
            m_cur = xor_block(&mp2, &mc2);
            cc[i] = xor_block(&mc2, &m1);
        } else {
            m_cur = mult_alpha(&m_cur);
            cc[i] = xor_block(&pp[i], &m_cur);
        }
    }

    // the final block: masked by MM when short, else as a middle block
    let mut short_out = [0u8; 16];
    if m >= 2 {
        let i = m - 1;
        if full_last {
            if i % REFRESH_INTERVAL == 0 {
                let mp2 = xor_block(&pp[i], &m1);
                let mc2 = op(&mp2);
                cc[i] = xor_block(&mc2, &m1);
            } else {
                cc[i] = xor_block(&pp[i], &mult_alpha(&m_cur));
            }
        } else {
            for j in 0..last_len {
                short_out[j] = last_chunk[j] ^ mm[j];
            }
            cc[i] = pad_block(&short_out[..last_len]);
        }
    }

    // the first block balances the mix so the CC blocks XOR back to MC
    let mut cc0 = xor_block(&mc, t_star);
    for block in &cc[1..] {
        cc0 = xor_block(&cc0, block);
    }
    cc[0] = cc0;

    // second pass: masked ECB again; a short final block was finished above
    let mut out = vec![0u8; data.len()];
    let mut mask = *k2;
    for i in 0..m - 1 {
        out[16 * i..16 * (i + 1)].copy_from_slice(&xor_block(&op(&cc[i]), &mask));
        mask = mult_alpha(&mask);
    }
    let i = m - 1;
    if full_last {
        out[16 * i..].copy_from_slice(&xor_block(&op(&cc[i]), &mask));
    } else {
        out[16 * i..].copy_from_slice(&short_out[..last_len]);
    }
    out
}
