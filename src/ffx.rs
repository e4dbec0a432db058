use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

use crate::byte_fns::{left_aligned_bytes, mask_u64};
use crate::helpers::{aes128_cbc_encrypt, aes128_cbc_mac, ensure};
use crate::spaces::IntegerMessageSpace;
use crate::traits::{IntegerCipher, MessageSpace};
use crate::{Error, Key};

// Header constants of the FFX-A2 parameterization: version 1, method 2
// (alternating Feistel), addition operator 0 (characterwise XOR), radix 2.
const VERSION: u8 = 1;
const METHOD: u8 = 2;
const ADDITION: u8 = 0;
const RADIX: u8 = 2;

const MAX_TWEAK_BYTES: usize = 8;

// The Feistel domain [0, 2^n) is less than twice the order, so each walk
// step lands in range with probability above one half; the cap only guards
// against an implementation defect.
const CYCLE_WALK_LIMIT: usize = 10_000;


/// FFX mode A2: a radix-2 alternating Feistel cipher for message spaces of
/// up to 128 bits.
///
/// The input is split into a high half `A` of `n − split` bits and a low
/// half `B` of `split = ⌈n/2⌉` bits (the low half is the larger when `n` is
/// odd). Each round CBC-MACs the tweak, round index and `B` under the key,
/// chained from the encrypted header block, XORs the low `|A|` bits of the
/// MAC into `A`, and swaps the halves. Results outside the message space
/// cycle-walk back through the cipher.
///
/// The key must be exactly 16 bytes and the tweak at most 8; a tweak of
/// exactly 8 bytes switches the round input `Q` from 16 to 32 bytes, which
/// is a required quirk of this parameterization.
pub struct FfxIntegerCipher {
    message_space: IntegerMessageSpace,
    bits: usize,
    split: usize,
    rounds: u8,
}

impl FfxIntegerCipher {
    /// Builds the cipher over `message_space`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the order is wider than 128 bits.
    pub fn new(message_space: IntegerMessageSpace) -> Result<Self, Error> {
        let bits = message_space.bit_length() as usize;
        ensure!(bits <= 128, Error::InvalidArgument("message space wider than 128 bits"));
        Ok(FfxIntegerCipher {
            message_space,
            bits,
            split: (bits + 1) / 2,
            rounds: round_count(bits),
        })
    }

    fn apply(&self, value: &BigInt, key: &Key, tweak: &[u8], decrypt: bool) -> Result<BigInt, Error> {
        ensure!(!value.is_negative(), Error::InvalidArgument("input must be non-negative"));
        ensure!(
            value <= self.message_space.max_value(),
            Error::OutsideMessageSpace("input exceeds message space maximum")
        );
        ensure!(key.len() == 16, Error::InvalidArgument("FFX requires a 16-byte key"));
        ensure!(
            tweak.len() <= MAX_TWEAK_BYTES,
            Error::InvalidArgument("FFX tweak must be at most 8 bytes")
        );
        let aes_key = key.derive(16);

        // header block P, encrypted once per call into the MAC chain IV
        let mut p = [0u8; 16];
        p[1] = VERSION;
        p[2] = METHOD;
        p[3] = ADDITION;
        p[4] = RADIX;
        p[5] = self.bits as u8;
        p[6] = self.split as u8;
        p[7] = self.rounds;
        p[15] = tweak.len() as u8;
        let p_tilde: [u8; 16] = aes128_cbc_encrypt(&aes_key, &[0u8; 16], &p)?
            .try_into()
            .expect("header encrypts to a single block");

        let max = self
            .message_space
            .max_value()
            .to_u128()
            .expect("128-bit order bound keeps the maximum in u128");
        let mut x = value.to_u128().expect("validated against the maximum");
        for _ in 0..CYCLE_WALK_LIMIT {
            x = self.permute(x, &aes_key, &p_tilde, tweak, decrypt)?;
            if x <= max {
                return Ok(BigInt::from(x));
            }
        }
        Err(Error::SecurityProvider("cycle walk failed to terminate"))
    }

    /// One full pass of the Feistel network over the superset `[0, 2^n)`.
    fn permute(
        &self, value: u128, aes_key: &[u8], p_tilde: &[u8; 16], tweak: &[u8], decrypt: bool,
    ) -> Result<u128, Error> {
        let split = self.split;
        let mut a = (value >> split) as u64;
        let mut b = (value & ((1u128 << split) - 1)) as u64;
        let mut a_len = self.bits - split;
        let mut b_len = split;

        if decrypt {
            for round in (0..self.rounds).rev() {
                core::mem::swap(&mut a, &mut b);
                core::mem::swap(&mut a_len, &mut b_len);
                a ^= self.round_output(aes_key, p_tilde, tweak, round, b, b_len, a_len)?;
            }
        } else {
            for round in 0..self.rounds {
                a ^= self.round_output(aes_key, p_tilde, tweak, round, b, b_len, a_len)?;
                core::mem::swap(&mut a, &mut b);
                core::mem::swap(&mut a_len, &mut b_len);
            }
        }
        // round counts are even, so the halves are back in place
        debug_assert_eq!(a_len, self.bits - split);
        Ok((u128::from(a) << split) | u128::from(b))
    }

    /// The round function: CBC-MAC of `Q` chained from the encrypted header,
    /// truncated to the current width of `A`.
    fn round_output(
        &self, aes_key: &[u8], p_tilde: &[u8; 16], tweak: &[u8], round: u8, b: u64, b_len: usize,
        out_len: usize,
    ) -> Result<u64, Error> {
        // Q: tweak, zero padding, round index, then B left-aligned in eight
        // bytes. A full 8-byte tweak widens Q from 16 to 32 bytes.
        let mut q = Vec::with_capacity(32);
        q.extend_from_slice(tweak);
        if tweak.len() == MAX_TWEAK_BYTES {
            q.extend_from_slice(&[0u8; 15]);
        } else {
            q.resize(7, 0);
        }
        q.push(round);
        q.extend_from_slice(&left_aligned_bytes(b, b_len));

        let mac = aes128_cbc_mac(aes_key, p_tilde, &q)?;
        let low = u64::from_be_bytes(mac[8..16].try_into().expect("mac tail is eight bytes"));
        Ok(low & mask_u64(out_len))
    }
}

impl IntegerCipher for FfxIntegerCipher {
    fn message_space(&self) -> &IntegerMessageSpace { &self.message_space }

    fn encrypt(&self, plaintext: &BigInt, key: &Key, tweak: &[u8]) -> Result<BigInt, Error> {
        self.apply(plaintext, key, tweak, false)
    }

    fn decrypt(&self, ciphertext: &BigInt, key: &Key, tweak: &[u8]) -> Result<BigInt, Error> {
        self.apply(ciphertext, key, tweak, true)
    }
}

/// Round count by domain width.
fn round_count(bits: usize) -> u8 {
    match bits {
        32.. => 12,
        20.. => 18,
        14.. => 24,
        10.. => 30,
        _ => 36,
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use num_bigint::BigInt;
    use num_traits::{One, ToPrimitive};

    use crate::ffx::{round_count, FfxIntegerCipher};
    use crate::spaces::IntegerMessageSpace;
    use crate::traits::{IntegerCipher, MessageSpace};
    use crate::{Error, Key};

    fn cipher(max: BigInt) -> FfxIntegerCipher {
        FfxIntegerCipher::new(IntegerMessageSpace::new(max).unwrap()).unwrap()
    }

    fn sixteen_byte_key() -> Key {
        let bytes: Vec<u8> = (0..16).collect();
        Key::new(&bytes)
    }

    #[test]
    fn test_round_count_schedule() {
        assert_eq!(round_count(128), 12);
        assert_eq!(round_count(32), 12);
        assert_eq!(round_count(31), 18);
        assert_eq!(round_count(20), 18);
        assert_eq!(round_count(19), 24);
        assert_eq!(round_count(14), 24);
        assert_eq!(round_count(13), 30);
        assert_eq!(round_count(10), 30);
        assert_eq!(round_count(9), 36);
        assert_eq!(round_count(1), 36);
    }

    #[test]
    fn test_round_trip_mid_size_space() {
        let ffx = cipher(BigInt::from(120_000));
        let key = sixteen_byte_key();
        let tweak = [0u8, 1, 2, 3, 4, 5, 6];
        let pt = BigInt::from(15_320);
        let ct = ffx.encrypt(&pt, &key, &tweak).unwrap();
        assert!(ct >= BigInt::from(0) && ct <= BigInt::from(120_000));
        assert_eq!(ffx.decrypt(&ct, &key, &tweak).unwrap(), pt);
    }

    #[test]
    fn test_exhaustive_permutation_with_cycle_walking() {
        // order 1000 inside a 1024-element Feistel domain: 24 values walk
        let ffx = cipher(BigInt::from(999));
        let key = sixteen_byte_key();
        let mut seen = HashSet::new();
        for p in 0..1000u64 {
            let ct = ffx.encrypt(&BigInt::from(p), &key, b"walk").unwrap();
            let ct = ct.to_u64().unwrap();
            assert!(ct < 1000);
            assert!(seen.insert(ct), "cipher must be injective");
            assert_eq!(ffx.decrypt(&BigInt::from(ct), &key, b"walk").unwrap(), BigInt::from(p));
        }
    }

    #[test]
    fn test_trivial_two_element_space() {
        let ffx = cipher(BigInt::one());
        let key = sixteen_byte_key();
        let ct = ffx.encrypt(&BigInt::from(0), &key, b"t").unwrap();
        assert_eq!(ffx.decrypt(&ct, &key, b"t").unwrap(), BigInt::from(0));
    }

    #[test]
    fn test_full_width_domain() {
        // the widest order FFX accepts: 2^128 - 1
        let max: BigInt = (BigInt::one() << 128) - 2;
        let ffx = cipher(max.clone());
        assert_eq!(ffx.message_space().order().bits(), 128);
        let key = sixteen_byte_key();
        let pt = BigInt::one() << 100;
        let ct = ffx.encrypt(&pt, &key, b"wide").unwrap();
        assert_eq!(ffx.decrypt(&ct, &key, b"wide").unwrap(), pt);
    }

    #[test]
    fn test_eight_byte_tweak_widens_q() {
        let ffx = cipher(BigInt::from(1_000_000));
        let key = sixteen_byte_key();
        let short = ffx.encrypt(&BigInt::from(123_456), &key, b"1234567").unwrap();
        let full = ffx.encrypt(&BigInt::from(123_456), &key, b"12345678").unwrap();
        assert_eq!(ffx.decrypt(&full, &key, b"12345678").unwrap(), BigInt::from(123_456));
        // the widened Q is a distinct tweak context
        assert_eq!(ffx.decrypt(&short, &key, b"1234567").unwrap(), BigInt::from(123_456));
    }

    #[test]
    fn test_rejects_wide_space_long_tweak_and_bad_key() {
        let too_wide = IntegerMessageSpace::new(BigInt::one() << 128).unwrap();
        assert!(matches!(
            FfxIntegerCipher::new(too_wide),
            Err(Error::InvalidArgument(_))
        ));

        let ffx = cipher(BigInt::from(1000));
        let key = sixteen_byte_key();
        assert!(matches!(
            ffx.encrypt(&BigInt::from(1), &key, b"123456789"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            ffx.encrypt(&BigInt::from(1), &Key::new(b"short"), b"t"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            ffx.encrypt(&BigInt::from(-3), &key, b"t"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            ffx.encrypt(&BigInt::from(1001), &key, b"t"),
            Err(Error::OutsideMessageSpace(_))
        ));
    }
}
