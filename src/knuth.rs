use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use num_bigint::BigInt;
use num_traits::{Euclid, Signed, ToPrimitive};

use crate::helpers::{aes128_cbc_encrypt, ensure, pbkdf2_sha1};
use crate::spaces::IntegerMessageSpace;
use crate::traits::{IntegerCipher, MessageSpace};
use crate::{Error, Key};

// Fixed salt for tweak derivation; differs from the key-derivation salt in
// the first byte only.
const TWEAK_DERIVATION_SALT: [u8; 16] = [
    0x15, 0x03, 0xA2, 0x80, 0x00, 0x7F, 0x0D, 0x2B, 0xED, 0x78, 0x14, 0x5E, 0xC2, 0x65, 0x0E, 0x5B,
];

// Constant block whose AES-CBC image seeds the shuffle
const SEED_BLOCK: &[u8; 16] = b"Hello World!! :D";

type TableKey = (Vec<u8>, Vec<u8>);


/// A shuffle-table cipher for tiny message spaces.
///
/// A pseudorandom seed is drawn by AES-128-CBC-encrypting a constant block
/// under the derived key with the derived tweak as IV; a descending
/// Fisher-Yates pass reduces that one seed modulo each step count to build
/// the permutation. Reusing the single seed across all steps is required
/// for interoperability with the reference implementation, and is the reason
/// this scheme is confined to spaces below 8 bits by the cipher chooser.
///
/// Forward and inverse tables are cached per `(derived key, derived tweak)`
/// pair, compared by byte content. The tables materialize the whole
/// permutation, so construction rejects orders that do not fit in memory
/// indices.
pub struct KnuthShuffleCipher {
    message_space: IntegerMessageSpace,
    size: usize,
    encrypt_tables: Mutex<HashMap<TableKey, Arc<Vec<usize>>>>,
    decrypt_tables: Mutex<HashMap<TableKey, Arc<Vec<usize>>>>,
}

impl KnuthShuffleCipher {
    /// Builds the cipher over `message_space`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the order does not fit a `usize`.
    pub fn new(message_space: IntegerMessageSpace) -> Result<Self, Error> {
        let size = message_space
            .order()
            .to_usize()
            .ok_or(Error::InvalidArgument("order too large for a shuffle table"))?;
        Ok(KnuthShuffleCipher {
            message_space,
            size,
            encrypt_tables: Mutex::new(HashMap::new()),
            decrypt_tables: Mutex::new(HashMap::new()),
        })
    }

    /// Clears both permutation-table caches.
    pub fn drop_permutation_tables(&self) {
        self.encrypt_tables.lock().expect("table cache poisoned").clear();
        self.decrypt_tables.lock().expect("table cache poisoned").clear();
    }

    fn apply(&self, value: &BigInt, key: &Key, tweak: &[u8], decrypt: bool) -> Result<BigInt, Error> {
        ensure!(!value.is_negative(), Error::InvalidArgument("input must be non-negative"));
        ensure!(
            value <= self.message_space.max_value(),
            Error::OutsideMessageSpace("input exceeds message space maximum")
        );
        let derived_key = key.derive(16);
        let derived_tweak = if tweak.len() == 16 {
            tweak.to_vec()
        } else {
            pbkdf2_sha1(tweak, &TWEAK_DERIVATION_SALT, 16)
        };
        let table = self.permutation(&derived_key, &derived_tweak, decrypt)?;
        let index = value.to_usize().expect("input bounded by the table size");
        Ok(BigInt::from(table[index]))
    }

    fn permutation(
        &self, derived_key: &[u8], derived_tweak: &[u8], decrypt: bool,
    ) -> Result<Arc<Vec<usize>>, Error> {
        let table_key = (derived_key.to_vec(), derived_tweak.to_vec());
        {
            let cache = if decrypt { &self.decrypt_tables } else { &self.encrypt_tables };
            if let Some(table) = cache.lock().expect("table cache poisoned").get(&table_key) {
                return Ok(table.clone());
            }
        }

        // built outside the locks; racing builders produce identical tables
        let (forward, inverse) = self.build_tables(derived_key, derived_tweak)?;
        let mut enc = self.encrypt_tables.lock().expect("table cache poisoned");
        let mut dec = self.decrypt_tables.lock().expect("table cache poisoned");
        let forward =
            enc.entry(table_key.clone()).or_insert_with(|| Arc::new(forward)).clone();
        let inverse = dec.entry(table_key).or_insert_with(|| Arc::new(inverse)).clone();
        Ok(if decrypt { inverse } else { forward })
    }

    fn build_tables(
        &self, derived_key: &[u8], derived_tweak: &[u8],
    ) -> Result<(Vec<usize>, Vec<usize>), Error> {
        let iv: [u8; 16] =
            derived_tweak.try_into().expect("derived tweak is sixteen bytes");
        let seed_bytes = aes128_cbc_encrypt(derived_key, &iv, SEED_BLOCK)?;
        let seed = BigInt::from_signed_bytes_be(&seed_bytes);

        let mut forward: Vec<usize> = (0..self.size).collect();
        for i in (1..self.size).rev() {
            let j = seed
                .rem_euclid(&BigInt::from(i + 1))
                .to_usize()
                .expect("residue below the step count");
            forward.swap(i, j);
        }
        let mut inverse = vec![0usize; self.size];
        for (plain, &cipher) in forward.iter().enumerate() {
            inverse[cipher] = plain;
        }
        Ok((forward, inverse))
    }
}

impl IntegerCipher for KnuthShuffleCipher {
    fn message_space(&self) -> &IntegerMessageSpace { &self.message_space }

    fn encrypt(&self, plaintext: &BigInt, key: &Key, tweak: &[u8]) -> Result<BigInt, Error> {
        self.apply(plaintext, key, tweak, false)
    }

    fn decrypt(&self, ciphertext: &BigInt, key: &Key, tweak: &[u8]) -> Result<BigInt, Error> {
        self.apply(ciphertext, key, tweak, true)
    }
}
