use std::collections::HashMap;
use std::sync::Mutex;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::helpers::pbkdf2_sha1;
use crate::MAX_AES_KEY_BYTES;

// Fixed salt for sub-key derivation; interoperability requires these exact
// sixteen bytes.
const KEY_DERIVATION_SALT: [u8; 16] = [
    0x27, 0x03, 0xA2, 0x80, 0x00, 0x7F, 0x0D, 0x2B, 0xED, 0x78, 0x14, 0x5E, 0xC2, 0x65, 0x0E, 0x5B,
];


/// A symmetric key of arbitrary length with memoized sub-key derivation.
///
/// The original bytes are held as provided (an empty key is permitted).
/// [`Key::derive`] produces sub-keys of any requested length via
/// PBKDF2-HMAC-SHA1 with a fixed salt and iteration count; derivations are
/// deterministic, so the same original key yields the same sub-keys across
/// calls and processes. Key material is zeroized on drop.
pub struct Key {
    original: Zeroizing<Vec<u8>>,
    derived: Mutex<HashMap<usize, Zeroizing<Vec<u8>>>>,
}

impl Key {
    /// Wraps the provided key bytes. Any length is accepted, including zero.
    #[must_use]
    pub fn new(bytes: &[u8]) -> Self {
        Key {
            original: Zeroizing::new(bytes.to_vec()),
            derived: Mutex::new(HashMap::new()),
        }
    }

    /// Derives a sub-key of exactly `length` bytes.
    ///
    /// When `length` equals the original key length the original bytes are
    /// returned unchanged. Otherwise the sub-key is PBKDF2-HMAC-SHA1 over
    /// the original key bytes with the fixed derivation salt and 10 000
    /// iterations. The original bytes enter PBKDF2 one-to-one as the raw
    /// password octets (the byte-transparent ISO-8859-1 convention);
    /// derivations are memoized per requested length.
    #[must_use]
    pub fn derive(&self, length: usize) -> Vec<u8> {
        if length == self.original.len() {
            return self.original.to_vec();
        }
        let mut memo = self.derived.lock().expect("key derivation memo poisoned");
        memo.entry(length)
            .or_insert_with(|| {
                Zeroizing::new(pbkdf2_sha1(&self.original, &KEY_DERIVATION_SALT, length))
            })
            .to_vec()
    }

    /// Whether the underlying AES provider permits keys of `length` bytes.
    #[must_use]
    pub fn is_key_length_allowed(length: usize) -> bool { length <= MAX_AES_KEY_BYTES }

    /// Length of the original key in bytes.
    #[must_use]
    pub fn len(&self) -> usize { self.original.len() }

    /// Whether the original key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.original.is_empty() }
}

// Conservative (constant-time) paranoia...
impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.original.as_slice().ct_eq(other.original.as_slice()).into()
    }
}

impl Eq for Key {}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key").field("original", &"<redacted>").finish()
    }
}
