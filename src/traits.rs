use num_bigint::BigInt;

use crate::spaces::IntegerMessageSpace;
use crate::{Error, Key};

/// A finite set with a canonical total ordering, giving each element an
/// integer rank in `[0, order)`.
///
/// `rank` and `unrank` are mutually inverse bijections between the message
/// space and `[0, order)`; both fail with
/// [`Error::OutsideMessageSpace`] exactly when the argument is not in the
/// respective domain. Implementations are immutable once constructed and
/// safe to share across threads.
///
/// # Examples
/// ```rust
/// use num_bigint::BigInt;
/// use format_preserving::IntegerRangeMessageSpace;
/// use format_preserving::traits::MessageSpace;
///
/// let ms = IntegerRangeMessageSpace::new(BigInt::from(-5), BigInt::from(5))?;
/// assert_eq!(ms.order(), &BigInt::from(11));
/// assert_eq!(ms.rank(&BigInt::from(-5))?, BigInt::from(0));
/// assert_eq!(ms.unrank(&BigInt::from(10))?, BigInt::from(5));
/// # Ok::<(), format_preserving::Error>(())
/// ```
pub trait MessageSpace<M> {
    /// Number of elements in the message space; always at least one.
    fn order(&self) -> &BigInt;

    /// The largest rank, `order − 1`.
    fn max_value(&self) -> &BigInt;

    /// The rank of `value` in `[0, order)`.
    ///
    /// # Errors
    /// [`Error::OutsideMessageSpace`] when `value` is not an element.
    fn rank(&self, value: &M) -> Result<BigInt, Error>;

    /// The element whose rank is `rank`.
    ///
    /// # Errors
    /// [`Error::OutsideMessageSpace`] when `rank` is negative or at least
    /// `order`.
    fn unrank(&self, rank: &BigInt) -> Result<M, Error>;
}


/// A keyed permutation of the integers `[0, order)` of an
/// [`IntegerMessageSpace`].
///
/// Implementations are deterministic in `(plaintext, key, tweak)`; the tweak
/// is public per-operation variability, analogous to an IV. Encryption and
/// decryption are mutually inverse for any fixed `(key, tweak)` pair.
///
/// # Examples
/// ```rust
/// use num_bigint::BigInt;
/// use format_preserving::{FfxIntegerCipher, IntegerMessageSpace, Key};
/// use format_preserving::traits::IntegerCipher;
///
/// let ms = IntegerMessageSpace::new(BigInt::from(120_000))?;
/// let ffx = FfxIntegerCipher::new(ms)?;
/// let key = Key::new(&[
///     0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
///     0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
/// ]);
/// let tweak = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
///
/// let ct = ffx.encrypt(&BigInt::from(15_320), &key, &tweak)?;
/// assert_eq!(ffx.decrypt(&ct, &key, &tweak)?, BigInt::from(15_320));
/// # Ok::<(), format_preserving::Error>(())
/// ```
pub trait IntegerCipher {
    /// The integer message space this cipher permutes.
    fn message_space(&self) -> &IntegerMessageSpace;

    /// Enciphers `plaintext ∈ [0, order)` to a ciphertext in the same range.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] on a negative plaintext or a malformed
    /// key/tweak; [`Error::OutsideMessageSpace`] when `plaintext` exceeds
    /// the message space maximum.
    fn encrypt(&self, plaintext: &BigInt, key: &Key, tweak: &[u8]) -> Result<BigInt, Error>;

    /// Inverts [`IntegerCipher::encrypt`] under the same `(key, tweak)`.
    ///
    /// # Errors
    /// As for [`IntegerCipher::encrypt`].
    fn decrypt(&self, ciphertext: &BigInt, key: &Key, tweak: &[u8]) -> Result<BigInt, Error>;
}
