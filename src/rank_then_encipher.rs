use std::marker::PhantomData;

use crate::eme2::Eme2IntegerCipher;
use crate::ffx::FfxIntegerCipher;
use crate::helpers::ensure;
use crate::knuth::KnuthShuffleCipher;
use crate::spaces::IntegerMessageSpace;
use crate::traits::{IntegerCipher, MessageSpace};
use crate::{Error, Key};

/// Generic format-preserving encryption: a message space composed with an
/// integer cipher of matching order.
///
/// `encrypt` ranks the plaintext into `[0, order)`, enciphers the rank, and
/// unranks the result, so ciphertexts always lie in the message space.
/// [`RankThenEncipher::new`] selects the integer cipher by order size:
/// below 8 bits the shuffle table, up to 128 bits FFX, above that EME2.
///
/// # Examples
/// ```rust
/// use format_preserving::{EnumerationMessageSpace, Key, RankThenEncipher};
///
/// let names = EnumerationMessageSpace::new(["alice", "bob", "carol"])?;
/// let fpe = RankThenEncipher::new(names)?;
/// let key = Key::new(b"an example key");
/// let ct = fpe.encrypt(&"bob", &key, b"tweak-1")?;
/// assert_eq!(fpe.decrypt(&ct, &key, b"tweak-1")?, "bob");
/// # Ok::<(), format_preserving::Error>(())
/// ```
pub struct RankThenEncipher<M, S: MessageSpace<M>> {
    message_space: S,
    integer_cipher: Box<dyn IntegerCipher + Send + Sync>,
    _element: PhantomData<fn(M) -> M>,
}

impl<M, S: MessageSpace<M>> RankThenEncipher<M, S> {
    /// Builds an FPE scheme over `message_space`, choosing the integer
    /// cipher by the bit length of the order.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the chosen cipher rejects the order
    /// (e.g. a sub-8-bit space too large to materialize a shuffle table).
    pub fn new(message_space: S) -> Result<Self, Error> {
        let inner = IntegerMessageSpace::new(message_space.max_value().clone())?;
        let bits = inner.bit_length();
        let integer_cipher: Box<dyn IntegerCipher + Send + Sync> = if bits < 8 {
            Box::new(KnuthShuffleCipher::new(inner)?)
        } else if bits <= 128 {
            Box::new(FfxIntegerCipher::new(inner)?)
        } else {
            Box::new(Eme2IntegerCipher::new(inner)?)
        };
        Ok(RankThenEncipher { message_space, integer_cipher, _element: PhantomData })
    }

    /// Builds an FPE scheme over `message_space` with an explicitly chosen
    /// integer cipher.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the cipher's order differs from the
    /// message space's.
    pub fn with_cipher(
        message_space: S, integer_cipher: Box<dyn IntegerCipher + Send + Sync>,
    ) -> Result<Self, Error> {
        ensure!(
            integer_cipher.message_space().order() == message_space.order(),
            Error::InvalidArgument("integer cipher order must equal message space order")
        );
        Ok(RankThenEncipher { message_space, integer_cipher, _element: PhantomData })
    }

    /// The outer message space.
    #[must_use]
    pub fn message_space(&self) -> &S { &self.message_space }

    /// Encrypts `plaintext` to another element of the message space.
    ///
    /// # Errors
    /// [`Error::OutsideMessageSpace`] when `plaintext` is not an element;
    /// any inner cipher failure propagates unchanged.
    pub fn encrypt(&self, plaintext: &M, key: &Key, tweak: &[u8]) -> Result<M, Error> {
        let rank = self.message_space.rank(plaintext)?;
        let enciphered = self.integer_cipher.encrypt(&rank, key, tweak)?;
        self.message_space.unrank(&enciphered)
    }

    /// Inverts [`RankThenEncipher::encrypt`] under the same `(key, tweak)`.
    ///
    /// # Errors
    /// As for [`RankThenEncipher::encrypt`].
    pub fn decrypt(&self, ciphertext: &M, key: &Key, tweak: &[u8]) -> Result<M, Error> {
        let rank = self.message_space.rank(ciphertext)?;
        let deciphered = self.integer_cipher.decrypt(&rank, key, tweak)?;
        self.message_space.unrank(&deciphered)
    }
}
