#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

use core::fmt;

// Functionality map for the rank-then-encipher FPE construction
//
// Key + PBKDF2-HMAC-SHA1 sub-key derivation       --> key.rs
// Integer / range / enumeration message spaces     --> spaces.rs
// Deterministic finite automaton (table-driven)    --> dfa.rs
// Regular-language ranker (string message space)   --> string_space.rs
// Knuth-shuffle cipher (tiny spaces, < 8 bits)     --> knuth.rs
// FFX mode A2 alternating Feistel (8..=128 bits)   --> ffx.rs
// EME2 wide-block cipher (> 128 bits)              --> eme2.rs
// Rank-then-encipher composition + cipher chooser  --> rank_then_encipher.rs
// AES / CBC / PBKDF2 plumbing                      --> helpers.rs
// BigInt byte and bit conversions                  --> byte_fns.rs

mod byte_fns;
mod dfa;
mod eme2;
mod ffx;
mod helpers;
mod key;
mod knuth;
mod rank_then_encipher;
mod spaces;
mod string_space;

/// All cross-cutting functionality is covered by traits, such that consumers
/// can utilize trait objects as desired.
pub mod traits;

pub use crate::dfa::Dfa;
pub use crate::eme2::Eme2IntegerCipher;
pub use crate::ffx::FfxIntegerCipher;
pub use crate::key::Key;
pub use crate::knuth::KnuthShuffleCipher;
pub use crate::rank_then_encipher::RankThenEncipher;
pub use crate::spaces::{EnumerationMessageSpace, IntegerMessageSpace, IntegerRangeMessageSpace};
pub use crate::string_space::StringMessageSpace;

// Relevant to both PBKDF2 applications (sub-key and tweak derivation)
pub(crate) const PBKDF2_ITERATIONS: u32 = 10_000;

// Largest AES key the block-cipher provider accepts (AES-256)
pub(crate) const MAX_AES_KEY_BYTES: usize = 32;

/// The error type returned by every fallible operation in this crate.
///
/// Each variant carries a static message naming the failed check. The three
/// variants correspond to the three failure classes of the library:
/// malformed caller-supplied parameters, values outside a message space's
/// domain, and the block-cipher provider rejecting library-controlled
/// parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// A parameter is malformed: a wrong-length key where a fixed length is
    /// required, a negative cipher input, `min > max` in an integer range, an
    /// empty enumeration, an automaton with an empty language, or a cipher
    /// applied to a message space outside its supported order range.
    InvalidArgument(&'static str),
    /// The value is not a member of the message space. Rank, unrank and the
    /// integer-cipher domain checks signal this kind; it propagates through
    /// [`RankThenEncipher`] without translation.
    OutsideMessageSpace(&'static str),
    /// The underlying AES/PBKDF2 provider failed. All such parameters are
    /// library-controlled, so this indicates a configuration problem rather
    /// than a caller error.
    SecurityProvider(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::OutsideMessageSpace(msg) => write!(f, "outside message space: {msg}"),
            Error::SecurityProvider(msg) => write!(f, "security provider: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
