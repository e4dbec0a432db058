use num_bigint::BigUint;

// Signed byte conversions (minimum-length two's-complement big-endian, with
// a leading zero byte where the top bit would flip the sign) come straight
// from num-bigint's `to_signed_bytes_be` / `from_signed_bytes_be`; only the
// unsigned fixed-width codec and the FFX bit helpers live here.


/// Big-endian encoding of a non-negative integer into exactly `length`
/// bytes, left-padded with zeros. The value must fit.
#[must_use]
pub(crate) fn to_fixed_bytes_be(value: &BigUint, length: usize) -> Vec<u8> {
    let raw = value.to_bytes_be();
    debug_assert!(raw.len() <= length, "value wider than the target encoding");
    let mut out = vec![0u8; length];
    out[length - raw.len()..].copy_from_slice(&raw);
    out
}


/// The low `bits` bits set, for `bits <= 64`.
#[must_use]
pub(crate) fn mask_u64(bits: usize) -> u64 {
    debug_assert!(bits <= 64);
    if bits == 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}


/// Packs the low `bit_len` bits of `value` MSB-first into 8 bytes,
/// zero-padded to the right.
#[must_use]
pub(crate) fn left_aligned_bytes(value: u64, bit_len: usize) -> [u8; 8] {
    debug_assert!(bit_len <= 64);
    debug_assert_eq!(value & !mask_u64(bit_len), 0, "value wider than bit_len");
    if bit_len == 0 {
        return [0u8; 8];
    }
    (value << (64 - bit_len)).to_be_bytes()
}
