use std::collections::HashMap;
use std::hash::Hash;

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::helpers::ensure;
use crate::traits::MessageSpace;
use crate::Error;


/// The integers `min ..= max` ranked by `rank(v) = v − min`.
///
/// Negative bounds are legal; `order = max − min + 1`.
#[derive(Clone, Debug)]
pub struct IntegerRangeMessageSpace {
    min: BigInt,
    max: BigInt,
    order: BigInt,
    max_value: BigInt,
}

impl IntegerRangeMessageSpace {
    /// Builds the range `min ..= max`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when `min > max`.
    pub fn new(min: BigInt, max: BigInt) -> Result<Self, Error> {
        ensure!(min <= max, Error::InvalidArgument("integer range requires min <= max"));
        let order = &max - &min + BigInt::one();
        let max_value = &order - BigInt::one();
        Ok(IntegerRangeMessageSpace { min, max, order, max_value })
    }

    /// Smallest element of the range.
    #[must_use]
    pub fn min(&self) -> &BigInt { &self.min }

    /// Largest element of the range.
    #[must_use]
    pub fn max(&self) -> &BigInt { &self.max }
}

impl MessageSpace<BigInt> for IntegerRangeMessageSpace {
    fn order(&self) -> &BigInt { &self.order }

    fn max_value(&self) -> &BigInt { &self.max_value }

    fn rank(&self, value: &BigInt) -> Result<BigInt, Error> {
        ensure!(
            *value >= self.min && *value <= self.max,
            Error::OutsideMessageSpace("value not in integer range")
        );
        Ok(value - &self.min)
    }

    fn unrank(&self, rank: &BigInt) -> Result<BigInt, Error> {
        ensure!(
            !rank.is_negative() && *rank < self.order,
            Error::OutsideMessageSpace("rank not in [0, order)")
        );
        Ok(&self.min + rank)
    }
}

/// The integers `0 ..= max`: an [`IntegerRangeMessageSpace`] anchored at
/// zero, the domain every [`crate::traits::IntegerCipher`] permutes.
#[derive(Clone, Debug)]
pub struct IntegerMessageSpace {
    range: IntegerRangeMessageSpace,
}

impl IntegerMessageSpace {
    /// Builds the space `0 ..= max`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when `max` is negative.
    pub fn new(max: BigInt) -> Result<Self, Error> {
        ensure!(!max.is_negative(), Error::InvalidArgument("integer space requires max >= 0"));
        Ok(IntegerMessageSpace { range: IntegerRangeMessageSpace::new(BigInt::zero(), max)? })
    }

    /// Bit length of the order, the size class the cipher chooser keys on.
    pub(crate) fn bit_length(&self) -> u64 { self.range.order.bits() }
}

impl MessageSpace<BigInt> for IntegerMessageSpace {
    fn order(&self) -> &BigInt { self.range.order() }

    fn max_value(&self) -> &BigInt { self.range.max_value() }

    fn rank(&self, value: &BigInt) -> Result<BigInt, Error> { self.range.rank(value) }

    fn unrank(&self, rank: &BigInt) -> Result<BigInt, Error> { self.range.unrank(rank) }
}


/// A finite set of caller-supplied values ranked by insertion order.
///
/// Duplicates in the constructor input are silently dropped, keeping the
/// first occurrence. Rank lookup is amortized O(1) through a value-to-index
/// map built at construction.
#[derive(Clone, Debug)]
pub struct EnumerationMessageSpace<M> {
    values: Vec<M>,
    index: HashMap<M, usize>,
    order: BigInt,
    max_value: BigInt,
}

impl<M: Clone + Eq + Hash> EnumerationMessageSpace<M> {
    /// Builds the enumeration from `values`, de-duplicating on first
    /// occurrence.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when no values remain.
    pub fn new(values: impl IntoIterator<Item = M>) -> Result<Self, Error> {
        let mut unique = Vec::new();
        let mut index = HashMap::new();
        for value in values {
            if !index.contains_key(&value) {
                index.insert(value.clone(), unique.len());
                unique.push(value);
            }
        }
        ensure!(!unique.is_empty(), Error::InvalidArgument("enumeration must not be empty"));
        let order = BigInt::from(unique.len());
        let max_value = &order - BigInt::one();
        Ok(EnumerationMessageSpace { values: unique, index, order, max_value })
    }
}

impl<M: Clone + Eq + Hash> MessageSpace<M> for EnumerationMessageSpace<M> {
    fn order(&self) -> &BigInt { &self.order }

    fn max_value(&self) -> &BigInt { &self.max_value }

    fn rank(&self, value: &M) -> Result<BigInt, Error> {
        self.index
            .get(value)
            .map(|i| BigInt::from(*i))
            .ok_or(Error::OutsideMessageSpace("value not in enumeration"))
    }

    fn unrank(&self, rank: &BigInt) -> Result<M, Error> {
        let i = rank
            .to_usize()
            .filter(|i| *i < self.values.len())
            .ok_or(Error::OutsideMessageSpace("rank not in [0, order)"))?;
        Ok(self.values[i].clone())
    }
}
