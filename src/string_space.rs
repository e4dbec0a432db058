use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};

use crate::dfa::Dfa;
use crate::helpers::ensure;
use crate::traits::MessageSpace;
use crate::Error;

/// The words of a regular language, ranked length-first and then
/// lexicographically by the automaton's alphabet order.
///
/// Construction precomputes the table `T[ℓ][s]` = number of words of length
/// exactly `ℓ` accepted starting from state `s`. Ranking sums the preceding
/// length slices and, walking the word, the branch counts of all strictly
/// smaller symbols; unranking inverts both steps greedily. Words longer
/// than the maximum word length (default 128) are outside the space.
#[derive(Clone, Debug)]
pub struct StringMessageSpace {
    dfa: Dfa,
    table: Vec<Vec<BigUint>>,
    order: BigInt,
    max_value: BigInt,
    finite: bool,
}

impl StringMessageSpace {
    /// Word-length cap used by [`StringMessageSpace::new`].
    pub const DEFAULT_MAX_WORD_LENGTH: usize = 128;

    /// Builds the message space of `dfa`'s language up to the default
    /// maximum word length.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when no word of length ≥ 1 is accepted
    /// within the cap (an empty language, or one containing only the empty
    /// word).
    pub fn new(dfa: Dfa) -> Result<Self, Error> {
        Self::with_max_word_length(dfa, Self::DEFAULT_MAX_WORD_LENGTH)
    }

    /// Builds the message space of `dfa`'s language with an explicit
    /// word-length cap.
    ///
    /// # Errors
    /// As [`StringMessageSpace::new`]; additionally when
    /// `max_word_length == 0`.
    pub fn with_max_word_length(dfa: Dfa, max_word_length: usize) -> Result<Self, Error> {
        ensure!(max_word_length >= 1, Error::InvalidArgument("maximum word length must be >= 1"));

        // T[0][s] = 1 iff s accepts; T[ℓ][s] sums T[ℓ-1] over s's successors
        let states = dfa.state_count();
        let mut table: Vec<Vec<BigUint>> = Vec::with_capacity(max_word_length + 1);
        table.push(
            (0..states)
                .map(|s| if dfa.is_accepting(s) { BigUint::one() } else { BigUint::zero() })
                .collect(),
        );
        let mut finite = false;
        for len in 1..=max_word_length {
            let row: Vec<BigUint> = (0..states)
                .map(|s| {
                    dfa.transitions_from(s).values().map(|&t| &table[len - 1][t]).sum()
                })
                .collect();
            if row.iter().all(Zero::is_zero) {
                // no word of this length exists, hence none longer either
                finite = true;
                break;
            }
            table.push(row);
        }

        let s0 = dfa.initial_state();
        let order: BigUint = (1..table.len()).map(|len| &table[len][s0]).sum();
        ensure!(
            !order.is_zero(),
            Error::InvalidArgument("automaton accepts no word within the maximum word length")
        );
        let order = BigInt::from(order);
        let max_value = &order - BigInt::one();
        Ok(StringMessageSpace { dfa, table, order, max_value, finite })
    }

    /// Whether the language is finite, i.e. the slice table ran dry before
    /// the word-length cap.
    #[must_use]
    pub fn is_finite(&self) -> bool { self.finite }
}

impl MessageSpace<String> for StringMessageSpace {
    fn order(&self) -> &BigInt { &self.order }

    fn max_value(&self) -> &BigInt { &self.max_value }

    fn rank(&self, value: &String) -> Result<BigInt, Error> {
        let chars: Vec<char> = value.chars().collect();
        let n = chars.len();
        ensure!(
            n >= 1 && n < self.table.len() && self.dfa.accepts(value),
            Error::OutsideMessageSpace("word not accepted by the automaton")
        );
        let s0 = self.dfa.initial_state();

        // all strictly shorter accepted words precede this one
        let mut rank = BigUint::zero();
        for len in 1..n {
            rank += &self.table[len][s0];
        }

        // within the slice, count the words branching off on a smaller symbol
        let mut state = s0;
        for (i, &c) in chars.iter().enumerate() {
            let remaining = n - (i + 1);
            for &t in self.dfa.transitions_from(state).range(..c).map(|(_, t)| t) {
                rank += &self.table[remaining][t];
            }
            state = self.dfa.step(state, c).expect("accepted word walks live transitions");
        }
        Ok(BigInt::from(rank))
    }

    fn unrank(&self, rank: &BigInt) -> Result<String, Error> {
        ensure!(
            !rank.is_negative() && rank < &self.order,
            Error::OutsideMessageSpace("rank not in [0, order)")
        );
        let mut remaining = rank.to_biguint().expect("rank checked non-negative");
        let s0 = self.dfa.initial_state();

        // peel preceding length slices until the rank fits
        let mut n = 1;
        while remaining >= self.table[n][s0] {
            remaining -= &self.table[n][s0];
            n += 1;
        }

        // greedy symbol selection within the length-n slice
        let mut out = String::with_capacity(n);
        let mut state = s0;
        for i in 1..=n {
            for (&c, &t) in self.dfa.transitions_from(state) {
                let branch = &self.table[n - i][t];
                if remaining >= *branch {
                    remaining -= branch;
                } else {
                    out.push(c);
                    state = t;
                    break;
                }
            }
        }
        Ok(out)
    }
}


#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use crate::dfa::Dfa;
    use crate::string_space::StringMessageSpace;
    use crate::traits::MessageSpace;
    use crate::Error;

    // the language a*[b-d]?e
    fn a_star_bcd_opt_e() -> Dfa {
        Dfa::new(
            3,
            0,
            &[2],
            &[
                (0, 'a', 0),
                (0, 'b', 1),
                (0, 'c', 1),
                (0, 'd', 1),
                (0, 'e', 2),
                (1, 'e', 2),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rank_order_of_first_words() {
        let ms = StringMessageSpace::new(a_star_bcd_opt_e()).unwrap();
        let expected = [
            "e", "ae", "be", "ce", "de", "aae", "abe", "ace", "ade", "aaae", "aabe", "aace",
            "aade",
        ];
        for (i, word) in expected.iter().enumerate() {
            let rank = BigInt::from(i);
            assert_eq!(ms.rank(&(*word).to_string()).unwrap(), rank, "rank of {word}");
            assert_eq!(ms.unrank(&rank).unwrap(), *word, "unrank of {i}");
        }
        assert!(!ms.is_finite());
    }

    #[test]
    fn test_rejects_words_outside_language() {
        let ms = StringMessageSpace::new(a_star_bcd_opt_e()).unwrap();
        for word in ["", "a", "ab", "bce", "ea"] {
            assert!(
                matches!(ms.rank(&word.to_string()), Err(Error::OutsideMessageSpace(_))),
                "{word} should be outside"
            );
        }
        assert!(matches!(ms.unrank(&BigInt::from(-1)), Err(Error::OutsideMessageSpace(_))));
        assert!(matches!(
            ms.unrank(ms.order()),
            Err(Error::OutsideMessageSpace(_))
        ));
    }

    #[test]
    fn test_word_length_cap_bounds_the_language() {
        // a*b capped at three characters: b, ab, aab
        let dfa = Dfa::new(2, 0, &[1], &[(0, 'a', 0), (0, 'b', 1)]).unwrap();
        let ms = StringMessageSpace::with_max_word_length(dfa, 3).unwrap();
        assert_eq!(ms.order(), &BigInt::from(3));
        assert_eq!(ms.unrank(&BigInt::from(2)).unwrap(), "aab");
        assert!(ms.rank(&"aaab".to_string()).is_err());
    }

    #[test]
    fn test_interval_automaton_ranking() {
        let ms = StringMessageSpace::new(Dfa::interval(20, 80, 2).unwrap()).unwrap();
        assert_eq!(ms.order(), &BigInt::from(61));
        assert_eq!(ms.rank(&"20".to_string()).unwrap(), BigInt::from(0));
        assert_eq!(ms.rank(&"80".to_string()).unwrap(), BigInt::from(60));
        assert!(matches!(
            ms.rank(&"2".to_string()),
            Err(Error::OutsideMessageSpace(_))
        ));
        assert!(ms.is_finite());
    }

    #[test]
    fn test_rank_unrank_bijection_over_finite_language() {
        let ms = StringMessageSpace::new(Dfa::interval(95, 112, 3).unwrap()).unwrap();
        assert_eq!(ms.order(), &BigInt::from(18));
        for i in 0..18 {
            let word = ms.unrank(&BigInt::from(i)).unwrap();
            assert_eq!(ms.rank(&word).unwrap(), BigInt::from(i));
        }
    }

    #[test]
    fn test_rejects_empty_and_empty_word_languages() {
        // no accepting state at all
        let empty = Dfa::new(1, 0, &[], &[(0, 'a', 0)]).unwrap();
        assert!(matches!(
            StringMessageSpace::new(empty),
            Err(Error::InvalidArgument(_))
        ));
        // only the empty word is accepted; ranking starts at length one
        let epsilon = Dfa::new(1, 0, &[0], &[]).unwrap();
        assert!(matches!(
            StringMessageSpace::new(epsilon),
            Err(Error::InvalidArgument(_))
        ));
    }
}
