// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

use core::index::reader::ReaderSlice;
use core::index::MultiBits;
use core::util::DocId;

use error::ErrorKind::IllegalArgument;
use error::Result;

use std::sync::Arc;

/// Interface for Bitset-like structures.
pub trait Bits: Send + Sync {
    fn get(&self, index: usize) -> Result<bool>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Downcast hook: only `MultiBits` answers `Some`, which lets postings
    /// code pick the congruent per-segment bits instead of slicing.
    fn as_multi_bits(&self) -> Option<&MultiBits> {
        None
    }
}

pub type BitsRef = Arc<dyn Bits>;

#[derive(Clone)]
pub struct MatchNoBits {
    len: usize,
}

impl MatchNoBits {
    pub fn new(len: usize) -> Self {
        MatchNoBits { len }
    }
}

impl Bits for MatchNoBits {
    fn get(&self, _index: usize) -> Result<bool> {
        Ok(false)
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Fixed length bits backed by 64-bit words, the in-RAM form of a
/// segment's live docs.
#[derive(Clone)]
pub struct FixedBits {
    num_bits: usize,
    num_words: usize,
    bits: Arc<Vec<i64>>,
}

impl FixedBits {
    pub fn new(bits: Arc<Vec<i64>>, num_bits: usize) -> FixedBits {
        let num_words = FixedBits::bits_2_words(num_bits);
        debug_assert!(bits.len() >= num_words);
        FixedBits {
            num_bits,
            num_words,
            bits,
        }
    }

    /// All bits set except the ones listed in `cleared`.
    pub fn with_cleared(num_bits: usize, cleared: &[DocId]) -> Result<FixedBits> {
        let num_words = FixedBits::bits_2_words(num_bits);
        let mut words = vec![-1i64; num_words];
        if num_bits & 0x3f != 0 {
            // keep the ghost bits past num_bits clear so cardinality is exact
            words[num_words - 1] = ((1u64 << (num_bits & 0x3f)) - 1) as i64;
        }
        for &doc in cleared {
            if doc < 0 || doc as usize >= num_bits {
                bail!(IllegalArgument(format!(
                    "doc {} out of bounds for {} bits",
                    doc, num_bits
                )));
            }
            let i = doc as usize >> 6;
            words[i] &= !(1i64 << (doc & 0x3f));
        }
        Ok(FixedBits::new(Arc::new(words), num_bits))
    }

    pub fn bits_2_words(num_bits: usize) -> usize {
        if num_bits == 0 {
            0
        } else {
            ((num_bits - 1) >> 6) + 1
        }
    }

    pub fn cardinality(&self) -> usize {
        let mut set_bits = 0;
        for i in 0..self.num_words {
            set_bits += self.bits[i].count_ones() as usize;
        }

        set_bits
    }
}

impl Bits for FixedBits {
    fn get(&self, index: usize) -> Result<bool> {
        if index >= self.num_bits {
            bail!(IllegalArgument(format!(
                "index {} out of bounds for {} bits",
                index, self.num_bits
            )));
        }
        let i = index >> 6;
        let bit_mask = 1i64 << (index & 0x3f);
        Ok(self.bits[i] & bit_mask != 0)
    }

    fn len(&self) -> usize {
        self.num_bits
    }
}

/// Exposes a slice of an existing `Bits` as a new `Bits`, re-basing the
/// slice start to 0.
pub struct BitsSlice {
    parent: BitsRef,
    start: usize,
    length: usize,
}

impl BitsSlice {
    pub fn new(parent: BitsRef, slice: &ReaderSlice) -> BitsSlice {
        debug_assert!(slice.length >= 0);
        BitsSlice {
            parent,
            start: slice.start as usize,
            length: slice.length as usize,
        }
    }
}

impl Bits for BitsSlice {
    fn get(&self, index: usize) -> Result<bool> {
        if index >= self.length {
            bail!(IllegalArgument(format!(
                "doc {} is out of bounds for slice of length {}",
                index, self.length
            )));
        }
        self.parent.get(index + self.start)
    }

    fn len(&self) -> usize {
        self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_bits_with_cleared() {
        let bits = FixedBits::with_cleared(70, &[0, 3, 69]).unwrap();
        assert_eq!(bits.len(), 70);
        assert_eq!(bits.cardinality(), 67);
        assert!(!bits.get(0).unwrap());
        assert!(bits.get(1).unwrap());
        assert!(!bits.get(3).unwrap());
        assert!(bits.get(68).unwrap());
        assert!(!bits.get(69).unwrap());
        assert!(bits.get(70).is_err());
        assert!(FixedBits::with_cleared(10, &[10]).is_err());
    }

    #[test]
    fn bits_slice_rebases() {
        let parent: BitsRef = Arc::new(FixedBits::with_cleared(10, &[4, 6]).unwrap());
        let slice = BitsSlice::new(parent, &ReaderSlice::new(4, 3, 1));
        assert_eq!(slice.len(), 3);
        assert!(!slice.get(0).unwrap());
        assert!(slice.get(1).unwrap());
        assert!(!slice.get(2).unwrap());
        assert!(slice.get(3).is_err());
    }

    #[test]
    fn match_no_bits() {
        assert!(!MatchNoBits::new(3).get(2).unwrap());
        assert!(MatchNoBits::new(0).is_empty());
        assert!(MatchNoBits::new(1).as_multi_bits().is_none());
    }
}
