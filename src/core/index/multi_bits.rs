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

use core::index::reader::{sub_index, ReaderSlice};
use core::util::{Bits, BitsRef, DocId, MatchNoBits};

use error::Result;

use std::sync::Arc;

/// Concatenates multiple Bits together, on every lookup.
///
/// NOTE: This is very costly, as every lookup must do a binary search
/// to locate the right sub-reader.
pub struct MultiBits {
    subs: Vec<Option<BitsRef>>,
    // length is 1+subs.len() (the last entry has the max_doc):
    starts: Vec<DocId>,
    default_value: bool,
}

impl MultiBits {
    pub fn new(subs: Vec<Option<BitsRef>>, starts: Vec<DocId>, default_value: bool) -> MultiBits {
        debug_assert_eq!(starts.len(), 1 + subs.len());
        MultiBits {
            subs,
            starts,
            default_value,
        }
    }

    fn check_length(&self, reader: usize, doc: DocId) -> bool {
        let length = self.starts[1 + reader] - self.starts[reader];
        debug_assert!(doc - self.starts[reader] < length);
        true
    }

    /// Returns a sub-Bits matching the provided `slice`.
    ///
    /// Because `None` usually has a special meaning for `Bits` (e.g. no
    /// deleted documents), you must check `SubResult::matches` instead to
    /// ensure the sub was actually found.
    pub fn get_matching_sub(&self, slice: &ReaderSlice) -> SubResult {
        let reader = sub_index(slice.start, &self.starts);
        debug_assert!(reader < self.subs.len());
        if self.starts[reader] == slice.start
            && self.starts[1 + reader] == slice.start + slice.length
        {
            let result = match self.subs[reader] {
                Some(ref bits) => Some(Arc::clone(bits)),
                None if self.default_value => None,
                None => Some(Arc::new(MatchNoBits::new(slice.length as usize)) as BitsRef),
            };
            SubResult {
                matches: true,
                result,
            }
        } else {
            SubResult {
                matches: false,
                result: None,
            }
        }
    }

    pub fn default_value(&self) -> bool {
        self.default_value
    }
}

impl Bits for MultiBits {
    fn get(&self, index: usize) -> Result<bool> {
        let doc = index as DocId;
        let reader = sub_index(doc, &self.starts);
        debug_assert!(reader < self.subs.len());
        match self.subs[reader] {
            Some(ref bits) => {
                debug_assert!(self.check_length(reader, doc));
                bits.get((doc - self.starts[reader]) as usize)
            }
            None => Ok(self.default_value),
        }
    }

    fn len(&self) -> usize {
        self.starts[self.starts.len() - 1] as usize
    }

    fn as_multi_bits(&self) -> Option<&MultiBits> {
        Some(self)
    }
}

/// Represents a sub-Bits from `MultiBits::get_matching_sub`.
pub struct SubResult {
    pub matches: bool,
    pub result: Option<BitsRef>,
}
