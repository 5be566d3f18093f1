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

mod leaf_reader;

pub use self::leaf_reader::*;

mod memory_reader;

pub use self::memory_reader::*;

mod multi_reader;

pub use self::multi_reader::*;

use core::util::DocId;

/// `IndexReader` providing an interface for accessing a point-in-time view of an index.
///
/// A composite reader is a list of leaves, each owning a contiguous range of
/// the global doc id space starting at its `doc_base`.
///
/// NOTE: `IndexReader` instances are read only; every method may be called
/// from any number of threads as long as the implementation is `Sync`.
pub trait IndexReader {
    type Leaf: LeafReader;
    fn leaves(&self) -> Vec<LeafReaderContext<'_, Self::Leaf>>;
    fn max_doc(&self) -> i32;
    fn num_docs(&self) -> i32;
    fn num_deleted_docs(&self) -> i32 {
        self.max_doc() - self.num_docs()
    }
    fn has_deletions(&self) -> bool {
        self.num_deleted_docs() > 0
    }
}

/// Subreader slice from a parent composite reader.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReaderSlice {
    /// Document ID this slice starts from.
    pub start: i32,
    /// Number of documents in this slice.
    pub length: i32,
    /// Sub-reader index for this slice.
    pub reader_index: usize,
}

impl ReaderSlice {
    pub fn new(start: i32, length: i32, reader_index: usize) -> ReaderSlice {
        ReaderSlice {
            start,
            length,
            reader_index,
        }
    }
}

/// Returns index of the searcher/reader for document `doc` in the array
/// `starts` used to construct the composite reader. Empty sub-readers
/// sharing a start with the owning one are skipped.
pub fn sub_index(doc: DocId, starts: &[DocId]) -> usize {
    // find searcher/reader for doc n:
    let size = starts.len() as isize;
    let mut lo = 0isize;
    let mut hi = size - 1;
    while hi >= lo {
        let mut mid = (lo + hi) >> 1;
        let mid_value = starts[mid as usize];
        if doc < mid_value {
            hi = mid - 1;
        } else if doc > mid_value {
            lo = mid + 1;
        } else {
            // found a match
            while mid + 1 < size && starts[(mid + 1) as usize] == mid_value {
                // scan to last match
                mid += 1;
            }
            return mid as usize;
        }
    }
    hi.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_index_finds_owner() {
        let starts = [0, 3, 3, 10];
        assert_eq!(sub_index(0, &starts), 0);
        assert_eq!(sub_index(2, &starts), 0);
        // the empty reader at index 1 is skipped
        assert_eq!(sub_index(3, &starts), 2);
        assert_eq!(sub_index(9, &starts), 2);
        assert_eq!(sub_index(10, &starts), 3);
    }
}
