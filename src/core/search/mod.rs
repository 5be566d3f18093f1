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

mod posting_iterator;

pub use self::posting_iterator::*;

use std::i32;

use core::util::DocId;

use error::Result;

pub type Payload = Vec<u8>;

/// When returned by `next()`, `advance(DocId)` and
/// `doc_id()` it means there are no more docs in the iterator.
pub const NO_MORE_DOCS: DocId = i32::MAX;

/// This trait defines methods to iterate over a set of non-decreasing
/// doc ids. Note that this class assumes it iterates on doc Ids, and therefore
/// `NO_MORE_DOCS` is set to `NO_MORE_DOCS` in order to be used as
/// a sentinel object. Implementations of this class are expected to consider
/// `std::i32::MAX` as an invalid value.
pub trait DocIterator: Send {
    /// Returns the following:
    ///
    /// * `-1` if `next()` or `advance(DocId)` were not called yet.
    /// * `NO_MORE_DOCS` if the iterator has exhausted.
    /// * Otherwise it should return the doc ID it is currently on.
    fn doc_id(&self) -> DocId;

    /// Advances to the next document in the set and returns the doc it is
    /// currently on, or `NO_MORE_DOCS` if there are no more docs in the
    /// set.
    ///
    /// *NOTE:* after the iterator has exhausted you should not call this
    /// method, as it may result in unpredicted behavior.
    fn next(&mut self) -> Result<DocId>;

    /// Advances to the first beyond the current whose document number is greater
    /// than or equal to _target_, and returns the document number itself.
    /// Exhausts the iterator and returns `NO_MORE_DOCS` if _target_
    /// is greater than the highest document number in the set.
    ///
    /// The behavior of this method is *undefined* when called with
    /// `target <= current`, or after the iterator has exhausted.
    fn advance(&mut self, target: DocId) -> Result<DocId>;

    /// Slow (linear) implementation of `advance` relying on
    /// `next()` to advance beyond the target position.
    fn slow_advance(&mut self, target: DocId) -> Result<DocId> {
        debug_assert!(self.doc_id() < target);
        let mut doc = self.doc_id();
        while doc < target {
            doc = self.next()?;
        }
        Ok(doc)
    }

    /// Returns the estimated cost of this `DocIterator`.
    ///
    /// This is generally an upper bound of the number of documents this iterator
    /// might match, but may be a rough heuristic, hardcoded value, or otherwise
    /// completely inaccurate.
    fn cost(&self) -> usize;
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub struct MockDocIterator {
        doc_ids: Vec<DocId>,
        current_doc_id: DocId,
        offset: i32,
    }

    impl MockDocIterator {
        pub fn new(ids: Vec<DocId>) -> MockDocIterator {
            MockDocIterator {
                doc_ids: ids,
                current_doc_id: -1,
                offset: -1,
            }
        }
    }

    impl DocIterator for MockDocIterator {
        fn doc_id(&self) -> DocId {
            self.current_doc_id
        }

        fn next(&mut self) -> Result<DocId> {
            self.offset += 1;

            if (self.offset as usize) >= self.doc_ids.len() {
                self.current_doc_id = NO_MORE_DOCS;
            } else {
                self.current_doc_id = self.doc_ids[self.offset as usize];
            }

            Ok(self.doc_id())
        }

        fn advance(&mut self, target: DocId) -> Result<DocId> {
            self.slow_advance(target)
        }

        fn cost(&self) -> usize {
            self.doc_ids.len()
        }
    }

    impl PostingIterator for MockDocIterator {
        fn freq(&self) -> Result<i32> {
            Ok(1)
        }

        fn next_position(&mut self) -> Result<i32> {
            Ok(-1)
        }

        fn start_offset(&self) -> Result<i32> {
            Ok(-1)
        }

        fn end_offset(&self) -> Result<i32> {
            Ok(-1)
        }

        fn payload(&self) -> Result<Payload> {
            Ok(Payload::new())
        }
    }

    /// Drains `iter`, collecting every doc id it produces.
    pub fn collect_docs<T: DocIterator + ?Sized>(iter: &mut T) -> Result<Vec<DocId>> {
        let mut docs = vec![];
        loop {
            let doc = iter.next()?;
            if doc == NO_MORE_DOCS {
                return Ok(docs);
            }
            docs.push(doc);
        }
    }

    #[test]
    fn test_mock_doc_iterator() {
        let mut it = MockDocIterator::new(vec![1, 2, 3, 4, 5]);

        assert_eq!(it.doc_id(), -1);
        assert_eq!(it.next().unwrap(), 1);
        assert_eq!(it.doc_id(), 1);
        assert_eq!(it.advance(4).unwrap(), 4);
        assert_eq!(it.next().unwrap(), 5);
        assert_eq!(it.next().unwrap(), NO_MORE_DOCS);
        assert_eq!(it.doc_id(), NO_MORE_DOCS);
        assert_eq!(it.cost(), 5);
    }
}
