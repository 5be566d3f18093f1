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

use core::index::reader::{IndexReader, LeafReader, LeafReaderContext};
use core::util::DocId;

use error::ErrorKind::IllegalArgument;
use error::Result;

use std::i32;

/// A composite reader over a fixed list of leaf readers. Leaf `i` owns the
/// global doc ids `[starts[i], starts[i + 1])`.
pub struct MultiReader<R: LeafReader> {
    subs: Vec<R>,
    starts: Vec<DocId>,
    max_doc: i32,
    num_docs: i32,
}

impl<R: LeafReader> MultiReader<R> {
    pub fn new(subs: Vec<R>) -> Result<MultiReader<R>> {
        let mut starts = Vec::with_capacity(subs.len() + 1);
        let mut max_doc = 0i64;
        let mut num_docs = 0i64;
        for sub in &subs {
            starts.push(max_doc as DocId);
            max_doc += i64::from(sub.max_doc());
            num_docs += i64::from(sub.num_docs());
            if max_doc > i64::from(i32::MAX) {
                bail!(IllegalArgument(format!(
                    "Too many documents: a composite reader cannot exceed {} but readers have \
                     total max_doc={}",
                    i32::MAX,
                    max_doc
                )));
            }
        }
        starts.push(max_doc as DocId);

        Ok(MultiReader {
            subs,
            starts,
            max_doc: max_doc as i32,
            num_docs: num_docs as i32,
        })
    }

    pub fn subs(&self) -> &[R] {
        &self.subs
    }

    /// Doc bases of the subs followed by `max_doc`.
    pub fn starts(&self) -> &[DocId] {
        &self.starts
    }
}

impl<R: LeafReader> IndexReader for MultiReader<R> {
    type Leaf = R;

    fn leaves(&self) -> Vec<LeafReaderContext<'_, R>> {
        self.subs
            .iter()
            .enumerate()
            .map(|(i, r)| LeafReaderContext::new(r, i, self.starts[i]))
            .collect()
    }

    fn max_doc(&self) -> i32 {
        self.max_doc
    }

    fn num_docs(&self) -> i32 {
        self.num_docs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::index::reader::{sub_index, MemorySegmentBuilder};

    #[test]
    fn multi_reader_doc_bases() {
        let a = MemorySegmentBuilder::new(3).build().unwrap();
        let b = MemorySegmentBuilder::new(0).build().unwrap();
        let mut c = MemorySegmentBuilder::new(2);
        c.delete_doc(1);
        let c = c.build().unwrap();

        let reader = MultiReader::new(vec![a, b, c]).unwrap();
        assert_eq!(reader.starts(), &[0, 3, 3, 5]);
        assert_eq!(IndexReader::max_doc(&reader), 5);
        assert_eq!(IndexReader::num_docs(&reader), 4);
        assert!(reader.has_deletions());

        let leaves = reader.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[2].doc_base(), 3);
        assert_eq!(leaves[2].ord, 2);
        assert_eq!(sub_index(4, reader.starts()), 2);
        assert_eq!(sub_index(1, reader.starts()), 0);
    }

    #[test]
    fn multi_reader_rejects_too_many_docs() {
        let a = MemorySegmentBuilder::new(i32::MAX).build().unwrap();
        let b = MemorySegmentBuilder::new(1).build().unwrap();
        assert!(MultiReader::new(vec![a, b]).is_err());
    }
}
