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

use core::index::merge::{DocMap, PayloadProcessor};
use core::index::reader::{IndexReader, LeafReader};
use core::util::{BitsRef, DocId};

use error::ErrorKind::IllegalArgument;
use error::Result;

use std::sync::Arc;

/// Holds common state used during segment merging.
pub struct MergeState {
    /// Maps document IDs from old segments to document IDs in the new segment
    pub doc_maps: Vec<Arc<dyn DocMap>>,
    /// Optional payload rewriting, per merged segment
    pub payload_processors: Vec<Option<Arc<dyn PayloadProcessor>>>,
    /// Live docs for each reader
    pub live_docs: Vec<Option<BitsRef>>,
    /// Max docs per reader
    pub max_docs: Vec<i32>,
    merged_max_doc: i32,
}

impl MergeState {
    /// Builds the state for merging every leaf of `reader`, in leaf order.
    /// Deleted documents are dropped and the survivors renumbered densely.
    pub fn new<IR: IndexReader + ?Sized>(reader: &IR) -> Result<MergeState> {
        let leaves = reader.leaves();
        let num_readers = leaves.len();
        let mut doc_maps: Vec<Arc<dyn DocMap>> = Vec::with_capacity(num_readers);
        let mut live_docs = Vec::with_capacity(num_readers);
        let mut max_docs = Vec::with_capacity(num_readers);

        let mut total_docs = 0;
        for leaf in &leaves {
            let leaf_live_docs = leaf.reader.live_docs();
            let max_doc = leaf.reader.max_doc();
            let doc_map = LiveDocsDocMap::new(leaf_live_docs.clone(), max_doc, total_docs)?;
            total_docs += max_doc - doc_map.num_deleted_docs();
            doc_maps.push(Arc::new(doc_map));
            live_docs.push(leaf_live_docs);
            max_docs.push(max_doc);
        }

        Ok(MergeState {
            doc_maps,
            payload_processors: vec![None; num_readers],
            live_docs,
            max_docs,
            merged_max_doc: total_docs,
        })
    }

    pub fn set_payload_processor(
        &mut self,
        reader_index: usize,
        processor: Arc<dyn PayloadProcessor>,
    ) -> Result<()> {
        if reader_index >= self.payload_processors.len() {
            bail!(IllegalArgument(format!(
                "reader index {} out of bounds for {} readers",
                reader_index,
                self.payload_processors.len()
            )));
        }
        self.payload_processors[reader_index] = Some(processor);
        Ok(())
    }

    /// Number of documents in the merged segment.
    pub fn merged_max_doc(&self) -> i32 {
        self.merged_max_doc
    }
}

/// Remaps doc ids around deletions: live docs are packed densely after
/// `doc_base`, deleted docs map to -1.
pub struct LiveDocsDocMap {
    mapped: Vec<DocId>,
    num_deleted_docs: i32,
}

impl LiveDocsDocMap {
    pub fn new(live_docs: Option<BitsRef>, max_doc: i32, doc_base: DocId) -> Result<Self> {
        debug_assert!(max_doc >= 0);
        let mut mapped = Vec::with_capacity(max_doc as usize);
        let mut del = 0;
        for doc in 0..max_doc {
            let live = match live_docs {
                Some(ref bits) => bits.get(doc as usize)?,
                None => true,
            };
            if live {
                mapped.push(doc_base + doc - del);
            } else {
                mapped.push(-1);
                del += 1;
            }
        }
        Ok(LiveDocsDocMap {
            mapped,
            num_deleted_docs: del,
        })
    }

    pub fn num_deleted_docs(&self) -> i32 {
        self.num_deleted_docs
    }
}

impl DocMap for LiveDocsDocMap {
    fn get(&self, doc_id: DocId) -> Result<DocId> {
        if doc_id < 0 || doc_id as usize >= self.mapped.len() {
            bail!(IllegalArgument(format!(
                "doc {} out of bounds for {} docs",
                doc_id,
                self.mapped.len()
            )));
        }
        Ok(self.mapped[doc_id as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::index::reader::{MemorySegmentBuilder, MultiReader};
    use core::util::FixedBits;

    #[test]
    fn live_docs_doc_map_skips_deletions() {
        let live: BitsRef = Arc::new(FixedBits::with_cleared(5, &[1, 3]).unwrap());
        let map = LiveDocsDocMap::new(Some(live), 5, 10).unwrap();
        assert_eq!(map.num_deleted_docs(), 2);
        let got: Vec<DocId> = (0..5).map(|d| map.get(d).unwrap()).collect();
        assert_eq!(got, vec![10, -1, 11, -1, 12]);
        assert!(map.get(5).is_err());

        let map = LiveDocsDocMap::new(None, 2, 3).unwrap();
        assert_eq!(map.get(1).unwrap(), 4);
    }

    #[test]
    fn merge_state_bases_are_cumulative() {
        let mut a = MemorySegmentBuilder::new(3);
        a.delete_doc(0);
        let b = MemorySegmentBuilder::new(2);
        let reader = MultiReader::new(vec![a.build().unwrap(), b.build().unwrap()]).unwrap();

        let mut state = MergeState::new(&reader).unwrap();
        assert_eq!(state.merged_max_doc(), 4);
        assert_eq!(state.max_docs, vec![3, 2]);
        assert_eq!(state.doc_maps[0].get(0).unwrap(), -1);
        assert_eq!(state.doc_maps[0].get(2).unwrap(), 1);
        assert_eq!(state.doc_maps[1].get(0).unwrap(), 2);

        struct Noop;
        impl PayloadProcessor for Noop {
            fn process(&self, _payload: &mut Vec<u8>) -> Result<()> {
                Ok(())
            }
        }
        assert!(state.set_payload_processor(1, Arc::new(Noop)).is_ok());
        assert!(state.set_payload_processor(2, Arc::new(Noop)).is_err());
    }
}
