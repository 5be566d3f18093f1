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

use core::codec::{IterWithSlice, MultiPostingsIterator, SeekStatus, TermIterator, Terms};
use core::index::reader::ReaderSlice;
use core::util::{BitsRef, BitsSlice};

use error::ErrorKind::{IllegalState, UnsupportedOperation};
use error::Result;

use std::cmp::Ordering;
use std::sync::Arc;

/// Exposes flex API, merged from flex API of sub-segments.
pub struct MultiTerms<T: Terms> {
    subs: Vec<T>,
    sub_slices: Vec<ReaderSlice>,
    has_freqs: bool,
    has_offsets: bool,
    has_positions: bool,
    has_payloads: bool,
}

impl<T: Terms> MultiTerms<T> {
    /// `subs` and `sub_slices` are parallel: `sub_slices[i]` locates
    /// `subs[i]` in the global doc id space.
    pub fn new(subs: Vec<T>, sub_slices: Vec<ReaderSlice>) -> Result<MultiTerms<T>> {
        debug_assert_eq!(subs.len(), sub_slices.len());
        let mut has_freqs = true;
        let mut has_offsets = true;
        let mut has_positions = true;
        let mut has_payloads = false;

        for sub in &subs {
            has_freqs &= sub.has_freqs()?;
            has_offsets &= sub.has_offsets()?;
            has_positions &= sub.has_positions()?;
            has_payloads |= sub.has_payloads()?;
        }

        Ok(MultiTerms {
            subs,
            sub_slices,
            has_freqs,
            has_offsets,
            has_positions,
            has_payloads,
        })
    }

    pub fn subs(&self) -> &[T] {
        &self.subs
    }

    pub fn sub_slices(&self) -> &[ReaderSlice] {
        &self.sub_slices
    }
}

impl<T: Terms> Terms for MultiTerms<T> {
    type Iterator = MultiTermIterator<T::Iterator>;

    fn iterator(&self) -> Result<Self::Iterator> {
        let mut terms_iters = Vec::with_capacity(self.subs.len());
        for (i, sub) in self.subs.iter().enumerate() {
            let iterator = sub.iterator()?;
            if !iterator.is_empty() {
                terms_iters.push(TermIteratorIndex::new(iterator, i));
            }
        }

        let mut res = MultiTermIterator::new(self.sub_slices.clone());
        res.reset(terms_iters)?;
        Ok(res)
    }

    fn size(&self) -> Result<i64> {
        Ok(-1)
    }

    fn sum_total_term_freq(&self) -> Result<i64> {
        let mut sum = 0i64;
        for terms in &self.subs {
            let v = terms.sum_total_term_freq()?;
            if v == -1 {
                return Ok(-1i64);
            }
            sum += v
        }
        Ok(sum)
    }

    fn sum_doc_freq(&self) -> Result<i64> {
        let mut sum = 0i64;
        for terms in &self.subs {
            let v = terms.sum_doc_freq()?;
            if v == -1 {
                return Ok(-1i64);
            }
            sum += v
        }
        Ok(sum)
    }

    fn doc_count(&self) -> Result<i32> {
        let mut sum = 0;
        for terms in &self.subs {
            let v = terms.doc_count()?;
            if v == -1 {
                return Ok(-1);
            }
            sum += v
        }
        Ok(sum)
    }

    fn has_freqs(&self) -> Result<bool> {
        Ok(self.has_freqs)
    }

    fn has_offsets(&self) -> Result<bool> {
        Ok(self.has_offsets)
    }

    fn has_positions(&self) -> Result<bool> {
        Ok(self.has_positions)
    }

    fn has_payloads(&self) -> Result<bool> {
        Ok(self.has_payloads)
    }
}

/// A freshly obtained sub term iterator and the index of the sub it came from.
pub struct TermIteratorIndex<T: TermIterator> {
    pub sub_index: usize,
    pub terms: T,
}

impl<T: TermIterator> TermIteratorIndex<T> {
    pub fn new(terms: T, sub_index: usize) -> Self {
        TermIteratorIndex { sub_index, terms }
    }
}

/// One sub term iterator together with its slice of the global doc id space
/// and the term it is currently positioned on.
pub struct TermIteratorWithSlice<T: TermIterator> {
    pub index: usize,
    pub sub_slice: ReaderSlice,
    terms: Option<T>,
    current: Option<Vec<u8>>,
}

impl<T: TermIterator> TermIteratorWithSlice<T> {
    fn new(index: usize, sub_slice: ReaderSlice) -> Self {
        TermIteratorWithSlice {
            index,
            sub_slice,
            terms: None,
            current: None,
        }
    }

    fn reset(&mut self, terms: T, term: Vec<u8>) {
        self.terms = Some(terms);
        self.current = Some(term);
    }

    pub fn current(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|t| t.as_slice())
    }

    fn terms_mut(&mut self) -> Result<&mut T> {
        match self.terms {
            Some(ref mut t) => Ok(t),
            None => bail!(IllegalState("sub term iterator was never reset".into())),
        }
    }
}

/// Binary min-heap of sub indexes, ordered by the sub's current term and
/// then by the start of its slice.
pub struct TermMergeQueue {
    heap: Vec<usize>,
}

impl TermMergeQueue {
    pub fn new(max_size: usize) -> Self {
        TermMergeQueue {
            heap: Vec::with_capacity(max_size),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// The least sub index, without removing it.
    pub fn top(&self) -> Option<usize> {
        self.heap.first().cloned()
    }

    pub fn push<T: TermIterator>(&mut self, index: usize, subs: &[TermIteratorWithSlice<T>]) {
        self.heap.push(index);
        let mut i = self.heap.len() - 1;
        while i > 0 {
            let parent = (i - 1) >> 1;
            if Self::less_than(subs, self.heap[i], self.heap[parent]) {
                self.heap.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    pub fn pop<T: TermIterator>(&mut self, subs: &[TermIteratorWithSlice<T>]) -> Option<usize> {
        if self.heap.is_empty() {
            return None;
        }
        let result = self.heap.swap_remove(0);
        let len = self.heap.len();
        let mut i = 0;
        loop {
            let left = (i << 1) + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let smallest = if right < len && Self::less_than(subs, self.heap[right], self.heap[left])
            {
                right
            } else {
                left
            };
            if Self::less_than(subs, self.heap[smallest], self.heap[i]) {
                self.heap.swap(i, smallest);
                i = smallest;
            } else {
                break;
            }
        }
        Some(result)
    }

    fn less_than<T: TermIterator>(subs: &[TermIteratorWithSlice<T>], a: usize, b: usize) -> bool {
        match subs[a].current.cmp(&subs[b].current) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => subs[a].sub_slice.start < subs[b].sub_slice.start,
        }
    }
}

/// Exposes `TermIterator` API, merged from `TermIterator` API of sub-segments.
/// This does a merge sort, by term text, of the sub-readers.
pub struct MultiTermIterator<T: TermIterator> {
    queue: TermMergeQueue,
    subs: Vec<TermIteratorWithSlice<T>>,
    current_subs: Vec<usize>,
    top: Vec<usize>,
    last_seek: Option<Vec<u8>>,
    last_seek_exact: bool,
    current: Option<Vec<u8>>,
}

impl<T: TermIterator> MultiTermIterator<T> {
    /// Sole constructor. `slices` has one entry per sub reader.
    pub fn new(slices: Vec<ReaderSlice>) -> MultiTermIterator<T> {
        let len = slices.len();
        let subs = slices
            .into_iter()
            .enumerate()
            .map(|(i, s)| TermIteratorWithSlice::new(i, s))
            .collect();
        MultiTermIterator {
            queue: TermMergeQueue::new(len),
            subs,
            current_subs: Vec::with_capacity(len),
            top: Vec::with_capacity(len),
            last_seek: None,
            last_seek_exact: false,
            current: None,
        }
    }

    /// The terms array must be newly created `TermIterator`s, ie
    /// `TermIterator::next` has not yet been called.
    pub fn reset(&mut self, term_iter_index: Vec<TermIteratorIndex<T>>) -> Result<()> {
        debug_assert!(term_iter_index.len() <= self.subs.len());
        self.current_subs.clear();
        self.top.clear();
        self.queue.clear();
        self.current = None;
        self.last_seek = None;
        self.last_seek_exact = false;
        for term_index in term_iter_index {
            let TermIteratorIndex {
                sub_index,
                mut terms,
            } = term_index;
            if let Some(term) = terms.next()? {
                self.subs[sub_index].reset(terms, term);
                self.queue.push(sub_index, &self.subs);
                self.current_subs.push(sub_index);
            }
        }
        Ok(())
    }

    /// Number of subs that matched the current term.
    pub fn match_count(&self) -> usize {
        self.top.len()
    }

    /// The subs that matched the current term.
    pub fn match_array(&self) -> Vec<&TermIteratorWithSlice<T>> {
        self.top.iter().map(|&i| &self.subs[i]).collect()
    }

    fn pull_top(&mut self) {
        // extract all subs from the queue that have the same top term
        debug_assert!(self.top.is_empty());
        while let Some(index) = self.queue.pop(&self.subs) {
            self.top.push(index);
            match self.queue.top() {
                Some(next) if self.subs[next].current == self.subs[index].current => {}
                _ => break,
            }
        }
        self.current = self.top.first().and_then(|&i| self.subs[i].current.clone());
    }

    fn push_top(&mut self) -> Result<()> {
        // call next() on each top, and put back into queue
        let top = ::std::mem::replace(&mut self.top, Vec::with_capacity(self.subs.len()));
        for index in top {
            let next = self.subs[index].terms_mut()?.next()?;
            self.subs[index].current = next;
            if self.subs[index].current.is_some() {
                self.queue.push(index, &self.subs);
            }
        }
        Ok(())
    }

    /// Positions the live docs for `slice`: the congruent sub of a
    /// `MultiBits` when there is one, a rebased view otherwise.
    fn sub_live_docs(live_docs: &Option<BitsRef>, slice: &ReaderSlice) -> Option<BitsRef> {
        match *live_docs {
            Some(ref bits) => {
                if let Some(multi) = bits.as_multi_bits() {
                    let sub = multi.get_matching_sub(slice);
                    if sub.matches {
                        return sub.result;
                    }
                }
                Some(Arc::new(BitsSlice::new(Arc::clone(bits), slice)))
            }
            None => None,
        }
    }

    fn sort_top_by_index(&mut self) {
        let subs = &self.subs;
        self.top.sort_by_key(|&i| subs[i].index);
    }
}

impl<T: TermIterator> TermIterator for MultiTermIterator<T> {
    type Postings = MultiPostingsIterator<T::Postings>;
    type TermState = T::TermState;

    fn next(&mut self) -> Result<Option<Vec<u8>>> {
        if self.last_seek_exact {
            // Must seek_ceil at this point, so those subs that
            // didn't have the term can find the following term.
            if let Some(current) = self.current.take() {
                let status = self.seek_ceil(&current)?;
                debug_assert_eq!(status, SeekStatus::Found);
            }
            self.last_seek_exact = false;
        }
        self.last_seek = None;

        // restore queue
        self.push_top()?;

        // gather equal top fields
        if !self.queue.is_empty() {
            self.pull_top();
        } else {
            self.current = None;
        }

        Ok(self.current.clone())
    }

    fn seek_exact(&mut self, text: &[u8]) -> Result<bool> {
        self.queue.clear();
        self.top.clear();

        let seek_opt = match self.last_seek {
            Some(ref last) => last.as_slice() <= text,
            None => false,
        };
        self.last_seek = None;
        self.last_seek_exact = true;

        for i in 0..self.current_subs.len() {
            let index = self.current_subs[i];
            // if we had just seek'd already, prior to this seek, and the new
            // seek term is after the previous one, don't try to re-seek this
            // sub if its current term is already beyond this new seek term.
            let status = if seek_opt {
                let cmp = self.subs[index].current.as_ref().map(|c| text.cmp(c));
                match cmp {
                    Some(Ordering::Equal) => true,
                    Some(Ordering::Less) | None => false,
                    Some(Ordering::Greater) => self.subs[index].terms_mut()?.seek_exact(text)?,
                }
            } else {
                self.subs[index].terms_mut()?.seek_exact(text)?
            };

            if status {
                let term = self.subs[index].terms_mut()?.term()?.to_vec();
                self.subs[index].current = Some(term.clone());
                self.current = Some(term);
                self.top.push(index);
            }
        }

        // if at least one sub had exact match to the requested
        // term then we found match
        Ok(!self.top.is_empty())
    }

    fn seek_ceil(&mut self, text: &[u8]) -> Result<SeekStatus> {
        self.queue.clear();
        self.top.clear();
        self.last_seek_exact = false;

        let seek_opt = match self.last_seek {
            Some(ref last) => last.as_slice() <= text,
            None => false,
        };
        self.last_seek = Some(text.to_vec());

        for i in 0..self.current_subs.len() {
            let index = self.current_subs[i];
            let status = if seek_opt {
                let cmp = self.subs[index].current.as_ref().map(|c| text.cmp(c));
                match cmp {
                    Some(Ordering::Equal) => SeekStatus::Found,
                    Some(Ordering::Less) => SeekStatus::NotFound,
                    Some(Ordering::Greater) => self.subs[index].terms_mut()?.seek_ceil(text)?,
                    None => SeekStatus::End,
                }
            } else {
                self.subs[index].terms_mut()?.seek_ceil(text)?
            };

            match status {
                SeekStatus::Found => {
                    let term = self.subs[index].terms_mut()?.term()?.to_vec();
                    self.subs[index].current = Some(term.clone());
                    self.current = Some(term);
                    self.top.push(index);
                }
                SeekStatus::NotFound => {
                    let term = self.subs[index].terms_mut()?.term()?.to_vec();
                    self.subs[index].current = Some(term);
                    self.queue.push(index, &self.subs);
                }
                SeekStatus::End => {
                    // enum exhausted
                    self.subs[index].current = None;
                }
            }
        }

        if !self.top.is_empty() {
            // at least one sub had exact match to the requested term
            Ok(SeekStatus::Found)
        } else if !self.queue.is_empty() {
            // no sub had exact match, but at least one sub found
            // a term after the requested term -- advance to that
            // next term:
            self.pull_top();
            Ok(SeekStatus::NotFound)
        } else {
            self.current = None;
            Ok(SeekStatus::End)
        }
    }

    fn seek_exact_ord(&mut self, _ord: i64) -> Result<()> {
        bail!(UnsupportedOperation(
            "MultiTermIterator does not support ordinals".into()
        ))
    }

    fn term(&self) -> Result<&[u8]> {
        match self.current {
            Some(ref t) => Ok(t.as_slice()),
            None => Ok(&[]),
        }
    }

    fn ord(&self) -> Result<i64> {
        bail!(UnsupportedOperation(
            "MultiTermIterator does not support ordinals".into()
        ))
    }

    fn doc_freq(&mut self) -> Result<i32> {
        let mut sum = 0;
        for i in 0..self.top.len() {
            let index = self.top[i];
            sum += self.subs[index].terms_mut()?.doc_freq()?;
        }
        Ok(sum)
    }

    fn total_term_freq(&mut self) -> Result<i64> {
        let mut sum = 0;
        for i in 0..self.top.len() {
            let index = self.top[i];
            let v = self.subs[index].terms_mut()?.total_term_freq()?;
            if v == -1 {
                return Ok(v);
            }
            sum += v;
        }
        Ok(sum)
    }

    fn docs(&mut self, live_docs: Option<BitsRef>, flags: u16) -> Result<Self::Postings> {
        // postings must be concatenated in sub order
        self.sort_top_by_index();

        let mut sub_docs = Vec::with_capacity(self.top.len());
        for i in 0..self.top.len() {
            let index = self.top[i];
            let slice = self.subs[index].sub_slice;
            let bits = Self::sub_live_docs(&live_docs, &slice);
            let sub_postings = self.subs[index].terms_mut()?.docs(bits, flags)?;
            sub_docs.push(IterWithSlice::new(sub_postings, slice));
        }

        let mut docs_iter = MultiPostingsIterator::new(self.subs.len());
        docs_iter.reset(sub_docs);
        Ok(docs_iter)
    }

    fn docs_and_positions(
        &mut self,
        live_docs: Option<BitsRef>,
        flags: u16,
    ) -> Result<Option<Self::Postings>> {
        self.sort_top_by_index();

        let mut sub_docs = Vec::with_capacity(self.top.len());
        for i in 0..self.top.len() {
            let index = self.top[i];
            let slice = self.subs[index].sub_slice;
            let bits = Self::sub_live_docs(&live_docs, &slice);
            match self.subs[index]
                .terms_mut()?
                .docs_and_positions(bits, flags)?
            {
                Some(sub_postings) => sub_docs.push(IterWithSlice::new(sub_postings, slice)),
                None => {
                    // the field was indexed without positions in this sub
                    if self.top.len() > 1 {
                        warn!(
                            "sub {} of a multi term iterator has no positions, dropping positions \
                             for all {} matching subs",
                            self.subs[index].index,
                            self.top.len()
                        );
                    }
                    return Ok(None);
                }
            }
        }

        let mut docs_iter = MultiPostingsIterator::new(self.subs.len());
        docs_iter.reset(sub_docs);
        Ok(Some(docs_iter))
    }

    fn is_empty(&self) -> bool {
        self.current_subs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::codec::{get_live_docs, get_terms};
    use core::index::reader::{MemoryLeafReader, MemorySegmentBuilder, MultiReader};
    use core::index::IndexOptions;
    use core::search::tests::collect_docs;
    use core::search::{DocIterator, PostingIterator, PostingIteratorFlags, NO_MORE_DOCS};
    use core::util::DocId;

    fn animals() -> MultiReader<MemoryLeafReader> {
        let mut a = MemorySegmentBuilder::new(3);
        a.add_term("body", b"cat", 0)
            .add_term("body", b"cat", 0)
            .add_term("body", b"dog", 1);
        let mut b = MemorySegmentBuilder::new(2);
        b.add_term("body", b"cat", 0).add_term("body", b"fox", 1);
        MultiReader::new(vec![a.build().unwrap(), b.build().unwrap()]).unwrap()
    }

    #[test]
    fn merged_terms_and_postings() {
        let reader = animals();
        let terms = get_terms(&reader, "body").unwrap().unwrap();
        assert_eq!(terms.size().unwrap(), -1);
        assert_eq!(terms.sum_doc_freq().unwrap(), 4);
        assert_eq!(terms.sum_total_term_freq().unwrap(), 5);
        assert_eq!(terms.doc_count().unwrap(), 4);
        assert!(terms.has_positions().unwrap());
        assert!(!terms.has_payloads().unwrap());

        let mut iter = terms.iterator().unwrap();
        assert!(!iter.is_empty());
        let mut seen = vec![];
        while let Some(term) = iter.next().unwrap() {
            let mut docs = iter.docs(None, PostingIteratorFlags::NONE).unwrap();
            seen.push((term, collect_docs(&mut docs).unwrap()));
        }
        assert_eq!(
            seen,
            vec![
                (b"cat".to_vec(), vec![0, 3]),
                (b"dog".to_vec(), vec![1]),
                (b"fox".to_vec(), vec![4]),
            ]
        );
        assert!(iter.term().unwrap().is_empty());
    }

    #[test]
    fn seek_across_subs() {
        let reader = animals();
        let terms = get_terms(&reader, "body").unwrap().unwrap();
        let mut iter = terms.iterator().unwrap();

        assert_eq!(iter.seek_ceil(b"cow").unwrap(), SeekStatus::NotFound);
        assert_eq!(iter.term().unwrap(), b"dog");
        assert_eq!(iter.match_count(), 1);
        assert_eq!(iter.next().unwrap(), Some(b"fox".to_vec()));

        assert!(iter.seek_exact(b"cat").unwrap());
        assert_eq!(iter.match_count(), 2);
        let starts: Vec<DocId> = iter.match_array().iter().map(|s| s.sub_slice.start).collect();
        assert_eq!(starts.len(), 2);
        assert!(starts.contains(&0) && starts.contains(&3));
        assert_eq!(iter.doc_freq().unwrap(), 2);
        assert_eq!(iter.total_term_freq().unwrap(), 3);
        assert_eq!(iter.next().unwrap(), Some(b"dog".to_vec()));

        assert!(!iter.seek_exact(b"eel").unwrap());
        assert_eq!(iter.seek_ceil(b"cat").unwrap(), SeekStatus::Found);
        assert_eq!(iter.seek_ceil(b"dog").unwrap(), SeekStatus::Found);
        assert_eq!(iter.seek_ceil(b"zebra").unwrap(), SeekStatus::End);
        assert!(iter.ord().is_err());
        assert!(iter.seek_exact_ord(0).is_err());
    }

    #[test]
    fn postings_honor_multi_bits() {
        let mut a = MemorySegmentBuilder::new(3);
        a.add_term("body", b"cat", 0)
            .add_term("body", b"cat", 2)
            .delete_doc(2);
        let mut b = MemorySegmentBuilder::new(2);
        b.add_term("body", b"cat", 0)
            .add_term("body", b"cat", 1)
            .delete_doc(0);
        let reader = MultiReader::new(vec![a.build().unwrap(), b.build().unwrap()]).unwrap();
        let live_docs = get_live_docs(&reader);
        assert!(live_docs.is_some());

        let terms = get_terms(&reader, "body").unwrap().unwrap();
        let mut iter = terms.iterator().unwrap();
        assert!(iter.seek_exact(b"cat").unwrap());
        let mut docs = iter.docs(live_docs, PostingIteratorFlags::NONE).unwrap();
        assert_eq!(collect_docs(&mut docs).unwrap(), vec![0, 4]);

        let mut docs = iter.docs(None, PostingIteratorFlags::NONE).unwrap();
        assert_eq!(docs.cost(), 4);
        assert_eq!(docs.advance(1).unwrap(), 2);
        assert_eq!(docs.advance(3).unwrap(), 3);
        assert_eq!(docs.advance(4).unwrap(), 4);
        assert_eq!(docs.advance(5).unwrap(), NO_MORE_DOCS);
    }

    #[test]
    fn positions_from_every_sub() {
        let reader = animals();
        let terms = get_terms(&reader, "body").unwrap().unwrap();
        let mut iter = terms.iterator().unwrap();
        assert!(iter.seek_exact(b"cat").unwrap());
        let mut postings = iter
            .docs_and_positions(None, PostingIteratorFlags::POSITIONS)
            .unwrap()
            .unwrap();
        assert_eq!(postings.next().unwrap(), 0);
        assert_eq!(postings.freq().unwrap(), 2);
        assert_eq!(postings.next_position().unwrap(), 0);
        assert_eq!(postings.next_position().unwrap(), 1);
        assert_eq!(postings.next().unwrap(), 3);
        assert_eq!(postings.freq().unwrap(), 1);
        assert_eq!(postings.next().unwrap(), NO_MORE_DOCS);

        let mut a = MemorySegmentBuilder::new(1);
        a.add_term("body", b"cat", 0);
        let mut b = MemorySegmentBuilder::new(1);
        b.index_options("body", IndexOptions::DocsAndFreqs)
            .add_term("body", b"cat", 0);
        let reader = MultiReader::new(vec![a.build().unwrap(), b.build().unwrap()]).unwrap();
        let terms = get_terms(&reader, "body").unwrap().unwrap();
        assert!(!terms.has_positions().unwrap());
        let mut iter = terms.iterator().unwrap();
        assert!(iter.seek_exact(b"cat").unwrap());
        assert!(iter
            .docs_and_positions(None, PostingIteratorFlags::POSITIONS)
            .unwrap()
            .is_none());

        // same outcome when the sub without positions comes first
        let mut a = MemorySegmentBuilder::new(1);
        a.index_options("body", IndexOptions::DocsAndFreqs)
            .add_term("body", b"cat", 0);
        let mut b = MemorySegmentBuilder::new(1);
        b.add_term("body", b"cat", 0);
        let reader = MultiReader::new(vec![a.build().unwrap(), b.build().unwrap()]).unwrap();
        let terms = get_terms(&reader, "body").unwrap().unwrap();
        let mut iter = terms.iterator().unwrap();
        assert!(iter.seek_exact(b"cat").unwrap());
        assert_eq!(iter.doc_freq().unwrap(), 2);
        assert!(iter
            .docs_and_positions(None, PostingIteratorFlags::POSITIONS)
            .unwrap()
            .is_none());
    }

    #[test]
    fn empty_subs_are_skipped() {
        let mut a = MemorySegmentBuilder::new(2);
        a.add_term("body", b"x", 1);
        let b = MemorySegmentBuilder::new(2);
        let reader = MultiReader::new(vec![b.build().unwrap(), a.build().unwrap()]).unwrap();
        let terms = get_terms(&reader, "body").unwrap().unwrap();
        assert_eq!(terms.subs().len(), 1);
        assert_eq!(terms.sub_slices()[0].start, 2);

        let mut iter = terms.iterator().unwrap();
        assert_eq!(iter.next().unwrap(), Some(b"x".to_vec()));
        let mut docs = iter.docs(None, PostingIteratorFlags::NONE).unwrap();
        assert_eq!(collect_docs(&mut docs).unwrap(), vec![3]);
        assert_eq!(iter.next().unwrap(), None);
    }
}
