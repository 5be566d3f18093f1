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

use core::codec::{Fields, MultiTermIterator, MultiTerms, SeekStatus, TermIterator, Terms};
use core::index::merge::{DocMap, MergeState, PayloadProcessor};
use core::index::reader::{
    IndexReader, LeafPostings, LeafReader, LeafTerms, ReaderSlice,
};
use core::index::{MultiBits, INDEX_MAX_POSITION};
use core::search::{DocIterator, Payload, PostingIterator, NO_MORE_DOCS};
use core::util::{BitsRef, DocId};

use error::ErrorKind::{CorruptIndex, IllegalArgument, IllegalState, UnsupportedOperation};
use error::Result;

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

/// Exposes flex API, merged from flex API of sub-segments.
///
/// NOTE: the per-field `MultiTerms` are cached, so this is not thread safe;
/// create one per thread.
pub struct MultiFields<F: Fields> {
    subs: Vec<F>,
    sub_slices: Vec<ReaderSlice>,
    terms: RefCell<HashMap<String, Arc<MultiTerms<F::Terms>>>>,
}

impl<F: Fields> MultiFields<F> {
    pub fn new(subs: Vec<F>, sub_slices: Vec<ReaderSlice>) -> MultiFields<F> {
        debug_assert_eq!(subs.len(), sub_slices.len());
        MultiFields {
            subs,
            sub_slices,
            terms: RefCell::new(HashMap::new()),
        }
    }
}

impl<F: Fields> Fields for MultiFields<F> {
    type Terms = Arc<MultiTerms<F::Terms>>;

    fn fields(&self) -> Vec<String> {
        let mut res = vec![];
        for sub in &self.subs {
            res.extend(sub.fields());
        }
        res.sort();
        res.dedup();
        res
    }

    fn terms(&self, field: &str) -> Result<Option<Self::Terms>> {
        if let Some(res) = self.terms.borrow().get(field) {
            return Ok(Some(Arc::clone(res)));
        }

        // gather all sub-readers that share this field
        let mut subs2 = Vec::new();
        let mut slices2 = Vec::new();
        for (sub, slice) in self.subs.iter().zip(self.sub_slices.iter()) {
            if let Some(terms) = sub.terms(field)? {
                subs2.push(terms);
                slices2.push(*slice);
            }
        }

        if subs2.is_empty() {
            // no sub has this field
            return Ok(None);
        }

        let terms = Arc::new(MultiTerms::new(subs2, slices2)?);
        self.terms
            .borrow_mut()
            .insert(field.to_string(), Arc::clone(&terms));
        Ok(Some(terms))
    }

    fn size(&self) -> i32 {
        -1
    }
}

/// Returns a single `Fields` instance for this reader, merging fields/terms/docs/positions
/// on the fly.
///
/// NOTE: this is a slow way to access postings. It's better to get the
/// sub-readers and iterate through them yourself.
pub fn get_fields<IR: IndexReader + ?Sized>(
    reader: &IR,
) -> Result<MultiFields<<IR::Leaf as LeafReader>::Fields>> {
    let leaves = reader.leaves();
    let mut fields = Vec::with_capacity(leaves.len());
    let mut slices = Vec::with_capacity(leaves.len());
    for leaf in &leaves {
        fields.push(leaf.reader.fields()?);
        slices.push(ReaderSlice::new(
            leaf.doc_base,
            leaf.reader.max_doc(),
            fields.len() - 1,
        ));
    }
    Ok(MultiFields::new(fields, slices))
}

/// This method may return `None` if the field does not exist.
pub fn get_terms<IR: IndexReader + ?Sized>(
    reader: &IR,
    field: &str,
) -> Result<Option<Arc<MultiTerms<LeafTerms<IR::Leaf>>>>> {
    get_fields(reader)?.terms(field)
}

/// Returns a single `Bits` instance for this reader, merging live docs on
/// the fly. Returns `None` if the reader has no deletions.
pub fn get_live_docs<IR: IndexReader + ?Sized>(reader: &IR) -> Option<BitsRef> {
    if !reader.has_deletions() {
        return None;
    }
    let leaves = reader.leaves();
    if leaves.len() == 1 {
        return leaves[0].reader.live_docs();
    }
    let mut live_docs = Vec::with_capacity(leaves.len());
    let mut starts = Vec::with_capacity(leaves.len() + 1);
    for leaf in &leaves {
        live_docs.push(leaf.reader.live_docs());
        starts.push(leaf.doc_base);
    }
    starts.push(reader.max_doc());
    Some(Arc::new(MultiBits::new(live_docs, starts, true)))
}

/// Returns the postings for the specified term, or `None` if the field or
/// term does not exist.
pub fn get_term_docs<IR: IndexReader + ?Sized>(
    reader: &IR,
    live_docs: Option<BitsRef>,
    field: &str,
    term: &[u8],
    flags: u16,
) -> Result<Option<MultiPostingsIterator<LeafPostings<IR::Leaf>>>> {
    if let Some(terms) = get_terms(reader, field)? {
        let mut iter = terms.iterator()?;
        if iter.seek_exact(term)? {
            return Ok(Some(iter.docs(live_docs, flags)?));
        }
    }
    Ok(None)
}

/// A sub postings iterator and the slice of the global doc id space it maps into.
pub struct IterWithSlice<T: PostingIterator> {
    pub postings_iter: T,
    pub slice: ReaderSlice,
}

impl<T: PostingIterator> IterWithSlice<T> {
    pub fn new(postings_iter: T, slice: ReaderSlice) -> Self {
        IterWithSlice {
            postings_iter,
            slice,
        }
    }
}

/// Exposes `PostingIterator`, merged from `PostingIterator` API of sub-segments.
///
/// Sub iterators are consumed in order; each doc id is rebased by the start
/// of its sub's slice.
pub struct MultiPostingsIterator<T: PostingIterator> {
    subs: Vec<IterWithSlice<T>>,
    upto: usize,
    current: Option<usize>,
    current_base: DocId,
    doc: DocId,
}

impl<T: PostingIterator> MultiPostingsIterator<T> {
    pub fn new(sub_reader_count: usize) -> Self {
        MultiPostingsIterator {
            subs: Vec::with_capacity(sub_reader_count),
            upto: 0,
            current: None,
            current_base: 0,
            doc: -1,
        }
    }

    pub fn reset(&mut self, subs: Vec<IterWithSlice<T>>) {
        self.subs = subs;
        self.upto = 0;
        self.current = None;
        self.current_base = 0;
        self.doc = -1;
    }

    pub fn num_subs(&self) -> usize {
        self.subs.len()
    }

    pub fn subs(&self) -> &[IterWithSlice<T>] {
        &self.subs
    }

    /// Hands the sub iterators over, leaving this iterator exhausted.
    pub fn take_subs(&mut self) -> Vec<IterWithSlice<T>> {
        self.upto = 0;
        self.current = None;
        self.doc = NO_MORE_DOCS;
        mem::replace(&mut self.subs, Vec::with_capacity(0))
    }

    fn current_sub(&self) -> Result<&T> {
        match self.current {
            Some(i) => Ok(&self.subs[i].postings_iter),
            None => bail!(IllegalState("postings iterator is unpositioned".into())),
        }
    }

    fn open_next_sub(&mut self) -> bool {
        if self.upto == self.subs.len() {
            return false;
        }
        self.current = Some(self.upto);
        self.current_base = self.subs[self.upto].slice.start;
        self.upto += 1;
        true
    }
}

impl<T: PostingIterator> PostingIterator for MultiPostingsIterator<T> {
    fn freq(&self) -> Result<i32> {
        self.current_sub()?.freq()
    }

    fn next_position(&mut self) -> Result<i32> {
        match self.current {
            Some(i) => self.subs[i].postings_iter.next_position(),
            None => bail!(IllegalState("postings iterator is unpositioned".into())),
        }
    }

    fn start_offset(&self) -> Result<i32> {
        self.current_sub()?.start_offset()
    }

    fn end_offset(&self) -> Result<i32> {
        self.current_sub()?.end_offset()
    }

    fn payload(&self) -> Result<Payload> {
        self.current_sub()?.payload()
    }
}

impl<T: PostingIterator> DocIterator for MultiPostingsIterator<T> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next(&mut self) -> Result<DocId> {
        loop {
            if let Some(i) = self.current {
                let doc = self.subs[i].postings_iter.next()?;
                if doc != NO_MORE_DOCS {
                    self.doc = self.current_base + doc;
                    return Ok(self.doc);
                }
                self.current = None;
            } else if !self.open_next_sub() {
                self.doc = NO_MORE_DOCS;
                return Ok(self.doc);
            }
        }
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        debug_assert!(target > self.doc);
        loop {
            if let Some(i) = self.current {
                let doc = if target < self.current_base {
                    // target was in the previous slice but there was no matching doc after it
                    self.subs[i].postings_iter.next()?
                } else {
                    self.subs[i]
                        .postings_iter
                        .advance(target - self.current_base)?
                };
                if doc == NO_MORE_DOCS {
                    self.current = None;
                } else {
                    self.doc = doc + self.current_base;
                    return Ok(self.doc);
                }
            } else if !self.open_next_sub() {
                self.doc = NO_MORE_DOCS;
                return Ok(self.doc);
            }
        }
    }

    fn cost(&self) -> usize {
        self.subs.iter().map(|s| s.postings_iter.cost()).sum()
    }
}

struct FieldsMergeState {
    doc_maps: Vec<Arc<dyn DocMap>>,
    payload_processors: Vec<Option<Arc<dyn PayloadProcessor>>>,
}

impl FieldsMergeState {
    fn new(state: &MergeState) -> Self {
        FieldsMergeState {
            doc_maps: state.doc_maps.clone(),
            payload_processors: state.payload_processors.clone(),
        }
    }
}

/// A `Fields` implementation that merges multiple Fields into one,
/// and maps around deleted documents. This is used for merging.
pub struct MappedMultiFields<F: Fields> {
    fields: MultiFields<F>,
    fields_state: Arc<FieldsMergeState>,
}

impl<F: Fields> MappedMultiFields<F> {
    pub fn new(merge_state: &MergeState, fields: MultiFields<F>) -> Self {
        MappedMultiFields {
            fields,
            fields_state: Arc::new(FieldsMergeState::new(merge_state)),
        }
    }
}

impl<F: Fields> Fields for MappedMultiFields<F> {
    type Terms = MappedMultiTerms<F::Terms>;

    fn fields(&self) -> Vec<String> {
        self.fields.fields()
    }

    fn terms(&self, field: &str) -> Result<Option<Self::Terms>> {
        match self.fields.terms(field)? {
            Some(t) => Ok(Some(MappedMultiTerms::new(
                field.to_string(),
                Arc::clone(&self.fields_state),
                t,
            ))),
            None => Ok(None),
        }
    }

    fn size(&self) -> i32 {
        self.fields.size()
    }
}

pub struct MappedMultiTerms<T: Terms> {
    terms: Arc<MultiTerms<T>>,
    field: String,
    fields_state: Arc<FieldsMergeState>,
}

impl<T: Terms> MappedMultiTerms<T> {
    fn new(field: String, fields_state: Arc<FieldsMergeState>, terms: Arc<MultiTerms<T>>) -> Self {
        MappedMultiTerms {
            terms,
            field,
            fields_state,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl<T: Terms> Terms for MappedMultiTerms<T> {
    type Iterator = MappedMultiTermsIterator<T::Iterator>;

    fn iterator(&self) -> Result<Self::Iterator> {
        Ok(MappedMultiTermsIterator::new(
            Arc::clone(&self.fields_state),
            self.terms.iterator()?,
        ))
    }

    fn size(&self) -> Result<i64> {
        bail!(UnsupportedOperation(Cow::Borrowed(
            "term statistics are undefined while merging"
        )))
    }

    fn sum_total_term_freq(&self) -> Result<i64> {
        bail!(UnsupportedOperation(Cow::Borrowed(
            "term statistics are undefined while merging"
        )))
    }

    fn sum_doc_freq(&self) -> Result<i64> {
        bail!(UnsupportedOperation(Cow::Borrowed(
            "term statistics are undefined while merging"
        )))
    }

    fn doc_count(&self) -> Result<i32> {
        bail!(UnsupportedOperation(Cow::Borrowed(
            "term statistics are undefined while merging"
        )))
    }

    fn has_freqs(&self) -> Result<bool> {
        self.terms.has_freqs()
    }

    fn has_offsets(&self) -> Result<bool> {
        self.terms.has_offsets()
    }

    fn has_positions(&self) -> Result<bool> {
        self.terms.has_positions()
    }

    fn has_payloads(&self) -> Result<bool> {
        self.terms.has_payloads()
    }
}

/// Term iterator of `MappedMultiTerms`; its postings are remapped around
/// deleted documents.
pub struct MappedMultiTermsIterator<T: TermIterator> {
    fields_state: Arc<FieldsMergeState>,
    terms: MultiTermIterator<T>,
}

impl<T: TermIterator> MappedMultiTermsIterator<T> {
    fn new(fields_state: Arc<FieldsMergeState>, terms: MultiTermIterator<T>) -> Self {
        MappedMultiTermsIterator {
            fields_state,
            terms,
        }
    }

    fn check_live_docs(live_docs: &Option<BitsRef>) -> Result<()> {
        if live_docs.is_some() {
            bail!(IllegalArgument(
                "live docs must be None while merging".into()
            ));
        }
        Ok(())
    }
}

impl<T: TermIterator> TermIterator for MappedMultiTermsIterator<T> {
    type Postings = MappingMultiPostingsIter<T::Postings>;
    type TermState = T::TermState;

    fn next(&mut self) -> Result<Option<Vec<u8>>> {
        self.terms.next()
    }

    fn seek_exact(&mut self, text: &[u8]) -> Result<bool> {
        self.terms.seek_exact(text)
    }

    fn seek_ceil(&mut self, text: &[u8]) -> Result<SeekStatus> {
        self.terms.seek_ceil(text)
    }

    fn seek_exact_ord(&mut self, ord: i64) -> Result<()> {
        self.terms.seek_exact_ord(ord)
    }

    fn term(&self) -> Result<&[u8]> {
        self.terms.term()
    }

    fn ord(&self) -> Result<i64> {
        self.terms.ord()
    }

    fn doc_freq(&mut self) -> Result<i32> {
        bail!(UnsupportedOperation(Cow::Borrowed(
            "doc_freq is undefined while merging"
        )))
    }

    fn total_term_freq(&mut self) -> Result<i64> {
        bail!(UnsupportedOperation(Cow::Borrowed(
            "total_term_freq is undefined while merging"
        )))
    }

    fn docs(&mut self, live_docs: Option<BitsRef>, flags: u16) -> Result<Self::Postings> {
        Self::check_live_docs(&live_docs)?;
        let mut mapping = MappingMultiPostingsIter::new(self.fields_state.as_ref());
        mapping.reset(self.terms.docs(None, flags)?);
        Ok(mapping)
    }

    fn docs_and_positions(
        &mut self,
        live_docs: Option<BitsRef>,
        flags: u16,
    ) -> Result<Option<Self::Postings>> {
        Self::check_live_docs(&live_docs)?;
        match self.terms.docs_and_positions(None, flags)? {
            Some(postings) => {
                let mut mapping = MappingMultiPostingsIter::new(self.fields_state.as_ref());
                mapping.reset(postings);
                Ok(Some(mapping))
            }
            None => Ok(None),
        }
    }

    fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Exposes flex API, merged from flex API of sub-segments, remapping docIDs
/// (this is used for segment merging).
pub struct MappingMultiPostingsIter<T: PostingIterator> {
    doc_maps: Vec<Arc<dyn DocMap>>,
    payload_processors: Vec<Option<Arc<dyn PayloadProcessor>>>,
    subs: Vec<IterWithSlice<T>>,
    upto: usize,
    current: Option<usize>,
    doc: DocId,
}

impl<T: PostingIterator> MappingMultiPostingsIter<T> {
    fn new(merge_state: &FieldsMergeState) -> Self {
        MappingMultiPostingsIter {
            doc_maps: merge_state.doc_maps.clone(),
            payload_processors: merge_state.payload_processors.clone(),
            subs: Vec::with_capacity(0),
            upto: 0,
            current: None,
            doc: -1,
        }
    }

    /// Builds a mapping iterator directly from a merge state.
    pub fn with_merge_state(merge_state: &MergeState) -> Self {
        Self::new(&FieldsMergeState::new(merge_state))
    }

    pub fn reset(&mut self, mut postings_iter: MultiPostingsIterator<T>) {
        self.subs = postings_iter.take_subs();
        self.upto = 0;
        self.current = None;
        self.doc = -1;
    }

    pub fn num_subs(&self) -> usize {
        self.subs.len()
    }

    fn current_sub(&self) -> Result<&IterWithSlice<T>> {
        match self.current {
            Some(i) => Ok(&self.subs[i]),
            None => bail!(IllegalState("postings iterator is unpositioned".into())),
        }
    }
}

impl<T: PostingIterator> PostingIterator for MappingMultiPostingsIter<T> {
    fn freq(&self) -> Result<i32> {
        self.current_sub()?.postings_iter.freq()
    }

    fn next_position(&mut self) -> Result<i32> {
        let pos = match self.current {
            Some(i) => self.subs[i].postings_iter.next_position()?,
            None => bail!(IllegalState("postings iterator is unpositioned".into())),
        };
        if pos < 0 {
            bail!(CorruptIndex(format!("position={} is negative", pos)));
        } else if pos > INDEX_MAX_POSITION {
            bail!(CorruptIndex(format!(
                "position={} is too large (> INDEX_MAX_POSITION={})",
                pos, INDEX_MAX_POSITION
            )));
        }
        Ok(pos)
    }

    fn start_offset(&self) -> Result<i32> {
        self.current_sub()?.postings_iter.start_offset()
    }

    fn end_offset(&self) -> Result<i32> {
        self.current_sub()?.postings_iter.end_offset()
    }

    fn payload(&self) -> Result<Payload> {
        let sub = self.current_sub()?;
        let mut payload = sub.postings_iter.payload()?;
        if !payload.is_empty() {
            if let Some(ref processor) = self.payload_processors[sub.slice.reader_index] {
                processor.process(&mut payload)?;
            }
        }
        Ok(payload)
    }
}

impl<T: PostingIterator> DocIterator for MappingMultiPostingsIter<T> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next(&mut self) -> Result<DocId> {
        loop {
            if let Some(i) = self.current {
                let doc = self.subs[i].postings_iter.next()?;
                if doc == NO_MORE_DOCS {
                    self.current = None;
                    continue;
                }
                let reader = self.subs[i].slice.reader_index;
                // skip deleted docs
                let mapped = self.doc_maps[reader].get(doc)?;
                if mapped != -1 {
                    self.doc = mapped;
                    return Ok(self.doc);
                }
            } else if self.upto == self.subs.len() {
                self.doc = NO_MORE_DOCS;
                return Ok(self.doc);
            } else {
                self.current = Some(self.upto);
                self.upto += 1;
            }
        }
    }

    fn advance(&mut self, _target: DocId) -> Result<DocId> {
        bail!(UnsupportedOperation(Cow::Borrowed(
            "MappingMultiPostingsIter does not support advance"
        )))
    }

    fn cost(&self) -> usize {
        self.subs.iter().map(|s| s.postings_iter.cost()).sum()
    }
}
