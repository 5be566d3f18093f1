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

use core::codec::{Fields, OrdTermState, SeekStatus, TermIterator, Terms};
use core::index::reader::{IndexReader, LeafReader, LeafReaderContext};
use core::index::IndexOptions;
use core::search::{DocIterator, Payload, PostingIterator, NO_MORE_DOCS};
use core::util::{BitsRef, DocId, FixedBits};

use error::ErrorKind::{IllegalArgument, IllegalState, UnsupportedOperation};
use error::Result;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One occurrence of a term inside a document.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryToken {
    pub position: i32,
    pub start_offset: i32,
    pub end_offset: i32,
    pub payload: Option<Payload>,
}

impl MemoryToken {
    pub fn new(position: i32) -> MemoryToken {
        MemoryToken {
            position,
            start_offset: -1,
            end_offset: -1,
            payload: None,
        }
    }

    pub fn with_offsets(mut self, start_offset: i32, end_offset: i32) -> MemoryToken {
        self.start_offset = start_offset;
        self.end_offset = end_offset;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> MemoryToken {
        self.payload = Some(payload);
        self
    }
}

struct MemoryPosting {
    doc: DocId,
    tokens: Vec<MemoryToken>,
}

struct MemoryTermEntry {
    term: Vec<u8>,
    postings: Vec<MemoryPosting>,
    total_term_freq: i64,
}

struct MemoryTermsData {
    terms: Vec<MemoryTermEntry>,
    options: IndexOptions,
    has_payloads: bool,
    support_ords: bool,
    sum_doc_freq: i64,
    sum_total_term_freq: i64,
    doc_count: i32,
}

/// Collects postings for an in-RAM segment.
///
/// Terms added with `add_term` get consecutive positions per field and
/// document, the way a tokenizer would produce them.
#[derive(Default)]
pub struct MemorySegmentBuilder {
    max_doc: i32,
    fields: BTreeMap<String, BTreeMap<Vec<u8>, BTreeMap<DocId, Vec<MemoryToken>>>>,
    options: HashMap<String, IndexOptions>,
    next_position: HashMap<(String, DocId), i32>,
    deleted: Vec<DocId>,
    support_ords: bool,
}

impl MemorySegmentBuilder {
    pub fn new(max_doc: i32) -> MemorySegmentBuilder {
        MemorySegmentBuilder {
            max_doc,
            ..Default::default()
        }
    }

    pub fn index_options(&mut self, field: &str, options: IndexOptions) -> &mut Self {
        self.options.insert(field.to_string(), options);
        self
    }

    /// Whether term iterators of the built segment expose native ordinals.
    pub fn support_ords(&mut self, support_ords: bool) -> &mut Self {
        self.support_ords = support_ords;
        self
    }

    pub fn add_term(&mut self, field: &str, term: &[u8], doc: DocId) -> &mut Self {
        let position = {
            let next = self
                .next_position
                .entry((field.to_string(), doc))
                .or_insert(0);
            *next += 1;
            *next - 1
        };
        self.add_token(field, term, doc, MemoryToken::new(position))
    }

    pub fn add_token(
        &mut self,
        field: &str,
        term: &[u8],
        doc: DocId,
        token: MemoryToken,
    ) -> &mut Self {
        self.fields
            .entry(field.to_string())
            .or_insert_with(BTreeMap::new)
            .entry(term.to_vec())
            .or_insert_with(BTreeMap::new)
            .entry(doc)
            .or_insert_with(Vec::new)
            .push(token);
        self
    }

    pub fn delete_doc(&mut self, doc: DocId) -> &mut Self {
        self.deleted.push(doc);
        self
    }

    pub fn build(&self) -> Result<MemoryLeafReader> {
        if self.max_doc < 0 {
            bail!(IllegalArgument(format!(
                "max_doc must be >= 0, got {}",
                self.max_doc
            )));
        }

        let mut fields = BTreeMap::new();
        for (field, terms) in &self.fields {
            let options = self.options.get(field).cloned().unwrap_or_default();
            let mut entries = Vec::with_capacity(terms.len());
            let mut has_payloads = false;
            let mut sum_doc_freq = 0i64;
            let mut sum_total_term_freq = 0i64;
            let mut docs_with_field = vec![false; self.max_doc as usize];

            for (term, docs) in terms {
                let mut postings = Vec::with_capacity(docs.len());
                let mut total_term_freq = 0i64;
                for (&doc, tokens) in docs {
                    if doc < 0 || doc >= self.max_doc {
                        bail!(IllegalArgument(format!(
                            "doc {} out of bounds for max_doc {}",
                            doc, self.max_doc
                        )));
                    }
                    let mut tokens = tokens.clone();
                    tokens.sort_by_key(|t| t.position);
                    has_payloads |= tokens.iter().any(|t| t.payload.is_some());
                    total_term_freq += tokens.len() as i64;
                    docs_with_field[doc as usize] = true;
                    postings.push(MemoryPosting { doc, tokens });
                }
                sum_doc_freq += postings.len() as i64;
                sum_total_term_freq += total_term_freq;
                entries.push(MemoryTermEntry {
                    term: term.clone(),
                    postings,
                    total_term_freq: if options.has_freqs() {
                        total_term_freq
                    } else {
                        -1
                    },
                });
            }

            let data = MemoryTermsData {
                terms: entries,
                options,
                has_payloads: has_payloads && options.has_positions(),
                support_ords: self.support_ords,
                sum_doc_freq,
                sum_total_term_freq: if options.has_freqs() {
                    sum_total_term_freq
                } else {
                    -1
                },
                doc_count: docs_with_field.iter().filter(|&&b| b).count() as i32,
            };
            fields.insert(
                field.clone(),
                MemoryTerms {
                    data: Arc::new(data),
                },
            );
        }

        let (live_docs, num_docs) = if self.deleted.is_empty() {
            (None, self.max_doc)
        } else {
            let bits = FixedBits::with_cleared(self.max_doc as usize, &self.deleted)?;
            let num_docs = bits.cardinality() as i32;
            (Some(Arc::new(bits) as BitsRef), num_docs)
        };

        Ok(MemoryLeafReader {
            fields: Arc::new(MemoryFields { fields }),
            max_doc: self.max_doc,
            num_docs,
            live_docs,
        })
    }
}

/// A segment held entirely in RAM.
pub struct MemoryLeafReader {
    fields: Arc<MemoryFields>,
    max_doc: i32,
    num_docs: i32,
    live_docs: Option<BitsRef>,
}

impl LeafReader for MemoryLeafReader {
    type Fields = Arc<MemoryFields>;

    fn fields(&self) -> Result<Self::Fields> {
        Ok(Arc::clone(&self.fields))
    }

    fn max_doc(&self) -> i32 {
        self.max_doc
    }

    fn num_docs(&self) -> i32 {
        self.num_docs
    }

    fn live_docs(&self) -> Option<BitsRef> {
        self.live_docs.clone()
    }
}

impl IndexReader for MemoryLeafReader {
    type Leaf = MemoryLeafReader;

    fn leaves(&self) -> Vec<LeafReaderContext<'_, MemoryLeafReader>> {
        vec![LeafReaderContext::new(self, 0, 0)]
    }

    fn max_doc(&self) -> i32 {
        self.max_doc
    }

    fn num_docs(&self) -> i32 {
        self.num_docs
    }
}

pub struct MemoryFields {
    fields: BTreeMap<String, MemoryTerms>,
}

impl Fields for MemoryFields {
    type Terms = MemoryTerms;

    fn fields(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn terms(&self, field: &str) -> Result<Option<Self::Terms>> {
        Ok(self.fields.get(field).cloned())
    }

    fn size(&self) -> i32 {
        self.fields.len() as i32
    }
}

#[derive(Clone)]
pub struct MemoryTerms {
    data: Arc<MemoryTermsData>,
}

impl Terms for MemoryTerms {
    type Iterator = MemoryTermIterator;

    fn iterator(&self) -> Result<Self::Iterator> {
        Ok(MemoryTermIterator {
            data: Arc::clone(&self.data),
            pos: None,
        })
    }

    fn size(&self) -> Result<i64> {
        Ok(self.data.terms.len() as i64)
    }

    fn sum_total_term_freq(&self) -> Result<i64> {
        Ok(self.data.sum_total_term_freq)
    }

    fn sum_doc_freq(&self) -> Result<i64> {
        Ok(self.data.sum_doc_freq)
    }

    fn doc_count(&self) -> Result<i32> {
        Ok(self.data.doc_count)
    }

    fn has_freqs(&self) -> Result<bool> {
        Ok(self.data.options.has_freqs())
    }

    fn has_offsets(&self) -> Result<bool> {
        Ok(self.data.options.has_offsets())
    }

    fn has_positions(&self) -> Result<bool> {
        Ok(self.data.options.has_positions())
    }

    fn has_payloads(&self) -> Result<bool> {
        Ok(self.data.has_payloads)
    }
}

pub struct MemoryTermIterator {
    data: Arc<MemoryTermsData>,
    pos: Option<usize>,
}

impl MemoryTermIterator {
    fn current(&self) -> Result<&MemoryTermEntry> {
        match self.pos {
            Some(p) if p < self.data.terms.len() => Ok(&self.data.terms[p]),
            _ => bail!(IllegalState("term iterator is unpositioned".into())),
        }
    }

    fn check_ords(&self) -> Result<()> {
        if !self.data.support_ords {
            bail!(UnsupportedOperation(
                "this segment does not support ordinals".into()
            ));
        }
        Ok(())
    }

    fn postings(&self, live_docs: Option<BitsRef>) -> Result<MemoryPostingIterator> {
        let term = match self.pos {
            Some(p) if p < self.data.terms.len() => p,
            _ => bail!(IllegalState("term iterator is unpositioned".into())),
        };
        Ok(MemoryPostingIterator {
            data: Arc::clone(&self.data),
            term,
            next_index: 0,
            doc: -1,
            live_docs,
            pos_upto: 0,
        })
    }
}

impl TermIterator for MemoryTermIterator {
    type Postings = MemoryPostingIterator;
    type TermState = OrdTermState;

    fn next(&mut self) -> Result<Option<Vec<u8>>> {
        let len = self.data.terms.len();
        let next = match self.pos {
            Some(p) => (p + 1).min(len),
            None => 0,
        };
        self.pos = Some(next);
        if next < len {
            Ok(Some(self.data.terms[next].term.clone()))
        } else {
            Ok(None)
        }
    }

    fn seek_ceil(&mut self, text: &[u8]) -> Result<SeekStatus> {
        match self
            .data
            .terms
            .binary_search_by(|e| e.term.as_slice().cmp(text))
        {
            Ok(i) => {
                self.pos = Some(i);
                Ok(SeekStatus::Found)
            }
            Err(i) if i < self.data.terms.len() => {
                self.pos = Some(i);
                Ok(SeekStatus::NotFound)
            }
            Err(_) => {
                self.pos = None;
                Ok(SeekStatus::End)
            }
        }
    }

    fn seek_exact_ord(&mut self, ord: i64) -> Result<()> {
        self.check_ords()?;
        if ord < 0 || ord >= self.data.terms.len() as i64 {
            bail!(IllegalArgument(format!(
                "ord {} out of bounds for {} terms",
                ord,
                self.data.terms.len()
            )));
        }
        self.pos = Some(ord as usize);
        Ok(())
    }

    fn seek_exact_state(&mut self, _text: &[u8], state: &OrdTermState) -> Result<()> {
        if state.ord < 0 || state.ord >= self.data.terms.len() as i64 {
            bail!(IllegalArgument(format!("invalid term state ord {}", state.ord)));
        }
        self.pos = Some(state.ord as usize);
        Ok(())
    }

    fn term(&self) -> Result<&[u8]> {
        Ok(&self.current()?.term)
    }

    fn ord(&self) -> Result<i64> {
        self.check_ords()?;
        self.current()?;
        Ok(self.pos.map_or(-1, |p| p as i64))
    }

    fn doc_freq(&mut self) -> Result<i32> {
        Ok(self.current()?.postings.len() as i32)
    }

    fn total_term_freq(&mut self) -> Result<i64> {
        Ok(self.current()?.total_term_freq)
    }

    fn docs(&mut self, live_docs: Option<BitsRef>, _flags: u16) -> Result<Self::Postings> {
        self.postings(live_docs)
    }

    fn docs_and_positions(
        &mut self,
        live_docs: Option<BitsRef>,
        _flags: u16,
    ) -> Result<Option<Self::Postings>> {
        if !self.data.options.has_positions() {
            return Ok(None);
        }
        self.postings(live_docs).map(Some)
    }

    fn term_state(&mut self) -> Result<OrdTermState> {
        self.current()?;
        Ok(OrdTermState {
            ord: self.pos.map_or(-1, |p| p as i64),
        })
    }

    fn is_empty(&self) -> bool {
        self.data.terms.is_empty()
    }
}

pub struct MemoryPostingIterator {
    data: Arc<MemoryTermsData>,
    term: usize,
    next_index: usize,
    doc: DocId,
    live_docs: Option<BitsRef>,
    pos_upto: usize,
}

impl MemoryPostingIterator {
    fn postings(&self) -> &[MemoryPosting] {
        &self.data.terms[self.term].postings
    }

    fn current(&self) -> Result<&MemoryPosting> {
        if self.doc == -1 || self.doc == NO_MORE_DOCS {
            bail!(IllegalState("postings iterator is unpositioned".into()));
        }
        Ok(&self.postings()[self.next_index - 1])
    }

    fn current_token(&self) -> Result<&MemoryToken> {
        let posting = self.current()?;
        if self.pos_upto == 0 || self.pos_upto > posting.tokens.len() {
            bail!(IllegalState("no current position".into()));
        }
        Ok(&posting.tokens[self.pos_upto - 1])
    }
}

impl DocIterator for MemoryPostingIterator {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next(&mut self) -> Result<DocId> {
        while self.next_index < self.postings().len() {
            let doc = self.postings()[self.next_index].doc;
            self.next_index += 1;
            let live = match self.live_docs {
                Some(ref bits) => bits.get(doc as usize)?,
                None => true,
            };
            if live {
                self.doc = doc;
                self.pos_upto = 0;
                return Ok(doc);
            }
        }
        self.doc = NO_MORE_DOCS;
        Ok(NO_MORE_DOCS)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.slow_advance(target)
    }

    fn cost(&self) -> usize {
        self.postings().len()
    }
}

impl PostingIterator for MemoryPostingIterator {
    fn freq(&self) -> Result<i32> {
        if self.data.options.has_freqs() {
            Ok(self.current()?.tokens.len() as i32)
        } else {
            Ok(1)
        }
    }

    fn next_position(&mut self) -> Result<i32> {
        if !self.data.options.has_positions() {
            return Ok(-1);
        }
        self.pos_upto += 1;
        Ok(self.current_token()?.position)
    }

    fn start_offset(&self) -> Result<i32> {
        if !self.data.options.has_offsets() {
            return Ok(-1);
        }
        Ok(self.current_token()?.start_offset)
    }

    fn end_offset(&self) -> Result<i32> {
        if !self.data.options.has_offsets() {
            return Ok(-1);
        }
        Ok(self.current_token()?.end_offset)
    }

    fn payload(&self) -> Result<Payload> {
        if !self.data.has_payloads {
            return Ok(Payload::new());
        }
        Ok(self.current_token()?.payload.clone().unwrap_or_default())
    }
}
