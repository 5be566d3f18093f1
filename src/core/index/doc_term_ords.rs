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

use core::codec::{SeekStatus, TermIterator, Terms};
use core::index::reader::{LeafReader, LeafTermIterator};
use core::search::{DocIterator, PostingIteratorFlags, NO_MORE_DOCS};
use core::util::{BitsRef, DocId};

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use serde_json;

use std::collections::HashMap;
use std::mem;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

/// Term numbers are shifted up by this much when delta encoded; delta 0
/// terminates a list and 1 is reserved.
pub const TNUM_OFFSET: i32 = 2;

/// Every 128th term is indexed, by default.
pub const DEFAULT_INDEX_INTERVAL_BITS: u32 = 7;

/// Returned by `DocTermOrdsValues::next_ord` once the document's ords are
/// exhausted.
pub const NO_MORE_ORDS: i64 = -1;

const NUM_BUCKETS: usize = 256;

/// Settings of one uninversion pass.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocTermOrdsConfig {
    /// Only terms starting with this prefix are uninverted.
    pub term_prefix: Option<Vec<u8>>,
    /// Terms whose doc_freq is above this are skipped.
    pub max_term_doc_freq: i32,
    /// Every `2^index_interval_bits`th term is sampled when the reader
    /// cannot seek by ordinal.
    pub index_interval_bits: u32,
}

impl Default for DocTermOrdsConfig {
    fn default() -> Self {
        DocTermOrdsConfig {
            term_prefix: None,
            max_term_doc_freq: i32::max_value(),
            index_interval_bits: DEFAULT_INDEX_INTERVAL_BITS,
        }
    }
}

impl DocTermOrdsConfig {
    pub fn from_json(json: &str) -> Result<DocTermOrdsConfig> {
        let config: DocTermOrdsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_term_prefix(mut self, prefix: &[u8]) -> Self {
        self.term_prefix = Some(prefix.to_vec());
        self
    }

    pub fn with_max_term_doc_freq(mut self, max_term_doc_freq: i32) -> Self {
        self.max_term_doc_freq = max_term_doc_freq;
        self
    }

    pub fn with_index_interval_bits(mut self, bits: u32) -> Self {
        self.index_interval_bits = bits;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.index_interval_bits < 1 || self.index_interval_bits > 31 {
            bail!(IllegalArgument(format!(
                "index_interval_bits must be in [1, 31], got {}",
                self.index_interval_bits
            )));
        }
        Ok(())
    }
}

/// Timings and counters of a finished uninversion.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UninvertStats {
    pub total_time_ms: u64,
    pub phase1_time_ms: u64,
    pub max_doc: i32,
    pub num_terms: i32,
    pub term_instances: i64,
    pub indexed_terms: usize,
    pub size_of_indexed_strings: usize,
    pub ram_bytes_used: usize,
}

impl UninvertStats {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Hooks called while a field is uninverted.
pub trait UninvertVisitor {
    /// Called once per uninverted term, before its postings are read.
    fn visit_term(&mut self, _term: &[u8], _term_num: i32) -> Result<()> {
        Ok(())
    }

    /// Called after the postings of a term were read, with the number of
    /// live docs it occurred in.
    fn set_actual_doc_freq(&mut self, _term_num: i32, _doc_freq: i32) -> Result<()> {
        Ok(())
    }
}

struct NoopVisitor;

impl UninvertVisitor for NoopVisitor {}

/// Where the term number list of one document lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermNumSlot {
    /// Up to 4 delta bytes, lowest byte first; a zero byte ends the list.
    Inline(u32),
    /// Start of a zero terminated delta list in arena `bucket`.
    Pointer { bucket: u8, offset: u32 },
}

/// Build time counterpart of `TermNumSlot`: the list overflowed into the
/// document's own buffer and ends at the given position.
#[derive(Clone, Copy, Debug)]
enum PendingSlot {
    Inline(u32),
    Buffer(usize),
}

/// This class enables fast access to multiple term ords for
/// a specified field across all docIDs.
///
/// Like the field cache, it uninverts the index and holds a
/// packed data structure in RAM to enable fast access.
/// Unlike the field cache, it can handle multi-valued fields,
/// and, it does not hold the term bytes in RAM.  Rather, you
/// must obtain a `TermIterator` from the `ord_terms_iterator`
/// method, and then seek-by-ord to get the term's bytes.
///
/// While normally term ords are type i64, in this API they are
/// i32 as the internal representation here cannot address
/// more than `i32::MAX` unique terms.  Also, typically this
/// class is used on fields with relatively few unique terms
/// vs the number of documents.  In addition, there is an
/// internal limit (16 MB) on how many bytes each chunk of
/// documents may consume.  If you trip this limit you'll hit
/// an `IllegalState` error.
///
/// Deleted documents are skipped during uninversion, and if
/// you look them up you'll get 0 ords.
///
/// The returned per-document ords do not retain their
/// original order in the document.  Instead they are returned
/// in sorted (by ord, ie term's byte order) order.  They
/// are also de-duplicated (ie if doc has same term more than
/// once in this field, you'll only get that ord back once).
///
/// This class tests whether the provided reader is able to
/// retrieve terms by ord (ie, it's single segment, and it
/// uses an ord-capable terms index).  If not, this class
/// will create its own term index internally, allowing to
/// create a wrapped `TermIterator` that can handle ord.  The
/// `ord_terms_iterator` method then provides this wrapped
/// iterator, if necessary.
///
/// The RAM consumption of this class can be high!
pub struct DocTermOrds {
    field: String,
    max_term_doc_freq: i32,
    index_interval_bits: u32,
    index_interval_mask: i32,
    index_interval: i32,
    prefix: Option<Vec<u8>>,
    ord_base: i32,
    num_terms: i32,
    term_instances: i64,
    max_doc: i32,
    // one slot per doc, None if nothing was uninverted
    index: Option<Vec<TermNumSlot>>,
    tnums: Vec<Vec<u8>>,
    indexed_terms: Option<Arc<Vec<Vec<u8>>>>,
    size_of_indexed_strings: usize,
    stats: UninvertStats,
}

impl DocTermOrds {
    /// Inverts only terms starting with the configured prefix, and only
    /// terms whose doc_freq (not taking deletions into account) is at most
    /// the configured `max_term_doc_freq`.
    pub fn uninvert<R: LeafReader>(
        reader: &R,
        field: &str,
        config: &DocTermOrdsConfig,
    ) -> Result<DocTermOrds> {
        Self::uninvert_with_visitor(reader, field, config, &mut NoopVisitor)
    }

    /// Like `uninvert`, calling `visitor` for every term.
    pub fn uninvert_with_visitor<R: LeafReader, V: UninvertVisitor>(
        reader: &R,
        field: &str,
        config: &DocTermOrdsConfig,
        visitor: &mut V,
    ) -> Result<DocTermOrds> {
        config.validate()?;
        let start = Instant::now();
        let mut ords = DocTermOrds::new(field, config, reader.max_doc());

        let terms = match reader.terms(field)? {
            Some(terms) => terms,
            None => return Ok(ords.finish(start, start)),
        };
        let mut te = terms.iterator()?;
        let seek_start = config.term_prefix.clone().unwrap_or_default();
        if te.seek_ceil(&seek_start)? == SeekStatus::End {
            return Ok(ords.finish(start, start));
        }

        let max_doc = reader.max_doc() as usize;
        // inline term numbers, or the end position in the doc's buffer
        let mut pending = vec![PendingSlot::Inline(0); max_doc];
        // last term we saw for this document
        let mut last_term = vec![0i32; max_doc];
        // overflowed term number lists (delta encoded)
        let mut buffers: Vec<Vec<u8>> = vec![Vec::new(); max_doc];

        let mut indexed_terms: Option<Vec<Vec<u8>>> = None;
        let mut tested_ord = false;
        let live_docs: Option<BitsRef> = reader.live_docs();

        // te is positioned on the first term
        let mut term_num = 0i32;
        loop {
            let term = te.term()?.to_vec();
            if let Some(ref prefix) = config.term_prefix {
                if !term.starts_with(prefix) {
                    break;
                }
            }

            if !tested_ord {
                match te.ord() {
                    Ok(ord) => ords.ord_base = ord as i32,
                    Err(ref e) if e.is_unsupported() => {
                        // the reader cannot seek by ord, sample our own terms index
                        indexed_terms = Some(Vec::new());
                    }
                    Err(e) => return Err(e),
                }
                tested_ord = true;
            }

            visitor.visit_term(&term, term_num)?;

            if let Some(ref mut sampled) = indexed_terms {
                if term_num & ords.index_interval_mask == 0 {
                    ords.size_of_indexed_strings += term.len();
                    sampled.push(term);
                }
            }

            let df = te.doc_freq()?;
            if df <= config.max_term_doc_freq {
                let mut docs = te.docs(live_docs.clone(), PostingIteratorFlags::NONE)?;
                // doc_freq, but takes deletions into account
                let mut actual_df = 0;
                loop {
                    let doc = docs.next()?;
                    if doc == NO_MORE_DOCS {
                        break;
                    }
                    actual_df += 1;
                    ords.term_instances += 1;
                    let doc = doc as usize;
                    let delta = (term_num - last_term[doc] + TNUM_OFFSET) as u32;
                    last_term[doc] = term_num;
                    append_delta(&mut pending[doc], &mut buffers[doc], delta);
                }
                visitor.set_actual_doc_freq(term_num, actual_df)?;
            }

            term_num += 1;
            if te.next()?.is_none() {
                break;
            }
        }

        ords.num_terms = term_num;
        ords.indexed_terms = indexed_terms.map(Arc::new);
        let mid = Instant::now();

        if ords.term_instances > 0 {
            let (index, tnums) = compact(&ords.field, pending, buffers)?;
            ords.index = Some(index);
            ords.tnums = tnums;
        }

        Ok(ords.finish(start, mid))
    }

    fn new(field: &str, config: &DocTermOrdsConfig, max_doc: i32) -> DocTermOrds {
        let index_interval = 1i32 << config.index_interval_bits;
        DocTermOrds {
            field: field.to_string(),
            max_term_doc_freq: config.max_term_doc_freq,
            index_interval_bits: config.index_interval_bits,
            index_interval_mask: index_interval.wrapping_sub(1),
            index_interval,
            prefix: config.term_prefix.clone(),
            ord_base: 0,
            num_terms: 0,
            term_instances: 0,
            max_doc,
            index: None,
            tnums: Vec::new(),
            indexed_terms: None,
            size_of_indexed_strings: 0,
            stats: UninvertStats::default(),
        }
    }

    fn finish(mut self, start: Instant, mid: Instant) -> DocTermOrds {
        let end = Instant::now();
        let ram_bytes_used = self.compute_ram_bytes_used();
        self.stats = UninvertStats {
            total_time_ms: duration_ms(end.duration_since(start)),
            phase1_time_ms: duration_ms(mid.duration_since(start)),
            max_doc: self.max_doc,
            num_terms: self.num_terms,
            term_instances: self.term_instances,
            indexed_terms: self.indexed_terms.as_ref().map_or(0, |t| t.len()),
            size_of_indexed_strings: self.size_of_indexed_strings,
            ram_bytes_used,
        };
        debug!(
            "uninverted field '{}': num_terms={} term_instances={} ram_bytes_used={} time={}ms",
            self.field, self.num_terms, self.term_instances, ram_bytes_used, self.stats.total_time_ms
        );
        self
    }

    fn compute_ram_bytes_used(&self) -> usize {
        // local fields
        let mut sz = mem::size_of::<DocTermOrds>();
        if let Some(ref index) = self.index {
            sz += index.len() * mem::size_of::<TermNumSlot>();
        }
        for arr in &self.tnums {
            sz += arr.len();
        }
        sz + self.size_of_indexed_strings
    }

    /// Returns an iterator over the ords of `doc`, reusing `reuse` when given.
    pub fn lookup<'a>(
        &'a self,
        doc: DocId,
        reuse: Option<TermOrdsIterator<'a>>,
    ) -> TermOrdsIterator<'a> {
        let mut iter = match reuse {
            Some(iter) => iter,
            None => TermOrdsIterator::new(self),
        };
        iter.reset(doc);
        iter
    }

    /// Returns a `TermIterator` that implements `ord`.  If the provided
    /// reader supports ord, we just return its term iterator; if it does
    /// not, we build a "private" terms index internally (WARNING: consumes
    /// RAM) and use that index to implement ord.  This also enables ord on
    /// top of a composite reader.
    ///
    /// Returns `None` if the reader has no terms for the field.
    pub fn ord_terms_iterator<R: LeafReader>(
        &self,
        reader: &R,
    ) -> Result<Option<OrdTermIterator<LeafTermIterator<R>>>> {
        let terms = match reader.terms(&self.field)? {
            Some(terms) => terms,
            None => return Ok(None),
        };
        let iter = terms.iterator()?;
        match self.indexed_terms {
            None => Ok(Some(OrdTermIterator::Native(iter))),
            Some(ref indexed) => Ok(Some(OrdTermIterator::Wrapped(OrdWrappedTermIterator::new(
                iter,
                Arc::clone(indexed),
                self.index_interval_bits,
                self.prefix.clone(),
                self.ord_base,
            )))),
        }
    }

    /// Returns the term bytes of ordinal `ord`, using an iterator obtained
    /// from `ord_terms_iterator`.
    pub fn lookup_term<T: TermIterator>(&self, iter: &mut T, ord: i64) -> Result<Vec<u8>> {
        iter.seek_exact_ord(ord)?;
        Ok(iter.term()?.to_vec())
    }

    /// A sorted set doc values view of this field, or `None` if the reader
    /// has no terms for it.
    pub fn values<'a, R: LeafReader>(
        &'a self,
        reader: &R,
    ) -> Result<Option<DocTermOrdsValues<'a, LeafTermIterator<R>>>> {
        match self.ord_terms_iterator(reader)? {
            Some(te) => Ok(Some(DocTermOrdsValues::new(self, te))),
            None => Ok(None),
        }
    }

    /// Number of terms in this field
    pub fn num_terms(&self) -> i32 {
        self.num_terms
    }

    /// Returns `true` if no terms were indexed.
    pub fn is_empty(&self) -> bool {
        self.index.is_none()
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Ordinal of the first term in the field, or 0 if the reader cannot
    /// provide ords.
    pub fn ord_base(&self) -> i32 {
        self.ord_base
    }

    /// Total number of (doc, term) pairs that were uninverted.
    pub fn term_instances(&self) -> i64 {
        self.term_instances
    }

    pub fn max_term_doc_freq(&self) -> i32 {
        self.max_term_doc_freq
    }

    pub fn index_interval(&self) -> i32 {
        self.index_interval
    }

    pub fn stats(&self) -> &UninvertStats {
        &self.stats
    }

    /// Returns total bytes used.
    pub fn ram_bytes_used(&self) -> usize {
        self.stats.ram_bytes_used
    }

    fn slot(&self, doc: DocId) -> Option<TermNumSlot> {
        match self.index {
            Some(ref index) if doc >= 0 => index.get(doc as usize).cloned(),
            _ => None,
        }
    }
}

fn duration_ms(d: ::std::time::Duration) -> u64 {
    d.as_secs() * 1000 + u64::from(d.subsec_millis())
}

/// Number of bytes to represent an unsigned int as a vint.
fn vint_size(x: u32) -> usize {
    if x & (0xffff_ffffu32 << 7) == 0 {
        return 1;
    }
    if x & (0xffff_ffffu32 << 14) == 0 {
        return 2;
    }
    if x & (0xffff_ffffu32 << 21) == 0 {
        return 3;
    }
    if x & (0xffff_ffffu32 << 28) == 0 {
        return 4;
    }
    5
}

/// Writes `x` as a vint, most significant group first, and returns the
/// position after it. This is different from the vints written to the
/// index: here the high bit of every byte but the last is set.
fn write_int(x: u32, arr: &mut [u8], mut pos: usize) -> usize {
    for shift in &[28u32, 21, 14, 7] {
        let a = x >> shift;
        if a != 0 {
            arr[pos] = (a | 0x80) as u8;
            pos += 1;
        }
    }
    arr[pos] = (x & 0x7f) as u8;
    pos + 1
}

fn append_delta(slot: &mut PendingSlot, buffer: &mut Vec<u8>, delta: u32) {
    match *slot {
        PendingSlot::Buffer(end) => {
            let new_end = end + vint_size(delta);
            if new_end > buffer.len() {
                // double, keeping 4 byte alignment
                let new_len = ((buffer.len() * 2).max(new_end) + 3) & !3usize;
                buffer.resize(new_len, 0);
            }
            *slot = PendingSlot::Buffer(write_int(delta, buffer, end));
        }
        PendingSlot::Inline(mut val) => {
            // find the end of the inlined data: a zero byte that does
            // not follow a byte with the high bit set
            let ipos = if val == 0 {
                0
            } else if val & 0x0000_ff80 == 0 {
                1
            } else if val & 0x00ff_8000 == 0 {
                2
            } else if val & 0xff80_0000 == 0 {
                3
            } else {
                4
            };

            // at least 9 bytes are needed, 12 keeps the buffer aligned
            let mut temp = [0u8; 12];
            let end_pos = write_int(delta, &mut temp, ipos);
            if end_pos <= 4 {
                // still fits inline
                for (j, b) in temp.iter().enumerate().take(end_pos).skip(ipos) {
                    val |= u32::from(*b) << (j << 3);
                }
                *slot = PendingSlot::Inline(val);
            } else {
                // move the inlined bytes in front of the new ones
                for b in temp.iter_mut().take(ipos) {
                    *b = val as u8;
                    val >>= 8;
                }
                buffer.clear();
                buffer.extend_from_slice(&temp);
                *slot = PendingSlot::Buffer(end_pos);
            }
        }
    }
}

/// Coalesces the per-document buffers into 256 arenas, one per bucket of
/// `(doc >> 16) & 0xff`, each list followed by a 0 terminator.
fn compact(
    field: &str,
    pending: Vec<PendingSlot>,
    mut buffers: Vec<Vec<u8>>,
) -> Result<(Vec<TermNumSlot>, Vec<Vec<u8>>)> {
    let max_doc = pending.len();
    let mut index: Vec<TermNumSlot> = pending
        .iter()
        .map(|slot| match *slot {
            PendingSlot::Inline(val) => TermNumSlot::Inline(val),
            PendingSlot::Buffer(_) => TermNumSlot::Inline(0),
        })
        .collect();
    let mut tnums = vec![Vec::new(); NUM_BUCKETS];

    for (pass, bucket) in tnums.iter_mut().enumerate() {
        let mut target: Vec<u8> = Vec::new();

        // loop over documents 0x00ppxxxx, 0x01ppxxxx, 0x02ppxxxx
        // where pp is the pass (which arena we are building)
        let mut doc_base = pass << 16;
        while doc_base < max_doc {
            let lim = (doc_base + (1 << 16)).min(max_doc);
            for doc in doc_base..lim {
                if let PendingSlot::Buffer(len) = pending[doc] {
                    let pos = target.len();
                    if pos & 0xff00_0000 != 0 {
                        // only 24 bits for the arena offset
                        bail!(IllegalState(format!(
                            "Too many values to uninvert field '{}'",
                            field
                        )));
                    }
                    index[doc] = TermNumSlot::Pointer {
                        bucket: pass as u8,
                        offset: pos as u32,
                    };
                    let arr = mem::replace(&mut buffers[doc], Vec::new());
                    target.extend_from_slice(&arr[..len]);
                    target.push(0);
                }
            }
            doc_base += 1 << 24;
        }

        target.shrink_to_fit();
        *bucket = target;

        if (pass << 16) > max_doc {
            break;
        }
    }

    Ok((index, tnums))
}

#[derive(Clone, Copy, Debug)]
enum Cursor {
    Inline(u32),
    Pointer { bucket: usize, upto: usize },
    Exhausted,
}

/// Iterates over the ords of one document.
#[derive(Clone)]
pub struct TermOrdsIterator<'a> {
    ords: &'a DocTermOrds,
    tnum: i32,
    cursor: Cursor,
}

impl<'a> TermOrdsIterator<'a> {
    fn new(ords: &'a DocTermOrds) -> TermOrdsIterator<'a> {
        TermOrdsIterator {
            ords,
            tnum: 0,
            cursor: Cursor::Exhausted,
        }
    }

    /// Positions the iterator on the first ord of `doc`.
    pub fn reset(&mut self, doc: DocId) {
        self.tnum = 0;
        self.cursor = match self.ords.slot(doc) {
            Some(TermNumSlot::Inline(code)) => Cursor::Inline(code),
            Some(TermNumSlot::Pointer { bucket, offset }) => Cursor::Pointer {
                bucket: bucket as usize,
                upto: offset as usize,
            },
            None => Cursor::Exhausted,
        };
    }

    /// Buffer must be at least 1 ord long; returns the number of ords
    /// filled in. When the returned count is less than the buffer length,
    /// the document has no more ords.
    pub fn read(&mut self, buffer: &mut [i32]) -> usize {
        if buffer.is_empty() {
            return 0;
        }
        let ord_base = self.ords.ord_base;
        let mut buffer_upto = 0;
        match self.cursor {
            Cursor::Inline(mut code) => {
                // term numbers are packed into the code itself
                let mut delta = 0u32;
                loop {
                    delta = (delta << 7) | (code & 0x7f);
                    if code & 0x80 == 0 {
                        if delta == 0 {
                            self.cursor = Cursor::Exhausted;
                            break;
                        }
                        self.tnum += delta as i32 - TNUM_OFFSET;
                        buffer[buffer_upto] = ord_base + self.tnum;
                        buffer_upto += 1;
                        delta = 0;
                        code >>= 8;
                        if buffer_upto == buffer.len() {
                            self.cursor = Cursor::Inline(code);
                            break;
                        }
                    } else {
                        code >>= 8;
                    }
                }
            }
            Cursor::Pointer { bucket, mut upto } => {
                let arr = &self.ords.tnums[bucket];
                loop {
                    let mut delta = 0u32;
                    loop {
                        let b = arr[upto];
                        upto += 1;
                        delta = (delta << 7) | u32::from(b & 0x7f);
                        if b & 0x80 == 0 {
                            break;
                        }
                    }
                    if delta == 0 {
                        self.cursor = Cursor::Exhausted;
                        break;
                    }
                    self.tnum += delta as i32 - TNUM_OFFSET;
                    buffer[buffer_upto] = ord_base + self.tnum;
                    buffer_upto += 1;
                    if buffer_upto == buffer.len() {
                        self.cursor = Cursor::Pointer { bucket, upto };
                        break;
                    }
                }
            }
            Cursor::Exhausted => {}
        }
        buffer_upto
    }
}

/// The term iterator handed out by `DocTermOrds::ord_terms_iterator`.
pub enum OrdTermIterator<T: TermIterator> {
    /// The reader's own iterator; it supports ords.
    Native(T),
    /// Ords resolved through the sampled terms index.
    Wrapped(OrdWrappedTermIterator<T>),
}

impl<T: TermIterator> TermIterator for OrdTermIterator<T> {
    type Postings = T::Postings;
    type TermState = T::TermState;

    fn next(&mut self) -> Result<Option<Vec<u8>>> {
        match self {
            OrdTermIterator::Native(t) => t.next(),
            OrdTermIterator::Wrapped(t) => t.next(),
        }
    }

    fn seek_exact(&mut self, text: &[u8]) -> Result<bool> {
        match self {
            OrdTermIterator::Native(t) => t.seek_exact(text),
            OrdTermIterator::Wrapped(t) => t.seek_exact(text),
        }
    }

    fn seek_ceil(&mut self, text: &[u8]) -> Result<SeekStatus> {
        match self {
            OrdTermIterator::Native(t) => t.seek_ceil(text),
            OrdTermIterator::Wrapped(t) => t.seek_ceil(text),
        }
    }

    fn seek_exact_ord(&mut self, ord: i64) -> Result<()> {
        match self {
            OrdTermIterator::Native(t) => t.seek_exact_ord(ord),
            OrdTermIterator::Wrapped(t) => t.seek_exact_ord(ord),
        }
    }

    fn term(&self) -> Result<&[u8]> {
        match self {
            OrdTermIterator::Native(t) => t.term(),
            OrdTermIterator::Wrapped(t) => t.term(),
        }
    }

    fn ord(&self) -> Result<i64> {
        match self {
            OrdTermIterator::Native(t) => t.ord(),
            OrdTermIterator::Wrapped(t) => t.ord(),
        }
    }

    fn doc_freq(&mut self) -> Result<i32> {
        match self {
            OrdTermIterator::Native(t) => t.doc_freq(),
            OrdTermIterator::Wrapped(t) => t.doc_freq(),
        }
    }

    fn total_term_freq(&mut self) -> Result<i64> {
        match self {
            OrdTermIterator::Native(t) => t.total_term_freq(),
            OrdTermIterator::Wrapped(t) => t.total_term_freq(),
        }
    }

    fn docs(&mut self, live_docs: Option<BitsRef>, flags: u16) -> Result<Self::Postings> {
        match self {
            OrdTermIterator::Native(t) => t.docs(live_docs, flags),
            OrdTermIterator::Wrapped(t) => t.docs(live_docs, flags),
        }
    }

    fn docs_and_positions(
        &mut self,
        live_docs: Option<BitsRef>,
        flags: u16,
    ) -> Result<Option<Self::Postings>> {
        match self {
            OrdTermIterator::Native(t) => t.docs_and_positions(live_docs, flags),
            OrdTermIterator::Wrapped(t) => t.docs_and_positions(live_docs, flags),
        }
    }

    fn term_state(&mut self) -> Result<Self::TermState> {
        match self {
            OrdTermIterator::Native(t) => t.term_state(),
            OrdTermIterator::Wrapped(t) => t.term_state(),
        }
    }
}

/// Only used if original reader doesn't implement ord; in this case we
/// "wrap" our own terms index around it.
pub struct OrdWrappedTermIterator<T: TermIterator> {
    terms: T,
    indexed_terms: Arc<Vec<Vec<u8>>>,
    index_interval_bits: u32,
    index_interval: i64,
    prefix: Option<Vec<u8>>,
    ord_base: i64,
    term: Option<Vec<u8>>,
    // force "real" seek
    ord: i64,
}

impl<T: TermIterator> OrdWrappedTermIterator<T> {
    fn new(
        terms: T,
        indexed_terms: Arc<Vec<Vec<u8>>>,
        index_interval_bits: u32,
        prefix: Option<Vec<u8>>,
        ord_base: i32,
    ) -> Self {
        let index_interval = 1i64 << index_interval_bits;
        OrdWrappedTermIterator {
            terms,
            indexed_terms,
            index_interval_bits,
            index_interval,
            prefix,
            ord_base: i64::from(ord_base),
            term: None,
            ord: -index_interval - 1,
        }
    }

    fn set_term(&mut self) -> Result<()> {
        let term = self.terms.term()?;
        self.term = match self.prefix {
            Some(ref prefix) if !term.starts_with(prefix) => None,
            _ => Some(term.to_vec()),
        };
        Ok(())
    }

    fn seek_block(&mut self, idx: usize) -> Result<()> {
        let status = self.terms.seek_ceil(&self.indexed_terms[idx])?;
        debug_assert_eq!(status, SeekStatus::Found);
        self.ord = (idx as i64) << self.index_interval_bits;
        self.set_term()
    }
}

impl<T: TermIterator> TermIterator for OrdWrappedTermIterator<T> {
    type Postings = T::Postings;
    type TermState = T::TermState;

    fn next(&mut self) -> Result<Option<Vec<u8>>> {
        self.ord += 1;
        if self.ord < 0 {
            self.ord = 0;
        }
        if self.terms.next()?.is_none() {
            self.term = None;
            return Ok(None);
        }
        self.set_term()?;
        Ok(self.term.clone())
    }

    fn seek_ceil(&mut self, target: &[u8]) -> Result<SeekStatus> {
        // already here
        if let Some(ref term) = self.term {
            if term.as_slice() == target {
                return Ok(SeekStatus::Found);
            }
        }

        let start_idx = match self
            .indexed_terms
            .binary_search_by(|t| t.as_slice().cmp(target))
        {
            Ok(idx) => {
                // we hit the term exactly... lucky us!
                self.seek_block(idx)?;
                return Ok(SeekStatus::Found);
            }
            Err(idx) => idx,
        };

        if start_idx == 0 {
            // our target occurs *before* the first term
            self.ord = 0;
            if self.terms.seek_ceil(target)? == SeekStatus::End {
                self.term = None;
            } else {
                self.set_term()?;
            }
            if self.term.is_none() && !self.indexed_terms.is_empty() {
                // the ceiling fell outside the prefix, the first term is ord 0
                self.seek_block(0)?;
            }
            return Ok(SeekStatus::NotFound);
        }

        // back up to the start of the block
        let block = start_idx - 1;
        let in_block = (self.ord >> self.index_interval_bits) == block as i64
            && self.term.as_ref().map_or(false, |t| t.as_slice() <= target);
        if !in_block {
            // seek to the right block
            self.seek_block(block)?;
        }

        loop {
            match self.term {
                Some(ref t) if t.as_slice() < target => {}
                _ => break,
            }
            self.next()?;
        }

        Ok(match self.term {
            None => SeekStatus::End,
            Some(ref t) if t.as_slice() == target => SeekStatus::Found,
            Some(_) => SeekStatus::NotFound,
        })
    }

    fn seek_exact_ord(&mut self, target_ord: i64) -> Result<()> {
        let mut delta = target_ord - self.ord_base - self.ord;
        if delta < 0 || delta > self.index_interval || self.term.is_none() {
            let idx = ((target_ord - self.ord_base) >> self.index_interval_bits) as usize;
            if target_ord < self.ord_base || idx >= self.indexed_terms.len() {
                bail!(IllegalArgument(format!("ord {} is out of bounds", target_ord)));
            }
            let status = self.terms.seek_ceil(&self.indexed_terms[idx])?;
            debug_assert_eq!(status, SeekStatus::Found);
            self.ord = (idx as i64) << self.index_interval_bits;
            delta = target_ord - self.ord_base - self.ord;
        }

        while delta > 0 {
            delta -= 1;
            if self.terms.next()?.is_none() {
                self.term = None;
                bail!(IllegalArgument(format!("ord {} is out of bounds", target_ord)));
            }
            self.ord += 1;
        }

        self.set_term()
    }

    fn term(&self) -> Result<&[u8]> {
        match self.term {
            Some(ref t) => Ok(t.as_slice()),
            None => bail!(IllegalState("term iterator is unpositioned".into())),
        }
    }

    fn ord(&self) -> Result<i64> {
        Ok(self.ord_base + self.ord)
    }

    fn doc_freq(&mut self) -> Result<i32> {
        self.terms.doc_freq()
    }

    fn total_term_freq(&mut self) -> Result<i64> {
        self.terms.total_term_freq()
    }

    fn docs(&mut self, live_docs: Option<BitsRef>, flags: u16) -> Result<Self::Postings> {
        self.terms.docs(live_docs, flags)
    }

    fn docs_and_positions(
        &mut self,
        live_docs: Option<BitsRef>,
        flags: u16,
    ) -> Result<Option<Self::Postings>> {
        self.terms.docs_and_positions(live_docs, flags)
    }

    fn term_state(&mut self) -> Result<Self::TermState> {
        self.terms.term_state()
    }
}

/// Sorted set doc values over an uninverted field: the ords of a document
/// are read five at a time.
pub struct DocTermOrdsValues<'a, T: TermIterator> {
    ords: &'a DocTermOrds,
    iter: TermOrdsIterator<'a>,
    te: OrdTermIterator<T>,
    buffer: [i32; 5],
    buffer_upto: usize,
    buffer_length: usize,
}

impl<'a, T: TermIterator> DocTermOrdsValues<'a, T> {
    fn new(ords: &'a DocTermOrds, te: OrdTermIterator<T>) -> Self {
        DocTermOrdsValues {
            ords,
            iter: TermOrdsIterator::new(ords),
            te,
            buffer: [0; 5],
            buffer_upto: 0,
            buffer_length: 0,
        }
    }

    pub fn set_document(&mut self, doc: DocId) {
        self.iter.reset(doc);
        self.buffer_upto = 0;
        self.buffer_length = self.iter.read(&mut self.buffer);
    }

    /// Returns the next ord of the current document, or `NO_MORE_ORDS`.
    pub fn next_ord(&mut self) -> i64 {
        while self.buffer_upto == self.buffer_length {
            if self.buffer_length < self.buffer.len() {
                return NO_MORE_ORDS;
            }
            self.buffer_length = self.iter.read(&mut self.buffer);
            self.buffer_upto = 0;
        }
        let ord = self.buffer[self.buffer_upto];
        self.buffer_upto += 1;
        i64::from(ord)
    }

    pub fn lookup_ord(&mut self, ord: i64) -> Result<Vec<u8>> {
        self.ords.lookup_term(&mut self.te, ord)
    }

    pub fn value_count(&self) -> i64 {
        i64::from(self.ords.num_terms())
    }

    /// Returns the ord of `key`, or `-(insertion point) - 1` if it is absent.
    pub fn lookup_term(&mut self, key: &[u8]) -> Result<i64> {
        match self.te.seek_ceil(key)? {
            SeekStatus::Found => self.te.ord(),
            SeekStatus::NotFound => Ok(-self.te.ord()? - 1),
            SeekStatus::End => {
                Ok(-(i64::from(self.ords.ord_base) + i64::from(self.ords.num_terms())) - 1)
            }
        }
    }
}

/// Lazily uninverted fields of one reader, shared by all its users.
pub struct UninvertedFieldCache {
    config: DocTermOrdsConfig,
    cache: RwLock<HashMap<String, Arc<DocTermOrds>>>,
    // one lock per field being built, so a build only blocks callers
    // asking for the same field
    building: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Default for UninvertedFieldCache {
    fn default() -> Self {
        UninvertedFieldCache::new(DocTermOrdsConfig::default())
    }
}

impl UninvertedFieldCache {
    pub fn new(config: DocTermOrdsConfig) -> UninvertedFieldCache {
        UninvertedFieldCache {
            config,
            cache: RwLock::new(HashMap::new()),
            building: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the uninverted `field` of `reader`, building it on first
    /// use. `reader` must be the reader this cache belongs to.
    pub fn get_or_uninvert<R: LeafReader>(
        &self,
        reader: &R,
        field: &str,
    ) -> Result<Arc<DocTermOrds>> {
        if let Some(ords) = self.cached(field)? {
            return Ok(ords);
        }

        let field_lock = self.field_lock(field)?;
        let _guard = field_lock.lock()?;
        // another thread may have built it while we waited
        if let Some(ords) = self.cached(field)? {
            return Ok(ords);
        }
        let ords = Arc::new(DocTermOrds::uninvert(reader, field, &self.config)?);
        self.cache
            .write()?
            .insert(field.to_string(), Arc::clone(&ords));
        self.building.lock()?.remove(field);
        Ok(ords)
    }

    fn cached(&self, field: &str) -> Result<Option<Arc<DocTermOrds>>> {
        Ok(self.cache.read()?.get(field).map(Arc::clone))
    }

    fn field_lock(&self, field: &str) -> Result<Arc<Mutex<()>>> {
        let mut building = self.building.lock()?;
        let lock = building
            .entry(field.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Ok(Arc::clone(lock))
    }

    pub fn evict(&self, field: &str) -> Result<Option<Arc<DocTermOrds>>> {
        Ok(self.cache.write()?.remove(field))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.cache.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.cache.read()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::index::reader::{MemoryLeafReader, MemorySegmentBuilder};

    use crossbeam;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use std::collections::BTreeSet;

    fn build(docs: &[Vec<String>], deleted: &[DocId], support_ords: bool) -> MemoryLeafReader {
        let mut builder = MemorySegmentBuilder::new(docs.len() as i32);
        builder.support_ords(support_ords);
        for (doc, terms) in docs.iter().enumerate() {
            for term in terms {
                builder.add_term("field", term.as_bytes(), doc as DocId);
            }
        }
        for doc in deleted {
            builder.delete_doc(*doc);
        }
        builder.build().unwrap()
    }

    fn strings(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    fn doc_ords(ords: &DocTermOrds, doc: DocId, buffer_len: usize) -> Vec<i32> {
        let mut buffer = vec![0i32; buffer_len];
        let mut result = vec![];
        let mut iter = ords.lookup(doc, None);
        loop {
            let n = iter.read(&mut buffer);
            result.extend_from_slice(&buffer[..n]);
            if n < buffer_len {
                return result;
            }
        }
    }

    #[test]
    fn uninvert_simple_field() {
        let docs = vec![
            strings(&["b", "a", "a"]),
            vec![],
            strings(&["c"]),
            strings(&["a"]),
        ];
        for &support_ords in &[true, false] {
            let reader = build(&docs, &[3], support_ords);
            let ords =
                DocTermOrds::uninvert(&reader, "field", &DocTermOrdsConfig::default()).unwrap();
            assert!(!ords.is_empty());
            assert_eq!(ords.num_terms(), 3);
            assert_eq!(ords.term_instances(), 3);
            assert_eq!(ords.ord_base(), 0);
            assert_eq!(ords.field(), "field");
            assert!(ords.ram_bytes_used() > 0);

            assert_eq!(doc_ords(&ords, 0, 5), vec![0, 1]);
            assert!(doc_ords(&ords, 1, 5).is_empty());
            assert_eq!(doc_ords(&ords, 2, 5), vec![2]);
            // deleted
            assert!(doc_ords(&ords, 3, 5).is_empty());

            let mut te = ords.ord_terms_iterator(&reader).unwrap().unwrap();
            assert_eq!(ords.lookup_term(&mut te, 2).unwrap(), b"c".to_vec());
            assert_eq!(ords.lookup_term(&mut te, 0).unwrap(), b"a".to_vec());
            assert_eq!(ords.lookup_term(&mut te, 1).unwrap(), b"b".to_vec());
        }
    }

    #[test]
    fn uninvert_random_field() {
        let mut rng = StdRng::from_seed([7u8; 32]);
        let num_docs = 300;
        let vocab: Vec<String> = (0..400).map(|i| format!("term{:04}", i)).collect();

        let mut docs = Vec::with_capacity(num_docs);
        let mut deleted = vec![];
        for doc in 0..num_docs {
            let count = if rng.gen_bool(0.2) {
                rng.gen_range(20, 60)
            } else {
                rng.gen_range(0, 5)
            };
            let terms: Vec<String> = (0..count)
                .map(|_| vocab[rng.gen_range(0, vocab.len())].clone())
                .collect();
            docs.push(terms);
            if rng.gen_bool(0.1) {
                deleted.push(doc as DocId);
            }
        }

        let all_terms: Vec<String> = docs
            .iter()
            .flat_map(|d| d.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        for &support_ords in &[true, false] {
            let reader = build(&docs, &deleted, support_ords);
            let config = DocTermOrdsConfig::default().with_index_interval_bits(3);
            let ords = DocTermOrds::uninvert(&reader, "field", &config).unwrap();
            assert_eq!(ords.num_terms(), all_terms.len() as i32);

            let mut te = ords.ord_terms_iterator(&reader).unwrap().unwrap();
            for (doc, terms) in docs.iter().enumerate() {
                let expected: Vec<i32> = if deleted.contains(&(doc as DocId)) {
                    vec![]
                } else {
                    terms
                        .iter()
                        .collect::<BTreeSet<_>>()
                        .into_iter()
                        .map(|t| all_terms.binary_search(t).unwrap() as i32)
                        .collect()
                };
                for &buffer_len in &[1, 3, 5, 16] {
                    assert_eq!(doc_ords(&ords, doc as DocId, buffer_len), expected);
                }
                for &ord in expected.iter().rev() {
                    let term = ords.lookup_term(&mut te, i64::from(ord)).unwrap();
                    assert_eq!(term, all_terms[ord as usize].as_bytes());
                }
            }
        }
    }

    #[test]
    fn uninvert_with_prefix() {
        let docs = vec![
            strings(&["a1", "b1"]),
            strings(&["b2", "c1"]),
            strings(&["b1", "b2"]),
        ];
        let config = DocTermOrdsConfig::default().with_term_prefix(b"b");

        let reader = build(&docs, &[], true);
        let ords = DocTermOrds::uninvert(&reader, "field", &config).unwrap();
        assert_eq!(ords.num_terms(), 2);
        assert_eq!(ords.ord_base(), 1);
        assert_eq!(doc_ords(&ords, 0, 5), vec![1]);
        assert_eq!(doc_ords(&ords, 1, 5), vec![2]);
        assert_eq!(doc_ords(&ords, 2, 5), vec![1, 2]);
        let mut te = ords.ord_terms_iterator(&reader).unwrap().unwrap();
        assert_eq!(ords.lookup_term(&mut te, 2).unwrap(), b"b2".to_vec());

        let reader = build(&docs, &[], false);
        let ords = DocTermOrds::uninvert(&reader, "field", &config).unwrap();
        assert_eq!(ords.num_terms(), 2);
        assert_eq!(ords.ord_base(), 0);
        assert_eq!(doc_ords(&ords, 2, 5), vec![0, 1]);
        assert_eq!(ords.stats().indexed_terms, 1);
        let mut te = ords.ord_terms_iterator(&reader).unwrap().unwrap();
        assert_eq!(ords.lookup_term(&mut te, 1).unwrap(), b"b2".to_vec());
        assert_eq!(ords.lookup_term(&mut te, 0).unwrap(), b"b1".to_vec());

        let mut values = ords.values(&reader).unwrap().unwrap();
        assert_eq!(values.lookup_term(b"b1").unwrap(), 0);
        assert_eq!(values.lookup_term(b"b15").unwrap(), -2);
        assert_eq!(values.lookup_term(b"zz").unwrap(), -3);
        assert_eq!(values.lookup_term(b"a").unwrap(), -1);
    }

    #[derive(Default)]
    struct RecordingVisitor {
        visited: Vec<(Vec<u8>, i32)>,
        doc_freqs: Vec<(i32, i32)>,
    }

    impl UninvertVisitor for RecordingVisitor {
        fn visit_term(&mut self, term: &[u8], term_num: i32) -> Result<()> {
            self.visited.push((term.to_vec(), term_num));
            Ok(())
        }

        fn set_actual_doc_freq(&mut self, term_num: i32, doc_freq: i32) -> Result<()> {
            self.doc_freqs.push((term_num, doc_freq));
            Ok(())
        }
    }

    #[test]
    fn uninvert_skips_frequent_terms() {
        let docs = vec![
            strings(&["common"]),
            strings(&["common", "rare"]),
            strings(&["common", "rare"]),
            strings(&["common"]),
        ];
        let reader = build(&docs, &[2], true);
        let config = DocTermOrdsConfig::default().with_max_term_doc_freq(2);
        let mut visitor = RecordingVisitor::default();
        let ords = DocTermOrds::uninvert_with_visitor(&reader, "field", &config, &mut visitor)
            .unwrap();

        assert_eq!(ords.num_terms(), 2);
        assert_eq!(ords.max_term_doc_freq(), 2);
        assert_eq!(ords.term_instances(), 1);
        assert!(doc_ords(&ords, 0, 5).is_empty());
        assert_eq!(doc_ords(&ords, 1, 5), vec![1]);
        assert!(doc_ords(&ords, 2, 5).is_empty());
        assert_eq!(
            visitor.visited,
            vec![(b"common".to_vec(), 0), (b"rare".to_vec(), 1)]
        );
        assert_eq!(visitor.doc_freqs, vec![(1, 1)]);
    }

    #[test]
    fn wrapped_iterator_matches_native() {
        let docs: Vec<Vec<String>> = (0..40)
            .map(|i| vec![format!("t{:02}", i % 30), format!("t{:02}", (i * 7) % 30)])
            .collect();
        let config = DocTermOrdsConfig::default().with_index_interval_bits(2);
        let native_reader = build(&docs, &[], true);
        let wrapped_reader = build(&docs, &[], false);
        let native = DocTermOrds::uninvert(&native_reader, "field", &config).unwrap();
        let wrapped = DocTermOrds::uninvert(&wrapped_reader, "field", &config).unwrap();
        assert_eq!(wrapped.stats().indexed_terms, 8);
        assert_eq!(native.stats().indexed_terms, 0);

        for doc in 0..40 {
            assert_eq!(doc_ords(&native, doc, 5), doc_ords(&wrapped, doc, 5));
        }

        let mut native_te = native.ord_terms_iterator(&native_reader).unwrap().unwrap();
        let mut wrapped_te = wrapped.ord_terms_iterator(&wrapped_reader).unwrap().unwrap();
        for &ord in &[29i64, 0, 13, 12, 14, 3, 28, 4, 5] {
            assert_eq!(
                native.lookup_term(&mut native_te, ord).unwrap(),
                wrapped.lookup_term(&mut wrapped_te, ord).unwrap()
            );
            assert_eq!(wrapped_te.ord().unwrap(), ord);
        }

        for target in &["t05a", "t00", "t17", "t08", "t03z", "t29", "s"] {
            let target = target.as_bytes();
            let status = native_te.seek_ceil(target).unwrap();
            assert_eq!(wrapped_te.seek_ceil(target).unwrap(), status);
            assert_eq!(wrapped_te.term().unwrap(), native_te.term().unwrap());
            assert_eq!(wrapped_te.ord().unwrap(), native_te.ord().unwrap());
        }
        assert_eq!(wrapped_te.seek_ceil(b"u").unwrap(), SeekStatus::End);

        wrapped_te.seek_exact_ord(9).unwrap();
        assert_eq!(wrapped_te.next().unwrap(), Some(b"t10".to_vec()));
        assert_eq!(wrapped_te.ord().unwrap(), 10);
        assert!(wrapped_te.seek_exact_ord(30).is_err());
    }

    #[test]
    fn compact_rejects_oversized_arena() {
        let pending = vec![PendingSlot::Buffer(1 << 24), PendingSlot::Buffer(1)];
        let buffers = vec![vec![1u8; 1 << 24], vec![2u8; 4]];
        let err = compact("big", pending, buffers).unwrap_err();
        assert!(format!("{}", err).contains("Too many values"));

        let pending = vec![
            PendingSlot::Buffer(2),
            PendingSlot::Inline(0x0302),
            PendingSlot::Buffer(1),
        ];
        let buffers = vec![vec![5u8, 6, 0, 0], vec![], vec![7u8, 0, 0, 0]];
        let (index, tnums) = compact("small", pending, buffers).unwrap();
        assert_eq!(tnums.len(), NUM_BUCKETS);
        assert_eq!(tnums[0], vec![5u8, 6, 0, 7, 0]);
        assert_eq!(
            index,
            vec![
                TermNumSlot::Pointer {
                    bucket: 0,
                    offset: 0
                },
                TermNumSlot::Inline(0x0302),
                TermNumSlot::Pointer {
                    bucket: 0,
                    offset: 3
                },
            ]
        );
    }

    #[test]
    fn vint_encoding() {
        assert_eq!(vint_size(0), 1);
        assert_eq!(vint_size(127), 1);
        assert_eq!(vint_size(128), 2);
        assert_eq!(vint_size(1 << 21), 4);
        assert_eq!(vint_size(u32::max_value()), 5);

        let mut arr = [0u8; 5];
        assert_eq!(write_int(300, &mut arr, 0), 2);
        assert_eq!(&arr[..2], &[0x82, 0x2c]);
    }

    #[test]
    fn concurrent_lookups() {
        let docs: Vec<Vec<String>> = (0..100)
            .map(|i| (0..i % 9).map(|j| format!("v{}", (i + j) % 17)).collect())
            .collect();
        let reader = build(&docs, &[], false);
        let ords = DocTermOrds::uninvert(&reader, "field", &DocTermOrdsConfig::default()).unwrap();
        let expected: Vec<Vec<i32>> = (0..100).map(|doc| doc_ords(&ords, doc, 4)).collect();

        crossbeam::scope(|s| {
            for t in 0..4 {
                let ords = &ords;
                let expected = &expected;
                s.spawn(move |_| {
                    let mut iter = None;
                    let mut buffer = [0i32; 16];
                    for doc in (0..100).rev().skip(t) {
                        let mut it = ords.lookup(doc, iter.take());
                        let n = it.read(&mut buffer);
                        assert_eq!(&buffer[..n], expected[doc as usize].as_slice());
                        iter = Some(it);
                    }
                });
            }
        })
        .unwrap();
    }

    #[test]
    fn config_from_json() {
        let config =
            DocTermOrdsConfig::from_json(r#"{"term_prefix": [98], "index_interval_bits": 4}"#)
                .unwrap();
        assert_eq!(config.term_prefix, Some(b"b".to_vec()));
        assert_eq!(config.index_interval_bits, 4);
        assert_eq!(config.max_term_doc_freq, i32::max_value());
        assert_eq!(
            DocTermOrdsConfig::from_json("{}").unwrap(),
            DocTermOrdsConfig::default()
        );
        assert!(DocTermOrdsConfig::from_json(r#"{"index_interval_bits": 0}"#).is_err());

        let reader = build(&[strings(&["x"])], &[], true);
        let config = DocTermOrdsConfig::default().with_index_interval_bits(32);
        assert!(DocTermOrds::uninvert(&reader, "field", &config).is_err());
    }

    #[test]
    fn stats_serialize() {
        let reader = build(&[strings(&["x", "y"]), strings(&["y"])], &[], false);
        let ords = DocTermOrds::uninvert(&reader, "field", &DocTermOrdsConfig::default()).unwrap();
        let stats = ords.stats();
        assert_eq!(stats.num_terms, 2);
        assert_eq!(stats.term_instances, 3);
        assert_eq!(stats.max_doc, 2);
        assert_eq!(stats.ram_bytes_used, ords.ram_bytes_used());
        let json = stats.to_json().unwrap();
        assert!(json.contains("\"num_terms\":2"));
        assert!(json.contains("\"term_instances\":3"));
    }

    #[test]
    fn sorted_set_values() {
        let docs = vec![
            strings(&["g", "f", "e", "d", "c", "b", "a"]),
            strings(&["c"]),
            vec![],
        ];
        let reader = build(&docs, &[], false);
        let ords = DocTermOrds::uninvert(&reader, "field", &DocTermOrdsConfig::default()).unwrap();
        let mut values = ords.values(&reader).unwrap().unwrap();
        assert_eq!(values.value_count(), 7);

        values.set_document(0);
        let mut seen = vec![];
        loop {
            let ord = values.next_ord();
            if ord == NO_MORE_ORDS {
                break;
            }
            seen.push(ord);
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5, 6]);

        values.set_document(1);
        assert_eq!(values.next_ord(), 2);
        assert_eq!(values.next_ord(), NO_MORE_ORDS);
        values.set_document(2);
        assert_eq!(values.next_ord(), NO_MORE_ORDS);

        assert_eq!(values.lookup_ord(4).unwrap(), b"e".to_vec());
        assert_eq!(values.lookup_term(b"d").unwrap(), 3);
        assert_eq!(values.lookup_term(b"zz").unwrap(), -8);
    }

    #[test]
    fn cache_shares_uninverted_fields() {
        let reader = build(&[strings(&["x"])], &[], true);
        let cache = UninvertedFieldCache::default();
        assert!(cache.is_empty().unwrap());
        let first = cache.get_or_uninvert(&reader, "field").unwrap();
        let second = cache.get_or_uninvert(&reader, "field").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len().unwrap(), 1);

        assert!(cache.evict("field").unwrap().is_some());
        let third = cache.get_or_uninvert(&reader, "field").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn cache_builds_each_field_once_across_threads() {
        let docs: Vec<Vec<String>> = (0..50)
            .map(|i| strings(&[format!("t{:02}", i % 7).as_str()]))
            .collect();
        let reader = build(&docs, &[], true);
        let cache = UninvertedFieldCache::default();

        let results: Vec<Arc<DocTermOrds>> = crossbeam::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let (cache, reader) = (&cache, &reader);
                    s.spawn(move |_| cache.get_or_uninvert(reader, "field").unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
        .unwrap();
        for ords in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], ords));
        }
        assert_eq!(cache.len().unwrap(), 1);
        assert!(cache.building.lock().unwrap().is_empty());
    }

    #[test]
    fn cached_field_readable_while_another_builds() {
        let reader = build(&[strings(&["x"])], &[], true);
        let cache = UninvertedFieldCache::default();
        let built = cache.get_or_uninvert(&reader, "field").unwrap();

        // hold the build lock of a field nobody has built yet
        let pending = cache.field_lock("other").unwrap();
        let _guard = pending.lock().unwrap();
        let fetched = crossbeam::scope(|s| {
            let (cache, reader) = (&cache, &reader);
            s.spawn(move |_| cache.get_or_uninvert(reader, "field").unwrap())
                .join()
                .unwrap()
        })
        .unwrap();
        assert!(Arc::ptr_eq(&built, &fetched));
    }

    #[test]
    fn uninvert_empty_fields() {
        let reader = build(&[strings(&["a"]), strings(&["c"])], &[], false);

        let ords =
            DocTermOrds::uninvert(&reader, "missing", &DocTermOrdsConfig::default()).unwrap();
        assert!(ords.is_empty());
        assert_eq!(ords.num_terms(), 0);
        assert!(doc_ords(&ords, 0, 5).is_empty());
        assert!(ords.ord_terms_iterator(&reader).unwrap().is_none());

        for prefix in &[&b"b"[..], &b"zzz"[..]] {
            let config = DocTermOrdsConfig::default().with_term_prefix(prefix);
            let ords = DocTermOrds::uninvert(&reader, "field", &config).unwrap();
            assert!(ords.is_empty());
            assert_eq!(ords.num_terms(), 0);
            assert!(doc_ords(&ords, 1, 5).is_empty());
            assert!(doc_ords(&ords, 7, 5).is_empty());
        }
    }
}
