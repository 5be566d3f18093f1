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

use core::search::PostingIterator;
use core::util::BitsRef;

use error::ErrorKind::{IllegalArgument, UnsupportedOperation};
use error::Result;

use std::sync::Arc;

/// Encapsulates all required internal state to position the associated
/// `TermIterator` without re-seeking
pub trait TermState: Send + Sync + Clone {}

/// for `TermIterator`s that aren't support `TermState`.
impl TermState for () {}

/// An ordinal based `TermState`
#[derive(Clone, Debug, PartialEq)]
pub struct OrdTermState {
    /// Term ordinal, i.e. its position in the full list of sorted terms
    pub ord: i64,
}

impl OrdTermState {
    pub fn ord(&self) -> i64 {
        self.ord
    }
}

impl TermState for OrdTermState {}

/// Access to the terms in a specific field.  See `Fields`.
pub trait Terms {
    type Iterator: TermIterator;
    /// Returns an iterator that will step through all terms.
    fn iterator(&self) -> Result<Self::Iterator>;

    /// Returns the number of terms for this field, or -1 if this
    /// measure isn't stored by the codec. Note that, just like
    /// other term measures, this measure does not take deleted
    /// documents into account.
    fn size(&self) -> Result<i64>;

    /// Returns the sum of `TermIterator::total_term_freq` for
    /// all terms in this field, or -1 if this measure isn't
    /// stored by the codec (or if this fields omits term freq
    /// and positions).
    fn sum_total_term_freq(&self) -> Result<i64>;

    /// Returns the sum of `TermIterator::doc_freq` for
    /// all terms in this field, or -1 if this measure isn't
    /// stored by the codec.
    fn sum_doc_freq(&self) -> Result<i64>;

    /// Returns the number of documents that have at least one
    /// term for this field, or -1 if this measure isn't
    /// stored by the codec.
    fn doc_count(&self) -> Result<i32>;

    /// Returns true if documents in this field store
    /// per-document term frequency (`PostingIterator::freq`).
    fn has_freqs(&self) -> Result<bool>;

    /// Returns true if documents in this field store offsets.
    fn has_offsets(&self) -> Result<bool>;

    /// Returns true if documents in this field store positions.
    fn has_positions(&self) -> Result<bool>;

    /// Returns true if documents in this field store payloads.
    fn has_payloads(&self) -> Result<bool>;
}

impl<T: Terms> Terms for Arc<T> {
    type Iterator = T::Iterator;
    fn iterator(&self) -> Result<Self::Iterator> {
        (**self).iterator()
    }

    fn size(&self) -> Result<i64> {
        (**self).size()
    }

    fn sum_total_term_freq(&self) -> Result<i64> {
        (**self).sum_total_term_freq()
    }

    fn sum_doc_freq(&self) -> Result<i64> {
        (**self).sum_doc_freq()
    }

    fn doc_count(&self) -> Result<i32> {
        (**self).doc_count()
    }

    fn has_freqs(&self) -> Result<bool> {
        (**self).has_freqs()
    }

    fn has_offsets(&self) -> Result<bool> {
        (**self).has_offsets()
    }

    fn has_positions(&self) -> Result<bool> {
        (**self).has_positions()
    }

    fn has_payloads(&self) -> Result<bool> {
        (**self).has_payloads()
    }
}

/// Represents returned result from `TermIterator::seek_ceil`.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum SeekStatus {
    /// The term was not found, and the end of iteration was hit.
    End,
    /// The precise term was found.
    Found,
    /// A different term was found after the requested term
    NotFound,
}

/// Iterator to seek (`seek_ceil`, `seek_exact`) or step through
/// (`next`) terms to obtain the term bytes, frequency information
/// (`doc_freq`, `total_term_freq`) or postings for the current term.
///
/// The term iterator is unpositioned when first obtained; call `next` or
/// one of the seek methods first.
pub trait TermIterator {
    type Postings: PostingIterator;
    type TermState: TermState;

    /// Increments the iteration to the next term in the iterator.
    /// Returns the resulting term or `None` if the end of
    /// the iterator is reached. After this method returns `None`,
    /// do not call it again: the results are undefined.
    fn next(&mut self) -> Result<Option<Vec<u8>>>;

    /// Attempts to seek to the exact term, returning
    /// true if the term is found.  If this returns false, the
    /// iterator is unpositioned.
    fn seek_exact(&mut self, text: &[u8]) -> Result<bool> {
        Ok(match self.seek_ceil(text)? {
            SeekStatus::Found => true,
            _ => false,
        })
    }

    /// Seeks to the specified term, if it exists, or to the
    /// next (ceiling) term.  Returns SeekStatus to
    /// indicate whether exact term was found, a different
    /// term was found, or EOF was hit.  The target term may
    /// be before or after the current term.  If this returns
    /// `SeekStatus::End`, the iterator is unpositioned.
    fn seek_ceil(&mut self, text: &[u8]) -> Result<SeekStatus>;

    /// Seeks to the specified term by ordinal (position) as
    /// previously returned by `ord`.  The target ord
    /// may be before or after the current ord, and must be
    /// within bounds.
    fn seek_exact_ord(&mut self, ord: i64) -> Result<()>;

    fn seek_exact_state(&mut self, text: &[u8], _state: &Self::TermState) -> Result<()> {
        self.seek_exact(text).and_then(|r| {
            if r {
                Ok(())
            } else {
                bail!(IllegalArgument(format!("Term {:?} does not exist", text)))
            }
        })
    }

    /// Returns current term. Do not call this when the iterator
    /// is unpositioned.
    fn term(&self) -> Result<&[u8]>;

    /// Returns ordinal position for current term.  This is an
    /// optional method (the codec may fail with `UnsupportedOperation`).
    /// Do not call this when the iterator is unpositioned.
    fn ord(&self) -> Result<i64>;

    /// Returns the number of documents containing the current
    /// term.  Do not call this when the iterator is unpositioned.
    fn doc_freq(&mut self) -> Result<i32>;

    /// Returns the total number of occurrences of this term
    /// across all documents (the sum of the freq() for each
    /// doc that has this term).  This will be -1 if the
    /// codec doesn't support this measure.  Note that, like
    /// other term measures, this measure does not take
    /// deleted documents into account.
    fn total_term_freq(&mut self) -> Result<i64>;

    /// Get the postings for the current term, skipping documents not set in
    /// `live_docs`.  Do not call this when the iterator is unpositioned.
    ///
    /// `flags` is a combination of `PostingIteratorFlags`; positions are only
    /// guaranteed through `docs_and_positions`.
    fn docs(&mut self, live_docs: Option<BitsRef>, flags: u16) -> Result<Self::Postings>;

    /// Get the positional postings for the current term, or `None` if
    /// positions were not indexed for this field.
    fn docs_and_positions(
        &mut self,
        live_docs: Option<BitsRef>,
        flags: u16,
    ) -> Result<Option<Self::Postings>>;

    /// Expert: Returns the iterator's internal state to position it
    /// without re-seeking the term dictionary.
    fn term_state(&mut self) -> Result<Self::TermState> {
        bail!(UnsupportedOperation(
            "TermIterator::term_state unsupported".into()
        ))
    }

    // whether this Iterator is EmptyIterator
    fn is_empty(&self) -> bool {
        false
    }
}
