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

use core::codec::{Fields, TermIterator, Terms};
use core::util::{BitsRef, DocId};

use error::Result;

/// The terms of `field` as exposed by leaf reader `R`.
pub type LeafTerms<R> = <<R as LeafReader>::Fields as Fields>::Terms;

/// Term iterator over the terms of a leaf reader `R`.
pub type LeafTermIterator<R> = <LeafTerms<R> as Terms>::Iterator;

/// Postings produced by the term iterators of leaf reader `R`.
pub type LeafPostings<R> = <LeafTermIterator<R> as TermIterator>::Postings;

/// `LeafReader` is an abstract class, providing an interface for accessing an
/// index.  Search of an index is done entirely through this abstract interface,
/// so that any subclass which implements it is searchable. `IndexReader`s
/// implemented by this subclass do not consist of several sub-readers, they
/// are atomic. They support retrieval of stored fields, doc values, terms,
/// and postings.
///
/// For efficiency, in this API documents are often referred to via
/// *document numbers*, non-negative integers which each name a unique
/// document in the index.
pub trait LeafReader {
    type Fields: Fields;

    /// Returns `Fields` for this reader.
    fn fields(&self) -> Result<Self::Fields>;

    /// Returns the `Terms` for `field`, or `None` if the field has no terms.
    fn terms(&self, field: &str) -> Result<Option<<Self::Fields as Fields>::Terms>> {
        self.fields()?.terms(field)
    }

    /// Returns one greater than the largest possible document number.
    fn max_doc(&self) -> i32;

    /// Returns the number of live documents.
    fn num_docs(&self) -> i32;

    /// Returns the `Bits` representing live (not deleted) docs. A set bit
    /// indicates the doc ID has not been deleted. If this method returns
    /// `None` it means there are no deleted documents (all documents are
    /// live).
    fn live_docs(&self) -> Option<BitsRef>;

    fn has_deletions(&self) -> bool {
        self.num_docs() < self.max_doc()
    }
}

/// `LeafReaderContext` represents a leaf reader within a composite reader.
pub struct LeafReaderContext<'a, R: LeafReader + 'a> {
    /// ord in parent
    pub ord: usize,
    /// doc base in parent
    pub doc_base: DocId,
    pub reader: &'a R,
}

impl<'a, R: LeafReader + 'a> LeafReaderContext<'a, R> {
    pub fn new(reader: &'a R, ord: usize, doc_base: DocId) -> Self {
        LeafReaderContext {
            ord,
            doc_base,
            reader,
        }
    }

    #[inline]
    pub fn doc_base(&self) -> DocId {
        self.doc_base
    }
}

impl<'a, R: LeafReader + 'a> Clone for LeafReaderContext<'a, R> {
    fn clone(&self) -> Self {
        LeafReaderContext {
            ord: self.ord,
            doc_base: self.doc_base,
            reader: self.reader,
        }
    }
}
