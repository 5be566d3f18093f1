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

use core::codec::{TermIterator, TermState, Terms};
use core::doc::Term;
use core::index::reader::{IndexReader, LeafReader, LeafReaderContext, LeafTermIterator};

use error::Result;

/// Maintains a `IndexReader` `TermState` view over leaf readers: for
/// each leaf ordinal the term state the term was found with, plus the
/// term's doc_freq and total_term_freq aggregated over all leaves.
pub struct TermContext<S: TermState> {
    states: Vec<Option<S>>,
    doc_freq: i32,
    total_term_freq: i64,
}

impl<S: TermState> TermContext<S> {
    /// Creates an empty `TermContext` sized to the leaves of `reader`.
    pub fn new<IR: IndexReader + ?Sized>(reader: &IR) -> TermContext<S> {
        TermContext {
            states: vec![None; reader.leaves().len()],
            doc_freq: 0,
            total_term_freq: 0,
        }
    }

    /// Creates a `TermContext` with an initial `TermState`, `IndexReader` pair.
    pub fn with_state<IR: IndexReader + ?Sized>(
        reader: &IR,
        state: S,
        ord: usize,
        doc_freq: i32,
        total_term_freq: i64,
    ) -> TermContext<S> {
        let mut ctx = Self::new(reader);
        ctx.register(state, ord, doc_freq, total_term_freq);
        ctx
    }

    /// Creates a `TermContext` from a top-level reader and the given `Term`.
    /// This method will lookup the given term in all of the reader's leaves
    /// and register each of the readers containing the term in the returned
    /// context, using the leaf reader's ordinal.
    pub fn build<IR>(reader: &IR, term: &Term) -> Result<TermContext<S>>
    where
        IR: IndexReader + ?Sized,
        LeafTermIterator<IR::Leaf>: TermIterator<TermState = S>,
    {
        let mut ctx = Self::new(reader);
        for leaf in reader.leaves() {
            if let Some(terms) = leaf.reader.terms(term.field())? {
                let mut terms_iter = terms.iterator()?;
                if terms_iter.seek_exact(&term.bytes)? {
                    let state = terms_iter.term_state()?;
                    let doc_freq = terms_iter.doc_freq()?;
                    let total_term_freq = terms_iter.total_term_freq()?;
                    ctx.register(state, leaf.ord, doc_freq, total_term_freq);
                }
            }
        }
        Ok(ctx)
    }

    /// Clears the `TermContext` internal state and removes all
    /// registered `TermState`s.
    pub fn clear(&mut self) {
        self.doc_freq = 0;
        self.total_term_freq = 0;
        for state in &mut self.states {
            *state = None;
        }
    }

    /// Registers and associates a `TermState` with a leaf ordinal. The
    /// leaf ordinal should be derived from a `LeafReaderContext`'s leaf ord.
    ///
    /// # Panics
    ///
    /// If a state was already registered for `ord`.
    pub fn register(&mut self, state: S, ord: usize, doc_freq: i32, total_term_freq: i64) {
        assert!(ord < self.states.len(), "ord {} out of bounds", ord);
        assert!(
            self.states[ord].is_none(),
            "state for ord: {} already registered",
            ord
        );
        self.doc_freq += doc_freq;
        if self.total_term_freq >= 0 && total_term_freq >= 0 {
            self.total_term_freq += total_term_freq;
        } else {
            self.total_term_freq = -1;
        }
        self.states[ord] = Some(state);
    }

    /// Returns the `TermState` for an leaf ordinal or `None` if no
    /// `TermState` for the ordinal was registered.
    pub fn get(&self, ord: usize) -> Option<&S> {
        self.states.get(ord).and_then(|s| s.as_ref())
    }

    pub fn get_term_state<R: LeafReader>(&self, leaf: &LeafReaderContext<'_, R>) -> Option<&S> {
        self.get(leaf.ord)
    }

    /// Returns the accumulated document frequency of all `TermState`
    /// instances passed to `register`.
    pub fn doc_freq(&self) -> i32 {
        self.doc_freq
    }

    /// Returns the accumulated term frequency of all `TermState`
    /// instances passed to `register`, or -1 if any of them reported -1.
    pub fn total_term_freq(&self) -> i64 {
        self.total_term_freq
    }

    pub fn states(&self) -> &[Option<S>] {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::codec::OrdTermState;
    use core::index::reader::{MemoryLeafReader, MemorySegmentBuilder, MultiReader};
    use core::index::IndexOptions;

    fn reader() -> MultiReader<MemoryLeafReader> {
        let mut a = MemorySegmentBuilder::new(3);
        a.add_term("body", b"cat", 0)
            .add_term("body", b"cat", 0)
            .add_term("body", b"dog", 1)
            .add_term("body", b"cat", 2);
        let mut b = MemorySegmentBuilder::new(2);
        b.add_term("body", b"dog", 0);
        let mut c = MemorySegmentBuilder::new(2);
        c.add_term("body", b"cat", 1);
        MultiReader::new(vec![
            a.build().unwrap(),
            b.build().unwrap(),
            c.build().unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn build_aggregates_over_leaves() {
        let reader = reader();
        let ctx: TermContext<OrdTermState> =
            TermContext::build(&reader, &Term::new("body".into(), b"cat".to_vec())).unwrap();
        assert_eq!(ctx.doc_freq(), 3);
        assert_eq!(ctx.total_term_freq(), 4);
        assert_eq!(ctx.get(0), Some(&OrdTermState { ord: 0 }));
        assert!(ctx.get(1).is_none());
        assert_eq!(ctx.get(2), Some(&OrdTermState { ord: 0 }));
        assert_eq!(ctx.states().len(), 3);

        let leaves = reader.leaves();
        assert!(ctx.get_term_state(&leaves[2]).is_some());

        let missing: TermContext<OrdTermState> =
            TermContext::build(&reader, &Term::new("title".into(), b"cat".to_vec())).unwrap();
        assert_eq!(missing.doc_freq(), 0);
        assert!(missing.states().iter().all(|s| s.is_none()));
    }

    #[test]
    fn total_term_freq_propagates_unknown() {
        let mut a = MemorySegmentBuilder::new(1);
        a.add_term("id", b"x", 0);
        let mut b = MemorySegmentBuilder::new(1);
        b.index_options("id", IndexOptions::Docs).add_term("id", b"x", 0);
        let reader = MultiReader::new(vec![a.build().unwrap(), b.build().unwrap()]).unwrap();

        let mut ctx: TermContext<OrdTermState> =
            TermContext::build(&reader, &Term::new("id".into(), b"x".to_vec())).unwrap();
        assert_eq!(ctx.doc_freq(), 2);
        assert_eq!(ctx.total_term_freq(), -1);

        ctx.clear();
        assert_eq!(ctx.doc_freq(), 0);
        assert_eq!(ctx.total_term_freq(), 0);
        assert!(ctx.get(0).is_none());
    }

    #[test]
    fn with_state_registers_one_leaf() {
        let reader = reader();
        let ctx = TermContext::with_state(&reader, OrdTermState { ord: 7 }, 1, 2, 5);
        assert_eq!(ctx.get(1).map(|s| s.ord()), Some(7));
        assert_eq!(ctx.doc_freq(), 2);
        assert_eq!(ctx.total_term_freq(), 5);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn register_twice_panics() {
        let reader = reader();
        let mut ctx = TermContext::new(&reader);
        ctx.register(OrdTermState { ord: 0 }, 0, 1, 1);
        ctx.register(OrdTermState { ord: 1 }, 0, 1, 1);
    }
}
