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

use core::search::{DocIterator, Payload};
use error::Result;

pub struct PostingIteratorFlags;

/// flags constants and helper function defined for `TermIterator::docs()`
/// and `TermIterator::docs_and_positions()`.
impl PostingIteratorFlags {
    /// Flag to pass to `TermIterator::docs` if you don't
    /// require term frequencies in the returned iterator.
    pub const NONE: u16 = 0;

    /// Flag to pass to `TermIterator::docs`
    /// if you require term frequencies in the returned iterator.
    pub const FREQS: u16 = 1 << 3;

    /// Positions are implied by `TermIterator::docs_and_positions`; this flag
    /// only asks for them.
    pub const POSITIONS: u16 = Self::FREQS | 1 << 4;

    /// Flag to pass to `TermIterator::docs_and_positions`
    /// if you require offsets in the returned iterator.
    pub const OFFSETS: u16 = Self::POSITIONS | 1 << 5;

    /// Flag to pass to `TermIterator::docs_and_positions`
    /// if you require payloads in the returned iterator.
    pub const PAYLOADS: u16 = Self::POSITIONS | 1 << 6;

    /// positions, payloads and offsets.
    pub const ALL: u16 = Self::OFFSETS | Self::PAYLOADS;
}

/// Iterates through the postings.
///
/// NOTE: you must first call `next()` before using any of the per-doc methods.
pub trait PostingIterator: DocIterator {
    /// Returns term frequency in the current document, or 1 if the field was
    /// indexed without frequencies. Do not call this before
    /// `next()` is first called, nor after `next()` returns `NO_MORE_DOCS`.
    fn freq(&self) -> Result<i32>;

    /// Returns the next position, or -1 if positions were not indexed.
    /// Calling this more than `freq()` times is undefined.
    fn next_position(&mut self) -> Result<i32>;

    /// Returns start offset for the current position, or -1
    /// if offsets were not indexed.
    fn start_offset(&self) -> Result<i32>;

    /// Returns end offset for the current position, or -1 if
    /// offsets were not indexed.
    fn end_offset(&self) -> Result<i32>;

    /// Returns the payload at this position, or an empty payload if no
    /// payload was indexed.
    fn payload(&self) -> Result<Payload>;
}
