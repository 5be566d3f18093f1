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

mod merge_state;

pub use self::merge_state::*;

use core::search::Payload;
use core::util::DocId;

use error::Result;

/// A map of doc IDs from one segment's doc id space to the merged segment's.
pub trait DocMap: Send + Sync {
    /// Return the mapped docID or -1 if the given doc is not mapped.
    fn get(&self, doc: DocId) -> Result<DocId>;
}

/// Rewrites the payloads of one segment while its postings are merged.
pub trait PayloadProcessor: Send + Sync {
    /// Process the incoming payload in place. An emptied payload is
    /// written as "no payload".
    fn process(&self, payload: &mut Payload) -> Result<()>;
}
