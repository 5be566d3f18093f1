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

use std::cmp::Ordering;

/// A field name paired with the raw bytes of one of its terms. This is the
/// key used to gather per-segment term states across a composite reader.
#[derive(Clone, Debug, PartialEq, Hash, Eq)]
pub struct Term {
    pub field: String,
    pub bytes: Vec<u8>,
}

impl Term {
    pub fn new(field: String, bytes: Vec<u8>) -> Term {
        Term { field, bytes }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Terms sort by field name first, then by unsigned byte order.
impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.field
            .cmp(&other.field)
            .then_with(|| self.bytes.cmp(&other.bytes))
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_ordering_by_field_then_bytes() {
        let a = Term::new("body".into(), b"zoo".to_vec());
        let b = Term::new("title".into(), b"ant".to_vec());
        let c = Term::new("title".into(), vec![0xff]);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(c.field(), "title");
    }
}
