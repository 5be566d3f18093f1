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

use core::codec::Terms;

use error::Result;

use std::sync::Arc;

/// Flex API for access to fields and terms
pub trait Fields {
    type Terms: Terms;
    /// Sorted names of every field with at least one term.
    fn fields(&self) -> Vec<String>;
    fn terms(&self, field: &str) -> Result<Option<Self::Terms>>;
    /// Number of fields, or -1 when unknown.
    fn size(&self) -> i32;
}

impl<F: Fields> Fields for Arc<F> {
    type Terms = F::Terms;
    fn fields(&self) -> Vec<String> {
        (**self).fields()
    }

    fn terms(&self, field: &str) -> Result<Option<Self::Terms>> {
        (**self).terms(field)
    }

    fn size(&self) -> i32 {
        (**self).size()
    }
}
