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

mod doc_term_ords;

pub use self::doc_term_ords::*;

mod index_options;

pub use self::index_options::*;

pub mod merge;

mod multi_bits;

pub use self::multi_bits::*;

pub mod reader;

mod term_context;

pub use self::term_context::*;

use std::i32;

/// Maximum value of the token position in an indexed field.
pub const INDEX_MAX_POSITION: i32 = i32::MAX - 128;
