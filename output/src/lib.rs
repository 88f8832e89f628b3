//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Output Documents
//!
//! An [`OutputDocument`] is the unit of output an application hands to a
//! connection: an ordered list of [`Line`]s, each an ordered list of
//! coloured [`Part`]s.
//!
//! ```text
//! OutputDocument
//!     ├── Line ── Part("You see ", None, None) ── Part("a dragon", Some(Red), None)
//!     └── Line ── Part("> ", Some(BrightWhite), None)
//! ```
//!
//! Documents are consumed destructively by [`render_line`]: once a part or a
//! line has been read it is gone. Clone a document first if the same output
//! must go to several connections.

mod chart;
mod document;
mod part;
mod render;

pub use self::document::OutputDocument;
pub use self::part::{Line, Part};
pub use self::render::{render_line, write_part};
pub use hearth_ansicolour::{Colour, Layer};
