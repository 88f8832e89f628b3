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

use crate::document::OutputDocument;
use crate::part::Part;
use hearth_ansicolour::{Layer, encode, reset};

/// Append the wire text of one part to `out`.
///
/// With `use_colour` a coloured part is written as foreground escape,
/// background escape, text, reset. Escapes for absent colours are omitted
/// and an uncoloured part gets no reset.
pub fn write_part(out: &mut String, part: &Part, use_colour: bool) {
    if use_colour {
        if let Some(foreground) = part.foreground() {
            out.push_str(encode(foreground, Layer::Foreground));
        }
        if let Some(background) = part.background() {
            out.push_str(encode(background, Layer::Background));
        }
    }
    out.push_str(part.text());
    if use_colour && part.is_coloured() {
        out.push_str(reset());
    }
}

/// Consume every part of the document's current line and return its wire
/// text, without the line terminator.
///
/// The line itself stays in place; call [`OutputDocument::advance_line`]
/// afterwards. Returns an empty string once the document is exhausted.
pub fn render_line(document: &mut OutputDocument, use_colour: bool) -> String {
    let mut out = String::new();
    while let Some(part) = document.current_part() {
        write_part(&mut out, part, use_colour);
        document.advance_part();
    }
    out
}

impl OutputDocument {
    /// Render every remaining line, each terminated by `eol`, consuming the
    /// document.
    pub fn render(&mut self, use_colour: bool, eol: &str) -> String {
        let mut out = String::new();
        while self.has_more_lines() {
            out.push_str(&render_line(self, use_colour));
            out.push_str(eol);
            self.advance_line();
        }
        out
    }
}
