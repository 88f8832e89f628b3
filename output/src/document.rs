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

use crate::part::{Line, Part};
use hearth_ansicolour::Colour;
use std::collections::VecDeque;
use std::fmt;

/// Default number of lines reserved by [`OutputDocument::new`].
const DEFAULT_LINE_CAPACITY: usize = 5;

/// Coloured, multi-line output destined for a single connection.
///
/// A fresh document holds one empty line, so the first [`add_part`] lands on
/// it. Consumption ([`advance_part`], [`advance_line`]) is forward only;
/// [`Clone`] yields a fully independent deep copy and is the way to reuse a
/// document.
///
/// [`add_part`]: OutputDocument::add_part
/// [`advance_part`]: OutputDocument::advance_part
/// [`advance_line`]: OutputDocument::advance_line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputDocument {
    lines: VecDeque<Line>,
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDocument {
    /// Create a document containing a single empty line
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LINE_CAPACITY)
    }

    /// Create a document with room for `lines` lines before reallocating
    pub fn with_capacity(lines: usize) -> Self {
        let mut deque = VecDeque::with_capacity(lines.max(1));
        deque.push_back(Line::new());
        Self { lines: deque }
    }

    /// Create a document holding one uncoloured part
    pub fn from_text(text: impl Into<String>) -> Self {
        let mut document = Self::with_capacity(1);
        document.add_text(text);
        document
    }

    /// Create a document holding one part
    pub fn from_part(
        text: impl Into<String>,
        foreground: Option<Colour>,
        background: Option<Colour>,
    ) -> Self {
        let mut document = Self::with_capacity(1);
        document.add_part(text, foreground, background);
        document
    }

    // Composition

    /// Start a new, empty line at the end of the document
    pub fn new_line(&mut self) {
        self.lines.push_back(Line::new());
    }

    /// Insert a new, empty line at the head of the document
    pub fn new_line_at_start(&mut self) {
        self.lines.push_front(Line::new());
    }

    /// Add a part to the end of the last line
    pub fn add_part(
        &mut self,
        text: impl Into<String>,
        foreground: Option<Colour>,
        background: Option<Colour>,
    ) {
        self.push_part(Part::new(text, foreground, background), false);
    }

    /// Add a part to the front of the first line
    pub fn add_part_at_start(
        &mut self,
        text: impl Into<String>,
        foreground: Option<Colour>,
        background: Option<Colour>,
    ) {
        self.push_part(Part::new(text, foreground, background), true);
    }

    /// Add an uncoloured part to the end of the last line
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.push_part(Part::plain(text), false);
    }

    fn push_part(&mut self, part: Part, at_start: bool) {
        if self.lines.is_empty() {
            self.new_line();
        }
        let line = if at_start {
            self.lines.front_mut()
        } else {
            self.lines.back_mut()
        };
        if let Some(line) = line {
            if at_start {
                line.push_front(part);
            } else {
                line.push_back(part);
            }
        }
    }

    /// Copy every part of `other` onto the end of this document.
    ///
    /// The first line of `other` continues this document's last line; each
    /// further line of `other` starts a new line. Add an empty line to
    /// `other` beforehand to keep it on a line of its own.
    pub fn append(&mut self, other: &OutputDocument) {
        let mut lines = other.lines.iter().peekable();
        while let Some(line) = lines.next() {
            for part in line.parts() {
                self.push_part(part.clone(), false);
            }
            if lines.peek().is_some() {
                self.new_line();
            }
        }
    }

    /// Copy every part of `other` onto the front of this document.
    ///
    /// Lines of `other` are walked last to first and their parts last to
    /// first, each inserted at the head; the last line of `other` therefore
    /// ends up in front of this document's first line, and the remaining
    /// lines of `other` precede it in their original order.
    pub fn append_at_start(&mut self, other: &OutputDocument) {
        let mut lines = other.lines.iter().rev().peekable();
        while let Some(line) = lines.next() {
            let parts: Vec<&Part> = line.parts().collect();
            for part in parts.into_iter().rev() {
                self.push_part(part.clone(), true);
            }
            if lines.peek().is_some() {
                self.new_line_at_start();
            }
        }
    }

    // Consumption

    /// Check if any line remains to be consumed
    pub fn has_more_lines(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Check if the current line has any part left
    pub fn has_more_parts_in_current_line(&self) -> bool {
        self.lines.front().is_some_and(|line| !line.is_empty())
    }

    /// Current part of the current line, if any
    pub fn current_part(&self) -> Option<&Part> {
        self.lines.front().and_then(Line::front)
    }

    /// Discard the current part. Does nothing past the end.
    pub fn advance_part(&mut self) {
        if let Some(line) = self.lines.front_mut() {
            line.pop_front();
        }
    }

    /// Discard the current line, including any parts left on it. Does
    /// nothing past the end.
    pub fn advance_line(&mut self) {
        self.lines.pop_front();
    }

    // Inspection

    /// Number of lines remaining
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Remaining lines in render order
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }
}

impl fmt::Display for OutputDocument {
    /// Plain text of the remaining lines joined by `\n`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            for part in line.parts() {
                f.write_str(part.text())?;
            }
        }
        Ok(())
    }
}

impl From<&str> for OutputDocument {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for OutputDocument {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}
