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

use hearth_ansicolour::Colour;
use std::collections::VecDeque;

/// A run of text sharing one foreground and one background colour.
///
/// `None` means "leave the colour unchanged", not "reset".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Part {
    text: String,
    foreground: Option<Colour>,
    background: Option<Colour>,
}

impl Part {
    /// Create a new part
    pub fn new(
        text: impl Into<String>,
        foreground: Option<Colour>,
        background: Option<Colour>,
    ) -> Self {
        Self {
            text: text.into(),
            foreground,
            background,
        }
    }

    /// Create a part without colours
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, None, None)
    }

    /// Get the text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the foreground colour
    pub fn foreground(&self) -> Option<Colour> {
        self.foreground
    }

    /// Get the background colour
    pub fn background(&self) -> Option<Colour> {
        self.background
    }

    /// Check if either colour is set
    pub fn is_coloured(&self) -> bool {
        self.foreground.is_some() || self.background.is_some()
    }
}

/// One output line. An empty line renders as a blank line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Line {
    parts: VecDeque<Part>,
}

impl Line {
    /// Create an empty line
    pub fn new() -> Self {
        Self::default()
    }

    /// Parts in render order
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    /// Number of parts remaining
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if the line has no parts left
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Concatenated text of every part, colours ignored
    pub fn plain_text(&self) -> String {
        self.parts.iter().map(Part::text).collect()
    }

    pub(crate) fn push_back(&mut self, part: Part) {
        self.parts.push_back(part);
    }

    pub(crate) fn push_front(&mut self, part: Part) {
        self.parts.push_front(part);
    }

    pub(crate) fn front(&self) -> Option<&Part> {
        self.parts.front()
    }

    pub(crate) fn pop_front(&mut self) -> Option<Part> {
        self.parts.pop_front()
    }
}

impl FromIterator<Part> for Line {
    fn from_iter<I: IntoIterator<Item = Part>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_accessors() {
        let part = Part::new("hi", Some(Colour::Red), None);
        assert_eq!(part.text(), "hi");
        assert_eq!(part.foreground(), Some(Colour::Red));
        assert_eq!(part.background(), None);
        assert!(part.is_coloured());
        assert!(!Part::plain("x").is_coloured());
    }

    #[test]
    fn test_line_order() {
        let mut line = Line::new();
        line.push_back(Part::plain("b"));
        line.push_front(Part::plain("a"));
        line.push_back(Part::plain("c"));
        assert_eq!(line.plain_text(), "abc");
        assert_eq!(line.len(), 3);
        assert_eq!(line.pop_front(), Some(Part::plain("a")));
        assert_eq!(line.front(), Some(&Part::plain("b")));
    }
}
