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

use crate::consts::SGR_RESET;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

const FOREGROUND_CODES: [&str; 8] = ["30", "31", "32", "33", "34", "35", "36", "37"];
const BRIGHT_FOREGROUND_CODES: [&str; 8] = [
    "30;1", "31;1", "32;1", "33;1", "34;1", "35;1", "36;1", "37;1",
];
const BACKGROUND_CODES: [&str; 8] = ["40", "41", "42", "43", "44", "45", "46", "47"];

const FOREGROUND_SEQUENCES: [&str; 8] = [
    "\x1b[30m", "\x1b[31m", "\x1b[32m", "\x1b[33m", "\x1b[34m", "\x1b[35m", "\x1b[36m", "\x1b[37m",
];
const BRIGHT_FOREGROUND_SEQUENCES: [&str; 8] = [
    "\x1b[30;1m",
    "\x1b[31;1m",
    "\x1b[32;1m",
    "\x1b[33;1m",
    "\x1b[34;1m",
    "\x1b[35;1m",
    "\x1b[36;1m",
    "\x1b[37;1m",
];
const BACKGROUND_SEQUENCES: [&str; 8] = [
    "\x1b[40m", "\x1b[41m", "\x1b[42m", "\x1b[43m", "\x1b[44m", "\x1b[45m", "\x1b[46m", "\x1b[47m",
];

/// Symbolic terminal colour.
///
/// The eight base colours map onto SGR `30`-`37` / `40`-`47`. The bright
/// variants add the bold modifier (`;1`) in the foreground and degrade to the
/// base colour in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Colour {
    /// Black - Colour #0 (FG `30`, BG `40`).
    Black,
    /// Red - Colour #1 (FG `31`, BG `41`).
    Red,
    /// Green - Colour #2 (FG `32`, BG `42`).
    Green,
    /// Yellow - Colour #3 (FG `33`, BG `43`).
    Yellow,
    /// Blue - Colour #4 (FG `34`, BG `44`).
    Blue,
    /// Magenta - Colour #5 (FG `35`, BG `45`).
    Magenta,
    /// Cyan - Colour #6 (FG `36`, BG `46`).
    Cyan,
    /// White - Colour #7 (FG `37`, BG `47`).
    White,

    /// Bright Black (FG `30;1`, BG degrades to `40`).
    BrightBlack,
    /// Bright Red (FG `31;1`, BG degrades to `41`).
    BrightRed,
    /// Bright Green (FG `32;1`, BG degrades to `42`).
    BrightGreen,
    /// Bright Yellow (FG `33;1`, BG degrades to `43`).
    BrightYellow,
    /// Bright Blue (FG `34;1`, BG degrades to `44`).
    BrightBlue,
    /// Bright Magenta (FG `35;1`, BG degrades to `45`).
    BrightMagenta,
    /// Bright Cyan (FG `36;1`, BG degrades to `46`).
    BrightCyan,
    /// Bright White (FG `37;1`, BG degrades to `47`).
    BrightWhite,
}

/// Which half of a character cell a colour applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Text colour
    Foreground,
    /// Cell colour behind the text
    Background,
}

impl Colour {
    /// Every colour, base colours first.
    pub const ALL: [Colour; 16] = [
        Colour::Black,
        Colour::Red,
        Colour::Green,
        Colour::Yellow,
        Colour::Blue,
        Colour::Magenta,
        Colour::Cyan,
        Colour::White,
        Colour::BrightBlack,
        Colour::BrightRed,
        Colour::BrightGreen,
        Colour::BrightYellow,
        Colour::BrightBlue,
        Colour::BrightMagenta,
        Colour::BrightCyan,
        Colour::BrightWhite,
    ];

    /// Returns true for the eight `Bright*` variants.
    pub fn is_bright(self) -> bool {
        matches!(
            self,
            Colour::BrightBlack
                | Colour::BrightRed
                | Colour::BrightGreen
                | Colour::BrightYellow
                | Colour::BrightBlue
                | Colour::BrightMagenta
                | Colour::BrightCyan
                | Colour::BrightWhite
        )
    }

    /// The non-bright colour sharing this colour's hue.
    pub fn base(self) -> Colour {
        Colour::ALL[self.index()]
    }

    fn index(self) -> usize {
        match self {
            Colour::Black | Colour::BrightBlack => 0,
            Colour::Red | Colour::BrightRed => 1,
            Colour::Green | Colour::BrightGreen => 2,
            Colour::Yellow | Colour::BrightYellow => 3,
            Colour::Blue | Colour::BrightBlue => 4,
            Colour::Magenta | Colour::BrightMagenta => 5,
            Colour::Cyan | Colour::BrightCyan => 6,
            Colour::White | Colour::BrightWhite => 7,
        }
    }

    /// Bare SGR parameter text for this colour, e.g. `"31"` or `"31;1"`.
    ///
    /// Unlike [`encode`] this never logs; bright backgrounds silently yield
    /// the base code.
    pub fn sgr_code(self, layer: Layer) -> &'static str {
        match layer {
            Layer::Foreground if self.is_bright() => BRIGHT_FOREGROUND_CODES[self.index()],
            Layer::Foreground => FOREGROUND_CODES[self.index()],
            Layer::Background => BACKGROUND_CODES[self.index()],
        }
    }

    fn name(self) -> &'static str {
        match self {
            Colour::Black => "black",
            Colour::Red => "red",
            Colour::Green => "green",
            Colour::Yellow => "yellow",
            Colour::Blue => "blue",
            Colour::Magenta => "magenta",
            Colour::Cyan => "cyan",
            Colour::White => "white",
            Colour::BrightBlack => "bright_black",
            Colour::BrightRed => "bright_red",
            Colour::BrightGreen => "bright_green",
            Colour::BrightYellow => "bright_yellow",
            Colour::BrightBlue => "bright_blue",
            Colour::BrightMagenta => "bright_magenta",
            Colour::BrightCyan => "bright_cyan",
            Colour::BrightWhite => "bright_white",
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a colour name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown colour name: {0:?}")]
pub struct ParseColourError(pub String);

impl FromStr for Colour {
    type Err = ParseColourError;

    /// Parses a colour name case-insensitively. Word separators (`_`, `-`,
    /// space) are ignored, so `bright_red`, `BrightRed` and `bright-red` are
    /// equivalent. `purple` is accepted for magenta.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let colour = match normalized.as_str() {
            "black" => Colour::Black,
            "red" => Colour::Red,
            "green" => Colour::Green,
            "yellow" => Colour::Yellow,
            "blue" => Colour::Blue,
            "magenta" | "purple" => Colour::Magenta,
            "cyan" => Colour::Cyan,
            "white" => Colour::White,
            "brightblack" => Colour::BrightBlack,
            "brightred" => Colour::BrightRed,
            "brightgreen" => Colour::BrightGreen,
            "brightyellow" => Colour::BrightYellow,
            "brightblue" => Colour::BrightBlue,
            "brightmagenta" | "brightpurple" => Colour::BrightMagenta,
            "brightcyan" => Colour::BrightCyan,
            "brightwhite" => Colour::BrightWhite,
            _ => return Err(ParseColourError(s.to_string())),
        };
        Ok(colour)
    }
}

/// Full escape sequence selecting `colour` on the given `layer`.
///
/// A bright colour requested for the background is rendered with the base
/// colour's code and a warning is logged; no error is raised.
pub fn encode(colour: Colour, layer: Layer) -> &'static str {
    match layer {
        Layer::Foreground if colour.is_bright() => BRIGHT_FOREGROUND_SEQUENCES[colour.index()],
        Layer::Foreground => FOREGROUND_SEQUENCES[colour.index()],
        Layer::Background => {
            if colour.is_bright() {
                warn!(
                    colour = %colour,
                    fallback = %colour.base(),
                    "Bright background colours are unsupported, using base colour"
                );
            }
            BACKGROUND_SEQUENCES[colour.index()]
        }
    }
}

/// Escape sequence resetting all attributes.
pub fn reset() -> &'static str {
    SGR_RESET
}
