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

//! ANSI Colour Table
//!
//! Maps the sixteen symbolic colours used by Hearth output documents onto
//! Select Graphic Rendition (SGR) escape sequences understood by MUD clients.
//!
//! | Colour   | Foreground | Bright Foreground | Background |
//! |----------|------------|-------------------|------------|
//! | Black    | `30`       | `30;1`            | `40`       |
//! | Red      | `31`       | `31;1`            | `41`       |
//! | Green    | `32`       | `32;1`            | `42`       |
//! | Yellow   | `33`       | `33;1`            | `43`       |
//! | Blue     | `34`       | `34;1`            | `44`       |
//! | Magenta  | `35`       | `35;1`            | `45`       |
//! | Cyan     | `36`       | `36;1`            | `46`       |
//! | White    | `37`       | `37;1`            | `47`       |
//!
//! Bright backgrounds are not supported by common MUD clients; requesting one
//! degrades to the matching base background and logs a warning.

mod colour;
mod consts;

pub use self::colour::{Colour, Layer, ParseColourError, encode, reset};
pub use self::consts::{EOL, SGR_PREFIX, SGR_RESET, SGR_SUFFIX};
