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
use hearth_ansicolour::Colour;

/// Width of every swatch in the chart.
const SWATCH_WIDTH: usize = 20;

/// Upper-case colour name repeated to exactly [`SWATCH_WIDTH`] characters.
fn swatch(colour: Colour) -> String {
    let name = colour.to_string().replace('_', "").to_uppercase();
    name.chars().cycle().take(SWATCH_WIDTH).collect()
}

impl OutputDocument {
    /// Sample document showing every foreground colour and every base
    /// background colour, one swatch per line.
    pub fn colour_chart() -> Self {
        let mut chart = Self::with_capacity(26);
        chart.add_part("Foregrounds:", Some(Colour::White), None);
        for colour in Colour::ALL {
            chart.new_line();
            // black text needs a light cell to be visible
            let background = (colour == Colour::Black).then_some(Colour::White);
            chart.add_part(swatch(colour), Some(colour), background);
        }
        chart.new_line();
        chart.add_part("Backgrounds:", Some(Colour::White), None);
        for colour in Colour::ALL.into_iter().filter(|c| !c.is_bright()) {
            chart.new_line();
            let foreground = if colour == Colour::Black {
                Colour::White
            } else {
                Colour::Black
            };
            chart.add_part(swatch(colour), Some(foreground), Some(colour));
        }
        chart
    }
}
