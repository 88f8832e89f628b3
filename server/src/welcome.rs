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

//! Default connection factory of the `hearth` binary

use hearth_output::{Colour, OutputDocument};
use hearth_service::{ClientConnection, ConnectionFactory, ConnectionId};
use std::sync::Arc;
use tracing::{debug, info};

/// Greets every new connection and shows it the colour chart
#[derive(Debug, Clone)]
pub struct WelcomeFactory {
    server_name: String,
    use_colour: bool,
}

impl WelcomeFactory {
    /// Create a factory greeting connections on behalf of `server_name`
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            use_colour: true,
        }
    }

    /// Send escape sequences or plain text
    pub fn with_colour(mut self, use_colour: bool) -> Self {
        self.use_colour = use_colour;
        self
    }

    /// Document sent to each new connection
    pub fn greeting(&self) -> OutputDocument {
        let mut document = OutputDocument::new();
        document.add_part("Welcome to ", Some(Colour::White), None);
        document.add_part(self.server_name.as_str(), Some(Colour::BrightYellow), None);
        document.add_part("!", Some(Colour::White), None);
        document.new_line();
        document.new_line();
        document.append(&OutputDocument::colour_chart());
        document
    }
}

impl ConnectionFactory for WelcomeFactory {
    fn on_connect(&self, connection: Arc<dyn ClientConnection>) {
        info!(
            connection_id = %connection.id(),
            peer_addr = %connection.address(),
            "Greeting connection"
        );
        connection.set_drain_listener(Arc::new(|id: ConnectionId| {
            debug!(connection_id = %id, "Connection drained");
        }));
        connection.write(self.greeting(), self.use_colour);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_names_the_server() {
        let greeting = WelcomeFactory::new("Ember").greeting();
        let first = greeting.lines().next().unwrap();
        assert_eq!(first.plain_text(), "Welcome to Ember!");
        assert_eq!(
            first.parts().nth(1).and_then(|part| part.foreground()),
            Some(Colour::BrightYellow)
        );
    }

    #[test]
    fn test_greeting_carries_the_chart() {
        let greeting = WelcomeFactory::new("Ember").greeting();
        let chart = OutputDocument::colour_chart();
        assert_eq!(greeting.line_count(), 2 + chart.line_count());
        assert!(greeting.to_string().ends_with(&chart.to_string()));
    }
}
