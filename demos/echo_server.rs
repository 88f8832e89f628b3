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

//! Echo Server Example
//!
//! This example demonstrates the reactor on its own:
//! - Accepts connections on port 2323
//! - Echoes back every line received, in colour
//! - Closes the connection gracefully on `quit`
//!
//! ## Usage
//!
//! Run the server:
//! ```bash
//! cargo run --example echo_server
//! ```
//!
//! Connect with a telnet client:
//! ```bash
//! telnet localhost 2323
//! ```

use hearth_output::{Colour, OutputDocument};
use hearth_service::{ClientConnection, Reactor, ReactorConfig};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("Starting Hearth Echo Server on 127.0.0.1:2323");
    println!("Connect with: telnet localhost 2323");
    println!("Press Ctrl+C to stop the server\n");

    let (sender, receiver) = mpsc::channel();
    let factory = Arc::new(move |connection: Arc<dyn ClientConnection>| {
        let mut welcome = OutputDocument::new();
        welcome.add_part("Welcome to the Hearth echo server!", Some(Colour::BrightCyan), None);
        welcome.new_line();
        welcome.add_part("Type 'quit' to disconnect.", Some(Colour::Yellow), None);
        connection.write(welcome, true);
        if let Err(error) = sender.send(connection) {
            tracing::warn!(connection_id = %error.0.id(), "Echo loop gone, closing connection");
            error.0.close();
        }
    });

    let reactor = Reactor::start(ReactorConfig::new("127.0.0.1", 2323), factory)?;
    reactor.handle().set_accepting(true);
    thread::spawn(move || echo(receiver));

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down server...");

    reactor.handle().set_accepting(false);
    reactor.handle().stop();
    tokio::task::spawn_blocking(move || reactor.join()).await??;
    println!("Server stopped");

    Ok(())
}

/// Application loop: polls every connection for input and echoes it back
fn echo(receiver: Receiver<Arc<dyn ClientConnection>>) {
    let mut connections: Vec<Arc<dyn ClientConnection>> = Vec::new();
    loop {
        connections.extend(receiver.try_iter());
        connections.retain(|connection| connection.state().is_open());

        for connection in &connections {
            while let Some(line) = connection.read_line() {
                if line.trim().eq_ignore_ascii_case("quit") {
                    connection.write(OutputDocument::from_text("Goodbye!"), true);
                    connection.shutdown();
                    break;
                }
                let mut reply = OutputDocument::new();
                reply.add_part("You said: ", Some(Colour::Green), None);
                reply.add_part(line, Some(Colour::BrightWhite), None);
                connection.write(reply, true);
            }
        }

        thread::sleep(Duration::from_millis(20));
    }
}
