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

use clap::Parser;
use hearth_server::{RuntimeContext, ServerSettings, Supervisor, WelcomeFactory};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Telnet server for text-based multiplayer games
#[derive(Debug, Parser)]
#[command(name = "hearth", version, about)]
struct Args {
    /// Path of the TOML configuration file
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = match ServerSettings::load(&args.config) {
        Ok(settings) => settings,
        Err(error) => {
            error!(error = %error, "Failed to start up");
            return ExitCode::FAILURE;
        }
    };
    info!(server_name = %settings.server_name, "Bootstrapping");

    let factory = Arc::new(WelcomeFactory::new(settings.server_name.clone()));
    let context = Arc::new(RuntimeContext::new(settings, factory));

    let signal_context = Arc::clone(&context);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal_context.request_shutdown(),
            Err(error) => error!(error = %error, "Failed to listen for Ctrl-C"),
        }
    });

    match Supervisor::new(context).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = %error, "Server stopped");
            ExitCode::FAILURE
        }
    }
}
