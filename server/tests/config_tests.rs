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

//! Loading settings from files on disk

use hearth_server::{ServerError, ServerSettings};
use std::path::PathBuf;

fn write_config(name: &str, text: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("hearth-{}-{name}.toml", std::process::id()));
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_load_complete_file() {
    let path = write_config(
        "complete",
        r#"
        serverName = "Ember"
        serverIP = "127.0.0.1"
        telnetPort = 4000
        maxInputLength = 200
        "#,
    );
    let settings = ServerSettings::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(settings.server_name, "Ember");
    assert_eq!(settings.server_ip, "127.0.0.1");
    assert_eq!(settings.telnet_port, 4000);
    assert_eq!(settings.reactor_config().limits.max_input_length, 200);
}

#[test]
fn test_missing_file() {
    let path = std::env::temp_dir().join("hearth-does-not-exist.toml");
    match ServerSettings::load(&path) {
        Err(ServerError::ConfigRead { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_malformed_file() {
    let path = write_config("malformed", "serverIP = [");
    let result = ServerSettings::load(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(ServerError::ConfigParse(_))));
}

#[test]
fn test_file_without_address() {
    let path = write_config("no-address", "serverName = \"Ember\"\ntelnetPort = 23\n");
    let result = ServerSettings::load(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(ServerError::MissingSetting("serverIP"))));
}
