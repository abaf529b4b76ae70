use std::io::{self, BufRead, Write};

use log::{error, LevelFilter};

use tsmerge_core::model::config::AdapterConfig;
use tsmerge_core::protocol;

fn main() {
    // stdout carries the protocol; logs go to stderr
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let config = match AdapterConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{e}; using defaults");
            AdapterConfig::default()
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result = std::panic::catch_unwind(|| protocol::handle(&line, &config));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => serde_json::json!({
                "status": "error",
                "message": "internal core error"
            })
            .to_string(),
        };

        if writeln!(stdout, "{response}").is_err() {
            break;
        }

        let _ = stdout.flush();
    }
}
