use chrono::Utc;
use std::{fs, path::Path};

/// Libraries whose versions are reported by `--version`.
const REPORTED_DEPS: [(&str, &str); 3] = [
    ("serialport", "UARTLINE_SERIALPORT_VERSION"),
    ("ratatui", "UARTLINE_RATATUI_VERSION"),
    ("crossterm", "UARTLINE_CROSSTERM_VERSION"),
];

fn main() {
    // Respect reproducible builds when the packager pins the timestamp
    let build_date = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    println!(
        "cargo:rustc-env=UARTLINE_BUILD_DATE={}",
        build_date.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let deps = fs::read_to_string(Path::new(&manifest_dir).join("Cargo.toml"))
        .ok()
        .and_then(|s| toml::from_str::<toml::Value>(&s).ok())
        .and_then(|v| v.get("workspace")?.get("dependencies").cloned());

    for (name, env) in REPORTED_DEPS {
        let version = deps
            .as_ref()
            .and_then(|d| d.get(name))
            .and_then(|val| match val {
                toml::Value::String(s) => Some(s.as_str()),
                toml::Value::Table(t) => t.get("version").and_then(|x| x.as_str()),
                _ => None,
            })
            .map(|v| v.trim_start_matches(['^', '=', '~']).to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("cargo:rustc-env={env}={version}");
    }

    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=build.rs");
}
