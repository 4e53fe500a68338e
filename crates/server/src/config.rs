use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub sequence_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            sequence_file: PathBuf::from("./data/sequence.json"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    sequence_file: Option<PathBuf>,
}

/// Defaults, then `server.toml` in the working directory, then environment.
pub fn load_settings() -> Settings {
    let file_settings = fs::read_to_string(SETTINGS_FILE)
        .ok()
        .and_then(|raw| toml::from_str::<FileSettings>(&raw).ok())
        .unwrap_or_default();
    resolve_settings(file_settings, |key| std::env::var(key).ok())
}

fn resolve_settings(
    file_settings: FileSettings,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(v) = file_settings.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_settings.sequence_file {
        settings.sequence_file = v;
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("SEQUENCE_FILE") {
        settings.sequence_file = PathBuf::from(v);
    }
    if let Some(v) = env("APP__SEQUENCE_FILE") {
        settings.sequence_file = PathBuf::from(v);
    }

    settings
}

/// Makes sure the directory holding the sequence file exists.
pub fn prepare_sequence_path(raw_path: &Path) -> anyhow::Result<PathBuf> {
    let path = if raw_path.as_os_str().is_empty() {
        Settings::default().sequence_file
    } else {
        raw_path.to_path_buf()
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create parent directory '{}' for sequence file '{}'",
                parent.display(),
                path.display()
            )
        })?;
    }

    Ok(path)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
