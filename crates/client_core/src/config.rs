use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub access_token: Option<String>,
    pub org_id: Option<String>,
    pub page_size: u32,
    pub settling_delay_ms: u64,
    pub deferred_reload_delay_ms: u64,
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080".into(),
            access_token: None,
            org_id: None,
            page_size: 10,
            settling_delay_ms: 1000,
            deferred_reload_delay_ms: 2000,
            event_capacity: 256,
        }
    }
}

impl Settings {
    pub fn table(&self) -> TableSettings {
        TableSettings {
            page_size: self.page_size.max(1),
            settling_delay: Duration::from_millis(self.settling_delay_ms),
            deferred_reload_delay: Duration::from_millis(self.deferred_reload_delay_ms),
            event_capacity: self.event_capacity.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSettings {
    pub page_size: u32,
    pub settling_delay: Duration,
    pub deferred_reload_delay: Duration,
    pub event_capacity: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Settings::default().table()
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    access_token: Option<String>,
    org_id: Option<String>,
    page_size: Option<u32>,
    settling_delay_ms: Option<u64>,
    deferred_reload_delay_ms: Option<u64>,
    event_capacity: Option<usize>,
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            apply_file_settings(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if file_cfg.access_token.is_some() {
        settings.access_token = file_cfg.access_token;
    }
    if file_cfg.org_id.is_some() {
        settings.org_id = file_cfg.org_id;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.settling_delay_ms {
        settings.settling_delay_ms = v;
    }
    if let Some(v) = file_cfg.deferred_reload_delay_ms {
        settings.deferred_reload_delay_ms = v;
    }
    if let Some(v) = file_cfg.event_capacity {
        settings.event_capacity = v;
    }
}

/// Applies `APP__*` overrides. Unparseable numbers are ignored.
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("CONSOLE_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }
    if let Some(v) = lookup("APP__ORG_ID") {
        settings.org_id = Some(v);
    }
    if let Some(parsed) = lookup("APP__PAGE_SIZE").and_then(|v| v.parse::<u32>().ok()) {
        settings.page_size = parsed;
    }
    if let Some(parsed) = lookup("APP__SETTLING_DELAY_MS").and_then(|v| v.parse::<u64>().ok()) {
        settings.settling_delay_ms = parsed;
    }
    if let Some(parsed) =
        lookup("APP__DEFERRED_RELOAD_DELAY_MS").and_then(|v| v.parse::<u64>().ok())
    {
        settings.deferred_reload_delay_ms = parsed;
    }
}
