use std::{collections::HashMap, fs, path::Path};

use tracing::warn;

pub const SETTINGS_FILE: &str = "budget.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub database_url: String,
    pub fetch_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".into(),
            database_url: default_database_url(),
            fetch_timeout_secs: 15,
        }
    }
}

fn default_database_url() -> String {
    match dirs::data_local_dir() {
        Some(base) => {
            let path = base.join("budget_dashboard").join("client.sqlite3");
            normalize_database_url(&path.to_string_lossy())
        }
        None => "sqlite://./data/client.sqlite3".into(),
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

/// Defaults, then the settings file, then environment variables. Later
/// sources win.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("api_url") {
                    settings.api_url = v.clone();
                }
                if let Some(v) = file_cfg.get("database_url") {
                    settings.database_url = normalize_database_url(v);
                }
                if let Some(v) = file_cfg.get("fetch_timeout_secs") {
                    apply_timeout(&mut settings, v);
                }
            }
            Err(err) => warn!("config: ignoring unreadable {} error={err}", path.display()),
        }
    }

    let env = |name: &str| env(name).filter(|value| !value.trim().is_empty());

    if let Some(v) = env("BUDGET_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("BUDGET_DATABASE_URL") {
        settings.database_url = normalize_database_url(&v);
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = normalize_database_url(&v);
    }

    if let Some(v) = env("APP__FETCH_TIMEOUT_SECS") {
        apply_timeout(&mut settings, &v);
    }

    settings
}

fn apply_timeout(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => settings.fetch_timeout_secs = parsed,
        _ => warn!("config: ignoring invalid fetch timeout value={raw}"),
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return default_database_url();
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn normalizes_plain_file_path_to_sqlite_url() {
        assert_eq!(
            normalize_database_url("./data/test.db"),
            "sqlite://./data/test.db"
        );
        assert_eq!(
            normalize_database_url("sqlite::memory:"),
            "sqlite::memory:"
        );
    }

    #[test]
    fn missing_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let settings = load_settings_from(&temp.path().join("absent.toml"), no_env);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn file_values_apply_and_env_overrides_them() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("budget.toml");
        fs::write(
            &path,
            "api_url = \"http://file.example\"\ndatabase_url = \"./data/file.db\"\nfetch_timeout_secs = \"30\"\n",
        )
        .expect("write");

        let from_file = load_settings_from(&path, no_env);
        assert_eq!(from_file.api_url, "http://file.example");
        assert_eq!(from_file.database_url, "sqlite://./data/file.db");
        assert_eq!(from_file.fetch_timeout_secs, 30);

        let overridden = load_settings_from(&path, |name| match name {
            "APP__API_URL" => Some("http://env.example".into()),
            "APP__FETCH_TIMEOUT_SECS" => Some("0".into()),
            _ => None,
        });
        assert_eq!(overridden.api_url, "http://env.example");
        assert_eq!(overridden.fetch_timeout_secs, 30);
    }
}
