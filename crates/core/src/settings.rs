use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use ingpt_llm::{DEFAULT_GEMINI_MODEL, ProviderConfig, default_model_for};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::{ResultExt, Snafu};

use crate::playback::DEFAULT_TYPING_INTERVAL;

pub const DEFAULT_PROVIDER_ID: &str = "gemini";
pub const SETTINGS_DIRECTORY_NAME: &str = "ingpt";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const ENV_PREFIX: &str = "INGPT_";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    pub fn name(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_typing_interval_ms")]
    pub typing_interval_ms: u64,
    #[serde(
        default,
        serialize_with = "serialize_theme_mode",
        deserialize_with = "deserialize_theme_mode"
    )]
    pub theme_mode: ThemePreference,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            provider_id: default_provider_id(),
            api_key: String::new(),
            endpoint: String::new(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            typing_interval_ms: default_typing_interval_ms(),
            theme_mode: ThemePreference::default(),
        }
    }
}

impl AppSettings {
    /// Layers defaults, the JSON file, the provider key alias and `INGPT_*` variables.
    pub fn figment(path: &Path) -> Figment {
        let layered = Figment::from(Serialized::defaults(AppSettings::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(ENV_PREFIX));

        let provider_id = layered
            .extract_inner::<String>("provider_id")
            .unwrap_or_else(|_| default_provider_id());
        let alias = api_key_env_alias(&provider_id);

        Figment::from(Serialized::defaults(AppSettings::default()))
            .merge(Json::file(path))
            .merge(Env::raw().only(&[alias]).map(|_| "api_key".into()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Never fails; malformed sources are logged and replaced by defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(path = ?path, "settings file not found, using defaults and environment");
        }

        match Self::figment(path).extract::<AppSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(path = ?path, %error, "failed to parse settings, using defaults");
                AppSettings::default()
            }
        }
    }

    /// Defaults plus the JSON file only, without any environment values.
    pub fn load_file_layer(path: &Path) -> Result<Self, SettingsError> {
        let settings = Figment::from(Serialized::defaults(AppSettings::default()))
            .merge(Json::file(path))
            .extract::<AppSettings>()
            .map_err(Box::new)
            .context(ParseConfigSnafu {
                stage: "extract-settings-file-layer",
                path: path.to_path_buf(),
            })?;

        Ok(settings.normalized())
    }

    pub fn normalized(mut self) -> Self {
        self.provider_id = if self.provider_id.trim().is_empty() {
            default_provider_id()
        } else {
            self.provider_id.trim().to_ascii_lowercase()
        };
        self.api_key = self.api_key.trim().to_string();
        self.endpoint = self.endpoint.trim().to_string();
        self.model = self.model.trim().to_string();
        if self.model.is_empty() {
            self.model = default_model_for(&self.provider_id).to_string();
        }
        if self.typing_interval_ms == 0 {
            self.typing_interval_ms = default_typing_interval_ms();
        }

        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn to_provider_config(&self) -> Option<ProviderConfig> {
        if !self.is_configured() {
            return None;
        }

        Some(ProviderConfig::new(
            &self.provider_id,
            &self.api_key,
            &self.endpoint,
        ))
    }

    pub fn typing_interval(&self) -> Duration {
        if self.typing_interval_ms == 0 {
            DEFAULT_TYPING_INTERVAL
        } else {
            Duration::from_millis(self.typing_interval_ms)
        }
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<AppSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".ingpt"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = AppSettings::load_from(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.settings.load_full()
    }

    /// Re-reads every source and swaps the live copy.
    pub fn reload(&self) -> Arc<AppSettings> {
        let settings = Arc::new(AppSettings::load_from(&self.config_path));
        self.settings.store(settings.clone());
        settings
    }

    /// Writes only the theme back to the file, so keys taken from the environment stay out of it.
    /// A file that no longer parses is left untouched.
    pub fn set_theme_mode(
        &self,
        theme_mode: ThemePreference,
    ) -> Result<Arc<AppSettings>, SettingsError> {
        let mut stored = AppSettings::load_file_layer(&self.config_path)?;
        stored.theme_mode = theme_mode;
        self.persist(&stored)?;
        Ok(self.reload())
    }

    fn persist(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!(path = ?self.config_path, "saved settings");
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to parse settings file at {path:?} on `{stage}`: {source}"))]
    ParseConfig {
        stage: &'static str,
        path: PathBuf,
        source: Box<figment::Error>,
    },
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

fn api_key_env_alias(provider_id: &str) -> &'static str {
    match provider_id.trim().to_ascii_lowercase().as_str() {
        "openai" | "rig-openai" => OPENAI_API_KEY_ENV,
        _ => GEMINI_API_KEY_ENV,
    }
}

fn default_provider_id() -> String {
    DEFAULT_PROVIDER_ID.to_string()
}

fn default_typing_interval_ms() -> u64 {
    DEFAULT_TYPING_INTERVAL.as_millis() as u64
}

fn serialize_theme_mode<S>(value: &ThemePreference, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.name())
}

fn deserialize_theme_mode<'de, D>(deserializer: D) -> Result<ThemePreference, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(parse_theme_mode(&value))
}

fn parse_theme_mode(value: &str) -> ThemePreference {
    if value.trim().eq_ignore_ascii_case("dark") {
        ThemePreference::Dark
    } else {
        ThemePreference::Light
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use ingpt_llm::DEFAULT_OPENAI_MODEL;

    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        Jail::expect_with(|jail| {
            jail.set_env(GEMINI_API_KEY_ENV, "");
            let settings = AppSettings::load_from(Path::new("missing.json"));

            assert_eq!(settings.provider_id, "gemini");
            assert_eq!(settings.model, DEFAULT_GEMINI_MODEL);
            assert_eq!(settings.typing_interval(), Duration::from_millis(10));
            assert!(!settings.is_configured());
            assert_eq!(settings.to_provider_config(), None);
            Ok(())
        });
    }

    #[test]
    fn file_values_are_normalized() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "settings.json",
                r#"{
                    "provider_id": " OpenAI ",
                    "api_key": "  sk-test  ",
                    "model": "",
                    "typing_interval_ms": 0,
                    "theme_mode": "Dark"
                }"#,
            )?;
            jail.set_env(OPENAI_API_KEY_ENV, "");
            jail.set_env("INGPT_API_KEY", "");

            let settings = AppSettings::load_from(Path::new("settings.json"));

            assert_eq!(settings.provider_id, "openai");
            assert_eq!(settings.model, DEFAULT_OPENAI_MODEL);
            assert_eq!(settings.typing_interval_ms, 10);
            assert_eq!(settings.theme_mode, ThemePreference::Dark);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file_and_alias() {
        Jail::expect_with(|jail| {
            jail.create_file("settings.json", r#"{ "api_key": "from-file" }"#)?;
            jail.set_env(GEMINI_API_KEY_ENV, "from-alias");

            let aliased = AppSettings::load_from(Path::new("settings.json"));
            assert_eq!(aliased.api_key, "from-alias");

            jail.set_env("INGPT_API_KEY", "from-prefixed");
            jail.set_env("INGPT_MODEL", "gemini-1.5-pro");

            let prefixed = AppSettings::load_from(Path::new("settings.json"));
            assert_eq!(prefixed.api_key, "from-prefixed");
            assert_eq!(prefixed.model, "gemini-1.5-pro");
            assert_eq!(
                prefixed.to_provider_config(),
                Some(ProviderConfig::new("gemini", "from-prefixed", ""))
            );
            Ok(())
        });
    }

    #[test]
    fn theme_change_creates_the_file_and_swaps_live_copy() {
        Jail::expect_with(|jail| {
            jail.set_env(GEMINI_API_KEY_ENV, "");
            jail.set_env("INGPT_API_KEY", "");
            let path = jail.directory().join("nested").join(SETTINGS_FILE_NAME);
            let store = SettingsStore::new(path.clone());
            assert_eq!(store.settings().theme_mode, ThemePreference::Light);

            if let Err(error) = store.set_theme_mode(ThemePreference::Dark) {
                panic!("theme should persist: {error}");
            }

            assert!(path.exists());
            assert_eq!(store.settings().theme_mode, ThemePreference::Dark);
            assert_eq!(store.reload().theme_mode, ThemePreference::Dark);
            Ok(())
        });
    }

    #[test]
    fn theme_change_leaves_a_malformed_file_alone() {
        Jail::expect_with(|jail| {
            let broken = r#"{ "api_key": "keep-me", "model": "#;
            jail.create_file(SETTINGS_FILE_NAME, broken)?;
            jail.set_env(GEMINI_API_KEY_ENV, "");
            jail.set_env("INGPT_API_KEY", "");
            let store = SettingsStore::new(jail.directory().join(SETTINGS_FILE_NAME));

            let result = store.set_theme_mode(ThemePreference::Dark);
            assert!(matches!(result, Err(SettingsError::ParseConfig { .. })));
            assert_eq!(store.settings().theme_mode, ThemePreference::Light);

            let on_disk = std::fs::read_to_string(jail.directory().join(SETTINGS_FILE_NAME))
                .map_err(|error| error.to_string())?;
            assert_eq!(on_disk, broken);
            Ok(())
        });
    }

    #[test]
    fn theme_changes_never_persist_environment_keys() {
        Jail::expect_with(|jail| {
            jail.create_file(SETTINGS_FILE_NAME, r#"{ "model": "gemini-1.5-pro" }"#)?;
            jail.set_env(GEMINI_API_KEY_ENV, "secret-from-env");
            let store = SettingsStore::new(jail.directory().join(SETTINGS_FILE_NAME));
            assert_eq!(store.settings().api_key, "secret-from-env");

            let live = match store.set_theme_mode(ThemePreference::Dark) {
                Ok(live) => live,
                Err(error) => panic!("theme should persist: {error}"),
            };
            assert_eq!(live.theme_mode, ThemePreference::Dark);
            assert_eq!(live.api_key, "secret-from-env");

            let on_disk = std::fs::read_to_string(jail.directory().join(SETTINGS_FILE_NAME))
                .map_err(|error| error.to_string())?;
            assert!(!on_disk.contains("secret-from-env"));
            assert!(on_disk.contains("gemini-1.5-pro"));
            assert!(on_disk.contains("\"dark\""));
            Ok(())
        });
    }
}
