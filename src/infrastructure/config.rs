// Settings store - persisted dashboard configuration
use crate::domain::settings::Settings;
use anyhow::Context;
use std::path::PathBuf;

pub struct LoadedSettings {
    pub settings: Settings,
    /// False when nothing was ever saved; the UI layer should prompt for
    /// configuration before first use.
    pub configured: bool,
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Self {
        Self::new("config/settings.toml")
    }

    pub fn load(&self) -> anyhow::Result<LoadedSettings> {
        if !self.path.exists() {
            return Ok(LoadedSettings {
                settings: Settings::default(),
                configured: false,
            });
        }

        let raw = config::Config::builder()
            .add_source(config::File::from(self.path.as_path()))
            .build()
            .with_context(|| format!("failed to read settings at {}", self.path.display()))?;
        let settings: Settings = raw
            .try_deserialize()
            .context("settings file is malformed")?;

        Ok(LoadedSettings {
            settings,
            configured: true,
        })
    }

    /// Normalize and persist; every later API call observes the new values.
    pub fn save(&self, api_url: &str, api_key: &str) -> anyhow::Result<Settings> {
        let show_labels = self
            .load()
            .map(|loaded| loaded.settings.show_labels)
            .unwrap_or(false);
        let settings = Settings::normalized(api_url, api_key, show_labels);
        self.write(&settings)?;
        Ok(settings)
    }

    pub fn set_show_labels(&self, show: bool) -> anyhow::Result<()> {
        let mut settings = self.load()?.settings;
        settings.show_labels = show;
        self.write(&settings)
    }

    fn write(&self, settings: &Settings) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let body = toml::to_string_pretty(settings)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
