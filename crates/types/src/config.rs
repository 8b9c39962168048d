use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Result, TilError};

/// Settings for one notes tree. Read from `til.toml` at the notes root when
/// present; every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Notes root, which is also the git working tree. Never read from the
    /// file; set by [`Config::load`].
    #[serde(skip)]
    pub root: PathBuf,
    pub db: Option<PathBuf>,
    pub branch: String,
    pub base_url: String,
    pub pattern: String,
    pub allow_untracked: bool,
    pub render: RenderConfig,
    pub readme: ReadmeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub endpoint: String,
    pub mode: String,
    /// Environment variable holding the bearer token.
    pub token_env: String,
    pub attempts: u32,
    pub backoff_secs: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadmeConfig {
    pub file: PathBuf,
    pub subsection_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            db: None,
            branch: "main".into(),
            base_url: "https://cheginit.github.io/til".into(),
            pattern: "*/*.md".into(),
            allow_untracked: false,
            render: RenderConfig::default(),
            readme: ReadmeConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.github.com/markdown".into(),
            mode: "markdown".into(),
            token_env: "GITHUB_TOKEN".into(),
            attempts: 3,
            backoff_secs: 60,
            timeout_secs: 30,
        }
    }
}

impl Default for ReadmeConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("README.md"),
            subsection_file: "README".into(),
        }
    }
}

impl Config {
    pub const FILE_NAME: &'static str = "til.toml";

    /// Load `<root>/til.toml`, falling back to defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(Self::FILE_NAME);
        let mut config = if path.is_file() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str::<Config>(&content)
                .map_err(|e| TilError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            Config::default()
        };
        config.root = root.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.render.attempts == 0 {
            return Err(TilError::Config("render.attempts must be at least 1".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(TilError::Config("base_url must not be empty".into()));
        }
        Ok(())
    }

    /// Database file; relative paths resolve against the notes root.
    pub fn db_path(&self) -> PathBuf {
        match &self.db {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.root.join(p),
            None => self.root.join("tils.db"),
        }
    }

    pub fn readme_path(&self) -> PathBuf {
        self.root.join(&self.readme.file)
    }

    pub fn note_url(&self, topic: &str, slug: &str) -> String {
        format!("{}/{}/{}.html", self.base_url.trim_end_matches('/'), topic, slug)
    }
}

impl RenderConfig {
    /// Bearer token from the configured environment variable, if set and
    /// non-empty.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
