use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "m4a", "wav", "wma"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub roots: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub parallel: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            parallel: true,
        }
    }
}

impl ScanConfig {
    pub fn normalized(mut self) -> Self {
        let mut extensions: Vec<String> = Vec::with_capacity(self.extensions.len());
        for ext in &self.extensions {
            let ext = ext.trim().trim_start_matches('.').to_lowercase();
            if ext.is_empty() || extensions.contains(&ext) {
                continue;
            }
            extensions.push(ext);
        }
        self.extensions = extensions;
        self
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        matches_extension(&self.extensions, path)
    }
}

pub(crate) fn matches_extension(extensions: &[String], path: &Path) -> bool {
    let ext = match path.extension() {
        Some(ext) => ext.to_string_lossy().to_lowercase(),
        None => return false,
    };
    extensions.iter().any(|candidate| *candidate == ext)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<ScanConfig, ConfigError>;
}

impl ConfigSource for ScanConfig {
    fn load(&self) -> Result<ScanConfig, ConfigError> {
        Ok(self.clone().normalized())
    }
}

#[derive(Clone, Debug)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for ConfigFile {
    fn load(&self) -> Result<ScanConfig, ConfigError> {
        let (mut config, _) = load_or_create_config(&self.path)?;
        config.roots = config
            .roots
            .iter()
            .map(|root| resolve_path(&self.path, root))
            .collect();
        Ok(config)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("LIBRARY_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("library.yaml"))
            .unwrap_or_else(|| PathBuf::from("library.yaml")),
        Err(_) => PathBuf::from("library.yaml"),
    }
}

pub fn load_or_create_config(path: &Path) -> Result<(ScanConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let config: ScanConfig = if contents.trim().is_empty() {
            ScanConfig::default()
        } else {
            serde_yaml::from_str(&contents)?
        };
        return Ok((config.normalized(), false));
    }

    let config = ScanConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &ScanConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        return value.to_path_buf();
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(value)
}
