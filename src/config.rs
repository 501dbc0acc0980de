use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const OUTPUT_DIR_VAR: &str = "AGENT_MEDIA_DIR";
pub const RUNPOD_KEY_VAR: &str = "RUNPOD_API_KEY";

const MEDIA_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "gif", "mp4", "webm", "mp3", "wav", "json",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub output_dir: PathBuf,
    #[serde(default, skip_serializing)]
    pub runpod_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let output_dir = match lookup(OUTPUT_DIR_VAR).filter(|dir| !dir.is_empty()) {
            Some(dir) => absolutize(&cwd, Path::new(&dir)),
            None => cwd,
        };
        let runpod_api_key = lookup(RUNPOD_KEY_VAR).filter(|key| !key.is_empty());

        Ok(Self {
            output_dir,
            runpod_api_key,
        })
    }

    pub fn require_runpod_key(&self) -> Result<&str> {
        match self.runpod_api_key.as_deref() {
            Some(key) => Ok(key),
            None => anyhow::bail!("{RUNPOD_KEY_VAR} is not set"),
        }
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Runpod,
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "runpod" => Ok(Self::Runpod),
            other => anyhow::bail!("unsupported video provider: {other}"),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runpod => f.write_str("runpod"),
        }
    }
}

/// Where one invocation writes, after CLI flags are applied over [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedConfig {
    pub output_dir: PathBuf,
    pub provider: Provider,
    pub output_name: Option<String>,
}

fn looks_like_filename(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MEDIA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// `out` is a file when it carries a media extension, a directory otherwise.
pub fn merge_config(config: &Config, out: Option<&str>, provider: Option<Provider>) -> Result<MergedConfig> {
    let provider = provider.unwrap_or_default();
    let Some(out) = out.filter(|o| !o.is_empty()) else {
        return Ok(MergedConfig {
            output_dir: config.output_dir.clone(),
            provider,
            output_name: None,
        });
    };

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let resolved = absolutize(&cwd, Path::new(out));

    if looks_like_filename(&resolved) {
        let output_dir = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());
        let output_name = resolved
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(MergedConfig {
            output_dir,
            provider,
            output_name,
        })
    } else {
        Ok(MergedConfig {
            output_dir: resolved,
            provider,
            output_name: None,
        })
    }
}
