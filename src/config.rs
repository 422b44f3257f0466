use crate::linker::LinkOptions;
use crate::segment::MIN_WORD_LEN;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Word list looked up in the working directory when none is configured.
pub const DEFAULT_VOCABULARY_FILE: &str = "default_symlinks_vocabulary.txt";

/// Per-directory config file, read from the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".caselink.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub vocabulary: Option<PathBuf>,

    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,

    #[serde(default = "default_overwrite")]
    pub overwrite: bool,

    #[serde(default)]
    pub skip_errors: bool,

    #[serde(default)]
    pub max_candidates: Option<usize>,
}

fn default_min_word_len() -> usize {
    MIN_WORD_LEN
}

fn default_overwrite() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vocabulary: None,
            min_word_len: MIN_WORD_LEN,
            overwrite: true,
            skip_errors: false,
            max_candidates: None,
        }
    }
}

impl Config {
    /// Build the effective configuration.
    ///
    /// The global file is applied first, then `./.caselink.toml`, then the
    /// flags given on the command line.
    pub fn load(
        vocabulary: Option<PathBuf>,
        not_overwrite: bool,
        skip_errors: bool,
        max_candidates: Option<usize>,
    ) -> Result<Self> {
        let layers = [
            Self::global_config_path(),
            Some(PathBuf::from(LOCAL_CONFIG_FILE)),
        ];

        let mut config = Self::default();
        for path in layers.into_iter().flatten().filter(|p| p.exists()) {
            config = config.merge(Self::from_file(&path)?);
        }

        config.vocabulary = vocabulary.or(config.vocabulary);
        config.overwrite &= !not_overwrite;
        config.skip_errors |= skip_errors;
        config.max_candidates = max_candidates.or(config.max_candidates);

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.min_word_len == 0 {
            anyhow::bail!("min_word_len must be at least 1");
        }
        if self.max_candidates == Some(0) {
            anyhow::bail!("max_candidates must be at least 1 when set");
        }
        Ok(())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Values in `layer` that differ from the defaults win.
    fn merge(self, layer: Self) -> Self {
        Self {
            vocabulary: layer.vocabulary.or(self.vocabulary),
            min_word_len: if layer.min_word_len != default_min_word_len() {
                layer.min_word_len
            } else {
                self.min_word_len
            },
            overwrite: self.overwrite && layer.overwrite,
            skip_errors: self.skip_errors || layer.skip_errors,
            max_candidates: layer.max_candidates.or(self.max_candidates),
        }
    }

    /// The configured vocabulary, or the first default location that exists.
    pub fn vocabulary_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.vocabulary {
            return Ok(path.clone());
        }

        let mut candidates = vec![PathBuf::from(DEFAULT_VOCABULARY_FILE)];
        if let Some(data_dir) = Self::data_dir() {
            candidates.push(data_dir.join("vocabulary.fst"));
            candidates.push(data_dir.join("vocabulary.txt"));
        }

        candidates
            .into_iter()
            .find(|path| path.exists())
            .with_context(|| {
                format!(
                    "No vocabulary found. Pass --vocabulary or create {}",
                    DEFAULT_VOCABULARY_FILE
                )
            })
    }

    pub fn link_options(&self, dry_run: bool) -> LinkOptions {
        LinkOptions {
            overwrite: self.overwrite,
            skip_errors: self.skip_errors,
            dry_run,
            max_candidates: self.max_candidates,
        }
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "caselink").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "caselink").map(|dirs| dirs.data_dir().to_path_buf())
    }
}
