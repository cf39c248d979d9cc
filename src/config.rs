use std::path::{Path, PathBuf};

use anyhow::Context;
use imgpreload::Options;
use serde::Deserialize;

/// Contents of the optional `imgpreload.toml`.
#[derive(Deserialize, Debug, Default)]
pub struct PreloadConfig {
    #[serde(default)]
    pub loader: LoaderSection,
}

#[derive(Deserialize, Debug, Default)]
pub struct LoaderSection {
    pub root: Option<PathBuf>,

    #[serde(flatten)]
    pub options: Options,
}

impl PreloadConfig {
    /// Flags only override the file when they were actually passed.
    pub fn apply_flags(&mut self, serial: bool, root: Option<String>) {
        if serial {
            self.loader.options.parallel = Some(false);
        }
        if let Some(root) = root {
            self.loader.root = Some(root.into());
        }
    }
}

// A missing file is the default config; a file that fails to parse is an error.
pub async fn read(path: &Path) -> anyhow::Result<PreloadConfig> {
    let Ok(contents) = tokio::fs::read_to_string(path).await else {
        return Ok(PreloadConfig::default());
    };

    toml::from_str(&contents).context(format!("Failed to parse toml in file {}.", path.display()))
}
