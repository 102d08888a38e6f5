use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "VITALOG_DATA_DIR";
pub const SERVER_ENV: &str = "VITALOG_SERVER";
pub const API_KEY_ENV: &str = "VITALOG_API_KEY";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl Config {
    /// Resolve the data directory (`VITALOG_DATA_DIR` or the platform data
    /// dir) and make sure it exists.
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => ProjectDirs::from("", "", "vitalog")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        Self::in_dir(data_dir)
    }

    pub fn in_dir(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("vitalog.db");
        let export_dir = data_dir.join("exports");

        Ok(Config {
            db_path,
            data_dir,
            export_dir,
        })
    }

    /// Load the API key from disk, or generate a new one.
    ///
    /// Returns `(key, newly_created)`.
    pub fn load_or_create_api_key(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if path.exists() {
            let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Ok((key, false));
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        Ok((key, true))
    }
}
