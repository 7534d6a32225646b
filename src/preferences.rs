//! Remembered user preferences (currently the last download directory).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, UserDirs};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const ENV_PREFS_PATH: &str = "MEDIASWEEP_PREFS_PATH";
const PREFS_FILE_NAME: &str = ".mediasweep.json";

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("preferences io error: {0}")]
    Io(#[from] io::Error),

    #[error("preferences are not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_download_dir: Option<PathBuf>,
}

impl Preferences {
    /// `MEDIASWEEP_PREFS_PATH`, else `~/.mediasweep.json`.
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(ENV_PREFS_PATH)
            && !path.trim().is_empty()
        {
            return Some(PathBuf::from(path));
        }
        BaseDirs::new().map(|dirs| dirs.home_dir().join(PREFS_FILE_NAME))
    }

    /// Missing or unreadable files yield defaults.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(prefs) => prefs,
            Err(PreferencesError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no preferences at {}", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("ignoring preferences at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, PreferencesError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), PreferencesError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Explicit choice, then the remembered one, then the user's Downloads.
    pub fn resolve_download_dir(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.last_download_dir.clone())
            .unwrap_or_else(default_download_dir)
    }
}

pub fn default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn round_trips_last_download_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let prefs = Preferences {
            last_download_dir: Some(PathBuf::from("/data/media")),
        };
        prefs.save(&path).unwrap();

        assert_eq!(Preferences::load(&path), prefs);
    }

    #[test]
    fn missing_or_corrupt_files_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            Preferences::load(&dir.path().join("absent.json")),
            Preferences::default()
        );

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert_eq!(Preferences::load(&corrupt), Preferences::default());
        assert!(matches!(
            Preferences::try_load(&corrupt),
            Err(PreferencesError::Json(_))
        ));
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"last_download_dir": "/x", "theme": "dark"}"#).unwrap();
        assert_eq!(
            Preferences::load(&path).last_download_dir,
            Some(PathBuf::from("/x"))
        );
    }

    #[test]
    fn explicit_dir_beats_remembered_dir() {
        let prefs = Preferences {
            last_download_dir: Some(PathBuf::from("/remembered")),
        };
        assert_eq!(
            prefs.resolve_download_dir(Some(Path::new("/explicit"))),
            PathBuf::from("/explicit")
        );
        assert_eq!(prefs.resolve_download_dir(None), PathBuf::from("/remembered"));
    }
}
