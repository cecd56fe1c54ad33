//! Persistent local state, following XDG Base Directory standards.
//!
//! Everything mimicoach remembers between runs (settings, words, songs,
//! accounts, the current session) lives as JSON files in
//! `XDG_STATE_HOME/mimicoach/{namespace}`, separate from the TOML configuration.
//! Files are replaced atomically so a daemon reading them never sees a
//! half-written document.

pub mod status;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::common::constants::APP_NAME;
use crate::common::utils::private_path;
use crate::config::get_custom_config_dir;

fn state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local/state")
        })
}

/// Get the state directory for a given configuration directory.
///
/// The namespace is `default` for the default config directory and
/// `custom_<hash>` for a directory given with `--config`, so test and
/// alternate setups never share data with the user's real profile.
pub fn get_state_dir(config_dir: Option<&Path>) -> Result<PathBuf> {
    let state_base = state_home().join(APP_NAME);

    let namespace = match config_dir {
        None => "default".to_string(),
        Some(path) => {
            let default_config = dirs::config_dir()
                .context("Could not determine config directory")?
                .join(APP_NAME);
            if path == default_config {
                "default".to_string()
            } else {
                get_state_namespace(path)
            }
        }
    };

    Ok(state_base.join(namespace))
}

/// State directory for the configuration selected at startup.
pub fn current_state_dir() -> Result<PathBuf> {
    let config_dir = get_custom_config_dir();
    get_state_dir(config_dir.as_deref())
}

/// Generate a stable namespace for a custom config directory.
fn get_state_namespace(config_path: &Path) -> String {
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());

    let hash = sha256::digest(canonical.to_string_lossy().as_bytes());
    format!("custom_{}", &hash[..16])
}

/// Read a JSON document. A missing file is `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", private_path(path)));
        }
    };

    let value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", private_path(path)))?;
    Ok(Some(value))
}

/// Write a JSON document by replacing the file in one rename.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", private_path(path)))?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create state directory {}", private_path(dir)))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create a temporary file in {}", private_path(dir)))?;
    serde_json::to_writer_pretty(&mut temp, value)
        .with_context(|| format!("Failed to serialize {}", private_path(path)))?;
    temp.write_all(b"\n")?;
    temp.flush()?;

    temp.persist(path)
        .with_context(|| format!("Failed to write {}", private_path(path)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let value: Option<Vec<String>> = read_json(&dir.path().join("absent.json")).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let mut doc = BTreeMap::new();
        doc.insert("radius".to_string(), 120);

        write_json_atomic(&path, &doc).unwrap();
        let back: BTreeMap<String, i32> = read_json(&path).unwrap().unwrap();
        assert_eq!(back, doc);

        // No temporary files left behind
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "{not json").unwrap();
        assert!(read_json::<BTreeMap<String, i32>>(&path).is_err());
    }

    #[test]
    #[serial]
    fn test_state_dir_namespaces() {
        let state = tempdir().unwrap();
        let custom = tempdir().unwrap();

        let original = std::env::var("XDG_STATE_HOME").ok();
        unsafe {
            std::env::set_var("XDG_STATE_HOME", state.path());
        }

        let default_dir = get_state_dir(None).unwrap();
        assert_eq!(default_dir, state.path().join("mimicoach").join("default"));

        let custom_dir = get_state_dir(Some(custom.path())).unwrap();
        let name = custom_dir.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("custom_"));
        assert_eq!(name.len(), "custom_".len() + 16);
        assert_eq!(custom_dir, get_state_dir(Some(custom.path())).unwrap());

        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_STATE_HOME", val),
                None => std::env::remove_var("XDG_STATE_HOME"),
            }
        }
    }
}
