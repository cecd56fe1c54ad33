//! Lock file management for single-instance enforcement.
//!
//! Only one daemon may own the geofence at a time: two daemons would each play
//! the song on arrival. The lock is an `flock` on `$XDG_RUNTIME_DIR/mimicoach.lock`
//! holding the owner's PID and config directory. One-shot commands never take it.

use anyhow::{Context, Result};
use fs2::FileExt;
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::LOCK_FILE_NAME;
use crate::common::utils::private_path;
use crate::config;

/// Held for the lifetime of the daemon; the file is removed on drop.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Contents of a lock file written by another instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockOwner {
    pub pid: u32,
    pub config_dir: Option<String>,
}

/// Parse `PID\n[config dir]\n`. None when the file is not a lock we wrote.
pub fn parse_lock_content(content: &str) -> Option<LockOwner> {
    let mut lines = content.lines();
    let pid = lines.next()?.trim().parse::<u32>().ok()?;
    let config_dir = lines
        .next()
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .map(str::to_string);
    if lines.next().is_some() {
        return None;
    }
    Some(LockOwner { pid, config_dir })
}

/// Default lock path in the runtime directory.
pub fn get_lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// Whether a process with this PID exists.
pub fn is_process_running(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw == 0 {
        return false;
    }
    // Signal 0 only performs the existence and permission checks
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Acquire the daemon lock at the default path.
pub fn acquire_lock() -> Result<InstanceLock> {
    acquire_lock_at(&get_lock_path())
}

/// Acquire an exclusive lock on `lock_path`.
///
/// A lock left behind by a process that no longer exists is removed and the
/// acquisition retried once. A live owner is an error.
pub fn acquire_lock_at(lock_path: &Path) -> Result<InstanceLock> {
    if let Some(lock) = try_lock(lock_path)? {
        return Ok(lock);
    }

    handle_lock_conflict(lock_path)?;

    try_lock(lock_path)?.with_context(|| {
        format!(
            "Failed to acquire lock after cleanup attempt: {}",
            private_path(lock_path)
        )
    })
}

fn try_lock(lock_path: &Path) -> Result<Option<InstanceLock>> {
    // Open without truncating: the current owner's PID must stay readable
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .with_context(|| format!("Failed to open lock file {}", private_path(lock_path)))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    match config::get_custom_config_dir() {
        Some(dir) => writeln!(file, "{}", dir.display())?,
        None => writeln!(file)?,
    }
    file.flush()?;

    Ok(Some(InstanceLock {
        file,
        path: lock_path.to_path_buf(),
    }))
}

/// Resolve a held lock: clear it when stale, fail when the owner is alive.
pub fn handle_lock_conflict(lock_path: &Path) -> Result<()> {
    let content = match std::fs::read_to_string(lock_path) {
        Ok(content) => content,
        // Owner released it in the meantime
        Err(_) => return Ok(()),
    };

    let Some(owner) = parse_lock_content(&content) else {
        log_warning!("Lock file format invalid, removing");
        let _ = std::fs::remove_file(lock_path);
        return Ok(());
    };

    if !is_process_running(owner.pid) {
        log_warning!(
            "Removing stale lock file (process {} no longer running)",
            owner.pid
        );
        let _ = std::fs::remove_file(lock_path);
        return Ok(());
    }

    log_pipe!();
    log_error!("mimicoach is already running (PID: {})", owner.pid);
    log_block_start!("Did you mean to:");
    log_indented!("• Change the home location: mimicoach home set <lat> <lon>");
    log_indented!("• Pause the geofence: mimicoach geofence off");
    log_indented!("• Reload the configuration: kill -HUP {}", owner.pid);
    anyhow::bail!("another mimicoach instance is running (PID: {})", owner.pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_lock_content() {
        assert_eq!(
            parse_lock_content("1234\n\n"),
            Some(LockOwner {
                pid: 1234,
                config_dir: None
            })
        );
        assert_eq!(
            parse_lock_content("42\n/home/user/alt\n"),
            Some(LockOwner {
                pid: 42,
                config_dir: Some("/home/user/alt".to_string())
            })
        );
        assert_eq!(parse_lock_content("not a pid\n"), None);
        assert_eq!(parse_lock_content(""), None);
        assert_eq!(parse_lock_content("1\n2\n3\n"), None);
    }

    #[test]
    fn test_current_process_is_running() {
        assert!(is_process_running(std::process::id()));
        assert!(!is_process_running(u32::MAX));
    }

    #[test]
    fn test_lock_writes_pid_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mimicoach.lock");

        let lock = acquire_lock_at(&path).unwrap();
        let owner = parse_lock_content(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(owner.pid, std::process::id());
        assert_eq!(lock.path(), path.as_path());

        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_second_lock_refused_while_owner_alive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mimicoach.lock");

        let _lock = acquire_lock_at(&path).unwrap();
        let err = acquire_lock_at(&path).unwrap_err();
        assert!(err.to_string().contains("instance is running"));
    }

    #[test]
    fn test_leftover_unlocked_file_is_reused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mimicoach.lock");
        std::fs::write(&path, "999999\n\n").unwrap();

        let _lock = acquire_lock_at(&path).unwrap();
        let owner = parse_lock_content(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(owner.pid, std::process::id());
    }

    #[test]
    fn test_conflict_with_garbage_file_removes_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mimicoach.lock");
        std::fs::write(&path, "garbage").unwrap();

        handle_lock_conflict(&path).unwrap();
        assert!(!path.exists());
    }
}
