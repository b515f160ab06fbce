//! Pre-start checks.

use anyhow::{Context, Result, bail};
use stash_core::config::ServerConfig;

/// Verify the uploads directory exists and is writable before accepting
/// requests. Uploads are staged to disk before chunking, so a broken
/// staging directory would fail every upload.
pub fn startup_checks(config: &ServerConfig) -> Result<()> {
    let dir = &config.uploads_dir;

    if !dir.is_dir() {
        bail!("uploads directory {} does not exist", dir.display());
    }

    // Probe writability by actually creating a file; permission bits
    // alone miss read-only mounts.
    tempfile::NamedTempFile::new_in(dir).with_context(|| {
        format!(
            "uploads directory {} is not writable by the server",
            dir.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_with_dir(dir: PathBuf) -> ServerConfig {
        ServerConfig {
            uploads_dir: dir,
            ..Default::default()
        }
    }

    #[test]
    fn test_passes_on_writable_dir() {
        let temp = tempfile::tempdir().unwrap();
        startup_checks(&config_with_dir(temp.path().to_path_buf())).unwrap();
    }

    #[test]
    fn test_fails_on_missing_dir() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("does-not-exist");
        let err = startup_checks(&config_with_dir(missing)).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[cfg(unix)]
    #[test]
    fn test_fails_on_unwritable_dir() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("readonly");
        std::fs::create_dir(&dir).unwrap();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();

        let result = startup_checks(&config_with_dir(dir.clone()));

        // Restore permissions so the tempdir can be cleaned up.
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Running as root bypasses permission bits; only assert when the
        // probe actually failed.
        if let Err(err) = result {
            assert!(err.to_string().contains("not writable"));
        }
    }
}
