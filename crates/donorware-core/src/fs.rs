//! Filesystem helpers for replacing the store file.

use std::fs;
use std::io;
use std::path::Path;

/// Move `source` over `destination`.
///
/// Plain `fs::rename` refuses to replace an existing file on some non-unix
/// platforms; there the destination is removed and the rename retried, so a
/// failed retry loses the previous file. On unix the rename already replaces
/// atomically and the destination is never removed. If the rename fails,
/// `source` is deleted so no stray temp file remains.
///
/// # Errors
///
/// Returns the retry error, annotated with the first failure.
pub fn rename_with_fallback(source: &Path, destination: &Path) -> io::Result<()> {
    let first = match fs::rename(source, destination) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    if cfg!(not(unix)) {
        let _ = fs::remove_file(destination);
    }
    fs::rename(source, destination).map_err(|retry| {
        let _ = fs::remove_file(source);
        io::Error::new(
            retry.kind(),
            format!("rename failed ({}), retry failed ({})", first, retry),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_replaces_existing_destination() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("store.db.1.tmp");
        let destination = dir.path().join("store.db");
        fs::write(&destination, b"old snapshot").unwrap();
        fs::write(&source, b"new snapshot").unwrap();

        rename_with_fallback(&source, &destination).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&destination).unwrap(), b"new snapshot");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_rename_keeps_existing_destination() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("absent.tmp");
        let destination = dir.path().join("store.db");
        fs::write(&destination, b"old snapshot").unwrap();

        assert!(rename_with_fallback(&source, &destination).is_err());
        assert_eq!(fs::read(&destination).unwrap(), b"old snapshot");
    }

    #[test]
    fn test_missing_source_fails_and_leaves_nothing() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("absent.tmp");
        let destination = dir.path().join("store.db");

        assert!(rename_with_fallback(&source, &destination).is_err());
        assert!(!source.exists());
        assert!(!destination.exists());
    }
}
