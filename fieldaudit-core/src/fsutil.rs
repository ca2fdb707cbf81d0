//! Crash-safe file replacement.
//!
//! Output goes to a sibling temp file which is synced and then renamed onto
//! the destination, so readers see either the old file or the whole new one.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{FieldAuditError, Result};

/// Directory the temp file must live in for the rename to stay on one filesystem.
fn staging_dir(dest: &Path) -> &Path {
    match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Fill `dest` through `fill` and swap it into place.
///
/// Any failure, from `fill` or from the filesystem, comes back as
/// `WriteFailure` for `dest` with the cause attached; `dest` keeps its old
/// contents and the temp file is deleted.
pub fn replace_file<T>(dest: &Path, fill: impl FnOnce(&mut File) -> Result<T>) -> Result<T> {
    stage_and_swap(dest, fill).map_err(|e| e.writing(dest))
}

fn stage_and_swap<T>(dest: &Path, fill: impl FnOnce(&mut File) -> Result<T>) -> Result<T> {
    let dir = staging_dir(dest);
    fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    let value = fill(staged.as_file_mut())?;

    let file = staged.as_file_mut();
    file.flush()?;
    file.sync_all()?;
    staged.persist(dest).map_err(|e| FieldAuditError::Io(e.error))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_replace_file_creates_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a/b/out.bin");
        let n = replace_file(&dest, |f| {
            f.write_all(b"hello")?;
            Ok(5)
        })
        .unwrap();
        assert_eq!(n, 5);
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
    }

    #[test]
    fn test_failed_fill_keeps_old_contents_and_cause() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        fs::write(&dest, b"original").unwrap();

        let err = replace_file(&dest, |f| {
            f.write_all(b"partial")?;
            Err::<(), _>(FieldAuditError::Parse("boom".into()))
        })
        .unwrap_err();

        match &err {
            FieldAuditError::WriteFailure { path, source } => {
                assert_eq!(path, &dest);
                assert!(matches!(**source, FieldAuditError::Parse(ref m) if m == "boom"));
            }
            other => panic!("expected WriteFailure, got {:?}", other),
        }
        assert!(err.source().is_some());
        assert_eq!(fs::read(&dest).unwrap(), b"original");
        // The staged temp file is gone.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_destination_is_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a parent directory is needed.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let dest = blocker.join("out.bin");

        let err = replace_file(&dest, |_| Ok(())).unwrap_err();
        assert!(matches!(
            err,
            FieldAuditError::WriteFailure { ref source, .. } if matches!(**source, FieldAuditError::Io(_))
        ));
    }

    #[test]
    fn test_staging_dir() {
        assert_eq!(staging_dir(Path::new("out.xlsx")), Path::new("."));
        assert_eq!(staging_dir(Path::new("a/out.xlsx")), Path::new("a"));
    }
}
