//! In-memory view of an OOXML package (the zip container).

#[cfg(feature = "fast-hash")]
use hashbrown::HashMap;
#[cfg(not(feature = "fast-hash"))]
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use log::debug;
use zip::ZipArchive;

use crate::error::{FieldAuditError, Result};

const MAX_RESERVE: u64 = 16 * 1024 * 1024;

/// An opened package: every file entry of the archive, keyed by part name.
///
/// Parts are read once when the package is opened and never mutated.
#[derive(Debug, Default)]
pub struct Package {
    parts: HashMap<String, Vec<u8>>,
}

impl Package {
    /// Open a package from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FieldAuditError::FileNotFound(path.to_path_buf())
            } else {
                FieldAuditError::Io(e)
            }
        })?;
        let package = Self::from_reader(BufReader::new(file))?;
        debug!("opened package {} ({} parts)", path.display(), package.parts.len());
        Ok(package)
    }

    /// Open a package from bytes already in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }

    /// Read every file entry in one pass over the central directory.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = HashMap::with_capacity(archive.len());

        for idx in 0..archive.len() {
            let mut file = archive.by_index(idx)?;
            if file.is_dir() {
                continue;
            }
            let name = normalize_part_name(file.name());
            // Declared sizes are untrusted; cap the up-front reservation.
            let mut buf = Vec::with_capacity(file.size().min(MAX_RESERVE) as usize);
            file.read_to_end(&mut buf)?;
            parts.insert(name, buf);
        }

        Ok(Package { parts })
    }

    /// Get a part's bytes, if present.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(normalize_part_name(name).as_str()).map(Vec::as_slice)
    }

    /// Get a part's bytes, failing with `MissingPart` if absent.
    pub fn require_part(&self, name: &str) -> Result<&[u8]> {
        self.part(name)
            .ok_or_else(|| FieldAuditError::MissingPart(name.to_string()))
    }

    /// Check whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Names of all parts, sorted.
    pub fn part_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn normalize_part_name(name: &str) -> String {
    name.trim_start_matches('/').to_string()
}
