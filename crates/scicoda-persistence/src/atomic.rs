//! Reemplazo atómico de ficheros.
//!
//! Se escribe a un temporal en el mismo directorio destino, se hace fsync y
//! se renombra encima del destino. Un lector concurrente ve el fichero viejo
//! o el nuevo completo, nunca uno a medias.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use sha2::{Digest, Sha256};

use crate::error::PersistenceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub bytes: u64,
    /// SHA-256 hex (64 caracteres) del contenido escrito.
    pub sha256: String,
}

pub fn sha256_hex(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("{:x}", hasher.finalize())
}

pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<WrittenFile, PersistenceError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut tmp = tempfile::Builder::new().prefix(".scicoda-")
                                          .suffix(".tmp")
                                          .tempfile_in(&parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PersistenceError::Io(e.error))?;
    debug!("write_atomic:done path={} bytes={}", path.display(), contents.len());

    Ok(WrittenFile { path: path.to_path_buf(),
                     bytes: contents.len() as u64,
                     sha256: sha256_hex(contents) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file_and_leaves_no_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out.json");
        write_atomic(&target, b"[1]").unwrap();
        let written = write_atomic(&target, b"[1,2]").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"[1,2]");
        assert_eq!(written.bytes, 5);
        assert_eq!(written.sha256.len(), 64);
        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap()).unwrap()
                                                                      .filter_map(Result::ok)
                                                                      .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
                                                                      .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn checksum_is_stable() {
        assert_eq!(sha256_hex(b"abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }
}
