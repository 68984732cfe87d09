//! Token persistence in `~/.vault-token`, the file the Vault CLI itself uses.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

use crate::fsutil::write_file_atomic;

/// Source of raw token file contents.
///
/// Production code reads the filesystem; tests hand in fixed bytes.
pub trait TokenReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

impl<F> TokenReader for F
where
    F: Fn(&Path) -> io::Result<Vec<u8>>,
{
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self(path)
    }
}

/// Reads token files with `std::fs::read`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTokenReader;

impl TokenReader for FsTokenReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Location of the persisted session token.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the token. A missing or blank file means no token.
    pub fn load(&self, reader: &dyn TokenReader) -> Result<Option<SecretString>> {
        let contents = match reader.read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read token file: {}", self.path.display()))
            }
        };

        let token = String::from_utf8(contents)
            .with_context(|| format!("Token file is not UTF-8: {}", self.path.display()))?;
        let token = token.trim();

        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SecretString::from(token.to_string())))
        }
    }

    /// Persist the token, readable by the owner only.
    pub fn save(&self, token: &SecretString) -> Result<()> {
        write_file_atomic(&self.path, token.expose_secret().as_bytes(), 0o600)
            .with_context(|| format!("Failed to write token file: {}", self.path.display()))
    }

    pub fn delete(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to delete token file: {}", self.path.display()))?;
        }
        Ok(())
    }
}
