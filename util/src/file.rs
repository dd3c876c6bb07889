use anyhow::ensure;
use std::fs::File;
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::result::Result;
use std::{fs::OpenOptions, path::Path};

/// Who may read a file written by [fopen_w]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Secret,
}

impl Visibility {
    fn mode(self) -> u32 {
        match self {
            Visibility::Public => 0o644,
            Visibility::Secret => 0o600,
        }
    }
}

/// What to do if a file about to be written exists already
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Overwrite {
    Allow,
    Refuse,
}

impl From<bool> for Overwrite {
    fn from(force: bool) -> Self {
        match force {
            true => Overwrite::Allow,
            false => Overwrite::Refuse,
        }
    }
}

/// Open a file writable, truncating it
///
/// The mode only applies to newly created files.
pub fn fopen_w<P: AsRef<Path>>(
    path: P,
    visibility: Visibility,
    overwrite: Overwrite,
) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).read(false).mode(visibility.mode());
    match overwrite {
        Overwrite::Allow => options.create(true).truncate(true),
        Overwrite::Refuse => options.create_new(true),
    };
    options.open(path)
}

/// Open a file readable
pub fn fopen_r<P: AsRef<Path>>(path: P) -> std::io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(false)
        .create(false)
        .truncate(false)
        .open(path)
}

/// Fill a buffer and make sure nothing is left to read afterwards
pub trait ReadExactToEnd {
    type Error;

    fn read_exact_to_end(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;
}

impl<R: Read> ReadExactToEnd for R {
    type Error = anyhow::Error;

    fn read_exact_to_end(&mut self, buf: &mut [u8]) -> anyhow::Result<()> {
        let mut dummy = [0u8; 8];
        self.read_exact(buf)?;
        ensure!(
            self.read(&mut dummy)? == 0,
            "File too long! Expected exactly {} bytes.",
            buf.len()
        );
        Ok(())
    }
}

pub trait LoadValue {
    type Error;

    fn load<P: AsRef<Path>>(path: P) -> Result<Self, Self::Error>
    where
        Self: Sized;
}

pub trait StoreValue {
    type Error;

    fn store<P: AsRef<Path>>(&self, path: P) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn secret_files_are_private() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sk");
        fopen_w(&path, Visibility::Secret, Overwrite::Refuse)?.write_all(b"key")?;
        assert_eq!(path.metadata()?.permissions().mode() & 0o777, 0o600);
        Ok(())
    }

    #[test]
    fn refuse_keeps_existing_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, b"old")?;

        let err = fopen_w(&path, Visibility::Public, Overwrite::Refuse).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&path)?, b"old");

        fopen_w(&path, Visibility::Public, Overwrite::Allow)?.write_all(b"new")?;
        assert_eq!(std::fs::read(&path)?, b"new");
        Ok(())
    }

    #[test]
    fn read_exact_to_end_rejects_trailing_data() {
        let mut buf = [0u8; 4];
        assert!((&b"1234"[..]).read_exact_to_end(&mut buf).is_ok());
        assert_eq!(&buf, b"1234");
        assert!((&b"12345"[..]).read_exact_to_end(&mut buf).is_err());
        assert!((&b"123"[..]).read_exact_to_end(&mut buf).is_err());
    }
}
