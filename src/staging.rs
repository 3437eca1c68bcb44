//! Local temporary storage for files passing through the gateway.
//!
//! Every staged file gets its own randomly named file inside the staging
//! directory, so two requests carrying the same file name never share one.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use super::types::Result;

#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

/// A file held in the staging directory; removed when dropped.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    name: String,
    size: u64,
}

impl Staging {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Staging {
        Staging { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn create(&self, name: &str) -> io::Result<NamedTempFile> {
        fs::create_dir_all(&self.dir)?;
        Builder::new()
            .prefix(&format!("{}.", name))
            .suffix(".part")
            .tempfile_in(&self.dir)
    }

    /// Copy `reader` into a new staged file, rewound and ready to be read.
    pub fn stage<R: Read + ?Sized>(&self, name: &str, reader: &mut R) -> io::Result<StagedFile> {
        let mut file = self.create(name)?;
        let size = io::copy(reader, &mut file)?;
        file.flush()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(StagedFile { file, name: name.to_string(), size })
    }

    /// Stage whatever `fill` writes, for content arriving from the backend.
    pub fn receive<F>(&self, name: &str, fill: F) -> Result<StagedFile>
    where
        F: FnOnce(&mut dyn Write) -> Result<u64>,
    {
        let mut file = self.create(name)?;
        let size = fill(file.as_file_mut())?;
        file.flush()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(StagedFile { file, name: name.to_string(), size })
    }
}

impl StagedFile {
    /// Name the file was staged under (not its on-disk name).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn as_file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    /// Stream the whole content into `writer`.
    pub fn copy_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> io::Result<u64> {
        let file = self.file.as_file_mut();
        file.seek(SeekFrom::Start(0))?;
        io::copy(file, writer)
    }

    /// Delete the file now, logging instead of failing if that is not possible.
    pub fn remove(self) {
        let path = self.file.path().to_path_buf();
        if let Err(err) = self.file.close() {
            warn!("could not remove staged file {}: {}", path.display(), err);
        }
    }
}
