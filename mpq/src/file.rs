use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{error, info};

use crate::{utils::mpq::normalize_name, ArchiveManager, MpqError, MpqResult};

/// A file of the virtual filesystem: a loose copy under the disk search path wins over the
/// archived one.
#[derive(Debug)]
pub struct MpqFile {
    buffer: Vec<u8>,
    pointer: usize,
    is_at_end_of_file: bool,
    path_on_disk: PathBuf,
    file_is_on_disk: bool,
}

fn disk_path(disk_search_path: &str, file_name: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", disk_search_path, file_name).to_lowercase().replace('\\', "/"))
}

impl MpqFile {
    pub fn exists(file_name: &str, archives: &ArchiveManager, disk_search_path: &str) -> bool {
        archives.file_exists_in_an_mpq(file_name) || disk_path(disk_search_path, file_name).is_file()
    }

    pub fn open(
        file_name: &str,
        archives: &mut ArchiveManager,
        disk_search_path: &str,
    ) -> MpqResult<MpqFile> {
        if !Self::exists(file_name, archives, disk_search_path) {
            error!("Requested file {} which does not exist.", file_name);
            return Err(MpqError::FileNotFound(file_name.to_owned()));
        }

        let path_on_disk = disk_path(disk_search_path, file_name);
        let file_is_on_disk = path_on_disk.is_file();

        let buffer = if file_is_on_disk {
            fs::read(&path_on_disk)?
        } else {
            archives.open_file_from_an_mpq(&normalize_name(file_name))?
        };

        Ok(MpqFile {
            is_at_end_of_file: buffer.is_empty(),
            buffer,
            pointer: 0,
            path_on_disk,
            file_is_on_disk,
        })
    }

    /// Wraps bytes that do not come from the virtual filesystem.
    pub fn from_bytes(buffer: Vec<u8>, path_on_disk: PathBuf) -> MpqFile {
        MpqFile {
            is_at_end_of_file: buffer.is_empty(),
            buffer,
            pointer: 0,
            path_on_disk,
            file_is_on_disk: false,
        }
    }

    /// Copies up to `dest.len()` bytes and returns how many were copied. A read crossing the end of
    /// the file copies what is left and flags the end of file.
    pub fn read(&mut self, dest: &mut [u8]) -> usize {
        if self.is_at_end_of_file {
            return 0;
        }

        let mut bytes = dest.len();
        let rpos = self.pointer.saturating_add(bytes);
        if rpos > self.buffer.len() {
            bytes = self.buffer.len().saturating_sub(self.pointer);
            self.is_at_end_of_file = true;
        }

        let start = self.pointer.min(self.buffer.len());
        dest[..bytes].copy_from_slice(&self.buffer[start..start + bytes]);

        self.pointer = rpos;

        bytes
    }

    pub fn is_at_end_of_file(&self) -> bool {
        self.is_at_end_of_file
    }

    pub fn seek(&mut self, offset: usize) {
        self.pointer = offset;
        self.is_at_end_of_file = self.pointer >= self.buffer.len();
    }

    pub fn seek_relative(&mut self, offset: usize) {
        self.pointer = self.pointer.saturating_add(offset);
        self.is_at_end_of_file = self.pointer >= self.buffer.len();
    }

    pub fn close(&mut self) {
        self.buffer = Vec::new();
        self.is_at_end_of_file = true;
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn position(&self) -> usize {
        self.pointer
    }

    pub fn file_is_on_disk(&self) -> bool {
        self.file_is_on_disk
    }

    pub fn path_on_disk(&self) -> &Path {
        &self.path_on_disk
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Bytes from the cursor to the end of the file.
    pub fn remaining(&self) -> &[u8] {
        &self.buffer[self.pointer.min(self.buffer.len())..]
    }

    /// Replaces the content. The cursor is kept unless it would point past the new end.
    pub fn set_buffer(&mut self, buffer: Vec<u8>) {
        self.buffer = buffer;
        self.pointer = self.pointer.min(self.buffer.len());
        self.is_at_end_of_file = self.pointer >= self.buffer.len();
    }

    /// Writes the buffer next to the disk copy, under `file_name`.
    pub fn save_to_disk_as(&mut self, file_name: &str) -> MpqResult<()> {
        let dir = self
            .path_on_disk
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if let Err(e) = fs::create_dir_all(&dir) {
            error!(
                "Is \"{}\" really a location I can write to? ({})",
                dir.display(),
                e
            );
        }

        let output = dir.join(file_name.trim_start_matches('/'));
        match fs::write(&output, &self.buffer) {
            Ok(()) => {
                info!("Saving file \"{}\".", output.display());
                self.file_is_on_disk = true;
                Ok(())
            }
            Err(e) => {
                error!("Unable to open {} for writing: {}", output.display(), e);
                Err(MpqError::Io(e))
            }
        }
    }

    pub fn save_to_disk(&mut self) -> MpqResult<()> {
        let file_name = self
            .path_on_disk
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.save_to_disk_as(&file_name)
    }

    pub fn save_to_mpq(
        &self,
        archives: &mut ArchiveManager,
        archive_path: &Path,
        path_in_mpq: &str,
    ) -> MpqResult<()> {
        let path_in_mpq = if path_in_mpq.is_empty() {
            "\\".to_owned()
        } else {
            normalize_name(path_in_mpq)
        };

        match archives.archive_mut(archive_path) {
            Some(archive) => archive.add_file(&path_in_mpq, &self.buffer),
            None => {
                error!("Requested MPQ {} not open", archive_path.display());
                Err(MpqError::ArchiveNotOpen(archive_path.to_path_buf()))
            }
        }
    }
}
