use std::path::{Path, PathBuf};

use log::{info, trace, warn};

use crate::{MpqArchive, MpqError, MpqResult};

/// Archives ordered by priority: lookups stop at the first archive containing the file.
pub struct ArchiveManager {
    archives: Vec<MpqArchive>,
}

impl ArchiveManager {
    pub fn empty() -> Self {
        Self {
            archives: Vec::new(),
        }
    }

    /// Opens every archive of `paths`, highest priority first. Missing or unreadable archives are
    /// skipped with a warning, as patch archives are optional.
    pub fn open(paths: &[PathBuf]) -> MpqResult<Self> {
        let mut archives: Vec<MpqArchive> = Vec::new();

        for path in paths {
            if !path.exists() {
                warn!("Archive {} not found, skipping", path.display());
                continue;
            }

            match MpqArchive::open(path) {
                Ok(archive) => archives.push(archive),
                Err(e) => warn!("Archive {} cannot be opened, skipping: {}", path.display(), e),
            }
        }

        info!("{} archives loaded", archives.len());
        Ok(Self { archives })
    }

    /// Adds an archive with the highest priority.
    pub fn push_front(&mut self, archive: MpqArchive) {
        self.archives.insert(0, archive);
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.archives.iter().any(|archive| archive.path() == path)
    }

    pub fn archive_mut(&mut self, path: &Path) -> Option<&mut MpqArchive> {
        self.archives
            .iter_mut()
            .find(|archive| archive.path() == path)
    }

    pub fn file_exists_in_an_mpq(&self, file_name: &str) -> bool {
        self.archives
            .iter()
            .any(|archive| archive.contains(file_name))
    }

    pub fn open_file_from_an_mpq(&mut self, file_name: &str) -> MpqResult<Vec<u8>> {
        for archive in &mut self.archives {
            if archive.contains(file_name) {
                trace!("Reading {} from {}", file_name, archive.path().display());
                return archive.read_file(file_name);
            }
        }

        Err(MpqError::FileNotFound(file_name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::temp_archive_path;

    #[test]
    fn test_priority_order() {
        let patch_path = temp_archive_path("manager-patch.MPQ");
        let base_path = temp_archive_path("manager-base.MPQ");

        let mut base = MpqArchive::create(&base_path, 16).unwrap();
        base.add_file("Interface\\logo.blp", b"base").unwrap();
        base.add_file("Interface\\only-base.blp", b"base only").unwrap();

        let mut patch = MpqArchive::create(&patch_path, 16).unwrap();
        patch.add_file("Interface\\logo.blp", b"patch").unwrap();

        let mut manager = ArchiveManager::open(&[
            patch_path.clone(),
            temp_archive_path("manager-missing.MPQ"),
            base_path.clone(),
        ])
        .unwrap();

        assert_eq!(manager.len(), 2);
        assert!(manager.is_open(&patch_path));
        assert_eq!(
            manager.open_file_from_an_mpq("Interface\\logo.blp").unwrap(),
            b"patch".to_vec()
        );
        assert_eq!(
            manager
                .open_file_from_an_mpq("interface/only-base.blp")
                .unwrap(),
            b"base only".to_vec()
        );
        assert!(!manager.file_exists_in_an_mpq("Interface\\missing.blp"));
    }

    #[test]
    fn test_corrupt_archive_is_skipped() {
        let corrupt_path = temp_archive_path("manager-corrupt.MPQ");
        std::fs::create_dir_all(corrupt_path.parent().unwrap()).unwrap();
        std::fs::write(&corrupt_path, b"not an archive at all").unwrap();

        let base_path = temp_archive_path("manager-valid.MPQ");
        let mut base = MpqArchive::create(&base_path, 16).unwrap();
        base.add_file("Interface\\logo.blp", b"base").unwrap();

        let mut manager = ArchiveManager::open(&[corrupt_path.clone(), base_path]).unwrap();

        assert_eq!(manager.len(), 1);
        assert!(!manager.is_open(&corrupt_path));
        assert_eq!(
            manager.open_file_from_an_mpq("Interface\\logo.blp").unwrap(),
            b"base".to_vec()
        );
    }
}
