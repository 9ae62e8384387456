use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use binrw::{binrw, io::Cursor, BinReaderExt, BinWriterExt};
use bytemuck::cast_slice;
use log::{debug, trace};

use crate::{
    constants::{
        MPQFileFlags, BLOCK_TABLE_ENTRY_SIZE, HASH_ENTRY_IS_DELETED, HASH_ENTRY_IS_FREE,
        HASH_TABLE_ENTRY_SIZE, HASH_TABLE_HASH_A_OFFSET, HASH_TABLE_HASH_B_OFFSET,
        HASH_TABLE_HASH_OFFSET, HASH_TABLE_KEY_OFFSET, MPQ_HEADER_SIZE_V1, MPQ_SIGNATURE,
    },
    utils::{
        compression::decompress,
        crypto::{decrypt_block_in_place, encrypt_block_in_place, prepare_crypt_table, CryptTable},
        mpq::{get_header, hash_string, normalize_name},
    },
    MpqError, MpqResult,
};

#[binrw]
#[derive(Debug, Clone)] // http://www.zezula.net/en/mpq/mpqformat.html
pub struct MPQHeader {
    pub signature: [u8; 4], // Must be "MPQ\x1A"
    pub header_size: u32,
    pub archive_size: u32,
    pub format_version: u16,
    pub block_size: u16,         // Sector size is 512 << block_size
    pub hash_table_offset: u32,  // From the beginning of the archive
    pub block_table_offset: u32, // From the beginning of the archive
    pub hash_table_size: u32,
    pub block_table_size: u32,
    // Only meaningful when header_size >= 44
    pub _high_block_table_pos: u64,
    pub _hash_table_pos_high: u16,
    pub _block_table_pos_high: u16,
}

impl MPQHeader {
    fn sector_size(&self) -> usize {
        512 << self.block_size
    }
}

#[binrw]
#[derive(Debug, Clone, Copy)]
pub struct MPQHashTableEntry {
    pub name1: u32,
    pub name2: u32,
    pub locale: u16,
    pub platform: u16,
    pub block_index: u32,
}

impl MPQHashTableEntry {
    const FREE: MPQHashTableEntry = MPQHashTableEntry {
        name1: HASH_ENTRY_IS_FREE,
        name2: HASH_ENTRY_IS_FREE,
        locale: 0xFFFF,
        platform: 0xFFFF,
        block_index: HASH_ENTRY_IS_FREE,
    };

    pub fn is_free(&self) -> bool {
        self.block_index == HASH_ENTRY_IS_FREE
    }

    pub fn is_deleted(&self) -> bool {
        self.block_index == HASH_ENTRY_IS_DELETED
    }
}

#[binrw]
#[derive(Debug, Clone, Copy)]
pub struct MPQBlockTableEntry {
    pub file_pos: u32,
    pub compressed_file_size: u32,
    pub uncompressed_file_size: u32,
    pub flags: u32,
}

impl MPQBlockTableEntry {
    fn data_end(&self) -> u32 {
        self.file_pos + self.compressed_file_size
    }
}

pub struct MpqArchive {
    path: PathBuf,
    header: MPQHeader,
    hash_table: Vec<MPQHashTableEntry>,
    block_table: Vec<MPQBlockTableEntry>,
    crypt_table: CryptTable,
    underlying_file: File,
}

impl MpqArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> MpqResult<MpqArchive> {
        let path = path.as_ref().to_path_buf();
        let crypt_table = prepare_crypt_table();

        let mut file = File::open(&path)?;
        let header = get_header(&mut file)?;

        let hash_table: Vec<MPQHashTableEntry> = read_table(
            &mut file,
            header.hash_table_offset,
            header.hash_table_size,
            hash_string(&crypt_table, "(hash table)", HASH_TABLE_KEY_OFFSET),
            &crypt_table,
        )?;
        let block_table: Vec<MPQBlockTableEntry> = read_table(
            &mut file,
            header.block_table_offset,
            header.block_table_size,
            hash_string(&crypt_table, "(block table)", HASH_TABLE_KEY_OFFSET),
            &crypt_table,
        )?;

        debug!(
            "Opened archive {} ({} hash entries, {} blocks)",
            path.display(),
            hash_table.len(),
            block_table.len()
        );

        Ok(MpqArchive {
            path,
            header,
            hash_table,
            block_table,
            crypt_table,
            underlying_file: file,
        })
    }

    /// Creates an empty archive on disk, typically used as a patch archive receiving edited files.
    pub fn create<P: AsRef<Path>>(path: P, hash_table_size: u32) -> MpqResult<MpqArchive> {
        if !hash_table_size.is_power_of_two() {
            return Err(MpqError::InvalidArchive(format!(
                "hash table size must be a power of two, got {}",
                hash_table_size
            )));
        }

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let header = MPQHeader {
            signature: MPQ_SIGNATURE,
            header_size: MPQ_HEADER_SIZE_V1,
            archive_size: MPQ_HEADER_SIZE_V1,
            format_version: 0,
            block_size: 3,
            hash_table_offset: MPQ_HEADER_SIZE_V1,
            block_table_offset: MPQ_HEADER_SIZE_V1,
            hash_table_size,
            block_table_size: 0,
            _high_block_table_pos: 0,
            _hash_table_pos_high: 0,
            _block_table_pos_high: 0,
        };

        let underlying_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;

        let mut archive = MpqArchive {
            path: path.as_ref().to_path_buf(),
            header,
            hash_table: vec![MPQHashTableEntry::FREE; hash_table_size as usize],
            block_table: Vec::new(),
            crypt_table: prepare_crypt_table(),
            underlying_file,
        };
        archive.write_tables(MPQ_HEADER_SIZE_V1)?;

        Ok(archive)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.find_hash_table_entry(file_name).is_some()
    }

    pub fn read_file(&mut self, file_name: &str) -> MpqResult<Vec<u8>> {
        let hash_index = self
            .find_hash_table_entry(file_name)
            .ok_or_else(|| MpqError::FileNotFound(file_name.to_owned()))?;
        let block_index = self.hash_table[hash_index].block_index as usize;
        let entry = self.block_table[block_index];

        self.get_file_data(file_name, &entry)
    }

    /// Stores `data` uncompressed under `file_name`, replacing any previous file of that name.
    pub fn add_file(&mut self, file_name: &str, data: &[u8]) -> MpqResult<()> {
        let file_name = normalize_name(file_name);
        let (existing, available) = self.probe_hash_table(&file_name);

        let data_pos = self
            .block_table
            .iter()
            .map(|block| block.data_end())
            .max()
            .unwrap_or(0)
            .max(self.header.header_size);

        let new_block = MPQBlockTableEntry {
            file_pos: data_pos,
            compressed_file_size: data.len() as u32,
            uncompressed_file_size: data.len() as u32,
            flags: MPQFileFlags::FileExists as u32,
        };

        let hash_index = match (existing, available) {
            (Some(index), _) => {
                let block_index = self.hash_table[index].block_index as usize;
                self.block_table[block_index] = new_block;
                index
            }
            (None, Some(index)) => {
                self.block_table.push(new_block);
                self.hash_table[index] = MPQHashTableEntry {
                    name1: hash_string(&self.crypt_table, &file_name, HASH_TABLE_HASH_A_OFFSET),
                    name2: hash_string(&self.crypt_table, &file_name, HASH_TABLE_HASH_B_OFFSET),
                    locale: 0,
                    platform: 0,
                    block_index: (self.block_table.len() - 1) as u32,
                };
                index
            }
            (None, None) => return Err(MpqError::HashTableFull),
        };

        // Reads go through a read-only handle, writes need their own
        let mut writer = OpenOptions::new().write(true).open(&self.path)?;
        writer.seek(SeekFrom::Start(data_pos as u64))?;
        writer.write_all(data)?;
        drop(writer);

        trace!(
            "Added {} ({} bytes) to {} in hash slot {}",
            file_name,
            data.len(),
            self.path.display(),
            hash_index
        );

        self.write_tables(data_pos + data.len() as u32)
    }

    fn write_tables(&mut self, tables_pos: u32) -> MpqResult<()> {
        self.header.hash_table_offset = tables_pos;
        self.header.hash_table_size = self.hash_table.len() as u32;
        self.header.block_table_offset =
            tables_pos + (self.hash_table.len() * HASH_TABLE_ENTRY_SIZE) as u32;
        self.header.block_table_size = self.block_table.len() as u32;
        self.header.archive_size = self.header.block_table_offset
            + (self.block_table.len() * BLOCK_TABLE_ENTRY_SIZE) as u32;

        let hash_table = encrypt_table(
            &self.hash_table,
            hash_string(&self.crypt_table, "(hash table)", HASH_TABLE_KEY_OFFSET),
            &self.crypt_table,
        )?;
        let block_table = encrypt_table(
            &self.block_table,
            hash_string(&self.crypt_table, "(block table)", HASH_TABLE_KEY_OFFSET),
            &self.crypt_table,
        )?;

        let mut header = Cursor::new(Vec::new());
        header.write_le(&self.header)?;
        let mut header = header.into_inner();
        header.truncate(self.header.header_size as usize);

        let mut writer = OpenOptions::new().write(true).open(&self.path)?;
        writer.seek(SeekFrom::Start(0))?;
        writer.write_all(&header)?;
        writer.seek(SeekFrom::Start(self.header.hash_table_offset as u64))?;
        writer.write_all(&hash_table)?;
        writer.write_all(&block_table)?;
        writer.set_len(self.header.archive_size as u64)?;

        Ok(())
    }

    /// Returns the slot holding `file_name` if any, and the first slot a new entry could take.
    fn probe_hash_table(&self, file_name: &str) -> (Option<usize>, Option<usize>) {
        let size = self.hash_table.len();
        if size == 0 {
            return (None, None);
        }

        let hash = hash_string(&self.crypt_table, file_name, HASH_TABLE_HASH_OFFSET);
        let hash_a = hash_string(&self.crypt_table, file_name, HASH_TABLE_HASH_A_OFFSET);
        let hash_b = hash_string(&self.crypt_table, file_name, HASH_TABLE_HASH_B_OFFSET);

        let hash_start = hash as usize % size;
        let mut hash_pos = hash_start;
        let mut available: Option<usize> = None;

        loop {
            let candidate = &self.hash_table[hash_pos];

            if candidate.is_free() {
                return (None, available.or(Some(hash_pos)));
            }

            if candidate.is_deleted() {
                available = available.or(Some(hash_pos));
            } else if candidate.name1 == hash_a
                && candidate.name2 == hash_b
                && (candidate.block_index as usize) < self.block_table.len()
            {
                return (Some(hash_pos), available);
            }

            hash_pos = (hash_pos + 1) % size;
            if hash_pos == hash_start {
                return (None, available);
            }
        }
    }

    fn find_hash_table_entry(&self, file_name: &str) -> Option<usize> {
        self.probe_hash_table(&normalize_name(file_name)).0
    }

    fn get_file_data(&mut self, file_name: &str, entry: &MPQBlockTableEntry) -> MpqResult<Vec<u8>> {
        if !MPQFileFlags::FileExists.is_set(entry.flags)
            || MPQFileFlags::DeleteMarker.is_set(entry.flags)
        {
            return Err(MpqError::FileNotFound(file_name.to_owned()));
        }

        if MPQFileFlags::Encrypted.is_set(entry.flags) {
            return Err(MpqError::Unsupported(format!(
                "{} is encrypted",
                file_name
            )));
        }

        let mut buffer = vec![0_u8; entry.compressed_file_size as usize];
        self.underlying_file
            .seek(SeekFrom::Start(entry.file_pos as u64))?;
        self.underlying_file.read_exact(&mut buffer)?;

        let file_size = entry.uncompressed_file_size as usize;
        let is_compressed = MPQFileFlags::CompressedMulti.is_set(entry.flags)
            || MPQFileFlags::CompressedWithPKWare.is_set(entry.flags);

        if !is_compressed {
            buffer.truncate(file_size);
            return Ok(buffer);
        }

        if MPQFileFlags::SingleUnit.is_set(entry.flags) {
            return decompress_sector(&buffer, file_size);
        }

        let sector_size = self.header.sector_size();
        let sector_count = (file_size + sector_size - 1) / sector_size;

        let offsets_len = (sector_count + 1) * 4;
        if buffer.len() < offsets_len {
            return Err(MpqError::InvalidArchive(format!(
                "{} has a truncated sector offset table",
                file_name
            )));
        }
        let sector_offsets: Vec<usize> = buffer[..offsets_len]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as usize)
            .collect();

        let mut final_buffer: Vec<u8> = Vec::with_capacity(file_size);

        // Read sectors one by one until we have gathered the expected amount of bytes
        for sector_index in 0..sector_count {
            let (start, end) = (sector_offsets[sector_index], sector_offsets[sector_index + 1]);
            if start > end || end > buffer.len() {
                return Err(MpqError::InvalidArchive(format!(
                    "{} has an invalid sector {}",
                    file_name, sector_index
                )));
            }

            let expected = sector_size.min(file_size - sector_index * sector_size);
            let mut sector = decompress_sector(&buffer[start..end], expected)?;
            final_buffer.append(&mut sector);
        }

        Ok(final_buffer)
    }
}

// A sector is only compressed when it is smaller than its expected size
fn decompress_sector(sector: &[u8], expected_size: usize) -> MpqResult<Vec<u8>> {
    if sector.len() >= expected_size || sector.is_empty() {
        return Ok(sector[..expected_size.min(sector.len())].to_vec());
    }

    let compression_flags = sector[0];
    trace!("compression_flags: {:#X}", compression_flags);

    decompress(&sector[1..], compression_flags, expected_size)
}

fn read_table<T>(
    file: &mut File,
    offset: u32,
    entry_count: u32,
    key: u32,
    crypt_table: &CryptTable,
) -> MpqResult<Vec<T>>
where
    T: for<'a> binrw::BinRead<Args<'a> = ()>,
{
    // Hash and block table entries have the same size
    let mut buffer = vec![0_u8; entry_count as usize * HASH_TABLE_ENTRY_SIZE];
    file.seek(SeekFrom::Start(offset as u64))?;
    file.read_exact(&mut buffer)?;

    let mut words: Vec<u32> = buffer
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    decrypt_block_in_place(&mut words, key, crypt_table);

    let decrypted: &[u8] = cast_slice(&words);
    let mut reader = Cursor::new(decrypted);
    let mut entries: Vec<T> = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        entries.push(reader.read_le()?);
    }

    Ok(entries)
}

fn encrypt_table<T>(entries: &[T], key: u32, crypt_table: &CryptTable) -> MpqResult<Vec<u8>>
where
    T: for<'a> binrw::BinWrite<Args<'a> = ()>,
{
    let mut writer = Cursor::new(Vec::new());
    for entry in entries {
        writer.write_le(entry)?;
    }

    let mut words: Vec<u32> = writer
        .into_inner()
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    encrypt_block_in_place(&mut words, key, crypt_table);

    let encrypted: &[u8] = cast_slice(&words);
    Ok(encrypted.to_vec())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;

    use super::*;

    pub fn temp_archive_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("rustbolt-mpq-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_created_archive_is_empty_and_reopens() {
        let path = temp_archive_path("empty.MPQ");
        let archive = MpqArchive::create(&path, 16).unwrap();
        assert!(!archive.contains("World\\wmo\\test.wmo"));

        let archive = MpqArchive::open(&path).unwrap();
        assert_eq!(archive.hash_table.len(), 16);
        assert!(archive.block_table.is_empty());
    }

    #[test]
    fn test_added_file_reads_back_after_reopen() {
        let path = temp_archive_path("added.MPQ");
        let mut archive = MpqArchive::create(&path, 16).unwrap();

        archive
            .add_file("World/wmo/test.wmo", b"first version")
            .unwrap();
        archive
            .add_file("World\\maps\\test\\test_32_32.adt", b"tile")
            .unwrap();
        archive
            .add_file("WORLD\\WMO\\TEST.WMO", b"second version")
            .unwrap();

        let mut archive = MpqArchive::open(&path).unwrap();
        assert_eq!(archive.block_table.len(), 2);
        assert_eq!(
            archive.read_file("world\\wmo\\test.wmo").unwrap(),
            b"second version".to_vec()
        );
        assert_eq!(
            archive.read_file("World/maps/test/test_32_32.adt").unwrap(),
            b"tile".to_vec()
        );
        assert!(matches!(
            archive.read_file("missing.blp"),
            Err(MpqError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_full_hash_table() {
        let path = temp_archive_path("full.MPQ");
        let mut archive = MpqArchive::create(&path, 2).unwrap();

        archive.add_file("a.txt", b"a").unwrap();
        archive.add_file("b.txt", b"b").unwrap();
        assert!(matches!(
            archive.add_file("c.txt", b"c"),
            Err(MpqError::HashTableFull)
        ));
    }

    #[test]
    fn test_compressed_single_unit_file() {
        let original = b"liquid texture data ".repeat(32);
        let mut sector = vec![0x02_u8];
        sector.append(&mut miniz_oxide::deflate::compress_to_vec_zlib(&original, 6));

        assert_eq!(decompress_sector(&sector, original.len()).unwrap(), original);
    }
}
