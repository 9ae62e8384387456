use binrw::{binread, io::Cursor, BinReaderExt};
use log::debug;
use mpq::{ArchiveManager, MpqFile};

use crate::{EditorError, EditorResult};

use super::{DbcStore, DbcTypedRecord};

pub struct Dbc {
    header: DbcHeader,
    records: Vec<DbcRecord>,
    strings: DbcStringBlock,
}

impl Dbc {
    pub fn load(
        path: &str,
        archives: &mut ArchiveManager,
        disk_search_path: &str,
    ) -> EditorResult<Dbc> {
        let file = MpqFile::open(path, archives, disk_search_path)?;
        let dbc = Self::parse(file.buffer())?;
        debug!("Loaded {} ({} records)", path, dbc.length());
        Ok(dbc)
    }

    pub fn parse(raw: &[u8]) -> EditorResult<Dbc> {
        let mut reader = Cursor::new(raw);
        let header: DbcHeader = reader.read_le()?;

        if header.record_size != header.field_count * 4 {
            return Err(EditorError::InvalidAsset(format!(
                "DBC records of {} bytes cannot hold {} fields",
                header.record_size, header.field_count
            )));
        }

        let mut records: Vec<DbcRecord> = Vec::with_capacity(header.record_count as usize);
        for _ in 0..header.record_count {
            let mut fields: Vec<u32> = Vec::with_capacity(header.field_count as usize);
            for _ in 0..header.field_count {
                fields.push(reader.read_le()?);
            }
            records.push(DbcRecord { fields });
        }

        let start = reader.position() as usize;
        let end = start + header.string_block_size as usize;
        if end > raw.len() {
            return Err(EditorError::InvalidAsset(
                "DBC string block is truncated".to_owned(),
            ));
        }

        Ok(Dbc {
            header,
            records,
            strings: DbcStringBlock {
                raw_characters: raw[start..end].to_vec(),
            },
        })
    }

    pub fn as_store<T: DbcTypedRecord>(&self) -> EditorResult<DbcStore<T>> {
        if (self.header.field_count as usize) < T::FIELD_COUNT {
            return Err(EditorError::InvalidAsset(format!(
                "DBC has {} fields, expected at least {}",
                self.header.field_count,
                T::FIELD_COUNT
            )));
        }

        Ok(self
            .records
            .iter()
            .map(|dbc_record| T::from_record(dbc_record, &self.strings))
            .collect())
    }

    pub fn length(&self) -> u32 {
        self.header.record_count
    }
}

#[binread]
#[br(magic = b"WDBC")]
struct DbcHeader {
    record_count: u32,
    field_count: u32, // Field count per record
    record_size: u32,
    string_block_size: u32,
}

pub struct DbcRecord {
    pub fields: Vec<u32>,
}

impl DbcRecord {
    pub fn field_u32(&self, index: usize) -> u32 {
        self.fields[index]
    }
}

#[derive(Debug)]
pub struct DbcStringBlock {
    pub raw_characters: Vec<u8>,
}

impl DbcStringBlock {
    pub fn get(&self, offset: usize) -> Option<String> {
        let slice = self.raw_characters.get(offset..)?;
        let str_end_index = slice.iter().position(|&c| c == 0)?;

        Some(String::from_utf8_lossy(&slice[..str_end_index]).into_owned())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a DBC file out of u32 records and a string block.
    pub(crate) fn dbc_file(records: &[Vec<u32>], strings: &[u8]) -> Vec<u8> {
        let field_count = records.first().map_or(0, Vec::len) as u32;

        let mut raw = b"WDBC".to_vec();
        for value in [
            records.len() as u32,
            field_count,
            field_count * 4,
            strings.len() as u32,
        ] {
            raw.extend_from_slice(&value.to_le_bytes());
        }
        for record in records {
            for field in record {
                raw.extend_from_slice(&field.to_le_bytes());
            }
        }
        raw.extend_from_slice(strings);
        raw
    }

    #[test]
    fn test_parse() {
        let raw = dbc_file(&[vec![1, 1], vec![2, 7]], b"\0first\0second\0");
        let dbc = Dbc::parse(&raw).unwrap();

        assert_eq!(dbc.length(), 2);
        assert_eq!(dbc.records[1].field_u32(1), 7);
        assert_eq!(dbc.strings.get(1), Some("first".to_owned()));
        assert_eq!(dbc.strings.get(7), Some("second".to_owned()));
        assert_eq!(dbc.strings.get(100), None);
    }

    #[test]
    fn test_parse_rejects_bad_magic() {
        let mut raw = dbc_file(&[vec![1]], b"\0");
        raw[0] = b'X';

        assert!(matches!(Dbc::parse(&raw), Err(EditorError::BinRw(_))));
    }

    #[test]
    fn test_parse_rejects_truncated_strings() {
        let mut raw = dbc_file(&[vec![1]], b"\0name\0");
        raw.truncate(raw.len() - 3);

        assert!(matches!(
            Dbc::parse(&raw),
            Err(EditorError::InvalidAsset(_))
        ));
    }
}
