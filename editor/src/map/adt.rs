use std::collections::HashMap;

use binrw::{io::Cursor, BinReaderExt, NullString};
use log::{trace, warn};
use mpq::{ArchiveManager, MpqFile};
use shared::models::wmo_placement::ModfEntry;

use crate::{chunk::FileChunk, EditorResult};

/// The WMO placement tables of a map tile.
#[derive(Debug, Default)]
pub struct Adt {
    wmo_names: HashMap<u32, String>, // By offset in MWMO
    wmo_name_offsets: Vec<u32>,      // MWID
    wmo_placements: Vec<ModfEntry>,  // MODF
}

impl Adt {
    pub fn load(
        path: &str,
        archives: &mut ArchiveManager,
        disk_search_path: &str,
    ) -> EditorResult<Adt> {
        let file = MpqFile::open(path, archives, disk_search_path)?;
        Self::parse(file.buffer())
    }

    pub fn parse(raw: &[u8]) -> EditorResult<Adt> {
        let mut adt = Adt::default();

        for chunk in FileChunk::read_all(raw)? {
            if chunk.is(b"MWMO") {
                adt.wmo_names = parse_names(chunk.data())?;
            } else if chunk.is(b"MWID") {
                let mut reader = Cursor::new(chunk.data());
                for _ in 0..(chunk.data().len() / 4) {
                    let offset: u32 = reader.read_le()?;
                    adt.wmo_name_offsets.push(offset);
                }
            } else if chunk.is(b"MODF") {
                adt.wmo_placements = ModfEntry::parse_all(chunk.data())?;
            } else {
                trace!("Skipping chunk {}", chunk.magic_str());
            }
        }

        Ok(adt)
    }

    pub fn wmo_name(&self, name_id: u32) -> Option<&str> {
        let offset = self.wmo_name_offsets.get(name_id as usize)?;
        self.wmo_names.get(offset).map(String::as_str)
    }

    /// The placements whose WMO name could be resolved, with that name.
    pub fn wmo_placements(&self) -> Vec<(&str, &ModfEntry)> {
        self.wmo_placements
            .iter()
            .filter_map(|entry| match self.wmo_name(entry.name_id) {
                Some(name) => Some((name, entry)),
                None => {
                    warn!(
                        "WMO placement {} refers to unknown name {}",
                        entry.unique_id, entry.name_id
                    );
                    None
                }
            })
            .collect()
    }
}

fn parse_names(raw: &[u8]) -> Result<HashMap<u32, String>, binrw::Error> {
    let mut names: HashMap<u32, String> = HashMap::new();
    let mut reader = Cursor::new(raw);

    while (reader.position() as usize) < raw.len() {
        let offset = reader.position() as u32;
        let name: NullString = reader.read_le()?;
        if !name.0.is_empty() {
            names.insert(offset, name.to_string());
        }
    }

    Ok(names)
}

#[cfg(test)]
pub(crate) mod tests {
    use binrw::{io::Cursor, BinWriterExt};

    use super::*;
    use crate::chunk::tests::write_chunk;

    pub(crate) fn tile(names: &[&str], placements: &[ModfEntry]) -> Vec<u8> {
        let mut mwmo = Vec::new();
        let mut mwid = Vec::new();
        for name in names {
            mwid.extend_from_slice(&(mwmo.len() as u32).to_le_bytes());
            mwmo.extend_from_slice(name.as_bytes());
            mwmo.push(0);
        }

        let mut modf = Cursor::new(Vec::new());
        for entry in placements {
            modf.write_le(entry).unwrap();
        }

        let mut raw = Vec::new();
        write_chunk(&mut raw, b"MVER", &18_u32.to_le_bytes());
        write_chunk(&mut raw, b"MWMO", &mwmo);
        write_chunk(&mut raw, b"MWID", &mwid);
        write_chunk(&mut raw, b"MODF", &modf.into_inner());
        raw
    }

    pub(crate) fn placement(name_id: u32, unique_id: u32) -> ModfEntry {
        ModfEntry {
            name_id,
            unique_id,
            position: [100.0, 20.0, 300.0],
            rotation: [0.0, 180.0, 0.0],
            extents: [[90.0, 10.0, 290.0], [110.0, 30.0, 310.0]],
            ..Default::default()
        }
    }

    #[test]
    fn test_wmo_placements() {
        let raw = tile(
            &["World\\wmo\\a.wmo", "World\\wmo\\b.wmo"],
            &[placement(1, 10), placement(0, 11), placement(5, 12)],
        );

        let adt = Adt::parse(&raw).unwrap();
        let placements = adt.wmo_placements();

        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].0, "World\\wmo\\b.wmo");
        assert_eq!(placements[0].1.unique_id, 10);
        assert_eq!(placements[1].0, "World\\wmo\\a.wmo");
        assert_eq!(adt.wmo_name(5), None);
    }

    #[test]
    fn test_tile_without_wmos() {
        let mut raw = Vec::new();
        write_chunk(&mut raw, b"MVER", &18_u32.to_le_bytes());

        let adt = Adt::parse(&raw).unwrap();
        assert!(adt.wmo_placements().is_empty());
    }
}
