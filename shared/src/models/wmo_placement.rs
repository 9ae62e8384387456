use binrw::{
    binrw,
    io::{Cursor, Seek, Write},
    BinReaderExt, BinWriterExt,
};

use super::geometry::{BoundingBox, Vector3};

// Remember that the level format readers/writers depend on this exact layout.
pub const WMO_PLACEMENT_RECORD_SIZE: usize = 60;
pub const MODF_ENTRY_SIZE: usize = 64;

/// Placement of a WMO as stored in a level file stream, little-endian.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WmoPlacementRecord {
    pub unique_id: u32,
    pub position: Vector3,
    pub rotation: Vector3, // Degrees
    pub extents: BoundingBox,
    pub flags: u16,
    pub doodad_set: u16,
    pub name_set: u16,
    pub unknown: u16,
}

impl WmoPlacementRecord {
    pub fn from_le_bytes(raw: &[u8; WMO_PLACEMENT_RECORD_SIZE]) -> Result<Self, binrw::Error> {
        Cursor::new(&raw[..]).read_le()
    }

    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> Result<(), binrw::Error> {
        writer.write_le(self)
    }

    pub fn to_le_bytes(&self) -> Result<Vec<u8>, binrw::Error> {
        let mut writer = Cursor::new(Vec::with_capacity(WMO_PLACEMENT_RECORD_SIZE));
        self.write_to(&mut writer)?;
        Ok(writer.into_inner())
    }
}

impl From<&ModfEntry> for WmoPlacementRecord {
    fn from(entry: &ModfEntry) -> Self {
        Self {
            unique_id: entry.unique_id,
            position: Vector3::from_array(entry.position),
            rotation: Vector3::from_array(entry.rotation),
            extents: BoundingBox::new(
                Vector3::from_array(entry.extents[0]),
                Vector3::from_array(entry.extents[1]),
            ),
            flags: entry.flags,
            doodad_set: entry.doodad_set,
            name_set: entry.name_set,
            unknown: entry.unknown,
        }
    }
}

/// One entry of an ADT MODF chunk: a stream record prefixed with the index of the WMO filename
/// in the MWID table.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModfEntry {
    pub name_id: u32,
    pub unique_id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub extents: [[f32; 3]; 2],
    pub flags: u16,
    pub doodad_set: u16,
    pub name_set: u16,
    pub unknown: u16,
}

impl ModfEntry {
    pub fn parse_all(raw: &[u8]) -> Result<Vec<ModfEntry>, binrw::Error> {
        let mut reader = Cursor::new(raw);
        let mut entries: Vec<ModfEntry> = Vec::with_capacity(raw.len() / MODF_ENTRY_SIZE);

        for _ in 0..(raw.len() / MODF_ENTRY_SIZE) {
            let entry: ModfEntry = reader.read_le()?;
            entries.push(entry);
        }

        Ok(entries)
    }

    pub fn from_record(name_id: u32, record: &WmoPlacementRecord) -> Self {
        Self {
            name_id,
            unique_id: record.unique_id,
            position: record.position.as_array(),
            rotation: record.rotation.as_array(),
            extents: [record.extents.min.as_array(), record.extents.max.as_array()],
            flags: record.flags,
            doodad_set: record.doodad_set,
            name_set: record.name_set,
            unknown: record.unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        let mut writer = Cursor::new(Vec::new());
        writer.write_le(&WmoPlacementRecord::default()).unwrap();
        assert_eq!(writer.into_inner().len(), WMO_PLACEMENT_RECORD_SIZE);

        let mut writer = Cursor::new(Vec::new());
        writer.write_le(&ModfEntry::default()).unwrap();
        assert_eq!(writer.into_inner().len(), MODF_ENTRY_SIZE);
    }

    #[test]
    fn test_parse_all_ignores_trailing_partial_entry() {
        let first = ModfEntry {
            name_id: 2,
            unique_id: 1234,
            position: [100.0, 20.0, -300.0],
            rotation: [0.0, 90.0, 0.0],
            extents: [[90.0, 10.0, -310.0], [110.0, 30.0, -290.0]],
            flags: 0x4,
            doodad_set: 1,
            name_set: 0,
            unknown: 0,
        };

        let mut writer = Cursor::new(Vec::new());
        writer.write_le(&first).unwrap();
        let mut raw = writer.into_inner();
        raw.extend_from_slice(&[0xAB; 10]);

        let entries = ModfEntry::parse_all(&raw).unwrap();
        assert_eq!(entries, vec![first]);
    }

    #[test]
    fn test_record_layout() {
        let record = WmoPlacementRecord {
            unique_id: 0x01020304,
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Vector3::new(0.0, 90.0, 0.0),
            extents: BoundingBox::new(Vector3::new(-1.0, -2.0, -3.0), Vector3::new(4.0, 5.0, 6.0)),
            flags: 0x0A0B,
            doodad_set: 2,
            name_set: 3,
            unknown: 4,
        };

        let raw = record.to_le_bytes().unwrap();
        assert_eq!(&raw[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&raw[4..8], &1.0_f32.to_le_bytes());
        assert_eq!(&raw[16..20], &0.0_f32.to_le_bytes());
        assert_eq!(&raw[28..32], &(-1.0_f32).to_le_bytes());
        assert_eq!(&raw[52..54], &[0x0B, 0x0A]);
        assert_eq!(&raw[58..60], &[4, 0]);
    }

    #[test]
    fn test_modf_entry_conversion() {
        let entry = ModfEntry {
            name_id: 7,
            unique_id: 99,
            position: [1.0, 2.0, 3.0],
            rotation: [4.0, 5.0, 6.0],
            extents: [[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]],
            flags: 1,
            doodad_set: 2,
            name_set: 3,
            unknown: 4,
        };

        let record = WmoPlacementRecord::from(&entry);
        assert_eq!(record.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(record.extents.max, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(ModfEntry::from_record(7, &record), entry);
    }
}
