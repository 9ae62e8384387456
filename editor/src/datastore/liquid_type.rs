use mpq::ArchiveManager;

use crate::EditorResult;

use super::{
    dbc::{Dbc, DbcRecord, DbcStringBlock},
    DbcStore, DbcTypedRecord,
};

pub const LIQUID_TYPE_DBC: &str = "DBFilesClient\\LiquidType.dbc";

const ID: usize = 0;
const NAME: usize = 1;
const TYPE: usize = 3;
const TEXTURE: usize = 15; // First of the 6 texture columns

#[derive(Debug, Clone, PartialEq)]
pub struct LiquidTypeRecord {
    pub name: String,
    pub liquid_type: u32, // 0 water, 1 ocean, 2 magma, 3 slime
    pub texture_pattern: String, // printf-style, %d is the animation frame
}

impl DbcTypedRecord for LiquidTypeRecord {
    const FIELD_COUNT: usize = TEXTURE + 1;

    fn from_record(record: &DbcRecord, strings: &DbcStringBlock) -> (u32, Self) {
        let key = record.field_u32(ID);

        let record = LiquidTypeRecord {
            name: strings
                .get(record.field_u32(NAME) as usize)
                .unwrap_or_default(),
            liquid_type: record.field_u32(TYPE),
            texture_pattern: strings
                .get(record.field_u32(TEXTURE) as usize)
                .unwrap_or_default(),
        };

        (key, record)
    }
}

pub struct LiquidTypes {
    records: DbcStore<LiquidTypeRecord>,
}

impl LiquidTypes {
    pub fn load(archives: &mut ArchiveManager, disk_search_path: &str) -> EditorResult<Self> {
        Self::from_dbc(&Dbc::load(LIQUID_TYPE_DBC, archives, disk_search_path)?)
    }

    pub fn from_dbc(dbc: &Dbc) -> EditorResult<Self> {
        Ok(Self {
            records: dbc.as_store()?,
        })
    }

    pub fn empty() -> Self {
        Self {
            records: DbcStore::new(),
        }
    }

    pub fn get(&self, liquid_id: u32) -> Option<&LiquidTypeRecord> {
        self.records.get(&liquid_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::datastore::dbc::tests::dbc_file;

    /// LiquidType.dbc with "Slime" (id 4, type 3) using the texture at offset 7.
    pub(crate) fn liquid_type_dbc() -> Vec<u8> {
        let mut record = vec![0_u32; 45];
        record[ID] = 4;
        record[NAME] = 1;
        record[TYPE] = 3;
        record[TEXTURE] = 7;

        dbc_file(&[record], b"\0Slime\0XTextures\\slime\\slime.%d.blp\0")
    }

    #[test]
    fn test_from_dbc() {
        let dbc = Dbc::parse(&liquid_type_dbc()).unwrap();
        let liquid_types = LiquidTypes::from_dbc(&dbc).unwrap();

        assert_eq!(liquid_types.len(), 1);
        assert_eq!(
            liquid_types.get(4),
            Some(&LiquidTypeRecord {
                name: "Slime".to_owned(),
                liquid_type: 3,
                texture_pattern: "XTextures\\slime\\slime.%d.blp".to_owned(),
            })
        );
        assert_eq!(liquid_types.get(1), None);
    }

    #[test]
    fn test_too_few_fields() {
        let dbc = Dbc::parse(&dbc_file(&[vec![1, 2, 3]], b"\0")).unwrap();
        assert!(LiquidTypes::from_dbc(&dbc).is_err());
    }
}
