use std::collections::HashMap;

use self::dbc::{DbcRecord, DbcStringBlock};

pub mod dbc;
pub mod liquid_type;

pub type DbcStore<T> = HashMap<u32, T>;

pub trait DbcTypedRecord: Sized {
    /// Fields a record needs for `from_record` to read it.
    const FIELD_COUNT: usize;

    fn from_record(record: &DbcRecord, strings: &DbcStringBlock) -> (u32, Self);
}
