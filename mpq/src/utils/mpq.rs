use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
};

use binrw::{io::Cursor, BinReaderExt};

use crate::{
    archive::MPQHeader, constants::MPQ_SIGNATURE, utils::crypto::CryptTable, MpqError, MpqResult,
};

pub fn get_header(file: &mut File) -> MpqResult<MPQHeader> {
    let mut buffer = [0; 1024];
    file.seek(SeekFrom::Start(0))?;
    let _ = file.read(&mut buffer)?;

    let mut reader = Cursor::new(buffer);
    let mpq_header: MPQHeader = reader.read_le()?;
    if mpq_header.signature == MPQ_SIGNATURE {
        Ok(mpq_header)
    } else {
        Err(MpqError::InvalidArchive(
            "input file is not an MPQ archive".to_owned(),
        ))
    }
}

// Archives always store names with backslashes
pub fn normalize_name(file_name: &str) -> String {
    file_name.replace('/', "\\")
}

// http://www.zezula.net/en/mpq/techinfo.html#Hashes
pub fn hash_string(crypt_table: &CryptTable, file_name: &str, hash_type: u32) -> u32 {
    let mut seed1: u32 = 0x7FED7FED;
    let mut seed2: u32 = 0xEEEEEEEE;

    for c in file_name.bytes() {
        let ch = if c == b'/' { b'\\' } else { c.to_ascii_uppercase() } as u32;

        let crypt_base: u32 = crypt_table[((hash_type << 8) + ch) as usize];

        seed1 = crypt_base ^ (seed1.wrapping_add(seed2));
        seed2 = ch.wrapping_add(seed1.wrapping_add(seed2.wrapping_add(seed2 << 5).wrapping_add(3)));
    }

    seed1
}
