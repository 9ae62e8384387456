use crate::constants::CRYPT_TABLE_SIZE;

pub type CryptTable = [u32; CRYPT_TABLE_SIZE];

// http://www.zezula.net/en/mpq/techinfo.html#Encryption
pub fn prepare_crypt_table() -> CryptTable {
    let mut crypt_table = [0_u32; CRYPT_TABLE_SIZE];
    let mut seed: u32 = 0x00100001;

    for index1 in 0..0x100 {
        let mut index2 = index1;

        for _i in 0..5 {
            seed = (seed * 125 + 3) % 0x2AAAAB;
            let temp1: u32 = (seed & 0xFFFF) << 0x10;

            seed = (seed * 125 + 3) % 0x2AAAAB;
            let temp2: u32 = seed & 0xFFFF;

            crypt_table[index2] = temp1 | temp2;

            index2 += 0x100;
        }
    }

    crypt_table
}

fn next_key(key: u32) -> u32 {
    ((!key << 0x15).wrapping_add(0x11111111)) | (key >> 0x0B)
}

pub fn decrypt_block_in_place(data: &mut [u32], key: u32, crypt_table: &CryptTable) {
    let mut key = key;
    let mut seed: u32 = 0xEEEEEEEE;
    for value in data.iter_mut() {
        seed = seed.wrapping_add(crypt_table[0x400 + (key & 0xFF) as usize]);

        let ch = *value ^ (key.wrapping_add(seed));
        key = next_key(key);
        seed = ch.wrapping_add(seed.wrapping_add(seed << 5).wrapping_add(3));

        *value = ch;
    }
}

pub fn encrypt_block_in_place(data: &mut [u32], key: u32, crypt_table: &CryptTable) {
    let mut key = key;
    let mut seed: u32 = 0xEEEEEEEE;
    for value in data.iter_mut() {
        seed = seed.wrapping_add(crypt_table[0x400 + (key & 0xFF) as usize]);

        let ch = *value;
        *value = ch ^ (key.wrapping_add(seed));
        key = next_key(key);
        seed = ch.wrapping_add(seed.wrapping_add(seed << 5).wrapping_add(3));
    }
}
