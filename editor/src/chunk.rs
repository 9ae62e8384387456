use binrw::{binread, io::Cursor, BinReaderExt};

/// A chunk of a chunked client file (WMO, ADT). Magics are stored reversed on disk.
#[binread]
#[derive(Debug)]
pub struct FileChunk {
    magic: [u8; 4],
    size: u32,
    #[br(count = size)]
    data: Vec<u8>,
}

impl FileChunk {
    /// Reads every chunk of `raw`, stops at the first one that is cut short.
    pub fn read_all(raw: &[u8]) -> Result<Vec<FileChunk>, binrw::Error> {
        let mut reader = Cursor::new(raw);
        let mut chunks: Vec<FileChunk> = Vec::new();

        while (reader.position() as usize) + 8 <= raw.len() {
            let chunk: FileChunk = reader.read_le()?;
            chunks.push(chunk);
        }

        Ok(chunks)
    }

    pub fn magic_str(&self) -> String {
        let mut magic = self.magic.to_vec();
        magic.reverse();
        String::from_utf8_lossy(&magic).into_owned()
    }

    /// Compares against the magic as it is written in documentation, e.g. `b"MOHD"`.
    pub fn is(&self, magic: &[u8; 4]) -> bool {
        self.magic.iter().rev().eq(magic.iter())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn write_chunk(out: &mut Vec<u8>, magic: &[u8; 4], data: &[u8]) {
        out.extend(magic.iter().rev());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }

    #[test]
    fn test_read_all() {
        let mut raw = Vec::new();
        write_chunk(&mut raw, b"MVER", &17_u32.to_le_bytes());
        write_chunk(&mut raw, b"MOGI", &[]);

        let chunks = FileChunk::read_all(&raw).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is(b"MVER"));
        assert_eq!(chunks[0].magic_str(), "MVER");
        assert_eq!(chunks[0].data(), &17_u32.to_le_bytes());
        assert!(chunks[1].is(b"MOGI"));
        assert_eq!(chunks[1].size(), 0);
    }

    #[test]
    fn test_truncated_chunk_is_an_error() {
        let mut raw = Vec::new();
        write_chunk(&mut raw, b"MVER", &17_u32.to_le_bytes());
        raw.truncate(raw.len() - 2);

        assert!(FileChunk::read_all(&raw).is_err());
    }
}
