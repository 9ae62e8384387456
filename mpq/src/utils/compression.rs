use bzip2::Decompress;

use crate::{MpqError, MpqResult};

#[allow(dead_code)]
pub enum CompressionTypeFlags {
    Huffman = 0x01,
    Zlib = 0x02,
    PkZip = 0x08, // pkware dcl compression
    Bzip2 = 0x10,
    WaveMono = 0x40,
    WaveStereo = 0x80,
}

impl CompressionTypeFlags {
    fn is_set(self, flags: u8) -> bool {
        flags & (self as u8) != 0
    }
}

// http://web.archive.org/web/20090521194815/http://wiki.devklog.net/index.php?title=The_MoPaQ_Archive_Format

fn decompress_bzip2(input: &[u8], expected_size: usize) -> MpqResult<Vec<u8>> {
    let mut decompressor = Decompress::new(false);
    let mut output: Vec<u8> = Vec::with_capacity(expected_size);

    decompressor
        .decompress_vec(input, &mut output)
        .map_err(|e| MpqError::InvalidArchive(format!("bzip2: {}", e)))?;

    Ok(output)
}

fn decompress_zlib(input: &[u8]) -> MpqResult<Vec<u8>> {
    miniz_oxide::inflate::decompress_to_vec_zlib(input)
        .map_err(|e| MpqError::InvalidArchive(format!("zlib: {:?}", e)))
}

/// Decompresses one sector. The first byte of a compressed sector holds the compression flags and
/// must already be split off into `compression_flags`.
pub fn decompress(input: &[u8], compression_flags: u8, expected_size: usize) -> MpqResult<Vec<u8>> {
    for (flag, name) in [
        (CompressionTypeFlags::Huffman, "Huffman"),
        (CompressionTypeFlags::PkZip, "PkZip DCL"),
        (CompressionTypeFlags::WaveMono, "WaveMono"),
        (CompressionTypeFlags::WaveStereo, "WaveStereo"),
    ] {
        if flag.is_set(compression_flags) {
            return Err(MpqError::Unsupported(format!(
                "{} decompression not implemented yet",
                name
            )));
        }
    }

    let mut output: Vec<u8> = if CompressionTypeFlags::Bzip2.is_set(compression_flags) {
        decompress_bzip2(input, expected_size)?
    } else {
        input.to_vec()
    };

    if CompressionTypeFlags::Zlib.is_set(compression_flags) {
        output = decompress_zlib(&output)?;
    }

    Ok(output)
}
