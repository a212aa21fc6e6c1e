use binary_reader::{BinaryReader, Endian};

/// A `snd ` chunk. Decoding Director's legacy sound formats into playable
/// audio is out of scope (§1 Non-goals, "per-format ... sound-header
/// format detection belongs to an external encoder"); this keeps just the
/// raw payload so it can be carried into an output artifact if needed.
#[derive(Clone)]
pub struct SoundChunk {
    pub raw_data: Vec<u8>,
}

impl SoundChunk {
    pub fn from_snd_chunk(reader: &mut BinaryReader) -> Result<SoundChunk, String> {
        let original_endian = reader.endian;
        reader.endian = Endian::Big;

        let mut raw_data = Vec::new();
        while let Ok(byte) = reader.read_u8() {
            raw_data.push(byte);
        }

        reader.endian = original_endian;

        tracing::debug!("read {} bytes for snd  chunk", raw_data.len());

        Ok(SoundChunk { raw_data })
    }
}
