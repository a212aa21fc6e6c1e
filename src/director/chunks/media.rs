use binary_reader::{BinaryReader, Endian};

/// An `ediM` (external media) chunk. Media-format decoding is out of
/// scope (§1 Non-goals); the raw payload is kept as-is.
#[derive(Debug, Clone)]
pub struct MediaChunk {
    pub raw_data: Vec<u8>,
}

impl MediaChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<Self, String> {
        let original_endian = reader.endian;
        reader.endian = Endian::Big;

        let mut raw_data = Vec::new();
        while let Ok(byte) = reader.read_u8() {
            raw_data.push(byte);
        }

        reader.endian = original_endian;

        tracing::debug!("read {} bytes for ediM chunk", raw_data.len());

        Ok(MediaChunk { raw_data })
    }
}
