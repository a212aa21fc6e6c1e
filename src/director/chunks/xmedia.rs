use binary_reader::{BinaryReader, Endian};

/// An `XMED` chunk (PFR vector fonts, styled-text runs, and other Xtra
/// media payloads). Rasterizing/decoding these belongs to an external
/// encoder collaborator (§1 Non-goals); only the raw payload is kept.
pub struct XMediaChunk {
    pub raw_data: Vec<u8>,
}

impl XMediaChunk {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<XMediaChunk, String> {
        let original_endian = reader.endian;
        reader.endian = Endian::Big;

        let mut raw_data = Vec::new();
        while let Ok(byte) = reader.read_u8() {
            raw_data.push(byte);
        }

        reader.endian = original_endian;

        tracing::debug!("read {} bytes for XMED chunk", raw_data.len());

        Ok(XMediaChunk { raw_data })
    }
}
