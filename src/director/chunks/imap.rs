use binary_reader::BinaryReader;

/// The `imap` chunk: points at the memory map (`mmap`) chunk that lists
/// every other chunk in an uncompressed (non-Afterburner) container.
#[allow(dead_code)]
pub struct InitialMapChunk {
    pub version: u32,
    pub mmap_offset: usize,
    pub director_version: u32,
    unused1: u32,
    unused2: u32,
    unused3: u32,
}

impl InitialMapChunk {
    pub fn from_reader(reader: &mut BinaryReader, _dir_version: u16) -> Result<InitialMapChunk, String> {
        let version = reader.read_u32().map_err(|e| e.to_string())?;
        let mmap_offset = reader.read_u32().map_err(|e| e.to_string())? as usize;
        let director_version = reader.read_u32().map_err(|e| e.to_string())?;
        let unused1 = reader.read_u32().map_err(|e| e.to_string())?;
        let unused2 = reader.read_u32().map_err(|e| e.to_string())?;
        let unused3 = reader.read_u32().map_err(|e| e.to_string())?;

        Ok(InitialMapChunk {
            version,
            mmap_offset,
            director_version,
            unused1,
            unused2,
            unused3,
        })
    }
}
