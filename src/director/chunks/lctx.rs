use binary_reader::BinaryReader;

use crate::io::reader::{toggle_endian, DirectorExt};

#[allow(dead_code)]
pub struct ScriptContextChunk {
    pub entry_count: u32,
    entry_count2: u32,
    entries_offset: usize,
    pub lnam_section_id: u32,
    valid_count: u16,
    flags: u16,
    free_pointer: u16,
    pub section_map: Vec<ScriptContextMapEntry>,
}

#[allow(dead_code)]
pub struct ScriptContextMapEntry {
    unknown0: u32,
    pub section_id: i32,
    unknown1: u16,
    unknown2: u16,
}

impl ScriptContextMapEntry {
    #[allow(unused_variables)]
    pub fn from_reader(
        reader: &mut BinaryReader,
        dir_version: u16,
    ) -> Result<ScriptContextMapEntry, String> {
        reader.require(12).map_err(|e| e.to_string())?;
        return Ok(ScriptContextMapEntry {
            unknown0: reader.read_u32().unwrap(),
            section_id: reader.read_i32().unwrap(),
            unknown1: reader.read_u16().unwrap(),
            unknown2: reader.read_u16().unwrap(),
        });
    }
}

impl ScriptContextChunk {
    /// Reads the header (skipping 8 reserved bytes, entry-count,
    /// duplicate-count, entries-offset) without consuming the entry
    /// table, so the caller can self-calibrate endianness before
    /// committing to a read of `entry_count` records.
    fn read_header(reader: &mut BinaryReader) -> Result<(u32, u32, usize, u32, u16, u16, u16), String> {
        reader.require(42).map_err(|e| e.to_string())?;
        let _unknown0 = reader.read_u32().unwrap();
        let _unknown1 = reader.read_u32().unwrap();
        let entry_count = reader.read_u32().unwrap();
        let entry_count2 = reader.read_u32().unwrap();
        let entries_offset = reader.read_u16().unwrap() as usize;
        let _unknown2 = reader.read_u16().unwrap();
        let _unknown3 = reader.read_u32().unwrap();
        let _unknown4 = reader.read_u32().unwrap();
        let _unknown5 = reader.read_u32().unwrap();
        let lnam_section_id = reader.read_u32().unwrap();
        let valid_count = reader.read_u16().unwrap();
        let flags = reader.read_u16().unwrap();
        let free_pointer = reader.read_u16().unwrap();
        Ok((
            entry_count,
            entry_count2,
            entries_offset,
            lnam_section_id,
            valid_count,
            flags,
            free_pointer,
        ))
    }

    #[allow(unused_variables)]
    pub fn from_reader(
        reader: &mut BinaryReader,
        dir_version: u16,
    ) -> Result<ScriptContextChunk, String> {
        let mut header = Self::read_header(reader)?;

        // Self-calibration (§4.4): an entry count this large is always a
        // byte-order mismatch rather than a real script context table.
        if header.0 > 0xFFFF {
            reader.jmp(0);
            toggle_endian(reader);
            header = Self::read_header(reader)?;
        }

        let (entry_count, entry_count2, entries_offset, lnam_section_id, valid_count, flags, free_pointer) =
            header;

        reader.jmp(entries_offset);
        let section_map = (0..entry_count)
            .map(|_| ScriptContextMapEntry::from_reader(reader, dir_version))
            .collect::<Result<Vec<_>, String>>()?;

        return Ok(ScriptContextChunk {
            entry_count,
            entry_count2,
            entries_offset,
            lnam_section_id,
            valid_count,
            flags,
            free_pointer,
            section_map,
        });
    }
}
