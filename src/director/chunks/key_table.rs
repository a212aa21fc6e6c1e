use binary_reader::BinaryReader;

use crate::io::reader::{toggle_endian, DirectorExt};
use crate::utils::log_i;

pub struct KeyTableEntry {
    pub section_id: u32, // TODO i32?
    pub cast_id: u32,    // TODO i32?
    pub fourcc: u32,
}

impl KeyTableEntry {
    fn from_reader_modern(reader: &mut BinaryReader) -> Result<KeyTableEntry, String> {
        reader.require(12).map_err(|e| e.to_string())?;
        Ok(KeyTableEntry {
            section_id: reader.read_u32().map_err(|e| e.to_string())?,
            cast_id: reader.read_u32().map_err(|e| e.to_string())?,
            fourcc: reader.read_u32().map_err(|e| e.to_string())?,
        })
    }

    /// Legacy 8-byte entries carry no explicit `cast_id`; the caller
    /// derives it from the entry's 1-based index.
    fn from_reader_legacy(reader: &mut BinaryReader, index: u32) -> Result<KeyTableEntry, String> {
        reader.require(8).map_err(|e| e.to_string())?;
        Ok(KeyTableEntry {
            section_id: reader.read_u32().map_err(|e| e.to_string())?,
            fourcc: reader.read_u32().map_err(|e| e.to_string())?,
            cast_id: index + 1,
        })
    }
}

/// Control words seen at the start of a `KEY*`/`KEY ` chunk. `0x0114`
/// introduces a 20-byte header; `0x000C` and `0x0002` both use a 12-byte
/// header (the entry size, 12 vs 8 bytes, is derived separately below).
const CONTROL_HEADER_20: u16 = 0x0114;
const CONTROL_HEADER_12_MODERN: u16 = 0x000C;
const CONTROL_HEADER_12_LEGACY: u16 = 0x0002;

fn header_size_for_control_word(word: u16) -> Option<usize> {
    match word {
        CONTROL_HEADER_20 => Some(20),
        CONTROL_HEADER_12_MODERN | CONTROL_HEADER_12_LEGACY => Some(12),
        _ => None,
    }
}

pub struct KeyTableChunk {
    pub control_word: u16,
    pub header_size: usize,
    pub entry_size: usize,
    pub entry_count: u32,
    pub used_count: u32,
    pub entries: Vec<KeyTableEntry>,
}

impl KeyTableChunk {
    pub fn from_reader(
        reader: &mut BinaryReader,
        _dir_version: u16,
    ) -> Result<KeyTableChunk, String> {
        reader.require(2).map_err(|e| e.to_string())?;
        let mut control_word = reader.read_u16().map_err(|e| e.to_string())?;
        let mut header_size = header_size_for_control_word(control_word);

        // Endianness self-calibration: neither the word nor its
        // byte-swapped form matched a known control value, so toggle
        // endianness and re-read from the top of the chunk.
        if header_size.is_none() && header_size_for_control_word(control_word.swap_bytes()).is_some() {
            reader.jmp(0);
            toggle_endian(reader);
            control_word = reader.read_u16().map_err(|e| e.to_string())?;
            header_size = header_size_for_control_word(control_word);
        }

        let header_size = header_size.unwrap_or_else(|| {
            log_i(&format!(
                "KeyTableChunk: unrecognized control word 0x{:04X}, assuming 12-byte header",
                control_word
            ));
            12
        });

        reader.require(10).map_err(|e| e.to_string())?;
        let _entry_size_field = reader.read_u16().map_err(|e| e.to_string())?;
        let entry_count = reader.read_u32().map_err(|e| e.to_string())?;
        let used_count = reader.read_u32().map_err(|e| e.to_string())?;
        if header_size > 12 {
            reader
                .read_bytes(header_size - 12)
                .map_err(|e| e.to_string())?;
        }

        let remaining = reader.bytes_left();
        let entry_size = if entry_count > 0 {
            remaining / entry_count as usize
        } else {
            12
        };

        let mut entries = Vec::with_capacity(entry_count as usize);
        for i in 0..entry_count {
            if reader.bytes_left() < entry_size.max(8) {
                log_i(&format!(
                    "KeyTableChunk: truncated after {} of {} entries",
                    i, entry_count
                ));
                break;
            }
            let entry = if entry_size >= 12 {
                KeyTableEntry::from_reader_modern(reader)?
            } else {
                KeyTableEntry::from_reader_legacy(reader, i)?
            };
            entries.push(entry);
        }

        Ok(KeyTableChunk {
            control_word,
            header_size,
            entry_size,
            entry_count,
            used_count,
            entries,
        })
    }
}
