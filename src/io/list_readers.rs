use binary_reader::{BinaryReader, Endian};

use super::reader::DirectorExt;

/// Cast-list items (§4.4 movie cast list) encode a Pascal string only when
/// the first byte is a plausible length for the bytes that follow;
/// otherwise the whole item is NUL-stripped UTF-8 text.
fn is_plausible_pascal_length(buf: &[u8]) -> bool {
    match buf.first() {
        Some(&len) => (len as usize) == buf.len() - 1,
        None => false,
    }
}

pub fn read_pascal_string(item_bufs: &Vec<Vec<u8>>, index: usize, item_endian: Endian) -> String {
    if index >= item_bufs.len() {
        return "".to_owned();
    }

    let buf = &item_bufs[index];
    if buf.is_empty() {
        return "".to_owned();
    }

    if !is_plausible_pascal_length(buf) {
        return String::from_utf8_lossy(buf)
            .trim_end_matches('\0')
            .to_owned();
    }

    let mut reader = BinaryReader::from_vec(buf);
    reader.set_endian(item_endian);
    return reader.read_pascal_string().unwrap();
}

pub fn read_string(item_bufs: &Vec<Vec<u8>>, index: usize) -> String {
    if index >= item_bufs.len() {
        return "".to_owned();
    }

    let buf = &item_bufs[index];
    return String::from_utf8(buf.to_vec()).unwrap();
}

pub fn read_u16(item_bufs: &Vec<Vec<u8>>, index: usize, item_endian: Endian) -> u16 {
    if index >= item_bufs.len() {
        return 0;
    }

    let mut reader = BinaryReader::from_vec(&item_bufs[index]);
    reader.set_endian(item_endian);
    return reader.read_u16().unwrap();
}
