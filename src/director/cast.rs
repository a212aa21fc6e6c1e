use std::collections::{BTreeSet, HashMap};

use binary_reader::BinaryReader;
use itertools::Itertools;

use crate::{
    director::{
        file::get_children_of_chunk,
        tag_normalizer::{fourcc_eq, normalize_fourcc},
        utils::fourcc_to_string,
    },
    utils::log_i,
};

use super::{
    chunks::{
        cast_member::CastMemberDef, key_table::KeyTableChunk, script::ScriptChunk, Chunk,
        ChunkContainer,
    },
    file::{
        get_chunk, get_script_chunk, get_script_context_chunk,
        get_script_context_key_entry_for_cast, get_script_names_chunk,
    },
    lingo::script::ScriptContext,
    rifx::RIFXReaderContext,
    utils::FOURCC,
};

pub struct CastDef {
    pub id: u32,
    pub name: String,
    pub members: HashMap<u32, CastMemberDef>,
    pub lctx: Option<ScriptContext>,
    pub capital_x: bool,
    pub dir_version: u16,
}

/// Builds the three candidate-id sets described in §4.5 discovery: keys of
/// the key table (entries tagged `CASt`, whose `cast_id` is the member's
/// own logical id), values of the script-context table resolved through
/// the key table's reverse (section_id → cast_id) map, and the cast-order
/// array itself. Ids at or beyond `max_cast_slots` are dropped.
fn discover_member_ids(
    member_ids: &[u32],
    min_member: u16,
    key_table: &KeyTableChunk,
    lctx: &Option<ScriptContextChunkRef>,
    max_cast_slots: u32,
) -> BTreeSet<u32> {
    let mut ids: BTreeSet<u32> = BTreeSet::new();

    for entry in &key_table.entries {
        if fourcc_eq(entry.fourcc, FOURCC("CASt")) && entry.cast_id < max_cast_slots {
            ids.insert(entry.cast_id);
        }
    }

    if let Some(lctx) = lctx {
        let reverse: HashMap<u32, u32> = key_table
            .entries
            .iter()
            .map(|e| (e.section_id, e.cast_id))
            .collect();
        for section in &lctx.section_map {
            if section.section_id > 0 {
                if let Some(&cast_id) = reverse.get(&(section.section_id as u32)) {
                    if cast_id < max_cast_slots {
                        ids.insert(cast_id);
                    }
                }
            }
        }
    }

    for (i, &section_id) in member_ids.iter().enumerate() {
        if section_id == 0 {
            continue;
        }
        let member_id = i as u32 + min_member as u32;
        if member_id < max_cast_slots {
            ids.insert(member_id);
        }
    }

    ids
}

/// Enough of `ScriptContextChunk` to resolve §4.5's discovery source 2
/// without borrowing the chunk itself across the whole discovery pass.
struct ScriptContextChunkRef<'a> {
    section_map: &'a [super::chunks::lctx::ScriptContextMapEntry],
}

/// Resolves each bitmap member's raw `palette_id` to the member id of the
/// `Palette` cast member it refers to (§4.5), trying three strategies in
/// order and keeping the first that lands on an actual `Palette` member.
/// Non-positive ids (built-in Mac/Windows system palettes) are left
/// unresolved — there is no member to point at.
fn resolve_palette_ids(
    members: &mut HashMap<u32, CastMemberDef>,
    min_member: u16,
    member_ids: &[u32],
    key_table: &KeyTableChunk,
    lctx: &Option<ScriptContextChunkRef>,
) {
    use super::enums::MemberType;

    let section_to_cast_id: HashMap<u32, u32> = key_table
        .entries
        .iter()
        .map(|e| (e.section_id, e.cast_id))
        .collect();

    let is_palette_member = |members: &HashMap<u32, CastMemberDef>, id: u32| {
        members
            .get(&id)
            .is_some_and(|def| def.chunk.member_type == MemberType::Palette)
    };

    let mut resolutions: Vec<(u32, u32)> = Vec::new();
    for (&member_id, def) in members.iter() {
        let Some(bitmap) = def.chunk.specific_data.bitmap_info() else {
            continue;
        };
        let palette_id = bitmap.palette_id;
        if palette_id <= 0 {
            continue;
        }

        // Strategy 1: slot-based lookup in the cast-order array.
        let slot_index = palette_id as i32 - min_member as i32;
        let via_slot = if slot_index >= 0 && (slot_index as usize) < member_ids.len() {
            let section_id = member_ids[slot_index as usize];
            if section_id != 0 {
                section_to_cast_id
                    .get(&section_id)
                    .copied()
                    .or(Some(slot_index as u32 + min_member as u32))
            } else {
                None
            }
        } else {
            None
        };

        // Strategy 2: script-context table lookup (1-based entry index).
        let via_lctx = lctx.as_ref().and_then(|lctx| {
            let index = palette_id as usize - 1;
            lctx.section_map.get(index).and_then(|entry| {
                if entry.section_id > 0 {
                    section_to_cast_id.get(&(entry.section_id as u32)).copied()
                } else {
                    None
                }
            })
        });

        // Strategy 3: direct key-table lookup, treating the id as a
        // cast_id directly.
        let via_key_table = Some(palette_id as u32);

        if let Some(resolved) = [via_slot, via_lctx, via_key_table]
            .into_iter()
            .flatten()
            .find(|&candidate| is_palette_member(members, candidate))
        {
            resolutions.push((member_id, resolved));
        }
    }

    for (member_id, resolved) in resolutions {
        if let Some(def) = members.get_mut(&member_id) {
            def.resolved_palette_id = Some(resolved);
        }
    }
}

impl CastDef {
    pub fn from(
        name: String,
        id: u32,
        min_member: u16,
        member_ids: Vec<u32>,
        reader: &mut BinaryReader,
        chunk_container: &mut ChunkContainer,
        rifx: &mut RIFXReaderContext,
        key_table: &KeyTableChunk,
        max_cast_slots: u32,
    ) -> Result<CastDef, String> {
        let lctx_entry =
            get_script_context_key_entry_for_cast(reader, chunk_container, key_table, rifx, id);
        let lctx = lctx_entry.and_then(|entry| {
            get_script_context_chunk(
                reader,
                chunk_container,
                rifx,
                entry.fourcc,
                entry.section_id,
            )
        });
        let script_names = lctx.as_ref().and_then(|lctx| {
            get_script_names_chunk(
                reader,
                chunk_container,
                rifx,
                FOURCC("Lnam"),
                lctx.lnam_section_id,
            )
        });
        let capital_x = lctx_entry
            .is_some_and(|entry| normalize_fourcc(entry.fourcc) == FOURCC("LctX"));

        // cast_id -> member's own CASt section id, straight from the cast
        // order array. Candidates found only via the other two discovery
        // sources fall back to a key-table lookup for their section.
        let mut sections_by_id: HashMap<u32, u32> = HashMap::new();
        for (i, &section_id) in member_ids.iter().enumerate() {
            if section_id == 0 {
                continue;
            }
            sections_by_id.insert(i as u32 + min_member as u32, section_id);
        }

        let lctx_ref = lctx.as_ref().map(|l| ScriptContextChunkRef {
            section_map: &l.section_map,
        });
        let discovered = discover_member_ids(&member_ids, min_member, key_table, &lctx_ref, max_cast_slots);

        let mut members: HashMap<u32, CastMemberDef> = HashMap::new();
        let mut used_sections: BTreeSet<u32> = BTreeSet::new();
        for member_id in discovered {
            let section_id = match sections_by_id.get(&member_id) {
                Some(&s) => s,
                None => match key_table
                    .entries
                    .iter()
                    .find(|e| e.cast_id == member_id && fourcc_eq(e.fourcc, FOURCC("CASt")))
                {
                    Some(entry) => entry.section_id,
                    None => continue,
                },
            };

            let member = match get_chunk(reader, chunk_container, rifx, FOURCC("CASt"), section_id) {
                Ok(Chunk::CastMember(member_chunk)) => member_chunk,
                Ok(_) => {
                    log_i(&format!(
                        "❌ Chunk at section {} for member {} is not a cast member chunk",
                        section_id, member_id
                    ));
                    continue;
                }
                Err(err) => {
                    log_i(&format!(
                        "❌ Failed to read cast member {} (section_id={}): {}",
                        member_id, section_id, err
                    ));
                    continue;
                }
            };
            used_sections.insert(section_id);

            let children_entries = get_children_of_chunk(&section_id, key_table);
            let children = children_entries
                .iter()
                .map(|x| {
                    let fourcc_str: String = fourcc_to_string(x.fourcc);
                    let child = get_chunk(reader, chunk_container, rifx, x.fourcc, x.section_id);
                    if let Err(err) = &child {
                        log_i(&format!(
                            "❌ Failed to read child chunk of type {} (section_id={}): {}",
                            fourcc_str, x.section_id, err
                        ));
                    }
                    child.ok()
                })
                .collect_vec();

            members.insert(member_id, CastMemberDef { chunk: member, children, resolved_palette_id: None });
        }

        // Enrichment pass 2 (global scan): recovers CASt chunks present in
        // the container but never linked to this cast by a key-table
        // entry (malformed or truncated key tables). Each one becomes a
        // member keyed by its own section id, since no logical id is
        // recoverable for it.
        let orphan_sections: Vec<(u32, u32)> = chunk_container
            .chunk_info
            .iter()
            .filter(|(section_id, info)| {
                fourcc_eq(info.fourcc, FOURCC("CASt"))
                    && !used_sections.contains(section_id)
                    && **section_id < max_cast_slots
                    && !members.contains_key(section_id)
            })
            .map(|(section_id, _)| (*section_id, *section_id))
            .collect();
        for (member_id, section_id) in orphan_sections {
            let member = match get_chunk(reader, chunk_container, rifx, FOURCC("CASt"), section_id) {
                Ok(Chunk::CastMember(member_chunk)) => member_chunk,
                _ => continue,
            };
            let children_entries = get_children_of_chunk(&section_id, key_table);
            let children = children_entries
                .iter()
                .map(|x| get_chunk(reader, chunk_container, rifx, x.fourcc, x.section_id).ok())
                .collect_vec();
            log_i(&format!(
                "Recovered orphan cast member at section {} via global scan",
                section_id
            ));
            members.insert(member_id, CastMemberDef { chunk: member, children, resolved_palette_id: None });
        }

        resolve_palette_ids(&mut members, min_member, &member_ids, key_table, &lctx_ref);

        let mut scripts: HashMap<u32, ScriptChunk> = HashMap::new();
        if let Some(lctx) = &lctx {
            for i in 0..lctx.entry_count {
                let section = &lctx.section_map[i as usize];
                if section.section_id > -1 {
                    let script = get_script_chunk(
                        reader,
                        chunk_container,
                        rifx,
                        FOURCC("Lscr"),
                        section.section_id as u32,
                    );
                    // TODO script.setContext(this);
                    if let Some(script) = script {
                        scripts.insert(i + 1, script);
                    }
                }
            }
        }
        return Ok(CastDef {
            id,
            name: name,
            members: members,
            lctx: lctx.map(|_| ScriptContext {
                scripts,
                names: script_names.map_or(Vec::new(), |x| x.names),
            }),
            capital_x,
            dir_version: rifx.dir_version,
        });
    }
}
