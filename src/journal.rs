//! Output serialization (§4.9, §6). Turns a resolved [`DirectorFile`] into
//! the run's JSON artifacts (`members.json`, `movie.json`, `timeline.json`,
//! `castlibs.json`) plus per-member assets, under the run's output
//! directory.
//!
//! Per-format encoders (PNG/WAV/JASC palette/RTF/SVG writers) are an
//! explicitly out-of-scope collaborator (§1, §10.6); this module only
//! implements the one content kind the spec covers end to end itself —
//! script decompilation to `.ls` text — and represents the rest through
//! [`MemberEncoder`], a trait this crate deliberately ships no
//! implementation of.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::director::chunks::cast_member::CastMemberSpecificData;
use crate::director::enums::MemberType;
use crate::director::file::DirectorFile;
use crate::director::lingo::decompiler::{decompile_handler, print_handler};

/// Replaces any of `/ \ ? % * : | " < > <whitespace>` with `_`, then trims
/// the result (§6 "Filename sanitization").
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if "/\\?%*:|\"<>".contains(c) || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect();
    replaced.trim_matches('_').to_string()
}

fn member_type_name(t: MemberType) -> &'static str {
    match t {
        MemberType::Null => "Null",
        MemberType::Bitmap => "Bitmap",
        MemberType::FilmLoop => "FilmLoop",
        MemberType::Text => "Text",
        MemberType::Palette => "Palette",
        MemberType::Picture => "Picture",
        MemberType::Sound => "Sound",
        MemberType::Button => "Button",
        MemberType::Shape => "Shape",
        MemberType::Movie => "Movie",
        MemberType::DigitalVideo => "DigitalVideo",
        MemberType::Script => "Script",
        MemberType::RTE => "RTE",
        MemberType::Font => "Font",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberRect {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberRegPoint {
    pub x: i32,
    pub y: i32,
}

/// One entry of `members.json` (§6).
#[derive(Debug, Clone, Serialize)]
pub struct MemberRecord {
    pub id: u32,
    pub cast_id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub member_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub rect: Option<MemberRect>,
    pub reg_point: Option<MemberRegPoint>,
    pub script_id: u32,
    pub palette_id: Option<i32>,
    /// Member id of the resolved `Palette` cast member (§4.5 resolution
    /// ladder). `None` when `palette_id` names a built-in system palette
    /// or couldn't be resolved to a member in this cast.
    pub resolved_palette_id: Option<u32>,
    pub bit_depth: Option<u8>,
    pub flags: u32,
    pub format: Option<String>,
}

/// `movie.json` (§6, §4.4 movie configuration).
#[derive(Debug, Clone, Serialize)]
pub struct MovieRecord {
    pub file_version: u16,
    pub stage_rect: MemberRect,
    pub min_member: u16,
    pub max_member: u16,
    pub director_version: u16,
    pub bit_depth: u16,
    pub frame_rate: u16,
    pub platform: &'static str,
    pub protection: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineMarker {
    pub frame: u16,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreChunkSummary {
    pub id: u32,
    #[serde(rename = "type")]
    pub chunk_type: &'static str,
    pub size: usize,
}

/// `timeline.json` (§6).
#[derive(Debug, Clone, Serialize)]
pub struct TimelineRecord {
    pub frame_count: usize,
    pub markers: Vec<TimelineMarker>,
    pub score_chunk: Option<ScoreChunkSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CastLibRecord {
    pub index: u32,
    pub name: String,
    pub path: String,
    pub preload_mode: &'static str,
}

/// `castlibs.json` (§6).
#[derive(Debug, Clone, Serialize)]
pub struct CastLibsRecord {
    pub casts: Vec<CastLibRecord>,
}

/// Trait the Cast Manager's per-member dispatch (§4.5) would call into to
/// turn a content chunk's raw bytes into a format-specific asset file. No
/// concrete implementation ships with this crate (§1 Non-goals, §10.6).
pub trait MemberEncoder {
    fn encode(&self, member: &MemberRecord, raw: &[u8], out_path: &Path) -> anyhow::Result<()>;
}

fn preload_mode_name(v: u16) -> &'static str {
    match v {
        0 => "Never",
        1 => "WhenNeeded",
        2 => "BeforeFrame1",
        3 => "AfterFrame1",
        _ => "Never",
    }
}

/// Builds the member list from the casts `DirectorFile` already resolved,
/// including both the key-table/script-context/cast-order discovery and
/// the global-scan recovery pass (§4.5 enrichment passes 1 and 2).
pub fn build_members(file: &DirectorFile) -> Vec<MemberRecord> {
    let mut members = Vec::new();

    for cast in &file.casts {
        for (member_id, def) in &cast.members {
            let chunk = &def.chunk;
            let name = chunk
                .member_info
                .as_ref()
                .map(|i| i.name.clone())
                .unwrap_or_else(|| format!("member_{member_id}"));
            let script_id = chunk
                .member_info
                .as_ref()
                .map(|i| i.header.script_id)
                .unwrap_or(0);

            let (width, height, reg_point, palette_id, bit_depth) = match &chunk.specific_data {
                CastMemberSpecificData::Bitmap(info) => (
                    Some(info.width as u32),
                    Some(info.height as u32),
                    Some(MemberRegPoint { x: info.reg_x as i32, y: info.reg_y as i32 }),
                    Some(info.palette_id as i32),
                    Some(info.bit_depth),
                ),
                CastMemberSpecificData::Shape(info) => (
                    Some(info.width as u32),
                    Some(info.height as u32),
                    Some(MemberRegPoint { x: info.reg_point.0 as i32, y: info.reg_point.1 as i32 }),
                    None,
                    None,
                ),
                CastMemberSpecificData::FilmLoop(info) => (
                    Some(info.width as u32),
                    Some(info.height as u32),
                    Some(MemberRegPoint { x: info.reg_point.0 as i32, y: info.reg_point.1 as i32 }),
                    None,
                    None,
                ),
                _ => (None, None, None, None, None),
            };

            members.push(MemberRecord {
                id: *member_id,
                cast_id: cast.id,
                name,
                member_type: member_type_name(chunk.member_type).to_string(),
                width,
                height,
                rect: None,
                reg_point,
                script_id,
                palette_id,
                resolved_palette_id: def.resolved_palette_id,
                bit_depth,
                flags: chunk.member_info.as_ref().map(|i| i.header.flags).unwrap_or(0),
                format: None,
            });
        }
    }

    members
}

pub fn build_movie(file: &DirectorFile) -> MovieRecord {
    let c = &file.config;
    MovieRecord {
        file_version: c.file_version,
        stage_rect: MemberRect {
            top: c.movie_top as i32,
            left: c.movie_left as i32,
            bottom: c.movie_bottom as i32,
            right: c.movie_right as i32,
        },
        min_member: c.min_member,
        max_member: c.max_member,
        director_version: file.version,
        bit_depth: c.bit_depth,
        frame_rate: c.frame_rate,
        platform: match c.platform {
            0xFC00..=0xFFFF => "Mac", // -1 as u16 and nearby negatives
            1024 => "Windows",
            _ => "Unknown",
        },
        protection: c.protection != 0 && (c.protection as u32) % 23 == 0,
    }
}

pub fn build_castlibs(file: &DirectorFile) -> CastLibsRecord {
    let casts = file
        .cast_entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.name != "Internal")
        .map(|(i, e)| CastLibRecord {
            index: i as u32,
            name: e.name.clone(),
            path: e.file_path.clone(),
            preload_mode: preload_mode_name(e.preload_settings),
        })
        .collect();
    CastLibsRecord { casts }
}

pub fn build_timeline(file: &DirectorFile) -> TimelineRecord {
    match &file.score {
        Some(score) => TimelineRecord {
            frame_count: score.frame_interval_primaries.len(),
            markers: Vec::new(),
            score_chunk: Some(ScoreChunkSummary {
                id: 0,
                chunk_type: "VWSC",
                size: score.header.total_length as usize,
            }),
        },
        None => TimelineRecord {
            frame_count: 0,
            markers: Vec::new(),
            score_chunk: None,
        },
    }
}

/// Decompiles every script member's handlers to Lingo source text keyed by
/// member id, matching the `member_<id>.ls` artifact (§6, scenario 1).
pub fn decompile_scripts(file: &DirectorFile) -> HashMap<u32, String> {
    let mut out = HashMap::new();

    for cast in &file.casts {
        let Some(lctx) = &cast.lctx else { continue };

        for (member_id, def) in &cast.members {
            if def.chunk.member_type != MemberType::Script {
                continue;
            }
            let Some(info) = &def.chunk.member_info else { continue };
            let Some(script) = lctx.scripts.get(&info.header.script_id) else {
                continue;
            };

            let mut text = String::new();
            for handler in &script.handlers {
                let decompiled = decompile_handler(
                    handler,
                    script,
                    lctx,
                    cast.dir_version,
                    crate::director::file::get_variable_multiplier(cast.capital_x, cast.dir_version),
                );
                text.push_str(&print_handler(&decompiled));
                text.push('\n');
            }
            out.insert(*member_id, text);
        }
    }

    out
}

/// Writes every journal artifact (§6) into `output_dir`, creating it if
/// needed. Returns the member list actually written (for run-summary
/// logging at the call site).
pub fn write_all(file: &DirectorFile, output_dir: &Path) -> anyhow::Result<Vec<MemberRecord>> {
    fs::create_dir_all(output_dir)?;

    let mut members = build_members(file);
    let scripts = decompile_scripts(file);

    for member in &mut members {
        if let Some(src) = scripts.get(&member.id) {
            let filename = format!("{}.ls", sanitize_filename(&member.name));
            let path = output_dir.join(&filename);
            if fs::write(&path, src).is_ok() {
                member.format = Some("ls".to_string());
            } else {
                tracing::warn!(member_id = member.id, "failed to write .ls asset");
            }
        }
    }

    write_json(output_dir.join("members.json"), &members)?;
    write_json(output_dir.join("movie.json"), &build_movie(file))?;
    write_json(output_dir.join("timeline.json"), &build_timeline(file))?;
    write_json(output_dir.join("castlibs.json"), &build_castlibs(file))?;

    Ok(members)
}

fn write_json<T: Serialize>(path: PathBuf, value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_filename("a/b\\c?d%e*f:g|h\"i<j>k"), "a_b_c_d_e_f_g_h_i_j_k");
    }

    #[test]
    fn sanitize_replaces_whitespace() {
        assert_eq!(sanitize_filename("my member name"), "my_member_name");
    }

    #[test]
    fn sanitize_trims_leading_and_trailing_underscores() {
        assert_eq!(sanitize_filename("  leading and trailing  "), "leading_and_trailing");
    }

    #[test]
    fn sanitize_leaves_plain_names_untouched() {
        assert_eq!(sanitize_filename("frame_label_1"), "frame_label_1");
    }
}
