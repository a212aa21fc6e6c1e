//! Per-container reader state threaded through chunk resolution (§4.2,
//! §4.4). Carries just enough to tell an Afterburner-compressed container
//! from an uncompressed one and to calibrate script-context reads against
//! the director version once the config chunk has been read.

#[derive(Debug, Clone)]
pub struct RIFXReaderContext {
    /// True when the container used the Afterburner (`FGDM`/`FGDC`) codec
    /// rather than plain `MV93`/`MC95`.
    pub after_burned: bool,
    /// Byte offset of the inflated Initial Load Segment body, used to
    /// translate `ChunkInfo::offset` into absolute reader positions for
    /// Afterburner containers.
    pub ils_body_offset: usize,
    /// Director version as resolved from the config chunk (`human_version`
    /// of `director_version`), 0 until `read_config` has run.
    pub dir_version: u16,
    /// True when the script-context chunk's four-CC is `LctX` rather than
    /// `Lctx`; changes the cast-member/name variable index multiplier
    /// (§4.4, `get_variable_multiplier`).
    pub lctx_capital_x: bool,
}
