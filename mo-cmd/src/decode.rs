use std::fs;
use std::io::stdout;
use std::path::Path;

use anyhow::{Context, Result};
use ccsds_mo::spacepacket::Decoder;
use tracing::warn;

/// Read packet bytes, either raw or as hex text with optional whitespace.
fn read_packet(input: &Path, is_hex: bool) -> Result<Vec<u8>> {
    let dat = fs::read(input).with_context(|| format!("reading {input:?}"))?;
    if !is_hex {
        return Ok(dat);
    }
    let text: String = String::from_utf8(dat)
        .context("hex input is not text")?
        .split_whitespace()
        .collect();
    hex::decode(text).context("invalid hex input")
}

pub fn decode(input: &Path, is_hex: bool, strict: bool) -> Result<()> {
    let dat = read_packet(input, is_hex)?;
    let packet = Decoder::new()
        .with_strict(strict)
        .decode(&dat)
        .with_context(|| format!("decoding {input:?}"))?;
    if packet.is_suspect() {
        warn!(integrity = %packet.integrity, "packet failed integrity checks");
    }
    serde_json::to_writer_pretty(stdout(), &packet)?;
    println!();
    Ok(())
}
