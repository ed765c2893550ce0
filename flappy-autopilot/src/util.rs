use anyhow::{anyhow, Context, Result};
use flappy_core::SimConfig;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn parse_seed(seed: &str) -> Result<u32> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {s}"))
    } else {
        s.parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {s}"))
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    let mut seeds = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        seeds.push(parse_seed(token)?);
    }
    if seeds.is_empty() {
        return Err(anyhow!("no seeds parsed from --seeds"));
    }
    Ok(seeds)
}

pub fn parse_seed_file(path: &Path) -> Result<Vec<u32>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading seed file {}", path.display()))?;
    let mut seeds = Vec::new();
    for line in data.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        seeds.push(parse_seed(trimmed)?);
    }
    if seeds.is_empty() {
        return Err(anyhow!("seed file {} had no seeds", path.display()));
    }
    Ok(seeds)
}

/// `count` seeds from a fixed LCG walk starting at `start`.
pub fn seed_sequence(start: u32, count: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(count as usize);
    let mut cur = start;
    for _ in 0..count {
        out.push(cur);
        cur = cur.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    }
    out
}

/// Reads a [`SimConfig`] from JSON, falling back to defaults for missing
/// fields, and validates it. `None` yields the default configuration.
pub fn load_sim_config(path: Option<&Path>) -> Result<SimConfig> {
    let config = match path {
        Some(path) => {
            let data = fs::read(path)
                .with_context(|| format!("failed reading config {}", path.display()))?;
            serde_json::from_slice::<SimConfig>(&data)
                .with_context(|| format!("failed parsing config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    config
        .validate()
        .map_err(|err| anyhow!("invalid simulation config: {err}"))?;
    Ok(config)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    let encoded = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}

pub fn now_unix_s() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for byte in data {
        let idx = ((crc ^ (*byte as u32)) & 0xFF) as usize;
        crc = CRC_TABLE[idx] ^ (crc >> 8);
    }
    crc ^ 0xFFFF_FFFF
}

/// Stable identity for a serializable configuration.
pub fn fingerprint_json(value: &serde_json::Value) -> String {
    let encoded = value.to_string();
    let digest = crc32(encoded.as_bytes());
    format!("crc32:{digest:08x}:len:{}", encoded.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal_seeds() {
        assert_eq!(parse_seed("0x0000002A").expect("hex"), 42);
        assert_eq!(parse_seed(" 42 ").expect("decimal"), 42);
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0xZZ").is_err());
    }

    #[test]
    fn seed_csv_skips_blanks() {
        assert_eq!(parse_seed_csv("1, ,0x2,").expect("csv"), vec![1, 2]);
        assert!(parse_seed_csv(" , ").is_err());
    }

    #[test]
    fn seed_sequence_is_deterministic() {
        let seq = seed_sequence(0xA57E_0001, 4);
        assert_eq!(seq.len(), 4);
        assert_eq!(seq[0], 0xA57E_0001);
        assert_eq!(seq, seed_sequence(0xA57E_0001, 4));
    }

    #[test]
    fn crc32_known_value() {
        assert_eq!(crc32(&[]), 0);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_sim_config(Some(&dir.path().join("absent.json"))).is_err());
        assert_eq!(
            load_sim_config(None).expect("defaults"),
            SimConfig::default()
        );
    }
}
