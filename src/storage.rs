//! Engine state images.
//!
//! The engine itself is purely in-memory; its state is lost on restart.
//! Hosts that want continuity serialize an [`EngineImage`] on shutdown and
//! load it on start. Format: 8-byte magic, u32 LE version, u64 LE raw
//! payload length, then a raw LZ4 block of the serde_json payload. The
//! format is a convenience for the daemon, not a stability contract.

use std::io::{self, Read, Write};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::analysis::ImprovementStats;
use crate::connectivity::Synapse;
use crate::engine::{Engine, EngineConfig};
use crate::knowledge::{BoundedCache, PatternStat, RiskFactor, StrategyRecord};

pub const MAGIC: &[u8; 8] = b"VORTEX01";
pub const VERSION_CURRENT: u32 = 1;

/// Complete serializable engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineImage {
    pub config: EngineConfig,
    pub threshold: f32,
    pub learning_rate: f32,
    pub potential: Vec<f32>,
    pub last_spike: Vec<i64>,
    pub edges: Vec<Vec<Synapse>>,
    pub rng_state: u64,
    pub market_patterns: BoundedCache<PatternStat>,
    pub strategy_performance: BoundedCache<StrategyRecord>,
    pub risk_factors: BoundedCache<RiskFactor>,
    pub improvement_enabled: bool,
    pub last_improvement: SystemTime,
    pub improvement_cycles: u64,
    pub stats: ImprovementStats,
    pub created: SystemTime,
    pub learning_sessions: u64,
    pub strategies_generated: u64,
    pub success_rate: f32,
}

pub fn compress_lz4(input: &[u8]) -> Vec<u8> {
    lz4_flex::compress(input)
}

pub fn decompress_lz4(input: &[u8], expected_size: usize) -> io::Result<Vec<u8>> {
    // Strict format: raw LZ4 block with external expected size.
    lz4_flex::decompress(input, expected_size)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "lz4 decompression failed"))
}

pub fn save_image<W: Write>(engine: &Engine, w: &mut W) -> io::Result<()> {
    let raw = serde_json::to_vec(&engine.image())?;
    w.write_all(MAGIC)?;
    w.write_all(&VERSION_CURRENT.to_le_bytes())?;
    w.write_all(&(raw.len() as u64).to_le_bytes())?;
    w.write_all(&compress_lz4(&raw))?;
    Ok(())
}

pub fn load_image<R: Read>(r: &mut R) -> io::Result<Engine> {
    let magic: [u8; 8] = read_exact(r)?;
    if &magic != MAGIC {
        return Err(invalid("not a vortex engine image"));
    }
    let version = u32::from_le_bytes(read_exact(r)?);
    if version != VERSION_CURRENT {
        return Err(invalid("unsupported engine image version"));
    }
    let raw_len = u64::from_le_bytes(read_exact(r)?) as usize;

    let mut compressed = Vec::new();
    r.read_to_end(&mut compressed)?;
    let raw = decompress_lz4(&compressed, raw_len)?;
    let image: EngineImage = serde_json::from_slice(&raw)?;
    validate(&image)?;
    Ok(Engine::from_image(image))
}

fn validate(image: &EngineImage) -> io::Result<()> {
    let n = image.config.neuron_count;
    if image.potential.len() != n || image.last_spike.len() != n || image.edges.len() != n {
        return Err(invalid("engine image does not match its neuron count"));
    }
    Ok(())
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

fn read_exact<const N: usize, R: Read>(r: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::AssetRecord;

    fn sample_records() -> Vec<AssetRecord> {
        (0..6)
            .map(|k| AssetRecord {
                symbol: format!("S{k}"),
                price_change_24h: 4.0 + 2.0 * k as f32,
                volume: 5e7,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn image_round_trip_preserves_state_and_behavior() {
        let mut engine = Engine::new(EngineConfig::with_size(24, 4).with_seed(8));
        let records = sample_records();
        engine.process(&records);

        let mut bytes: Vec<u8> = Vec::new();
        save_image(&engine, &mut bytes).unwrap();
        let mut loaded = load_image(&mut io::Cursor::new(bytes)).unwrap();

        assert_eq!(engine.status(), loaded.status());
        assert_eq!(engine.improvement_status(), loaded.improvement_status());

        // The loaded engine continues the same deterministic trajectory.
        let a = engine.process(&records);
        let b = loaded.process(&records);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn load_rejects_foreign_bytes() {
        let mut garbage = io::Cursor::new(b"NOTANIMG........".to_vec());
        assert!(load_image(&mut garbage).is_err());
    }

    #[test]
    fn load_rejects_inconsistent_images() {
        let engine = Engine::new(EngineConfig::with_size(8, 2).with_seed(1));
        let mut image = engine.image();
        image.potential.pop();

        let raw = serde_json::to_vec(&image).unwrap();
        let mut bytes: Vec<u8> = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&VERSION_CURRENT.to_le_bytes());
        bytes.extend_from_slice(&(raw.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&compress_lz4(&raw));

        assert!(load_image(&mut io::Cursor::new(bytes)).is_err());
    }
}
