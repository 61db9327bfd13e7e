//! Market snapshot records and the rule-based input encoder.
//!
//! Each asset record maps to a handful of fixed "pattern neuron" index
//! ranges; every activated index accumulates +0.1 so multiple assets can
//! stack contributions. Records past the first 100 are ignored.

use core::ops::Range;

use serde::{Deserialize, Serialize};

/// One asset in a market snapshot, as delivered by the scanner.
///
/// Numeric fields default to zero when absent so a sparse upstream payload
/// degrades instead of failing. Sentiment is optional on purpose: a missing
/// score is "no signal" and activates neither sentiment range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, rename = "priceChange24h")]
    pub price_change_24h: f32,
    #[serde(default, rename = "priceChange1h")]
    pub price_change_1h: f32,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub sentiment: Option<f32>,
}

impl AssetRecord {
    /// True when every numeric field is a usable number.
    pub fn is_finite(&self) -> bool {
        self.price.is_finite()
            && self.price_change_24h.is_finite()
            && self.price_change_1h.is_finite()
            && self.volume.is_finite()
            && self.sentiment.map(|s| s.is_finite()).unwrap_or(true)
    }
}

/// Records beyond this count contribute nothing to the activation vector.
pub const MAX_ENCODED_RECORDS: usize = 100;

/// Encoder output: the activation vector plus a malformed-input tally used
/// to mark the analysis as degraded.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub activation: Vec<f32>,
    pub malformed_records: usize,
}

/// Map records onto a sparse activation vector over `neuron_count` nodes.
pub fn encode(records: &[AssetRecord], neuron_count: usize) -> Encoded {
    let mut activation = vec![0.0f32; neuron_count];
    let mut malformed = 0;

    for rec in records.iter().take(MAX_ENCODED_RECORDS) {
        if !rec.is_finite() {
            // Non-finite fields fail every threshold below, so the record
            // contributes nothing; it is only counted.
            malformed += 1;
        }
        for range in pattern_ranges(rec) {
            for idx in range {
                if idx < neuron_count {
                    activation[idx] += 0.1;
                }
            }
        }
    }

    Encoded {
        activation,
        malformed_records: malformed,
    }
}

fn pattern_ranges(rec: &AssetRecord) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();

    if rec.price_change_24h.abs() > 5.0 {
        ranges.push(0..50);
    }
    if rec.price_change_24h.abs() > 10.0 {
        ranges.push(50..80);
    }
    if rec.volume > 10_000_000.0 {
        ranges.push(80..120);
    }
    match rec.sentiment {
        Some(s) if s > 0.7 => ranges.push(800..850),
        Some(s) if s < 0.3 => ranges.push(850..900),
        _ => {}
    }

    ranges
}
