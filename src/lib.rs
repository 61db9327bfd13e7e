//! # vortex
//!
//! A self-mutating spiking-network engine for market snapshot analysis.
//!
//! The engine ingests one record per tradable asset (price moves, volume,
//! sentiment), pushes a rule-encoded activation through a sparse
//! leaky-integrate-and-fire network with spike-timing-dependent plasticity,
//! and reads the result back out as trading signals, insights, strategies,
//! and a confidence score. On a wall-clock schedule it also rewires itself:
//! pruning weak edges, growing new ones between busy neurons, simulating
//! candidate strategies, and retuning its own learning parameters.
//!
//! This is a heuristic simulation, not a trained forecasting model.
//!
//! ## Quick Start
//!
//! ```
//! use vortex::prelude::*;
//!
//! let cfg = EngineConfig::with_size(256, 12).with_seed(42);
//! let mut engine = Engine::new(cfg);
//!
//! let records = vec![AssetRecord {
//!     symbol: "BTC".to_string(),
//!     price_change_24h: 12.0,
//!     volume: 2e9,
//!     ..Default::default()
//! }];
//!
//! let analysis = engine.process(&records);
//! assert!(analysis.confidence > 0.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: multi-threaded propagation via rayon
//!
//! ## Modules
//!
//! - [`engine`]: the engine itself (propagation, plasticity, self-improvement)
//! - [`connectivity`]: sparse directed weighted graph storage
//! - [`market`]: asset records and the rule-based input encoder
//! - [`analysis`]: externally visible analysis/status vocabulary
//! - [`knowledge`]: bounded insertion-ordered caches
//! - [`storage`]: engine state images (save/load)

pub mod analysis;
pub mod connectivity;
pub mod engine;
pub mod knowledge;
pub mod market;
pub mod prng;
pub mod storage;

/// Prelude module for convenient imports.
///
/// ```
/// use vortex::prelude::*;
/// ```
pub mod prelude {
    pub use crate::analysis::{
        Analysis, GrowthStage, ImprovementStats, ImprovementStatus, Insight, Layer, LayerActivity,
        Signal, Status, Strategy, StrategyKind,
    };
    pub use crate::engine::{Engine, EngineConfig};
    pub use crate::market::AssetRecord;
}
