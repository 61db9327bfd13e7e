//! Externally visible analysis, status, and strategy vocabulary.
//!
//! Everything here is a read-only projection the engine hands to callers;
//! none of it feeds back into propagation.

use serde::{Deserialize, Serialize};

/// Named read-out bands of the neuron index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    PatternDetection,
    SentimentAnalysis,
    RiskAssessment,
    StrategyGeneration,
    MetaLearning,
}

/// Strong read-out markers surfaced per analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongPricePattern,
    PositiveSentiment,
    NegativeSentiment,
}

/// Coarser per-layer observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Insight {
    ActivePricePatterns,
    RiskSystemEngaged,
    FreshStrategyIdeas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    PatternBased,
    SentimentBased,
    RiskManaged,
}

/// A generated strategy suggestion with a fixed template per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub kind: StrategyKind,
    pub confidence: f32,
    pub description: String,
}

impl Strategy {
    pub(crate) fn pattern_based() -> Self {
        Self {
            name: "pattern-driven".to_string(),
            kind: StrategyKind::PatternBased,
            confidence: 0.7,
            description: "Trade the price patterns the network is currently flagging".to_string(),
        }
    }

    pub(crate) fn sentiment_based() -> Self {
        Self {
            name: "sentiment-positive".to_string(),
            kind: StrategyKind::SentimentBased,
            confidence: 0.65,
            description: "Rotate into assets carrying positive crowd sentiment".to_string(),
        }
    }

    pub(crate) fn risk_managed() -> Self {
        Self {
            name: "risk-managed".to_string(),
            kind: StrategyKind::RiskManaged,
            confidence: 0.75,
            description: "Spread allocation with risk controls leading the sizing".to_string(),
        }
    }
}

// ---------------------------------------------------------------------
// Candidate strategies explored by the self-improvement scheduler
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStyle {
    Momentum,
    MeanReversion,
    Breakout,
    SentimentDriven,
}

impl TradeStyle {
    pub const ALL: [TradeStyle; 4] = [
        TradeStyle::Momentum,
        TradeStyle::MeanReversion,
        TradeStyle::Breakout,
        TradeStyle::SentimentDriven,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "24h")]
    H24,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::H1, Timeframe::H4, Timeframe::H24];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];
}

/// One point in the style x timeframe x risk grid the scheduler simulates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyCandidate {
    pub style: TradeStyle,
    pub timeframe: Timeframe,
    pub risk: RiskLevel,
    pub confidence: f32,
}

// ---------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------

/// Cumulative self-improvement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementStats {
    pub architectural_changes: u64,
    pub new_strategies_tested: u64,
    pub performance_improvements: u64,
    pub connections_optimized: u64,
}

/// Result of one `process` call. Always total: a failed or empty run yields
/// the neutral analysis (with `degraded` set when inputs were malformed)
/// instead of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub signals: Vec<Signal>,
    pub insights: Vec<Insight>,
    pub strategies: Vec<Strategy>,
    /// Confidence score in [0, 100].
    pub confidence: f32,
    pub degraded: bool,
    pub improvement_enabled: bool,
    pub improvement_stats: ImprovementStats,
}

impl Analysis {
    pub fn neutral(improvement_enabled: bool, improvement_stats: ImprovementStats) -> Self {
        Self {
            signals: Vec::new(),
            insights: Vec::new(),
            strategies: Vec::new(),
            confidence: 0.0,
            degraded: false,
            improvement_enabled,
            improvement_stats,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerActivity {
    pub layer: Layer,
    pub mean_activation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Childhood,
    Adolescence,
    Maturity,
}

/// Read-only engine status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub total_neurons: usize,
    pub active_neurons: usize,
    pub learning_sessions: u64,
    pub strategies_generated: u64,
    pub knowledge_entries: usize,
    pub growth_stage: GrowthStage,
    pub growth_percentage: f32,
    pub improvement_cycles: u64,
    pub layer_activity: Vec<LayerActivity>,
    pub created_unix: u64,
    pub age_days: u64,
}

/// Read-only self-improvement snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementStatus {
    pub enabled: bool,
    pub improvement_cycles: u64,
    pub last_improvement_unix: u64,
    pub next_improvement_unix: u64,
    pub stats: ImprovementStats,
}
