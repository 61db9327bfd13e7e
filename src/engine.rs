//! The spiking market-analysis engine.
//!
//! One `process` call encodes a market snapshot into a sparse activation
//! vector, advances the network for a fixed number of iterations (leaky
//! integrate-and-fire with spike-timing-dependent plasticity), reads the
//! layer bands back out into an [`Analysis`], and - when the improvement
//! interval has elapsed - runs one three-phase self-improvement cycle that
//! rewires weak/busy regions, simulates candidate strategies, and retunes
//! the learning rate and threshold.
//!
//! The engine is a plain owned value with no global state; callers that
//! share one instance across threads wrap it in a single exclusive lock
//! held for a full invocation.

use core::ops::Range;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{
    Analysis, GrowthStage, ImprovementStats, ImprovementStatus, Insight, Layer, LayerActivity,
    RiskLevel, Signal, Status, Strategy, StrategyCandidate, Timeframe, TradeStyle,
};
use crate::connectivity::Connectivity;
use crate::knowledge::{BoundedCache, PatternStat, RiskFactor, StrategyRecord};
use crate::market::{self, AssetRecord};
use crate::prng::Prng;
use crate::storage::EngineImage;

const PROPAGATION_ITERATIONS: usize = 3;

// Plasticity: predecessors that spiked within this many ticks share credit.
const STDP_WINDOW_TICKS: i64 = 100;
const NEVER_SPIKED: i64 = -1000;

// Self-improvement.
const PRUNE_EPSILON: f32 = 0.01;
const ACTIVE_SET_LIMIT: usize = 50;
const GROWTH_PROBABILITY: f32 = 0.1;
const CANDIDATES_EVALUATED: usize = 20;
const RETENTION_SCORE: f32 = 0.6;

// Knowledge caches.
const MARKET_PATTERN_CAPACITY: usize = 500;
const STRATEGY_CAPACITY: usize = 300;
const RISK_CAPACITY: usize = 200;
const PATTERN_LEARN_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    pub neuron_count: usize,
    pub connections_per_neuron: usize,

    /// Spike threshold. Mutated slowly by the parametric phase.
    pub threshold: f32,
    pub resting_potential: f32,
    /// Multiplicative per-iteration decay of membrane potential.
    pub leak_factor: f32,

    /// STDP credit scale. Mutated slowly by the parametric phase.
    pub learning_rate: f32,
    pub stdp_tau: f32,

    /// Minimum wall-clock gap between self-improvement cycles.
    pub improvement_interval: Duration,

    // If set, makes behavior reproducible for evaluation.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            neuron_count: 3500,
            connections_per_neuron: 80,
            threshold: 1.0,
            resting_potential: 0.0,
            leak_factor: 0.95,
            learning_rate: 0.01,
            stdp_tau: 20.0,
            improvement_interval: Duration::from_secs(6 * 3600),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_size(neuron_count: usize, connections_per_neuron: usize) -> Self {
        Self {
            neuron_count,
            connections_per_neuron,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_improvement_interval(mut self, interval: Duration) -> Self {
        self.improvement_interval = interval;
        self
    }
}

// ---------------------------------------------------------------------
// Layer partition
// ---------------------------------------------------------------------

const LAYERS: [Layer; 5] = [
    Layer::PatternDetection,
    Layer::SentimentAnalysis,
    Layer::RiskAssessment,
    Layer::StrategyGeneration,
    Layer::MetaLearning,
];

const CANONICAL_NEURONS: usize = 3500;
const CANONICAL_BOUNDS: [usize; 6] = [0, 800, 1300, 1800, 2500, 3500];

/// Static partition of `[0, N)` into the five read-out bands. Boundaries are
/// the canonical ones at N = 3500, scaled proportionally for other sizes so
/// the partition always covers the index space with no gaps.
#[derive(Debug, Clone)]
struct LayerPartition {
    bounds: [usize; 6],
}

impl LayerPartition {
    fn new(neuron_count: usize) -> Self {
        let mut bounds = [0usize; 6];
        for (k, &b) in CANONICAL_BOUNDS.iter().enumerate() {
            bounds[k] = b * neuron_count / CANONICAL_NEURONS;
        }
        bounds[5] = neuron_count;
        Self { bounds }
    }

    fn range(&self, layer: Layer) -> Range<usize> {
        let k = LAYERS.iter().position(|&l| l == layer).unwrap_or(0);
        self.bounds[k]..self.bounds[k + 1]
    }

    fn iter(&self) -> impl Iterator<Item = (Layer, Range<usize>)> + '_ {
        LAYERS
            .iter()
            .enumerate()
            .map(move |(k, &layer)| (layer, self.bounds[k]..self.bounds[k + 1]))
    }
}

// ---------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------

#[derive(Debug)]
pub struct Engine {
    cfg: EngineConfig,
    store: Connectivity,
    layers: LayerPartition,
    rng: Prng,

    potential: Vec<f32>,
    last_spike: Vec<i64>,
    threshold: f32,
    learning_rate: f32,

    market_patterns: BoundedCache<PatternStat>,
    strategy_performance: BoundedCache<StrategyRecord>,
    risk_factors: BoundedCache<RiskFactor>,

    improvement_enabled: bool,
    last_improvement: SystemTime,
    improvement_cycles: u64,
    stats: ImprovementStats,

    created: SystemTime,
    learning_sessions: u64,
    strategies_generated: u64,
    success_rate: f32,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        let mut rng = Prng::new(cfg.seed.unwrap_or(1));
        let store = Connectivity::random(cfg.neuron_count, cfg.connections_per_neuron, &mut rng);
        let now = SystemTime::now();

        Self {
            store,
            layers: LayerPartition::new(cfg.neuron_count),
            rng,
            potential: vec![0.0; cfg.neuron_count],
            last_spike: vec![NEVER_SPIKED; cfg.neuron_count],
            threshold: cfg.threshold,
            learning_rate: cfg.learning_rate,
            market_patterns: BoundedCache::new(MARKET_PATTERN_CAPACITY),
            strategy_performance: BoundedCache::new(STRATEGY_CAPACITY),
            risk_factors: BoundedCache::new(RISK_CAPACITY),
            improvement_enabled: true,
            last_improvement: now,
            improvement_cycles: 0,
            stats: ImprovementStats::default(),
            created: now,
            learning_sessions: 0,
            strategies_generated: 0,
            success_rate: 0.0,
            cfg,
        }
    }

    /// Main entry: one full invocation. Never fails; an empty snapshot
    /// returns the neutral analysis without touching state, malformed
    /// records degrade to defaults and set the `degraded` flag.
    pub fn process(&mut self, records: &[AssetRecord]) -> Analysis {
        if records.is_empty() {
            return Analysis::neutral(self.improvement_enabled, self.stats);
        }

        let encoded = market::encode(records, self.cfg.neuron_count);
        if encoded.malformed_records > 0 {
            warn!(
                count = encoded.malformed_records,
                "malformed asset records defaulted during encoding"
            );
        }

        self.propagate(&encoded.activation);
        let mut analysis = self.synthesize(records);
        analysis.degraded = encoded.malformed_records > 0;

        self.learn_patterns(records);
        self.learning_sessions += 1;

        if self.should_improve() {
            self.run_improvement_cycle();
        }

        analysis
    }

    pub fn stop_self_improvement(&mut self) {
        self.improvement_enabled = false;
        info!("self-improvement stopped by caller");
    }

    pub fn resume_self_improvement(&mut self) {
        self.improvement_enabled = true;
        info!("self-improvement resumed by caller");
    }

    pub fn status(&self) -> Status {
        let (growth_stage, growth_percentage) = self.growth();
        Status {
            total_neurons: self.cfg.neuron_count,
            active_neurons: self.potential.iter().filter(|&&p| p > 0.1).count(),
            learning_sessions: self.learning_sessions,
            strategies_generated: self.strategies_generated,
            knowledge_entries: self.market_patterns.len()
                + self.strategy_performance.len()
                + self.risk_factors.len(),
            growth_stage,
            growth_percentage,
            improvement_cycles: self.improvement_cycles,
            layer_activity: self
                .layers
                .iter()
                .map(|(layer, range)| LayerActivity {
                    layer,
                    mean_activation: mean(&self.potential[range]),
                })
                .collect(),
            created_unix: unix_secs(self.created),
            age_days: SystemTime::now()
                .duration_since(self.created)
                .unwrap_or_default()
                .as_secs()
                / 86_400,
        }
    }

    pub fn improvement_status(&self) -> ImprovementStatus {
        ImprovementStatus {
            enabled: self.improvement_enabled,
            improvement_cycles: self.improvement_cycles,
            last_improvement_unix: unix_secs(self.last_improvement),
            next_improvement_unix: unix_secs(self.last_improvement + self.cfg.improvement_interval),
            stats: self.stats,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    // -----------------------------------------------------------------
    // Propagation + plasticity
    // -----------------------------------------------------------------

    fn propagate(&mut self, activation: &[f32]) {
        // The tick used for spike timing is the learning-session counter,
        // not wall clock; it advances once per invocation.
        let tick = self.learning_sessions as i64;

        for _ in 0..PROPAGATION_ITERATIONS {
            let synaptic = self.store.apply(&self.potential);
            for i in 0..self.potential.len() {
                self.potential[i] =
                    self.cfg.leak_factor * self.potential[i] + synaptic[i] + activation[i];
            }

            // Decide the spike set before any reset so an earlier reset
            // cannot affect a later index's threshold test in this pass.
            let spiked: Vec<usize> = (0..self.potential.len())
                .filter(|&i| self.potential[i] > self.threshold)
                .collect();
            for &s in &spiked {
                self.potential[s] = self.cfg.resting_potential;
                self.apply_plasticity(s, tick);
            }
        }
    }

    /// Recency-weighted credit to every predecessor that spiked inside the
    /// STDP window, clamped into [-1, 1].
    fn apply_plasticity(&mut self, spiked: usize, tick: i64) {
        let predecessors = self.store.neighbors_in(spiked).to_vec();
        for p in predecessors {
            let last = self.last_spike[p as usize];
            if last <= 0 {
                continue;
            }
            let dt = tick - last;
            if dt >= STDP_WINDOW_TICKS {
                continue;
            }
            let credit = self.learning_rate * (-(dt as f32) / self.cfg.stdp_tau).exp();
            self.store.bump(p as usize, spiked, credit);
        }
        self.last_spike[spiked] = tick;
    }

    // -----------------------------------------------------------------
    // Analysis synthesis
    // -----------------------------------------------------------------

    fn synthesize(&mut self, records: &[AssetRecord]) -> Analysis {
        let pattern_range = self.layers.range(Layer::PatternDetection);
        let pattern_mean = mean(&self.potential[pattern_range.clone()]);
        let sentiment_mean = mean(&self.potential[self.layers.range(Layer::SentimentAnalysis)]);
        let risk_mean = mean(&self.potential[self.layers.range(Layer::RiskAssessment)]);
        let strategy_mean = mean(&self.potential[self.layers.range(Layer::StrategyGeneration)]);

        let mut signals = Vec::new();
        let strong_pattern_nodes = self.potential[pattern_range]
            .iter()
            .filter(|&&p| p > 0.7)
            .count();
        if strong_pattern_nodes > 10 {
            signals.push(Signal::StrongPricePattern);
        }
        if sentiment_mean > 0.6 {
            signals.push(Signal::PositiveSentiment);
        } else if sentiment_mean < 0.3 {
            signals.push(Signal::NegativeSentiment);
        }

        let mut insights = Vec::new();
        if pattern_mean > 0.6 {
            insights.push(Insight::ActivePricePatterns);
        }
        if risk_mean > 0.5 {
            insights.push(Insight::RiskSystemEngaged);
        }
        if strategy_mean > 0.4 {
            insights.push(Insight::FreshStrategyIdeas);
        }

        let mut strategies = Vec::new();
        if pattern_mean > 0.5 {
            strategies.push(Strategy::pattern_based());
        }
        if sentiment_mean > 0.6 {
            strategies.push(Strategy::sentiment_based());
        }
        if risk_mean > 0.4 {
            strategies.push(Strategy::risk_managed());
        }
        strategies.truncate(3);

        let confidence = self.confidence(records);
        self.strategies_generated += strategies.len() as u64;

        Analysis {
            signals,
            insights,
            strategies,
            confidence,
            degraded: false,
            improvement_enabled: self.improvement_enabled,
            improvement_stats: self.stats,
        }
    }

    /// Confidence in [0, 100]: network activity, accumulated experience,
    /// and output stability, each with a fixed weight.
    fn confidence(&self, records: &[AssetRecord]) -> f32 {
        if records.is_empty() {
            return 0.0;
        }
        let activity = (mean_abs(&self.potential) * 2.0).min(1.0) * 0.4;
        let experience = (self.learning_sessions as f32 / 100.0).min(1.0) * 0.3;
        let stability = (1.0 - std_dev(&self.potential) / 2.0) * 0.3;
        (activity + experience + stability).min(1.0) * 100.0
    }

    /// Remember recurring (symbol, 24h-bucket) patterns, and flag outsized
    /// swings as risk factors.
    fn learn_patterns(&mut self, records: &[AssetRecord]) {
        let now = SystemTime::now();
        for rec in records.iter().take(PATTERN_LEARN_LIMIT) {
            let key = format!("{}_{:.1}", rec.symbol, rec.price_change_24h);
            if let Some(stat) = self.market_patterns.get_or_insert_with(&key, || PatternStat {
                first_seen: now,
                count: 0,
                performance: 0.0,
            }) {
                stat.count += 1;
            }

            if rec.price_change_24h.abs() > 10.0 {
                self.risk_factors.insert(
                    rec.symbol.clone(),
                    RiskFactor {
                        swing_pct: rec.price_change_24h,
                        observed: now,
                    },
                );
            }
        }
    }

    // -----------------------------------------------------------------
    // Self-improvement
    // -----------------------------------------------------------------

    fn should_improve(&self) -> bool {
        if !self.improvement_enabled {
            return false;
        }
        SystemTime::now()
            .duration_since(self.last_improvement)
            .map(|elapsed| elapsed > self.cfg.improvement_interval)
            .unwrap_or(false)
    }

    /// One cycle: architecture, strategies, parameters - then close the
    /// gate. At most one cycle fires per `process` call.
    fn run_improvement_cycle(&mut self) {
        let (removed, added) = self.refine_architecture();
        let retained = self.explore_strategies();
        self.retune_parameters();

        self.last_improvement = SystemTime::now();
        self.improvement_cycles += 1;
        info!(
            cycle = self.improvement_cycles,
            removed,
            added,
            retained,
            learning_rate = self.learning_rate,
            threshold = self.threshold,
            "self-improvement cycle complete"
        );
    }

    /// Phase 1: drop weak edges, grow fresh ones among the busiest nodes.
    fn refine_architecture(&mut self) -> (usize, usize) {
        let removed = self.store.prune_below(PRUNE_EPSILON);

        let active: Vec<usize> = (0..self.cfg.neuron_count)
            .filter(|&i| self.potential[i] > 0.3)
            .take(ACTIVE_SET_LIMIT)
            .collect();
        let mut added = 0;
        for &i in &active {
            for &j in &active {
                if i == j || self.store.get(i, j) != 0.0 {
                    continue;
                }
                if self.rng.next_f32_01() < GROWTH_PROBABILITY {
                    let weight = self.rng.gen_range_f32(0.1, 0.3);
                    self.store.set(i, j, weight);
                    added += 1;
                }
            }
        }

        self.stats.architectural_changes += 1;
        self.stats.connections_optimized += (removed + added) as u64;
        (removed, added)
    }

    /// Phase 2: simulate candidate strategies, keep the high scorers.
    fn explore_strategies(&mut self) -> usize {
        let candidates = self.strategy_variations();
        let now = SystemTime::now();

        let mut retained = 0usize;
        let mut score_sum = 0.0f32;
        let mut evaluated = 0usize;
        for candidate in candidates.into_iter().take(CANDIDATES_EVALUATED) {
            let score = self.simulate_strategy(&candidate);
            score_sum += score;
            evaluated += 1;
            if score > RETENTION_SCORE {
                let key = format!("auto_{}_{}", self.improvement_cycles, retained);
                self.strategy_performance.insert(
                    key,
                    StrategyRecord {
                        candidate,
                        score,
                        created: now,
                    },
                );
                retained += 1;
            }
        }

        self.stats.new_strategies_tested += retained as u64;
        if evaluated > 0 {
            // The simulated batch is the only performance feedback there is;
            // track it as a slow EMA.
            let batch_mean = score_sum / evaluated as f32;
            self.success_rate = 0.9 * self.success_rate + 0.1 * batch_mean;
        }
        retained
    }

    fn strategy_variations(&mut self) -> Vec<StrategyCandidate> {
        let mut variations =
            Vec::with_capacity(TradeStyle::ALL.len() * Timeframe::ALL.len() * RiskLevel::ALL.len());
        for style in TradeStyle::ALL {
            for timeframe in Timeframe::ALL {
                for risk in RiskLevel::ALL {
                    variations.push(StrategyCandidate {
                        style,
                        timeframe,
                        risk,
                        confidence: self.rng.gen_range_f32(0.5, 0.9),
                    });
                }
            }
        }
        variations
    }

    fn simulate_strategy(&mut self, candidate: &StrategyCandidate) -> f32 {
        let mut score = 0.5;
        match candidate.style {
            TradeStyle::Momentum => score += 0.2,
            TradeStyle::Breakout => score += 0.15,
            _ => {}
        }
        if candidate.timeframe == Timeframe::H4 {
            score += 0.1;
        }
        (score + self.rng.gen_range_f32(-0.1, 0.1)).min(0.95)
    }

    /// Phase 3: nudge learning rate by recent performance and threshold by
    /// network activity, inside fixed bounds.
    fn retune_parameters(&mut self) {
        if self.success_rate > 0.7 {
            self.learning_rate = (self.learning_rate * 1.1).min(0.05);
        } else {
            self.learning_rate = (self.learning_rate * 0.9).max(0.001);
        }

        if mean_abs(&self.potential) > 0.4 {
            self.threshold = (self.threshold * 1.05).min(1.5);
        } else {
            self.threshold = (self.threshold * 0.95).max(0.5);
        }

        self.stats.performance_improvements += 1;
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    fn growth(&self) -> (GrowthStage, f32) {
        let total = (self.learning_sessions + self.improvement_cycles * 10) as f32;
        if total < 100.0 {
            (GrowthStage::Childhood, total / 100.0 * 25.0)
        } else if total < 500.0 {
            (GrowthStage::Adolescence, 25.0 + (total - 100.0) / 400.0 * 45.0)
        } else {
            (
                GrowthStage::Maturity,
                70.0 + ((total - 500.0) / 1000.0 * 30.0).min(30.0),
            )
        }
    }

    // -----------------------------------------------------------------
    // State image
    // -----------------------------------------------------------------

    pub(crate) fn image(&self) -> EngineImage {
        EngineImage {
            config: self.cfg,
            threshold: self.threshold,
            learning_rate: self.learning_rate,
            potential: self.potential.clone(),
            last_spike: self.last_spike.clone(),
            edges: self.store.rows().to_vec(),
            rng_state: self.rng.state(),
            market_patterns: self.market_patterns.clone(),
            strategy_performance: self.strategy_performance.clone(),
            risk_factors: self.risk_factors.clone(),
            improvement_enabled: self.improvement_enabled,
            last_improvement: self.last_improvement,
            improvement_cycles: self.improvement_cycles,
            stats: self.stats,
            created: self.created,
            learning_sessions: self.learning_sessions,
            strategies_generated: self.strategies_generated,
            success_rate: self.success_rate,
        }
    }

    pub(crate) fn from_image(image: EngineImage) -> Self {
        Self {
            store: Connectivity::from_rows(image.edges),
            layers: LayerPartition::new(image.config.neuron_count),
            rng: Prng::from_state(image.rng_state),
            potential: image.potential,
            last_spike: image.last_spike,
            threshold: image.threshold,
            learning_rate: image.learning_rate,
            market_patterns: image.market_patterns,
            strategy_performance: image.strategy_performance,
            risk_factors: image.risk_factors,
            improvement_enabled: image.improvement_enabled,
            last_improvement: image.last_improvement,
            improvement_cycles: image.improvement_cycles,
            stats: image.stats,
            created: image.created,
            learning_sessions: image.learning_sessions,
            strategies_generated: image.strategies_generated,
            success_rate: image.success_rate,
            cfg: image.config,
        }
    }
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn mean(xs: &[f32]) -> f32 {
    if xs.is_empty() {
        return 0.0;
    }
    (xs.iter().map(|&x| x as f64).sum::<f64>() / xs.len() as f64) as f32
}

fn mean_abs(xs: &[f32]) -> f32 {
    if xs.is_empty() {
        return 0.0;
    }
    (xs.iter().map(|&x| (x as f64).abs()).sum::<f64>() / xs.len() as f64) as f32
}

fn std_dev(xs: &[f32]) -> f32 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs) as f64;
    let var = xs.iter().map(|&x| (x as f64 - m).powi(2)).sum::<f64>() / xs.len() as f64;
    var.sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc_record() -> AssetRecord {
        AssetRecord {
            name: "Bitcoin".to_string(),
            symbol: "BTC".to_string(),
            price: 65_000.0,
            price_change_24h: 12.0,
            price_change_1h: 4.0,
            volume: 2e9,
            sentiment: None,
        }
    }

    fn snapshot(count: usize) -> Vec<AssetRecord> {
        (0..count)
            .map(|k| AssetRecord {
                symbol: format!("A{k}"),
                price_change_24h: 6.0 + k as f32,
                volume: 2e9,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn seeded_engines_produce_identical_analyses() {
        let cfg = EngineConfig::with_size(64, 8).with_seed(7);
        let mut a = Engine::new(cfg);
        let mut b = Engine::new(cfg);

        let records = snapshot(5);
        for _ in 0..3 {
            let out_a = a.process(&records);
            let out_b = b.process(&records);
            assert_eq!(
                serde_json::to_string(&out_a).unwrap(),
                serde_json::to_string(&out_b).unwrap()
            );
        }
        assert_eq!(a.potential, b.potential);
    }

    #[test]
    fn empty_snapshot_returns_neutral_analysis_without_touching_state() {
        let mut engine = Engine::new(EngineConfig::with_size(32, 4).with_seed(1));
        let before = engine.potential.clone();

        let analysis = engine.process(&[]);
        assert_eq!(analysis.confidence, 0.0);
        assert!(analysis.signals.is_empty());
        assert!(analysis.insights.is_empty());
        assert!(analysis.strategies.is_empty());
        assert!(!analysis.degraded);
        assert_eq!(engine.learning_sessions, 0);
        assert_eq!(engine.potential, before);
    }

    #[test]
    fn spiked_neurons_end_at_resting_potential() {
        let mut engine = Engine::new(EngineConfig::with_size(10, 3).with_seed(3));
        // 20 strong records stack to +2.0 on every index, forcing spikes.
        let records = snapshot(20);
        engine.process(&records);

        assert!(engine.last_spike.iter().any(|&t| t != NEVER_SPIKED));
        for &p in &engine.potential {
            assert!(p <= engine.threshold);
        }
    }

    #[test]
    fn weights_stay_clamped_through_learning_and_improvement() {
        let cfg = EngineConfig::with_size(16, 4)
            .with_seed(5)
            .with_improvement_interval(Duration::ZERO);
        let mut engine = Engine::new(cfg);
        let records = snapshot(20);
        for _ in 0..5 {
            engine.process(&records);
        }

        for row in engine.store.rows() {
            for s in row {
                assert!(s.weight >= -1.0 && s.weight <= 1.0);
                assert_ne!(s.weight, 0.0);
            }
        }
    }

    #[test]
    fn improvement_never_fires_inside_the_interval() {
        let mut engine = Engine::new(EngineConfig::with_size(16, 4).with_seed(2));
        let records = snapshot(3);
        engine.process(&records);
        engine.process(&records);
        assert_eq!(engine.improvement_cycles, 0);
    }

    #[test]
    fn improvement_fires_once_per_call_after_the_interval() {
        let cfg = EngineConfig::with_size(16, 4)
            .with_seed(2)
            .with_improvement_interval(Duration::ZERO);
        let mut engine = Engine::new(cfg);
        let records = snapshot(3);

        engine.process(&records);
        assert_eq!(engine.improvement_cycles, 1);
        engine.process(&records);
        assert_eq!(engine.improvement_cycles, 2);
        assert_eq!(engine.stats.architectural_changes, 2);
        assert_eq!(engine.stats.performance_improvements, 2);
    }

    #[test]
    fn stop_and_resume_gate_the_scheduler() {
        let cfg = EngineConfig::with_size(16, 4)
            .with_seed(2)
            .with_improvement_interval(Duration::ZERO);
        let mut engine = Engine::new(cfg);
        let records = snapshot(3);

        engine.stop_self_improvement();
        engine.process(&records);
        engine.process(&records);
        assert_eq!(engine.improvement_cycles, 0);

        engine.resume_self_improvement();
        engine.process(&records);
        assert_eq!(engine.improvement_cycles, 1);
    }

    #[test]
    fn tiny_network_scenario_yields_positive_confidence() {
        let mut engine = Engine::new(EngineConfig::with_size(10, 3).with_seed(1));
        let analysis = engine.process(&[btc_record()]);
        assert!(analysis.confidence > 0.0);
    }

    #[test]
    fn fresh_engine_improvement_status() {
        let cfg = EngineConfig::with_size(16, 4).with_seed(1);
        let engine = Engine::new(cfg);
        let status = engine.improvement_status();

        assert!(status.enabled);
        assert_eq!(status.improvement_cycles, 0);
        assert_eq!(
            status.next_improvement_unix,
            status.last_improvement_unix + cfg.improvement_interval.as_secs()
        );
        assert_eq!(status.last_improvement_unix, engine.status().created_unix);
    }

    #[test]
    fn growth_stages_follow_the_linear_bands() {
        let mut engine = Engine::new(EngineConfig::with_size(8, 2).with_seed(1));

        engine.learning_sessions = 50;
        assert_eq!(engine.growth(), (GrowthStage::Childhood, 12.5));

        engine.learning_sessions = 100;
        assert_eq!(engine.growth(), (GrowthStage::Adolescence, 25.0));

        engine.learning_sessions = 0;
        engine.improvement_cycles = 60;
        let (stage, pct) = engine.growth();
        assert_eq!(stage, GrowthStage::Maturity);
        assert!((pct - 73.0).abs() < 1e-3);

        engine.improvement_cycles = 500;
        assert_eq!(engine.growth().1, 100.0);
    }

    #[test]
    fn strategic_phase_retains_only_high_scorers() {
        let mut engine = Engine::new(EngineConfig::with_size(8, 2).with_seed(9));
        let retained = engine.explore_strategies();

        assert!(retained <= CANDIDATES_EVALUATED);
        assert_eq!(engine.strategy_performance.len(), retained);
        assert!(engine.success_rate > 0.0);
        for key in engine.strategy_performance.keys() {
            assert!(key.starts_with("auto_0_"));
        }
        for key in engine.strategy_performance.keys() {
            let record = engine.strategy_performance.get(key).unwrap();
            assert!(record.score > RETENTION_SCORE);
            assert!(record.score <= 0.95);
        }
    }

    #[test]
    fn architectural_phase_grows_edges_among_active_nodes() {
        let mut engine = Engine::new(EngineConfig::with_size(30, 2).with_seed(4));
        for i in 0..10 {
            engine.potential[i] = 0.5;
        }
        let edges_before = engine.store.edge_count();
        let (removed, added) = engine.refine_architecture();

        assert_eq!(engine.store.edge_count(), edges_before - removed + added);
        assert_eq!(engine.stats.architectural_changes, 1);
        assert_eq!(engine.stats.connections_optimized, (removed + added) as u64);
        for row in engine.store.rows() {
            for s in row {
                assert!(s.weight.abs() <= 1.0);
            }
        }
    }

    #[test]
    fn parametric_phase_respects_parameter_bounds() {
        let mut engine = Engine::new(EngineConfig::with_size(8, 2).with_seed(1));

        engine.success_rate = 1.0;
        for _ in 0..100 {
            engine.retune_parameters();
        }
        assert_eq!(engine.learning_rate, 0.05);
        assert_eq!(engine.threshold, 0.5);

        engine.success_rate = 0.0;
        for _ in 0..200 {
            engine.retune_parameters();
        }
        assert!((engine.learning_rate - 0.001).abs() < 1e-6);
    }

    #[test]
    fn pattern_learning_fills_the_caches() {
        let mut engine = Engine::new(EngineConfig::with_size(16, 4).with_seed(2));
        let mut records = snapshot(3);
        records.push(btc_record());

        engine.process(&records);
        assert_eq!(engine.market_patterns.len(), 4);
        // BTC moved 12% in 24h, so it lands in the risk cache too.
        assert!(engine.risk_factors.contains_key("BTC"));

        engine.process(&records);
        let key = "BTC_12.0";
        assert_eq!(engine.market_patterns.get(key).map(|s| s.count), Some(2));
    }

    #[test]
    fn malformed_records_mark_the_analysis_degraded() {
        let mut engine = Engine::new(EngineConfig::with_size(16, 4).with_seed(2));
        let mut records = snapshot(2);
        records[0].price_change_24h = f32::NAN;

        let analysis = engine.process(&records);
        assert!(analysis.degraded);
    }

    #[test]
    fn layer_partition_scales_and_covers_the_index_space() {
        for n in [10, 100, 3500] {
            let layers = LayerPartition::new(n);
            let mut covered = 0;
            let mut prev_end = 0;
            for (_, range) in layers.iter() {
                assert_eq!(range.start, prev_end);
                prev_end = range.end;
                covered += range.len();
            }
            assert_eq!(covered, n);
            assert_eq!(prev_end, n);
        }

        let canonical = LayerPartition::new(3500);
        assert_eq!(canonical.range(Layer::PatternDetection), 0..800);
        assert_eq!(canonical.range(Layer::SentimentAnalysis), 800..1300);
        assert_eq!(canonical.range(Layer::MetaLearning), 2500..3500);
    }
}
