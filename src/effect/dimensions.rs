//! The seven qualitative dimensions and the scorers that turn their raw
//! context into bounded scalars. All scores are oriented toward the home
//! side except chaos (unsigned) and temporal decay (a multiplier).
//!
//! | dimension              | range          | neutral |
//! |------------------------|----------------|---------|
//! | sentiment field        | [-0.2, 0.2]    | 0       |
//! | narrative momentum     | [-0.15, 0.15]  | 0       |
//! | information asymmetry  | [-0.1, 0.1]    | 0       |
//! | chaos sensitivity      | [0, 1]         | 0       |
//! | network influence      | [-0.1, 0.1]    | 0       |
//! | temporal decay         | [0.5, 1.0]     | 1       |
//! | emergent pattern       | [-0.1, 0.1]    | 0       |

use serde::{Deserialize, Serialize};

use crate::models::Category;

pub const SENTIMENT_BOUND: f64 = 0.2;
pub const NARRATIVE_BOUND: f64 = 0.15;
pub const INFORMATION_BOUND: f64 = 0.1;
pub const NETWORK_BOUND: f64 = 0.1;
pub const EMERGENT_BOUND: f64 = 0.1;
pub const TEMPORAL_FLOOR: f64 = 0.5;

/// Volatility every game carries before any risk factor is counted.
pub const BASE_CHAOS: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Sentiment,
    Narrative,
    InformationAsymmetry,
    Chaos,
    Network,
    Temporal,
    Emergent,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Sentiment,
        Dimension::Narrative,
        Dimension::InformationAsymmetry,
        Dimension::Chaos,
        Dimension::Network,
        Dimension::Temporal,
        Dimension::Emergent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Sentiment => "sentiment",
            Dimension::Narrative => "narrative",
            Dimension::InformationAsymmetry => "information asymmetry",
            Dimension::Chaos => "chaos",
            Dimension::Network => "network",
            Dimension::Temporal => "temporal",
            Dimension::Emergent => "emergent",
        }
    }
}

// ── Context types ────────────────────────────────────────────────────────────

/// Tone readings, each in [-1, 1], positive meaning upbeat for the home side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentData {
    pub player_statements: f64,
    pub social_chatter: f64,
    pub press_conferences: f64,
    pub fan_sentiment: f64,
    pub beat_reporter_tone: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeKind {
    Revenge,
    ProvingDoubters,
    ContractYear,
    ReturnToTeam,
    PlayingThroughTragedy,
    Desperation,
    Underdog,
    Complacency,
    Distraction,
    TitleDefenseLetdown,
    None,
}

impl NarrativeKind {
    /// Impact at full strength for the side the narrative favours.
    pub fn base_impact(&self) -> f64 {
        match self {
            NarrativeKind::Revenge => 0.08,
            NarrativeKind::ProvingDoubters => 0.05,
            NarrativeKind::ContractYear => 0.04,
            NarrativeKind::ReturnToTeam => 0.06,
            NarrativeKind::PlayingThroughTragedy => 0.07,
            NarrativeKind::Desperation => 0.03,
            NarrativeKind::Underdog => 0.05,
            NarrativeKind::Complacency => -0.04,
            NarrativeKind::Distraction => -0.06,
            NarrativeKind::TitleDefenseLetdown => -0.08,
            NarrativeKind::None => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NarrativeKind::Revenge => "Revenge Game",
            NarrativeKind::ProvingDoubters => "Proving Doubters Wrong",
            NarrativeKind::ContractYear => "Contract Year",
            NarrativeKind::ReturnToTeam => "Return to Former Team",
            NarrativeKind::PlayingThroughTragedy => "Playing Through Tragedy",
            NarrativeKind::Desperation => "Losing Streak Desperation",
            NarrativeKind::Underdog => "Nobody Believes in Us",
            NarrativeKind::Complacency => "Complacency (Heavy Favorite)",
            NarrativeKind::Distraction => "Looking Ahead",
            NarrativeKind::TitleDefenseLetdown => "Post-Championship Hangover",
            NarrativeKind::None => "No Narrative",
        }
    }
}

/// Which side a narrative applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSide {
    Home,
    Away,
    Both,
}

impl NarrativeSide {
    fn label(&self) -> &'static str {
        match self {
            NarrativeSide::Home => "home",
            NarrativeSide::Away => "away",
            NarrativeSide::Both => "both sides",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub kind: NarrativeKind,
    /// Detected strength in [0, 1]
    pub strength: f64,
    pub side: NarrativeSide,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMovementDirection {
    WithPublic,
    AgainstPublic,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharpMoney {
    Home,
    Away,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InformationAsymmetryData {
    /// Share of public bets on the home side, in [0, 1]
    pub public_bet_percentage: f64,
    /// Line movement in points
    pub line_movement: f64,
    pub line_movement_direction: LineMovementDirection,
    pub sharp_money: SharpMoney,
    pub reverse_line_movement: bool,
    pub volume: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosFactors {
    pub division_rivalry: bool,
    /// Weather severity in [0, 1]
    pub weather_severity: f64,
    pub short_rest: bool,
    /// Backup quarterback, new coach, debut starter
    pub unfamiliar_starter: bool,
    pub elimination_stakes: bool,
    pub trap_game: bool,
    /// e.g. a dome team playing outdoors in the cold
    pub climate_mismatch: bool,
}

/// Reading from an external volatility service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosReading {
    pub csi_score: f64,
    /// Preferred over the chaos index as the confidence penalty
    pub confidence_penalty: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkData {
    pub cohesion: f64,
    pub leadership: f64,
    pub integration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEvent {
    pub days_ago: f64,
    pub impact: f64,
    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergentSignal {
    pub score: f64,
    #[serde(default)]
    pub description: String,
}

/// Raw context for exactly one dimension, as produced by a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dimension", content = "data", rename_all = "snake_case")]
pub enum DimensionContext {
    Sentiment(SentimentData),
    Narrative(Vec<Narrative>),
    InformationAsymmetry(InformationAsymmetryData),
    Chaos(ChaosFactors),
    ChaosReading(ChaosReading),
    Network(NetworkData),
    Temporal(Vec<RecentEvent>),
    Emergent(Vec<EmergentSignal>),
}

impl DimensionContext {
    pub fn dimension(&self) -> Dimension {
        match self {
            DimensionContext::Sentiment(_) => Dimension::Sentiment,
            DimensionContext::Narrative(_) => Dimension::Narrative,
            DimensionContext::InformationAsymmetry(_) => Dimension::InformationAsymmetry,
            DimensionContext::Chaos(_) | DimensionContext::ChaosReading(_) => Dimension::Chaos,
            DimensionContext::Network(_) => Dimension::Network,
            DimensionContext::Temporal(_) => Dimension::Temporal,
            DimensionContext::Emergent(_) => Dimension::Emergent,
        }
    }
}

/// Optional context per dimension; `None` means the dimension is neutral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionInputs {
    pub sentiment: Option<SentimentData>,
    pub narratives: Option<Vec<Narrative>>,
    pub information_asymmetry: Option<InformationAsymmetryData>,
    pub chaos: Option<ChaosFactors>,
    pub chaos_reading: Option<ChaosReading>,
    pub network: Option<NetworkData>,
    pub recent_events: Option<Vec<RecentEvent>>,
    pub emergent_patterns: Option<Vec<EmergentSignal>>,
}

impl DimensionInputs {
    /// Store `ctx` in its slot unless the slot is already filled.
    /// Returns whether it was stored.
    pub fn fill(&mut self, ctx: DimensionContext) -> bool {
        fn put<T>(slot: &mut Option<T>, value: T) -> bool {
            if slot.is_some() {
                return false;
            }
            *slot = Some(value);
            true
        }
        match ctx {
            DimensionContext::Sentiment(v) => put(&mut self.sentiment, v),
            DimensionContext::Narrative(v) => put(&mut self.narratives, v),
            DimensionContext::InformationAsymmetry(v) => put(&mut self.information_asymmetry, v),
            DimensionContext::Chaos(v) => put(&mut self.chaos, v),
            DimensionContext::ChaosReading(v) => put(&mut self.chaos_reading, v),
            DimensionContext::Network(v) => put(&mut self.network, v),
            DimensionContext::Temporal(v) => put(&mut self.recent_events, v),
            DimensionContext::Emergent(v) => put(&mut self.emergent_patterns, v),
        }
    }

    pub fn has(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Sentiment => self.sentiment.is_some(),
            Dimension::Narrative => self.narratives.is_some(),
            Dimension::InformationAsymmetry => self.information_asymmetry.is_some(),
            Dimension::Chaos => self.chaos.is_some() || self.chaos_reading.is_some(),
            Dimension::Network => self.network.is_some(),
            Dimension::Temporal => self.recent_events.is_some(),
            Dimension::Emergent => self.emergent_patterns.is_some(),
        }
    }
}

/// The seven dimension scores. `Default` is the all-neutral point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionScores {
    pub sentiment_field: f64,
    pub narrative_momentum: f64,
    pub information_asymmetry: f64,
    pub chaos_sensitivity: f64,
    pub network_influence: f64,
    pub temporal_decay: f64,
    pub emergent_pattern: f64,
}

impl Default for DimensionScores {
    fn default() -> Self {
        DimensionScores {
            sentiment_field: 0.0,
            narrative_momentum: 0.0,
            information_asymmetry: 0.0,
            chaos_sensitivity: 0.0,
            network_influence: 0.0,
            temporal_decay: 1.0,
            emergent_pattern: 0.0,
        }
    }
}

impl DimensionScores {
    /// Force every score into its range; non-finite values become neutral.
    pub fn bounded(self) -> Self {
        DimensionScores {
            sentiment_field: bound(self.sentiment_field, -SENTIMENT_BOUND, SENTIMENT_BOUND, 0.0),
            narrative_momentum: bound(self.narrative_momentum, -NARRATIVE_BOUND, NARRATIVE_BOUND, 0.0),
            information_asymmetry: bound(
                self.information_asymmetry,
                -INFORMATION_BOUND,
                INFORMATION_BOUND,
                0.0,
            ),
            chaos_sensitivity: bound(self.chaos_sensitivity, 0.0, 1.0, 0.0),
            network_influence: bound(self.network_influence, -NETWORK_BOUND, NETWORK_BOUND, 0.0),
            temporal_decay: bound(self.temporal_decay, TEMPORAL_FLOOR, 1.0, 1.0),
            emergent_pattern: bound(self.emergent_pattern, -EMERGENT_BOUND, EMERGENT_BOUND, 0.0),
        }
    }
}

// ── Scorers ──────────────────────────────────────────────────────────────────

/// Fixed blend of the five tone readings, rescaled into ±0.2.
pub fn sentiment_field(data: &SentimentData) -> f64 {
    let blended = unit(data.player_statements) * 0.30
        + unit(data.social_chatter) * 0.20
        + unit(data.press_conferences) * 0.25
        + unit(data.fan_sentiment) * 0.15
        + unit(data.beat_reporter_tone) * 0.10;
    (blended * 0.2).clamp(-SENTIMENT_BOUND, SENTIMENT_BOUND)
}

/// Sum of per-narrative impacts signed by the favoured side. Narratives that
/// affect both sides cancel out.
pub fn narrative_momentum(narratives: &[Narrative]) -> f64 {
    let total: f64 = narratives
        .iter()
        .map(|n| {
            let impact = n.kind.base_impact() * bound(n.strength, 0.0, 1.0, 0.0);
            match n.side {
                NarrativeSide::Home => impact,
                NarrativeSide::Away => -impact,
                NarrativeSide::Both => 0.0,
            }
        })
        .sum();
    total.clamp(-NARRATIVE_BOUND, NARRATIVE_BOUND)
}

/// Reverse line movement outranks a plain sharp-money lean; with neither the
/// dimension is 0.
pub fn information_asymmetry(data: &InformationAsymmetryData) -> f64 {
    let movement = if data.line_movement.is_finite() {
        data.line_movement.abs()
    } else {
        0.0
    };

    if data.reverse_line_movement {
        let public = bound(data.public_bet_percentage, 0.0, 1.0, 0.5);
        let direction = match data.line_movement_direction {
            LineMovementDirection::AgainstPublic => 1.0,
            _ => -1.0,
        };
        let rlm = (public - 0.5).abs() * movement;
        return (rlm * direction * 0.1).clamp(-INFORMATION_BOUND, INFORMATION_BOUND);
    }

    let direction = match data.sharp_money {
        SharpMoney::Home => 1.0,
        SharpMoney::Away => -1.0,
        SharpMoney::Neutral => return 0.0,
    };
    if movement > 0.5 {
        (movement * direction * 0.05).clamp(-INFORMATION_BOUND, INFORMATION_BOUND)
    } else {
        0.0
    }
}

/// Base volatility plus a fixed increment per risk factor, capped at 1.
pub fn chaos_sensitivity(factors: &ChaosFactors) -> f64 {
    let mut chaos = BASE_CHAOS;
    if factors.division_rivalry {
        chaos += 0.15;
    }
    chaos += bound(factors.weather_severity, 0.0, 1.0, 0.0) * 0.20;
    if factors.short_rest {
        chaos += 0.10;
    }
    if factors.unfamiliar_starter {
        chaos += 0.25;
    }
    if factors.elimination_stakes {
        chaos += 0.12;
    }
    if factors.trap_game {
        chaos += 0.18;
    }
    if factors.climate_mismatch {
        chaos += 0.15;
    }
    chaos.min(1.0)
}

/// Chemistry blend centred at 0.5 and mapped onto ±0.1.
pub fn network_influence(data: &NetworkData) -> f64 {
    let nig = bound(data.cohesion, 0.0, 1.0, 0.5) * 0.4
        + bound(data.leadership, 0.0, 1.0, 0.5) * 0.4
        + bound(data.integration, 0.0, 1.0, 0.5) * 0.2;
    ((nig - 0.5) * 0.2).clamp(-NETWORK_BOUND, NETWORK_BOUND)
}

/// Decay constant per day. Weekly schedules decay slower than daily ones.
pub fn decay_constant(category: Category) -> f64 {
    match category {
        Category::Nfl => 0.15,
        Category::Nba | Category::Nhl => 0.25,
        Category::Mlb => 0.30,
        Category::Ncaaf | Category::Ncaab | Category::Other => 0.20,
    }
}

/// Ratio of decayed to nominal impact magnitude over recent events, floored
/// at 0.5. No measurable impact leaves the estimate untouched (1.0).
pub fn temporal_decay(events: &[RecentEvent], category: Category) -> f64 {
    let lambda = decay_constant(category);
    let mut decayed = 0.0;
    let mut nominal = 0.0;
    for event in events {
        if !event.impact.is_finite() || !event.days_ago.is_finite() {
            continue;
        }
        let magnitude = event.impact.abs();
        decayed += magnitude * (-lambda * event.days_ago.max(0.0)).exp();
        nominal += magnitude;
    }
    if nominal <= 0.0 {
        return 1.0;
    }
    (decayed / nominal).clamp(TEMPORAL_FLOOR, 1.0)
}

/// Mean of the supplied pattern scores, clamped to ±0.1.
pub fn emergent_pattern(signals: &[EmergentSignal]) -> f64 {
    let scores: Vec<f64> = signals
        .iter()
        .map(|s| s.score)
        .filter(|s| s.is_finite())
        .collect();
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    mean.clamp(-EMERGENT_BOUND, EMERGENT_BOUND)
}

/// Strongest narrative and the side it applies to, for reasoning text.
pub(crate) fn strongest_narrative(narratives: &[Narrative]) -> Option<(&'static str, &'static str)> {
    narratives
        .iter()
        .filter(|n| n.strength.is_finite())
        .max_by(|a, b| {
            a.strength
                .abs()
                .partial_cmp(&b.strength.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|n| (n.kind.label(), n.side.label()))
}

fn unit(v: f64) -> f64 {
    bound(v, -1.0, 1.0, 0.0)
}

fn bound(v: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v.clamp(lo, hi)
    } else {
        fallback
    }
}
