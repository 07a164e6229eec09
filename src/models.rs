use serde::{Deserialize, Serialize};

/// A scheduled or finished head-to-head game, as handed over by the odds /
/// schedule collaborators. Only the fields the engine reads are modelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// External game ID
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    /// e.g. "nfl", "basketball", "icehockey_nhl"
    #[serde(default)]
    pub sport: String,
    /// e.g. "NFL", "NHL Atlantic Division"
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub odds: Option<Odds>,
    #[serde(default)]
    pub weather: Option<Weather>,
    #[serde(default)]
    pub injuries: Option<Injuries>,
    /// Turnovers per game for each side
    #[serde(default)]
    pub turnovers: Option<SideValues>,
    /// Plays / possessions per game for each side
    #[serde(default)]
    pub pace: Option<SideValues>,
    /// Overrides the default home-field bump
    #[serde(default)]
    pub home_field_advantage: Option<f64>,
}

/// Two-sided price quote in American odds (e.g. -150 / +130).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    pub home: f64,
    pub away: f64,
    /// Home point spread; negative means the home side is favoured
    #[serde(default)]
    pub spread: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Degrees Fahrenheit
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Miles per hour
    #[serde(default)]
    pub wind_speed: Option<f64>,
    /// Free text, e.g. "Light Rain"
    #[serde(default)]
    pub conditions: Option<String>,
}

/// Aggregate injury impact per side; larger means the side is hurt more.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Injuries {
    #[serde(default)]
    pub home_impact: Option<f64>,
    #[serde(default)]
    pub away_impact: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideValues {
    #[serde(default)]
    pub home: Option<f64>,
    #[serde(default)]
    pub away: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

impl Game {
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// Resolve a winner name reported by a results feed to a side.
    /// Comparison ignores case and surrounding whitespace.
    pub fn side_of(&self, team: &str) -> Option<Side> {
        let team = team.trim();
        if team.eq_ignore_ascii_case(self.home_team.trim()) {
            Some(Side::Home)
        } else if team.eq_ignore_ascii_case(self.away_team.trim()) {
            Some(Side::Away)
        } else {
            None
        }
    }
}

/// Competition category; selects the effect weight table and the temporal
/// decay constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Nfl,
    Nba,
    Mlb,
    Nhl,
    Ncaaf,
    Ncaab,
    Other,
}

impl Category {
    /// Detect the category from a league label, falling back to the sport key.
    pub fn detect(league: &str, sport: &str) -> Self {
        match Self::from_label(league) {
            Category::Other => Self::from_label(sport),
            found => found,
        }
    }

    fn from_label(label: &str) -> Self {
        let l = label.trim().to_lowercase();
        if l.contains("ncaaf") || l.contains("americanfootball_ncaa") || l.contains("college football") {
            Category::Ncaaf
        } else if l.contains("ncaab") || l.contains("basketball_ncaa") || l.contains("college basketball") {
            Category::Ncaab
        } else if l.contains("nfl") || l == "american_football" || l == "americanfootball" {
            Category::Nfl
        } else if l.contains("nba") || l == "basketball" {
            Category::Nba
        } else if l.contains("mlb") || l == "baseball" {
            Category::Mlb
        } else if l.contains("nhl") || l == "ice_hockey" || l == "hockey" {
            Category::Nhl
        } else {
            Category::Other
        }
    }
}
