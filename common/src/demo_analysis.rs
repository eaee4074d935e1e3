#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoundTimeline {
    pub map: String,
    pub starts: Vec<Option<u32>>,
    pub ends: Vec<Option<u32>>,
    pub rounds: Vec<RoundEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundEntry {
    Valid {
        index: usize,
        start_tick: u32,
        end_tick: u32,
    },
    Invalid {
        index: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreBoard {
    pub tick: u32,
    pub players: Vec<ScoreBoardPlayer>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreBoardPlayer {
    pub name: String,
    pub steamid: Option<String>,
    pub fields: std::collections::BTreeMap<String, f64>,
}
