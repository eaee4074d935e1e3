pub mod demo_analysis;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RosterPlayer {
    pub name: String,
    pub steamid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TeamRosters {
    pub team1: Vec<RosterPlayer>,
    pub team2: Vec<RosterPlayer>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExportedClip {
    pub steamid: String,
    pub team: String,
    pub key: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExportSummary {
    pub session_id: String,
    pub exported_at: chrono::DateTime<chrono::Utc>,
    pub written: Vec<ExportedClip>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}
