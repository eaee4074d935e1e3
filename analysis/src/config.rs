use crate::teams::TeamPolicy;
use crate::voice::VoiceExportConfig;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub round_start_min_gap: u32,
    pub teams: TeamPolicy,
    pub voice: VoiceExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            round_start_min_gap: crate::rounds::ROUND_START_MIN_GAP,
            teams: TeamPolicy::default(),
            voice: VoiceExportConfig::default(),
        }
    }
}
