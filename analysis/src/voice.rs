//! Export of per-player voice clips, partitioned by team.

use std::collections::HashSet;

use crate::session::{best_effort, Session};
use crate::teams::{self, Team, TeamPolicy};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Writing {key:?}: {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },
    #[error("Uploading {key:?}: {reason}")]
    Remote { key: String, reason: String },
}

/// Destination for exported clips.
///
/// Every write carries the whole clip. Clips of one session end up in one container
/// named after the session id, and a key that is written twice is overwritten.
pub trait VoiceSink {
    fn write(&self, session_id: &str, key: &str, data: &[u8]) -> Result<(), SinkError>;
}

/// What happens when two players of the same team share a display name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The later clip replaces the earlier one.
    #[default]
    Overwrite,
    /// The later clip gets the steamid appended to its name, plus a counter if
    /// that name is taken too.
    SuffixSteamId,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VoiceExportConfig {
    pub extension: String,
    pub collision: CollisionPolicy,
}

impl Default for VoiceExportConfig {
    fn default() -> Self {
        Self {
            extension: "wav".to_owned(),
            collision: CollisionPolicy::Overwrite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenClip {
    pub steamid: u64,
    pub team: Team,
    pub key: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<WrittenClip>,
    /// Clips without a team, which are not exported.
    pub skipped: Vec<u64>,
    pub failed: Vec<(u64, SinkError)>,
}

impl ExportReport {
    pub fn keys(&self) -> Vec<&str> {
        self.written.iter().map(|c| c.key.as_str()).collect()
    }
}

#[tracing::instrument(skip(session, sink, teams_policy, config))]
pub fn export<S, K>(
    session: &S,
    session_id: &str,
    sink: &K,
    teams_policy: &TeamPolicy,
    config: &VoiceExportConfig,
) -> ExportReport
where
    S: Session + ?Sized,
    K: VoiceSink + ?Sized,
{
    let roster = best_effort("roster", session.roster());
    let assignment = teams::resolve(&roster, teams_policy);
    let buffers = best_effort("voice_buffers", session.voice_buffers());

    tracing::info!("Exporting {} voice clips", buffers.len());

    let mut report = ExportReport::default();
    let mut used_keys = HashSet::new();
    for (steamid, data) in buffers {
        let team = assignment.team_of(steamid);
        let prefix = match team.prefix() {
            Some(p) => p,
            None => {
                tracing::info!(steamid, "Skipping voice clip without a team");
                report.skipped.push(steamid);
                continue;
            }
        };

        let name = teams::name_for(&roster, steamid);
        let mut stem = format!("{}-{}", prefix, name);
        if used_keys.contains(&stem) {
            match config.collision {
                CollisionPolicy::Overwrite => {
                    tracing::warn!(steamid, key = %stem, "Overwriting clip with the same name");
                }
                CollisionPolicy::SuffixSteamId => {
                    stem = format!("{}-{}", stem, steamid);
                    let base = stem.clone();
                    let mut n = 2;
                    while used_keys.contains(&stem) {
                        stem = format!("{}-{}", base, n);
                        n += 1;
                    }
                }
            };
        }
        let key = format!("{}.{}", stem, config.extension);

        match sink.write(session_id, &key, &data) {
            Ok(()) => {
                tracing::debug!(steamid, %key, "Wrote voice clip");
                used_keys.insert(stem);
                report.written.push(WrittenClip {
                    steamid,
                    team,
                    key,
                    size: data.len(),
                });
            }
            Err(e) => {
                tracing::error!(steamid, "Writing voice clip: {}", e);
                report.failed.push((steamid, e));
            }
        };
    }

    report
}
