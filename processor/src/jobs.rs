use std::path::{Path, PathBuf};

use analysis::session::demofile::DemoFileSource;
use analysis::session::FieldValue;
use analysis::{Batch, Demo, QueryError, RoundError, Session, SessionError};

use crate::config::{Command, ScoreboardAt};
use crate::storage::ClipStorage;

#[derive(Debug, Clone)]
pub struct Job {
    pub command: Command,
    pub config: analysis::Config,
    pub session_id: Option<String>,
    pub generate_id: bool,
    pub voice_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Report {
    Rounds(common::demo_analysis::RoundTimeline),
    RoundTicks {
        index: usize,
        start_tick: u32,
        end_tick: u32,
        ticks: Vec<u32>,
    },
    PlayerName {
        steamid: String,
        name: String,
    },
    Teams(common::TeamRosters),
    Export(common::ExportSummary),
    Scoreboard(common::demo_analysis::ScoreBoard),
    Events {
        events: Vec<String>,
    },
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub demo: PathBuf,
    pub result: Result<Report, QueryError>,
}

pub fn open(path: &Path, job: &Job) -> Result<Demo<DemoFileSource>, SessionError> {
    let mut demo = Demo::open(path, job.config.clone())?;
    if let Some(dir) = job.voice_dir.as_ref() {
        demo = demo.with_voice_dir(dir.clone());
    }

    if let Some(session_id) = job.session_id.as_ref() {
        demo.set_session_id(session_id.clone());
    } else if job.generate_id {
        demo.set_session_id(uuid::Uuid::now_v7().to_string());
    }

    Ok(demo)
}

#[tracing::instrument(skip(job, storage))]
pub fn run_session(path: &Path, job: &Job, storage: &dyn ClipStorage) -> Result<Report, QueryError> {
    let demo = open(path, job)?;
    tracing::info!(session_id = demo.session_id(), "Processing session");

    let mut batch = demo.batch()?;
    let report = match &job.command {
        Command::Rounds => {
            let boundaries = batch.boundaries();
            let rounds = (0..boundaries.len()?)
                .map(|index| match boundaries.pair(index) {
                    Ok(round) => common::demo_analysis::RoundEntry::Valid {
                        index,
                        start_tick: round.start_tick,
                        end_tick: round.end_tick,
                    },
                    Err(e) => {
                        tracing::warn!(index, "Invalid round: {}", e);
                        common::demo_analysis::RoundEntry::Invalid {
                            index,
                            reason: e.to_string(),
                        }
                    }
                })
                .collect();

            Report::Rounds(common::demo_analysis::RoundTimeline {
                map: batch.map_name(),
                starts: boundaries.starts().to_vec(),
                ends: boundaries.ends().to_vec(),
                rounds,
            })
        }
        Command::RoundTicks { round } => {
            let round = batch.round(*round)?;
            Report::RoundTicks {
                index: round.index,
                start_tick: round.start_tick,
                end_tick: round.end_tick,
                ticks: round.ticks().collect(),
            }
        }
        Command::PlayerName { steamid } => Report::PlayerName {
            steamid: steamid.to_string(),
            name: batch.player_name(*steamid),
        },
        Command::Teams => {
            let rosters = batch.team_rosters();
            let convert = |players: Vec<analysis::PlayerRecord>| {
                players
                    .into_iter()
                    .map(|p| common::RosterPlayer {
                        name: p.name,
                        steamid: p.steamid.to_string(),
                    })
                    .collect()
            };

            Report::Teams(common::TeamRosters {
                team1: convert(rosters.team1),
                team2: convert(rosters.team2),
            })
        }
        Command::Events => Report::Events {
            events: batch.event_names(),
        },
        Command::ExportVoices => {
            let report = batch.export_voices(storage);
            tracing::info!(
                written = report.written.len(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                "Exported voices"
            );

            Report::Export(export_summary(demo.session_id(), report))
        }
        Command::Scoreboard { at, fields } => {
            Report::Scoreboard(scoreboard(&mut batch, at, fields)?)
        }
    };

    Ok(report)
}

/// Player fields at the requested position, named from a single roster read.
pub fn scoreboard<T>(
    batch: &mut Batch<'_, T>,
    at: &ScoreboardAt,
    fields: &[String],
) -> Result<common::demo_analysis::ScoreBoard, RoundError>
where
    T: Session,
{
    let tick = match at.round {
        Some(round) => batch.round(round)?.end_tick,
        None => at.tick.unwrap_or_default(),
    };
    let fields: Vec<&str> = if fields.is_empty() {
        analysis::fields::SCOREBOARD_FIELDS.to_vec()
    } else {
        fields.iter().map(|f| f.as_str()).collect()
    };

    let table = batch.fields_at(&fields, tick);
    let roster = batch.roster();
    let players = table
        .rows
        .into_iter()
        .map(|row| common::demo_analysis::ScoreBoardPlayer {
            name: row
                .steamid
                .map(|id| analysis::teams::name_for(&roster, id))
                .unwrap_or(analysis::teams::UNKNOWN_PLAYER)
                .to_owned(),
            steamid: row.steamid.map(|id| id.to_string()),
            fields: row
                .values
                .into_iter()
                .map(|(name, value)| (name, field_number(value)))
                .collect(),
        })
        .collect();

    Ok(common::demo_analysis::ScoreBoard { tick, players })
}

fn field_number(value: FieldValue) -> f64 {
    match value {
        FieldValue::Int(v) => v as f64,
        FieldValue::UInt(v) => v as f64,
        FieldValue::Float(v) => v as f64,
    }
}

pub fn export_summary(session_id: &str, report: analysis::ExportReport) -> common::ExportSummary {
    common::ExportSummary {
        session_id: session_id.to_owned(),
        exported_at: chrono::Utc::now(),
        written: report
            .written
            .into_iter()
            .map(|clip| common::ExportedClip {
                steamid: clip.steamid.to_string(),
                team: format!("{:?}", clip.team),
                key: clip.key,
                size: clip.size,
            })
            .collect(),
        skipped: report.skipped.iter().map(|id| id.to_string()).collect(),
        failed: report
            .failed
            .iter()
            .map(|(id, e)| format!("{}: {}", id, e))
            .collect(),
    }
}

/// Runs `job` against every demo, one blocking worker per demo.
pub async fn run_all(
    demos: Vec<PathBuf>,
    job: Job,
    storage: Box<dyn ClipStorage>,
) -> Vec<SessionOutcome> {
    let job = std::sync::Arc::new(job);

    let handles = demos.into_iter().map(|demo| {
        let job = job.clone();
        let storage = storage.duplicate();

        tokio::task::spawn_blocking(move || {
            let result = run_session(&demo, &job, storage.as_ref());
            SessionOutcome { demo, result }
        })
    });

    futures::future::join_all(handles)
        .await
        .into_iter()
        .filter_map(|joined| match joined {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!("Session worker failed: {:?}", e);
                None
            }
        })
        .collect()
}
