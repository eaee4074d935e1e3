//! Queries against one demo.
//!
//! [`Demo`] opens a fresh session for every query, so nothing decoded for one query
//! can leak into the next. [`Batch`] holds a single session for a run of queries
//! and is the faster choice when many queries hit the same demo.

use std::path::PathBuf;

use crate::config::Config;
use crate::rounds::{self, Round, RoundBoundaries, RoundError};
use crate::session::demofile::DemoFileSource;
use crate::session::{
    best_effort, PlayerRecord, Session, SessionError, SessionSource, TickFieldTable,
};
use crate::teams::{self, TeamRosters};
use crate::voice::{self, ExportReport, VoiceSink};

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Round(#[from] RoundError),
}

pub struct Demo<S> {
    source: S,
    session_id: String,
    config: Config,
}

impl Demo<DemoFileSource> {
    /// The session id defaults to the file name without its extension.
    pub fn open<P>(path: P, config: Config) -> Result<Self, SessionError>
    where
        P: Into<PathBuf>,
    {
        let source = DemoFileSource::new(path)?;
        let session_id = source
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(source, session_id, config))
    }

    pub fn with_voice_dir<P>(mut self, dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.source = self.source.with_voice_dir(dir);
        self
    }
}

impl<S> Demo<S>
where
    S: SessionSource,
{
    pub fn new(source: S, session_id: impl Into<String>, config: Config) -> Self {
        Self {
            source,
            session_id: session_id.into(),
            config,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = session_id.into();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Opens one session to be shared by all queries of the returned [`Batch`].
    pub fn batch(&self) -> Result<Batch<'_, S::Session>, SessionError> {
        Ok(Batch {
            session: self.source.open()?,
            session_id: &self.session_id,
            config: &self.config,
        })
    }

    pub fn map_name(&self) -> Result<String, SessionError> {
        Ok(self.batch()?.map_name())
    }

    pub fn event_names(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.batch()?.event_names())
    }

    pub fn round_start_ticks(&self) -> Result<Vec<Option<u32>>, SessionError> {
        Ok(self.batch()?.round_start_ticks())
    }

    pub fn round_end_ticks(&self) -> Result<Vec<Option<u32>>, SessionError> {
        Ok(self.batch()?.round_end_ticks())
    }

    pub fn round(&self, index: usize) -> Result<Round, QueryError> {
        Ok(self.batch()?.round(index)?)
    }

    pub fn round_ticks(
        &self,
        index: usize,
    ) -> Result<core::ops::RangeInclusive<u32>, QueryError> {
        self.round(index).map(|r| r.ticks())
    }

    pub fn player_name(&self, steamid: u64) -> Result<String, SessionError> {
        Ok(self.batch()?.player_name(steamid))
    }

    pub fn team_rosters(&self) -> Result<TeamRosters, SessionError> {
        Ok(self.batch()?.team_rosters())
    }

    pub fn export_voices<K>(&self, sink: &K) -> Result<ExportReport, SessionError>
    where
        K: VoiceSink + ?Sized,
    {
        Ok(self.batch()?.export_voices(sink))
    }

    pub fn fields_at(&self, fields: &[&str], tick: u32) -> Result<TickFieldTable, SessionError> {
        Ok(self.batch()?.fields_at(fields, tick))
    }

    pub fn round_scoreboard(&self, index: usize) -> Result<TickFieldTable, QueryError> {
        Ok(self.batch()?.round_scoreboard(index)?)
    }
}

/// A single open session. Queries take `&mut self`, so they never overlap.
pub struct Batch<'d, T> {
    session: T,
    session_id: &'d str,
    config: &'d Config,
}

impl<'d, T> Batch<'d, T>
where
    T: Session,
{
    pub fn session_id(&self) -> &str {
        self.session_id
    }

    pub fn map_name(&mut self) -> String {
        best_effort("header", self.session.header()).map_name
    }

    pub fn event_names(&mut self) -> Vec<String> {
        best_effort("event_names", self.session.event_names())
    }

    pub fn round_start_ticks(&mut self) -> Vec<Option<u32>> {
        rounds::round_start_ticks(&self.session, self.config.round_start_min_gap)
    }

    pub fn round_end_ticks(&mut self) -> Vec<Option<u32>> {
        let ticks = rounds::round_end_ticks(&self.session);
        tracing::debug!(?ticks, "Round end ticks");
        ticks
    }

    pub fn boundaries(&mut self) -> RoundBoundaries {
        RoundBoundaries::from_session(&self.session, self.config.round_start_min_gap)
    }

    pub fn round(&mut self, index: usize) -> Result<Round, RoundError> {
        self.boundaries().pair(index)
    }

    pub fn roster(&mut self) -> Vec<PlayerRecord> {
        best_effort("roster", self.session.roster())
    }

    pub fn player_name(&mut self, steamid: u64) -> String {
        let roster = self.roster();
        teams::name_for(&roster, steamid).to_owned()
    }

    pub fn team_rosters(&mut self) -> TeamRosters {
        let roster = best_effort("roster", self.session.roster());
        let assignment = teams::resolve(&roster, &self.config.teams);
        teams::split(&roster, &assignment)
    }

    pub fn export_voices<K>(&mut self, sink: &K) -> ExportReport
    where
        K: VoiceSink + ?Sized,
    {
        voice::export(
            &self.session,
            self.session_id,
            sink,
            &self.config.teams,
            &self.config.voice,
        )
    }

    pub fn fields_at(&mut self, fields: &[&str], tick: u32) -> TickFieldTable {
        crate::fields::snapshot(&self.session, fields, tick)
    }

    /// Scoreboard fields at the last tick of round `index`.
    pub fn round_scoreboard(&mut self, index: usize) -> Result<TickFieldTable, RoundError> {
        let round = self.round(index)?;
        Ok(crate::fields::snapshot(
            &self.session,
            &crate::fields::SCOREBOARD_FIELDS,
            round.end_tick,
        ))
    }
}
