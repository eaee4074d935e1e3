//! Access to a single recorded demo.
//!
//! The decoding itself is done by an engine we treat as opaque. [`Session`] is the
//! only surface the rest of the crate talks to, which keeps the round, team and
//! voice logic independent of any particular backend.

use std::collections::BTreeMap;

pub mod demofile;
pub mod memory;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found: {0:?}")]
    NotFound(std::path::PathBuf),
    #[error("Mapping session {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Parsing demo container: {0}")]
    Container(String),
    #[error("Parsing demo frames: {0}")]
    Parse(String),
    #[error("Unknown event {0:?}")]
    UnknownEvent(String),
    #[error("{0} is not provided by this session")]
    Unsupported(&'static str),
    #[error("Reading {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlayerRecord {
    pub steamid: u64,
    pub name: String,
    pub team_code: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Header {
    pub map_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    UInt(u64),
    Float(f32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRow {
    pub tick: Option<u32>,
    pub values: BTreeMap<String, FieldValue>,
}

impl EventRow {
    pub fn at(tick: u32) -> Self {
        Self {
            tick: Some(tick),
            values: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    pub rows: Vec<EventRow>,
}

impl EventTable {
    /// The `tick` column, in event order.
    pub fn ticks(&self) -> Vec<Option<u32>> {
        self.rows.iter().map(|r| r.tick).collect()
    }
}

impl FromIterator<u32> for EventTable {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().map(EventRow::at).collect(),
        }
    }
}

/// Field values of one player at one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickFieldRow {
    pub tick: u32,
    pub steamid: Option<u64>,
    pub values: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickFieldTable {
    pub rows: Vec<TickFieldRow>,
}

impl TickFieldTable {
    pub fn at(&self, tick: u32) -> impl Iterator<Item = &TickFieldRow> + '_ {
        self.rows.iter().filter(move |r| r.tick == tick)
    }
}

/// Raw per-player audio, keyed by steamid.
pub type VoiceBuffers = BTreeMap<u64, Vec<u8>>;

/// Read access to a decoded demo.
///
/// Implementations are not expected to be shareable between callers. Whoever opened
/// the session owns it until the queries against it are done.
pub trait Session {
    fn header(&self) -> Result<Header, DecodeError>;

    fn roster(&self) -> Result<Vec<PlayerRecord>, DecodeError>;

    /// Every occurrence of the named event. Unknown names are a [`DecodeError`].
    fn events(&self, name: &str) -> Result<EventTable, DecodeError>;

    /// Names accepted by [`Session::events`], sorted.
    fn event_names(&self) -> Result<Vec<String>, DecodeError>;

    /// Values of `fields` for every player at each of `ticks`.
    fn tick_fields(&self, fields: &[&str], ticks: &[u32]) -> Result<TickFieldTable, DecodeError>;

    fn voice_buffers(&self) -> Result<VoiceBuffers, DecodeError>;
}

/// Opens a fresh [`Session`] for every call.
pub trait SessionSource {
    type Session: Session;

    fn open(&self) -> Result<Self::Session, SessionError>;
}

/// Collapses a decode failure into the neutral value for the query.
pub(crate) fn best_effort<T>(query: &str, result: Result<T, DecodeError>) -> T
where
    T: Default,
{
    match result {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(query, "Decoding failed, using empty result: {}", e);
            T::default()
        }
    }
}
