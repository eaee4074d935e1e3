//! In-memory [`Session`] built from fixture tables.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{
    DecodeError, EventTable, FieldValue, Header, PlayerRecord, Session, SessionError,
    SessionSource, TickFieldRow, TickFieldTable, VoiceBuffers,
};

#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    header: Header,
    roster: Vec<PlayerRecord>,
    events: HashMap<String, EventTable>,
    fields: Vec<TickFieldRow>,
    voices: VoiceBuffers,
    failing: HashSet<&'static str>,
    reads: Arc<Mutex<HashMap<&'static str, usize>>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_map(mut self, map_name: &str) -> Self {
        self.header.map_name = map_name.to_owned();
        self
    }

    pub fn with_player(mut self, steamid: u64, name: &str, team_code: i32) -> Self {
        self.roster.push(PlayerRecord {
            steamid,
            name: name.to_owned(),
            team_code,
        });
        self
    }

    pub fn with_event<I>(mut self, name: &str, ticks: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        self.events.insert(name.to_owned(), ticks.into_iter().collect());
        self
    }

    pub fn with_event_table(mut self, name: &str, table: EventTable) -> Self {
        self.events.insert(name.to_owned(), table);
        self
    }

    pub fn with_field(mut self, tick: u32, steamid: u64, field: &str, value: FieldValue) -> Self {
        match self
            .fields
            .iter_mut()
            .find(|r| r.tick == tick && r.steamid == Some(steamid))
        {
            Some(row) => {
                row.values.insert(field.to_owned(), value);
            }
            None => self.fields.push(TickFieldRow {
                tick,
                steamid: Some(steamid),
                values: BTreeMap::from([(field.to_owned(), value)]),
            }),
        };
        self
    }

    pub fn with_voice(mut self, steamid: u64, data: &[u8]) -> Self {
        self.voices.insert(steamid, data.to_vec());
        self
    }

    /// Makes the named query (`header`, `roster`, `events`, `tick_fields` or
    /// `voice_buffers`) fail with a [`DecodeError`].
    pub fn failing(mut self, query: &'static str) -> Self {
        self.failing.insert(query);
        self
    }

    /// How often `query` ran, summed over every clone of this session.
    pub fn reads(&self, query: &str) -> usize {
        self.reads
            .lock()
            .map(|reads| reads.get(query).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    fn check(&self, query: &'static str) -> Result<(), DecodeError> {
        if let Ok(mut reads) = self.reads.lock() {
            *reads.entry(query).or_default() += 1;
        }
        if self.failing.contains(query) {
            return Err(DecodeError::Parse(format!("{} rejected by fixture", query)));
        }
        Ok(())
    }
}

impl Session for MemorySession {
    fn header(&self) -> Result<Header, DecodeError> {
        self.check("header")?;
        Ok(self.header.clone())
    }

    fn roster(&self) -> Result<Vec<PlayerRecord>, DecodeError> {
        self.check("roster")?;
        Ok(self.roster.clone())
    }

    fn events(&self, name: &str) -> Result<EventTable, DecodeError> {
        self.check("events")?;
        self.events
            .get(name)
            .cloned()
            .ok_or_else(|| DecodeError::UnknownEvent(name.to_owned()))
    }

    fn event_names(&self) -> Result<Vec<String>, DecodeError> {
        self.check("events")?;
        let mut names: Vec<String> = self.events.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn tick_fields(&self, fields: &[&str], ticks: &[u32]) -> Result<TickFieldTable, DecodeError> {
        self.check("tick_fields")?;

        let rows = self
            .fields
            .iter()
            .filter(|r| ticks.contains(&r.tick))
            .map(|r| TickFieldRow {
                values: r
                    .values
                    .iter()
                    .filter(|(k, _)| fields.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), *v))
                    .collect(),
                ..r.clone()
            })
            .collect();

        Ok(TickFieldTable { rows })
    }

    fn voice_buffers(&self) -> Result<VoiceBuffers, DecodeError> {
        self.check("voice_buffers")?;
        Ok(self.voices.clone())
    }
}

/// Hands out clones of one [`MemorySession`] and counts how often it was opened.
#[derive(Debug, Default)]
pub struct MemorySource {
    session: MemorySession,
    opened: std::sync::atomic::AtomicUsize,
}

impl MemorySource {
    pub fn new(session: MemorySession) -> Self {
        Self {
            session,
            opened: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl SessionSource for MemorySource {
    type Session = MemorySession;

    fn open(&self) -> Result<Self::Session, SessionError> {
        self.opened.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.session.clone())
    }
}
