//! [`Session`] backed by a `.dem` file decoded with `csdemo`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::{
    DecodeError, EventRow, EventTable, FieldValue, Header, PlayerRecord, Session, SessionError,
    SessionSource, TickFieldRow, TickFieldTable, VoiceBuffers,
};

const ROUND_START_COUNT: &str = "CCSGameRulesProxy.CCSGameRules.m_nRoundStartCount";
const ROUND_END_COUNT: &str = "CCSGameRulesProxy.CCSGameRules.m_nRoundEndCount";

/// Events the csdemo adapter can report.
pub const EVENT_NAMES: [&str; 8] = [
    "bomb_defused",
    "bomb_planted",
    "player_death",
    "round_announce_match_start",
    "round_end",
    "round_officially_ended",
    "round_prestart",
    "round_start",
];

macro_rules! parse_demo {
    ($buf:expr) => {{
        let tmp = csdemo::Container::parse(&$buf[..])
            .map_err(|e| DecodeError::Container(format!("{:?}", e)))?;
        csdemo::parser::parse(
            csdemo::FrameIterator::parse(tmp.inner),
            csdemo::parser::EntityFilter::all(),
        )
        .map_err(|e| DecodeError::Parse(format!("{:?}", e)))?
    }};
}

pub struct DemoFile {
    path: PathBuf,
    data: memmap2::Mmap,
    voice_dir: Option<PathBuf>,
}

impl DemoFile {
    pub fn open<P>(path: P) -> Result<Self, SessionError>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();

        let file = match std::fs::File::open(&path) {
            Ok(f) if f.metadata().map(|m| m.is_file()).unwrap_or(false) => f,
            _ => return Err(SessionError::NotFound(path)),
        };
        // The mapping is read-only and the demo is not modified while we hold it.
        let data = unsafe { memmap2::MmapOptions::new().map(&file) }.map_err(|source| {
            SessionError::Io {
                path: path.clone(),
                source,
            }
        })?;

        let voice_dir = Some(path.with_extension("voice")).filter(|p| p.is_dir());

        Ok(Self {
            path,
            data,
            voice_dir,
        })
    }

    /// Reads voice clips from `dir`, one `<steamid>.<ext>` file per player.
    pub fn with_voice_dir<P>(mut self, dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.voice_dir = Some(dir.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn round_counter_ticks(&self, prop: &str) -> Result<EventTable, DecodeError> {
        let output = parse_demo!(self.data);

        let mut last_count: Option<u32> = None;
        let mut table = EventTable::default();
        for tick in output.entity_states.ticks.iter() {
            for state in tick.states.iter() {
                let count = match state.get_prop(prop).and_then(|v| v.value.as_u32()) {
                    Some(c) => c,
                    None => continue,
                };

                if last_count.is_some_and(|last| last != count) {
                    table.rows.push(EventRow::at(tick.tick));
                }
                last_count = Some(count);
            }
        }

        Ok(table)
    }

    fn game_events(&self, name: &str) -> Result<EventTable, DecodeError> {
        use csdemo::game_event::GameEvent;

        let output = parse_demo!(self.data);
        let steamid_of = |user: Option<csdemo::UserId>| {
            user.and_then(|u| output.player_info.get(&u))
                .map(|p| FieldValue::UInt(p.xuid))
        };

        let mut current_tick = 0;
        let mut table = EventTable::default();
        for event in output.events.iter() {
            let ge = match event {
                csdemo::DemoEvent::Tick(tick) => {
                    current_tick = tick.tick();
                    continue;
                }
                csdemo::DemoEvent::GameEvent(ge) => ge,
                _ => continue,
            };

            let row = match (name, ge.as_ref()) {
                ("round_officially_ended", GameEvent::RoundOfficiallyEnded(_))
                | ("round_prestart", GameEvent::RoundPreStart(_))
                | ("round_announce_match_start", GameEvent::RoundAnnounceMatchStart(_))
                | ("bomb_planted", GameEvent::BombPlanted(_))
                | ("bomb_defused", GameEvent::BombDefused(_)) => EventRow::at(current_tick),
                ("player_death", GameEvent::PlayerDeath(death)) => {
                    let mut row = EventRow::at(current_tick);
                    if let Some(victim) = steamid_of(death.userid) {
                        row.values.insert("victim_steamid".to_owned(), victim);
                    }
                    if let Some(attacker) = steamid_of(death.attacker) {
                        row.values.insert("attacker_steamid".to_owned(), attacker);
                    }
                    row
                }
                _ => continue,
            };
            table.rows.push(row);
        }

        Ok(table)
    }
}

impl Session for DemoFile {
    #[tracing::instrument(skip(self), fields(path = ?self.path))]
    fn header(&self) -> Result<Header, DecodeError> {
        let output = parse_demo!(self.data);

        Ok(Header {
            map_name: output.header.map_name().to_owned(),
        })
    }

    #[tracing::instrument(skip(self), fields(path = ?self.path))]
    fn roster(&self) -> Result<Vec<PlayerRecord>, DecodeError> {
        let tmp = csdemo::Container::parse(&self.data[..])
            .map_err(|e| DecodeError::Container(format!("{:?}", e)))?;
        let output = csdemo::lazyparser::LazyParser::new(tmp);

        let mut players: Vec<_> = output.player_info().into_iter().collect();
        players.sort_unstable_by_key(|(id, _)| id.0);

        Ok(players
            .into_iter()
            .map(|(_, player)| PlayerRecord {
                steamid: player.xuid,
                name: player.name,
                team_code: player.team,
            })
            .collect())
    }

    #[tracing::instrument(skip(self), fields(path = ?self.path))]
    fn events(&self, name: &str) -> Result<EventTable, DecodeError> {
        match name {
            "round_start" => self.round_counter_ticks(ROUND_START_COUNT),
            "round_end" => self.round_counter_ticks(ROUND_END_COUNT),
            "round_officially_ended"
            | "round_prestart"
            | "round_announce_match_start"
            | "bomb_planted"
            | "bomb_defused"
            | "player_death" => self.game_events(name),
            other => Err(DecodeError::UnknownEvent(other.to_owned())),
        }
    }

    fn event_names(&self) -> Result<Vec<String>, DecodeError> {
        Ok(EVENT_NAMES.iter().map(|name| name.to_string()).collect())
    }

    #[tracing::instrument(skip(self, ticks), fields(path = ?self.path))]
    fn tick_fields(&self, fields: &[&str], ticks: &[u32]) -> Result<TickFieldTable, DecodeError> {
        let output = parse_demo!(self.data);

        let wanted_ticks: HashSet<u32> = ticks.iter().copied().collect();
        let props: HashMap<&str, &str> = fields
            .iter()
            .map(|field| (crate::fields::prop_path(field), *field))
            .collect();

        // Entity states only carry the props that changed, so keep the latest value
        // of every controller around.
        let mut latest = BTreeMap::<i32, BTreeMap<String, FieldValue>>::new();
        let mut table = TickFieldTable::default();
        for tick_state in output.entity_states.ticks.iter() {
            for state in tick_state
                .states
                .iter()
                .filter(|s| s.class == "CCSPlayerController")
            {
                let values = latest.entry(state.id).or_default();
                for prop in state.props.iter() {
                    let prop_name: &str = prop.prop_info.prop_name.as_ref();
                    let field = match props.get(prop_name) {
                        Some(f) => f,
                        None => continue,
                    };

                    let value = prop
                        .value
                        .as_i32()
                        .map(|v| FieldValue::Int(v as i64))
                        .or_else(|| prop.value.as_u32().map(|v| FieldValue::UInt(v as u64)))
                        .or_else(|| prop.value.as_f32().map(FieldValue::Float));
                    if let Some(value) = value {
                        values.insert((*field).to_owned(), value);
                    }
                }
            }

            if !wanted_ticks.contains(&tick_state.tick) {
                continue;
            }

            for (entity, values) in latest.iter() {
                // Controllers sit one entity slot above the player they belong to.
                let steamid = output
                    .player_info
                    .get(&csdemo::UserId(entity - 1))
                    .map(|p| p.xuid);

                table.rows.push(TickFieldRow {
                    tick: tick_state.tick,
                    steamid,
                    values: values.clone(),
                });
            }
        }

        tracing::debug!("Collected {} field rows", table.rows.len());

        Ok(table)
    }

    #[tracing::instrument(skip(self), fields(path = ?self.path))]
    fn voice_buffers(&self) -> Result<VoiceBuffers, DecodeError> {
        let dir = self
            .voice_dir
            .as_ref()
            .ok_or(DecodeError::Unsupported("voice data"))?;
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| DecodeError::Io { path, source }
        };

        let mut buffers = VoiceBuffers::new();
        for entry in std::fs::read_dir(dir).map_err(io_err(dir))? {
            let path = entry.map_err(io_err(dir))?.path();

            let steamid = match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                Some(id) => id,
                None => {
                    tracing::debug!("Ignoring {:?} in voice directory", path);
                    continue;
                }
            };

            let data = std::fs::read(&path).map_err(io_err(&path))?;
            buffers.insert(steamid, data);
        }

        Ok(buffers)
    }
}

/// Opens the same demo file again for every query.
#[derive(Debug, Clone)]
pub struct DemoFileSource {
    path: PathBuf,
    voice_dir: Option<PathBuf>,
}

impl DemoFileSource {
    pub fn new<P>(path: P) -> Result<Self, SessionError>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        if !path.is_file() {
            return Err(SessionError::NotFound(path));
        }

        Ok(Self {
            path,
            voice_dir: None,
        })
    }

    pub fn with_voice_dir<P>(mut self, dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.voice_dir = Some(dir.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionSource for DemoFileSource {
    type Session = DemoFile;

    fn open(&self) -> Result<Self::Session, SessionError> {
        let session = DemoFile::open(self.path.clone())?;

        Ok(match self.voice_dir.as_ref() {
            Some(dir) => session.with_voice_dir(dir.clone()),
            None => session,
        })
    }
}
