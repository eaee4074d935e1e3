//! Round timelines and team-partitioned voice exports for recorded CS2 demos.

pub mod config;
pub mod demo;
pub mod fields;
pub mod rounds;
pub mod session;
pub mod teams;
pub mod voice;

pub use config::Config;
pub use demo::{Batch, Demo, QueryError};
pub use rounds::{Round, RoundBoundaries, RoundError};
pub use session::{DecodeError, PlayerRecord, Session, SessionError, SessionSource};
pub use teams::{Team, TeamAssignment, TeamPolicy};
pub use voice::{ExportReport, SinkError, VoiceSink};
