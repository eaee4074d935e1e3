use std::collections::BTreeMap;
use std::sync::Mutex;

use analysis::session::memory::MemorySession;
use analysis::teams::{Team, TeamPolicy};
use analysis::voice::{self, CollisionPolicy, SinkError, VoiceExportConfig, VoiceSink};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

#[derive(Default)]
struct MemorySink {
    files: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    reject: Option<&'static str>,
}

impl MemorySink {
    fn keys(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .keys()
            .map(|(_, key)| key.clone())
            .collect()
    }

    fn get(&self, session_id: &str, key: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(&(session_id.to_owned(), key.to_owned()))
            .cloned()
    }
}

impl VoiceSink for MemorySink {
    fn write(&self, session_id: &str, key: &str, data: &[u8]) -> Result<(), SinkError> {
        if self.reject == Some(key) {
            return Err(SinkError::Remote {
                key: key.to_owned(),
                reason: "rejected".to_owned(),
            });
        }

        self.files
            .lock()
            .unwrap()
            .insert((session_id.to_owned(), key.to_owned()), data.to_vec());
        Ok(())
    }
}

fn scenario() -> MemorySession {
    MemorySession::new()
        .with_player(1, "A", 2)
        .with_player(2, "B", 3)
        .with_player(3, "C", 2)
        .with_voice(1, b"x")
        .with_voice(2, b"y")
        .with_voice(3, b"z")
}

#[test]
#[traced_test]
fn partitioned_by_team() {
    let sink = MemorySink::default();

    let report = voice::export(
        &scenario(),
        "nuke",
        &sink,
        &TeamPolicy::default(),
        &VoiceExportConfig::default(),
    );

    assert_eq!(vec!["T1-A.wav", "T2-B.wav", "T1-C.wav"], report.keys());
    assert_eq!(
        vec![Team::Team1, Team::Team2, Team::Team1],
        report.written.iter().map(|c| c.team).collect::<Vec<_>>()
    );
    assert_eq!(Some(b"y".to_vec()), sink.get("nuke", "T2-B.wav"));
    assert!(report.skipped.is_empty());
}

#[test]
#[traced_test]
fn unknown_player_skipped() {
    let sink = MemorySink::default();
    let session = scenario().with_voice(9, b"?");

    let report = voice::export(
        &session,
        "nuke",
        &sink,
        &TeamPolicy::default(),
        &VoiceExportConfig::default(),
    );

    assert_eq!(vec![9], report.skipped);
    assert_eq!(vec!["T1-A.wav", "T1-C.wav", "T2-B.wav"], sink.keys());
    assert!(logs_contain("Skipping voice clip without a team"));
}

#[test]
fn spectator_skipped() {
    let sink = MemorySink::default();
    let session = scenario().with_player(4, "Caster", 1).with_voice(4, b"s");

    let report = voice::export(
        &session,
        "nuke",
        &sink,
        &TeamPolicy::default(),
        &VoiceExportConfig::default(),
    );

    assert_eq!(vec![4], report.skipped);
    assert_eq!(3, report.written.len());
}

#[test]
fn name_collision_overwrites() {
    let sink = MemorySink::default();
    let session = MemorySession::new()
        .with_player(1, "Same", 2)
        .with_player(2, "Other", 3)
        .with_player(3, "Same", 2)
        .with_voice(1, b"first")
        .with_voice(3, b"second");

    let report = voice::export(
        &session,
        "s",
        &sink,
        &TeamPolicy::default(),
        &VoiceExportConfig::default(),
    );

    assert_eq!(vec!["T1-Same.wav", "T1-Same.wav"], report.keys());
    assert_eq!(vec!["T1-Same.wav"], sink.keys());
    assert_eq!(Some(b"second".to_vec()), sink.get("s", "T1-Same.wav"));
}

#[test]
fn name_collision_suffixed() {
    let sink = MemorySink::default();
    let session = MemorySession::new()
        .with_player(1, "Same", 2)
        .with_player(2, "Other", 3)
        .with_player(3, "Same", 2)
        .with_voice(1, b"first")
        .with_voice(3, b"second");
    let config = VoiceExportConfig {
        extension: "opus".to_owned(),
        collision: CollisionPolicy::SuffixSteamId,
    };

    let report = voice::export(&session, "s", &sink, &TeamPolicy::default(), &config);

    assert_eq!(vec!["T1-Same.opus", "T1-Same-3.opus"], report.keys());
    assert_eq!(Some(b"first".to_vec()), sink.get("s", "T1-Same.opus"));
    assert_eq!(Some(b"second".to_vec()), sink.get("s", "T1-Same-3.opus"));
}

#[test]
fn suffixed_name_taken_by_another_player() {
    let sink = MemorySink::default();
    let session = MemorySession::new()
        .with_player(1, "Same-3", 2)
        .with_player(2, "Same", 2)
        .with_player(3, "Same", 2)
        .with_player(4, "Other", 3)
        .with_voice(1, b"one")
        .with_voice(2, b"two")
        .with_voice(3, b"three");
    let config = VoiceExportConfig {
        collision: CollisionPolicy::SuffixSteamId,
        ..Default::default()
    };

    let report = voice::export(&session, "s", &sink, &TeamPolicy::default(), &config);

    assert_eq!(
        vec!["T1-Same-3.wav", "T1-Same.wav", "T1-Same-3-2.wav"],
        report.keys()
    );
    assert_eq!(3, sink.keys().len());
    assert_eq!(Some(b"one".to_vec()), sink.get("s", "T1-Same-3.wav"));
    assert_eq!(Some(b"three".to_vec()), sink.get("s", "T1-Same-3-2.wav"));
}

#[test]
#[traced_test]
fn failed_write_does_not_stop_export() {
    let sink = MemorySink {
        reject: Some("T2-B.wav"),
        ..Default::default()
    };

    let report = voice::export(
        &scenario(),
        "nuke",
        &sink,
        &TeamPolicy::default(),
        &VoiceExportConfig::default(),
    );

    assert_eq!(vec!["T1-A.wav", "T1-C.wav"], report.keys());
    assert_eq!(1, report.failed.len());
    assert_eq!(2, report.failed[0].0);
}

#[test]
#[traced_test]
fn broken_roster_skips_everything() {
    let sink = MemorySink::default();
    let session = scenario().failing("roster");

    let report = voice::export(
        &session,
        "nuke",
        &sink,
        &TeamPolicy::default(),
        &VoiceExportConfig::default(),
    );

    assert!(report.written.is_empty());
    assert_eq!(vec![1, 2, 3], report.skipped);
    assert!(logs_contain("Decoding failed"));
}

#[test]
fn broken_voice_data_writes_nothing() {
    let sink = MemorySink::default();
    let session = scenario().failing("voice_buffers");

    let report = voice::export(
        &session,
        "nuke",
        &sink,
        &TeamPolicy::default(),
        &VoiceExportConfig::default(),
    );

    assert!(report.written.is_empty());
    assert!(report.skipped.is_empty());
    assert!(sink.keys().is_empty());
}
