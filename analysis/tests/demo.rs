use analysis::session::memory::{MemorySession, MemorySource};
use analysis::session::{EventRow, EventTable, FieldValue};
use analysis::{Config, Demo, QueryError, RoundError, SessionError};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

fn session() -> MemorySession {
    MemorySession::new()
        .with_map("de_nuke")
        .with_player(11, "Excel", 2)
        .with_player(12, "Skalla_xD", 2)
        .with_player(21, "Enemy", 3)
        .with_player(99, "Caster", 1)
        .with_event("round_start", [100, 150, 700, 705, 2000])
        .with_event("round_end", [650, 1900, 3000])
        .with_field(1900, 11, "kills_total", FieldValue::Int(3))
        .with_field(1900, 11, "deaths_total", FieldValue::Int(1))
        .with_field(1900, 21, "kills_total", FieldValue::Int(1))
        .with_field(3000, 11, "kills_total", FieldValue::Int(5))
}

fn demo(session: MemorySession) -> Demo<MemorySource> {
    Demo::new(MemorySource::new(session), "nuke", Config::default())
}

#[test]
fn round_ticks() {
    let demo = demo(session());

    assert_eq!(
        vec![Some(100), Some(700), Some(2000)],
        demo.round_start_ticks().unwrap()
    );
    assert_eq!(
        vec![Some(650), Some(1900), Some(3000)],
        demo.round_end_ticks().unwrap()
    );

    let round = demo.round(1).unwrap();
    assert_eq!((1, 700, 1900), (round.index, round.start_tick, round.end_tick));
    assert_eq!(700..=1900, demo.round_ticks(1).unwrap());
}

#[test]
fn round_errors_stay_distinct() {
    let demo = demo(session().with_event("round_end", [650, 1900]));

    assert!(matches!(
        demo.round(0),
        Err(QueryError::Round(RoundError::RoundCountMismatch { starts: 3, ends: 2 }))
    ));
}

#[test]
#[traced_test]
fn missing_round_end_is_empty() {
    let demo = demo(
        MemorySession::new()
            .with_player(1, "A", 2)
            .with_event("round_start", [100]),
    );

    assert_eq!(Vec::<Option<u32>>::new(), demo.round_end_ticks().unwrap());
    assert!(logs_contain("round_end"));
}

#[test]
fn undecodable_events_are_empty() {
    let demo = demo(session().failing("events"));

    assert!(demo.round_start_ticks().unwrap().is_empty());
    assert!(demo.round_end_ticks().unwrap().is_empty());
    assert!(matches!(
        demo.round(0),
        Err(QueryError::Round(RoundError::RoundIndexOutOfRange { index: 0, rounds: 0 }))
    ));
}

#[test]
fn missing_event_tick() {
    let ends = EventTable {
        rows: vec![EventRow::at(650), EventRow::default()],
    };
    let demo = demo(
        session()
            .with_event("round_start", [100, 700])
            .with_event_table("round_end", ends),
    );

    assert_eq!(vec![Some(650), None], demo.round_end_ticks().unwrap());
    assert!(matches!(
        demo.round(1),
        Err(QueryError::Round(RoundError::MissingBoundary { index: 1 }))
    ));
}

#[test]
fn player_names() {
    let demo = demo(session());

    assert_eq!("Skalla_xD", demo.player_name(12).unwrap());
    assert_eq!("Unknown Player", demo.player_name(1234).unwrap());
}

#[test]
fn player_name_with_broken_roster() {
    let demo = demo(session().failing("roster"));

    assert_eq!("Unknown Player", demo.player_name(12).unwrap());
}

#[test]
fn rosters() {
    let demo = demo(session());
    let rosters = demo.team_rosters().unwrap();

    assert_eq!(
        vec![11, 12],
        rosters.team1.iter().map(|p| p.steamid).collect::<Vec<_>>()
    );
    assert_eq!(
        vec![21],
        rosters.team2.iter().map(|p| p.steamid).collect::<Vec<_>>()
    );
}

#[test]
fn rosters_are_deterministic() {
    let demo = demo(session());

    assert_eq!(demo.team_rosters().unwrap(), demo.team_rosters().unwrap());
}

#[test]
fn scoreboard_at_round_end() {
    let demo = demo(session());
    let table = demo.round_scoreboard(1).unwrap();

    assert_eq!(2, table.rows.len());
    let excel = table.at(1900).find(|r| r.steamid == Some(11)).unwrap();
    assert_eq!(Some(&FieldValue::Int(3)), excel.values.get("kills_total"));
    assert_eq!(Some(&FieldValue::Int(1)), excel.values.get("deaths_total"));
}

#[test]
fn fields_at_tick() {
    let demo = demo(session());
    let table = demo.fields_at(&["kills_total"], 3000).unwrap();

    assert_eq!(1, table.rows.len());
    assert_eq!(Some(&FieldValue::Int(5)), table.rows[0].values.get("kills_total"));
    assert!(demo.fields_at(&["kills_total"], 4).unwrap().rows.is_empty());
}

#[test]
fn map_name() {
    assert_eq!("de_nuke", demo(session()).map_name().unwrap());
    assert_eq!("", demo(session().failing("header")).map_name().unwrap());
}

#[test]
fn reopens_per_query() {
    let demo = demo(session());

    demo.round_start_ticks().unwrap();
    demo.round_end_ticks().unwrap();
    demo.player_name(11).unwrap();

    assert_eq!(3, demo.source().opened());
}

#[test]
fn batch_reuses_session() {
    let demo = demo(session());

    let mut batch = demo.batch().unwrap();
    assert_eq!(3, batch.round_start_ticks().len());
    assert_eq!(3, batch.round_end_ticks().len());
    assert_eq!(2, batch.round(2).unwrap().index);
    assert_eq!("Enemy", batch.player_name(21));
    assert_eq!("nuke", batch.session_id());
    drop(batch);

    assert_eq!(1, demo.source().opened());
}

#[test]
fn session_id_override() {
    let mut demo = demo(session());
    demo.set_session_id("0192f3a0-0000-7000-8000-000000000000");

    assert_eq!("0192f3a0-0000-7000-8000-000000000000", demo.session_id());
}

#[test]
fn missing_demo_file() {
    let result = Demo::open("/definitely/not/here.dem", Config::default());

    assert!(matches!(result, Err(SessionError::NotFound(_))));
}

#[test]
fn demo_id_from_file_name() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
    let demo = Demo::open(path, Config::default()).unwrap();

    assert_eq!("Cargo", demo.session_id());
}

#[test]
fn event_names() {
    let demo = demo(session());

    assert_eq!(
        vec!["round_end".to_owned(), "round_start".to_owned()],
        demo.event_names().unwrap()
    );
    assert!(demo(session().failing("events"))
        .event_names()
        .unwrap()
        .is_empty());
}
