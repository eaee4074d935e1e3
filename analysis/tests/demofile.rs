use analysis::session::demofile::DemoFile;
use analysis::session::Session;
use analysis::{Config, Demo, SessionError};

#[test]
fn not_found() {
    assert!(matches!(
        DemoFile::open("/definitely/not/here.dem"),
        Err(SessionError::NotFound(_))
    ));
}

#[test]
fn directory_is_not_a_session() {
    assert!(matches!(
        DemoFile::open(env!("CARGO_MANIFEST_DIR")),
        Err(SessionError::NotFound(_))
    ));
}

#[test]
fn garbage_decodes_to_errors() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
    let session = DemoFile::open(path).unwrap();

    assert!(session.roster().is_err());
    assert!(session.events("round_end").is_err());
    assert!(session.events("no_such_event").is_err());
    assert!(session.voice_buffers().is_err());
}

#[test]
fn garbage_queries_are_empty() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
    let demo = Demo::open(path, Config::default()).unwrap();

    assert!(demo.round_end_ticks().unwrap().is_empty());
    assert!(demo.team_rosters().unwrap().team1.is_empty());
    assert_eq!("Unknown Player", demo.player_name(1).unwrap());
}

#[test]
#[ignore = "needs testfiles/nuke.dem"]
fn nuke_rounds() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../testfiles/nuke.dem");
    let demo = Demo::open(path, Config::default()).unwrap();

    let starts = demo.round_start_ticks().unwrap();
    let ends = demo.round_end_ticks().unwrap();
    dbg!(&starts, &ends);

    assert_eq!(starts.len(), ends.len());
    assert!(demo.round(0).is_ok());
    assert_eq!(5, demo.team_rosters().unwrap().team1.len());
}

#[test]
fn event_names_match_events() {
    let file = DemoFile::open(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml")).unwrap();
    let names = file.event_names().unwrap();

    assert_eq!(8, names.len());
    assert!(names.windows(2).all(|w| w[0] < w[1]));
    for name in names {
        assert!(!matches!(
            file.events(&name),
            Err(analysis::DecodeError::UnknownEvent(_))
        ));
    }
    assert!(matches!(
        file.events("weapon_fire"),
        Err(analysis::DecodeError::UnknownEvent(_))
    ));
}
