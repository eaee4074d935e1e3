//! Named per-player fields that can be sampled at a tick.

use crate::session::{best_effort, Session, TickFieldTable};

pub static SCOREBOARD_FIELDS: [&str; 4] = ["kills_total", "deaths_total", "assists_total", "mvps"];

pub static FIELD_PROPS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "kills_total" => "CCSPlayerController.CCSPlayerController_ActionTrackingServices.m_matchStats.m_iKills",
    "deaths_total" => "CCSPlayerController.CCSPlayerController_ActionTrackingServices.m_matchStats.m_iDeaths",
    "assists_total" => "CCSPlayerController.CCSPlayerController_ActionTrackingServices.m_matchStats.m_iAssists",
    "damage_total" => "CCSPlayerController.CCSPlayerController_ActionTrackingServices.m_matchStats.m_iDamage",
    "mvps" => "CCSPlayerController.m_iMVPs",
    "score" => "CCSPlayerController.m_iScore",
    "team_num" => "CCSPlayerController.m_iTeamNum",
};

/// Maps a friendly field name to the entity property it is read from. Names without
/// an alias are taken to be property paths already.
pub fn prop_path(field: &str) -> &str {
    FIELD_PROPS.get(field).copied().unwrap_or(field)
}

pub fn snapshot<S>(session: &S, fields: &[&str], tick: u32) -> TickFieldTable
where
    S: Session + ?Sized,
{
    best_effort("tick_fields", session.tick_fields(fields, &[tick]))
}
