//! Attribution of players to the two playing teams.

use std::collections::HashMap;

use crate::session::PlayerRecord;

pub const UNKNOWN_PLAYER: &str = "Unknown Player";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Team {
    Team1,
    Team2,
    Unresolved,
}

impl Team {
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            Self::Team1 => Some("T1"),
            Self::Team2 => Some("T2"),
            Self::Unresolved => None,
        }
    }
}

/// How the two playing teams are labelled once they are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamOrdering {
    /// Team1 is the code that shows up first in the roster.
    #[default]
    FirstSeen,
    /// Team1 is the lower team code.
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TeamPolicy {
    /// Codes that never form a team (unassigned and spectators).
    pub excluded_codes: Vec<i32>,
    pub ordering: TeamOrdering,
}

impl Default for TeamPolicy {
    fn default() -> Self {
        Self {
            excluded_codes: vec![0, 1],
            ordering: TeamOrdering::FirstSeen,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamAssignment {
    team1: Option<i32>,
    team2: Option<i32>,
    members: HashMap<u64, Team>,
}

impl TeamAssignment {
    pub fn team_of(&self, steamid: u64) -> Team {
        self.members
            .get(&steamid)
            .copied()
            .unwrap_or(Team::Unresolved)
    }

    pub fn code(&self, team: Team) -> Option<i32> {
        match team {
            Team::Team1 => self.team1,
            Team::Team2 => self.team2,
            Team::Unresolved => None,
        }
    }
}

struct CodeStats {
    code: i32,
    first_seen: usize,
    members: usize,
}

/// Picks the two most populated non-excluded team codes and assigns every player.
///
/// Players listed with more than one code are ambiguous and stay unresolved.
#[tracing::instrument(skip_all, fields(players = roster.len()))]
pub fn resolve(roster: &[PlayerRecord], policy: &TeamPolicy) -> TeamAssignment {
    let mut stats: Vec<CodeStats> = Vec::new();
    let mut player_codes = HashMap::<u64, Option<i32>>::new();

    for (i, player) in roster.iter().enumerate() {
        player_codes
            .entry(player.steamid)
            .and_modify(|code| {
                if *code != Some(player.team_code) {
                    *code = None;
                }
            })
            .or_insert(Some(player.team_code));

        if policy.excluded_codes.contains(&player.team_code) {
            continue;
        }
        if !stats.iter().any(|s| s.code == player.team_code) {
            stats.push(CodeStats {
                code: player.team_code,
                first_seen: i,
                members: 0,
            });
        }
    }

    // Each player counts once, and only towards an unambiguous code.
    for code in player_codes.values().flatten() {
        if let Some(s) = stats.iter_mut().find(|s| s.code == *code) {
            s.members += 1;
        }
    }

    stats.sort_by_key(|s| (core::cmp::Reverse(s.members), s.first_seen));
    if stats.len() > 2 {
        let dropped: Vec<_> = stats[2..].iter().map(|s| s.code).collect();
        tracing::warn!(?dropped, "More than two team codes, extra codes stay unresolved");
    }
    stats.truncate(2);
    match policy.ordering {
        TeamOrdering::FirstSeen => stats.sort_by_key(|s| s.first_seen),
        TeamOrdering::Numeric => stats.sort_by_key(|s| s.code),
    };

    let team1 = stats.first().map(|s| s.code);
    let team2 = stats.get(1).map(|s| s.code);

    let members = player_codes
        .into_iter()
        .map(|(steamid, code)| {
            let team = match code {
                Some(c) if Some(c) == team1 => Team::Team1,
                Some(c) if Some(c) == team2 => Team::Team2,
                Some(_) => Team::Unresolved,
                None => {
                    tracing::debug!(steamid, "Player listed on several teams");
                    Team::Unresolved
                }
            };
            (steamid, team)
        })
        .collect();

    tracing::debug!(?team1, ?team2, "Resolved teams");

    TeamAssignment {
        team1,
        team2,
        members,
    }
}

/// Display name of `steamid`, or [`UNKNOWN_PLAYER`].
pub fn name_for(roster: &[PlayerRecord], steamid: u64) -> &str {
    roster
        .iter()
        .find(|p| p.steamid == steamid)
        .map(|p| p.name.as_str())
        .unwrap_or(UNKNOWN_PLAYER)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRosters {
    pub team1: Vec<PlayerRecord>,
    pub team2: Vec<PlayerRecord>,
}

/// Splits the roster along `assignment`, keeping roster order. A player listed
/// twice on the same team shows up once.
pub fn split(roster: &[PlayerRecord], assignment: &TeamAssignment) -> TeamRosters {
    let mut seen = std::collections::HashSet::new();
    let mut rosters = TeamRosters::default();

    for player in roster.iter() {
        if !seen.insert(player.steamid) {
            continue;
        }
        match assignment.team_of(player.steamid) {
            Team::Team1 => rosters.team1.push(player.clone()),
            Team::Team2 => rosters.team2.push(player.clone()),
            Team::Unresolved => {}
        };
    }

    rosters
}
