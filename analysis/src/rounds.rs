//! Round boundaries and the tick ranges between them.

use crate::session::{best_effort, Session};

/// Start markers closer than this to the previously accepted one are re-fires of
/// the same round start.
pub const ROUND_START_MIN_GAP: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("Found {starts} round starts but {ends} round ends")]
    RoundCountMismatch { starts: usize, ends: usize },
    #[error("Round {index} does not exist, there are {rounds} rounds")]
    RoundIndexOutOfRange { index: usize, rounds: usize },
    #[error("Round {index} is missing its start or end tick")]
    MissingBoundary { index: usize },
    #[error("Round {index} starts at {start} but ends at {end}")]
    InvalidRoundOrdering { index: usize, start: u32, end: u32 },
}

/// Drops start markers that follow the last accepted one by `min_gap` ticks or less.
///
/// Markers without a tick are kept in place so that the round they belong to can
/// still be reported as incomplete.
pub fn filter_round_starts<I>(ticks: I, min_gap: u32) -> Vec<Option<u32>>
where
    I: IntoIterator<Item = Option<u32>>,
{
    let mut last_accepted: Option<u32> = None;

    ticks
        .into_iter()
        .filter(|tick| {
            let tick = match tick {
                Some(t) => *t,
                None => return true,
            };

            match last_accepted {
                Some(last) if tick.saturating_sub(last) <= min_gap => false,
                _ => {
                    last_accepted = Some(tick);
                    true
                }
            }
        })
        .collect()
}

pub fn dedup_round_starts(ticks: &[u32], min_gap: u32) -> Vec<u32> {
    filter_round_starts(ticks.iter().copied().map(Some), min_gap)
        .into_iter()
        .flatten()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub index: usize,
    pub start_tick: u32,
    pub end_tick: u32,
}

impl Round {
    /// Every tick of the round, both boundaries included.
    pub fn ticks(&self) -> core::ops::RangeInclusive<u32> {
        self.start_tick..=self.end_tick
    }

    /// Length of [`Round::ticks`], zero for a round that ends before it starts.
    pub fn tick_count(&self) -> u64 {
        (self.end_tick as u64 + 1).saturating_sub(self.start_tick as u64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundBoundaries {
    starts: Vec<Option<u32>>,
    ends: Vec<Option<u32>>,
}

impl RoundBoundaries {
    pub fn new(starts: Vec<Option<u32>>, ends: Vec<Option<u32>>) -> Self {
        Self { starts, ends }
    }

    /// Reads the `round_start`/`round_end` events of `session`. Events the session
    /// cannot decode count as empty.
    pub fn from_session<S>(session: &S, min_gap: u32) -> Self
    where
        S: Session + ?Sized,
    {
        Self {
            starts: round_start_ticks(session, min_gap),
            ends: round_end_ticks(session),
        }
    }

    pub fn starts(&self) -> &[Option<u32>] {
        &self.starts
    }

    pub fn ends(&self) -> &[Option<u32>] {
        &self.ends
    }

    pub fn len(&self) -> Result<usize, RoundError> {
        if self.starts.len() != self.ends.len() {
            return Err(RoundError::RoundCountMismatch {
                starts: self.starts.len(),
                ends: self.ends.len(),
            });
        }
        Ok(self.starts.len())
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty() && self.ends.is_empty()
    }

    pub fn pair(&self, index: usize) -> Result<Round, RoundError> {
        let rounds = self.len()?;
        if index >= rounds {
            return Err(RoundError::RoundIndexOutOfRange { index, rounds });
        }

        let (start_tick, end_tick) = match (self.starts[index], self.ends[index]) {
            (Some(s), Some(e)) => (s, e),
            _ => return Err(RoundError::MissingBoundary { index }),
        };
        if start_tick >= end_tick {
            return Err(RoundError::InvalidRoundOrdering {
                index,
                start: start_tick,
                end: end_tick,
            });
        }

        Ok(Round {
            index,
            start_tick,
            end_tick,
        })
    }

    /// Pairs every round. A count mismatch yields a single error.
    pub fn rounds(&self) -> Vec<Result<Round, RoundError>> {
        match self.len() {
            Ok(n) => (0..n).map(|i| self.pair(i)).collect(),
            Err(e) => vec![Err(e)],
        }
    }
}

#[tracing::instrument(skip(session))]
pub fn round_start_ticks<S>(session: &S, min_gap: u32) -> Vec<Option<u32>>
where
    S: Session + ?Sized,
{
    let raw = best_effort("round_start", session.events("round_start")).ticks();
    let filtered = filter_round_starts(raw.iter().copied(), min_gap);

    tracing::debug!("Kept {} of {} round starts", filtered.len(), raw.len());

    filtered
}

pub fn round_end_ticks<S>(session: &S) -> Vec<Option<u32>>
where
    S: Session + ?Sized,
{
    best_effort("round_end", session.events("round_end")).ticks()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_example() {
        assert_eq!(
            vec![100, 700, 2000],
            dedup_round_starts(&[100, 150, 700, 705, 2000], ROUND_START_MIN_GAP)
        );
    }

    #[test]
    fn gap_is_exclusive() {
        assert_eq!(vec![0, 501], dedup_round_starts(&[0, 500, 501], 500));
    }

    #[test]
    fn discarded_ticks_do_not_move_the_window() {
        assert_eq!(vec![0, 900], dedup_round_starts(&[0, 400, 800, 900], 500));
    }

    #[test]
    fn empty() {
        assert!(dedup_round_starts(&[], ROUND_START_MIN_GAP).is_empty());
    }

    #[test]
    fn missing_start_kept() {
        assert_eq!(
            vec![Some(10), None, Some(1000)],
            filter_round_starts([Some(10), Some(20), None, Some(1000)], 500)
        );
    }

    #[test]
    fn reversed_round_is_empty() {
        let round = Round {
            index: 0,
            start_tick: 10,
            end_tick: 5,
        };

        assert_eq!(0, round.tick_count());
        assert_eq!(0, round.ticks().count());
    }
}
