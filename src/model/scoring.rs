//! Skat tournament scoring rules (Seeger-Fabian style list scoring)

use super::player::PlayerId;
use super::result::{GameResult, ResultKey};
use super::series::SeriesId;
use crate::error::{Result, SkatError};
use serde::Serialize;

/// Fixed point values used by the evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pub won_game_points: i64,
    pub lost_game_points: i64,
    pub opponent_loss_points_four: i64,
    pub opponent_loss_points_three: i64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            won_game_points: 50,
            lost_game_points: 50,
            opponent_loss_points_four: 30,
            opponent_loss_points_three: 40,
        }
    }
}

impl ScoringRules {
    pub fn won_points(&self, won: u32) -> Result<i64> {
        i64::from(won)
            .checked_mul(self.won_game_points)
            .ok_or_else(|| SkatError::overflow("won points"))
    }

    /// Returned as negative
    pub fn lost_points(&self, lost: u32) -> Result<i64> {
        i64::from(lost)
            .checked_mul(self.lost_game_points)
            .and_then(i64::checked_neg)
            .ok_or_else(|| SkatError::overflow("lost points"))
    }

    /// Points awarded for games lost by the other players at the table
    pub fn opponents_lost_points(&self, opponents_lost: u64, table_size: usize) -> Result<i64> {
        let per_game = match table_size {
            4 => self.opponent_loss_points_four,
            3 => self.opponent_loss_points_three,
            n => {
                return Err(SkatError::DataInconsistency(format!(
                    "table size must be 3 or 4, but was {}",
                    n
                )))
            }
        };
        i64::try_from(opponents_lost)
            .ok()
            .and_then(|lost| lost.checked_mul(per_game))
            .ok_or_else(|| SkatError::overflow("opponents lost points"))
    }
}

/// A result enriched with the derived scoring columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationRow {
    pub series_id: SeriesId,
    pub player_id: PlayerId,
    pub points: i64,
    pub won: u32,
    pub lost: u32,
    pub remarks: String,
    pub won_points: i64,
    pub lost_points: i64,
    pub table_size: usize,
    pub opponents_lost: u64,
    pub opponents_lost_points: i64,
    pub score: i64,
}

impl EvaluationRow {
    /// Start a row from a raw result, derived columns zeroed
    pub fn from_result(result: &GameResult) -> Self {
        Self {
            series_id: result.series_id,
            player_id: result.player_id,
            points: result.points,
            won: result.won,
            lost: result.lost,
            remarks: result.remarks.clone(),
            won_points: 0,
            lost_points: 0,
            table_size: 0,
            opponents_lost: 0,
            opponents_lost_points: 0,
            score: 0,
        }
    }

    pub fn key(&self) -> ResultKey {
        ResultKey::new(self.series_id, self.player_id)
    }
}

/// Column sums of evaluation rows (table size is not summed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub points: i64,
    pub won: u64,
    pub won_points: i64,
    pub lost: u64,
    pub lost_points: i64,
    pub opponents_lost: u64,
    pub opponents_lost_points: i64,
    pub score: i64,
}

impl Totals {
    pub fn add_row(&mut self, row: &EvaluationRow) -> Result<()> {
        self.points = add_points(self.points, row.points, "total points")?;
        self.won = add_games(self.won, u64::from(row.won), "total won games")?;
        self.won_points = add_points(self.won_points, row.won_points, "total won points")?;
        self.lost = add_games(self.lost, u64::from(row.lost), "total lost games")?;
        self.lost_points = add_points(self.lost_points, row.lost_points, "total lost points")?;
        self.opponents_lost = add_games(
            self.opponents_lost,
            row.opponents_lost,
            "total opponents lost games",
        )?;
        self.opponents_lost_points = add_points(
            self.opponents_lost_points,
            row.opponents_lost_points,
            "total opponents lost points",
        )?;
        self.score = add_points(self.score, row.score, "total score")?;
        Ok(())
    }

    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a EvaluationRow>) -> Result<Self> {
        let mut totals = Totals::default();
        for row in rows {
            totals.add_row(row)?;
        }
        Ok(totals)
    }
}

pub(crate) fn add_points(a: i64, b: i64, what: &str) -> Result<i64> {
    a.checked_add(b).ok_or_else(|| SkatError::overflow(what))
}

pub(crate) fn add_games(a: u64, b: u64, what: &str) -> Result<u64> {
    a.checked_add(b).ok_or_else(|| SkatError::overflow(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_won_and_lost_points() {
        let rules = ScoringRules::default();
        assert_eq!(rules.won_points(7).unwrap(), 350);
        assert_eq!(rules.lost_points(3).unwrap(), -150);
        assert_eq!(rules.lost_points(0).unwrap(), 0);
    }

    #[test]
    fn test_opponents_lost_points_by_table_size() {
        let rules = ScoringRules::default();
        assert_eq!(rules.opponents_lost_points(3, 4).unwrap(), 90);
        assert_eq!(rules.opponents_lost_points(3, 3).unwrap(), 120);
        assert_eq!(rules.opponents_lost_points(0, 3).unwrap(), 0);
    }

    #[test]
    fn test_invalid_table_size_is_inconsistent() {
        let rules = ScoringRules::default();
        let err = rules.opponents_lost_points(2, 5).unwrap_err();
        assert!(matches!(err, SkatError::DataInconsistency(_)));
    }

    #[test]
    fn test_totals_sum_columns() {
        let mut a = EvaluationRow::from_result(&GameResult::new(1, 6, 50, 7, 3));
        a.won_points = 350;
        a.lost_points = -150;
        a.table_size = 4;
        a.score = 250;
        let mut b = EvaluationRow::from_result(&GameResult::new(2, 6, 240, 2, 0));
        b.won_points = 100;
        b.table_size = 3;
        b.score = 340;

        let totals = Totals::from_rows(&[a, b]).unwrap();
        assert_eq!(totals.points, 290);
        assert_eq!(totals.won, 9);
        assert_eq!(totals.lost_points, -150);
        assert_eq!(totals.score, 590);
    }

    #[test]
    fn test_large_rule_values_overflow() {
        let rules = ScoringRules {
            won_game_points: i64::MAX,
            lost_game_points: i64::MAX,
            ..ScoringRules::default()
        };
        assert_eq!(rules.won_points(1).unwrap(), i64::MAX);
        assert!(matches!(rules.won_points(2), Err(SkatError::Overflow(_))));
        assert!(matches!(rules.lost_points(2), Err(SkatError::Overflow(_))));
    }

    #[test]
    fn test_totals_overflow_is_an_error() {
        let mut row = EvaluationRow::from_result(&GameResult::new(1, 1, 0, u32::MAX, u32::MAX));
        row.score = i64::MAX;

        let err = Totals::from_rows(&[row.clone(), row.clone()]).unwrap_err();
        assert!(matches!(err, SkatError::Overflow(_)));

        row.score = 0;
        let totals = Totals::from_rows(&[row.clone(), row]).unwrap();
        assert_eq!(totals.won, 2 * u64::from(u32::MAX));
    }
}
