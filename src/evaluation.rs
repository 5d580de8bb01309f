//! Score evaluation of series results
//!
//! Each result runs through a fixed sequence of stages. A stage reads the
//! raw result columns plus what earlier stages wrote, and fills in its own
//! columns:
//!
//! 1. `game_points`: `won_points`, `lost_points`
//! 2. `seating`: `table_size`, `opponents_lost`
//! 3. `opponent_points`: `opponents_lost_points`
//! 4. `total_score`: `score`
//!
//! An opponent without a result for the series contributes 0 lost games.

use crate::error::{Result, SkatError};
use crate::model::scoring::{add_games, add_points};
use crate::model::{
    EvaluationRow, GameResult, PlayerId, ResultKey, ScoringRules, SeriesId, Table, Totals,
};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

/// Lookups shared by all stages of one evaluation run
pub struct EvaluationContext<'a> {
    rules: &'a ScoringRules,
    seating: HashMap<ResultKey, &'a Table>,
    lost: HashMap<ResultKey, u32>,
}

impl<'a> EvaluationContext<'a> {
    /// Index tables by seated player; a player at two tables of one series is inconsistent
    pub fn new(rules: &'a ScoringRules, results: &[GameResult], tables: &'a [Table]) -> Result<Self> {
        let mut seating = HashMap::new();
        for table in tables {
            for &player_id in table.player_ids() {
                let key = ResultKey::new(table.series_id, player_id);
                if let Some(other) = seating.insert(key, table) {
                    return Err(SkatError::DataInconsistency(format!(
                        "player {} is seated at tables {} and {}",
                        player_id,
                        other.key(),
                        table.key()
                    )));
                }
            }
        }

        let lost = results.iter().map(|r| (r.key(), r.lost)).collect();

        Ok(Self { rules, seating, lost })
    }

    fn table_of(&self, key: ResultKey) -> Result<&'a Table> {
        self.seating.get(&key).copied().ok_or_else(|| {
            SkatError::DataInconsistency(format!(
                "a table with player {} is not present in series {}",
                key.player_id, key.series_id
            ))
        })
    }

    /// Lost games of everyone else at the player's table
    pub fn opponents_lost(&self, key: ResultKey) -> Result<u64> {
        let table = self.table_of(key)?;
        table.opponents(key.player_id).try_fold(0u64, |sum, p| {
            let lost = self
                .lost
                .get(&ResultKey::new(key.series_id, p))
                .copied()
                .unwrap_or(0);
            add_games(sum, u64::from(lost), "opponents lost games")
        })
    }
}

type Stage = fn(&EvaluationContext<'_>, EvaluationRow) -> Result<EvaluationRow>;

const STAGES: [Stage; 4] = [game_points, seating, opponent_points, total_score];

fn game_points(ctx: &EvaluationContext<'_>, mut row: EvaluationRow) -> Result<EvaluationRow> {
    row.won_points = ctx.rules.won_points(row.won)?;
    row.lost_points = ctx.rules.lost_points(row.lost)?;
    Ok(row)
}

fn seating(ctx: &EvaluationContext<'_>, mut row: EvaluationRow) -> Result<EvaluationRow> {
    row.table_size = ctx.table_of(row.key())?.size();
    row.opponents_lost = ctx.opponents_lost(row.key())?;
    Ok(row)
}

fn opponent_points(ctx: &EvaluationContext<'_>, mut row: EvaluationRow) -> Result<EvaluationRow> {
    row.opponents_lost_points = ctx
        .rules
        .opponents_lost_points(row.opponents_lost, row.table_size)?;
    Ok(row)
}

fn total_score(_ctx: &EvaluationContext<'_>, mut row: EvaluationRow) -> Result<EvaluationRow> {
    let score = add_points(row.points, row.won_points, "score")?;
    let score = add_points(score, row.lost_points, "score")?;
    row.score = add_points(score, row.opponents_lost_points, "score")?;
    Ok(row)
}

/// Evaluate every result, ordered by (series, player)
///
/// Fails with `NoData` when there are no results and with `DataInconsistency`
/// when a result's player is not seated in that series.
pub fn evaluate_results(
    results: &[GameResult],
    tables: &[Table],
    rules: &ScoringRules,
) -> Result<Vec<EvaluationRow>> {
    if results.is_empty() {
        return Err(SkatError::NoData("no results to evaluate".to_string()));
    }

    let ctx = EvaluationContext::new(rules, results, tables)?;

    let mut sorted: Vec<&GameResult> = results.iter().collect();
    sorted.sort_by_key(|r| r.key());

    let rows = sorted
        .into_iter()
        .map(|result| {
            STAGES
                .iter()
                .try_fold(EvaluationRow::from_result(result), |row, stage| stage(&ctx, row))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Evaluated {} results", rows.len());
    Ok(rows)
}

/// A player's rows in every series they played, plus the column sums
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalRow {
    pub player_id: PlayerId,
    pub per_series: BTreeMap<SeriesId, EvaluationRow>,
    pub total: Totals,
}

/// Per-player totals across all series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsTable {
    /// Every series that has at least one row, ascending
    pub series_ids: Vec<SeriesId>,
    /// One row per player, ascending by player ID
    pub rows: Vec<TotalRow>,
}

impl TotalsTable {
    pub fn get(&self, player_id: PlayerId) -> Option<&TotalRow> {
        self.rows.iter().find(|r| r.player_id == player_id)
    }
}

/// Group evaluation rows by player and sum them over all series
pub fn evaluate_total(rows: &[EvaluationRow]) -> Result<TotalsTable> {
    if rows.is_empty() {
        return Err(SkatError::NoData("no results to evaluate".to_string()));
    }

    let mut by_player: BTreeMap<PlayerId, BTreeMap<SeriesId, EvaluationRow>> = BTreeMap::new();
    let mut series_ids = BTreeSet::new();
    for row in rows {
        series_ids.insert(row.series_id);
        by_player
            .entry(row.player_id)
            .or_default()
            .insert(row.series_id, row.clone());
    }

    let rows = by_player
        .into_iter()
        .map(|(player_id, per_series)| {
            Ok(TotalRow {
                player_id,
                total: Totals::from_rows(per_series.values())?,
                per_series,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Totals for {} players over {} series",
        rows.len(),
        series_ids.len()
    );
    Ok(TotalsTable {
        series_ids: series_ids.into_iter().collect(),
        rows,
    })
}

/// Column a standing is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Score,
    Points,
    Won,
    WonPoints,
    Lost,
    LostPoints,
    TableSize,
    OpponentsLost,
    OpponentsLostPoints,
    Player,
}

impl SortKey {
    fn value(&self, row: &EvaluationRow) -> i128 {
        match self {
            SortKey::Score => i128::from(row.score),
            SortKey::Points => i128::from(row.points),
            SortKey::Won => i128::from(row.won),
            SortKey::WonPoints => i128::from(row.won_points),
            SortKey::Lost => i128::from(row.lost),
            SortKey::LostPoints => i128::from(row.lost_points),
            SortKey::TableSize => row.table_size as i128,
            SortKey::OpponentsLost => i128::from(row.opponents_lost),
            SortKey::OpponentsLostPoints => i128::from(row.opponents_lost_points),
            SortKey::Player => i128::from(row.player_id),
        }
    }
}

impl FromStr for SortKey {
    type Err = SkatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "score" => Ok(SortKey::Score),
            "points" => Ok(SortKey::Points),
            "won" => Ok(SortKey::Won),
            "won_points" => Ok(SortKey::WonPoints),
            "lost" => Ok(SortKey::Lost),
            "lost_points" => Ok(SortKey::LostPoints),
            "table_size" => Ok(SortKey::TableSize),
            "opponents_lost" => Ok(SortKey::OpponentsLost),
            "opponents_lost_points" => Ok(SortKey::OpponentsLostPoints),
            "player" | "player_id" => Ok(SortKey::Player),
            _ => Err(SkatError::InvalidInput(format!("unknown sort column: {}", s))),
        }
    }
}

/// An evaluation row with its 1-based position in a ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub position: usize,
    pub row: EvaluationRow,
}

/// Rank rows by `key`, highest first unless `reverse`; ties keep (series, player) order
pub fn rank_rows(rows: &[EvaluationRow], key: SortKey, reverse: bool) -> Vec<Standing> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        let ord = key.value(b).cmp(&key.value(a));
        let ord = if reverse { ord.reverse() } else { ord };
        ord.then_with(|| a.key().cmp(&b.key()))
    });

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, row)| Standing { position: i + 1, row })
        .collect()
}
