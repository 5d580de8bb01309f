//! Tournament operations on top of a [`Store`]
//!
//! The tournament keeps no state between calls besides the store itself;
//! every operation gets the series it works on from the caller. Concurrent
//! callers must serialize access per series themselves.

use crate::error::{Result, SkatError};
use crate::evaluation::{self, EvaluationContext, TotalsTable};
use crate::model::{
    EvaluationRow, GameResult, NewPlayer, NewSeries, PlayerId, ResultKey, ScoringRules, Series,
    SeriesId, Table, TableUpdate, MIN_TABLE_SIZE,
};
use crate::shuffle::{self, SelectionPolicy};
use crate::store::Store;
use chrono::{Duration, Local, NaiveTime};
use log::info;
use rand::Rng;

pub struct Tournament<S> {
    store: S,
    rules: ScoringRules,
}

impl<S: Store> Tournament<S> {
    pub fn new(store: S) -> Self {
        Self::with_rules(store, ScoringRules::default())
    }

    pub fn with_rules(store: S, rules: ScoringRules) -> Self {
        Self { store, rules }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Seat the players selected by `policy` at new random tables of `series_id`.
    ///
    /// Previous tables of the series are replaced in one step.
    pub fn shuffle_tables<R: Rng + ?Sized>(
        &mut self,
        series_id: SeriesId,
        policy: &SelectionPolicy,
        rng: &mut R,
    ) -> Result<Vec<Table>> {
        self.store.get_series(series_id)?;

        let players = self.store.all_players()?;
        let selected = policy.select(&players)?;
        let tables = shuffle::partition(series_id, &selected, rng)?;

        self.store
            .replace_tables_for_series(series_id, tables.clone())?;

        info!(
            "Shuffled {} players of series {} to {} tables",
            selected.len(),
            series_id,
            tables.len()
        );
        Ok(tables)
    }

    /// Shuffle exactly the roster of the series
    pub fn shuffle_series_roster<R: Rng + ?Sized>(
        &mut self,
        series_id: SeriesId,
        rng: &mut R,
    ) -> Result<Vec<Table>> {
        let series = self.store.get_series(series_id)?;
        if series.player_ids.is_empty() {
            return Err(SkatError::InvalidInput(format!(
                "not enough players: series {} has an empty roster",
                series_id
            )));
        }
        self.shuffle_tables(series_id, &SelectionPolicy::only(series.player_ids), rng)
    }

    pub fn add_all_players_to_series(&mut self, series_id: SeriesId) -> Result<Series> {
        let ids: Vec<PlayerId> = self.store.all_players()?.iter().map(|p| p.id).collect();
        self.store.add_players_to_series(series_id, &ids)
    }

    /// Sum of lost games of the other players at the player's table
    pub fn opponents_lost(&self, series_id: SeriesId, player_id: PlayerId) -> Result<u64> {
        let results = self.store.results_for_series(series_id)?;
        let tables = self.store.tables_for_series(series_id)?;
        EvaluationContext::new(&self.rules, &results, &tables)?
            .opponents_lost(ResultKey::new(series_id, player_id))
    }

    pub fn evaluate_results(&self) -> Result<Vec<EvaluationRow>> {
        let results = self.store.all_results()?;
        let tables = self.store.all_tables()?;
        evaluation::evaluate_results(&results, &tables, &self.rules)
    }

    pub fn evaluate_series(&self, series_id: SeriesId) -> Result<Vec<EvaluationRow>> {
        self.store.get_series(series_id)?;
        let results = self.store.results_for_series(series_id)?;
        let tables = self.store.tables_for_series(series_id)?;
        evaluation::evaluate_results(&results, &tables, &self.rules)
    }

    pub fn evaluate_total(&self) -> Result<TotalsTable> {
        evaluation::evaluate_total(&self.evaluate_results()?)
    }

    /// Remove a series together with its tables and results
    ///
    /// The series goes last, so a failure part way leaves it in place to retry.
    pub fn remove_series(&mut self, series_id: SeriesId) -> Result<()> {
        self.store.get_series(series_id)?;
        self.store.clear_tables_for_series(series_id)?;
        self.store.clear_results_for_series(series_id)?;
        self.store.remove_series(series_id)?;
        info!("Removed series {} with its tables and results", series_id);
        Ok(())
    }

    /// Everything that still points at a player: results, seatings, rosters
    fn player_references(
        &self,
        player_id: PlayerId,
    ) -> Result<(Vec<ResultKey>, Vec<Table>, Vec<SeriesId>)> {
        let results = self
            .store
            .all_results()?
            .into_iter()
            .filter(|r| r.player_id == player_id)
            .map(|r| r.key())
            .collect();
        let tables = self
            .store
            .all_tables()?
            .into_iter()
            .filter(|t| t.contains(player_id))
            .collect();
        let series = self
            .store
            .all_series()?
            .into_iter()
            .filter(|s| s.has_player(player_id))
            .map(|s| s.id)
            .collect();
        Ok((results, tables, series))
    }

    /// Remove a player that nothing refers to any more
    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<()> {
        self.store.get_player(player_id)?;
        let (results, tables, series) = self.player_references(player_id)?;
        if !results.is_empty() || !tables.is_empty() || !series.is_empty() {
            return Err(SkatError::InvalidInput(format!(
                "player {} is still referenced by {} results, {} tables and {} series rosters",
                player_id,
                results.len(),
                tables.len(),
                series.len()
            )));
        }
        self.store.remove_player(player_id)
    }

    /// Remove a player with their results and roster entries
    ///
    /// The player leaves every 4-seat table they sit at, which keeps a valid
    /// 3-seat table for the others. A 3-seat table cannot shrink, so the
    /// call fails with `InvalidInput` before changing anything and the
    /// series has to be reshuffled first.
    pub fn remove_player_cascade(&mut self, player_id: PlayerId) -> Result<()> {
        self.store.get_player(player_id)?;
        let (results, tables, series) = self.player_references(player_id)?;

        let blocking: Vec<String> = tables
            .iter()
            .filter(|t| t.size() <= MIN_TABLE_SIZE)
            .map(|t| t.key().to_string())
            .collect();
        if !blocking.is_empty() {
            return Err(SkatError::InvalidInput(format!(
                "player {} sits at 3-seat tables {}, reshuffle those series first",
                player_id,
                blocking.join(", ")
            )));
        }

        for key in results {
            self.store.remove_result(key)?;
        }
        for table in &tables {
            let remaining: Vec<PlayerId> = table.opponents(player_id).collect();
            self.store.update_table(
                table.key(),
                TableUpdate {
                    player_ids: Some(remaining),
                    ..Default::default()
                },
            )?;
        }
        for id in series {
            self.store.remove_players_from_series(id, &[player_id])?;
        }
        if !tables.is_empty() {
            info!(
                "Player {} left {} tables, which now seat three",
                player_id,
                tables.len()
            );
        }
        self.store.remove_player(player_id)
    }

    /// Fill the store with random players, series, tables and results
    pub fn populate_demo_data<R: Rng>(
        &mut self,
        player_count: usize,
        series_count: usize,
        rng: &mut R,
    ) -> Result<()> {
        shuffle::table_sizes(player_count)?;

        for i in 1..=player_count {
            self.store.add_player(NewPlayer::new(format!("Player {}", i)))?;
        }

        let start = Local::now().date_naive().and_time(NaiveTime::MIN);
        for i in 0..series_count {
            let date = start + Duration::weeks(i as i64);
            let series = self
                .store
                .add_series(NewSeries::new(format!("Series {}", i + 1), date))?;
            self.add_all_players_to_series(series.id)?;
            let tables = self.shuffle_series_roster(series.id, rng)?;

            for table in &tables {
                // Every game has exactly one declarer who wins or loses it
                let games = rng.random_range(8..=16);
                for &player_id in table.player_ids() {
                    let won = rng.random_range(0..=games / 2);
                    let lost = rng.random_range(0..=games / 4);
                    let points = i64::from(won) * rng.random_range(20..=60)
                        - i64::from(lost) * rng.random_range(40..=100);
                    self.store
                        .add_result(GameResult::new(series.id, player_id, points, won, lost))?;
                }
            }
        }

        info!(
            "Added demo data: {} players in {} series",
            player_count, series_count
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableKey;
    use crate::store::{
        MemoryStore, PlayerRepository, ResultRepository, SeriesRepository, TableRepository,
    };
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tournament(players: usize) -> Tournament<MemoryStore> {
        let mut store = MemoryStore::new();
        for i in 1..=players {
            store.add_player(NewPlayer::new(format!("P{}", i))).unwrap();
        }
        let date = NaiveDate::from_ymd_opt(2024, 2, 4).unwrap().and_time(NaiveTime::MIN);
        store.add_series(NewSeries::new("Nr1", date)).unwrap();
        Tournament::new(store)
    }

    #[test]
    fn test_shuffle_replaces_previous_tables() {
        let mut t = tournament(10);
        let mut rng = StdRng::seed_from_u64(3);

        t.shuffle_tables(1, &SelectionPolicy::default(), &mut rng).unwrap();
        let tables = t.shuffle_tables(1, &SelectionPolicy::default(), &mut rng).unwrap();

        assert_eq!(tables.len(), 3);
        assert_eq!(t.store().tables_for_series(1).unwrap(), tables);
    }

    #[test]
    fn test_failed_shuffle_keeps_tables() {
        let mut t = tournament(7);
        let mut rng = StdRng::seed_from_u64(3);
        let before = t.shuffle_tables(1, &SelectionPolicy::default(), &mut rng).unwrap();

        let policy = SelectionPolicy::default().with_exclude([1, 2]);
        let err = t.shuffle_tables(1, &policy, &mut rng).unwrap_err();
        assert!(matches!(err, SkatError::InvalidInput(_)));
        assert_eq!(t.store().tables_for_series(1).unwrap(), before);
    }

    #[test]
    fn test_shuffle_unknown_series() {
        let mut t = tournament(4);
        let mut rng = StdRng::seed_from_u64(3);
        let err = t
            .shuffle_tables(9, &SelectionPolicy::default(), &mut rng)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_shuffle_empty_roster() {
        let mut t = tournament(4);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(t.shuffle_series_roster(1, &mut rng).is_err());

        t.store_mut().add_players_to_series(1, &[1, 2, 3]).unwrap();
        let tables = t.shuffle_series_roster(1, &mut rng).unwrap();
        assert_eq!(tables.len(), 1);
        assert!(!tables[0].contains(4));
    }

    #[test]
    fn test_remove_player_policy() {
        let mut t = tournament(4);
        t.store_mut().add_result(GameResult::new(1, 2, 10, 1, 0)).unwrap();

        let err = t.remove_player(2).unwrap_err();
        assert!(matches!(err, SkatError::InvalidInput(_)));
        t.remove_player(3).unwrap();

        t.remove_player_cascade(2).unwrap();
        assert!(t.store().get_player(2).unwrap_err().is_not_found());
        assert!(t.store().all_results().unwrap().is_empty());
    }

    #[test]
    fn test_cascade_keeps_table_mates_seated() {
        let mut t = tournament(4);
        t.store_mut()
            .add_table(Table::new(1, 1, vec![1, 2, 3, 4]).unwrap())
            .unwrap();
        for p in 1..=4 {
            t.store_mut()
                .add_result(GameResult::new(1, p, 10, 1, p))
                .unwrap();
        }

        t.remove_player_cascade(4).unwrap();
        let table = t.store().get_table(TableKey::new(1, 1)).unwrap();
        assert_eq!(table.player_ids(), &[1, 2, 3]);

        let rows = t.evaluate_results().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.table_size == 3));
        assert_eq!(rows[0].opponents_lost, 5);
    }

    #[test]
    fn test_cascade_refuses_three_seat_table() {
        let mut t = tournament(4);
        t.store_mut()
            .add_table(Table::new(1, 1, vec![1, 2, 3]).unwrap())
            .unwrap();
        t.store_mut().add_result(GameResult::new(1, 3, 10, 1, 0)).unwrap();

        let err = t.remove_player_cascade(3).unwrap_err();
        assert!(matches!(err, SkatError::InvalidInput(_)));
        assert!(t.store().get_player(3).is_ok());
        assert!(t.store().get_result(ResultKey::new(1, 3)).is_ok());
        assert_eq!(t.store().get_table(TableKey::new(1, 1)).unwrap().size(), 3);
    }

    #[test]
    fn test_opponents_lost_missing_result_counts_zero() {
        let mut t = tournament(4);
        t.store_mut()
            .add_table(Table::new(1, 1, vec![1, 2, 3, 4]).unwrap())
            .unwrap();
        t.store_mut().add_result(GameResult::new(1, 2, 0, 0, 2)).unwrap();
        t.store_mut().add_result(GameResult::new(1, 3, 0, 0, 5)).unwrap();

        assert_eq!(t.opponents_lost(1, 1).unwrap(), 7);
        assert_eq!(t.opponents_lost(1, 2).unwrap(), 5);
        let err = t.opponents_lost(2, 1).unwrap_err();
        assert!(matches!(err, SkatError::DataInconsistency(_)));
    }

    #[test]
    fn test_remove_unknown_series_touches_nothing() {
        let mut t = tournament(4);
        t.store_mut()
            .add_table(Table::new(9, 1, vec![1, 2, 3]).unwrap())
            .unwrap();
        t.store_mut().add_result(GameResult::new(9, 1, 10, 1, 0)).unwrap();

        assert!(t.remove_series(9).unwrap_err().is_not_found());
        assert_eq!(t.store().tables_for_series(9).unwrap().len(), 1);
        assert_eq!(t.store().results_for_series(9).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_series_cascades() {
        let mut t = tournament(4);
        let mut rng = StdRng::seed_from_u64(3);
        t.shuffle_tables(1, &SelectionPolicy::default(), &mut rng).unwrap();
        t.store_mut().add_result(GameResult::new(1, 1, 10, 1, 0)).unwrap();

        t.remove_series(1).unwrap();
        assert!(t.store().all_tables().unwrap().is_empty());
        assert!(t.store().all_results().unwrap().is_empty());
    }

    #[test]
    fn test_demo_data_evaluates() {
        let mut t = Tournament::new(MemoryStore::new());
        let mut rng = StdRng::seed_from_u64(11);
        t.populate_demo_data(13, 3, &mut rng).unwrap();

        let rows = t.evaluate_results().unwrap();
        assert_eq!(rows.len(), 39);
        let totals = t.evaluate_total().unwrap();
        assert_eq!(totals.rows.len(), 13);
        assert_eq!(totals.series_ids, vec![1, 2, 3]);
    }
}
