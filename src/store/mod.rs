//! Repository traits over players, series, tables and results
//!
//! The shuffler and the evaluation engine only talk to these traits. Two
//! implementations exist: [`MemoryStore`] keeps everything in ordered maps,
//! [`CsvStore`] mirrors a `MemoryStore` into CSV files in a data directory.

pub mod csv_store;
pub mod memory;
pub mod rows;

pub use csv_store::CsvStore;
pub use memory::MemoryStore;

use crate::error::{Result, SkatError};
use crate::model::{
    GameResult, NewPlayer, NewSeries, Player, PlayerId, PlayerUpdate, ResultKey, ResultUpdate,
    Series, SeriesId, SeriesUpdate, Table, TableKey, TableUpdate,
};

pub trait PlayerRepository {
    fn get_player(&self, id: PlayerId) -> Result<Player>;
    fn all_players(&self) -> Result<Vec<Player>>;
    fn add_player(&mut self, player: NewPlayer) -> Result<Player>;
    fn update_player(&mut self, id: PlayerId, update: PlayerUpdate) -> Result<Player>;
    fn remove_player(&mut self, id: PlayerId) -> Result<()>;
}

pub trait SeriesRepository {
    fn get_series(&self, id: SeriesId) -> Result<Series>;
    fn all_series(&self) -> Result<Vec<Series>>;
    fn add_series(&mut self, series: NewSeries) -> Result<Series>;
    fn update_series(&mut self, id: SeriesId, update: SeriesUpdate) -> Result<Series>;
    fn remove_series(&mut self, id: SeriesId) -> Result<()>;
    fn add_players_to_series(&mut self, id: SeriesId, player_ids: &[PlayerId]) -> Result<Series>;
    fn remove_players_from_series(&mut self, id: SeriesId, player_ids: &[PlayerId])
        -> Result<Series>;
    fn clear_series_players(&mut self, id: SeriesId) -> Result<Series>;
}

pub trait TableRepository {
    fn get_table(&self, key: TableKey) -> Result<Table>;
    fn all_tables(&self) -> Result<Vec<Table>>;
    fn tables_for_series(&self, series_id: SeriesId) -> Result<Vec<Table>>;
    fn add_table(&mut self, table: Table) -> Result<Table>;
    fn update_table(&mut self, key: TableKey, update: TableUpdate) -> Result<Table>;
    fn remove_table(&mut self, key: TableKey) -> Result<()>;
    fn clear_tables_for_series(&mut self, series_id: SeriesId) -> Result<()>;

    /// Drop every table of the series and insert `tables` as one replacement.
    ///
    /// Readers observe either the previous tables or the new ones.
    fn replace_tables_for_series(&mut self, series_id: SeriesId, tables: Vec<Table>)
        -> Result<()>;

    /// The table a player sits at in a series
    fn table_with_player(&self, series_id: SeriesId, player_id: PlayerId) -> Result<Table> {
        self.tables_for_series(series_id)?
            .into_iter()
            .find(|t| t.contains(player_id))
            .ok_or_else(|| {
                SkatError::DataInconsistency(format!(
                    "a table with player {} is not present in series {}",
                    player_id, series_id
                ))
            })
    }
}

pub trait ResultRepository {
    fn get_result(&self, key: ResultKey) -> Result<GameResult>;
    fn all_results(&self) -> Result<Vec<GameResult>>;
    fn results_for_series(&self, series_id: SeriesId) -> Result<Vec<GameResult>>;
    fn add_result(&mut self, result: GameResult) -> Result<GameResult>;
    fn update_result(&mut self, key: ResultKey, update: ResultUpdate) -> Result<GameResult>;
    fn remove_result(&mut self, key: ResultKey) -> Result<()>;
    fn clear_results_for_series(&mut self, series_id: SeriesId) -> Result<()>;
}

/// Everything the tournament operations need from storage
pub trait Store: PlayerRepository + SeriesRepository + TableRepository + ResultRepository {}

impl<T> Store for T where T: PlayerRepository + SeriesRepository + TableRepository + ResultRepository
{}

pub(crate) fn player_not_found(id: PlayerId) -> SkatError {
    SkatError::NotFound(format!("a player with the given ID {} was not found", id))
}

pub(crate) fn series_not_found(id: SeriesId) -> SkatError {
    SkatError::NotFound(format!("a series with the given ID {} was not found", id))
}

pub(crate) fn table_not_found(key: TableKey) -> SkatError {
    SkatError::NotFound(format!("a table with the given IDs {} was not found", key))
}

pub(crate) fn result_not_found(key: ResultKey) -> SkatError {
    SkatError::NotFound(format!("a result with the given IDs {} was not found", key))
}
