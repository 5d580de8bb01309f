//! CSV-file persistence for tournament data
//!
//! A data directory holds one CSV file per entity. The whole directory is
//! loaded on open; every mutation rewrites the file(s) it touched through a
//! temporary file that is renamed over the target, so a concurrent reader
//! sees either the old or the new content of a file, never a partial one.
//! Mutations spanning two files (series and roster) are not atomic as a pair.

use super::memory::MemoryStore;
use super::rows::{
    series_player_rows, PlayerRow, ResultRow, SeriesPlayerRow, SeriesRow, TableRow,
};
use super::{PlayerRepository, ResultRepository, SeriesRepository, TableRepository};
use crate::error::{Result, SkatError};
use crate::model::{
    GameResult, NewPlayer, NewSeries, Player, PlayerId, PlayerUpdate, ResultKey, ResultUpdate,
    Series, SeriesId, SeriesUpdate, Table, TableKey, TableUpdate,
};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const PLAYERS_FILE: &str = "players.csv";
const SERIES_FILE: &str = "series.csv";
const SERIES_PLAYERS_FILE: &str = "series_players.csv";
const TABLES_FILE: &str = "tables.csv";
const RESULTS_FILE: &str = "results.csv";

/// A [`MemoryStore`] mirrored to CSV files in a directory
#[derive(Debug)]
pub struct CsvStore {
    dir: PathBuf,
    inner: MemoryStore,
}

impl CsvStore {
    /// Open a data directory, creating it if it does not exist yet
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut inner = MemoryStore::new();

        for row in read_rows::<PlayerRow>(&dir, PLAYERS_FILE)? {
            inner.players.insert(row.id, row.into());
        }

        let mut rosters: BTreeMap<SeriesId, Vec<SeriesPlayerRow>> = BTreeMap::new();
        for row in read_rows::<SeriesPlayerRow>(&dir, SERIES_PLAYERS_FILE)? {
            rosters.entry(row.series_id).or_default().push(row);
        }

        for row in read_rows::<SeriesRow>(&dir, SERIES_FILE)? {
            let mut roster = rosters.remove(&row.id).unwrap_or_default();
            roster.sort_by_key(|r| r.position);
            let player_ids = roster.into_iter().map(|r| r.player_id).collect();
            inner.series.insert(row.id, row.into_series(player_ids));
        }

        for row in read_rows::<TableRow>(&dir, TABLES_FILE)? {
            let key = TableKey::new(row.series_id, row.table_id);
            let table = row.into_table().map_err(|e| {
                SkatError::DataInconsistency(format!("{} in {}: {}", key, TABLES_FILE, e))
            })?;
            inner.tables.insert(key, table);
        }

        for row in read_rows::<ResultRow>(&dir, RESULTS_FILE)? {
            let result: GameResult = row.into();
            inner.results.insert(result.key(), result);
        }

        info!(
            "Loaded {} players, {} series, {} tables, {} results from {}",
            inner.players.len(),
            inner.series.len(),
            inner.tables.len(),
            inner.results.len(),
            dir.display()
        );

        Ok(Self { dir, inner })
    }

    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    fn save_players(&self) -> Result<()> {
        write_rows(&self.dir, PLAYERS_FILE, self.inner.players.values().map(PlayerRow::from))
    }

    fn save_series(&self) -> Result<()> {
        write_rows(&self.dir, SERIES_FILE, self.inner.series.values().map(SeriesRow::from))?;
        write_rows(
            &self.dir,
            SERIES_PLAYERS_FILE,
            self.inner.series.values().flat_map(series_player_rows),
        )
    }

    fn save_tables(&self) -> Result<()> {
        write_rows(&self.dir, TABLES_FILE, self.inner.tables.values().map(TableRow::from))
    }

    fn save_results(&self) -> Result<()> {
        write_rows(&self.dir, RESULTS_FILE, self.inner.results.values().map(ResultRow::from))
    }
}

/// Read all records of a file, a missing file has no records
fn read_rows<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>> {
    let path = dir.join(name);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(&path)?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Write records to a temporary file and rename it over `name`
fn write_rows<T, I>(dir: &Path, name: &str, rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let path = dir.join(name);
    let mut tmp = NamedTempFile::new_in(dir)?;
    let mut count = 0;
    {
        let mut writer = csv::Writer::from_writer(&mut tmp);
        for row in rows {
            writer.serialize(row)?;
            count += 1;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| SkatError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;
    debug!("Wrote {} rows to {}", count, path.display());
    Ok(())
}

impl PlayerRepository for CsvStore {
    fn get_player(&self, id: PlayerId) -> Result<Player> {
        self.inner.get_player(id)
    }

    fn all_players(&self) -> Result<Vec<Player>> {
        self.inner.all_players()
    }

    fn add_player(&mut self, player: NewPlayer) -> Result<Player> {
        let player = self.inner.add_player(player)?;
        self.save_players()?;
        Ok(player)
    }

    fn update_player(&mut self, id: PlayerId, update: PlayerUpdate) -> Result<Player> {
        let player = self.inner.update_player(id, update)?;
        self.save_players()?;
        Ok(player)
    }

    fn remove_player(&mut self, id: PlayerId) -> Result<()> {
        self.inner.remove_player(id)?;
        self.save_players()
    }
}

impl SeriesRepository for CsvStore {
    fn get_series(&self, id: SeriesId) -> Result<Series> {
        self.inner.get_series(id)
    }

    fn all_series(&self) -> Result<Vec<Series>> {
        self.inner.all_series()
    }

    fn add_series(&mut self, series: NewSeries) -> Result<Series> {
        let series = self.inner.add_series(series)?;
        self.save_series()?;
        Ok(series)
    }

    fn update_series(&mut self, id: SeriesId, update: SeriesUpdate) -> Result<Series> {
        let series = self.inner.update_series(id, update)?;
        self.save_series()?;
        Ok(series)
    }

    fn remove_series(&mut self, id: SeriesId) -> Result<()> {
        self.inner.remove_series(id)?;
        self.save_series()
    }

    fn add_players_to_series(&mut self, id: SeriesId, player_ids: &[PlayerId]) -> Result<Series> {
        let series = self.inner.add_players_to_series(id, player_ids)?;
        self.save_series()?;
        Ok(series)
    }

    fn remove_players_from_series(
        &mut self,
        id: SeriesId,
        player_ids: &[PlayerId],
    ) -> Result<Series> {
        let series = self.inner.remove_players_from_series(id, player_ids)?;
        self.save_series()?;
        Ok(series)
    }

    fn clear_series_players(&mut self, id: SeriesId) -> Result<Series> {
        let series = self.inner.clear_series_players(id)?;
        self.save_series()?;
        Ok(series)
    }
}

impl TableRepository for CsvStore {
    fn get_table(&self, key: TableKey) -> Result<Table> {
        self.inner.get_table(key)
    }

    fn all_tables(&self) -> Result<Vec<Table>> {
        self.inner.all_tables()
    }

    fn tables_for_series(&self, series_id: SeriesId) -> Result<Vec<Table>> {
        self.inner.tables_for_series(series_id)
    }

    fn add_table(&mut self, table: Table) -> Result<Table> {
        let table = self.inner.add_table(table)?;
        self.save_tables()?;
        Ok(table)
    }

    fn update_table(&mut self, key: TableKey, update: TableUpdate) -> Result<Table> {
        let table = self.inner.update_table(key, update)?;
        self.save_tables()?;
        Ok(table)
    }

    fn remove_table(&mut self, key: TableKey) -> Result<()> {
        self.inner.remove_table(key)?;
        self.save_tables()
    }

    fn clear_tables_for_series(&mut self, series_id: SeriesId) -> Result<()> {
        self.inner.clear_tables_for_series(series_id)?;
        self.save_tables()
    }

    fn replace_tables_for_series(
        &mut self,
        series_id: SeriesId,
        tables: Vec<Table>,
    ) -> Result<()> {
        // A failed write must leave the loaded state matching the file
        let previous = self.inner.tables.clone();

        let outcome = self
            .inner
            .replace_tables_for_series(series_id, tables)
            .and_then(|()| self.save_tables());

        if outcome.is_err() {
            self.inner.tables = previous;
        }
        outcome
    }
}

impl ResultRepository for CsvStore {
    fn get_result(&self, key: ResultKey) -> Result<GameResult> {
        self.inner.get_result(key)
    }

    fn all_results(&self) -> Result<Vec<GameResult>> {
        self.inner.all_results()
    }

    fn results_for_series(&self, series_id: SeriesId) -> Result<Vec<GameResult>> {
        self.inner.results_for_series(series_id)
    }

    fn add_result(&mut self, result: GameResult) -> Result<GameResult> {
        let result = self.inner.add_result(result)?;
        self.save_results()?;
        Ok(result)
    }

    fn update_result(&mut self, key: ResultKey, update: ResultUpdate) -> Result<GameResult> {
        let result = self.inner.update_result(key, update)?;
        self.save_results()?;
        Ok(result)
    }

    fn remove_result(&mut self, key: ResultKey) -> Result<()> {
        self.inner.remove_result(key)?;
        self.save_results()
    }

    fn clear_results_for_series(&mut self, series_id: SeriesId) -> Result<()> {
        self.inner.clear_results_for_series(series_id)?;
        self.save_results()
    }
}
