use super::{
    player_not_found, result_not_found, series_not_found, table_not_found, PlayerRepository,
    ResultRepository, SeriesRepository, TableRepository,
};
use crate::error::{Result, SkatError};
use crate::model::{
    GameResult, NewPlayer, NewSeries, Player, PlayerId, PlayerUpdate, ResultKey, ResultUpdate,
    Series, SeriesId, SeriesUpdate, Table, TableKey, TableUpdate,
};
use std::collections::{BTreeMap, HashSet};

/// In-memory store keyed by ID, iteration is always in key order
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) series: BTreeMap<SeriesId, Series>,
    pub(crate) tables: BTreeMap<TableKey, Table>,
    pub(crate) results: BTreeMap<ResultKey, GameResult>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id<V>(map: &BTreeMap<u32, V>) -> u32 {
        map.keys().next_back().map_or(1, |id| id + 1)
    }

    fn series_mut(&mut self, id: SeriesId) -> Result<&mut Series> {
        self.series.get_mut(&id).ok_or_else(|| series_not_found(id))
    }

    /// Fail if any player of `table` already sits at another table of its series
    fn check_not_seated_elsewhere(&self, table: &Table) -> Result<()> {
        let clash = self
            .tables
            .range(TableKey::new(table.series_id, 0)..=TableKey::new(table.series_id, u32::MAX))
            .map(|(_, t)| t)
            .filter(|t| t.table_id != table.table_id)
            .find_map(|t| table.player_ids().iter().find(|&&p| t.contains(p)).map(|&p| (p, t)));

        match clash {
            Some((player_id, other)) => Err(SkatError::InvalidInput(format!(
                "player {} is already seated at table {}",
                player_id,
                other.key()
            ))),
            None => Ok(()),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SkatError::InvalidInput("player name must not be empty".to_string()));
    }
    Ok(())
}

impl PlayerRepository for MemoryStore {
    fn get_player(&self, id: PlayerId) -> Result<Player> {
        self.players.get(&id).cloned().ok_or_else(|| player_not_found(id))
    }

    fn all_players(&self) -> Result<Vec<Player>> {
        Ok(self.players.values().cloned().collect())
    }

    fn add_player(&mut self, player: NewPlayer) -> Result<Player> {
        validate_name(&player.name)?;
        let player = player.into_player(Self::next_id(&self.players));
        self.players.insert(player.id, player.clone());
        Ok(player)
    }

    fn update_player(&mut self, id: PlayerId, update: PlayerUpdate) -> Result<Player> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        let player = self.players.get_mut(&id).ok_or_else(|| player_not_found(id))?;
        update.apply(player);
        Ok(player.clone())
    }

    fn remove_player(&mut self, id: PlayerId) -> Result<()> {
        self.players.remove(&id).map(|_| ()).ok_or_else(|| player_not_found(id))
    }
}

impl SeriesRepository for MemoryStore {
    fn get_series(&self, id: SeriesId) -> Result<Series> {
        self.series.get(&id).cloned().ok_or_else(|| series_not_found(id))
    }

    fn all_series(&self) -> Result<Vec<Series>> {
        Ok(self.series.values().cloned().collect())
    }

    fn add_series(&mut self, series: NewSeries) -> Result<Series> {
        let series = series.into_series(Self::next_id(&self.series));
        self.series.insert(series.id, series.clone());
        Ok(series)
    }

    fn update_series(&mut self, id: SeriesId, update: SeriesUpdate) -> Result<Series> {
        let series = self.series_mut(id)?;
        update.apply(series);
        Ok(series.clone())
    }

    fn remove_series(&mut self, id: SeriesId) -> Result<()> {
        self.series.remove(&id).map(|_| ()).ok_or_else(|| series_not_found(id))
    }

    fn add_players_to_series(&mut self, id: SeriesId, player_ids: &[PlayerId]) -> Result<Series> {
        let series = self.series_mut(id)?;
        series.add_players(player_ids);
        Ok(series.clone())
    }

    fn remove_players_from_series(
        &mut self,
        id: SeriesId,
        player_ids: &[PlayerId],
    ) -> Result<Series> {
        let series = self.series_mut(id)?;
        series.remove_players(player_ids);
        Ok(series.clone())
    }

    fn clear_series_players(&mut self, id: SeriesId) -> Result<Series> {
        let series = self.series_mut(id)?;
        series.player_ids.clear();
        Ok(series.clone())
    }
}

impl TableRepository for MemoryStore {
    fn get_table(&self, key: TableKey) -> Result<Table> {
        self.tables.get(&key).cloned().ok_or_else(|| table_not_found(key))
    }

    fn all_tables(&self) -> Result<Vec<Table>> {
        Ok(self.tables.values().cloned().collect())
    }

    fn tables_for_series(&self, series_id: SeriesId) -> Result<Vec<Table>> {
        Ok(self
            .tables
            .values()
            .filter(|t| t.series_id == series_id)
            .cloned()
            .collect())
    }

    fn add_table(&mut self, table: Table) -> Result<Table> {
        if self.tables.contains_key(&table.key()) {
            return Err(SkatError::InvalidInput(format!(
                "a table with the given IDs {} already exists",
                table.key()
            )));
        }
        self.check_not_seated_elsewhere(&table)?;
        self.tables.insert(table.key(), table.clone());
        Ok(table)
    }

    fn update_table(&mut self, key: TableKey, update: TableUpdate) -> Result<Table> {
        let mut table = self.get_table(key)?;
        update.apply(&mut table)?;
        self.check_not_seated_elsewhere(&table)?;
        self.tables.insert(key, table.clone());
        Ok(table)
    }

    fn remove_table(&mut self, key: TableKey) -> Result<()> {
        self.tables.remove(&key).map(|_| ()).ok_or_else(|| table_not_found(key))
    }

    fn clear_tables_for_series(&mut self, series_id: SeriesId) -> Result<()> {
        self.tables.retain(|key, _| key.series_id != series_id);
        Ok(())
    }

    fn replace_tables_for_series(
        &mut self,
        series_id: SeriesId,
        tables: Vec<Table>,
    ) -> Result<()> {
        // Validate the whole batch before touching the map
        let mut table_ids = HashSet::new();
        let mut seated = HashSet::new();
        for table in &tables {
            if table.series_id != series_id {
                return Err(SkatError::InvalidInput(format!(
                    "table {} does not belong to series {}",
                    table.key(),
                    series_id
                )));
            }
            if !table_ids.insert(table.table_id) {
                return Err(SkatError::InvalidInput(format!(
                    "table {} given twice",
                    table.key()
                )));
            }
            if let Some(p) = table.player_ids().iter().find(|&&p| !seated.insert(p)) {
                return Err(SkatError::InvalidInput(format!(
                    "player {} is seated at more than one table",
                    p
                )));
            }
        }

        self.clear_tables_for_series(series_id)?;
        self.tables
            .extend(tables.into_iter().map(|table| (table.key(), table)));
        Ok(())
    }
}

impl ResultRepository for MemoryStore {
    fn get_result(&self, key: ResultKey) -> Result<GameResult> {
        self.results.get(&key).cloned().ok_or_else(|| result_not_found(key))
    }

    fn all_results(&self) -> Result<Vec<GameResult>> {
        Ok(self.results.values().cloned().collect())
    }

    fn results_for_series(&self, series_id: SeriesId) -> Result<Vec<GameResult>> {
        Ok(self
            .results
            .values()
            .filter(|r| r.series_id == series_id)
            .cloned()
            .collect())
    }

    fn add_result(&mut self, result: GameResult) -> Result<GameResult> {
        if self.results.contains_key(&result.key()) {
            return Err(SkatError::InvalidInput(format!(
                "a result with the given IDs {} already exists",
                result.key()
            )));
        }
        self.results.insert(result.key(), result.clone());
        Ok(result)
    }

    fn update_result(&mut self, key: ResultKey, update: ResultUpdate) -> Result<GameResult> {
        let result = self.results.get_mut(&key).ok_or_else(|| result_not_found(key))?;
        update.apply(result);
        Ok(result.clone())
    }

    fn remove_result(&mut self, key: ResultKey) -> Result<()> {
        self.results.remove(&key).map(|_| ()).ok_or_else(|| result_not_found(key))
    }

    fn clear_results_for_series(&mut self, series_id: SeriesId) -> Result<()> {
        self.results.retain(|key, _| key.series_id != series_id);
        Ok(())
    }
}
