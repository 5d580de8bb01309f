use super::player::PlayerId;
use super::series::SeriesId;
use crate::error::{Result, SkatError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TableId = u32;

/// Smallest and largest number of seats at a Skat table
pub const MIN_TABLE_SIZE: usize = 3;
pub const MAX_TABLE_SIZE: usize = 4;

/// Identifies a table within its series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableKey {
    pub series_id: SeriesId,
    pub table_id: TableId,
}

impl TableKey {
    pub fn new(series_id: SeriesId, table_id: TableId) -> Self {
        Self { series_id, table_id }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.series_id, self.table_id)
    }
}

/// A seating group of three or four players within one series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub series_id: SeriesId,
    pub table_id: TableId,
    player_ids: Vec<PlayerId>,
    pub remarks: String,
}

impl Table {
    /// Build a table, rejecting sizes outside 3..=4 and repeated players
    pub fn new(series_id: SeriesId, table_id: TableId, player_ids: Vec<PlayerId>) -> Result<Self> {
        validate_seating(&player_ids)?;
        Ok(Self {
            series_id,
            table_id,
            player_ids,
            remarks: String::new(),
        })
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    pub fn key(&self) -> TableKey {
        TableKey::new(self.series_id, self.table_id)
    }

    pub fn player_ids(&self) -> &[PlayerId] {
        &self.player_ids
    }

    pub fn size(&self) -> usize {
        self.player_ids.len()
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.player_ids.contains(&player_id)
    }

    /// Everyone at the table except `player_id`
    pub fn opponents(&self, player_id: PlayerId) -> impl Iterator<Item = PlayerId> + '_ {
        self.player_ids.iter().copied().filter(move |&p| p != player_id)
    }

    pub(crate) fn set_player_ids(&mut self, player_ids: Vec<PlayerId>) -> Result<()> {
        validate_seating(&player_ids)?;
        self.player_ids = player_ids;
        Ok(())
    }
}

fn validate_seating(player_ids: &[PlayerId]) -> Result<()> {
    if !(MIN_TABLE_SIZE..=MAX_TABLE_SIZE).contains(&player_ids.len()) {
        return Err(SkatError::InvalidInput(format!(
            "table size must be 3 or 4, but was {}",
            player_ids.len()
        )));
    }

    for (i, id) in player_ids.iter().enumerate() {
        if player_ids[..i].contains(id) {
            return Err(SkatError::InvalidInput(format!(
                "player {} is seated twice at the same table",
                id
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct TableUpdate {
    pub player_ids: Option<Vec<PlayerId>>,
    pub remarks: Option<String>,
}

impl TableUpdate {
    pub fn apply(self, table: &mut Table) -> Result<()> {
        if let Some(player_ids) = self.player_ids {
            table.set_player_ids(player_ids)?;
        }
        if let Some(remarks) = self.remarks {
            table.remarks = remarks;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size_bounds() {
        assert!(Table::new(1, 1, vec![1, 2, 3]).is_ok());
        assert!(Table::new(1, 1, vec![1, 2, 3, 4]).is_ok());

        let err = Table::new(1, 1, vec![1, 2]).unwrap_err();
        assert!(matches!(err, SkatError::InvalidInput(_)));

        let err = Table::new(1, 1, vec![1, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(err, SkatError::InvalidInput(_)));
    }

    #[test]
    fn test_duplicate_player_rejected() {
        let err = Table::new(1, 1, vec![1, 2, 2]).unwrap_err();
        assert!(matches!(err, SkatError::InvalidInput(_)));
    }

    #[test]
    fn test_opponents_excludes_self() {
        let table = Table::new(2, 1, vec![1, 3, 4, 7]).unwrap();
        let opponents: Vec<_> = table.opponents(3).collect();
        assert_eq!(opponents, vec![1, 4, 7]);
        assert_eq!(table.key(), TableKey::new(2, 1));
        assert_eq!(table.key().to_string(), "2/1");
    }

    #[test]
    fn test_update_revalidates_players() {
        let mut table = Table::new(1, 1, vec![1, 2, 3]).unwrap();
        let update = TableUpdate {
            player_ids: Some(vec![1]),
            remarks: None,
        };
        assert!(update.apply(&mut table).is_err());
        assert_eq!(table.player_ids(), &[1, 2, 3]);
    }
}
