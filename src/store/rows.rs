use crate::error::Result;
use crate::model::{GameResult, Player, PlayerId, Series, SeriesId, Table, TableId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A record of `players.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerRow {
    #[serde(rename = "ID")]
    pub id: PlayerId,
    pub name: String,
    pub active: bool,
    pub remarks: String,
}

/// A record of `series.csv`, the roster lives in `series_players.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SeriesRow {
    #[serde(rename = "ID")]
    pub id: SeriesId,
    pub name: String,
    pub date: NaiveDateTime,
    pub remarks: String,
}

/// Links a player to a series roster, `position` keeps roster order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SeriesPlayerRow {
    #[serde(rename = "SeriesID")]
    pub series_id: SeriesId,
    #[serde(rename = "PlayerID")]
    pub player_id: PlayerId,
    pub position: u32,
}

/// A record of `tables.csv`, `player4_id` is empty at 3-seat tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableRow {
    #[serde(rename = "SeriesID")]
    pub series_id: SeriesId,
    #[serde(rename = "TableID")]
    pub table_id: TableId,
    #[serde(rename = "Player1ID")]
    pub player1_id: PlayerId,
    #[serde(rename = "Player2ID")]
    pub player2_id: PlayerId,
    #[serde(rename = "Player3ID")]
    pub player3_id: PlayerId,
    #[serde(rename = "Player4ID")]
    pub player4_id: Option<PlayerId>,
    pub remarks: String,
}

/// A record of `results.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultRow {
    #[serde(rename = "SeriesID")]
    pub series_id: SeriesId,
    #[serde(rename = "PlayerID")]
    pub player_id: PlayerId,
    pub points: i64,
    pub won: u32,
    pub lost: u32,
    pub remarks: String,
}

impl From<&Player> for PlayerRow {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            active: p.active,
            remarks: p.remarks.clone(),
        }
    }
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Player {
            id: row.id,
            name: row.name,
            active: row.active,
            remarks: row.remarks,
        }
    }
}

impl From<&Series> for SeriesRow {
    fn from(s: &Series) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            date: s.date,
            remarks: s.remarks.clone(),
        }
    }
}

impl SeriesRow {
    pub fn into_series(self, player_ids: Vec<PlayerId>) -> Series {
        Series {
            id: self.id,
            name: self.name,
            date: self.date,
            remarks: self.remarks,
            player_ids,
        }
    }
}

/// Roster link rows of one series
pub fn series_player_rows(series: &Series) -> impl Iterator<Item = SeriesPlayerRow> + '_ {
    series
        .player_ids
        .iter()
        .enumerate()
        .map(|(i, &player_id)| SeriesPlayerRow {
            series_id: series.id,
            player_id,
            position: i as u32,
        })
}

impl From<&Table> for TableRow {
    fn from(t: &Table) -> Self {
        let ids = t.player_ids();
        Self {
            series_id: t.series_id,
            table_id: t.table_id,
            player1_id: ids[0],
            player2_id: ids[1],
            player3_id: ids[2],
            player4_id: ids.get(3).copied(),
            remarks: t.remarks.clone(),
        }
    }
}

impl TableRow {
    /// Rebuild the table, re-checking size and duplicate seats
    pub fn into_table(self) -> Result<Table> {
        let mut ids = vec![self.player1_id, self.player2_id, self.player3_id];
        ids.extend(self.player4_id);
        Ok(Table::new(self.series_id, self.table_id, ids)?.with_remarks(self.remarks))
    }
}

impl From<&GameResult> for ResultRow {
    fn from(r: &GameResult) -> Self {
        Self {
            series_id: r.series_id,
            player_id: r.player_id,
            points: r.points,
            won: r.won,
            lost: r.lost,
            remarks: r.remarks.clone(),
        }
    }
}

impl From<ResultRow> for GameResult {
    fn from(row: ResultRow) -> Self {
        GameResult {
            series_id: row.series_id,
            player_id: row.player_id,
            points: row.points,
            won: row.won,
            lost: row.lost,
            remarks: row.remarks,
        }
    }
}
