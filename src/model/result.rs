use super::player::PlayerId;
use super::series::SeriesId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the single result a player has in a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultKey {
    pub series_id: SeriesId,
    pub player_id: PlayerId,
}

impl ResultKey {
    pub fn new(series_id: SeriesId, player_id: PlayerId) -> Self {
        Self { series_id, player_id }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.series_id, self.player_id)
    }
}

/// A player's raw tally for one series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub series_id: SeriesId,
    pub player_id: PlayerId,
    pub points: i64,
    pub won: u32,
    pub lost: u32,
    pub remarks: String,
}

impl GameResult {
    pub fn new(series_id: SeriesId, player_id: PlayerId, points: i64, won: u32, lost: u32) -> Self {
        Self {
            series_id,
            player_id,
            points,
            won,
            lost,
            remarks: String::new(),
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    pub fn key(&self) -> ResultKey {
        ResultKey::new(self.series_id, self.player_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultUpdate {
    pub points: Option<i64>,
    pub won: Option<u32>,
    pub lost: Option<u32>,
    pub remarks: Option<String>,
}

impl ResultUpdate {
    pub fn apply(self, result: &mut GameResult) {
        if let Some(points) = self.points {
            result.points = points;
        }
        if let Some(won) = self.won {
            result.won = won;
        }
        if let Some(lost) = self.lost {
            result.lost = lost;
        }
        if let Some(remarks) = self.remarks {
            result.remarks = remarks;
        }
    }
}
