use serde::{Deserialize, Serialize};
use std::fmt;

pub type PlayerId = u32;

/// A registered tournament player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub active: bool,
    pub remarks: String,
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Data for a player that has no ID yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub name: String,
    pub active: bool,
    pub remarks: String,
}

impl NewPlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            remarks: String::new(),
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    pub fn into_player(self, id: PlayerId) -> Player {
        Player {
            id,
            name: self.name,
            active: self.active,
            remarks: self.remarks,
        }
    }
}

/// Partial player update, only `Some` fields are applied
#[derive(Debug, Clone, Default)]
pub struct PlayerUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub remarks: Option<String>,
}

impl PlayerUpdate {
    pub fn apply(self, player: &mut Player) {
        if let Some(name) = self.name {
            player.name = name;
        }
        if let Some(active) = self.active {
            player.active = active;
        }
        if let Some(remarks) = self.remarks {
            player.remarks = remarks;
        }
    }
}
