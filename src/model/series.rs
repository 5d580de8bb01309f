use super::player::PlayerId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type SeriesId = u32;

/// One tournament round, played on a given date by its roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub id: SeriesId,
    pub name: String,
    pub date: NaiveDateTime,
    pub remarks: String,
    pub player_ids: Vec<PlayerId>,
}

impl Series {
    /// Add players to the roster, keeping first-insertion order and skipping duplicates
    pub fn add_players(&mut self, player_ids: &[PlayerId]) {
        for &id in player_ids {
            if !self.player_ids.contains(&id) {
                self.player_ids.push(id);
            }
        }
    }

    pub fn remove_players(&mut self, player_ids: &[PlayerId]) {
        self.player_ids.retain(|id| !player_ids.contains(id));
    }

    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.player_ids.contains(&player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSeries {
    pub name: String,
    pub date: NaiveDateTime,
    pub remarks: String,
}

impl NewSeries {
    pub fn new(name: impl Into<String>, date: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            date,
            remarks: String::new(),
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    pub fn into_series(self, id: SeriesId) -> Series {
        Series {
            id,
            name: self.name,
            date: self.date,
            remarks: self.remarks,
            player_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeriesUpdate {
    pub name: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub remarks: Option<String>,
}

impl SeriesUpdate {
    pub fn apply(self, series: &mut Series) {
        if let Some(name) = self.name {
            series.name = name;
        }
        if let Some(date) = self.date {
            series.date = date;
        }
        if let Some(remarks) = self.remarks {
            series.remarks = remarks;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series() -> Series {
        let date = NaiveDate::from_ymd_opt(2024, 2, 4)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap();
        NewSeries::new("Nr1", date).into_series(1)
    }

    #[test]
    fn test_roster_union_suppresses_duplicates() {
        let mut s = series();
        s.add_players(&[1, 4, 6]);
        s.add_players(&[4, 2, 2]);
        assert_eq!(s.player_ids, vec![1, 4, 6, 2]);
    }

    #[test]
    fn test_roster_difference() {
        let mut s = series();
        s.add_players(&[1, 4, 6]);
        s.remove_players(&[4, 6, 9]);
        assert_eq!(s.player_ids, vec![1]);
        assert!(s.has_player(1));
        assert!(!s.has_player(4));
    }

    #[test]
    fn test_update_keeps_date_when_absent() {
        let mut s = series();
        let date = s.date;
        SeriesUpdate {
            name: Some("abc".to_string()),
            ..Default::default()
        }
        .apply(&mut s);
        assert_eq!(s.name, "abc");
        assert_eq!(s.date, date);
    }
}
