//! Random seating of a series' players at tables of three and four

use crate::error::{Result, SkatError};
use crate::model::{Player, PlayerId, SeriesId, Table, TableId, MAX_TABLE_SIZE, MIN_TABLE_SIZE};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// Which players take part in a shuffle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Leave out inactive players (unless forced in by `include`)
    pub active_only: bool,
    /// Players added regardless of their active flag
    pub include: BTreeSet<PlayerId>,
    /// When non-empty, exactly these players are used and all other options are ignored
    pub include_only: BTreeSet<PlayerId>,
    /// Players always left out
    pub exclude: BTreeSet<PlayerId>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            active_only: true,
            include: BTreeSet::new(),
            include_only: BTreeSet::new(),
            exclude: BTreeSet::new(),
        }
    }
}

impl SelectionPolicy {
    pub fn only(player_ids: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            include_only: player_ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    pub fn with_include(mut self, player_ids: impl IntoIterator<Item = PlayerId>) -> Self {
        self.include.extend(player_ids);
        self
    }

    pub fn with_exclude(mut self, player_ids: impl IntoIterator<Item = PlayerId>) -> Self {
        self.exclude.extend(player_ids);
        self
    }

    /// Resolve the policy against all known players, in ascending ID order
    pub fn select(&self, players: &[Player]) -> Result<Vec<PlayerId>> {
        let known: BTreeSet<PlayerId> = players.iter().map(|p| p.id).collect();
        let forced = if self.include_only.is_empty() {
            &self.include
        } else {
            &self.include_only
        };
        if let Some(id) = forced.iter().find(|&&id| !known.contains(&id)) {
            return Err(SkatError::NotFound(format!(
                "a player with the given ID {} was not found",
                id
            )));
        }

        if !self.include_only.is_empty() {
            return Ok(self.include_only.iter().copied().collect());
        }

        let mut selected: BTreeSet<PlayerId> = players
            .iter()
            .filter(|p| p.active || !self.active_only)
            .map(|p| p.id)
            .collect();
        selected.extend(&self.include);
        for id in &self.exclude {
            selected.remove(id);
        }
        Ok(selected.into_iter().collect())
    }
}

/// Table sizes for `n` players: as many 4-seat tables as possible, then 3-seat ones
pub fn table_sizes(n: usize) -> Result<Vec<usize>> {
    if n < MIN_TABLE_SIZE {
        return Err(SkatError::InvalidInput(format!(
            "not enough players: {} selected, at least {} needed",
            n, MIN_TABLE_SIZE
        )));
    }

    let div = n / MAX_TABLE_SIZE;
    let rem = n % MAX_TABLE_SIZE;

    let (four_count, three_count) = if rem == 0 {
        (div, 0)
    } else {
        let three_count = MAX_TABLE_SIZE - rem;
        let four_count = (div + 1).checked_sub(three_count).ok_or_else(|| {
            SkatError::InvalidInput(format!(
                "cannot partition {} players into valid tables",
                n
            ))
        })?;
        (four_count, three_count)
    };

    let mut sizes = vec![MAX_TABLE_SIZE; four_count];
    sizes.extend(std::iter::repeat(MIN_TABLE_SIZE).take(three_count));
    Ok(sizes)
}

/// Shuffle players uniformly and seat them, 4-seat tables first, IDs from 1
pub fn partition<R: Rng + ?Sized>(
    series_id: SeriesId,
    player_ids: &[PlayerId],
    rng: &mut R,
) -> Result<Vec<Table>> {
    let sizes = table_sizes(player_ids.len())?;

    let mut shuffled = player_ids.to_vec();
    shuffled.shuffle(rng);

    let mut tables = Vec::with_capacity(sizes.len());
    let mut rest = shuffled.as_slice();
    for (i, size) in sizes.into_iter().enumerate() {
        let (seated, remaining) = rest.split_at(size);
        tables.push(Table::new(series_id, (i + 1) as TableId, seated.to_vec())?);
        rest = remaining;
    }

    debug!(
        "Seated {} players of series {} at {} tables",
        player_ids.len(),
        series_id,
        tables.len()
    );
    Ok(tables)
}
