pub mod player;
pub mod result;
pub mod scoring;
pub mod series;
pub mod table;

pub use player::{NewPlayer, Player, PlayerId, PlayerUpdate};
pub use result::{GameResult, ResultKey, ResultUpdate};
pub use scoring::{EvaluationRow, ScoringRules, Totals};
pub use series::{NewSeries, Series, SeriesId, SeriesUpdate};
pub use table::{Table, TableId, TableKey, TableUpdate, MAX_TABLE_SIZE, MIN_TABLE_SIZE};
