pub mod error;
pub mod evaluation;
pub mod model;
pub mod shuffle;
pub mod store;
pub mod tournament;
pub mod xlsx;

pub use error::{Result, SkatError};
pub use evaluation::{evaluate_results, evaluate_total, rank_rows, SortKey, Standing, TotalRow, TotalsTable};
pub use model::*;
pub use shuffle::{partition, table_sizes, SelectionPolicy};
pub use store::{CsvStore, MemoryStore, Store};
pub use tournament::Tournament;
