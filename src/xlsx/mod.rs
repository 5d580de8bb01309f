pub mod writer;

pub use writer::write_evaluation_to_xlsx;
pub use writer::write_totals_to_xlsx;
