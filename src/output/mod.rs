// Output module
pub mod display;
pub mod table;

pub use display::ConsoleDisplay;
pub use table::{AlertRow, OutputFormat, ThresholdRow};
