//! Domain types for TradeLab

pub mod bar;
pub mod table;
pub mod trade;

pub use bar::Bar;
pub use table::PriceTable;
pub use trade::{ExitReason, Trade};
