//! Domain types shared by every pipeline stage.

pub mod record;
pub mod signal;

pub use record::DailyRecord;
pub use signal::TradeSignal;
