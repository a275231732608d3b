//! TradeSignal: the discrete per-day position instruction.

use serde::{Deserialize, Serialize};

/// Position instruction for the next trading day.
///
/// Serialized as its integer value (-1, 0, 1), which is also how it enters
/// the return arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum TradeSignal {
    Sell,
    #[default]
    Flat,
    Buy,
}

impl TradeSignal {
    pub fn as_i8(self) -> i8 {
        match self {
            TradeSignal::Sell => -1,
            TradeSignal::Flat => 0,
            TradeSignal::Buy => 1,
        }
    }

    /// Multiplier applied to a daily return.
    pub fn exposure(self) -> f64 {
        f64::from(self.as_i8())
    }

    pub fn is_active(self) -> bool {
        self != TradeSignal::Flat
    }
}

impl From<TradeSignal> for i8 {
    fn from(signal: TradeSignal) -> Self {
        signal.as_i8()
    }
}

impl TryFrom<i8> for TradeSignal {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(TradeSignal::Sell),
            0 => Ok(TradeSignal::Flat),
            1 => Ok(TradeSignal::Buy),
            other => Err(format!("signal must be -1, 0 or 1, got {other}")),
        }
    }
}
