use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day of the reconstructed value-vs-invested series.
///
/// The core generates these — the frontend just renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    /// The calendar day this point describes
    pub date: NaiveDate,

    /// Market value of all held shares, using each ticker's last known
    /// close on or before this day (forward-filled over non-trading days)
    pub value: f64,

    /// Net cash directed into currently-tracked cost basis as of this day
    pub invested: f64,
}
