// Per-metric handling of missing datapoint values
use super::datapoint::{Datapoint, RawDatapoint};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NullFilter {
    /// Drop datapoints without a value.
    #[default]
    Skip,
    /// Replace missing values with zero.
    Zero,
}

impl NullFilter {
    /// Looks up a policy by name. Unknown names fall back to `Zero`; callers
    /// that care can check [`NullFilter::is_known`] first.
    pub fn from_name(name: &str) -> Self {
        match name {
            "skip" => NullFilter::Skip,
            _ => NullFilter::Zero,
        }
    }

    pub fn is_known(name: &str) -> bool {
        matches!(name, "skip" | "zero" | "zeroize")
    }

    /// Datapoints without a timestamp are always dropped.
    pub fn apply(&self, datapoints: &[RawDatapoint]) -> Vec<Datapoint> {
        datapoints
            .iter()
            .filter_map(|p| {
                let x = p.timestamp?;
                match (self, p.value) {
                    (_, Some(y)) => Some(Datapoint::new(x, y)),
                    (NullFilter::Zero, None) => Some(Datapoint::new(x, 0.0)),
                    (NullFilter::Skip, None) => None,
                }
            })
            .collect()
    }
}
