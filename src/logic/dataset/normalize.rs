//! Normalizer - row-max scaling of feature tables
//!
//! Rule, applied lane by lane (a lane is one feature column or one node row,
//! depending on the axis):
//! 1. non-finite and negative cells become 0
//! 2. every cell is divided by the lane maximum
//! 3. a lane whose maximum is 0 (or that is empty) becomes all zeros
//! 4. results are rounded to `precision` decimals
//!
//! Normalizing an already normalized table returns it unchanged.

use ndarray::{ArrayViewMut1, Axis};
use serde::{Deserialize, Serialize};

use crate::logic::features::FeatureTable;

/// Which lanes are scaled to a maximum of 1.0
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeAxis {
    /// Each feature divided by its maximum over the run's nodes
    #[default]
    Feature,
    /// Each node's feature vector divided by its own maximum
    Node,
}

/// Round half to even, so exact ties such as 0.125 go to 0.12
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round_ties_even() / scale
}

fn scale_lane(mut lane: ArrayViewMut1<'_, f64>, precision: u32) {
    lane.mapv_inplace(|v| if v.is_finite() && v > 0.0 { v } else { 0.0 });

    let max = lane.iter().copied().fold(0.0f64, f64::max);
    if max <= 0.0 {
        lane.fill(0.0);
        return;
    }

    lane.mapv_inplace(|v| round_to(v / max, precision));
}

#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    axis: NormalizeAxis,
    precision: u32,
}

impl Normalizer {
    pub fn new(axis: NormalizeAxis, precision: u32) -> Self {
        Self { axis, precision }
    }

    pub fn normalize(&self, table: &FeatureTable) -> FeatureTable {
        let mut normalized = table.clone();
        let axis = match self.axis {
            NormalizeAxis::Feature => Axis(1),
            NormalizeAxis::Node => Axis(0),
        };

        for lane in normalized.values.axis_iter_mut(axis) {
            scale_lane(lane, self.precision);
        }
        normalized
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizeAxis::default(), crate::constants::DEFAULT_PRECISION)
    }
}
