//! Confusion matrix and metrics

use serde::{Deserialize, Serialize};

use crate::logic::dataset::Label;

/// Conventional 2x2 cells over (actual, predicted), labels {0,1}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCells {
    pub tn: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub tp: u64,
}

impl ConfusionCells {
    /// Pairs are compared by position
    pub fn from_labels(actual: &[Label], predicted: &[Label]) -> Self {
        let mut cells = Self::default();
        for (a, p) in actual.iter().zip(predicted) {
            match (a.is_malicious(), p.is_malicious()) {
                (false, false) => cells.tn += 1,
                (false, true) => cells.fp += 1,
                (true, false) => cells.fn_ += 1,
                (true, true) => cells.tp += 1,
            }
        }
        cells
    }

    /// Row-major flattening: [TN, FP, FN, TP]
    pub fn ravel(&self) -> [u64; 4] {
        [self.tn, self.fp, self.fn_, self.tp]
    }

    pub fn total(&self) -> u64 {
        self.tn + self.fp + self.fn_ + self.tp
    }

    /// Reporting quadrant: PP = [3], PN = [2], NP = [1], NN = [0].
    ///
    /// This is a fixed display convention expected by downstream reports,
    /// not the conventional confusion-matrix layout.
    pub fn remap(&self) -> Quadrant {
        let [a, b, c, d] = self.ravel();
        Quadrant {
            pp: d,
            pn: c,
            np: b,
            nn: a,
        }
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

/// Zero when the denominator is zero
fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quadrant {
    pub pp: u64,
    pub pn: u64,
    pub np: u64,
    pub nn: u64,
}

impl Quadrant {
    /// [[PP, PN], [NP, NN]]
    pub fn display_matrix(&self) -> [[u64; 2]; 2] {
        [[self.pp, self.pn], [self.np, self.nn]]
    }
}

/// One variant's evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionReport {
    pub variant: String,
    pub cells: ConfusionCells,
    pub quadrant: Quadrant,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ConfusionReport {
    pub fn from_cells(variant: &str, cells: ConfusionCells) -> Self {
        Self {
            variant: variant.to_string(),
            quadrant: cells.remap(),
            accuracy: cells.accuracy(),
            precision: cells.precision(),
            recall: cells.recall(),
            f1: cells.f1(),
            cells,
        }
    }

    /// (name, value) rows of the metrics table
    pub fn metric_rows(&self) -> Vec<(&'static str, String)> {
        let q = &self.quadrant;
        vec![
            ("True Positives (PP)", q.pp.to_string()),
            ("False Positives (PN)", q.pn.to_string()),
            ("False Negatives (NP)", q.np.to_string()),
            ("True Negatives (NN)", q.nn.to_string()),
            ("Accuracy", format!("{:.4}", self.accuracy)),
            ("Precision", format!("{:.4}", self.precision)),
            ("Recall", format!("{:.4}", self.recall)),
            ("F1 Score", format!("{:.4}", self.f1)),
        ]
    }
}
