//! Central Configuration Constants
//!
//! Single source of truth for file names, column names and defaults.
//! Anything a run may want to change lives in `PipelineConfig` instead.

/// App name
pub const APP_NAME: &str = "iot-attack-detector";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Trace columns
// ============================================

pub const COL_PACKET_TYPE: &str = "PACKET_TYPE";
pub const COL_SUBTYPE: &str = "CONTROL_PACKET_TYPE/APP_NAME";
pub const COL_SOURCE_ID: &str = "SOURCE_ID";
pub const COL_RECEIVER_ID: &str = "RECEIVER_ID";
pub const COL_PACKET_STATUS: &str = "PACKET_STATUS";

/// Columns every packet trace must carry
pub const REQUIRED_TRACE_COLUMNS: &[&str] = &[
    COL_PACKET_TYPE,
    COL_SUBTYPE,
    COL_SOURCE_ID,
    COL_RECEIVER_ID,
    COL_PACKET_STATUS,
];

// ============================================
// Artifact columns
// ============================================

pub const COL_NODE: &str = "NODE";
pub const COL_RUN: &str = "RUN";
pub const COL_LABEL: &str = "Label";

/// Received-data feature column
pub const DATA_RECEIVED_COLUMN: &str = "Data_Received";

// ============================================
// Default file names
// ============================================

pub const DEFAULT_TRACE_FILE: &str = "Packet Trace.csv";
pub const DEFAULT_COUNTS_FILE: &str = "Sensor_Message_Counts.csv";
pub const DEFAULT_LABELS_FILE: &str = "labels.csv";

pub const NORMALIZED_FILE: &str = "normalized.csv";
pub const TRAINING_MATRIX_FILE: &str = "training_data.csv";
pub const TEST_MATRIX_FILE: &str = "test_data.csv";
pub const GROUND_TRUTH_FILE: &str = "ground_truth.csv";
pub const LAYOUT_FILE: &str = "layout.json";
pub const EVALUATION_SUMMARY_FILE: &str = "evaluation_summary.json";

pub const TRAINING_DIR: &str = "training";
pub const TEST_DIR: &str = "test";
pub const PREDICTIONS_DIR: &str = "predictions";
pub const EVALUATION_DIR: &str = "evaluation";

// ============================================
// Defaults
// ============================================

pub const DEFAULT_CONTROL_SUBTYPES: &[&str] = &["DAO", "DIO"];

/// Decimal places kept after normalization
pub const DEFAULT_PRECISION: u32 = 2;
