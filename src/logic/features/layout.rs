//! Feature Layout - Column schema of every feature table
//!
//! **This file controls the feature schema**
//!
//! ## Rules:
//! 1. Columns are always sorted lexicographically (byte order)
//! 2. Change how columns are named → increment LAYOUT_VERSION
//!
//! The layout hash travels with the corpus artifacts so a training matrix and
//! a test matrix built from different subtype lists are never mixed.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::constants::DATA_RECEIVED_COLUMN;

// ============================================================================
// LAYOUT VERSION
// ============================================================================

/// Current feature layout version
pub const LAYOUT_VERSION: u8 = 1;

pub fn sent_column(subtype: &str) -> String {
    format!("{}_Sent", subtype)
}

pub fn received_column(subtype: &str) -> String {
    format!("{}_Received", subtype)
}

// ============================================================================
// FEATURE LAYOUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLayout {
    columns: Vec<String>,
}

impl FeatureLayout {
    /// Layout for the tracked control subtypes: sent/received per subtype
    /// plus the received-data column
    pub fn for_subtypes<S: AsRef<str>>(subtypes: &[S]) -> Self {
        let mut columns: Vec<String> = subtypes
            .iter()
            .flat_map(|s| [sent_column(s.as_ref()), received_column(s.as_ref())])
            .collect();
        columns.push(DATA_RECEIVED_COLUMN.to_string());
        Self::from_columns(columns)
    }

    /// Layout from arbitrary column names (sorted and deduplicated)
    pub fn from_columns(mut columns: Vec<String>) -> Self {
        columns.sort();
        columns.dedup();
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column index by name (O(n) but layouts are tiny)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// CRC32 of version + ordered column names
    pub fn hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(&[LAYOUT_VERSION]);
        for name in &self.columns {
            hasher.update(name.as_bytes());
            hasher.update(&[0]); // Separator
        }
        hasher.finalize()
    }

    pub fn info(&self) -> LayoutInfo {
        LayoutInfo {
            version: LAYOUT_VERSION,
            hash: self.hash(),
            feature_count: self.len(),
            feature_names: self.columns.clone(),
        }
    }
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout information written next to the corpus artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn layout(&self) -> FeatureLayout {
        FeatureLayout::from_columns(self.feature_names.clone())
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when two feature layouts disagree
#[derive(Debug, Clone)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Feature layout mismatch: expected v{} (hash: {:08x}), got v{} (hash: {:08x})",
            self.expected_version, self.expected_hash, self.actual_version, self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

/// Validate that incoming layout info matches the expected layout
pub fn validate_layout(
    expected: &FeatureLayout,
    incoming_version: u8,
    incoming_hash: u32,
) -> Result<(), LayoutMismatchError> {
    let expected_hash = expected.hash();

    if incoming_version != LAYOUT_VERSION || incoming_hash != expected_hash {
        return Err(LayoutMismatchError {
            expected_version: LAYOUT_VERSION,
            expected_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_order() {
        let layout = FeatureLayout::for_subtypes(&["DAO", "DIO"]);
        assert_eq!(
            layout.columns(),
            &["DAO_Received", "DAO_Sent", "DIO_Received", "DIO_Sent", "Data_Received"]
        );
    }

    #[test]
    fn test_subtype_order_does_not_matter() {
        let a = FeatureLayout::for_subtypes(&["DIO", "DAO"]);
        let b = FeatureLayout::for_subtypes(&["DAO", "DIO"]);
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_layout_hash_differs_by_columns() {
        let a = FeatureLayout::for_subtypes(&["DAO"]);
        let b = FeatureLayout::for_subtypes(&["DAO", "DIO"]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_validate_layout() {
        let layout = FeatureLayout::for_subtypes(&["DAO", "DIO"]);
        assert!(validate_layout(&layout, LAYOUT_VERSION, layout.hash()).is_ok());
        assert!(validate_layout(&layout, LAYOUT_VERSION + 1, layout.hash()).is_err());
        assert!(validate_layout(&layout, LAYOUT_VERSION, layout.hash() ^ 1).is_err());
    }

    #[test]
    fn test_index_of() {
        let layout = FeatureLayout::for_subtypes(&["DAO", "DIO"]);
        assert_eq!(layout.index_of("DAO_Received"), Some(0));
        assert_eq!(layout.index_of("Data_Received"), Some(4));
        assert_eq!(layout.index_of("nonexistent"), None);
    }

    #[test]
    fn test_layout_info_round_trip() {
        let layout = FeatureLayout::for_subtypes(&["DAO", "DIO"]);
        let info = layout.info();
        assert_eq!(info.feature_count, 5);
        assert_eq!(info.layout(), layout);
    }
}
