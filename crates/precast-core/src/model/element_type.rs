use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version labels that mark an element type's first BOM
///
/// An element type still on one of these has never been revised, so there is
/// nothing to diff against.
pub const INITIAL_VERSIONS: [&str; 3] = ["RV-1", "VR-1", "RV-01"];

/// ElementType - a reusable manufacturing template with a BOM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementType {
    pub element_type_id: i64,
    pub project_id: i64,
    pub element_type_name: String,
    /// Free-form revision label, e.g. `RV-3`
    pub version: String,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    /// Set once the outstanding BOM delta has been reconciled against inventory
    pub inv_adjust: bool,
}

impl ElementType {
    pub fn new(element_type_id: i64, project_id: i64, name: impl Into<String>) -> Self {
        Self {
            element_type_id,
            project_id,
            element_type_name: name.into(),
            version: INITIAL_VERSIONS[0].to_string(),
            created_by: String::new(),
            updated_at: None,
            inv_adjust: false,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// True when `version` is one of [`INITIAL_VERSIONS`]
    pub fn is_initial_version(&self) -> bool {
        let version = self.version.trim();
        INITIAL_VERSIONS.iter().any(|v| *v == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_versions() {
        for v in ["RV-1", "VR-1", "RV-01", " RV-1 "] {
            assert!(ElementType::new(1, 1, "Slab").with_version(v).is_initial_version());
        }
        for v in ["RV-2", "rv-1", "RV-10", ""] {
            assert!(!ElementType::new(1, 1, "Slab").with_version(v).is_initial_version());
        }
    }
}
