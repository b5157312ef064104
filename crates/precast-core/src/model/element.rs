use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Element - a produced instance of an ElementType
///
/// `bom_revision_id` is stamped at creation with the revision in force at that
/// moment and is never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: i64,
    pub element_type_id: i64,
    pub project_id: i64,
    pub element_code: String,
    pub bom_revision_id: Option<i64>,
    pub drawing_revision_id: Option<i64>,
    /// Element has entered a production stage
    pub instage: bool,
    pub inv_adjust: bool,
    pub updated_at: Option<DateTime<Utc>>,
}
