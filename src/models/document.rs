use serde::{Deserialize, Serialize};

/// Numeric document id used for lookups.
pub type DocumentUid = i64;

/// Value of the `restrictions` column that marks a document as public.
pub const UNRESTRICTED_SENTINEL: &str = "nein";

/// Whether a document is publicly viewable or access-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionState {
    Unrestricted,
    Restricted,
}

impl RestrictionState {
    /// Maps the free-text `restrictions` column onto a restriction state.
    ///
    /// Only the exact sentinel means unrestricted. Anything else, including
    /// an empty or missing value, keeps the document restricted.
    pub fn from_column(value: Option<&str>) -> Self {
        match value {
            Some(UNRESTRICTED_SENTINEL) => RestrictionState::Unrestricted,
            _ => RestrictionState::Restricted,
        }
    }
}

/// Read-only projection of a digitized document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub uid: DocumentUid,
    /// Stable external identifier that grants refer to.
    pub record_id: String,
    pub title: Option<String>,
    pub restriction: RestrictionState,
}

impl Document {
    pub fn new(uid: DocumentUid, record_id: impl Into<String>, restriction: RestrictionState) -> Self {
        Self {
            uid,
            record_id: record_id.into(),
            title: None,
            restriction,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_public(&self) -> bool {
        self.restriction == RestrictionState::Unrestricted
    }
}
