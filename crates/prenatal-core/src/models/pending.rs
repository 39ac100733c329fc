//! Follow-up checklist items.

use serde::{Deserialize, Serialize};

/// A to-do attached to a patient (e.g. "Agendar curva glicêmica").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingItem {
    pub item_id: String,
    /// Patient local ID
    pub patient_id: String,
    pub text: String,
    pub urgent: bool,
    pub done: bool,
    /// Creation timestamp
    pub created_at: String,
}

impl PendingItem {
    pub fn new(patient_id: String, text: String, urgent: bool) -> Self {
        Self {
            item_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            text,
            urgent,
            done: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_is_open() {
        let item = PendingItem::new("patient-1".into(), "Revisar urocultura".into(), false);
        assert!(!item.done);
        assert!(!item.urgent);
        assert_eq!(item.item_id.len(), 36);
    }
}
