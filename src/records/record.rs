//! Scan record type.

use crate::core::ObjectId;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// When an object was last found clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// The scanned object.
    pub object_id: ObjectId,

    /// When the clean verdict was recorded.
    pub checked_at: DateTime<Utc>,
}

impl ScanRecord {
    /// Creates a record stamped with the current time.
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            checked_at: Utc::now(),
        }
    }

    /// Overrides the timestamp.
    pub fn with_checked_at(mut self, checked_at: DateTime<Utc>) -> Self {
        self.checked_at = checked_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_json_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let record = ScanRecord::new(ObjectId::from(17u64)).with_checked_at(at);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["object_id"], "17");
        assert_eq!(json["checked_at"], "2024-03-01T12:00:00Z");
    }
}
