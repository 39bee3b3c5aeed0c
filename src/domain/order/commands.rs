use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::states::UnvalidatedOrder;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Envelope around a workflow input. The metadata is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    /// Groups the log lines of one request
    pub correlation_id: Uuid,
}

impl<T> Command<T> {
    pub fn new(data: T, user_id: impl Into<String>) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
            user_id: user_id.into(),
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}

pub type PlaceOrderCommand = Command<UnvalidatedOrder>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::states::fixtures::unvalidated_order;
    use chrono::TimeZone;

    #[test]
    fn test_command_round_trips_through_json() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let command = PlaceOrderCommand::new(unvalidated_order("O1", &[("P1", 2)]), "user-7")
            .with_timestamp(timestamp);

        let json = serde_json::to_string(&command).unwrap();
        let decoded: PlaceOrderCommand = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, command);
        assert_eq!(decoded.user_id, "user-7");
        assert_eq!(decoded.timestamp, timestamp);
    }
}
