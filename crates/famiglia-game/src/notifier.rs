//! Outbound reminders (day start, mission unlock, black market).
//!
//! Sending is best-effort: a failed send is reported and logged, never
//! turned into an error for the action that triggered it.

use std::fmt;
use std::future::Future;

use serde::Serialize;

/// What a reminder is about, with the details its template needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    DayStart { day: u32 },
    MissionUnlock { day: u32, unlock_hour: u32 },
    Blackmarket { open_time: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DayStart { day } => write!(f, "day {day} start"),
            Self::MissionUnlock { day, unlock_hour } => {
                write!(f, "day {day} missions unlock at {unlock_hour}:00")
            }
            Self::Blackmarket { open_time } => write!(f, "black market opens {open_time}"),
        }
    }
}

/// Outcome of one send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyReport {
    pub success: bool,
    pub message: String,
    pub sent_count: usize,
}

/// Delivers reminders to a list of addresses.
pub trait Notifier: Send + Sync + 'static {
    fn send(
        &self,
        notification: &Notification,
        recipients: &[String],
    ) -> impl Future<Output = NotifyReport> + Send;
}

/// Writes reminders to the log instead of mailing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification, recipients: &[String]) -> NotifyReport {
        if recipients.is_empty() {
            tracing::warn!(%notification, "no recipients, nothing sent");
            return NotifyReport {
                success: false,
                message: "no recipient emails provided".to_string(),
                sent_count: 0,
            };
        }
        tracing::info!(%notification, recipients = recipients.len(), "reminder sent");
        NotifyReport {
            success: true,
            message: format!("{notification} reminder sent"),
            sent_count: recipients.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_counts_recipients() {
        let report = LogNotifier
            .send(
                &Notification::DayStart { day: 2 },
                &["a@example.com".to_string(), "b@example.com".to_string()],
            )
            .await;

        assert!(report.success);
        assert_eq!(report.sent_count, 2);
    }

    #[tokio::test]
    async fn test_log_notifier_empty_recipients_fails_softly() {
        let report = LogNotifier
            .send(&Notification::DayStart { day: 1 }, &[])
            .await;

        assert!(!report.success);
        assert_eq!(report.sent_count, 0);
    }

    #[test]
    fn test_notification_serializes_with_type_tag() {
        let json = serde_json::to_value(Notification::MissionUnlock {
            day: 3,
            unlock_hour: 9,
        })
        .unwrap();
        assert_eq!(json["type"], "mission_unlock");
        assert_eq!(json["unlock_hour"], 9);
    }
}
