use super::trip::{MonitoredTrip, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Alert,
    DepartureDelay,
    ArrivalDelay,
    ItineraryChanged,
    TripNotPossible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub body: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("{channel} delivery failed: {reason}")]
    Delivery {
        channel: &'static str,
        reason: String,
    },
}

/// Outbound delivery channels. Transports live outside this crate.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<(), NotificationError>;

    async fn send_email(
        &self,
        address: &str,
        subject: &str,
        body: &str,
        attachments: &[Attachment],
    ) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationChannel {
    Sms,
    Email,
    All,
    Unrecognized,
}

impl NotificationChannel {
    pub fn parse(value: &str) -> Self {
        match value {
            "sms" => Self::Sms,
            "email" => Self::Email,
            "all" => Self::All,
            _ => Self::Unrecognized,
        }
    }

    fn includes_sms(self) -> bool {
        matches!(self, Self::Sms | Self::All)
    }

    fn includes_email(self) -> bool {
        matches!(self, Self::Email | Self::All)
    }
}

pub fn notification_subject(trip: &MonitoredTrip) -> String {
    format!("{} Notification", trip.display_name())
}

pub fn notification_body(notifications: &[Notification]) -> String {
    notifications
        .iter()
        .map(|notification| notification.body.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sends every queued notification as one message per channel.
/// Returns the number of messages handed to `sender`.
///
/// Every selected channel is attempted. When one fails the others are still
/// tried, and the last failure is returned once all have been attempted.
pub async fn dispatch_notifications(
    sender: &dyn NotificationSender,
    user: &User,
    trip: &MonitoredTrip,
    notifications: &[Notification],
) -> Result<usize, NotificationError> {
    if notifications.is_empty() {
        return Ok(0);
    }

    let subject = notification_subject(trip);
    let body = notification_body(notifications);
    let channel = NotificationChannel::parse(&user.notification_channel);
    let mut sent = 0;
    let mut failure = None;

    if channel.includes_sms() {
        match &user.phone_number {
            Some(phone_number) => match sender.send_sms(phone_number, &body).await {
                Ok(()) => sent += 1,
                Err(err) => {
                    error!(
                        user_id = %user.id,
                        channel = "sms",
                        error = %err,
                        "notification failed"
                    );
                    failure = Some(err);
                }
            },
            None => warn!(user_id = %user.id, "sms requested but user has no phone number"),
        }
    }

    if channel.includes_email() {
        match &user.email {
            Some(address) => match sender.send_email(address, &subject, &body, &[]).await {
                Ok(()) => sent += 1,
                Err(err) => {
                    error!(
                        user_id = %user.id,
                        channel = "email",
                        error = %err,
                        "notification failed"
                    );
                    failure = Some(err);
                }
            },
            None => warn!(user_id = %user.id, "email requested but user has no address"),
        }
    }

    // TODO: confirm with product whether an unknown channel should fall back to email
    if channel == NotificationChannel::Unrecognized {
        debug!(
            user_id = %user.id,
            channel = %user.notification_channel,
            "unrecognized notification channel, nothing sent"
        );
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(sent),
    }
}

/// Writes notifications to the log instead of delivering them.
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<(), NotificationError> {
        info!(%phone_number, %body, "sms notification");
        Ok(())
    }

    async fn send_email(
        &self,
        address: &str,
        subject: &str,
        body: &str,
        attachments: &[Attachment],
    ) -> Result<(), NotificationError> {
        info!(
            %address,
            %subject,
            %body,
            attachments = attachments.len(),
            "email notification"
        );
        Ok(())
    }
}
