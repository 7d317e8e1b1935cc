//! Acknowledgment method enumeration.

use serde::{Deserialize, Serialize};

use crate::vocabulary;

/// How a recipient acknowledged a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "acknowledgment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AcknowledgmentMethod {
    /// Button in the application.
    #[default]
    InApp,
    /// Link in the email.
    EmailLink,
    /// Reply to the text message.
    SmsReply,
    /// Action on the push notification.
    PushAction,
    /// Confirmed during a voice call.
    PhoneCall,
    /// Recorded on someone's behalf after a verbal confirmation.
    Verbal,
}

vocabulary!(AcknowledgmentMethod, "acknowledgment method", {
    InApp => "in_app",
    EmailLink => "email_link",
    SmsReply => "sms_reply",
    PushAction => "push_action",
    PhoneCall => "phone_call",
    Verbal => "verbal",
});
