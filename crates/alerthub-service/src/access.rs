//! Privacy gating of notification detail and PIN hashing.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;
use alerthub_entity::notification::Notification;

use crate::context::RequestContext;

/// Minimum accepted PIN length.
pub const MIN_PIN_LENGTH: usize = 4;

/// Hash an access PIN with Argon2id and a random salt.
pub fn hash_pin(pin: &str) -> AppResult<String> {
    if pin.len() < MIN_PIN_LENGTH {
        return Err(AppError::validation(format!(
            "Access PIN must be at least {MIN_PIN_LENGTH} characters"
        )));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("PIN hashing failed: {e}")))
}

/// Verify a PIN against a stored hash.
///
/// Returns `Ok(true)` if the PIN matches, `Ok(false)` if not.
pub fn verify_pin(pin: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid PIN hash format: {e}")))?;
    match Argon2::default().verify_password(pin.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::internal(format!("PIN verification failed: {e}"))),
    }
}

/// Check that the actor may see a notification at all.
///
/// Notifications of another organization are reported as missing.
pub fn ensure_same_organization(notification: &Notification, ctx: &RequestContext) -> AppResult<()> {
    if notification.organization_id != ctx.organization_id {
        return Err(AppError::not_found(format!(
            "Notification {} not found",
            notification.id
        )));
    }
    Ok(())
}

/// Check the notification's privacy settings for a detail read.
pub fn authorize_detail(
    notification: &Notification,
    ctx: &RequestContext,
    pin: Option<&str>,
) -> AppResult<()> {
    ensure_same_organization(notification, ctx)?;

    if notification.privacy.restrict_to_medical_staff {
        let allowed = ctx.is_medical_or_admin()
            || notification.created_by == ctx.user_id
            || notification.is_required_acknowledger(ctx.user_id);
        if !allowed {
            return Err(AppError::authorization(
                "This notification is restricted to medical staff",
            ));
        }
    }

    if notification.privacy.require_pin {
        let hash = notification
            .access_pin_hash
            .as_deref()
            .ok_or_else(|| AppError::internal("Notification requires a PIN but has none stored"))?;
        let pin = pin.ok_or_else(|| AppError::authorization("An access PIN is required"))?;
        if !verify_pin(pin, hash)? {
            return Err(AppError::authorization("Invalid access PIN"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerthub_core::error::ErrorKind;
    use alerthub_entity::notification::{
        DeliveryChannel, MedicalPayload, MedicalType, NotificationStatus, PrivacySettings,
        TargetType, UrgencyLevel,
    };
    use alerthub_entity::user::UserRole;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn notification(org: Uuid) -> Notification {
        let now = Utc::now();
        Notification {
            id: Uuid::new_v4(),
            organization_id: org,
            team_id: None,
            created_by: Uuid::new_v4(),
            urgency_level: UrgencyLevel::Critical,
            medical_type: MedicalType::QuarantineNotice,
            title: "Isolation".into(),
            message: "Positive test".into(),
            payload: MedicalPayload::default(),
            target_type: TargetType::CustomGroup,
            target_id: None,
            recipient_ids: vec![],
            delivery_channels: vec![DeliveryChannel::InApp],
            channel_config: serde_json::Value::Null,
            delivery_results: vec![],
            requires_acknowledgment: true,
            acknowledgment_timeout_minutes: None,
            required_acknowledgers: vec![],
            min_acknowledgments_required: 1,
            enable_escalation: false,
            escalation_policy: vec![],
            attachments: vec![],
            privacy: PrivacySettings::default(),
            access_pin_hash: None,
            status: NotificationStatus::Delivered,
            scheduled_for: None,
            sent_at: Some(now),
            first_acknowledged_at: None,
            fully_acknowledged_at: None,
            escalated_at: None,
            resolved_at: None,
            resolved_by: None,
            resolution_notes: None,
            expires_at: now + Duration::hours(1),
            redacted_at: None,
            total_recipients: 0,
            acknowledged_count: 0,
            escalation_level: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pin_roundtrip() {
        let hash = hash_pin("4821").unwrap();
        assert!(verify_pin("4821", &hash).unwrap());
        assert!(!verify_pin("0000", &hash).unwrap());
        assert!(hash_pin("12").is_err());
    }

    #[test]
    fn test_other_organization_is_not_found() {
        let n = notification(Uuid::new_v4());
        let ctx = RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::Admin);
        let err = authorize_detail(&n, &ctx, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_restricted_to_medical_staff() {
        let org = Uuid::new_v4();
        let mut n = notification(org);
        n.privacy.restrict_to_medical_staff = true;
        let coach = RequestContext::new(Uuid::new_v4(), org, UserRole::Coach);
        assert_eq!(
            authorize_detail(&n, &coach, None).unwrap_err().kind,
            ErrorKind::Authorization
        );

        n.required_acknowledgers.push(coach.user_id);
        assert!(authorize_detail(&n, &coach, None).is_ok());

        let medic = RequestContext::new(Uuid::new_v4(), org, UserRole::MedicalStaff);
        assert!(authorize_detail(&n, &medic, None).is_ok());
    }

    #[test]
    fn test_pin_required() {
        let org = Uuid::new_v4();
        let mut n = notification(org);
        n.privacy.require_pin = true;
        n.access_pin_hash = Some(hash_pin("2468").unwrap());
        let ctx = RequestContext::new(Uuid::new_v4(), org, UserRole::Admin);

        assert!(authorize_detail(&n, &ctx, None).is_err());
        assert!(authorize_detail(&n, &ctx, Some("1357")).is_err());
        assert!(authorize_detail(&n, &ctx, Some("2468")).is_ok());
    }
}
