//! Expansion of a target specification into recipient user ids.

use uuid::Uuid;

use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;
use alerthub_core::traits::directory::Directory;
use alerthub_entity::notification::TargetType;

use super::request::CreateNotification;
use crate::context::RequestContext;

/// Resolve the recipients of a new notification.
///
/// Required acknowledgers are always included. The result is deduplicated
/// and keeps first-seen order.
pub async fn resolve_recipients(
    directory: &dyn Directory,
    ctx: &RequestContext,
    request: &CreateNotification,
) -> AppResult<Vec<Uuid>> {
    let targeted = match request.target_type {
        TargetType::Player => {
            let player = request
                .target_id
                .ok_or_else(|| AppError::validation("player targets need a target_id"))?;
            vec![player]
        }
        TargetType::Team => {
            let team = request
                .target_id
                .or(request.team_id)
                .ok_or_else(|| AppError::validation("team targets need a target_id"))?;
            directory.team_members(team).await?
        }
        TargetType::Organization => {
            let org = request.target_id.unwrap_or(ctx.organization_id);
            if org != ctx.organization_id {
                return Err(AppError::authorization(
                    "Cannot notify another organization",
                ));
            }
            directory.organization_members(org).await?
        }
        TargetType::CustomGroup => request.recipient_ids.clone(),
    };

    Ok(dedup(targeted.into_iter().chain(request.required_acknowledgers.iter().copied())))
}

/// Deduplicate ids, keeping first-seen order.
pub fn dedup(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use alerthub_core::traits::directory::DirectoryUser;
    use alerthub_entity::user::UserRole;

    fn request(target_type: TargetType, target_id: Option<Uuid>) -> CreateNotification {
        serde_json::from_value(serde_json::json!({
            "urgency_level": "urgent",
            "medical_type": "health_update",
            "title": "t",
            "message": "m",
            "target_type": target_type,
            "target_id": target_id,
            "delivery_channels": ["in_app"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_team_target_uses_directory_and_adds_required() {
        let org = Uuid::new_v4();
        let team = Uuid::new_v4();
        let member = DirectoryUser {
            id: Uuid::new_v4(),
            organization_id: org,
            display_name: "Sam".into(),
            role: "player".into(),
            team_ids: vec![team],
        };
        let directory = StaticDirectory::new(vec![member.clone()]);
        let ctx = RequestContext::new(Uuid::new_v4(), org, UserRole::MedicalStaff);

        let mut req = request(TargetType::Team, Some(team));
        let extra = Uuid::new_v4();
        req.required_acknowledgers = vec![member.id, extra];

        let recipients = resolve_recipients(&directory, &ctx, &req).await.unwrap();
        assert_eq!(recipients, vec![member.id, extra]);
    }

    #[tokio::test]
    async fn test_player_target_is_the_player() {
        let directory = StaticDirectory::default();
        let ctx = RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::Admin);
        let player = Uuid::new_v4();
        let recipients = resolve_recipients(&directory, &ctx, &request(TargetType::Player, Some(player)))
            .await
            .unwrap();
        assert_eq!(recipients, vec![player]);
    }

    #[tokio::test]
    async fn test_other_organization_rejected() {
        let directory = StaticDirectory::default();
        let ctx = RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::Admin);
        let req = request(TargetType::Organization, Some(Uuid::new_v4()));
        assert!(resolve_recipients(&directory, &ctx, &req).await.is_err());
    }
}
