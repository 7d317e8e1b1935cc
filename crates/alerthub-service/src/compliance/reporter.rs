//! Compliance reporter service.

use chrono::{DateTime, Utc};
use tracing::info;

use alerthub_core::config::compliance::ComplianceConfig;
use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;

use super::report::ComplianceReport;
use crate::context::RequestContext;
use crate::deps::ServiceDeps;

/// Read-only aggregation over an organization's notifications.
#[derive(Debug, Clone)]
pub struct ComplianceReporter {
    deps: ServiceDeps,
    config: ComplianceConfig,
}

impl ComplianceReporter {
    /// Creates a new compliance reporter.
    pub fn new(deps: ServiceDeps, config: ComplianceConfig) -> Self {
        Self { deps, config }
    }

    /// Report on notifications created in `[start, end)`.
    pub async fn report(
        &self,
        ctx: &RequestContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<ComplianceReport> {
        if start >= end {
            return Err(AppError::validation("start must be before end"));
        }

        let stores = &self.deps.stores;
        let notifications = stores
            .notifications
            .find_created_between(ctx.organization_id, start, end)
            .await?;
        let ids: Vec<_> = notifications.iter().map(|n| n.id).collect();
        let acknowledgments = stores.acknowledgments.list_by_notifications(&ids).await?;
        let escalations = stores.escalations.list_by_notifications(&ids).await?;

        let report = ComplianceReport::build(
            ctx.organization_id,
            (start, end),
            self.deps.clock.now(),
            &notifications,
            &acknowledgments,
            &escalations,
            &self.config,
        );

        info!(
            organization_id = %ctx.organization_id,
            notifications = report.total_notifications,
            escalations = report.total_escalations,
            recommendations = report.recommendations.len(),
            "Compliance report generated"
        );
        Ok(report)
    }
}
