//! Directory backed by a static JSON roster.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;
use alerthub_core::traits::directory::{Directory, DirectoryUser};

/// On-disk roster format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Roster {
    /// Every known user.
    #[serde(default)]
    pub users: Vec<DirectoryUser>,
}

/// In-memory directory loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: HashMap<Uuid, DirectoryUser>,
}

impl StaticDirectory {
    /// Build a directory from a list of users.
    pub fn new(users: Vec<DirectoryUser>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    /// Load a roster file. An empty path yields an empty directory.
    pub fn load(path: &str) -> AppResult<Self> {
        if path.is_empty() {
            warn!("No directory roster configured; targets will resolve to nobody");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(Path::new(path)).map_err(|e| {
            AppError::with_source(
                alerthub_core::ErrorKind::Configuration,
                format!("Failed to read roster '{path}': {e}"),
                e,
            )
        })?;
        let roster: Roster = serde_json::from_str(&raw)?;
        info!(path = %path, users = roster.users.len(), "Directory roster loaded");
        Ok(Self::new(roster.users))
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn collect<F>(&self, keep: F) -> Vec<Uuid>
    where
        F: Fn(&DirectoryUser) -> bool,
    {
        let mut ids: Vec<Uuid> = self.users.values().filter(|u| keep(u)).map(|u| u.id).collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn find_user(&self, user_id: Uuid) -> AppResult<Option<DirectoryUser>> {
        Ok(self.users.get(&user_id).cloned())
    }

    async fn team_members(&self, team_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self.collect(|u| u.team_ids.contains(&team_id)))
    }

    async fn organization_members(&self, organization_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self.collect(|u| u.organization_id == organization_id))
    }

    async fn users_with_role(&self, organization_id: Uuid, role: &str) -> AppResult<Vec<Uuid>> {
        Ok(self.collect(|u| u.organization_id == organization_id && u.role.eq_ignore_ascii_case(role)))
    }
}
