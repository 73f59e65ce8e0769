//! Group service: lifecycle, moderators and subscriptions

use super::authorization::{found, require, Action, AuthorizationPolicy, Resource};
use crate::{
    error::AppError,
    models::{
        group::{
            CreateGroupRequest, Group, GroupChanges, GroupDetailDto, GroupDto, GroupRoster,
            NewGroup, UpdateGroupRequest,
        },
        user::PublicUserProfile,
    },
    repository::Store,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct GroupService {
    store: Arc<dyn Store>,
    policy: Arc<dyn AuthorizationPolicy>,
}

impl GroupService {
    pub fn new(store: Arc<dyn Store>, policy: Arc<dyn AuthorizationPolicy>) -> Self {
        Self { store, policy }
    }

    /// Load the group and its roster, 404 when absent
    async fn load(&self, id: Uuid) -> Result<(Group, GroupRoster), AppError> {
        let group = found(self.store.find_group(id).await?, "Group")?;
        let roster = self.store.group_roster(id).await?;
        Ok((group, roster))
    }

    /// Load, then consult the policy; returns the roster the decision saw
    async fn authorize(
        &self,
        subject: Uuid,
        action: Action,
        id: Uuid,
    ) -> Result<GroupRoster, AppError> {
        let (group, roster) = self.load(id).await?;
        require(
            self.policy.as_ref(),
            subject,
            action,
            Resource::Group {
                group: &group,
                roster: &roster,
            },
        )?;
        Ok(roster)
    }

    pub async fn create(&self, creator_id: Uuid, req: CreateGroupRequest) -> Result<GroupDto, AppError> {
        let group_name = req.group_name.trim().to_string();
        if group_name.is_empty() {
            return Err(AppError::validation("groupName must not be blank"));
        }

        let group = self
            .store
            .create_group(NewGroup {
                group_name,
                description: req.description,
                banner_url: req.banner_url,
                creator_id,
            })
            .await?;

        tracing::info!(group_id = %group.id, creator_id = %creator_id, "Group created");
        Ok(group.into())
    }

    pub async fn list(&self) -> Result<Vec<GroupDto>, AppError> {
        let groups = self.store.list_groups().await?;
        Ok(groups.into_iter().map(Into::into).collect())
    }

    pub async fn detail(&self, id: Uuid) -> Result<GroupDetailDto, AppError> {
        let (group, roster) = self.load(id).await?;

        let moderators = self.profiles(&roster.moderators).await?;
        let users = self.profiles(&roster.members).await?;

        Ok(GroupDetailDto {
            group: group.into(),
            moderators,
            users,
        })
    }

    async fn profiles(&self, ids: &[Uuid]) -> Result<Vec<PublicUserProfile>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = self.store.find_users_by_ids(ids).await?;
        Ok(users.into_iter().map(Into::into).collect())
    }

    pub async fn update(
        &self,
        subject: Uuid,
        id: Uuid,
        req: UpdateGroupRequest,
    ) -> Result<GroupDto, AppError> {
        let group_name = match req.group_name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::validation("groupName must not be blank"))
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };

        self.authorize(subject, Action::Edit, id).await?;

        let changes = GroupChanges {
            group_name,
            description: req.description,
            banner_url: req.banner_url,
        };
        let group = found(self.store.update_group(id, changes).await?, "Group")?;

        Ok(group.into())
    }

    pub async fn delete(&self, subject: Uuid, id: Uuid) -> Result<(), AppError> {
        self.authorize(subject, Action::Delete, id).await?;

        if !self.store.delete_group(id).await? {
            return Err(AppError::not_found("Group"));
        }

        tracing::info!(group_id = %id, "Group deleted");
        Ok(())
    }

    /// Grant moderator rights; already-moderator is a no-op
    pub async fn add_moderator(
        &self,
        subject: Uuid,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        self.authorize(subject, Action::ManageModerators, group_id)
            .await?;
        found(self.store.find_user_by_id(user_id).await?, "User")?;

        if self.store.add_moderator(group_id, user_id).await? {
            tracing::info!(group_id = %group_id, user_id = %user_id, granted_by = %subject, "Moderator added");
        }
        Ok(())
    }

    /// Revoke moderator rights; the last moderator stays
    pub async fn remove_moderator(
        &self,
        subject: Uuid,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let roster = self
            .authorize(subject, Action::ManageModerators, group_id)
            .await?;

        if !roster.is_moderator(user_id) {
            return Ok(());
        }
        if roster.moderators.len() <= 1 || !self.store.remove_moderator(group_id, user_id).await? {
            return Err(AppError::conflict("A group must keep at least one moderator"));
        }

        tracing::info!(group_id = %group_id, user_id = %user_id, revoked_by = %subject, "Moderator removed");
        Ok(())
    }

    /// Set-union: subscribing twice succeeds without change
    pub async fn subscribe(&self, subject: Uuid, group_id: Uuid) -> Result<(), AppError> {
        let roster = self.authorize(subject, Action::Subscribe, group_id).await?;
        if roster.is_member(subject) {
            return Ok(());
        }

        if self.store.add_member(group_id, subject).await? {
            tracing::debug!(group_id = %group_id, user_id = %subject, "Subscribed");
        }
        Ok(())
    }

    /// Leaving a group one is not in is a no-op
    pub async fn unsubscribe(&self, subject: Uuid, group_id: Uuid) -> Result<(), AppError> {
        let roster = self.authorize(subject, Action::Subscribe, group_id).await?;
        if !roster.is_member(subject) {
            return Ok(());
        }

        if self.store.remove_member(group_id, subject).await? {
            tracing::debug!(group_id = %group_id, user_id = %subject, "Unsubscribed");
        }
        Ok(())
    }
}
