//! Group models

use super::user::PublicUserProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Group {
    pub id: Uuid,
    pub group_name: String,
    pub description: Option<String>,
    pub banner_url: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub group_name: String,
    pub description: Option<String>,
    pub banner_url: Option<String>,
    /// Seeded as the first moderator and member
    pub creator_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct GroupChanges {
    pub group_name: Option<String>,
    pub description: Option<String>,
    pub banner_url: Option<String>,
}

/// Moderator and member identity sets of one group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRoster {
    pub moderators: Vec<Uuid>,
    pub members: Vec<Uuid>,
}

impl GroupRoster {
    pub fn is_moderator(&self, user_id: Uuid) -> bool {
        self.moderators.contains(&user_id)
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100, message = "groupName must be 1-100 characters"))]
    pub group_name: String,
    #[validate(length(max = 2000, message = "description is too long"))]
    pub description: Option<String>,
    #[validate(url(message = "bannerUrl must be a URL"))]
    pub banner_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    #[validate(length(min = 1, max = 100, message = "groupName must be 1-100 characters"))]
    pub group_name: Option<String>,
    #[validate(length(max = 2000, message = "description is too long"))]
    pub description: Option<String>,
    #[validate(url(message = "bannerUrl must be a URL"))]
    pub banner_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddModeratorRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDto {
    pub id: Uuid,
    pub group_name: String,
    pub registered_at: DateTime<Utc>,
    pub banner_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupDetailDto {
    #[serde(flatten)]
    pub group: GroupDto,
    pub moderators: Vec<PublicUserProfile>,
    pub users: Vec<PublicUserProfile>,
}

impl From<Group> for GroupDto {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            group_name: group.group_name,
            registered_at: group.registered_at,
            banner_url: group.banner_url,
            description: group.description,
        }
    }
}
