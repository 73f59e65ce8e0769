//! Resource authorization policy
//!
//! Every gated mutation runs the same pipeline: the resource is loaded first
//! (absent → `NotFound`), then the policy decides (denied → `Forbidden`),
//! and only then is storage mutated. Policies are pure: they never touch
//! storage and never mutate the resource they inspect.

use crate::{
    error::AppError,
    models::{
        comment::Comment,
        group::{Group, GroupRoster},
        post::Post,
    },
};
use uuid::Uuid;

/// Operation a subject attempts on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
    Vote,
    ManageModerators,
    Subscribe,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Vote => "vote",
            Action::ManageModerators => "manage_moderators",
            Action::Subscribe => "subscribe",
        }
    }
}

/// A loaded resource as seen by the policy
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Post(&'a Post),
    Comment(&'a Comment),
    Group {
        group: &'a Group,
        roster: &'a GroupRoster,
    },
}

impl Resource<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Post(_) => "post",
            Resource::Comment(_) => "comment",
            Resource::Group { .. } => "group",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Resource::Post(p) => p.id,
            Resource::Comment(c) => c.id,
            Resource::Group { group, .. } => group.id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Resources with an immutable author
pub trait Owned {
    fn author_id(&self) -> Uuid;
}

impl Owned for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

pub fn is_owner(subject: Uuid, resource: &impl Owned) -> bool {
    subject == resource.author_id()
}

pub fn is_moderator(subject: Uuid, roster: &GroupRoster) -> bool {
    roster.is_moderator(subject)
}

/// Pluggable decision point held in application state
pub trait AuthorizationPolicy: Send + Sync {
    fn authorize(&self, subject: Uuid, action: Action, resource: Resource<'_>) -> Decision;
}

/// Authors own their posts and comments; moderators administer their group.
/// Any authenticated subject may vote and subscribe.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnershipPolicy;

impl AuthorizationPolicy for OwnershipPolicy {
    fn authorize(&self, subject: Uuid, action: Action, resource: Resource<'_>) -> Decision {
        let allowed = match (action, resource) {
            (Action::Vote, Resource::Post(_) | Resource::Comment(_)) => true,
            (Action::Subscribe, Resource::Group { .. }) => true,
            (Action::Edit | Action::Delete, Resource::Post(post)) => is_owner(subject, post),
            (Action::Edit | Action::Delete, Resource::Comment(comment)) => {
                is_owner(subject, comment)
            }
            (
                Action::Edit | Action::Delete | Action::ManageModerators,
                Resource::Group { roster, .. },
            ) => is_moderator(subject, roster),
            _ => false,
        };

        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Map a policy decision onto the request outcome
pub fn require(
    policy: &dyn AuthorizationPolicy,
    subject: Uuid,
    action: Action,
    resource: Resource<'_>,
) -> Result<(), AppError> {
    match policy.authorize(subject, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::warn!(
                user_id = %subject,
                resource = resource.kind(),
                resource_id = %resource.id(),
                action = action.as_str(),
                "Permission denied"
            );
            Err(AppError::Forbidden)
        }
    }
}

/// Existence check that always precedes the policy
pub fn found<T>(resource: Option<T>, what: &str) -> Result<T, AppError> {
    resource.ok_or_else(|| AppError::not_found(what))
}
