//! Sharing grant management.
//!
//! # Responsibility
//! - Create grants for users, link holders or everyone.
//! - Generate unguessable access tokens for link sharing.
//!
//! # Invariants
//! - Generated tokens are 64 lowercase hex characters carrying 244
//!   random bits.
//! - Tokens are never written to the log.

use crate::model::sharing::{NewSharing, Permission, ResourceRef, Sharing, SharingId};
use crate::model::user::UserId;
use crate::repo::sharing_repo::SharingRepository;
use crate::repo::RepoResult;
use log::info;
use uuid::Uuid;

/// Grant request. `with_token` asks the service to mint an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareRequest {
    pub resource: ResourceRef,
    pub grantee_id: Option<UserId>,
    pub permission: Permission,
    pub with_token: bool,
    pub is_public: bool,
}

impl ShareRequest {
    /// Grant for one named user.
    pub fn for_user(resource: ResourceRef, grantee_id: UserId, permission: Permission) -> Self {
        Self {
            resource,
            grantee_id: Some(grantee_id),
            permission,
            with_token: false,
            is_public: false,
        }
    }

    /// Grant for whoever presents the generated token.
    pub fn for_link(resource: ResourceRef, permission: Permission) -> Self {
        Self {
            resource,
            grantee_id: None,
            permission,
            with_token: true,
            is_public: false,
        }
    }

    /// Grant for every requester.
    pub fn for_everyone(resource: ResourceRef, permission: Permission) -> Self {
        Self {
            resource,
            grantee_id: None,
            permission,
            with_token: false,
            is_public: true,
        }
    }
}

pub struct SharingService<R: SharingRepository> {
    repo: R,
}

impl<R: SharingRepository> SharingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_sharing(&self, request: &ShareRequest) -> RepoResult<Sharing> {
        let new_sharing = NewSharing {
            resource: request.resource,
            grantee_id: request.grantee_id,
            access_token: request.with_token.then(generate_access_token),
            is_public: request.is_public,
            permission: request.permission,
        };
        let sharing = self.repo.create_sharing(&new_sharing)?;
        info!(
            "event=sharing_create module=service status=ok sharing_id={} resource_type={} permission={} has_grantee={} has_token={} public={}",
            sharing.id,
            sharing.resource.resource_type().as_str(),
            sharing.permission.as_str(),
            sharing.grantee_id.is_some(),
            sharing.access_token.is_some(),
            sharing.is_public
        );
        Ok(sharing)
    }

    pub fn get_sharing(&self, id: SharingId) -> RepoResult<Option<Sharing>> {
        self.repo.get_sharing(id)
    }

    /// Grants attached to one resource, oldest first.
    pub fn list_sharings(&self, resource: ResourceRef) -> RepoResult<Vec<Sharing>> {
        self.repo.list_sharings(resource)
    }

    pub fn delete_sharing(&self, id: SharingId) -> RepoResult<Sharing> {
        let sharing = self.repo.delete_sharing(id)?;
        info!("event=sharing_delete module=service status=ok sharing_id={id}");
        Ok(sharing)
    }
}

fn generate_access_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
