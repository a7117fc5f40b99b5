//! Effective-permission resolution for maps, collections and their content.
//!
//! # Responsibility
//! - Compute what a requester may do with one target.
//! - Keep "resource does not exist" distinct from "access denied".
//!
//! # Invariants
//! - Resolution order is fixed: the target is located first (`NotFound`),
//!   then ownership grants `edit`, then public visibility grants `view`
//!   (`edit` only through an edit grant naming this user), then matching
//!   sharing rows grant their permission, otherwise `Forbidden`.
//! - An owner is never downgraded by a sharing row naming them.
//! - When several rows match, the highest permission wins.
//! - Markers, articles and blocks are resolved through their owning map.
//!   A marker has no owning collection; membership in someone's collection
//!   grants that collection's owner nothing on the marker.
//! - Share tokens are compared in constant time.

use crate::model::article::{ArticleId, BlockId};
use crate::model::collection::CollectionId;
use crate::model::map::MapId;
use crate::model::marker::MarkerId;
use crate::model::sharing::{Permission, ResourceRef, Sharing};
use crate::model::user::UserId;
use crate::model::AccessLevel;
use crate::repo::access_repo::{AccessRepository, ResourceFacts};
use crate::repo::{EntityKind, RepoError};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Who is asking. Both fields may be absent (anonymous, no token).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Requester {
    pub user_id: Option<UserId>,
    pub share_token: Option<String>,
}

impl Requester {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            share_token: None,
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self {
            user_id: None,
            share_token: Some(token.into()),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.share_token = Some(token.into());
        self
    }
}

impl Debug for Requester {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requester")
            .field("user_id", &self.user_id)
            .field("share_token", &self.share_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Anything an access check can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessTarget {
    Map(MapId),
    Collection(CollectionId),
    Marker(MarkerId),
    Article(ArticleId),
    Block(BlockId),
}

impl AccessTarget {
    pub fn entity(self) -> EntityKind {
        match self {
            Self::Map(_) => EntityKind::Map,
            Self::Collection(_) => EntityKind::Collection,
            Self::Marker(_) => EntityKind::Marker,
            Self::Article(_) => EntityKind::Article,
            Self::Block(_) => EntityKind::Block,
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Map(id)
            | Self::Collection(id)
            | Self::Marker(id)
            | Self::Article(id)
            | Self::Block(id) => id,
        }
    }
}

impl From<ResourceRef> for AccessTarget {
    fn from(value: ResourceRef) -> Self {
        match value {
            ResourceRef::Map(id) => Self::Map(id),
            ResourceRef::Collection(id) => Self::Collection(id),
        }
    }
}

#[derive(Debug)]
pub enum AccessError {
    /// Target (or the map it hangs off) does not exist.
    NotFound { entity: EntityKind, id: Uuid },
    /// Target exists but the requester lacks the required permission.
    Forbidden,
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Forbidden => write!(f, "access forbidden"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccessError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

/// Why a permission was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Basis {
    Owner,
    Public,
    Grant,
}

impl Basis {
    fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Public => "public",
            Self::Grant => "grant",
        }
    }
}

/// Access resolver over read-only lookups.
pub struct AccessService<R: AccessRepository> {
    repo: R,
}

impl<R: AccessRepository> AccessService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the effective permission of `requester` on `target`.
    ///
    /// # Errors
    /// - `NotFound` when the target or its owning map does not exist.
    /// - `Forbidden` when the target exists and nothing grants access.
    pub fn resolve(
        &self,
        requester: &Requester,
        target: AccessTarget,
    ) -> Result<Permission, AccessError> {
        let facts = match self.locate(target)? {
            Some(facts) => facts,
            None => {
                debug!(
                    "event=access_check module=access status=not_found target={}",
                    target.entity()
                );
                return Err(AccessError::NotFound {
                    entity: target.entity(),
                    id: target.id(),
                });
            }
        };

        let grants = if is_owner(&facts, requester) {
            Vec::new()
        } else {
            self.repo.sharings_for(facts.resource)?
        };

        match decide(&facts, requester, &grants) {
            Some((permission, basis)) => {
                debug!(
                    "event=access_check module=access status=granted target={} permission={} basis={}",
                    target.entity(),
                    permission.as_str(),
                    basis.as_str()
                );
                Ok(permission)
            }
            None => {
                info!(
                    "event=access_check module=access status=denied target={} authenticated={} has_token={}",
                    target.entity(),
                    requester.user_id.is_some(),
                    requester.share_token.is_some()
                );
                Err(AccessError::Forbidden)
            }
        }
    }

    /// Resolves and then requires at least `required`.
    pub fn check_access(
        &self,
        requester: &Requester,
        target: AccessTarget,
        required: Permission,
    ) -> Result<Permission, AccessError> {
        let effective = self.resolve(requester, target)?;
        if effective.allows(required) {
            return Ok(effective);
        }
        info!(
            "event=access_check module=access status=insufficient target={} effective={} required={}",
            target.entity(),
            effective.as_str(),
            required.as_str()
        );
        Err(AccessError::Forbidden)
    }

    fn locate(&self, target: AccessTarget) -> Result<Option<ResourceFacts>, AccessError> {
        let resource = match target {
            AccessTarget::Map(id) => ResourceRef::Map(id),
            AccessTarget::Collection(id) => ResourceRef::Collection(id),
            AccessTarget::Marker(id) => match self.repo.map_of_marker(id)? {
                Some(map_id) => ResourceRef::Map(map_id),
                None => return Ok(None),
            },
            AccessTarget::Article(id) => match self.repo.map_of_article(id)? {
                Some(map_id) => ResourceRef::Map(map_id),
                None => return Ok(None),
            },
            AccessTarget::Block(id) => match self.repo.map_of_block(id)? {
                Some(map_id) => ResourceRef::Map(map_id),
                None => return Ok(None),
            },
        };
        Ok(self.repo.resource_facts(resource)?)
    }
}

fn decide(
    facts: &ResourceFacts,
    requester: &Requester,
    grants: &[Sharing],
) -> Option<(Permission, Basis)> {
    if is_owner(facts, requester) {
        return Some((Permission::Edit, Basis::Owner));
    }

    if facts.access_level == AccessLevel::Public {
        let user_has_edit = grants.iter().any(|grant| {
            grant.permission == Permission::Edit && names_user(grant, requester.user_id)
        });
        let permission = if user_has_edit {
            Permission::Edit
        } else {
            Permission::View
        };
        return Some((permission, Basis::Public));
    }

    grants
        .iter()
        .filter(|grant| matches_requester(grant, requester))
        .map(|grant| grant.permission)
        .max()
        .map(|permission| (permission, Basis::Grant))
}

fn is_owner(facts: &ResourceFacts, requester: &Requester) -> bool {
    requester.user_id == Some(facts.owner_id)
}

fn names_user(grant: &Sharing, user_id: Option<UserId>) -> bool {
    user_id.is_some() && grant.grantee_id == user_id
}

fn matches_requester(grant: &Sharing, requester: &Requester) -> bool {
    let token_matches = match (&grant.access_token, &requester.share_token) {
        (Some(expected), Some(presented)) => tokens_match(expected, presented),
        _ => false,
    };
    token_matches || names_user(grant, requester.user_id) || grant.is_public
}

fn tokens_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::{decide, tokens_match, Basis, Requester};
    use crate::model::sharing::{Permission, ResourceRef, Sharing};
    use crate::model::AccessLevel;
    use crate::repo::access_repo::ResourceFacts;
    use uuid::Uuid;

    fn facts(owner: Uuid, level: AccessLevel) -> ResourceFacts {
        ResourceFacts {
            resource: ResourceRef::Map(Uuid::new_v4()),
            owner_id: owner,
            access_level: level,
        }
    }

    fn grant(
        grantee: Option<Uuid>,
        token: Option<&str>,
        public: bool,
        permission: Permission,
    ) -> Sharing {
        Sharing {
            id: Uuid::new_v4(),
            resource: ResourceRef::Map(Uuid::new_v4()),
            grantee_id: grantee,
            access_token: token.map(str::to_string),
            is_public: public,
            permission,
            created_at: 0,
        }
    }

    #[test]
    fn owner_is_never_downgraded() {
        let owner = Uuid::new_v4();
        let rows = [grant(Some(owner), None, false, Permission::View)];
        assert_eq!(
            decide(&facts(owner, AccessLevel::Private), &Requester::user(owner), &rows),
            Some((Permission::Edit, Basis::Owner))
        );
    }

    #[test]
    fn public_resource_gives_anonymous_view_only() {
        let rows = [grant(None, None, true, Permission::Edit)];
        assert_eq!(
            decide(
                &facts(Uuid::new_v4(), AccessLevel::Public),
                &Requester::anonymous(),
                &rows
            ),
            Some((Permission::View, Basis::Public))
        );
    }

    #[test]
    fn public_resource_gives_edit_to_named_editor() {
        let editor = Uuid::new_v4();
        let rows = [grant(Some(editor), None, false, Permission::Edit)];
        assert_eq!(
            decide(
                &facts(Uuid::new_v4(), AccessLevel::Public),
                &Requester::user(editor),
                &rows
            ),
            Some((Permission::Edit, Basis::Public))
        );
    }

    #[test]
    fn highest_matching_grant_wins() {
        let user = Uuid::new_v4();
        let rows = [
            grant(Some(user), None, false, Permission::View),
            grant(None, Some("tok"), false, Permission::Edit),
        ];
        let requester = Requester::user(user).with_token("tok");
        assert_eq!(
            decide(&facts(Uuid::new_v4(), AccessLevel::Link), &requester, &rows),
            Some((Permission::Edit, Basis::Grant))
        );
    }

    #[test]
    fn wrong_token_and_stranger_are_denied() {
        let rows = [grant(Some(Uuid::new_v4()), Some("tok"), false, Permission::Edit)];
        let owner = Uuid::new_v4();
        assert_eq!(
            decide(&facts(owner, AccessLevel::Private), &Requester::token("nope"), &rows),
            None
        );
        assert_eq!(
            decide(
                &facts(owner, AccessLevel::Private),
                &Requester::user(Uuid::new_v4()),
                &rows
            ),
            None
        );
    }

    #[test]
    fn token_comparison_needs_exact_bytes() {
        assert!(tokens_match("abc123", "abc123"));
        assert!(!tokens_match("abc123", "abc124"));
        assert!(!tokens_match("abc123", "abc12"));
        assert!(!tokens_match("abc123", ""));
    }

    #[test]
    fn requester_debug_hides_token() {
        let rendered = format!("{:?}", Requester::token("secret-token"));
        assert!(!rendered.contains("secret-token"));
    }
}
