mod common;

use common::{core, map, marker, user};
use topotik_core::model::article::BlockType;
use topotik_core::model::sharing::NewSharing;
use topotik_core::repo::sharing_repo::{SharingRepository, SqliteSharingRepository};
use topotik_core::service::sharing_service::ShareRequest;
use topotik_core::{
    AccessError, AccessLevel, AccessTarget, EntityKind, Permission, RepoError, Requester,
    ResourceRef, ValidationError,
};
use uuid::Uuid;

#[test]
fn owner_keeps_edit_despite_view_grant_naming_them() {
    let core = core();
    let ann = user(&core, "ann");
    let owned = map(&core, &ann, AccessLevel::Private);
    core.sharings()
        .unwrap()
        .create_sharing(&ShareRequest::for_user(
            ResourceRef::Map(owned.id),
            ann.id,
            Permission::View,
        ))
        .unwrap();

    let access = core.access().unwrap();
    assert_eq!(
        access
            .resolve(&Requester::user(ann.id), AccessTarget::Map(owned.id))
            .unwrap(),
        Permission::Edit
    );
}

#[test]
fn public_map_gives_anonymous_view_never_edit() {
    let core = core();
    let ann = user(&core, "ann");
    let open = map(&core, &ann, AccessLevel::Public);
    let access = core.access().unwrap();

    assert_eq!(
        access
            .resolve(&Requester::anonymous(), AccessTarget::Map(open.id))
            .unwrap(),
        Permission::View
    );
    assert!(matches!(
        access.check_access(
            &Requester::anonymous(),
            AccessTarget::Map(open.id),
            Permission::Edit
        ),
        Err(AccessError::Forbidden)
    ));
}

#[test]
fn public_map_gives_edit_to_user_with_edit_grant() {
    let core = core();
    let ann = user(&core, "ann");
    let bob = user(&core, "bob");
    let cat = user(&core, "cat");
    let open = map(&core, &ann, AccessLevel::Public);
    core.sharings()
        .unwrap()
        .create_sharing(&ShareRequest::for_user(
            ResourceRef::Map(open.id),
            bob.id,
            Permission::Edit,
        ))
        .unwrap();

    let access = core.access().unwrap();
    assert_eq!(
        access
            .resolve(&Requester::user(bob.id), AccessTarget::Map(open.id))
            .unwrap(),
        Permission::Edit
    );
    assert_eq!(
        access
            .resolve(&Requester::user(cat.id), AccessTarget::Map(open.id))
            .unwrap(),
        Permission::View
    );
}

#[test]
fn missing_resource_is_not_found_and_existing_one_is_forbidden() {
    let core = core();
    let ann = user(&core, "ann");
    let bob = user(&core, "bob");
    let private = map(&core, &ann, AccessLevel::Private);
    let access = core.access().unwrap();
    let stranger = Requester::user(bob.id);

    let missing = Uuid::new_v4();
    assert!(matches!(
        access.resolve(&stranger, AccessTarget::Map(missing)),
        Err(AccessError::NotFound { entity: EntityKind::Map, id }) if id == missing
    ));
    assert!(matches!(
        access.resolve(&stranger, AccessTarget::Collection(Uuid::new_v4())),
        Err(AccessError::NotFound {
            entity: EntityKind::Collection,
            ..
        })
    ));
    assert!(matches!(
        access.resolve(&stranger, AccessTarget::Map(private.id)),
        Err(AccessError::Forbidden)
    ));
    assert!(matches!(
        access.resolve(&Requester::anonymous(), AccessTarget::Map(private.id)),
        Err(AccessError::Forbidden)
    ));
}

#[test]
fn link_token_grants_its_permission_and_wrong_token_does_not() {
    let core = core();
    let ann = user(&core, "ann");
    let shared = map(&core, &ann, AccessLevel::Link);
    let sharing = core
        .sharings()
        .unwrap()
        .create_sharing(&ShareRequest::for_link(
            ResourceRef::Map(shared.id),
            Permission::View,
        ))
        .unwrap();
    let token = sharing.access_token.clone().unwrap();
    assert_eq!(token.len(), 64);

    let access = core.access().unwrap();
    assert_eq!(
        access
            .resolve(&Requester::token(token.clone()), AccessTarget::Map(shared.id))
            .unwrap(),
        Permission::View
    );
    assert!(matches!(
        access.check_access(
            &Requester::token(token),
            AccessTarget::Map(shared.id),
            Permission::Edit
        ),
        Err(AccessError::Forbidden)
    ));
    assert!(matches!(
        access.resolve(&Requester::token("guess"), AccessTarget::Map(shared.id)),
        Err(AccessError::Forbidden)
    ));
}

#[test]
fn highest_of_several_matching_grants_wins() {
    let core = core();
    let ann = user(&core, "ann");
    let bob = user(&core, "bob");
    let shared = map(&core, &ann, AccessLevel::Private);
    let sharings = core.sharings().unwrap();
    sharings
        .create_sharing(&ShareRequest::for_user(
            ResourceRef::Map(shared.id),
            bob.id,
            Permission::View,
        ))
        .unwrap();
    let editor_link = sharings
        .create_sharing(&ShareRequest::for_link(
            ResourceRef::Map(shared.id),
            Permission::Edit,
        ))
        .unwrap();

    let access = core.access().unwrap();
    let bob_alone = Requester::user(bob.id);
    assert_eq!(
        access
            .resolve(&bob_alone, AccessTarget::Map(shared.id))
            .unwrap(),
        Permission::View
    );
    let bob_with_link =
        Requester::user(bob.id).with_token(editor_link.access_token.unwrap());
    assert_eq!(
        access
            .resolve(&bob_with_link, AccessTarget::Map(shared.id))
            .unwrap(),
        Permission::Edit
    );
}

#[test]
fn public_sharing_row_grants_everyone() {
    let core = core();
    let ann = user(&core, "ann");
    let shared = map(&core, &ann, AccessLevel::Private);
    core.sharings()
        .unwrap()
        .create_sharing(&ShareRequest::for_everyone(
            ResourceRef::Map(shared.id),
            Permission::View,
        ))
        .unwrap();

    assert_eq!(
        core.access()
            .unwrap()
            .resolve(&Requester::anonymous(), AccessTarget::Map(shared.id))
            .unwrap(),
        Permission::View
    );
}

#[test]
fn content_resolves_through_owning_map() {
    let core = core();
    let ann = user(&core, "ann");
    let bob = user(&core, "bob");
    let parent = map(&core, &ann, AccessLevel::Private);
    let placed = marker(&core, &parent, "a");
    let articles = core.articles().unwrap();
    let article = articles.create_article(placed.id).unwrap();
    let block = articles
        .append_block(article.id, BlockType::Text, "x", 0)
        .unwrap();
    core.sharings()
        .unwrap()
        .create_sharing(&ShareRequest::for_user(
            ResourceRef::Map(parent.id),
            bob.id,
            Permission::Edit,
        ))
        .unwrap();

    let access = core.access().unwrap();
    for target in [
        AccessTarget::Marker(placed.id),
        AccessTarget::Article(article.id),
        AccessTarget::Block(block.id),
    ] {
        assert_eq!(
            access.resolve(&Requester::user(ann.id), target).unwrap(),
            Permission::Edit
        );
        assert_eq!(
            access.resolve(&Requester::user(bob.id), target).unwrap(),
            Permission::Edit
        );
        assert!(matches!(
            access.resolve(&Requester::anonymous(), target),
            Err(AccessError::Forbidden)
        ));
    }

    assert!(matches!(
        access.resolve(&Requester::user(ann.id), AccessTarget::Block(Uuid::new_v4())),
        Err(AccessError::NotFound {
            entity: EntityKind::Block,
            ..
        })
    ));
}

#[test]
fn collection_ownership_and_grants_are_independent_of_map() {
    let core = core();
    let ann = user(&core, "ann");
    let bob = user(&core, "bob");
    let parent = map(&core, &ann, AccessLevel::Private);
    let group = core
        .collections()
        .unwrap()
        .create_collection(parent.id, bob.id, "Bob's picks", AccessLevel::Private)
        .unwrap();

    let access = core.access().unwrap();
    assert_eq!(
        access
            .resolve(&Requester::user(bob.id), AccessTarget::Collection(group.id))
            .unwrap(),
        Permission::Edit
    );
    assert!(matches!(
        access.resolve(&Requester::user(ann.id), AccessTarget::Collection(group.id)),
        Err(AccessError::Forbidden)
    ));
}

#[test]
fn collection_owner_gains_nothing_on_linked_markers() {
    let core = core();
    let ann = user(&core, "ann");
    let bob = user(&core, "bob");
    let parent = map(&core, &ann, AccessLevel::Private);
    let placed = marker(&core, &parent, "bridge");
    let collections = core.collections().unwrap();
    let group = collections
        .create_collection(parent.id, bob.id, "Bob's picks", AccessLevel::Private)
        .unwrap();
    collections
        .add_marker_to_collection(placed.id, group.id)
        .unwrap();

    assert!(matches!(
        core.access()
            .unwrap()
            .resolve(&Requester::user(bob.id), AccessTarget::Marker(placed.id)),
        Err(AccessError::Forbidden)
    ));
}

#[test]
fn dangling_sharing_resolves_to_not_found() {
    let core = core();
    let ann = user(&core, "ann");
    let bob = user(&core, "bob");
    let shared = map(&core, &ann, AccessLevel::Private);
    let sharing = core
        .sharings()
        .unwrap()
        .create_sharing(&ShareRequest::for_user(
            ResourceRef::Map(shared.id),
            bob.id,
            Permission::Edit,
        ))
        .unwrap();

    core.maps().unwrap().delete_map(shared.id).unwrap();

    assert!(core
        .sharings()
        .unwrap()
        .get_sharing(sharing.id)
        .unwrap()
        .is_some());
    assert!(matches!(
        core.access()
            .unwrap()
            .resolve(&Requester::user(bob.id), AccessTarget::Map(shared.id)),
        Err(AccessError::NotFound { .. })
    ));
}

#[test]
fn sharing_needs_audience_and_existing_target() {
    let core = core();
    let ann = user(&core, "ann");
    let shared = map(&core, &ann, AccessLevel::Private);
    let repo = SqliteSharingRepository::try_new(core.connection()).unwrap();

    let no_audience = NewSharing {
        resource: ResourceRef::Map(shared.id),
        grantee_id: None,
        access_token: None,
        is_public: false,
        permission: Permission::View,
    };
    assert!(matches!(
        repo.create_sharing(&no_audience),
        Err(RepoError::Validation(ValidationError::ShareWithoutAudience))
    ));

    let missing_target = NewSharing {
        resource: ResourceRef::Collection(Uuid::new_v4()),
        is_public: true,
        ..no_audience.clone()
    };
    assert!(matches!(
        repo.create_sharing(&missing_target),
        Err(RepoError::NotFound {
            entity: EntityKind::Collection,
            ..
        })
    ));

    let missing_grantee = NewSharing {
        grantee_id: Some(Uuid::new_v4()),
        ..no_audience
    };
    assert!(matches!(
        repo.create_sharing(&missing_grantee),
        Err(RepoError::NotFound {
            entity: EntityKind::User,
            ..
        })
    ));
}

#[test]
fn duplicate_access_token_is_conflict() {
    let core = core();
    let ann = user(&core, "ann");
    let shared = map(&core, &ann, AccessLevel::Link);
    let repo = SqliteSharingRepository::try_new(core.connection()).unwrap();
    let with_token = NewSharing {
        resource: ResourceRef::Map(shared.id),
        grantee_id: None,
        access_token: Some("fixed-token".to_string()),
        is_public: false,
        permission: Permission::View,
    };

    repo.create_sharing(&with_token).unwrap();
    assert!(matches!(
        repo.create_sharing(&with_token),
        Err(RepoError::Conflict(_))
    ));
}

#[test]
fn sharings_list_per_resource_and_delete() {
    let core = core();
    let ann = user(&core, "ann");
    let bob = user(&core, "bob");
    let first = map(&core, &ann, AccessLevel::Private);
    let second = map(&core, &ann, AccessLevel::Private);
    let sharings = core.sharings().unwrap();

    let grant = sharings
        .create_sharing(&ShareRequest::for_user(
            ResourceRef::Map(first.id),
            bob.id,
            Permission::View,
        ))
        .unwrap();
    sharings
        .create_sharing(&ShareRequest::for_link(
            ResourceRef::Map(second.id),
            Permission::View,
        ))
        .unwrap();

    let listed = sharings.list_sharings(ResourceRef::Map(first.id)).unwrap();
    assert_eq!(listed, vec![grant.clone()]);

    sharings.delete_sharing(grant.id).unwrap();
    assert!(sharings
        .list_sharings(ResourceRef::Map(first.id))
        .unwrap()
        .is_empty());
    assert!(matches!(
        core.access()
            .unwrap()
            .resolve(&Requester::user(bob.id), AccessTarget::Map(first.id)),
        Err(AccessError::Forbidden)
    ));
}
