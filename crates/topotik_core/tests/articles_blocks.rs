mod common;

use common::{core, count_rows, map, marker, user};
use serde_json::json;
use topotik_core::model::article::{BlockPatch, BlockType};
use topotik_core::{AccessLevel, EntityKind, Page, RepoError, ValidationError};
use uuid::Uuid;

#[test]
fn blocks_sort_by_order_then_creation() {
    let core = core();
    let ann = user(&core, "ann");
    let parent = map(&core, &ann, AccessLevel::Private);
    let placed = marker(&core, &parent, "a");
    let articles = core.articles().unwrap();
    let article = articles.create_article(placed.id).unwrap();

    let late = articles
        .append_block(article.id, BlockType::Text, "late", 5)
        .unwrap();
    let tie_first = articles
        .append_block(article.id, BlockType::Image, "img.png", 1)
        .unwrap();
    let tie_second = articles
        .append_block(article.id, BlockType::Link, "https://example.org", 1)
        .unwrap();
    let early = articles
        .append_block(article.id, BlockType::Video, "clip.mp4", -1)
        .unwrap();

    let order: Vec<_> = articles
        .list_blocks(article.id, Page::default())
        .unwrap()
        .into_iter()
        .map(|block| block.id)
        .collect();
    assert_eq!(order, [early.id, tie_first.id, tie_second.id, late.id]);

    let page: Vec<_> = articles
        .list_blocks(article.id, Page::new(1, Some(2)))
        .unwrap()
        .into_iter()
        .map(|block| block.id)
        .collect();
    assert_eq!(page, [tie_first.id, tie_second.id]);
}

#[test]
fn update_block_reorders_and_keeps_other_fields() {
    let core = core();
    let ann = user(&core, "ann");
    let parent = map(&core, &ann, AccessLevel::Private);
    let placed = marker(&core, &parent, "a");
    let articles = core.articles().unwrap();
    let article = articles.create_article(placed.id).unwrap();
    let first = articles
        .append_block(article.id, BlockType::Text, "one", 0)
        .unwrap();
    let second = articles
        .append_block(article.id, BlockType::Text, "two", 1)
        .unwrap();

    let moved = articles
        .update_block(
            first.id,
            &BlockPatch {
                order: Some(2),
                ..BlockPatch::default()
            },
        )
        .unwrap();
    assert_eq!(moved.order, 2);
    assert_eq!(moved.content, "one");
    assert_eq!(moved.kind, BlockType::Text);

    let order: Vec<_> = articles
        .list_blocks(article.id, Page::default())
        .unwrap()
        .into_iter()
        .map(|block| block.id)
        .collect();
    assert_eq!(order, [second.id, first.id]);

    let retyped = articles
        .update_block_fields(second.id, json!({ "type": "link", "content": "https://x.io" }))
        .unwrap();
    assert_eq!(retyped.kind, BlockType::Link);
    assert_eq!(retyped.order, 1);
}

#[test]
fn block_updates_reject_unknown_type_and_missing_block() {
    let core = core();
    let ann = user(&core, "ann");
    let parent = map(&core, &ann, AccessLevel::Private);
    let placed = marker(&core, &parent, "a");
    let articles = core.articles().unwrap();
    let article = articles.create_article(placed.id).unwrap();
    let block = articles
        .append_block(article.id, BlockType::Text, "x", 0)
        .unwrap();

    for fields in [
        json!({ "type": "audio" }),
        json!({ "type": null }),
        json!({ "content": null }),
        json!({ "order": null }),
    ] {
        assert!(matches!(
            articles.update_block_fields(block.id, fields),
            Err(RepoError::Validation(ValidationError::InvalidPatch(_)))
        ));
    }
    assert_eq!(articles.get_block(block.id).unwrap().unwrap(), block);
    assert!(matches!(
        articles.update_block(Uuid::new_v4(), &BlockPatch::default()),
        Err(RepoError::NotFound {
            entity: EntityKind::Block,
            ..
        })
    ));
}

#[test]
fn article_requires_marker_and_block_requires_article() {
    let core = core();
    let articles = core.articles().unwrap();
    assert!(matches!(
        articles.create_article(Uuid::new_v4()),
        Err(RepoError::NotFound {
            entity: EntityKind::Marker,
            ..
        })
    ));
    assert!(matches!(
        articles.append_block(Uuid::new_v4(), BlockType::Text, "x", 0),
        Err(RepoError::NotFound {
            entity: EntityKind::Article,
            ..
        })
    ));
}

#[test]
fn deleting_article_removes_its_blocks_only() {
    let core = core();
    let ann = user(&core, "ann");
    let parent = map(&core, &ann, AccessLevel::Private);
    let placed = marker(&core, &parent, "a");
    let articles = core.articles().unwrap();
    let doomed = articles.create_article(placed.id).unwrap();
    let kept = articles.create_article(placed.id).unwrap();
    for index in 0..3 {
        articles
            .append_block(doomed.id, BlockType::Text, "x", index)
            .unwrap();
    }
    let kept_block = articles
        .append_block(kept.id, BlockType::Text, "y", 0)
        .unwrap();

    articles.delete_article(doomed.id).unwrap();
    assert!(articles.get_article(doomed.id).unwrap().is_none());
    assert_eq!(
        count_rows(
            &core,
            "SELECT COUNT(*) FROM blocks WHERE article_id = ?1;",
            &doomed.id.to_string()
        ),
        0
    );
    assert!(articles.get_block(kept_block.id).unwrap().is_some());

    let listed = articles
        .list_articles_by_marker(placed.id, Page::default())
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, kept.id);
}

#[test]
fn deleting_marker_removes_articles_and_blocks() {
    let core = core();
    let ann = user(&core, "ann");
    let parent = map(&core, &ann, AccessLevel::Private);
    let placed = marker(&core, &parent, "a");
    let articles = core.articles().unwrap();
    let article = articles.create_article(placed.id).unwrap();
    let block = articles
        .append_block(article.id, BlockType::Text, "x", 0)
        .unwrap();

    core.markers().unwrap().delete_marker(placed.id).unwrap();

    assert!(articles.get_article(article.id).unwrap().is_none());
    assert!(articles.get_block(block.id).unwrap().is_none());
}

#[test]
fn delete_block_returns_removed_block() {
    let core = core();
    let ann = user(&core, "ann");
    let parent = map(&core, &ann, AccessLevel::Private);
    let placed = marker(&core, &parent, "a");
    let articles = core.articles().unwrap();
    let article = articles.create_article(placed.id).unwrap();
    let block = articles
        .append_block(article.id, BlockType::Text, "x", 0)
        .unwrap();

    let removed = articles.delete_block(block.id).unwrap();
    assert_eq!(removed, block);
    assert!(articles
        .list_blocks(article.id, Page::default())
        .unwrap()
        .is_empty());
}
