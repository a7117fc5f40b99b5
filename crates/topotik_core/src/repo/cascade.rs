//! Explicit cascade deletes.
//!
//! The schema also declares `ON DELETE CASCADE`, but the core performs child
//! cleanup itself so the invariant holds regardless of engine settings.
//! Every function here must run inside the caller's transaction.

use super::RepoResult;
use crate::model::article::ArticleId;
use crate::model::collection::CollectionId;
use crate::model::map::MapId;
use crate::model::marker::MarkerId;
use log::debug;
use rusqlite::Transaction;

/// Removes a map with its markers, collections, articles, blocks and
/// association rows. Returns the number of map rows deleted.
pub(crate) fn delete_map_tree(tx: &Transaction<'_>, map_id: MapId) -> RepoResult<usize> {
    let id = map_id.to_string();
    let blocks = tx.execute(
        "DELETE FROM blocks
         WHERE article_id IN (
             SELECT a.id
             FROM articles a
             INNER JOIN markers m ON m.id = a.marker_id
             WHERE m.map_id = ?1
         );",
        [id.as_str()],
    )?;
    let articles = tx.execute(
        "DELETE FROM articles
         WHERE marker_id IN (SELECT id FROM markers WHERE map_id = ?1);",
        [id.as_str()],
    )?;
    let links = tx.execute(
        "DELETE FROM marker_collections
         WHERE marker_id IN (SELECT id FROM markers WHERE map_id = ?1)
            OR collection_id IN (SELECT id FROM collections WHERE map_id = ?1);",
        [id.as_str()],
    )?;
    let markers = tx.execute("DELETE FROM markers WHERE map_id = ?1;", [id.as_str()])?;
    let collections = tx.execute("DELETE FROM collections WHERE map_id = ?1;", [id.as_str()])?;
    let maps = tx.execute("DELETE FROM maps WHERE id = ?1;", [id.as_str()])?;

    debug!(
        "event=cascade_delete module=repo entity=map markers={markers} collections={collections} articles={articles} blocks={blocks} links={links}"
    );
    Ok(maps)
}

/// Removes a marker with its articles, blocks and collection links.
pub(crate) fn delete_marker_tree(tx: &Transaction<'_>, marker_id: MarkerId) -> RepoResult<usize> {
    let id = marker_id.to_string();
    let blocks = tx.execute(
        "DELETE FROM blocks
         WHERE article_id IN (SELECT id FROM articles WHERE marker_id = ?1);",
        [id.as_str()],
    )?;
    let articles = tx.execute("DELETE FROM articles WHERE marker_id = ?1;", [id.as_str()])?;
    let links = tx.execute(
        "DELETE FROM marker_collections WHERE marker_id = ?1;",
        [id.as_str()],
    )?;
    let markers = tx.execute("DELETE FROM markers WHERE id = ?1;", [id.as_str()])?;

    debug!(
        "event=cascade_delete module=repo entity=marker articles={articles} blocks={blocks} links={links}"
    );
    Ok(markers)
}

/// Removes a collection and its marker links. Markers are untouched.
pub(crate) fn delete_collection_tree(
    tx: &Transaction<'_>,
    collection_id: CollectionId,
) -> RepoResult<usize> {
    let id = collection_id.to_string();
    let links = tx.execute(
        "DELETE FROM marker_collections WHERE collection_id = ?1;",
        [id.as_str()],
    )?;
    let collections = tx.execute("DELETE FROM collections WHERE id = ?1;", [id.as_str()])?;

    debug!("event=cascade_delete module=repo entity=collection links={links}");
    Ok(collections)
}

/// Removes an article and its blocks.
pub(crate) fn delete_article_tree(
    tx: &Transaction<'_>,
    article_id: ArticleId,
) -> RepoResult<usize> {
    let id = article_id.to_string();
    let blocks = tx.execute("DELETE FROM blocks WHERE article_id = ?1;", [id.as_str()])?;
    let articles = tx.execute("DELETE FROM articles WHERE id = ?1;", [id.as_str()])?;

    debug!("event=cascade_delete module=repo entity=article blocks={blocks}");
    Ok(articles)
}
