//! Repository over the key-value store.
//!
//! Lookups return `Option<T>` so handlers map the missing case at the
//! boundary. Referential integrity lives here: cascade deletes for
//! user -> posts/comments and post -> comments, set-null for
//! group -> posts.

use spin_sdk::key_value::Store;
use uuid::Uuid;

use crate::config::*;
use crate::core::errors::AppError;
use crate::core::helpers::{hash_password, now_iso};
use crate::models::models::{Comment, Group, Post, User};

// === Users ===

pub fn get_user(store: &Store, id: &str) -> anyhow::Result<Option<User>> {
    Ok(store.get_json::<User>(&user_key(id))?)
}

pub fn find_user_by_username(store: &Store, username: &str) -> anyhow::Result<Option<User>> {
    let ids: Vec<String> = store.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    for id in ids {
        if let Some(u) = store.get_json::<User>(&user_key(&id))? {
            if u.username == username {
                return Ok(Some(u));
            }
        }
    }
    Ok(None)
}

pub fn insert_user(store: &Store, user: &User) -> anyhow::Result<()> {
    store.set_json(&user_key(&user.id), user)?;
    let mut ids: Vec<String> = store.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    ids.push(user.id.clone());
    store.set_json(USERS_LIST_KEY, &ids)?;
    Ok(())
}

// === Groups ===

pub fn get_group(store: &Store, slug: &str) -> anyhow::Result<Option<Group>> {
    Ok(store.get_json::<Group>(&group_key(slug))?)
}

pub fn insert_group(store: &Store, group: &Group) -> anyhow::Result<()> {
    if store.get_json::<Group>(&group_key(&group.slug))?.is_some() {
        return Err(AppError::Integrity(format!("duplicate group slug {}", group.slug)).into());
    }
    store.set_json(&group_key(&group.slug), group)?;
    let mut slugs: Vec<String> = store.get_json(GROUPS_LIST_KEY)?.unwrap_or_default();
    slugs.push(group.slug.clone());
    store.set_json(GROUPS_LIST_KEY, &slugs)?;
    Ok(())
}

// === Posts ===

pub fn get_post(store: &Store, id: &str) -> anyhow::Result<Option<Post>> {
    Ok(store.get_json::<Post>(&post_key(id))?)
}

/// Persist a new post and prepend it to the global feed, keeping the
/// feed newest-first.
pub fn insert_post(store: &Store, post: &Post) -> anyhow::Result<()> {
    store.set_json(&post_key(&post.id), post)?;
    let mut feed: Vec<String> = store.get_json(FEED_KEY)?.unwrap_or_default();
    feed.insert(0, post.id.clone());
    store.set_json(FEED_KEY, &feed)?;
    Ok(())
}

/// Overwrite an existing post record. The feed position is untouched:
/// edits never change pub_date.
pub fn update_post(store: &Store, post: &Post) -> anyhow::Result<()> {
    store.set_json(&post_key(&post.id), post)?;
    Ok(())
}

/// All posts, newest first.
pub fn all_posts(store: &Store) -> anyhow::Result<Vec<Post>> {
    let feed: Vec<String> = store.get_json(FEED_KEY)?.unwrap_or_default();
    let mut posts = Vec::with_capacity(feed.len());
    for id in &feed {
        if let Some(p) = store.get_json::<Post>(&post_key(id))? {
            posts.push(p);
        }
    }
    Ok(posts)
}

pub fn posts_by_author(store: &Store, author_id: &str) -> anyhow::Result<Vec<Post>> {
    Ok(all_posts(store)?
        .into_iter()
        .filter(|p| p.author_id == author_id)
        .collect())
}

pub fn posts_in_group(store: &Store, slug: &str) -> anyhow::Result<Vec<Post>> {
    Ok(all_posts(store)?
        .into_iter()
        .filter(|p| p.group_slug.as_deref() == Some(slug))
        .collect())
}

pub fn posts_by_authors(store: &Store, author_ids: &[String]) -> anyhow::Result<Vec<Post>> {
    Ok(all_posts(store)?
        .into_iter()
        .filter(|p| author_ids.contains(&p.author_id))
        .collect())
}

/// Cascade delete: the post's comments go with it.
pub fn delete_post(store: &Store, id: &str) -> anyhow::Result<()> {
    let comment_ids: Vec<String> = store.get_json(&post_comments_key(id))?.unwrap_or_default();
    for cid in &comment_ids {
        store.delete(&comment_key(cid))?;
    }
    store.delete(&post_comments_key(id))?;
    store.delete(&post_key(id))?;

    let mut feed: Vec<String> = store.get_json(FEED_KEY)?.unwrap_or_default();
    feed.retain(|pid| pid != id);
    store.set_json(FEED_KEY, &feed)?;
    Ok(())
}

// === Comments ===

/// Oldest first, matching the order they were added.
pub fn comments_for_post(store: &Store, post_id: &str) -> anyhow::Result<Vec<Comment>> {
    let ids: Vec<String> = store.get_json(&post_comments_key(post_id))?.unwrap_or_default();
    let mut comments = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(c) = store.get_json::<Comment>(&comment_key(id))? {
            comments.push(c);
        }
    }
    Ok(comments)
}

pub fn insert_comment(store: &Store, comment: &Comment) -> anyhow::Result<()> {
    store.set_json(&comment_key(&comment.id), comment)?;
    let key = post_comments_key(&comment.post_id);
    let mut ids: Vec<String> = store.get_json(&key)?.unwrap_or_default();
    ids.push(comment.id.clone());
    store.set_json(&key, &ids)?;
    Ok(())
}

// === Follow edges ===

/// Author ids the user subscribes to.
pub fn following(store: &Store, user_id: &str) -> anyhow::Result<Vec<String>> {
    Ok(store.get_json(&follows_key(user_id))?.unwrap_or_default())
}

pub fn is_following(store: &Store, user_id: &str, author_id: &str) -> anyhow::Result<bool> {
    Ok(following(store, user_id)?.iter().any(|id| id == author_id))
}

/// Create a user -> author edge. Self-follows violate the schema
/// constraint and fail with an integrity error. Duplicate edges are not
/// rejected here; the follow handler's existence check is the only
/// deduplication.
pub fn create_follow(store: &Store, user_id: &str, author_id: &str) -> anyhow::Result<()> {
    if user_id == author_id {
        return Err(AppError::Integrity("self-follow is not allowed".to_string()).into());
    }
    let key = follows_key(user_id);
    let mut follows: Vec<String> = store.get_json(&key)?.unwrap_or_default();
    follows.push(author_id.to_string());
    store.set_json(&key, &follows)?;
    Ok(())
}

/// Remove one matching edge. Returns false when no edge existed.
pub fn delete_follow(store: &Store, user_id: &str, author_id: &str) -> anyhow::Result<bool> {
    let key = follows_key(user_id);
    let mut follows: Vec<String> = store.get_json(&key)?.unwrap_or_default();
    let before = follows.len();
    if let Some(pos) = follows.iter().position(|id| id == author_id) {
        follows.remove(pos);
    }
    if follows.len() == before {
        return Ok(false);
    }
    store.set_json(&key, &follows)?;
    Ok(true)
}

// === Cascades spanning entities ===

/// Deleting a user removes their posts (and those posts' comments),
/// their comments elsewhere, and follow edges in both directions.
pub fn delete_user(store: &Store, id: &str) -> anyhow::Result<()> {
    for post in posts_by_author(store, id)? {
        delete_post(store, &post.id)?;
    }

    // Comments the user left on other authors' posts.
    let feed: Vec<String> = store.get_json(FEED_KEY)?.unwrap_or_default();
    for post_id in &feed {
        let key = post_comments_key(post_id);
        let ids: Vec<String> = store.get_json(&key)?.unwrap_or_default();
        let mut kept = Vec::with_capacity(ids.len());
        for cid in ids {
            match store.get_json::<Comment>(&comment_key(&cid))? {
                Some(c) if c.author_id == id => store.delete(&comment_key(&cid))?,
                _ => kept.push(cid),
            }
        }
        store.set_json(&key, &kept)?;
    }

    // Outbound edges, then inbound edges from everyone else.
    store.delete(&follows_key(id))?;
    let user_ids: Vec<String> = store.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    for uid in &user_ids {
        if uid != id {
            delete_follow(store, uid, id)?;
        }
    }

    store.delete(&user_key(id))?;
    let remaining: Vec<String> = user_ids.into_iter().filter(|uid| uid != id).collect();
    store.set_json(USERS_LIST_KEY, &remaining)?;
    Ok(())
}

/// Deleting a group orphans its posts instead of removing them:
/// group_slug goes to None (set-null rule). Handlers never call this;
/// it exists for operator tooling and tests.
pub fn delete_group(store: &Store, slug: &str) -> anyhow::Result<()> {
    for mut post in posts_in_group(store, slug)? {
        post.group_slug = None;
        update_post(store, &post)?;
    }
    store.delete(&group_key(slug))?;
    let slugs: Vec<String> = store.get_json(GROUPS_LIST_KEY)?.unwrap_or_default();
    let remaining: Vec<String> = slugs.into_iter().filter(|s| s != slug).collect();
    store.set_json(GROUPS_LIST_KEY, &remaining)?;
    Ok(())
}

// === Seed data for local runs ===

pub fn seed_demo_data(store: &Store) -> anyhow::Result<()> {
    if find_user_by_username(store, "leo")?.is_some() {
        return Ok(());
    }

    let group = Group {
        title: "Travel".to_string(),
        slug: "travel".to_string(),
        description: "Places worth writing about".to_string(),
    };
    if get_group(store, &group.slug)?.is_none() {
        insert_group(store, &group)?;
    }

    let leo = User {
        id: Uuid::new_v4().to_string(),
        username: "leo".to_string(),
        password: hash_password("leo")?,
        joined: now_iso(),
    };
    let mira = User {
        id: Uuid::new_v4().to_string(),
        username: "mira".to_string(),
        password: hash_password("mira")?,
        joined: now_iso(),
    };
    insert_user(store, &leo)?;
    insert_user(store, &mira)?;

    let first = Post {
        id: Uuid::new_v4().to_string(),
        author_id: leo.id.clone(),
        group_slug: Some("travel".to_string()),
        text: "Took the night train north. Worth every delayed minute.".to_string(),
        image: None,
        pub_date: now_iso(),
    };
    insert_post(store, &first)?;

    let second = Post {
        id: Uuid::new_v4().to_string(),
        author_id: mira.id.clone(),
        group_slug: None,
        text: "Hello! First post here.".to_string(),
        image: None,
        pub_date: now_iso(),
    };
    insert_post(store, &second)?;

    create_follow(store, &mira.id, &leo.id)?;
    Ok(())
}

pub fn reset_all(store: &Store) -> anyhow::Result<()> {
    let user_ids: Vec<String> = store.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    for id in &user_ids {
        store.delete(&user_key(id))?;
        store.delete(&follows_key(id))?;
    }

    let feed: Vec<String> = store.get_json(FEED_KEY)?.unwrap_or_default();
    for id in &feed {
        let comment_ids: Vec<String> = store.get_json(&post_comments_key(id))?.unwrap_or_default();
        for cid in comment_ids {
            store.delete(&comment_key(&cid))?;
        }
        store.delete(&post_comments_key(id))?;
        store.delete(&post_key(id))?;
    }

    let slugs: Vec<String> = store.get_json(GROUPS_LIST_KEY)?.unwrap_or_default();
    for slug in &slugs {
        store.delete(&group_key(slug))?;
    }

    store.delete(USERS_LIST_KEY)?;
    store.delete(GROUPS_LIST_KEY)?;
    store.delete(FEED_KEY)?;
    Ok(())
}
