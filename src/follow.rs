//! Author subscriptions: the filtered feed and the follow/unfollow
//! actions.

use spin_sdk::http::{Request, Response};

use crate::auth::require_login;
use crate::config::posts_per_page;
use crate::core::db;
use crate::core::errors::AppError;
use crate::core::helpers::{redirect, redirect_to_referer, store};
use crate::core::pagination::paginate;
use crate::core::query_params::page_number;
use crate::templates;

/// Posts authored by anyone the current user follows, newest first.
pub fn follow_index(req: &Request) -> anyhow::Result<Response> {
    let user = match require_login(req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let store = store();
    let authors = db::following(&store, &user.id)?;
    let page = paginate(
        db::posts_by_authors(&store, &authors)?,
        posts_per_page(),
        page_number(req.uri()),
    );

    templates::page(
        "follow.html",
        &[
            ("POST_LIST", templates::post_list_html(&store, &page.items)?.as_str()),
            ("PAGINATION", templates::pagination_html(&page, "/follow/").as_str()),
        ],
    )
}

/// Subscribe to an author. Following yourself or someone you already
/// follow is a no-op that bounces back to where you came from.
pub fn profile_follow(req: &Request, username: &str) -> anyhow::Result<Response> {
    let user = match require_login(req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let store = store();
    let Some(author) = db::find_user_by_username(&store, username)? else {
        return Ok(AppError::NotFound.into());
    };

    let profile_url = format!("/profile/{}/", username);
    if author.id == user.id || db::is_following(&store, &user.id, &author.id)? {
        return Ok(redirect_to_referer(req, &profile_url));
    }

    db::create_follow(&store, &user.id, &author.id)?;
    tracing::info!(follower = %user.username, author = %author.username, "follow");
    Ok(redirect(&profile_url))
}

/// Drop the subscription. Unfollowing someone you never followed is a
/// not-found, mirroring the missing-edge lookup.
pub fn profile_unfollow(req: &Request, username: &str) -> anyhow::Result<Response> {
    let user = match require_login(req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let store = store();
    let Some(author) = db::find_user_by_username(&store, username)? else {
        return Ok(AppError::NotFound.into());
    };

    if !db::delete_follow(&store, &user.id, &author.id)? {
        return Ok(AppError::NotFound.into());
    }
    tracing::info!(follower = %user.username, author = %author.username, "unfollow");

    Ok(redirect_to_referer(req, &format!("/profile/{}/", username)))
}
