use spin_sdk::http::{Request, Response};
#[cfg(target_arch = "wasm32")]
use spin_sdk::{http::IntoResponse, http_component};

pub mod admin;
pub mod auth;
pub mod config;
pub mod follow;
pub mod forms;
pub mod posts;
pub mod profiles;
pub mod static_server;
pub mod templates;

pub mod core {
    pub mod cache;
    pub mod db;
    pub mod errors;
    pub mod helpers;
    pub mod pagination;
    pub mod query_params;
}

pub mod models {
    pub mod models;
}

use crate::core::cache::PageCache;
use crate::core::errors::AppError;
use crate::core::helpers::store;

/// Route a request and collapse any unhandled error into the rendered
/// 500 page. Shared by the Spin component and the native adapter.
pub fn dispatch(req: Request) -> Response {
    let kv = store();
    let _ = crate::core::db::seed_demo_data(&kv); // first-request seed

    match route(&req, &kv) {
        Ok(resp) => resp,
        Err(err) => {
            let app: AppError = err.into();
            app.into()
        }
    }
}

fn route(req: &Request, kv: &spin_sdk::key_value::Store) -> anyhow::Result<Response> {
    let cache = PageCache::new(kv, config::index_cache_ttl_secs());
    let method = req.method().to_string();
    let path = req.path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Cross-site form posts are rejected outright.
    if method == "POST" {
        let fetch_site = req.header("Sec-Fetch-Site").and_then(|h| h.as_str());
        if fetch_site == Some("cross-site") {
            return Ok(AppError::Forbidden.into());
        }
    }

    match (method.as_str(), segments.as_slice()) {
        ("GET", []) => posts::index(req, &cache),
        ("GET", ["group", slug]) => posts::group_posts(req, slug),
        ("GET", ["profile", username]) => profiles::profile(req, username),
        ("GET", ["posts", id]) => posts::post_detail(req, id),
        ("GET" | "POST", ["create"]) => posts::post_create(req, &cache),
        ("GET" | "POST", ["posts", id, "edit"]) => posts::post_edit(req, id, &cache),
        ("POST", ["posts", id, "comment"]) => posts::add_comment(req, id),
        ("GET", ["follow"]) => follow::follow_index(req),
        ("POST", ["profile", username, "follow"]) => follow::profile_follow(req, username),
        ("POST", ["profile", username, "unfollow"]) => follow::profile_unfollow(req, username),
        ("GET", ["auth", "login"]) => auth::login_page(req),
        ("POST", ["auth", "login"]) => auth::login_submit(req),
        ("GET", ["auth", "signup"]) => auth::signup_page(req),
        ("POST", ["auth", "signup"]) => auth::signup_submit(req),
        ("POST", ["auth", "logout"]) => auth::logout(req),
        ("GET", ["admin"]) => admin::registry_page(),
        ("GET", ["media", rest @ ..]) => static_server::serve_media(&rest.join("/")),
        ("GET", _) if path.contains('.') => static_server::serve_static(&path),
        _ => Ok(AppError::NotFound.into()),
    }
}

#[cfg(target_arch = "wasm32")]
#[http_component]
fn handle(req: Request) -> anyhow::Result<impl IntoResponse> {
    Ok(dispatch(req))
}
