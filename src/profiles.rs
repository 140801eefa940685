//! Author profile page.

use spin_sdk::http::{Request, Response};

use crate::auth::current_user;
use crate::config::posts_per_page;
use crate::core::db;
use crate::core::errors::AppError;
use crate::core::helpers::store;
use crate::core::pagination::paginate;
use crate::core::query_params::page_number;
use crate::templates;

pub fn profile(req: &Request, username: &str) -> anyhow::Result<Response> {
    let store = store();
    let Some(author) = db::find_user_by_username(&store, username)? else {
        return Ok(AppError::NotFound.into());
    };

    let posts = db::posts_by_author(&store, &author.id)?;
    let total = posts.len();
    let page = paginate(posts, posts_per_page(), page_number(req.uri()));

    // Follow controls depend on who is looking.
    let viewer = current_user(req);
    let following = match &viewer {
        Some(user) => db::is_following(&store, &user.id, &author.id)?,
        None => false,
    };
    let follow_controls = match &viewer {
        Some(user) if user.id == author.id => String::new(),
        Some(_) if following => format!(
            r#"<form method="post" action="/profile/{0}/unfollow/"><button>Unfollow</button></form>"#,
            html_escape::encode_double_quoted_attribute(username)
        ),
        Some(_) => format!(
            r#"<form method="post" action="/profile/{0}/follow/"><button>Follow</button></form>"#,
            html_escape::encode_double_quoted_attribute(username)
        ),
        None => String::new(),
    };

    let base = format!("/profile/{}/", username);
    templates::page(
        "profile.html",
        &[
            ("PROFILE_USERNAME", html_escape::encode_text(&author.username).as_ref()),
            ("POST_COUNT", total.to_string().as_str()),
            ("FOLLOW_CONTROLS", follow_controls.as_str()),
            ("POST_LIST", templates::post_list_html(&store, &page.items)?.as_str()),
            ("PAGINATION", templates::pagination_html(&page, &base).as_str()),
        ],
    )
}
