//! Session-cookie authentication. Sessions live in the key-value store
//! under `session:<token>` and expire after a configured number of
//! hours. Handlers that need a user call `require_login`, which answers
//! unauthenticated requests with a redirect to the login page carrying
//! the original target in `?next=`.

use spin_sdk::http::{Request, Response};
use uuid::Uuid;

use crate::config::{
    session_expiration_hours, session_key, MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH,
    MIN_USERNAME_LENGTH,
};
use crate::core::db;
use crate::core::helpers::{
    hash_password, now_iso, redirect, sanitize_text, store, verify_password,
};
use crate::core::query_params::next_target;
use crate::forms::parse_form;
use crate::models::models::{SessionData, User};
use crate::templates;

fn session_token(req: &Request) -> Option<String> {
    let cookies = req.header("Cookie")?.as_str()?;
    for cookie in cookies.split(';') {
        let cookie = cookie.trim();
        if let Some(token) = cookie.strip_prefix("session=") {
            return Some(token.to_string());
        }
    }
    None
}

pub fn current_user(req: &Request) -> Option<User> {
    let token = session_token(req)?;
    let store = store();
    let data = store
        .get_json::<SessionData>(&session_key(&token))
        .ok()??;

    if let Ok(created) = chrono::DateTime::parse_from_rfc3339(&data.created_at) {
        let age_hours = (chrono::Utc::now() - created.with_timezone(&chrono::Utc)).num_hours();
        if age_hours > session_expiration_hours() {
            return None;
        }
    }

    db::get_user(&store, &data.user_id).ok()?
}

/// The logged-in user, or the 302 the handler should return instead.
pub fn require_login(req: &Request) -> Result<User, Response> {
    match current_user(req) {
        Some(user) => Ok(user),
        None => {
            let next = urlencoding::encode(req.path()).to_string();
            Err(redirect(&format!("/auth/login/?next={}", next)))
        }
    }
}

fn open_session(user_id: &str) -> anyhow::Result<String> {
    let token = Uuid::new_v4().to_string();
    let data = SessionData {
        user_id: user_id.to_string(),
        created_at: now_iso(),
    };
    store().set_json(&session_key(&token), &data)?;
    Ok(token)
}

fn logged_in_redirect(token: &str, target: &str) -> Response {
    Response::builder()
        .status(302)
        .header("Location", target)
        .header(
            "Set-Cookie",
            format!("session={}; Path=/; HttpOnly", token).as_str(),
        )
        .body(Vec::new())
        .build()
}

/// Relative targets only; anything else falls back to the index.
fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/"
    }
}

// === Handlers ===

pub fn login_page(req: &Request) -> anyhow::Result<Response> {
    let next = next_target(req.uri()).unwrap_or_default();
    templates::page(
        "login.html",
        &[
            ("NEXT_VALUE", html_escape::encode_double_quoted_attribute(&next).as_ref()),
            ("FORM_ERRORS", ""),
        ],
    )
}

pub fn login_submit(req: &Request) -> anyhow::Result<Response> {
    let form = parse_form(req);
    let username = form.field("username").trim().to_string();
    let password = form.field("password");
    let next = form.field("next").to_string();

    let store = store();
    if let Some(user) = db::find_user_by_username(&store, &username)? {
        if verify_password(password, &user.password) {
            let token = open_session(&user.id)?;
            tracing::info!(username = %user.username, "login");
            return Ok(logged_in_redirect(&token, safe_next(&next)));
        }
    }

    templates::page(
        "login.html",
        &[
            ("NEXT_VALUE", html_escape::encode_double_quoted_attribute(&next).as_ref()),
            (
                "FORM_ERRORS",
                r#"<ul class="form-errors"><li>Invalid username or password.</li></ul>"#,
            ),
        ],
    )
}

pub fn signup_page(_req: &Request) -> anyhow::Result<Response> {
    templates::page("signup.html", &[("FORM_ERRORS", "")])
}

pub fn signup_submit(req: &Request) -> anyhow::Result<Response> {
    let form = parse_form(req);
    let username = sanitize_text(form.field("username").trim());
    let password = form.field("password");

    let mut errors = Vec::new();
    if username.len() < MIN_USERNAME_LENGTH || username.len() > MAX_USERNAME_LENGTH {
        errors.push(("username", "Username must be 3-50 characters.".to_string()));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        errors.push(("password", "Password must be at least 3 characters.".to_string()));
    }

    let store = store();
    if errors.is_empty() && db::find_user_by_username(&store, &username)?.is_some() {
        errors.push(("username", "Username already taken.".to_string()));
    }

    if !errors.is_empty() {
        return templates::page(
            "signup.html",
            &[("FORM_ERRORS", templates::form_errors_html(&errors).as_str())],
        );
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        username,
        password: hash_password(password)?,
        joined: now_iso(),
    };
    db::insert_user(&store, &user)?;
    tracing::info!(username = %user.username, "signup");

    let token = open_session(&user.id)?;
    Ok(logged_in_redirect(&token, "/"))
}

pub fn logout(req: &Request) -> anyhow::Result<Response> {
    if let Some(token) = session_token(req) {
        store().delete(&session_key(&token))?;
    }
    Ok(Response::builder()
        .status(302)
        .header("Location", "/")
        .header("Set-Cookie", "session=; Path=/; Max-Age=0")
        .body(Vec::new())
        .build())
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn next_target_must_be_relative() {
        assert_eq!(safe_next("/create/"), "/create/");
        assert_eq!(safe_next("https://evil.example"), "/");
        assert_eq!(safe_next("//evil.example"), "/");
        assert_eq!(safe_next(""), "/");
    }
}
