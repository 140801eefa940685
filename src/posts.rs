//! Post handlers: listings, detail, create/edit, comments.

use spin_sdk::http::{Request, Response};
use spin_sdk::key_value::Store;
use uuid::Uuid;

use crate::auth::{current_user, require_login};
use crate::config::{media_key, posts_per_page};
use crate::core::cache::PageCache;
use crate::core::db;
use crate::core::errors::AppError;
use crate::core::helpers::{redirect, store};
use crate::core::pagination::paginate;
use crate::core::query_params::page_number;
use crate::forms::{CommentForm, PostForm, UploadedFile};
use crate::models::models::Post;
use crate::templates;

/// Front page: every post, newest first. The default view (no query
/// string) is served through the injected page cache.
pub fn index(req: &Request, cache: &PageCache) -> anyhow::Result<Response> {
    let cacheable = !req.uri().contains('?');
    if cacheable {
        if let Some(resp) = cache.get("/")? {
            return Ok(resp);
        }
    }

    let store = store();
    let page = paginate(db::all_posts(&store)?, posts_per_page(), page_number(req.uri()));
    let html = templates::render_template(
        "index.html",
        &[
            ("POST_LIST", templates::post_list_html(&store, &page.items)?.as_str()),
            ("PAGINATION", templates::pagination_html(&page, "/").as_str()),
        ],
    )?;

    if cacheable {
        cache.put("/", "text/html; charset=utf-8", html.as_bytes())?;
    }

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(html.into_bytes())
        .build())
}

pub fn group_posts(req: &Request, slug: &str) -> anyhow::Result<Response> {
    let store = store();
    let Some(group) = db::get_group(&store, slug)? else {
        return Ok(AppError::NotFound.into());
    };

    let page = paginate(
        db::posts_in_group(&store, slug)?,
        posts_per_page(),
        page_number(req.uri()),
    );
    let base = format!("/group/{}/", slug);
    templates::page(
        "group_list.html",
        &[
            ("GROUP_TITLE", html_escape::encode_text(&group.title).as_ref()),
            (
                "GROUP_DESCRIPTION",
                html_escape::encode_text(&group.description).as_ref(),
            ),
            ("POST_LIST", templates::post_list_html(&store, &page.items)?.as_str()),
            ("PAGINATION", templates::pagination_html(&page, &base).as_str()),
        ],
    )
}

pub fn post_detail(req: &Request, post_id: &str) -> anyhow::Result<Response> {
    let store = store();
    let Some(post) = db::get_post(&store, post_id)? else {
        return Ok(AppError::NotFound.into());
    };

    let comments = db::comments_for_post(&store, post_id)?;
    let viewer = current_user(req);
    let edit_link = match &viewer {
        Some(user) if user.id == post.author_id => format!(
            r#"<a class="post-edit" href="/posts/{}/edit/">Edit</a>"#,
            html_escape::encode_double_quoted_attribute(&post.id)
        ),
        _ => String::new(),
    };

    templates::page(
        "post_detail.html",
        &[
            ("POST_BLOCK", templates::post_list_html(&store, &[post])?.as_str()),
            ("EDIT_LINK", edit_link.as_str()),
            ("POST_ID", html_escape::encode_double_quoted_attribute(post_id).as_ref()),
            ("COMMENT_COUNT", comments.len().to_string().as_str()),
            ("COMMENTS", templates::comments_html(&store, &comments)?.as_str()),
            ("FORM_ERRORS", ""),
        ],
    )
}

fn save_image(store: &Store, file: &UploadedFile) -> anyhow::Result<String> {
    let ext = file
        .filename
        .rsplit('.')
        .next()
        .filter(|e| !e.is_empty() && e.len() <= 8)
        .unwrap_or("bin");
    let path = format!("posts/{}.{}", Uuid::new_v4(), ext);
    store.set(&media_key(&path), &file.data)?;
    Ok(path)
}

fn render_post_form(
    store: &Store,
    form: &PostForm,
    is_edit: bool,
    action: &str,
) -> anyhow::Result<Response> {
    let title = if is_edit { "Edit post" } else { "New post" };
    templates::page(
        "create_post.html",
        &[
            ("FORM_TITLE", title),
            ("FORM_ACTION", html_escape::encode_double_quoted_attribute(action).as_ref()),
            ("FORM_ERRORS", templates::form_errors_html(&form.errors).as_str()),
            ("TEXT_VALUE", html_escape::encode_text(&form.text).as_ref()),
            (
                "GROUP_OPTIONS",
                templates::group_options_html(store, form.group.as_deref())?.as_str(),
            ),
        ],
    )
}

pub fn post_create(req: &Request, cache: &PageCache) -> anyhow::Result<Response> {
    let user = match require_login(req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let store = store();
    if req.method().to_string() == "GET" {
        let empty = PostForm {
            text: String::new(),
            group: None,
            image: None,
            errors: Vec::new(),
        };
        return render_post_form(&store, &empty, false, "/create/");
    }

    let mut form = PostForm::from_request(req);
    if !form.is_valid(&store)? {
        return render_post_form(&store, &form, false, "/create/");
    }

    let image_path = match &form.image {
        Some(file) => Some(save_image(&store, file)?),
        None => None,
    };
    let post = form.build_post(&user.id, image_path);
    db::insert_post(&store, &post)?;
    cache.clear("/")?;
    tracing::info!(post_id = %post.id, author = %user.username, "post created");

    Ok(redirect(&format!("/profile/{}/", user.username)))
}

pub fn post_edit(req: &Request, post_id: &str, cache: &PageCache) -> anyhow::Result<Response> {
    let user = match require_login(req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let store = store();
    let Some(post) = db::get_post(&store, post_id)? else {
        return Ok(AppError::NotFound.into());
    };

    // Non-authors are turned away silently, no error page.
    if post.author_id != user.id {
        return Ok(redirect(&format!("/profile/{}/", user.username)));
    }

    let action = format!("/posts/{}/edit/", post_id);
    if req.method().to_string() == "GET" {
        let prefilled = PostForm {
            text: post.text.clone(),
            group: post.group_slug.clone(),
            image: None,
            errors: Vec::new(),
        };
        return render_post_form(&store, &prefilled, true, &action);
    }

    let mut form = PostForm::from_request(req);
    if !form.is_valid(&store)? {
        return render_post_form(&store, &form, true, &action);
    }

    let image_path = match &form.image {
        Some(file) => Some(save_image(&store, file)?),
        None => None,
    };
    let mut updated: Post = post;
    form.apply_to(&mut updated, image_path);
    db::update_post(&store, &updated)?;
    cache.clear("/")?;
    tracing::info!(post_id = %updated.id, "post edited");

    Ok(redirect(&format!("/posts/{}/", post_id)))
}

/// Persist the comment when the form is valid; either way, back to the
/// post detail page.
pub fn add_comment(req: &Request, post_id: &str) -> anyhow::Result<Response> {
    let user = match require_login(req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let store = store();
    if db::get_post(&store, post_id)?.is_none() {
        return Ok(AppError::NotFound.into());
    }

    let mut form = CommentForm::from_request(req);
    if form.is_valid() {
        let comment = form.build_comment(post_id, &user.id);
        db::insert_comment(&store, &comment)?;
        tracing::info!(post_id = %post_id, author = %user.username, "comment added");
    }

    Ok(redirect(&format!("/posts/{}/", post_id)))
}
