//! Server-side rendering: embedded HTML templates with placeholder
//! substitution, plus the fragment builders the listing views share.

use html_escape::{encode_double_quoted_attribute, encode_text};
use rust_embed::RustEmbed;
use spin_sdk::http::Response;
use spin_sdk::key_value::Store;

use crate::core::db;
use crate::core::pagination::Page;
use crate::models::models::{Comment, Post};

#[derive(RustEmbed)]
#[folder = "static"]
struct Assets;

fn load_template(name: &str) -> anyhow::Result<String> {
    let file = Assets::get(name).ok_or_else(|| anyhow::anyhow!("template {} not found", name))?;
    Ok(String::from_utf8(file.data.to_vec())?)
}

/// Load `name` and substitute each `(placeholder, value)` pair. Values
/// must already be escaped or be trusted fragments.
pub fn render_template(name: &str, replacements: &[(&str, &str)]) -> anyhow::Result<String> {
    let mut html = load_template(name)?;
    for (placeholder, value) in replacements {
        html = html.replace(placeholder, value);
    }
    Ok(html)
}

pub fn page(name: &str, replacements: &[(&str, &str)]) -> anyhow::Result<Response> {
    page_with_status(name, replacements, 200)
}

pub fn page_with_status(
    name: &str,
    replacements: &[(&str, &str)],
    status: u16,
) -> anyhow::Result<Response> {
    let html = render_template(name, replacements)?;
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(html.into_bytes())
        .build())
}

/// Rendered 404/403/500 page. Infallible: falls back to plain text when
/// the template itself cannot be loaded.
pub fn render_error_page(status: u16) -> Response {
    let name = match status {
        404 => "404.html",
        403 => "403.html",
        _ => "500.html",
    };
    match page_with_status(name, &[], status) {
        Ok(resp) => resp,
        Err(_) => Response::builder()
            .status(status)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(format!("Error {}", status).into_bytes())
            .build(),
    }
}

// === Shared fragments ===

/// Article blocks for a list of posts, newest first as given.
pub fn post_list_html(store: &Store, posts: &[Post]) -> anyhow::Result<String> {
    let mut html = String::new();
    for post in posts {
        let author = db::get_user(store, &post.author_id)?
            .map(|u| u.username)
            .unwrap_or_else(|| "unknown".to_string());
        let author_esc = encode_text(&author).to_string();

        let group_line = match &post.group_slug {
            Some(slug) => format!(
                r#"<span class="post-group"><a href="/group/{}/">{}</a></span>"#,
                encode_double_quoted_attribute(slug),
                encode_text(slug)
            ),
            None => String::new(),
        };
        let image_line = match &post.image {
            Some(path) => format!(
                r#"<img class="post-image" src="/media/{}" alt="">"#,
                encode_double_quoted_attribute(path)
            ),
            None => String::new(),
        };

        html.push_str(&format!(
            r#"<article class="post">
  <header>
    <a class="post-author" href="/profile/{author_attr}/">{author}</a>
    <time>{date}</time>
    {group}
  </header>
  {image}
  <p class="post-text">{text}</p>
  <a class="post-link" href="/posts/{id}/">Read and comment</a>
</article>
"#,
            author_attr = encode_double_quoted_attribute(&author),
            author = author_esc,
            date = encode_text(&post.pub_date),
            group = group_line,
            image = image_line,
            text = encode_text(&post.text),
            id = encode_double_quoted_attribute(&post.id),
        ));
    }
    Ok(html)
}

/// Previous/next controls. `base_path` must end with a path that takes
/// a `?page=N` query.
pub fn pagination_html<T>(page: &Page<T>, base_path: &str) -> String {
    if page.num_pages <= 1 {
        return String::new();
    }
    let mut html = String::from(r#"<nav class="pagination">"#);
    if page.has_previous() {
        html.push_str(&format!(
            r#"<a href="{}?page={}">&laquo; previous</a> "#,
            base_path,
            page.previous_number()
        ));
    }
    html.push_str(&format!(
        "<span>page {} of {}</span>",
        page.number, page.num_pages
    ));
    if page.has_next() {
        html.push_str(&format!(
            r#" <a href="{}?page={}">next &raquo;</a>"#,
            base_path,
            page.next_number()
        ));
    }
    html.push_str("</nav>");
    html
}

pub fn comments_html(store: &Store, comments: &[Comment]) -> anyhow::Result<String> {
    let mut html = String::new();
    for comment in comments {
        let author = db::get_user(store, &comment.author_id)?
            .map(|u| u.username)
            .unwrap_or_else(|| "unknown".to_string());
        html.push_str(&format!(
            r#"<div class="comment">
  <a href="/profile/{author_attr}/">{author}</a>
  <time>{date}</time>
  <p>{text}</p>
</div>
"#,
            author_attr = encode_double_quoted_attribute(&author),
            author = encode_text(&author),
            date = encode_text(&comment.pub_date),
            text = encode_text(&comment.text),
        ));
    }
    Ok(html)
}

/// Field errors as a list, empty string when the form is clean.
pub fn form_errors_html(errors: &[(&'static str, String)]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut html = String::from(r#"<ul class="form-errors">"#);
    for (field, message) in errors {
        html.push_str(&format!(
            "<li><strong>{}</strong>: {}</li>",
            encode_text(field),
            encode_text(message)
        ));
    }
    html.push_str("</ul>");
    html
}

/// `<option>` rows for the group selector on the post form.
pub fn group_options_html(store: &Store, selected: Option<&str>) -> anyhow::Result<String> {
    let slugs: Vec<String> = store
        .get_json(crate::config::GROUPS_LIST_KEY)?
        .unwrap_or_default();
    let mut html = String::from(r#"<option value="">- no group -</option>"#);
    for slug in &slugs {
        if let Some(group) = db::get_group(store, slug)? {
            let marker = if selected == Some(slug.as_str()) {
                " selected"
            } else {
                ""
            };
            html.push_str(&format!(
                r#"<option value="{}"{}>{}</option>"#,
                encode_double_quoted_attribute(&group.slug),
                marker,
                encode_text(&group.title)
            ));
        }
    }
    Ok(html)
}
