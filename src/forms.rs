//! HTML form bindings: parse a request body, validate fields, and bind
//! to a record only when the caller supplies the author and commits.

use std::collections::HashMap;

use spin_sdk::http::Request;
use spin_sdk::key_value::Store;
use uuid::Uuid;

use crate::config::{MAX_COMMENT_LENGTH, MAX_POST_LENGTH};
use crate::core::db;
use crate::core::helpers::{now_iso, sanitize_text};
use crate::models::models::{Comment, Post};

pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Decoded body of a form submission, urlencoded or multipart.
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

pub fn parse_form(req: &Request) -> FormData {
    let content_type = req
        .header("Content-Type")
        .and_then(|h| h.as_str())
        .unwrap_or("");

    if let Some(boundary) = multipart_boundary(content_type) {
        parse_multipart(req.body(), &boundary)
    } else {
        FormData {
            fields: parse_urlencoded(req.body()),
            files: HashMap::new(),
        }
    }
}

fn parse_urlencoded(body: &[u8]) -> HashMap<String, String> {
    let raw = String::from_utf8_lossy(body);
    let mut fields = HashMap::new();
    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = match pair.find('=') {
            Some(idx) => (&pair[..idx], &pair[idx + 1..]),
            None => (pair, ""),
        };
        // Form encoding uses '+' for spaces.
        let value = value.replace('+', " ");
        let decoded = urlencoding::decode(&value)
            .map(|c| c.to_string())
            .unwrap_or(value);
        let key = urlencoding::decode(key)
            .map(|c| c.to_string())
            .unwrap_or_else(|_| key.to_string());
        fields.insert(key, decoded);
    }
    fields
}

fn multipart_boundary(content_type: &str) -> Option<String> {
    let rest = content_type.strip_prefix("multipart/form-data")?;
    rest.split(';')
        .map(str::trim)
        .find_map(|p| p.strip_prefix("boundary="))
        .map(|b| b.trim_matches('"').to_string())
}

/// Minimal multipart/form-data parser, enough for text fields plus one
/// image upload. Parts with a filename become files, the rest fields.
fn parse_multipart(body: &[u8], boundary: &str) -> FormData {
    let mut form = FormData {
        fields: HashMap::new(),
        files: HashMap::new(),
    };
    let delimiter = format!("--{}", boundary);

    for raw_part in split_on(body, delimiter.as_bytes()) {
        // Parts are framed as \r\n<headers>\r\n\r\n<data>\r\n
        let part = strip_crlf(raw_part);
        if part.is_empty() || part == b"--" {
            continue;
        }
        let Some(header_end) = find(part, b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&part[..header_end]);
        // The framing CRLFs were already stripped at the part level, so
        // everything past the blank line is payload, byte for byte.
        let data = &part[header_end + 4..];

        let mut name = None;
        let mut filename = None;
        let mut content_type = "application/octet-stream".to_string();
        for line in headers.lines() {
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("content-disposition:") {
                name = header_param(line, "name");
                filename = header_param(line, "filename");
            } else if let Some(ct) = lower.strip_prefix("content-type:") {
                content_type = ct.trim().to_string();
            }
        }

        let Some(name) = name else { continue };
        match filename {
            Some(filename) if !filename.is_empty() => {
                form.files.insert(
                    name,
                    UploadedFile {
                        filename,
                        content_type,
                        data: data.to_vec(),
                    },
                );
            }
            _ => {
                form.fields
                    .insert(name, String::from_utf8_lossy(data).to_string());
            }
        }
    }
    form
}

fn header_param(line: &str, param: &str) -> Option<String> {
    let needle = format!("{}=\"", param);
    let start = line.find(&needle)? + needle.len();
    let end = line[start..].find('"')? + start;
    Some(line[start..end].to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn split_on<'a>(data: &'a [u8], sep: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = data;
    while let Some(idx) = find(rest, sep) {
        parts.push(&rest[..idx]);
        rest = &rest[idx + sep.len()..];
    }
    parts.push(rest);
    parts
}

fn strip_crlf(mut data: &[u8]) -> &[u8] {
    if data.starts_with(b"\r\n") {
        data = &data[2..];
    }
    if data.ends_with(b"\r\n") {
        data = &data[..data.len() - 2];
    }
    data
}

// === PostForm ===

pub struct PostForm {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<UploadedFile>,
    pub errors: Vec<(&'static str, String)>,
}

impl PostForm {
    pub fn from_request(req: &Request) -> Self {
        let mut form = parse_form(req);
        let group = match form.field("group").trim() {
            "" => None,
            slug => Some(slug.to_string()),
        };
        PostForm {
            text: form.field("text").to_string(),
            group,
            image: form.files.remove("image"),
            errors: Vec::new(),
        }
    }

    /// Field-level validation. Populates `errors` and returns whether
    /// the form can be bound.
    pub fn is_valid(&mut self, store: &Store) -> anyhow::Result<bool> {
        self.errors.clear();
        if self.text.trim().is_empty() {
            self.errors.push(("text", "This field is required.".to_string()));
        } else if self.text.len() > MAX_POST_LENGTH {
            self.errors.push(("text", "Post text is too long.".to_string()));
        }
        if let Some(slug) = &self.group {
            if db::get_group(store, slug)?.is_none() {
                self.errors.push(("group", "Unknown group.".to_string()));
            }
        }
        Ok(self.errors.is_empty())
    }

    /// Bind to a fresh Post. Nothing is persisted here; the caller
    /// assigns authorship and commits through the repository.
    pub fn build_post(&self, author_id: &str, image_path: Option<String>) -> Post {
        Post {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            group_slug: self.group.clone(),
            text: sanitize_text(self.text.trim()),
            image: image_path,
            pub_date: now_iso(),
        }
    }

    /// Bind onto an existing post for an edit. pub_date and authorship
    /// stay untouched; the image is replaced only when a new upload came
    /// in.
    pub fn apply_to(&self, post: &mut Post, image_path: Option<String>) {
        post.text = sanitize_text(self.text.trim());
        post.group_slug = self.group.clone();
        if image_path.is_some() {
            post.image = image_path;
        }
    }
}

// === CommentForm ===

pub struct CommentForm {
    pub text: String,
    pub errors: Vec<(&'static str, String)>,
}

impl CommentForm {
    pub fn from_request(req: &Request) -> Self {
        let form = parse_form(req);
        CommentForm {
            text: form.field("text").to_string(),
            errors: Vec::new(),
        }
    }

    pub fn is_valid(&mut self) -> bool {
        self.errors.clear();
        if self.text.trim().is_empty() {
            self.errors.push(("text", "This field is required.".to_string()));
        } else if self.text.len() > MAX_COMMENT_LENGTH {
            self.errors.push(("text", "Comment is too long.".to_string()));
        }
        self.errors.is_empty()
    }

    pub fn build_comment(&self, post_id: &str, author_id: &str) -> Comment {
        Comment {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            text: sanitize_text(self.text.trim()),
            pub_date: now_iso(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencoded_decodes_plus_and_percent() {
        let fields = parse_urlencoded(b"text=hello+world%21&group=travel");
        assert_eq!(fields.get("text").map(String::as_str), Some("hello world!"));
        assert_eq!(fields.get("group").map(String::as_str), Some("travel"));
    }

    #[test]
    fn urlencoded_keeps_empty_values() {
        let fields = parse_urlencoded(b"text=&group=");
        assert_eq!(fields.get("text").map(String::as_str), Some(""));
    }

    #[test]
    fn multipart_splits_fields_and_files() {
        let body = b"--XYZ\r\n\
Content-Disposition: form-data; name=\"text\"\r\n\r\n\
a post\r\n\
--XYZ\r\n\
Content-Disposition: form-data; name=\"image\"; filename=\"pic.gif\"\r\n\
Content-Type: image/gif\r\n\r\n\
GIF89a\r\n\
--XYZ--\r\n";
        let form = parse_multipart(body, "XYZ");
        assert_eq!(form.fields.get("text").map(String::as_str), Some("a post"));
        let file = form.files.get("image").expect("file part");
        assert_eq!(file.filename, "pic.gif");
        assert_eq!(file.content_type, "image/gif");
        assert_eq!(file.data, b"GIF89a");
    }

    #[test]
    fn multipart_keeps_crlf_bytes_inside_file_data() {
        // Binary uploads may legitimately begin or end with \r\n; only
        // the framing CRLFs around the part belong to the protocol.
        let body = b"--B\r\n\
Content-Disposition: form-data; name=\"image\"; filename=\"blob.bin\"\r\n\
Content-Type: application/octet-stream\r\n\r\n\
\r\nPAYLOAD\r\n\r\n\
--B--\r\n";
        let form = parse_multipart(body, "B");
        let file = form.files.get("image").expect("file part");
        assert_eq!(file.data, b"\r\nPAYLOAD\r\n");
    }

    #[test]
    fn multipart_empty_filename_is_not_a_file() {
        let body = b"--B\r\n\
Content-Disposition: form-data; name=\"image\"; filename=\"\"\r\n\r\n\
\r\n\
--B--\r\n";
        let form = parse_multipart(body, "B");
        assert!(form.files.is_empty());
    }

    #[test]
    fn boundary_extraction_handles_quotes() {
        assert_eq!(
            multipart_boundary("multipart/form-data; boundary=\"abc\"").as_deref(),
            Some("abc")
        );
        assert_eq!(
            multipart_boundary("multipart/form-data; boundary=xyz").as_deref(),
            Some("xyz")
        );
        assert_eq!(multipart_boundary("application/x-www-form-urlencoded"), None);
    }

    #[test]
    fn comment_form_rejects_whitespace_text() {
        let mut form = CommentForm {
            text: "   ".to_string(),
            errors: Vec::new(),
        };
        assert!(!form.is_valid());
        assert_eq!(form.errors[0].0, "text");
    }

    #[test]
    fn comment_form_binds_without_persisting() {
        let mut form = CommentForm {
            text: "nice one".to_string(),
            errors: Vec::new(),
        };
        assert!(form.is_valid());
        let comment = form.build_comment("post-1", "user-1");
        assert_eq!(comment.post_id, "post-1");
        assert_eq!(comment.author_id, "user-1");
        assert_eq!(comment.text, "nice one");
    }
}
