use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub joined: String,
}

/// A community posts can be filed under. Identified by slug; never
/// deleted by handler logic.
#[derive(Serialize, Deserialize, Clone)]
pub struct Group {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    /// None when the post is not filed under any group, or when its
    /// group was deleted (set-null rule).
    pub group_slug: Option<String>,
    pub text: String,
    /// Relative media path of the attached image, if any.
    pub image: Option<String>,
    /// Set once at creation, never updated by edits.
    pub pub_date: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub text: String,
    pub pub_date: String,
}

#[derive(Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: String,
    pub created_at: String,
}
