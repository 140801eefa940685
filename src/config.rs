pub const MAX_POST_LENGTH: usize = 5000;
pub const MAX_COMMENT_LENGTH: usize = 2000;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 3;

pub const USERS_LIST_KEY: &str = "users_list";
pub const GROUPS_LIST_KEY: &str = "groups_list";
pub const FEED_KEY: &str = "feed";

pub fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

pub fn group_key(slug: &str) -> String {
    format!("group:{}", slug)
}

pub fn post_key(id: &str) -> String {
    format!("post:{}", id)
}

pub fn comment_key(id: &str) -> String {
    format!("comment:{}", id)
}

pub fn post_comments_key(post_id: &str) -> String {
    format!("comments:{}", post_id)
}

pub fn follows_key(user_id: &str) -> String {
    format!("follows:{}", user_id)
}

pub fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

pub fn media_key(path: &str) -> String {
    format!("media:{}", path)
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Number of posts per page in every listing view. Never below 1, so
/// page-count arithmetic stays well-defined whatever the env says.
pub fn posts_per_page() -> usize {
    env_or("TRIBUNE_POSTS_PER_PAGE", 10).max(1)
}

/// How long a cached index page stays valid, in seconds.
pub fn index_cache_ttl_secs() -> i64 {
    env_or("TRIBUNE_INDEX_CACHE_TTL_SECS", 20)
}

pub fn session_expiration_hours() -> i64 {
    env_or("TRIBUNE_SESSION_EXPIRATION_HOURS", 24)
}

#[cfg(test)]
mod tests {
    use super::posts_per_page;

    #[test]
    fn posts_per_page_never_drops_below_one() {
        // No other test touches this variable.
        std::env::set_var("TRIBUNE_POSTS_PER_PAGE", "0");
        assert_eq!(posts_per_page(), 1);
        std::env::remove_var("TRIBUNE_POSTS_PER_PAGE");
        assert_eq!(posts_per_page(), 10);
    }
}
