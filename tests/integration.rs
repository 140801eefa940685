//! End-to-end flows against a running server (`cargo run`, port 3000).
//! Ignored by default, same as the perf suite convention: run with
//! `cargo test -- --ignored` once the server is up.

use std::sync::Mutex;

const BASE_URL: &str = "http://127.0.0.1:3000";
static TEST_LOCK: Mutex<()> = Mutex::new(());

fn lock_test() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

async fn signup(client: &reqwest::Client, username: &str, password: &str) {
    let resp = client
        .post(format!("{}/auth/signup/", BASE_URL))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .expect("signup request");
    assert_eq!(resp.status(), 302, "signup should log in and redirect");
}

async fn create_post(client: &reqwest::Client, text: &str) {
    let resp = client
        .post(format!("{}/create/", BASE_URL))
        .form(&[("text", text)])
        .send()
        .await
        .expect("create request");
    assert_eq!(resp.status(), 302, "valid post should redirect to profile");
}

async fn page_text(client: &reqwest::Client, path: &str) -> String {
    let resp = client
        .get(format!("{}{}", BASE_URL, path))
        .send()
        .await
        .expect("page request");
    assert_eq!(resp.status(), 200, "expected 200 for {}", path);
    resp.text().await.expect("page body")
}

fn count_posts(html: &str) -> usize {
    html.matches("<article class=\"post\">").count()
}

fn first_post_id(html: &str) -> String {
    let marker = "href=\"/posts/";
    let start = html.find(marker).expect("post link on page") + marker.len();
    let end = html[start..].find('/').expect("closing slash") + start;
    html[start..end].to_string()
}

#[ignore]
#[tokio::test]
async fn created_post_lands_on_authors_profile() {
    let _lock = lock_test();
    let client = client();
    let username = format!("writer_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    signup(&client, &username, "secret").await;

    let before = count_posts(&page_text(&client, &format!("/profile/{}/", username)).await);
    create_post(&client, "A brand new post").await;
    let after_html = page_text(&client, &format!("/profile/{}/", username)).await;

    assert_eq!(count_posts(&after_html), before + 1);
    assert!(after_html.contains("A brand new post"));
    assert!(after_html.contains(&username));
}

#[ignore]
#[tokio::test]
async fn anonymous_create_redirects_to_login_with_next() {
    let _lock = lock_test();
    let client = client();

    let resp = client
        .post(format!("{}/create/", BASE_URL))
        .form(&[("text", "should not be saved")])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 302);
    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        location.starts_with("/auth/login/?next="),
        "unexpected redirect target: {}",
        location
    );
    assert!(location.contains("create"));
}

#[ignore]
#[tokio::test]
async fn empty_post_rerenders_form_with_errors() {
    let _lock = lock_test();
    let client = client();
    let username = format!("blank_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    signup(&client, &username, "secret").await;

    let resp = client
        .post(format!("{}/create/", BASE_URL))
        .form(&[("text", "   ")])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 200, "invalid form re-renders, no redirect");
    let body = resp.text().await.expect("body");
    assert!(body.contains("This field is required."));

    let profile = page_text(&client, &format!("/profile/{}/", username)).await;
    assert_eq!(count_posts(&profile), 0);
}

#[ignore]
#[tokio::test]
async fn non_author_edit_changes_nothing() {
    let _lock = lock_test();
    let author_client = client();
    let author = format!("owner_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    signup(&author_client, &author, "secret").await;
    create_post(&author_client, "Original text stays").await;

    let profile = page_text(&author_client, &format!("/profile/{}/", author)).await;
    let post_id = first_post_id(&profile);

    let intruder_client = client();
    let intruder = format!("intruder_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    signup(&intruder_client, &intruder, "secret").await;

    let resp = intruder_client
        .post(format!("{}/posts/{}/edit/", BASE_URL, post_id))
        .form(&[("text", "Hijacked!")])
        .send()
        .await
        .expect("edit request");

    assert_eq!(resp.status(), 302, "silent redirect, no error page");
    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(location, format!("/profile/{}/", intruder));

    let detail = page_text(&author_client, &format!("/posts/{}/", post_id)).await;
    assert!(detail.contains("Original text stays"));
    assert!(!detail.contains("Hijacked!"));
}

#[ignore]
#[tokio::test]
async fn second_page_holds_the_remainder() {
    let _lock = lock_test();
    let client = client();
    let username = format!("prolific_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    signup(&client, &username, "secret").await;

    for i in 0..13 {
        create_post(&client, &format!("Post number {}", i)).await;
    }

    let page1 = page_text(&client, &format!("/profile/{}/", username)).await;
    assert_eq!(count_posts(&page1), 10);

    let page2 = page_text(&client, &format!("/profile/{}/?page=2", username)).await;
    assert_eq!(count_posts(&page2), 3);

    // Out-of-range pages clamp to the last page.
    let page99 = page_text(&client, &format!("/profile/{}/?page=99", username)).await;
    assert_eq!(count_posts(&page99), 3);
}

#[ignore]
#[tokio::test]
async fn follow_feed_tracks_subscriptions() {
    let _lock = lock_test();
    let author_client = client();
    let author = format!("poet_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    signup(&author_client, &author, "secret").await;
    let marker = format!("verse {}", uuid::Uuid::new_v4());
    create_post(&author_client, &marker).await;

    let reader_client = client();
    let reader = format!("reader_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    signup(&reader_client, &reader, "secret").await;

    // Not following yet: the feed does not carry the post.
    let feed = page_text(&reader_client, "/follow/").await;
    assert!(!feed.contains(&marker));

    let resp = reader_client
        .post(format!("{}/profile/{}/follow/", BASE_URL, author))
        .send()
        .await
        .expect("follow request");
    assert_eq!(resp.status(), 302);

    let feed = page_text(&reader_client, "/follow/").await;
    assert!(feed.contains(&marker));

    // Unfollow removes exactly that edge; the feed empties again.
    let resp = reader_client
        .post(format!("{}/profile/{}/unfollow/", BASE_URL, author))
        .send()
        .await
        .expect("unfollow request");
    assert_eq!(resp.status(), 302);

    let feed = page_text(&reader_client, "/follow/").await;
    assert!(!feed.contains(&marker));
}

#[ignore]
#[tokio::test]
async fn self_follow_is_a_noop() {
    let _lock = lock_test();
    let client = client();
    let username = format!("narciss_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    signup(&client, &username, "secret").await;
    create_post(&client, "my own post").await;

    let resp = client
        .post(format!("{}/profile/{}/follow/", BASE_URL, username))
        .send()
        .await
        .expect("follow request");
    assert_eq!(resp.status(), 302);

    let feed = page_text(&client, "/follow/").await;
    assert!(!feed.contains("my own post"));
}

#[ignore]
#[tokio::test]
async fn group_page_lists_its_posts_and_unknown_slug_is_404() {
    let _lock = lock_test();
    let client = client();
    let username = format!("traveler_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    signup(&client, &username, "secret").await;

    // "travel" is part of the seed data.
    let marker = format!("trip {}", uuid::Uuid::new_v4());
    let resp = client
        .post(format!("{}/create/", BASE_URL))
        .form(&[("text", marker.as_str()), ("group", "travel")])
        .send()
        .await
        .expect("create request");
    assert_eq!(resp.status(), 302);

    let group_page = page_text(&client, "/group/travel/").await;
    assert!(group_page.contains(&marker));

    let resp = client
        .get(format!("{}/group/unknown/", BASE_URL))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 404);
}

#[ignore]
#[tokio::test]
async fn empty_comment_is_dropped_but_still_redirects() {
    let _lock = lock_test();
    let client = client();
    let username = format!("chatty_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    signup(&client, &username, "secret").await;
    create_post(&client, "comment on me").await;

    let profile = page_text(&client, &format!("/profile/{}/", username)).await;
    let post_id = first_post_id(&profile);

    let resp = client
        .post(format!("{}/posts/{}/comment/", BASE_URL, post_id))
        .form(&[("text", "")])
        .send()
        .await
        .expect("comment request");
    assert_eq!(resp.status(), 302);
    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(location, format!("/posts/{}/", post_id));

    let detail = page_text(&client, &format!("/posts/{}/", post_id)).await;
    assert!(detail.contains("Comments (0)"));

    // A real comment goes through.
    let resp = client
        .post(format!("{}/posts/{}/comment/", BASE_URL, post_id))
        .form(&[("text", "well said")])
        .send()
        .await
        .expect("comment request");
    assert_eq!(resp.status(), 302);

    let detail = page_text(&client, &format!("/posts/{}/", post_id)).await;
    assert!(detail.contains("Comments (1)"));
    assert!(detail.contains("well said"));
}

#[ignore]
#[tokio::test]
async fn cross_site_posts_are_forbidden() {
    let _lock = lock_test();
    let client = client();

    let resp = client
        .post(format!("{}/auth/login/", BASE_URL))
        .header("Sec-Fetch-Site", "cross-site")
        .form(&[("username", "x"), ("password", "y")])
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 403);
    let body = resp.text().await.expect("body");
    assert!(body.contains("forbidden"));
}

#[ignore]
#[tokio::test]
async fn unknown_paths_render_the_404_page() {
    let _lock = lock_test();
    let client = client();

    let resp = client
        .get(format!("{}/no/such/page/", BASE_URL))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 404);
    let body = resp.text().await.expect("body");
    assert!(body.contains("page not found"));

    let resp = client
        .get(format!("{}/posts/{}/", BASE_URL, uuid::Uuid::new_v4()))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 404);
}
