//! Declarative operator-UI registration. Each entity declares which
//! columns its admin listing shows, which are editable inline, and what
//! can be searched and filtered. The UI itself lives elsewhere; this is
//! pure configuration reflecting the data model.

use spin_sdk::http::Response;

pub struct ModelAdmin {
    pub model: &'static str,
    pub list_display: &'static [&'static str],
    pub list_editable: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub empty_value_display: &'static str,
}

pub fn registry() -> Vec<ModelAdmin> {
    vec![
        ModelAdmin {
            model: "Post",
            list_display: &["id", "text", "pub_date", "author", "group", "image"],
            list_editable: &["group"],
            search_fields: &["text"],
            list_filter: &["pub_date"],
            empty_value_display: "-empty-",
        },
        ModelAdmin {
            model: "Group",
            list_display: &["title", "slug", "description"],
            list_editable: &["slug"],
            search_fields: &["title"],
            list_filter: &["title"],
            empty_value_display: "-empty-",
        },
        ModelAdmin {
            model: "Comment",
            list_display: &["id", "post", "author", "text", "pub_date"],
            list_editable: &["post"],
            search_fields: &["text"],
            list_filter: &["pub_date"],
            empty_value_display: "-empty-",
        },
        ModelAdmin {
            model: "Follow",
            list_display: &["user", "author"],
            list_editable: &["author"],
            search_fields: &["author"],
            list_filter: &["author"],
            empty_value_display: "-empty-",
        },
    ]
}

/// Plain listing of the registrations, for operators poking at a
/// running instance.
pub fn registry_page() -> anyhow::Result<Response> {
    let mut rows = String::new();
    for admin in registry() {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            admin.model,
            admin.list_display.join(", "),
            admin.list_editable.join(", "),
            admin.search_fields.join(", "),
            admin.list_filter.join(", "),
        ));
    }

    let html = format!(
        "<!doctype html><html><head><title>Admin registry</title></head><body>\
<h1>Registered models</h1>\
<table border=\"1\"><tr><th>Model</th><th>List display</th><th>Editable</th>\
<th>Search</th><th>Filter</th></tr>\n{}</table></body></html>",
        rows
    );

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(html.into_bytes())
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entity_is_registered() {
        let models: Vec<&str> = registry().iter().map(|a| a.model).collect();
        assert_eq!(models, vec!["Post", "Group", "Comment", "Follow"]);
    }

    #[test]
    fn editable_columns_are_displayed_columns() {
        for admin in registry() {
            for editable in admin.list_editable {
                assert!(
                    admin.list_display.contains(editable),
                    "{}: editable column {} not in list_display",
                    admin.model,
                    editable
                );
            }
        }
    }
}
