use htmlescape::{encode_attribute, encode_minimal};

use crate::models::Post;

pub const HOT_RELOAD_SCRIPT: &str = r#"
<script>
    const socket = new WebSocket("ws://" + window.location.host + "/ws");
    socket.onmessage = (event) => {
        if (event.data === "reload") {
            window.location.reload();
        }
    };
</script>
"#;

/// Substitute a page into the layout shell. The layout carries
/// `{{ title }}`, `{{ description }}`, `{{ banner }}` and `{{ content }}`
/// placeholders; in development the hot-reload script is appended to the body.
pub fn render_with_layout(
    layout: &str,
    banner: &str,
    title: &str,
    description: &str,
    body: &str,
    is_development: bool,
) -> String {
    let mut page = layout
        .replace("{{ title }}", &encode_minimal(title))
        .replace("{{ description }}", &encode_attribute(description))
        .replace("{{ banner }}", banner)
        .replace("{{ content }}", body);

    if is_development {
        page = page.replace("</body>", &format!("{}</body>", HOT_RELOAD_SCRIPT));
    }

    page
}

/// The blog listing: one entry per post, newest first as given, each linking
/// to the full post. Zero posts produce an empty list.
pub fn render_post_list(posts: &[Post]) -> String {
    let mut list_items = String::new();
    for post in posts {
        list_items.push_str(&format!(
            "<li>\n  <a href=\"{href}\" class=\"post-link\">\
             <span class=\"post-date\">{date}</span> \
             <span class=\"post-title\">{title}</span></a>\n  \
             <p class=\"post-summary\">{summary}</p>\n</li>\n",
            href = post.href(),
            date = post.display_date(),
            title = encode_minimal(&post.title),
            summary = encode_minimal(&post.summary),
        ));
    }
    format!("<ul class=\"post-list\">\n{list_items}</ul>")
}

/// Body of a full post page: heading, date line, rendered markdown.
pub fn render_post_body(title: &str, date_line: &str, body_html: &str) -> String {
    format!(
        "<h1>{}</h1>\n<p class=\"post-date\">{}</p>\n{}",
        encode_minimal(title),
        encode_minimal(date_line),
        body_html
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn post(slug: &str, title: &str, date: &str) -> Post {
        Post {
            title: title.to_string(),
            slug: slug.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            summary: format!("Summary of {slug}."),
        }
    }

    #[test]
    fn zero_posts_render_an_empty_list() {
        let html = render_post_list(&[]);
        assert!(html.contains("post-list"));
        assert!(!html.contains("<li>"));
    }

    #[test]
    fn posts_render_in_given_order_with_links() {
        let posts = vec![
            post("newest", "Newest entry", "2026-02-21"),
            post("middle", "Middle entry", "2025-11-03"),
            post("oldest", "Oldest entry", "2024-09-18"),
        ];
        let html = render_post_list(&posts);

        let newest = html.find("/posts/newest").unwrap();
        let middle = html.find("/posts/middle").unwrap();
        let oldest = html.find("/posts/oldest").unwrap();
        assert!(newest < middle && middle < oldest);
        assert_eq!(html.matches("<li>").count(), 3);
        assert!(html.contains("February 21, 2026"));
    }

    #[test]
    fn post_titles_are_escaped() {
        let posts = vec![post("tags", "On <script> & other tags", "2025-01-01")];
        let html = render_post_list(&posts);
        assert!(html.contains("On &lt;script&gt; &amp; other tags"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn layout_placeholders_are_substituted() {
        let layout = "<html><head><title>{{ title }}</title>\
                      <meta name=\"description\" content=\"{{ description }}\"></head>\
                      <body>{{ banner }}{{ content }}</body></html>";
        let html = render_with_layout(layout, "<nav/>", "About | My Mini-blog", "About page", "<p>hi</p>", false);
        assert!(html.contains("<title>About | My Mini-blog</title>"));
        assert!(html.contains("content=\"About&#x20;page\""));
        assert!(html.contains("<nav/><p>hi</p>"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn hot_reload_script_only_in_development() {
        let layout = "<body>{{ content }}</body>";
        let dev = render_with_layout(layout, "", "t", "d", "x", true);
        let prod = render_with_layout(layout, "", "t", "d", "x", false);
        assert!(dev.contains("WebSocket"));
        assert!(!prod.contains("WebSocket"));
    }

    #[test]
    fn post_body_carries_heading_and_date() {
        let html = render_post_body("Welcome", "June 5, 2024", "<p>Body</p>");
        assert!(html.contains("<h1>Welcome</h1>"));
        assert!(html.contains("June 5, 2024"));
        assert!(html.ends_with("<p>Body</p>"));
    }
}
