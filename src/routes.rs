use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, get_service},
    Router,
};
use chrono::NaiveDate;
use gray_matter::{engine::YAML, Matter};
use htmlescape::encode_minimal;
use tokio::fs;
use tracing::warn;
use tower_http::services::{ServeDir, ServeFile};

use crate::content_loader::CONTENT_DIR;
use crate::hot_reload::ws_handler;
use crate::markdown::{first_paragraph_text, render_markdown_to_html};
use crate::models::PostFrontMatter;
use crate::render::{render_post_body, render_post_list, render_with_layout};
use crate::state::{AppState, RouterState};

pub fn build_router(router_state: RouterState) -> Router {
    let static_dir = get_service(ServeDir::new(format!("{CONTENT_DIR}/static")));
    let favicon_ico = get_service(ServeFile::new(format!("{CONTENT_DIR}/static/favicon.ico")));
    let favicon_png = get_service(ServeFile::new(format!("{CONTENT_DIR}/static/favicon.png")));

    Router::new()
        .route("/", get(homepage))
        .route("/posts/{slug}", get(render_post))
        .route("/sitemap.xml", get(sitemap))
        .nest_service("/static", static_dir)
        .route_service("/favicon.ico", favicon_ico)
        .route_service("/favicon.png", favicon_png)
        .route("/ws", get(ws_handler))
        .route("/{slug}", get(render_page))
        .fallback(not_found)
        .with_state(router_state)
}

async fn homepage(State(state): State<Arc<AppState>>) -> Html<String> {
    let content = state.content.read().await;

    let body = format!(
        "{}\n<div class=\"posts\">\n{}</div>",
        content.home_html,
        render_post_list(&content.posts)
    );
    let page = render_with_layout(
        &content.layout_html,
        &content.banner_html,
        &state.config.document_title(None),
        &state.config.description,
        &body,
        state.is_development,
    );
    Html(page)
}

async fn render_page(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let content = state.content.read().await;

    let Some(page) = content.pages.get(&slug) else {
        drop(content);
        return not_found_page(&state, &slug).await.into_response();
    };

    let html = render_with_layout(
        &content.layout_html,
        &content.banner_html,
        &state.config.document_title(Some(&page.title)),
        &page.description,
        &page.html,
        state.is_development,
    );
    Html(html).into_response()
}

async fn render_post(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let path = format!("{CONTENT_DIR}/posts/{slug}.md");
    let file_content = match fs::read_to_string(&path).await {
        Ok(c) => c,
        Err(_) => return not_found_page(&state, &slug).await.into_response(),
    };

    let matter = Matter::<YAML>::new();
    let parsed = match matter.parse::<PostFrontMatter>(&file_content) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(post = %slug, "failed to parse front matter: {}", e);
            return not_found_page(&state, &slug).await.into_response();
        }
    };
    let Some(front_matter) = parsed.data else {
        warn!(post = %slug, "post has no front matter");
        return not_found_page(&state, &slug).await.into_response();
    };

    let date_line = match NaiveDate::parse_from_str(&front_matter.date, "%Y-%m-%d") {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => front_matter.date.clone(),
    };
    let body_html = render_markdown_to_html(&parsed.content);
    let body = render_post_body(&front_matter.title, &date_line, &body_html);

    let description = front_matter
        .summary
        .unwrap_or_else(|| first_paragraph_text(&parsed.content));

    let content = state.content.read().await;
    let html = render_with_layout(
        &content.layout_html,
        &content.banner_html,
        &state.config.document_title(Some(&front_matter.title)),
        &description,
        &body,
        state.is_development,
    );
    Html(html).into_response()
}

async fn not_found(OriginalUri(uri): OriginalUri, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let slug = uri.path().trim_matches('/').to_string();
    not_found_page(&state, &slug).await
}

/// 404 rendered through the layout, with the requested slug substituted
/// into the template.
async fn not_found_page(state: &AppState, slug: &str) -> impl IntoResponse {
    let content = state.content.read().await;
    let body = content.not_found_html.replace("{{ slug }}", &encode_minimal(slug));

    let html = render_with_layout(
        &content.layout_html,
        &content.banner_html,
        &state.config.document_title(Some("Not found")),
        &state.config.description,
        &body,
        state.is_development,
    );
    (StatusCode::NOT_FOUND, Html(html))
}

async fn sitemap(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let content = state.content.read().await;
    let config = &state.config;

    let mut urls = String::new();
    urls.push_str(&format!("  <url><loc>{}</loc></url>\n", config.absolute_url("/")));

    let mut page_slugs: Vec<&str> = content.pages.keys().map(|s| s.as_str()).collect();
    page_slugs.sort_unstable();
    for slug in page_slugs {
        urls.push_str(&format!(
            "  <url><loc>{}</loc></url>\n",
            config.absolute_url(&format!("/{slug}"))
        ));
    }

    for post in &content.posts {
        urls.push_str(&format!(
            "  <url><loc>{}</loc><lastmod>{}</lastmod></url>\n",
            config.absolute_url(&post.href()),
            post.date.format("%Y-%m-%d")
        ));
    }

    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{urls}</urlset>\n"
    );
    ([(header::CONTENT_TYPE, "application/xml")], xml)
}
