use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use gray_matter::{engine::YAML, Matter};
use tokio::fs;
use tracing::{error, info, warn};

use crate::markdown::{first_paragraph_text, render_markdown_to_html};
use crate::models::{Page, PageFrontMatter, Post, PostFrontMatter, sort_newest_first};
use crate::state::AppState;

pub const CONTENT_DIR: &str = "content";

/// Everything the server needs in memory to answer requests. Rebuilt as a
/// whole on every (re)load; post bodies stay on disk and are read per request.
pub struct SiteContent {
    pub layout_html: String,
    pub banner_html: String,
    pub not_found_html: String, // supports {{ slug }} placeholder
    pub home_html: String,
    pub pages: HashMap<String, Page>,
    /// Newest first.
    pub posts: Vec<Post>,
}

pub async fn load_content() -> Result<SiteContent> {
    load_content_from(Path::new(CONTENT_DIR)).await
}

pub async fn load_content_from(dir: &Path) -> Result<SiteContent> {
    let layout_html = read_required(dir, "layout.html").await?;
    let banner_html = read_required(dir, "banner.html").await?;
    let not_found_html = read_required(dir, "not_found.html").await?;

    let home_raw = read_required(dir, "home.md").await?;
    let home_html = render_markdown_to_html(body_of(&home_raw));

    let pages = load_pages(&dir.join("pages")).await?;
    let posts = load_posts(&dir.join("posts")).await?;

    Ok(SiteContent {
        layout_html,
        banner_html,
        not_found_html,
        home_html,
        pages,
        posts,
    })
}

async fn read_required(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

/// Markdown body with any leading front matter stripped. The body starts on
/// the line after the closing fence.
fn body_of(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("---") else { return raw };
    match rest.split_once("\n---") {
        Some((_, after_fence)) => after_fence
            .split_once('\n')
            .map(|(_, body)| body)
            .unwrap_or(""),
        None => raw,
    }
}

async fn load_pages(dir: &Path) -> Result<HashMap<String, Page>> {
    let mut pages = HashMap::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("reading {}", dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "md") {
            continue;
        }
        let Some(slug) = file_stem(&path) else { continue };
        let raw = fs::read_to_string(&path).await?;

        let matter = Matter::<YAML>::new();
        let parsed = match matter.parse::<PageFrontMatter>(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(page = %slug, "failed to parse page front matter: {}", e);
                continue;
            }
        };
        let Some(front_matter) = parsed.data else {
            warn!(page = %slug, "page has no front matter, skipping");
            continue;
        };

        pages.insert(
            slug.clone(),
            Page {
                slug,
                title: front_matter.title,
                description: front_matter.description,
                html: render_markdown_to_html(&parsed.content),
            },
        );
    }
    Ok(pages)
}

async fn load_posts(dir: &Path) -> Result<Vec<Post>> {
    let mut posts: Vec<Post> = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("reading {}", dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "md") {
            continue;
        }
        let Some(slug) = file_stem(&path) else { continue };
        let raw = fs::read_to_string(&path).await?;
        match parse_post(&slug, &raw) {
            Some(post) => posts.push(post),
            None => warn!(post = %slug, "skipping malformed post"),
        }
    }

    sort_newest_first(&mut posts);
    Ok(posts)
}

/// One bad file must not take the whole site down, so this returns `None`
/// instead of an error; the caller logs and moves on.
fn parse_post(slug: &str, raw: &str) -> Option<Post> {
    let matter = Matter::<YAML>::new();
    let parsed = match matter.parse::<PostFrontMatter>(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(post = %slug, "failed to parse front matter: {}", e);
            return None;
        }
    };
    let front_matter = parsed.data?;

    let date = match NaiveDate::parse_from_str(&front_matter.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(e) => {
            warn!(post = %slug, date = %front_matter.date, "bad post date: {}", e);
            return None;
        }
    };

    let summary = front_matter
        .summary
        .unwrap_or_else(|| first_paragraph_text(&parsed.content));

    Some(Post {
        title: front_matter.title,
        slug: slug.to_string(),
        date,
        summary,
    })
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_string())
}

pub async fn reload_content(app_state: &AppState) {
    info!("Reloading application content...");
    match load_content().await {
        Ok(content) => {
            *app_state.content.write().await = content;
            info!("Content successfully reloaded.");
        }
        Err(e) => {
            error!("Failed to reload content: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std_fs::create_dir_all(parent).unwrap();
        }
        std_fs::write(path, contents).unwrap();
    }

    fn scratch_site() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        write_file(dir, "layout.html", "<html>{{ content }}</html>");
        write_file(dir, "banner.html", "<nav></nav>");
        write_file(dir, "not_found.html", "<p>{{ slug }} not found</p>");
        write_file(dir, "home.md", "# My Portfolio\n\nWelcome.");
        std_fs::create_dir_all(dir.join("pages")).unwrap();
        std_fs::create_dir_all(dir.join("posts")).unwrap();
        tmp
    }

    #[tokio::test]
    async fn loads_posts_sorted_newest_first() {
        let tmp = scratch_site();
        write_file(
            tmp.path(),
            "posts/older.md",
            "---\ntitle: Older\ndate: 2024-01-05\n---\nBody.",
        );
        write_file(
            tmp.path(),
            "posts/newer.md",
            "---\ntitle: Newer\ndate: 2026-02-21\nsummary: Fresh.\n---\nBody.",
        );

        let content = load_content_from(tmp.path()).await.unwrap();
        let slugs: Vec<&str> = content.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["newer", "older"]);
        assert_eq!(content.posts[0].summary, "Fresh.");
    }

    #[tokio::test]
    async fn malformed_posts_are_skipped() {
        let tmp = scratch_site();
        write_file(
            tmp.path(),
            "posts/good.md",
            "---\ntitle: Good\ndate: 2025-07-01\n---\nBody.",
        );
        write_file(
            tmp.path(),
            "posts/no-front-matter.md",
            "Just a body, no metadata.",
        );
        write_file(
            tmp.path(),
            "posts/bad-date.md",
            "---\ntitle: Bad\ndate: not-a-date\n---\nBody.",
        );

        let content = load_content_from(tmp.path()).await.unwrap();
        assert_eq!(content.posts.len(), 1);
        assert_eq!(content.posts[0].slug, "good");
    }

    #[tokio::test]
    async fn empty_posts_directory_is_not_an_error() {
        let tmp = scratch_site();
        let content = load_content_from(tmp.path()).await.unwrap();
        assert!(content.posts.is_empty());
    }

    #[tokio::test]
    async fn summary_falls_back_to_first_paragraph() {
        let tmp = scratch_site();
        write_file(
            tmp.path(),
            "posts/plain.md",
            "---\ntitle: Plain\ndate: 2025-03-09\n---\nOpening line of the post.\n\nMore text.",
        );

        let content = load_content_from(tmp.path()).await.unwrap();
        assert_eq!(content.posts[0].summary, "Opening line of the post.");
    }

    #[tokio::test]
    async fn loads_pages_with_metadata() {
        let tmp = scratch_site();
        write_file(
            tmp.path(),
            "pages/about.md",
            "---\ntitle: About\ndescription: About page\n---\n## About\n\nHello.",
        );

        let content = load_content_from(tmp.path()).await.unwrap();
        let about = content.pages.get("about").unwrap();
        assert_eq!(about.title, "About");
        assert_eq!(about.description, "About page");
        assert!(about.html.contains("<h2>About</h2>"));
    }

    #[test]
    fn body_of_strips_front_matter() {
        let raw = "---\ntitle: T\n---\nBody here.";
        assert_eq!(body_of(raw), "Body here.");
        assert_eq!(body_of("No front matter."), "No front matter.");
        assert_eq!(body_of("---\ntitle: T\n---\n- a list item"), "- a list item");
    }
}
