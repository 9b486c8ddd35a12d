use chrono::NaiveDate;
use serde::Deserialize;

/// Front matter of a blog post (`content/posts/*.md`).
#[derive(Deserialize, Debug, Clone)]
pub struct PostFrontMatter {
    pub title: String,
    pub date: String,
    pub summary: Option<String>,
}

/// Front matter of a static page (`content/pages/*.md`).
#[derive(Deserialize, Debug, Clone)]
pub struct PageFrontMatter {
    pub title: String,
    pub description: String,
}

/// A blog post as it appears in the listing. The body is read from disk
/// at request time, so only listing metadata lives here.
#[derive(Debug, Clone)]
pub struct Post {
    pub title: String,
    /// URL slug, taken from the content file stem.
    pub slug: String,
    pub date: NaiveDate,
    pub summary: String,
}

impl Post {
    pub fn href(&self) -> String {
        format!("/posts/{}", self.slug)
    }

    /// Listing date, e.g. "May 12, 2026".
    pub fn display_date(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }
}

/// A static page, rendered once at load time.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub html: String,
}

/// Descending by date, ascending by slug for equal dates, so the listing
/// and the sitemap are deterministic across reloads.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str, date: &str) -> Post {
        Post {
            title: slug.to_string(),
            slug: slug.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            summary: String::new(),
        }
    }

    #[test]
    fn sorts_posts_newest_first() {
        let mut posts = vec![
            post("oldest", "2024-01-02"),
            post("newest", "2026-03-15"),
            post("middle", "2025-07-01"),
        ];
        sort_newest_first(&mut posts);
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["newest", "middle", "oldest"]);
    }

    #[test]
    fn equal_dates_fall_back_to_slug_order() {
        let mut posts = vec![post("b", "2025-07-01"), post("a", "2025-07-01")];
        sort_newest_first(&mut posts);
        assert_eq!(posts[0].slug, "a");
    }

    #[test]
    fn formats_display_date() {
        assert_eq!(post("p", "2026-05-12").display_date(), "May 12, 2026");
    }
}
