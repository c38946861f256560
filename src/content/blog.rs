//! Blog posts (`blogs`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{fetch_with_fallback, require, ContentError, ContentSource, SaveOutcome, Sourced};
use crate::blob::BlobStore;
use crate::error::ApiError;
use crate::media::{resolve_image, ImageInput};
use crate::store::{to_fields, DocumentStore, StoreError, BLOGS};
use crate::validators::{is_valid_length, sanitize_html};

pub const IMAGE_FOLDER: &str = "blogImages";
pub const DEFAULT_AUTHOR: &str = "Motion Wealth Group";

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogPost {
    pub title: String,
    pub desc: String,
    /// Rich HTML body, sanitized on write.
    pub content: String,
    pub category: String,
    pub date: String,
    pub img: Option<String>,
    pub author: Option<String>,
}

impl BlogPost {
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_post_date(&self.date)
    }

    pub fn author_name(&self) -> &str {
        self.author
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(DEFAULT_AUTHOR)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredPost {
    pub id: String,
    #[serde(flatten)]
    pub post: BlogPost,
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or RFC 3339.
pub fn parse_post_date(date: &str) -> Option<DateTime<Utc>> {
    let date = date.trim();
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Newest first; posts with unreadable dates go last.
pub fn sort_newest_first(posts: &mut [StoredPost]) {
    posts.sort_by(|a, b| b.post.published_at().cmp(&a.post.published_at()));
}

/// Distinct categories in first-seen order.
pub fn categories(posts: &[StoredPost]) -> Vec<String> {
    let mut seen = Vec::new();
    for post in posts {
        let category = post.post.category.trim();
        if !category.is_empty() && !seen.iter().any(|c: &String| c == category) {
            seen.push(category.to_string());
        }
    }
    seen
}

/// Category match is exact (`all` in any case, or empty, means any); the query is a
/// case-insensitive substring of title or description.
pub fn filter_posts(posts: Vec<StoredPost>, category: Option<&str>, query: Option<&str>) -> Vec<StoredPost> {
    let category = category.map(str::trim).filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));
    let query = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    posts
        .into_iter()
        .filter(|p| category.map_or(true, |c| p.post.category == c))
        .filter(|p| {
            query.as_deref().map_or(true, |q| {
                p.post.title.to_lowercase().contains(q) || p.post.desc.to_lowercase().contains(q)
            })
        })
        .collect()
}

// ============================================================================
// Built-in posts
// ============================================================================

pub fn fallback_posts() -> Vec<StoredPost> {
    let now = Utc::now();
    let post = |n: i64, title: &str, desc: &str, category: &str, img: &str| StoredPost {
        id: format!("fallback-{}", n + 1),
        post: BlogPost {
            title: title.to_string(),
            desc: desc.to_string(),
            content: String::new(),
            category: category.to_string(),
            date: (now - chrono::Duration::days(n)).to_rfc3339(),
            img: Some(img.to_string()),
            author: Some(DEFAULT_AUTHOR.to_string()),
        },
    };

    vec![
        post(
            0,
            "Understanding Market Analysis",
            "An introduction to fundamental techniques used in market analysis for trading success.",
            "Trading",
            "https://images.unsplash.com/photo-1611974789855-9c2a0a7236a3?ixlib=rb-1.2.1&auto=format&fit=crop&w=1950&q=80",
        ),
        post(
            1,
            "Risk Management Essentials",
            "Learn the core principles of managing risk in your trading portfolio.",
            "Strategy",
            "https://images.unsplash.com/photo-1543286386-713bdd548da4?ixlib=rb-1.2.1&auto=format&fit=crop&w=1950&q=80",
        ),
        post(
            2,
            "The Psychology of Trading",
            "How mental discipline and emotional control impact your trading decisions.",
            "Psychology",
            "https://images.unsplash.com/photo-1579226905180-636b76d96082?ixlib=rb-1.2.1&auto=format&fit=crop&w=1950&q=80",
        ),
    ]
}

pub fn sample_posts() -> Vec<BlogPost> {
    let post = |title: &str, category: &str, date: &str, desc: &str, img: &str| BlogPost {
        title: title.to_string(),
        desc: desc.to_string(),
        content: String::new(),
        category: category.to_string(),
        date: date.to_string(),
        img: Some(img.to_string()),
        author: None,
    };

    vec![
        post(
            "Emerging Market Trends for 2025",
            "Market Analysis",
            "2025-05-15",
            "Analysis of upcoming market trends and how they might affect your investment portfolio in the coming year.",
            "https://images.unsplash.com/photo-1642033697099-309b2078c648?q=80&w=1470&auto=format&fit=crop",
        ),
        post(
            "The Psychology of Successful Trading",
            "Trading Strategy",
            "2025-05-10",
            "Understanding the mental aspects of trading and how to maintain discipline in volatile markets.",
            "https://images.unsplash.com/photo-1633158829585-23ba8f7c8caf?q=80&w=1470&auto=format&fit=crop",
        ),
        post(
            "Bitcoin and Ethereum: A Technical Analysis",
            "Cryptocurrency",
            "2025-05-05",
            "In-depth technical analysis of the two leading cryptocurrencies and potential price movements in the coming months.",
            "https://images.unsplash.com/photo-1518546305927-5a555bb7020d?q=80&w=1469&auto=format&fit=crop",
        ),
        post(
            "Building Passive Income Through Dividend Stocks",
            "Investment Strategy",
            "2025-04-28",
            "How to create a sustainable passive income stream by investing in quality dividend-paying stocks.",
            "https://images.unsplash.com/photo-1565514020179-026b5f8dbcf5?q=80&w=1470&auto=format&fit=crop",
        ),
        post(
            "Essential Risk Management Strategies for Traders",
            "Risk Management",
            "2025-04-20",
            "Practical approaches to managing risk and protecting your capital in unpredictable market conditions.",
            "https://images.unsplash.com/photo-1611974789855-9c2a0a7236a3?q=80&w=1470&auto=format&fit=crop",
        ),
        post(
            "The Top 5 Technical Indicators Every Trader Should Know",
            "Technical Analysis",
            "2025-04-15",
            "A breakdown of the most effective technical indicators and how to implement them in your trading.",
            "https://images.unsplash.com/photo-1543286386-713bdd548da4?q=80&w=1470&auto=format&fit=crop",
        ),
    ]
}

// ============================================================================
// Reads
// ============================================================================

/// Every readable stored post, newest first. Malformed documents are skipped.
pub async fn list_stored(store: &dyn DocumentStore) -> Result<Vec<StoredPost>, StoreError> {
    let docs = store.list(BLOGS).await?;
    let mut posts: Vec<StoredPost> = docs
        .iter()
        .filter_map(|doc| match doc.decode::<BlogPost>() {
            Ok(post) => Some(StoredPost {
                id: doc.id.clone(),
                post,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed blog post");
                None
            }
        })
        .collect();
    sort_newest_first(&mut posts);
    Ok(posts)
}

pub async fn load_posts(store: &dyn DocumentStore) -> Sourced<Vec<StoredPost>> {
    fetch_with_fallback(
        "blog posts",
        async {
            let posts = list_stored(store).await?;
            Ok::<_, StoreError>(if posts.is_empty() { None } else { Some(posts) })
        },
        fallback_posts,
    )
    .await
}

/// A single post. Built-in fallback ids resolve even when the store has nothing.
pub async fn load_post(store: &dyn DocumentStore, id: &str) -> Option<Sourced<StoredPost>> {
    let stored = match store.get(BLOGS, id).await {
        Ok(doc) => doc.and_then(|doc| match doc.decode::<BlogPost>() {
            Ok(post) => Some(StoredPost { id: doc.id, post }),
            Err(e) => {
                tracing::warn!(error = %e, "malformed blog post");
                None
            }
        }),
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "blog post read failed");
            None
        }
    };

    match stored {
        Some(value) => Some(Sourced {
            value,
            source: ContentSource::Store,
        }),
        None => fallback_posts()
            .into_iter()
            .find(|p| p.id == id)
            .map(|value| Sourced {
                value,
                source: ContentSource::Fallback,
            }),
    }
}

// ============================================================================
// Writes
// ============================================================================

/// Fields an editor submitted for a post.
#[derive(Debug, Clone)]
pub struct PostSubmission {
    pub title: String,
    pub desc: String,
    pub content: String,
    pub category: String,
    pub date: String,
    pub author: Option<String>,
    pub image: ImageInput,
}

impl PostSubmission {
    fn validate(&self) -> Result<(), ContentError> {
        require(&[
            ("title", self.title.as_str()),
            ("category", self.category.as_str()),
            ("date", self.date.as_str()),
        ])?;
        if !is_valid_length(&self.title, 1, MAX_TITLE_LEN) {
            return Err(ContentError::invalid("title", "must be at most 200 characters"));
        }
        if parse_post_date(&self.date).is_none() {
            return Err(ContentError::invalid("date", "expected YYYY-MM-DD"));
        }
        Ok(())
    }
}

/// Create (`id == None`) or update a post. Validation runs before any upload;
/// a failed upload stores the post without an image.
pub async fn save_post(
    store: &dyn DocumentStore,
    blobs: Option<&dyn BlobStore>,
    id: Option<&str>,
    submission: PostSubmission,
) -> Result<SaveOutcome<StoredPost>, ApiError> {
    submission.validate()?;

    let image = resolve_image(blobs, IMAGE_FOLDER, submission.image).await;
    let post = BlogPost {
        title: submission.title.trim().to_string(),
        desc: submission.desc.trim().to_string(),
        content: sanitize_html(&submission.content),
        category: submission.category.trim().to_string(),
        date: submission.date.trim().to_string(),
        img: image.url,
        author: submission.author.filter(|a| !a.trim().is_empty()),
    };
    let fields = to_fields(&post)?;

    let (doc, message) = match id {
        Some(id) => {
            let doc = store.update(BLOGS, id, fields).await?;
            let note = if image.upload_failed {
                " (Note: Image upload failed, but post was updated successfully)"
            } else {
                ""
            };
            (doc, format!("Blog post updated successfully!{note}"))
        }
        None => {
            let doc = store.create(BLOGS, fields).await?;
            let note = if image.upload_failed {
                " (Note: Image upload failed, but post was created successfully)"
            } else {
                ""
            };
            (doc, format!("New blog post created successfully!{note}"))
        }
    };

    tracing::info!(id = %doc.id, title = %post.title, image_upload_failed = image.upload_failed, "blog post saved");

    Ok(SaveOutcome {
        record: StoredPost { id: doc.id, post },
        message,
        image_upload_failed: image.upload_failed,
    })
}

pub async fn delete_post(store: &dyn DocumentStore, id: &str) -> Result<(), ApiError> {
    if store.delete(BLOGS, id).await? {
        tracing::info!(id = %id, "blog post deleted");
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}

pub async fn seed_sample_posts(store: &dyn DocumentStore) -> Result<usize, StoreError> {
    let samples = sample_posts();
    for post in &samples {
        store.create(BLOGS, to_fields(post)?).await?;
    }
    tracing::info!(count = samples.len(), "sample blog posts added");
    Ok(samples.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{BlobError, UploadedFile};
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct BrokenBlobs;

    #[async_trait]
    impl BlobStore for BrokenBlobs {
        async fn upload(&self, _: &str, _: &[u8], _: &str) -> Result<String, BlobError> {
            Err(BlobError::Io(std::io::Error::other("quota exceeded")))
        }
    }

    fn submission(image: ImageInput) -> PostSubmission {
        PostSubmission {
            title: "Reading Candlesticks".to_string(),
            desc: "Patterns that matter".to_string(),
            content: "<p>Body</p>".to_string(),
            category: "Technical Analysis".to_string(),
            date: "2025-06-01".to_string(),
            author: None,
            image,
        }
    }

    fn png() -> UploadedFile {
        UploadedFile {
            field_name: "image".to_string(),
            file_name: Some("candles.png".to_string()),
            content_type: Some("image/png".to_string()),
            bytes: vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A],
        }
    }

    fn stored(id: &str, date: &str, category: &str) -> StoredPost {
        StoredPost {
            id: id.to_string(),
            post: BlogPost {
                title: format!("Post {id}"),
                date: date.to_string(),
                category: category.to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_create_with_failed_upload_stores_post_without_image() {
        let store = MemoryStore::new();
        let outcome = save_post(&store, Some(&BrokenBlobs), None, submission(ImageInput::Upload(png())))
            .await
            .unwrap();

        assert!(outcome.image_upload_failed);
        assert_eq!(
            outcome.message,
            "New blog post created successfully! (Note: Image upload failed, but post was created successfully)"
        );

        let doc = store.get(BLOGS, &outcome.record.id).await.unwrap().unwrap();
        assert_eq!(doc.data.get("img"), Some(&serde_json::Value::Null));
        assert_eq!(doc.get_str("title"), Some("Reading Candlesticks"));
    }

    #[tokio::test]
    async fn test_missing_required_fields_are_rejected_before_upload() {
        let store = MemoryStore::new();
        let mut bad = submission(ImageInput::Keep(None));
        bad.category = String::new();

        let err = save_post(&store, None, None, bad).await.unwrap_err();
        assert_eq!(err.to_string(), "Please fill in all required fields");
        assert!(store.list(BLOGS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_existing_image_and_reports_message() {
        let store = MemoryStore::new();
        let created = save_post(
            &store,
            None,
            None,
            submission(ImageInput::Keep(Some("https://images.unsplash.com/a".into()))),
        )
        .await
        .unwrap();

        let mut edit = submission(ImageInput::Keep(Some("https://images.unsplash.com/a".into())));
        edit.title = "Reading Candlesticks, Part 2".to_string();
        let updated = save_post(&store, None, Some(&created.record.id), edit)
            .await
            .unwrap();

        assert_eq!(updated.message, "Blog post updated successfully!");
        assert_eq!(updated.record.post.img.as_deref(), Some("https://images.unsplash.com/a"));
    }

    #[tokio::test]
    async fn test_clearing_the_author_persists_on_update() {
        let store = MemoryStore::new();
        let mut first = submission(ImageInput::Keep(None));
        first.author = Some("Guest Writer".to_string());
        let created = save_post(&store, None, None, first).await.unwrap();
        let doc = store.get(BLOGS, &created.record.id).await.unwrap().unwrap();
        assert_eq!(doc.get_str("author"), Some("Guest Writer"));

        let mut edit = submission(ImageInput::Keep(None));
        edit.author = Some("   ".to_string());
        let updated = save_post(&store, None, Some(&created.record.id), edit)
            .await
            .unwrap();
        assert_eq!(updated.record.post.author, None);

        let doc = store.get(BLOGS, &created.record.id).await.unwrap().unwrap();
        assert_eq!(doc.data.get("author"), Some(&serde_json::Value::Null));
        let reloaded: BlogPost = serde_json::from_value(serde_json::Value::Object(doc.data)).unwrap();
        assert_eq!(reloaded.author_name(), DEFAULT_AUTHOR);
    }

    #[tokio::test]
    async fn test_deleted_post_leaves_listing() {
        let store = MemoryStore::new();
        seed_sample_posts(&store).await.unwrap();
        let victim = list_stored(&store).await.unwrap()[0].id.clone();

        delete_post(&store, &victim).await.unwrap();

        let remaining = list_stored(&store).await.unwrap();
        assert_eq!(remaining.len(), 5);
        assert!(remaining.iter().all(|p| p.id != victim));
        assert!(matches!(delete_post(&store, &victim).await, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_empty_store_serves_fallback_posts() {
        let store = MemoryStore::new();
        let sourced = load_posts(&store).await;
        assert!(sourced.is_fallback());
        assert_eq!(sourced.value.len(), 3);
        assert_eq!(
            categories(&sourced.value),
            vec!["Trading", "Strategy", "Psychology"]
        );
    }

    #[tokio::test]
    async fn test_fallback_post_resolves_by_id() {
        let store = MemoryStore::new();
        let post = load_post(&store, "fallback-2").await.unwrap();
        assert_eq!(post.value.post.title, "Risk Management Essentials");
        assert!(load_post(&store, "nope").await.is_none());
    }

    #[tokio::test]
    async fn test_seeded_posts_sort_newest_first() {
        let store = MemoryStore::new();
        seed_sample_posts(&store).await.unwrap();
        let sourced = load_posts(&store).await;
        assert!(!sourced.is_fallback());
        assert_eq!(sourced.value[0].post.title, "Emerging Market Trends for 2025");
        assert_eq!(
            sourced.value[5].post.title,
            "The Top 5 Technical Indicators Every Trader Should Know"
        );
    }

    #[test]
    fn test_parse_post_date() {
        assert!(parse_post_date("2025-05-15").is_some());
        assert!(parse_post_date("2025-05-15T10:00:00Z").is_some());
        assert!(parse_post_date("May 15").is_none());
    }

    #[test]
    fn test_unparseable_dates_sort_last() {
        let mut posts = vec![
            stored("a", "garbage", "X"),
            stored("b", "2024-01-01", "X"),
            stored("c", "2025-01-01", "X"),
        ];
        sort_newest_first(&mut posts);
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_filter_by_category_and_query() {
        let posts = vec![
            stored("a", "2025-01-01", "Trading"),
            stored("b", "2025-01-02", "Strategy"),
        ];
        assert_eq!(filter_posts(posts.clone(), Some("Trading"), None).len(), 1);
        assert_eq!(filter_posts(posts.clone(), Some("All"), None).len(), 2);
        assert_eq!(filter_posts(posts.clone(), None, Some("POST B")).len(), 1);
        assert!(filter_posts(posts, Some("Trading"), Some("post b")).is_empty());
    }
}
