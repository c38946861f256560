//! Affiliate resources (`resources`).

use serde::{Deserialize, Serialize};

use super::{fetch_with_fallback, require, ContentError, SaveOutcome, Sourced};
use crate::blob::BlobStore;
use crate::error::ApiError;
use crate::media::{resolve_image, ImageInput};
use crate::store::{to_fields, DocumentStore, StoreError, RESOURCES};
use crate::validators::is_valid_url;

pub const IMAGE_FOLDER: &str = "resourceImages";

/// Seeding is skipped once this many resources exist.
const SEED_THRESHOLD: usize = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Resource {
    pub category: String,
    pub category_label: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub link: String,
}

impl Resource {
    /// Records missing any displayed field are not shown to readers.
    pub fn is_complete(&self) -> bool {
        [
            &self.title,
            &self.category,
            &self.category_label,
            &self.description,
            &self.link,
        ]
        .iter()
        .all(|f| !f.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredResource {
    pub id: String,
    #[serde(flatten)]
    pub resource: Resource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceCategory {
    pub code: String,
    pub label: String,
}

/// Distinct categories in first-seen order, labelled by their first resource.
pub fn categories(resources: &[StoredResource]) -> Vec<ResourceCategory> {
    let mut seen: Vec<ResourceCategory> = Vec::new();
    for r in resources {
        if !seen.iter().any(|c| c.code == r.resource.category) {
            seen.push(ResourceCategory {
                code: r.resource.category.clone(),
                label: r.resource.category_label.clone(),
            });
        }
    }
    seen
}

pub fn filter_by_category(resources: Vec<StoredResource>, category: Option<&str>) -> Vec<StoredResource> {
    match category.map(str::trim).filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all")) {
        Some(code) => resources
            .into_iter()
            .filter(|r| r.resource.category == code)
            .collect(),
        None => resources,
    }
}

fn builtin_resources() -> Vec<Resource> {
    let resource = |category: &str, label: &str, title: &str, description: &str, image: &str, link: &str| Resource {
        category: category.to_string(),
        category_label: label.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        image_url: Some(image.to_string()),
        link: link.to_string(),
    };

    vec![
        resource(
            "trading",
            "Trading Platform",
            "Premium Trading Platform",
            "A comprehensive trading platform with advanced analytics, live charts, and extended market hours. Includes access to pre-market and after-hours trading with real-time data.",
            "https://images.unsplash.com/photo-1642033697099-309b2078c648?q=80&w=1470&auto=format&fit=crop",
            "https://www.youraffiliatelink.com/trading-platform",
        ),
        resource(
            "analysis",
            "Analysis Tool",
            "Market Scanner Pro",
            "Powerful scanner tool that helps you find the best trade opportunities with custom presets. Identify patterns and trends with institutional-grade algorithms and historical backtesting.",
            "https://images.unsplash.com/photo-1633158829585-23ba8f7c8caf?q=80&w=1470&auto=format&fit=crop",
            "https://www.youraffiliatelink.com/market-scanner",
        ),
        resource(
            "productivity",
            "Productivity",
            "Advanced Trading Journal",
            "Record, track, and analyze your trades to improve your performance and identify patterns. Includes AI-powered trade analysis to identify strengths and weaknesses in your trading strategy.",
            "https://images.unsplash.com/photo-1518546305927-5a555bb7020d?q=80&w=1469&auto=format&fit=crop",
            "https://www.youraffiliatelink.com/trading-journal",
        ),
        resource(
            "education",
            "Education",
            "Master the Markets Course",
            "Comprehensive trading course covering technical analysis, risk management, and trading psychology. Learn from professional traders with years of experience in various market conditions.",
            "https://images.unsplash.com/photo-1543286386-713bdd548da4?q=80&w=1470&auto=format&fit=crop",
            "https://www.youraffiliatelink.com/trading-course",
        ),
        resource(
            "risk",
            "Risk Management",
            "Position Size Calculator",
            "Calculate optimal position sizes based on your risk tolerance and account size. Maximize returns while minimizing risk with advanced portfolio management tools.",
            "https://images.unsplash.com/photo-1611974789855-9c2a0a7236a3?q=80&w=1470&auto=format&fit=crop",
            "https://www.youraffiliatelink.com/position-calculator",
        ),
        resource(
            "news",
            "News & Data",
            "Financial News Alert Service",
            "Get real-time alerts for market-moving news and events tailored to your watchlist. Includes earnings reports, economic data releases, and expert analysis.",
            "https://images.unsplash.com/photo-1565514020179-026b5f8dbcf5?q=80&w=1470&auto=format&fit=crop",
            "https://www.youraffiliatelink.com/news-alerts",
        ),
        resource(
            "trading",
            "Trading Platform",
            "Charting Suite Pro",
            "Professional-grade charting software with over 100 indicators, drawing tools, and custom scripts. Includes cloud synchronization across devices and real-time alerts.",
            "https://images.unsplash.com/photo-1611974789855-9c2a0a7236a3?q=80&w=1470&auto=format&fit=crop",
            "https://www.youraffiliatelink.com/charting-suite",
        ),
        resource(
            "education",
            "Education",
            "Options Trading Masterclass",
            "Learn advanced options strategies from professional traders with over 20 years of experience. Includes live trading sessions and personalized feedback on your trades.",
            "https://images.unsplash.com/photo-1460925895917-afdab827c52f?q=80&w=1470&auto=format&fit=crop",
            "https://www.youraffiliatelink.com/options-masterclass",
        ),
        resource(
            "analysis",
            "Analysis Tool",
            "AI Market Predictor",
            "Cutting-edge artificial intelligence that analyzes market patterns and predicts potential price movements with remarkable accuracy. Train the AI with your own successful trades.",
            "https://images.unsplash.com/photo-1551288049-bebda4e38f71?q=80&w=1470&auto=format&fit=crop",
            "https://www.youraffiliatelink.com/ai-predictor",
        ),
    ]
}

pub fn fallback_resources() -> Vec<StoredResource> {
    builtin_resources()
        .into_iter()
        .enumerate()
        .map(|(i, resource)| StoredResource {
            id: format!("resource-{}", i + 1),
            resource,
        })
        .collect()
}

pub async fn list_stored(store: &dyn DocumentStore) -> Result<Vec<StoredResource>, StoreError> {
    let docs = store.list(RESOURCES).await?;
    Ok(docs
        .iter()
        .filter_map(|doc| match doc.decode::<Resource>() {
            Ok(resource) => Some(StoredResource {
                id: doc.id.clone(),
                resource,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed resource");
                None
            }
        })
        .collect())
}

/// Complete stored resources, or the built-in set when there are none.
pub async fn load_resources(store: &dyn DocumentStore) -> Sourced<Vec<StoredResource>> {
    fetch_with_fallback(
        "resources",
        async {
            let complete: Vec<StoredResource> = list_stored(store)
                .await?
                .into_iter()
                .filter(|r| r.resource.is_complete())
                .collect();
            Ok::<_, StoreError>(if complete.is_empty() { None } else { Some(complete) })
        },
        fallback_resources,
    )
    .await
}

#[derive(Debug, Clone)]
pub struct ResourceSubmission {
    pub category: String,
    pub category_label: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub image: ImageInput,
}

impl ResourceSubmission {
    fn validate(&self) -> Result<(), ContentError> {
        require(&[
            ("category", self.category.as_str()),
            ("categoryLabel", self.category_label.as_str()),
            ("title", self.title.as_str()),
            ("description", self.description.as_str()),
            ("link", self.link.as_str()),
        ])?;
        if !is_valid_url(&self.link) {
            return Err(ContentError::invalid("link", "must be a web address"));
        }
        Ok(())
    }
}

/// Create or update a resource. Image upload failures are tolerated.
pub async fn save_resource(
    store: &dyn DocumentStore,
    blobs: Option<&dyn BlobStore>,
    id: Option<&str>,
    submission: ResourceSubmission,
) -> Result<SaveOutcome<StoredResource>, ApiError> {
    submission.validate()?;

    let image = resolve_image(blobs, IMAGE_FOLDER, submission.image).await;
    let resource = Resource {
        category: submission.category.trim().to_lowercase(),
        category_label: submission.category_label.trim().to_string(),
        title: submission.title.trim().to_string(),
        description: submission.description.trim().to_string(),
        image_url: image.url,
        link: submission.link.trim().to_string(),
    };
    let fields = to_fields(&resource)?;

    let verb = if id.is_some() { "updated" } else { "created" };
    let doc = match id {
        Some(id) => store.update(RESOURCES, id, fields).await?,
        None => store.create(RESOURCES, fields).await?,
    };

    let mut message = match id {
        Some(_) => "Resource updated successfully!".to_string(),
        None => "New resource created successfully!".to_string(),
    };
    if image.upload_failed {
        message.push_str(&format!(
            " (Note: Image upload failed, but resource was {verb} successfully)"
        ));
    }

    tracing::info!(id = %doc.id, title = %resource.title, "resource {}", verb);

    Ok(SaveOutcome {
        record: StoredResource {
            id: doc.id,
            resource,
        },
        message,
        image_upload_failed: image.upload_failed,
    })
}

pub async fn delete_resource(store: &dyn DocumentStore, id: &str) -> Result<(), ApiError> {
    if store.delete(RESOURCES, id).await? {
        tracing::info!(id = %id, "resource deleted");
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}

/// Add the built-in resources unless the collection is already populated.
pub async fn seed_resources(store: &dyn DocumentStore) -> Result<usize, StoreError> {
    let existing = store.list(RESOURCES).await?.len();
    if existing >= SEED_THRESHOLD {
        tracing::info!(existing, "resources already populated, skipping seed");
        return Ok(0);
    }

    let resources = builtin_resources();
    for resource in &resources {
        store.create(RESOURCES, to_fields(resource)?).await?;
    }
    tracing::info!(count = resources.len(), "sample resources added");
    Ok(resources.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn submission() -> ResourceSubmission {
        ResourceSubmission {
            category: "Education".to_string(),
            category_label: "Education".to_string(),
            title: "Options 101".to_string(),
            description: "A primer".to_string(),
            link: "https://www.youraffiliatelink.com/options-101".to_string(),
            image: ImageInput::Keep(None),
        }
    }

    #[tokio::test]
    async fn test_empty_store_serves_nine_fallbacks() {
        let store = MemoryStore::new();
        let sourced = load_resources(&store).await;
        assert!(sourced.is_fallback());
        assert_eq!(sourced.value.len(), 9);
        assert_eq!(sourced.value[0].id, "resource-1");
    }

    #[tokio::test]
    async fn test_incomplete_records_are_hidden() {
        let store = MemoryStore::new();
        store
            .create(RESOURCES, json!({ "title": "No link" }).as_object().cloned().unwrap())
            .await
            .unwrap();
        let sourced = load_resources(&store).await;
        assert!(sourced.is_fallback());
    }

    #[tokio::test]
    async fn test_save_normalizes_category_code() {
        let store = MemoryStore::new();
        let outcome = save_resource(&store, None, None, submission()).await.unwrap();
        assert_eq!(outcome.record.resource.category, "education");
        assert_eq!(outcome.message, "New resource created successfully!");

        let sourced = load_resources(&store).await;
        assert!(!sourced.is_fallback());
        assert_eq!(sourced.value.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_link_is_rejected() {
        let store = MemoryStore::new();
        let mut bad = submission();
        bad.link = "not a link".to_string();
        assert!(save_resource(&store, None, None, bad).await.is_err());
    }

    #[tokio::test]
    async fn test_seed_is_skipped_when_populated() {
        let store = MemoryStore::new();
        assert_eq!(seed_resources(&store).await.unwrap(), 9);
        assert_eq!(seed_resources(&store).await.unwrap(), 0);
    }

    #[test]
    fn test_categories_and_filter() {
        let all = fallback_resources();
        let cats = categories(&all);
        assert_eq!(cats.len(), 6);
        assert_eq!(
            cats[0],
            ResourceCategory {
                code: "trading".to_string(),
                label: "Trading Platform".to_string()
            }
        );
        assert_eq!(filter_by_category(all.clone(), Some("education")).len(), 2);
        assert_eq!(filter_by_category(all, Some("all")).len(), 9);
    }
}
