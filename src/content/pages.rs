//! Page content documents (`pageContent`), one per named page.
//!
//! Known pages have a fixed shape; any other page name holds an arbitrary
//! JSON object. Stored documents from older editors may carry their content
//! as a JSON string, or nested under `sections`; both are still read.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{fetch_with_fallback, require, ContentError, ContentSource, Sourced};
use crate::store::{Document, DocumentStore, StoreError, PAGE_CONTENT};
use crate::validators::{is_valid_email, is_valid_phone, sanitize_html};

pub const HOME: &str = "home";
pub const ABOUT: &str = "about";
pub const RESOURCES: &str = "resources";
pub const CONTACT: &str = "contact";

/// Pages whose default document is created when missing.
pub const SEEDED_PAGES: [&str; 4] = [HOME, ABOUT, RESOURCES, CONTACT];

lazy_static! {
    static ref PAGE_NAME_REGEX: Regex = Regex::new(r"^[a-z0-9][a-z0-9-]{0,63}$").unwrap();
}

pub fn is_valid_page_name(name: &str) -> bool {
    PAGE_NAME_REGEX.is_match(name)
}

// ============================================================================
// Page shapes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HomeAbout {
    pub title: String,
    pub content: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CallToAction {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeContent {
    pub hero: Hero,
    pub about: HomeAbout,
    pub cta: CallToAction,
}

impl Default for HomeContent {
    fn default() -> Self {
        Self {
            hero: Hero {
                title: "Motion Wealth Group".to_string(),
                subtitle: "Building wealth through strategic investment insights".to_string(),
                button_text: Some("Learn More".to_string()),
            },
            about: HomeAbout {
                title: "About Motion Wealth Group".to_string(),
                content: "Motion Wealth Group helps people learn about trading and investing. We give clear information so you can make better financial decisions.".to_string(),
                values: vec![
                    "Clear and honest advice".to_string(),
                    "Always learning new things".to_string(),
                    "Respecting your comfort with risk".to_string(),
                    "Building wealth that lasts".to_string(),
                ],
            },
            cta: CallToAction {
                title: "Ready to Accelerate Your Trading Journey?".to_string(),
                content: "Connect with Motion Wealth Group for personalized insights and resources to help you achieve your financial goals.".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutContent {
    pub title: String,
    pub subtitle: String,
    /// HTML, sanitized on write.
    pub content: String,
}

impl Default for AboutContent {
    fn default() -> Self {
        Self {
            title: "Our Story".to_string(),
            subtitle: "Get to know the people behind Motion Wealth Group".to_string(),
            content: concat!(
                "<h2>Welcome to Motion Wealth Group</h2>",
                "<p>This is where you can share your personal story, background, and what drives your passion for helping others succeed in trading and investing.</p>",
                "<h3>Our Mission</h3>",
                "<p>Add your personal mission statement and what makes your approach unique.</p>",
                "<h3>Our Journey</h3>",
                "<p>Share your journey, experiences, and what led you to create Motion Wealth Group.</p>",
                "<h3>Why We're Different</h3>",
                "<p>Explain what sets you apart from other trading educators and financial advisors.</p>",
            )
            .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResourceHighlight {
    pub title: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesPageContent {
    pub hero: Hero,
    pub resources: Vec<ResourceHighlight>,
}

impl Default for ResourcesPageContent {
    fn default() -> Self {
        let highlight = |title: &str, description: &str, icon: &str| ResourceHighlight {
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        };
        Self {
            hero: Hero {
                title: "Trading Resources".to_string(),
                subtitle: "Educational tools and resources to help you succeed in your trading journey.".to_string(),
                button_text: None,
            },
            resources: vec![
                highlight(
                    "Beginner's Guide to Trading",
                    "Learn the basics of trading, including terminology, strategies, and risk management.",
                    "book",
                ),
                highlight(
                    "Advanced Technical Analysis",
                    "Deep dive into technical indicators, chart patterns, and analysis techniques.",
                    "chart-line",
                ),
                highlight(
                    "Risk Management Tools",
                    "Tools and strategies to protect your capital and maximize returns.",
                    "shield",
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContactDetails {
    pub email: String,
    pub phone: String,
    pub address: String,
    pub hours: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPageContent {
    pub hero: Hero,
    pub contact_info: ContactDetails,
    pub form_title: String,
}

impl Default for ContactPageContent {
    fn default() -> Self {
        Self {
            hero: Hero {
                title: "Get in Touch".to_string(),
                subtitle: "Have questions or need personalized advice? Reach out to our team."
                    .to_string(),
                button_text: None,
            },
            contact_info: ContactDetails {
                email: "contact@motionwealthgroup.com".to_string(),
                phone: "(555) 123-4567".to_string(),
                address: "123 Trading St, Market City, MC 12345".to_string(),
                hours: "Monday-Friday: 9am-5pm EST".to_string(),
            },
            form_title: "Send us a message".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageContent {
    Home(HomeContent),
    About(AboutContent),
    Resources(ResourcesPageContent),
    Contact(ContactPageContent),
    Custom(Map<String, Value>),
}

/// Peel legacy encodings: JSON-in-a-string and the `sections` wrapper.
fn unwrap_legacy(raw: Value) -> Result<Value, String> {
    let value = match raw {
        Value::String(s) => {
            serde_json::from_str(&s).map_err(|e| format!("content is not valid JSON: {e}"))?
        }
        other => other,
    };

    match value {
        Value::Object(mut map) if matches!(map.get("sections"), Some(Value::Object(_))) => {
            Ok(map.remove("sections").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

impl PageContent {
    pub fn default_for(page: &str) -> Option<Self> {
        match page {
            HOME => Some(PageContent::Home(HomeContent::default())),
            ABOUT => Some(PageContent::About(AboutContent::default())),
            RESOURCES => Some(PageContent::Resources(ResourcesPageContent::default())),
            CONTACT => Some(PageContent::Contact(ContactPageContent::default())),
            _ => None,
        }
    }

    /// Read stored or submitted content for `page`. Missing fields of known
    /// pages take their default values.
    pub fn parse(page: &str, raw: Value) -> Result<Self, ContentError> {
        let invalid = |reason: String| ContentError::InvalidPage {
            page: page.to_string(),
            reason,
        };
        let value = unwrap_legacy(raw).map_err(invalid)?;
        if !value.is_object() {
            return Err(invalid("content must be a JSON object".to_string()));
        }

        let parsed = match page {
            HOME => serde_json::from_value(value).map(PageContent::Home),
            ABOUT => serde_json::from_value(value).map(PageContent::About),
            RESOURCES => serde_json::from_value(value).map(PageContent::Resources),
            CONTACT => serde_json::from_value(value).map(PageContent::Contact),
            _ => serde_json::from_value(value).map(PageContent::Custom),
        };
        parsed.map_err(|e| invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        match self {
            PageContent::Home(home) => require(&[
                ("hero.title", home.hero.title.as_str()),
                ("about.title", home.about.title.as_str()),
                ("cta.title", home.cta.title.as_str()),
            ]),
            PageContent::About(about) => {
                require(&[("title", about.title.as_str()), ("content", about.content.as_str())])
            }
            PageContent::Resources(page) => {
                require(&[("hero.title", page.hero.title.as_str())])?;
                if page.resources.iter().any(|r| r.title.trim().is_empty()) {
                    return Err(ContentError::MissingFields(vec!["resources.title"]));
                }
                Ok(())
            }
            PageContent::Contact(page) => {
                require(&[("hero.title", page.hero.title.as_str())])?;
                let email = page.contact_info.email.trim();
                if !email.is_empty() && !is_valid_email(email) {
                    return Err(ContentError::invalid("contactInfo.email", "not an e-mail address"));
                }
                let phone = page.contact_info.phone.trim();
                if !phone.is_empty() && !is_valid_phone(phone) {
                    return Err(ContentError::invalid("contactInfo.phone", "not a phone number"));
                }
                Ok(())
            }
            PageContent::Custom(_) => Ok(()),
        }
    }

    fn sanitized(self) -> Self {
        match self {
            PageContent::About(mut about) => {
                about.content = sanitize_html(&about.content);
                PageContent::About(about)
            }
            other => other,
        }
    }

    /// Parse, validate and sanitize content submitted by an editor.
    pub fn from_submission(page: &str, raw: Value) -> Result<Self, ContentError> {
        if !is_valid_page_name(page) {
            return Err(ContentError::invalid(
                "pageName",
                "use lowercase letters, digits and dashes",
            ));
        }
        let content = Self::parse(page, raw)?;
        content.validate()?;
        Ok(content.sanitized())
    }

    /// Document title, for metadata.
    pub fn title(&self) -> Option<&str> {
        match self {
            PageContent::Home(home) => Some(&home.hero.title),
            PageContent::About(about) => Some(&about.title),
            PageContent::Resources(page) => Some(&page.hero.title),
            PageContent::Contact(page) => Some(&page.hero.title),
            PageContent::Custom(map) => map.get("title").and_then(Value::as_str),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            PageContent::Home(home) => Some(&home.hero.subtitle),
            PageContent::About(about) => Some(&about.subtitle),
            PageContent::Resources(page) => Some(&page.hero.subtitle),
            PageContent::Contact(page) => Some(&page.hero.subtitle),
            PageContent::Custom(map) => map.get("description").and_then(Value::as_str),
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument {
    pub id: String,
    pub page_name: String,
    pub content: PageContent,
}

/// Admin view of a stored page document, including unreadable ones.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEntry {
    pub id: String,
    pub page_name: Option<String>,
    pub content: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

fn page_name_of(doc: &Document) -> Option<&str> {
    doc.get_str("pageName")
}

fn raw_content(doc: &Document) -> Value {
    doc.data
        .get("content")
        .or_else(|| doc.data.get("sections"))
        .cloned()
        .unwrap_or(Value::Null)
}

impl PageDocument {
    pub fn from_document(doc: &Document) -> Result<Self, ContentError> {
        let page_name = page_name_of(doc).ok_or_else(|| ContentError::InvalidPage {
            page: doc.id.clone(),
            reason: "missing pageName".to_string(),
        })?;
        Ok(Self {
            id: doc.id.clone(),
            page_name: page_name.to_string(),
            content: PageContent::parse(page_name, raw_content(doc))?,
        })
    }
}

fn page_fields(page: &str, content: &PageContent) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("pageName".to_string(), json!(page));
    fields.insert("content".to_string(), json!(content));
    fields
}

/// First readable document for `page`. Unreadable documents are skipped with a warning.
pub async fn find_page(
    store: &dyn DocumentStore,
    page: &str,
) -> Result<Option<PageDocument>, StoreError> {
    let docs = store.list(PAGE_CONTENT).await?;
    for doc in docs.iter().filter(|d| page_name_of(d) == Some(page)) {
        match PageDocument::from_document(doc) {
            Ok(found) => return Ok(Some(found)),
            Err(e) => tracing::warn!(id = %doc.id, page = %page, error = %e, "skipping unreadable page document"),
        }
    }
    Ok(None)
}

/// Content for a public page. `None` only for unknown pages with nothing stored.
pub async fn load_page(store: &dyn DocumentStore, page: &str) -> Option<Sourced<PageContent>> {
    match PageContent::default_for(page) {
        Some(default) => Some(
            fetch_with_fallback(
                page,
                async { Ok::<_, StoreError>(find_page(store, page).await?.map(|d| d.content)) },
                || default,
            )
            .await,
        ),
        None => match find_page(store, page).await {
            Ok(Some(doc)) => Some(Sourced {
                value: doc.content,
                source: ContentSource::Store,
            }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(page = %page, error = %e, "page read failed");
                None
            }
        },
    }
}

/// Replace the content of `page`, creating its document if needed.
/// The flag is `true` when a new document was created.
pub async fn upsert_page(
    store: &dyn DocumentStore,
    page: &str,
    content: PageContent,
) -> Result<(PageDocument, bool), StoreError> {
    let docs = store.list(PAGE_CONTENT).await?;
    let fields = page_fields(page, &content);

    let (doc, created) = match docs.iter().find(|d| page_name_of(d) == Some(page)) {
        Some(existing) => (store.put(PAGE_CONTENT, &existing.id, fields).await?, false),
        None => (store.create(PAGE_CONTENT, fields).await?, true),
    };

    Ok((
        PageDocument {
            id: doc.id,
            page_name: page.to_string(),
            content,
        },
        created,
    ))
}

/// Create default documents for seeded pages that have none; returns the pages created.
pub async fn seed_missing_pages(store: &dyn DocumentStore) -> Result<Vec<&'static str>, StoreError> {
    let docs = store.list(PAGE_CONTENT).await?;
    let existing: HashSet<&str> = docs.iter().filter_map(page_name_of).collect();

    let mut created = Vec::new();
    for page in SEEDED_PAGES {
        if existing.contains(page) {
            continue;
        }
        if let Some(default) = PageContent::default_for(page) {
            store.create(PAGE_CONTENT, page_fields(page, &default)).await?;
            created.push(page);
        }
    }

    if !created.is_empty() {
        tracing::info!(pages = ?created, "seeded default page content");
    }
    Ok(created)
}

pub async fn list_pages(store: &dyn DocumentStore) -> Result<Vec<PageEntry>, StoreError> {
    let docs = store.list(PAGE_CONTENT).await?;
    Ok(docs
        .iter()
        .map(|doc| match PageDocument::from_document(doc) {
            Ok(page) => PageEntry {
                id: page.id,
                page_name: Some(page.page_name),
                content: json!(page.content),
                problem: None,
            },
            Err(e) => PageEntry {
                id: doc.id.clone(),
                page_name: page_name_of(doc).map(str::to_string),
                content: raw_content(doc),
                problem: Some(e.to_string()),
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_absent_about_page_serves_default() {
        let store = MemoryStore::new();
        let sourced = load_page(&store, ABOUT).await.unwrap();

        assert!(sourced.is_fallback());
        assert_eq!(sourced.value, PageContent::About(AboutContent::default()));
        assert_eq!(sourced.value.title(), Some("Our Story"));
    }

    #[tokio::test]
    async fn test_string_encoded_content_is_read() {
        let store = MemoryStore::new();
        let encoded = json!({ "sections": { "hero": { "title": "Welcome" } } }).to_string();
        store
            .create(PAGE_CONTENT, fields(json!({ "pageName": "home", "content": encoded })))
            .await
            .unwrap();

        let sourced = load_page(&store, HOME).await.unwrap();
        assert!(!sourced.is_fallback());
        match sourced.value {
            PageContent::Home(home) => {
                assert_eq!(home.hero.title, "Welcome");
                // Unspecified fields keep their defaults.
                assert_eq!(home.cta, HomeContent::default().cta);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_top_level_sections_document_is_read() {
        let store = MemoryStore::new();
        store
            .create(
                PAGE_CONTENT,
                fields(json!({
                    "pageName": "contact",
                    "sections": { "hero": { "title": "Talk to us", "subtitle": "" }, "formTitle": "Write" }
                })),
            )
            .await
            .unwrap();

        let page = find_page(&store, CONTACT).await.unwrap().unwrap();
        assert_eq!(page.content.title(), Some("Talk to us"));
    }

    #[tokio::test]
    async fn test_unknown_page_without_document_is_none() {
        let store = MemoryStore::new();
        assert!(load_page(&store, "careers").await.is_none());
    }

    #[test]
    fn test_submission_rejects_blank_required_fields() {
        let err = PageContent::from_submission(ABOUT, json!({ "title": " ", "content": "<p>x</p>" }))
            .unwrap_err();
        assert!(matches!(err, ContentError::MissingFields(f) if f == vec!["title"]));
    }

    #[test]
    fn test_submission_rejects_non_object_and_bad_json() {
        assert!(PageContent::from_submission(HOME, json!([1, 2])).is_err());
        assert!(PageContent::from_submission(HOME, json!("{not json")).is_err());
        assert!(PageContent::from_submission("Bad Name", json!({})).is_err());
    }

    #[test]
    fn test_submission_sanitizes_about_html() {
        let content = PageContent::from_submission(
            ABOUT,
            json!({ "title": "Our Story", "content": "<p>Hi</p><script>x()</script>" }),
        )
        .unwrap();
        match content {
            PageContent::About(about) => assert_eq!(about.content, "<p>Hi</p>"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_contact_page_email_must_be_valid() {
        let result = PageContent::from_submission(
            CONTACT,
            json!({ "hero": { "title": "Hi" }, "contactInfo": { "email": "nope" } }),
        );
        assert!(matches!(result, Err(ContentError::Invalid { field: "contactInfo.email", .. })));
    }

    #[test]
    fn test_contact_page_phone_must_be_valid() {
        let result = PageContent::from_submission(
            CONTACT,
            json!({ "hero": { "title": "Hi" }, "contactInfo": { "phone": "call me" } }),
        );
        assert!(matches!(result, Err(ContentError::Invalid { field: "contactInfo.phone", .. })));

        let ok = PageContent::from_submission(
            CONTACT,
            json!({ "hero": { "title": "Hi" }, "contactInfo": { "phone": "+44 20 7946 0958" } }),
        );
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_seed_then_upsert_keeps_one_document_per_page() {
        let store = MemoryStore::new();
        let created = seed_missing_pages(&store).await.unwrap();
        assert_eq!(created, SEEDED_PAGES.to_vec());
        assert!(seed_missing_pages(&store).await.unwrap().is_empty());

        let content = PageContent::from_submission(
            ABOUT,
            json!({ "title": "Who we are", "content": "<p>Us</p>" }),
        )
        .unwrap();
        let (_, created) = upsert_page(&store, ABOUT, content).await.unwrap();
        assert!(!created);

        let pages = list_pages(&store).await.unwrap();
        assert_eq!(pages.len(), 4);
        let about = find_page(&store, ABOUT).await.unwrap().unwrap();
        assert_eq!(about.content.title(), Some("Who we are"));
    }

    #[tokio::test]
    async fn test_custom_page_round_trip() {
        let store = MemoryStore::new();
        let content = PageContent::from_submission("careers", json!({ "title": "Join us" })).unwrap();
        let (_, created) = upsert_page(&store, "careers", content).await.unwrap();
        assert!(created);

        let sourced = load_page(&store, "careers").await.unwrap();
        assert_eq!(sourced.value.title(), Some("Join us"));
    }
}
