//! Search-engine output: schema.org JSON-LD, sitemap and robots.txt.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::content::blog::StoredPost;

const SCHEMA_CONTEXT: &str = "https://schema.org";

/// Identity of the public site, from configuration.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub logo: Option<String>,
}

impl SiteInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into().trim_end_matches('/').to_string(),
            description: None,
            logo: None,
        }
    }

    pub fn page_url(&self, path: &str) -> String {
        if path.is_empty() || path == "/" {
            self.url.clone()
        } else {
            format!("{}/{}", self.url, path.trim_start_matches('/'))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrganizationDetails {
    pub same_as: Vec<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
}

pub fn website_schema(site: &SiteInfo) -> Value {
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "WebSite",
        "name": site.name,
        "url": site.url,
        "description": site.description,
        "potentialAction": {
            "@type": "SearchAction",
            "target": format!("{}/search?q={{search_term_string}}", site.url),
            "query-input": "required name=search_term_string"
        }
    })
}

pub fn organization_schema(site: &SiteInfo, details: &OrganizationDetails) -> Value {
    let mut schema = Map::new();
    schema.insert("@context".into(), json!(SCHEMA_CONTEXT));
    schema.insert("@type".into(), json!("Organization"));
    schema.insert("name".into(), json!(site.name));
    schema.insert("url".into(), json!(site.url));
    schema.insert("logo".into(), json!(site.logo));
    schema.insert("description".into(), json!(site.description));

    if !details.same_as.is_empty() {
        schema.insert("sameAs".into(), json!(details.same_as));
    }
    if let Some(email) = &details.email {
        schema.insert("email".into(), json!(email));
    }
    if let Some(phone) = &details.telephone {
        schema.insert("telephone".into(), json!(phone));
    }
    Value::Object(schema)
}

pub fn blog_post_schema(site: &SiteInfo, post: &StoredPost) -> Value {
    let published = post
        .post
        .published_at()
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| post.post.date.clone());

    let mut schema = json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BlogPosting",
        "headline": post.post.title,
        "description": post.post.desc,
        "url": site.page_url(&format!("blog/{}", post.id)),
        "datePublished": published,
        "dateModified": published,
        "author": { "@type": "Person", "name": post.post.author_name() },
        "publisher": {
            "@type": "Organization",
            "name": site.name,
            "logo": { "@type": "ImageObject", "url": site.logo.clone().unwrap_or_default() }
        }
    });

    if let Some(obj) = schema.as_object_mut() {
        if let Some(img) = post.post.img.as_deref().filter(|i| !i.starts_with("data:")) {
            obj.insert("image".into(), json!({ "@type": "ImageObject", "url": img }));
        }
        if !post.post.category.is_empty() {
            obj.insert("articleSection".into(), json!(post.post.category));
        }
    }
    schema
}

pub struct Crumb<'a> {
    pub name: &'a str,
    pub url: String,
}

pub fn breadcrumb_schema(items: &[Crumb<'_>]) -> Value {
    let elements: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": item.name,
                "item": item.url
            })
        })
        .collect();

    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BreadcrumbList",
        "itemListElement": elements
    })
}

pub fn faq_schema(questions: &[(&str, &str)]) -> Value {
    let entities: Vec<Value> = questions
        .iter()
        .map(|(question, answer)| {
            json!({
                "@type": "Question",
                "name": question,
                "acceptedAnswer": { "@type": "Answer", "text": answer }
            })
        })
        .collect();

    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "FAQPage",
        "mainEntity": entities
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFrequency {
    fn as_str(self) -> &'static str {
        match self {
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: DateTime<Utc>,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
}

const STATIC_ROUTES: [(&str, ChangeFrequency, f32); 7] = [
    ("", ChangeFrequency::Weekly, 1.0),
    ("about", ChangeFrequency::Monthly, 0.8),
    ("contact", ChangeFrequency::Monthly, 0.8),
    ("resources", ChangeFrequency::Weekly, 0.9),
    ("blog", ChangeFrequency::Daily, 0.9),
    ("privacy-policy", ChangeFrequency::Yearly, 0.5),
    ("terms-of-service", ChangeFrequency::Yearly, 0.5),
];

/// Static pages followed by one entry per blog post.
pub fn sitemap_entries(site: &SiteInfo, posts: &[StoredPost], now: DateTime<Utc>) -> Vec<SitemapEntry> {
    let mut entries: Vec<SitemapEntry> = STATIC_ROUTES
        .iter()
        .map(|(path, freq, priority)| SitemapEntry {
            url: site.page_url(path),
            last_modified: now,
            change_frequency: *freq,
            priority: *priority,
        })
        .collect();

    entries.extend(posts.iter().map(|post| SitemapEntry {
        url: site.page_url(&format!("blog/{}", post.id)),
        last_modified: post.post.published_at().unwrap_or(now),
        change_frequency: ChangeFrequency::Monthly,
        priority: 0.7,
    }));
    entries
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn sitemap_xml(entries: &[SitemapEntry]) -> String {
    let mut urls = String::new();
    for entry in entries {
        urls.push_str(&format!(
            "  <url>\n\
                 <loc>{}</loc>\n\
                 <lastmod>{}</lastmod>\n\
                 <changefreq>{}</changefreq>\n\
                 <priority>{:.1}</priority>\n\
               </url>\n",
            escape_xml(&entry.url),
            entry.last_modified.format("%Y-%m-%d"),
            entry.change_frequency.as_str(),
            entry.priority,
        ));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>\n",
        urls
    )
}

pub fn robots_txt(site: &SiteInfo) -> String {
    let disallow = ["/admin/", "/api/", "/*.json", "/*.js", "/*.css"];
    let mut out = String::from("User-agent: *\nAllow: /\n");
    for path in disallow {
        out.push_str(&format!("Disallow: {}\n", path));
    }
    out.push_str(&format!("\nSitemap: {}\n", site.page_url("sitemap.xml")));
    out
}
