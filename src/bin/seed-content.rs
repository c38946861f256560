//! One-off content maintenance against the configured database.
//!
//! ```text
//! seed-content blog
//! seed-content resources
//! seed-content pages
//! seed-content footer-logo <image-url> <link-url>
//! seed-content check-footer-logo
//! ```

use std::process::ExitCode;

use mwg_backend::content::{blog, pages, resources, settings};
use mwg_backend::db::{self, DbConfig};
use mwg_backend::media::ImageInput;
use mwg_backend::store::PgStore;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: seed-content <blog | resources | pages | footer-logo <image-url> <link-url> | check-footer-logo>";

async fn execute(store: &PgStore, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    match args {
        [cmd] if cmd == "blog" => {
            let count = blog::seed_sample_posts(store).await?;
            println!("Added {} sample blog posts.", count);
        }
        [cmd] if cmd == "resources" => {
            let count = resources::seed_resources(store).await?;
            if count == 0 {
                println!("Resources already exist, nothing to add.");
            } else {
                println!("Added {} resources.", count);
            }
        }
        [cmd] if cmd == "pages" => {
            let created = pages::seed_missing_pages(store).await?;
            if created.is_empty() {
                println!("All default pages already exist.");
            } else {
                println!("Created default content for: {}", created.join(", "));
            }
        }
        [cmd, image_url, link_url] if cmd == "footer-logo" => {
            let outcome = settings::save_footer_logo(
                store,
                None,
                link_url,
                ImageInput::Keep(Some(image_url.clone())),
            )
            .await?;
            println!("{}", outcome.message);
            println!("  imageUrl: {}", outcome.record.image_url.as_deref().unwrap_or("-"));
            println!("  linkUrl:  {}", outcome.record.link_url);
        }
        [cmd] if cmd == "check-footer-logo" => match settings::find_footer_logo(store).await? {
            Some(logo) => {
                println!("Footer logo is set.");
                println!("  imageUrl: {}", logo.image_url.as_deref().unwrap_or("-"));
                println!("  linkUrl:  {}", logo.link_url);
            }
            None => println!("No footer logo has been saved yet."),
        },
        _ => return Err(USAGE.into()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("seed_content=info,mwg_backend=info,sqlx=warn")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    }

    let Some(config) = DbConfig::from_env() else {
        eprintln!("DATABASE_URL must be set; seeding the in-memory store would be lost on exit.");
        return ExitCode::FAILURE;
    };

    let pool = match db::init_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "could not connect to the database");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = db::run_migrations(&pool).await {
        tracing::error!(error = %e, "migrations failed");
        return ExitCode::FAILURE;
    }

    let store = PgStore::new(pool);
    match execute(&store, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("seed-content: {}", e);
            ExitCode::FAILURE
        }
    }
}
