//! Motion Wealth Group backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = mwg_backend::run().await {
        tracing::error!(error = %e, "server stopped");
        eprintln!("mwg-backend: {}", e);
        std::process::exit(1);
    }
}
