use anyhow::{Context, Result};
use dotenv::dotenv;
use photo_party_rust::domain::codec::estimate_size_kb;
use photo_party_rust::domain::feed::FeedService;
use photo_party_rust::domain::models::{CompressionOptions, DeviceProfile};
use photo_party_rust::domain::photos::PhotoService;
use photo_party_rust::outbound::camera::SpoolCamera;
use photo_party_rust::outbound::compressor::JpegCompressor;
use photo_party_rust::outbound::exporter::DiskExporter;
use photo_party_rust::outbound::postgres::PostgresPhotoStore;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info};

// How often the spool directory is checked for freshly captured frames.
const CAPTURE_POLL: Duration = Duration::from_secs(1);

/// Main entry point.
#[tokio::main]
async fn main() -> Result<()> {
    // Set up tracing for logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(true)
        .with_target(false)
        .without_time()
        .init();

    dotenv().ok();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let spool_dir = env::var("PHOTO_SPOOL_DIR").unwrap_or_else(|_| "spool".to_string());
    let export_dir = env::var("PHOTO_EXPORT_DIR").unwrap_or_else(|_| "exports".to_string());
    let refresh_secs: u64 = env::var("PHOTO_REFRESH_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);
    let profile = match env::var("PHOTO_DEVICE_PROFILE").as_deref() {
        Ok("mobile") => DeviceProfile::Mobile,
        _ => DeviceProfile::Desktop,
    };

    let store = Arc::new(PostgresPhotoStore::connect(&database_url).await?);
    let photos = PhotoService::new(
        store,
        Arc::new(JpegCompressor::new()),
        CompressionOptions::for_profile(profile),
    );
    let feed = Arc::new(FeedService::new(
        photos,
        Arc::new(SpoolCamera::new(&spool_dir)),
        Arc::new(DiskExporter::new(&export_dir)),
    ));

    feed.load().await;
    info!("Feed loaded with {} photos", feed.photos().len());

    let refresh = feed.spawn_refresh(Duration::from_secs(refresh_secs));

    // Drain the spool directory until Ctrl-C.
    let mut ticker = time::interval(CAPTURE_POLL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match feed.capture_and_save(None).await {
                    Ok(Some(photo)) => info!(
                        "Saved photo {} (~{} KB)",
                        photo.id,
                        estimate_size_kb(&photo.image_url)
                    ),
                    Ok(None) => {}
                    Err(e) => error!("Error saving captured photo: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    refresh.stop().await;
    info!("Feed shut down");

    Ok(())
}
