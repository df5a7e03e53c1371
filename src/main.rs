use clap::Parser;
use epaper_image_sender::app;
use epaper_image_sender::domain::settings::SettingsService;
use epaper_image_sender::infrastructure::logging::init_logger;
use epaper_image_sender::presentation::cli::Args;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => SettingsService::open(path.clone()),
        None => SettingsService::new()?,
    };
    args.apply_to(settings.get_mut());

    let _log_guard = init_logger(&settings.get().log_settings)?;
    settings.report_load();

    if args.save_config {
        settings.save()?;
        info!("Saved settings to {}", settings.path().display());
    }

    match app::run(&args, settings.get()).await {
        Ok(report) => {
            info!(
                "Image sent successfully ({} chunks, {} bytes)",
                report.chunks_sent, report.bytes_sent
            );
            Ok(())
        }
        Err(e) => {
            error!("Image send failed: {:#}", e);
            Err(e)
        }
    }
}
