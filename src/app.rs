//! Application Flow
//!
//! One linear pass: encode, frame, find the device, connect, send.
//! Nothing touches the radio until the image has been encoded.

use crate::domain::encoder;
use crate::domain::error::DeviceNotFoundError;
use crate::domain::framer::{ChunkLimits, Frame, HEADER_LEN};
use crate::domain::models::TransferReport;
use crate::domain::settings::Settings;
use crate::infrastructure::bluetooth::{protocol, BluetoothService};
use crate::infrastructure::link::{send_chunks, DryRunLink, FileLink, Pacing};
use crate::presentation::cli::Args;
use anyhow::{Context, Result};
use tracing::info;

pub async fn run(args: &Args, settings: &Settings) -> Result<TransferReport> {
    info!("Converting image: {}", args.image_path.display());
    let options = args.encode_options(settings);
    let image = encoder::encode_with(&args.image_path, &options)
        .with_context(|| format!("Failed to convert {}", args.image_path.display()))?;

    if let Some(preview) = &args.preview {
        encoder::unpack(&image.data, image.width, image.height)
            .save(preview)
            .with_context(|| format!("Failed to save preview {}", preview.display()))?;
        info!("Saved preview to {}", preview.display());
    }

    let limits = ChunkLimits::new(settings.first_chunk_body_size, settings.chunk_size)?;
    let frame = Frame::new(&image, limits);
    info!(
        "Payload: {} bytes in {} chunks (first {} + {}, then up to {})",
        frame.payload().len(),
        frame.chunks().len(),
        HEADER_LEN,
        frame.limits().first_chunk_body_size(),
        frame.limits().chunk_size()
    );

    if let Some(output) = &args.output {
        let mut link = FileLink::create(output)?;
        send_chunks(&mut link, frame.chunks(), Pacing::none()).await?;
        info!("Wrote payload to {}", link.path().display());
    }

    if args.dry_run {
        info!("Dry run, not sending");
        let mut link = DryRunLink::default();
        return Ok(send_chunks(&mut link, frame.chunks(), Pacing::none()).await?);
    }

    let service = BluetoothService::from_settings(settings);
    let address = resolve_address(args, settings, &service).await?;

    let mut link = service.connect(address).await?;
    let pacing = Pacing::from_millis(settings.first_chunk_delay_ms, settings.chunk_delay_ms);
    let report = send_chunks(&mut link, frame.chunks(), pacing).await?;

    Ok(report)
}

/// Use the explicit address if given, otherwise scan by name
async fn resolve_address(
    args: &Args,
    settings: &Settings,
    service: &BluetoothService,
) -> Result<u64> {
    if let Some(address) = &args.address {
        return Ok(protocol::parse_address(address)?);
    }

    match service.find_device(&settings.device_name).await? {
        Some(device) => {
            info!(
                "Found device: {} ({})",
                device.name,
                protocol::format_address(device.address)
            );
            Ok(device.address)
        }
        None => Err(DeviceNotFoundError {
            name: settings.device_name.clone(),
            scan_ms: settings.scan_timeout_ms,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{DecodeError, TransportError};
    use clap::Parser;
    use image::{GrayImage, Luma};

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["epaper-image-sender"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn test_dry_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("payload.bin");
        let preview = dir.path().join("preview.png");
        GrayImage::from_raw(4, 2, vec![16, 32, 48, 64, 0, 255, 128, 200])
            .unwrap()
            .save(&input)
            .unwrap();

        let args = args(&[
            input.to_str().unwrap(),
            "--width",
            "4",
            "--height",
            "2",
            "--dry-run",
            "--output",
            output.to_str().unwrap(),
            "--preview",
            preview.to_str().unwrap(),
        ]);
        let mut settings = Settings::default();
        args.apply_to(&mut settings);

        let report = run(&args, &settings).await.unwrap();
        assert_eq!(report.chunks_sent, 1);
        assert_eq!(report.bytes_sent, 12);
        assert_eq!(
            std::fs::read(&output).unwrap(),
            vec![0x04, 0, 0, 0, 0x02, 0, 0, 0, 0x12, 0x34, 0x0F, 0x8C]
        );
        let preview = image::open(&preview).unwrap().to_luma8();
        assert_eq!(preview.get_pixel(1, 1), &Luma([255]));
    }

    #[tokio::test]
    async fn test_decode_error_aborts_before_transport() {
        let args = args(&["/nonexistent/image.png", "--address", "not-an-address"]);
        let err = run(&args, &Settings::default()).await.unwrap_err();
        assert!(err.downcast_ref::<DecodeError>().is_some());
    }

    #[tokio::test]
    async fn test_invalid_address_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        GrayImage::from_pixel(8, 8, Luma([90])).save(&input).unwrap();

        let args = args(&[input.to_str().unwrap(), "--address", "zz:zz"]);
        let err = run(&args, &Settings::default()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TransportError>(),
            Some(TransportError::InvalidAddress(_))
        ));
    }
}
