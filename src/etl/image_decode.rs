use std::path::Path;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument, warn};

static DATA_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/(png|jpeg|jpg|gif|webp);base64,(.+)$").expect("valid data url regex")
});

/// A decoded data URL: file extension and raw bytes
#[derive(Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

pub fn decode_data_url(line: &str) -> Option<DecodedImage> {
    let caps = DATA_URL.captures(line.trim())?;
    let extension = match caps.get(1)?.as_str() {
        "png" => "png",
        "jpeg" | "jpg" => "jpg",
        "gif" => "gif",
        _ => "webp",
    };
    let bytes = STANDARD.decode(caps.get(2)?.as_str().trim()).ok()?;
    Some(DecodedImage { extension, bytes })
}

/// Writes every `data:image/...` line of `input` to `output_dir` as
/// `part-NNNN.ext`, numbered by position among the data lines.
#[instrument]
pub fn decode_images(input: &Path, output_dir: &Path) -> anyhow::Result<usize> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read image list {}", input.display()))?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let lines: Vec<&str> = content
        .lines()
        .filter(|l| l.trim().starts_with("data:image"))
        .collect();
    info!("Found {} base64 image data URLs", lines.len());

    let mut saved = 0;
    for (i, line) in lines.iter().enumerate() {
        let Some(image) = decode_data_url(line) else {
            warn!(line = i + 1, "Could not parse data URL");
            continue;
        };
        let file = output_dir.join(format!("part-{:04}.{}", i + 1, image.extension));
        std::fs::write(&file, &image.bytes)
            .with_context(|| format!("failed to write {}", file.display()))?;
        saved += 1;
        if saved % 100 == 0 {
            info!("Saved {} images...", saved);
        }
    }

    info!("Saved {} images to {}", saved, output_dir.display());
    Ok(saved)
}
