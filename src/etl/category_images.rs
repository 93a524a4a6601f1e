use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ValueEnum;
use tracing::{info, instrument, warn};

use super::{category_slug, images_by_category, read_classifications, PART_CATEGORIES};

/// How the representative image of a category is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// Biggest classified file on disk
    #[default]
    Largest,
    /// Hand-picked files
    Fixed,
}

const FIXED_IMAGES: [(&str, &str); 14] = [
    ("Hydraulic System", "part-0010.png"),
    ("Engine Components", "part-0185.png"),
    ("Bearings", "part-0310.png"),
    ("Undercarriage", "part-0430.png"),
    ("Filters", "part-0500.png"),
    ("Electrical", "part-0570.png"),
    ("Ground Engaging Tools", "part-0640.png"),
    ("Belts & Hoses", "part-0700.png"),
    ("Braking & Friction", "part-0760.png"),
    ("Hardware", "part-0830.png"),
    ("Cooling System", "part-0875.png"),
    ("Turbochargers", "part-0920.png"),
    ("Air Inlet & Exhaust", "part-0955.png"),
    ("Gaskets & Seals", "part-0975.png"),
];

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Source file per category; categories without a candidate are left out
pub fn pick_images(
    strategy: Strategy,
    classifications: Option<&Path>,
    images_dir: &Path,
) -> anyhow::Result<Vec<(&'static str, String)>> {
    match strategy {
        Strategy::Fixed => Ok(FIXED_IMAGES
            .iter()
            .map(|(category, file)| (*category, file.to_string()))
            .collect()),
        Strategy::Largest => {
            let path = classifications
                .context("the largest strategy needs a classifications file")?;
            let items = read_classifications(path)?;
            let groups = images_by_category(&items);
            let mut picks = Vec::new();
            for category in PART_CATEGORIES {
                let Some(candidates) = groups.get(category).filter(|c| !c.is_empty()) else {
                    info!("No images for {}, skipping", category);
                    continue;
                };
                let mut best = candidates[0];
                let mut best_size = 0;
                for &candidate in candidates.iter() {
                    let size = file_size(&images_dir.join(&candidate.file));
                    if size > best_size {
                        best_size = size;
                        best = candidate;
                    }
                }
                picks.push((category, best.file.clone()));
            }
            Ok(picks)
        }
    }
}

/// Copies one image per category to `<output_dir>/<slug>.png`
#[instrument]
pub fn update_category_images(
    strategy: Strategy,
    classifications: Option<&Path>,
    images_dir: &Path,
    output_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut written = Vec::new();
    for (category, file) in pick_images(strategy, classifications, images_dir)? {
        let Some(slug) = category_slug(category) else {
            continue;
        };
        let src = images_dir.join(&file);
        if !src.exists() {
            warn!("{} not found", src.display());
            continue;
        }
        let dst = output_dir.join(format!("{}.png", slug));
        std::fs::copy(&src, &dst)
            .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
        info!(
            "{}: {} -> {} ({}KB)",
            category,
            file,
            dst.display(),
            file_size(&src) / 1024
        );
        written.push(dst);
    }
    info!("Updated {} category images", written.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::{write_classifications, ImageClassification};

    fn classified(file: &str, category: &str) -> ImageClassification {
        ImageClassification {
            file: file.into(),
            category: category.into(),
            part_type: "part".into(),
            keywords: None,
            error: None,
        }
    }

    #[test]
    fn largest_strategy_copies_biggest_file() {
        let dir = tempfile::tempdir().unwrap();
        let items = dir.path().join("items");
        let out = dir.path().join("parts");
        std::fs::create_dir_all(&items).unwrap();
        std::fs::write(items.join("part-0001.png"), vec![0u8; 10]).unwrap();
        std::fs::write(items.join("part-0002.png"), vec![1u8; 40]).unwrap();
        let cls = dir.path().join("classifications.json");
        write_classifications(
            &cls,
            &[classified("part-0001.png", "Filters"), classified("part-0002.png", "Filters")],
        )
        .unwrap();

        let written =
            update_category_images(Strategy::Largest, Some(cls.as_path()), &items, &out).unwrap();

        assert_eq!(written, vec![out.join("filters.png")]);
        assert_eq!(std::fs::read(out.join("filters.png")).unwrap(), vec![1u8; 40]);
    }

    #[test]
    fn fixed_strategy_skips_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let items = dir.path().join("items");
        let out = dir.path().join("parts");
        std::fs::create_dir_all(&items).unwrap();
        std::fs::write(items.join("part-0640.png"), b"get").unwrap();

        let written = update_category_images(Strategy::Fixed, None, &items, &out).unwrap();

        assert_eq!(written, vec![out.join("ground-engaging.png")]);
    }

    #[test]
    fn largest_strategy_requires_classifications() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pick_images(Strategy::Largest, None, dir.path()).is_err());
    }
}
