//! Assigns classified item photos to parts by keyword overlap between the
//! photo's part type and each subcategory's description.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use sea_orm::{EntityTrait, QueryOrder};
use tracing::{info, instrument};

use super::{
    apply_image_assignments, images_by_category, read_classifications, ImageAssignment,
    ImageClassification, GENERIC_PART_IMAGE, ITEM_IMAGE_PREFIX,
};
use crate::db::DbPool;
use crate::models::{part, Part, PartEntity};

const BATCH_SIZE: usize = 500;
const GENERAL_SUBCATEGORY: &str = "GENERAL";

/// Lower-cases and turns punctuation into spaces
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn significant_words(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|w| w.len() > 2)
        .map(str::to_string)
        .collect()
}

/// +3 for every equal word pair, +1 when one word contains the other
pub fn match_score(image_type: &str, keywords: &str, description: &str, subcategory: &str) -> u32 {
    let image_words = significant_words(&format!("{} {}", image_type, keywords));
    let part_words = significant_words(&format!("{} {}", description, subcategory));

    let mut score = 0;
    for iw in &image_words {
        for pw in &part_words {
            if iw == pw {
                score += 3;
            } else if pw.contains(iw.as_str()) || iw.contains(pw.as_str()) {
                score += 1;
            }
        }
    }
    score
}

/// Groups preserving first-seen order
fn group_in_order<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&T) -> String,
) -> Vec<(String, Vec<&'a T>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&T>)> = Vec::new();
    for item in items {
        let k = key(item);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }
    groups
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub matched: usize,
    pub cycled: usize,
    pub fallback: usize,
}

/// Picks an image for every part. `parts` should be ordered by category,
/// subcategory and id.
pub fn plan_assignments(
    parts: &[Part],
    classifications: &[ImageClassification],
) -> (Vec<ImageAssignment>, MatchSummary) {
    let images = images_by_category(classifications);
    let mut assignments = Vec::with_capacity(parts.len());
    let mut summary = MatchSummary::default();

    for (category, category_parts) in group_in_order(parts, |p| p.category.clone()) {
        let Some(category_images) = images.get(category.as_str()).filter(|imgs| !imgs.is_empty())
        else {
            info!("No images for category {}, using fallback", category);
            for part in category_parts {
                assignments.push(ImageAssignment {
                    part_id: part.id,
                    image_url: GENERIC_PART_IMAGE.to_string(),
                });
                summary.fallback += 1;
            }
            continue;
        };

        let by_subcategory = group_in_order(category_parts, |p| {
            p.subcategory
                .clone()
                .unwrap_or_else(|| GENERAL_SUBCATEGORY.to_string())
        });

        for (subcategory, sub_parts) in by_subcategory {
            let description = sub_parts[0].description.as_str();
            let mut scored: Vec<(&ImageClassification, u32)> = category_images
                .iter()
                .map(|img| {
                    let keywords = img.keywords.as_deref().unwrap_or("");
                    (*img, match_score(&img.part_type, keywords, description, &subcategory))
                })
                .collect();
            scored.sort_by(|a, b| b.1.cmp(&a.1));

            let positive: Vec<(&ImageClassification, u32)> =
                scored.into_iter().filter(|(_, score)| *score > 0).collect();
            let pool: Vec<(&ImageClassification, u32)> = if positive.is_empty() {
                category_images.iter().map(|img| (*img, 0)).collect()
            } else {
                positive
            };

            for (i, part) in sub_parts.iter().enumerate() {
                let (img, score) = pool[i % pool.len()];
                assignments.push(ImageAssignment {
                    part_id: part.id,
                    image_url: format!("{}{}", ITEM_IMAGE_PREFIX, img.file),
                });
                if score > 0 {
                    summary.matched += 1;
                } else {
                    summary.cycled += 1;
                }
            }
        }
    }

    (assignments, summary)
}

fn distinct_images_per_category(
    parts: &[Part],
    assignments: &[ImageAssignment],
) -> BTreeMap<String, (usize, usize)> {
    let urls: HashMap<i32, &str> = assignments
        .iter()
        .map(|a| (a.part_id, a.image_url.as_str()))
        .collect();
    let mut sets: BTreeMap<String, (BTreeSet<&str>, usize)> = BTreeMap::new();
    for part in parts {
        let entry = sets.entry(part.category.clone()).or_default();
        if let Some(url) = urls.get(&part.id) {
            entry.0.insert(*url);
        }
        entry.1 += 1;
    }
    sets.into_iter()
        .map(|(category, (urls, total))| (category, (urls.len(), total)))
        .collect()
}

#[instrument(skip(db))]
pub async fn match_images(db: &DbPool, classifications_path: &Path) -> anyhow::Result<MatchSummary> {
    let classifications = read_classifications(classifications_path)?;
    info!("Image classification distribution:");
    for (category, imgs) in images_by_category(&classifications) {
        info!("  {}: {} images", category, imgs.len());
    }

    let parts = PartEntity::find()
        .order_by_asc(part::Column::Category)
        .order_by_asc(part::Column::Subcategory)
        .order_by_asc(part::Column::Id)
        .all(db)
        .await?;
    info!("Total parts: {}", parts.len());

    let (assignments, summary) = plan_assignments(&parts, &classifications);
    info!(
        total = assignments.len(),
        matched = summary.matched,
        cycled = summary.cycled,
        fallback = summary.fallback,
        "Assignment summary"
    );

    apply_image_assignments(db, &assignments, BATCH_SIZE).await?;

    let mut verification: Vec<(String, (usize, usize))> =
        distinct_images_per_category(&parts, &assignments).into_iter().collect();
    verification.sort_by(|a, b| b.1 .1.cmp(&a.1 .1));
    info!("Verification:");
    for (category, (unique, total)) in verification {
        info!("  {}: {} unique images for {} parts", category, unique, total);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::test_support::{insert_part, memory_db};

    fn part(id: i32, category: &str, subcategory: Option<&str>, description: &str) -> Part {
        Part {
            id,
            part_number: format!("P{}", id),
            description: description.into(),
            category: category.into(),
            subcategory: subcategory.map(str::to_string),
            price: None,
            compatibility: None,
            engine_model: None,
            gasket: None,
            equipment: None,
            image_url: None,
        }
    }

    fn image(file: &str, category: &str, part_type: &str) -> ImageClassification {
        ImageClassification {
            file: file.into(),
            category: category.into(),
            part_type: part_type.into(),
            keywords: None,
            error: None,
        }
    }

    #[test]
    fn normalizes_text() {
        assert_eq!(normalize("  Oil-Filter, SPIN/ON!! "), "oil filter spin on");
    }

    #[test]
    fn scores_keyword_overlap() {
        assert_eq!(match_score("oil filter", "", "OIL FILTERS", "OIL FILTERS"), 3 + 1 + 3 + 1);
        assert_eq!(match_score("bucket tooth", "", "OIL FILTERS", ""), 0);
        assert_eq!(match_score("an o", "", "an o", ""), 0);
    }

    #[test]
    fn plans_matched_cycled_and_fallback_assignments() {
        let parts = vec![
            part(1, "Filters", Some("OIL FILTERS"), "OIL FILTERS"),
            part(2, "Filters", Some("OIL FILTERS"), "OIL FILTERS"),
            part(3, "Filters", Some("OIL FILTERS"), "OIL FILTERS"),
            part(4, "Filters", None, "Filters"),
            part(5, "Fluids", None, "Fluids"),
        ];
        let images = vec![
            image("part-0001.png", "Filters", "oil filter"),
            image("part-0002.png", "Filters", "fuel filter"),
            image("part-0003.png", "Filters", "air cleaner housing"),
        ];

        let (assignments, summary) = plan_assignments(&parts, &images);
        let urls: Vec<&str> = assignments.iter().map(|a| a.image_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "/images/parts/items/part-0001.png",
                "/images/parts/items/part-0002.png",
                "/images/parts/items/part-0001.png",
                "/images/parts/items/part-0001.png",
                GENERIC_PART_IMAGE,
            ]
        );
        assert_eq!(summary, MatchSummary { matched: 4, cycled: 0, fallback: 1 });
    }

    #[test]
    fn cycles_all_category_images_without_overlap() {
        let parts = vec![
            part(1, "Hardware", Some("BOLTS"), "BOLTS"),
            part(2, "Hardware", Some("BOLTS"), "BOLTS"),
            part(3, "Hardware", Some("BOLTS"), "BOLTS"),
        ];
        let images = vec![
            image("part-0010.png", "Hardware", "washer"),
            image("part-0011.png", "Hardware", "clamp"),
        ];
        let (assignments, summary) = plan_assignments(&parts, &images);
        assert_eq!(assignments[2].image_url, "/images/parts/items/part-0010.png");
        assert_eq!(summary.cycled, 3);
    }

    #[tokio::test]
    async fn match_images_updates_database() {
        let db = memory_db().await;
        let id = insert_part(&db, "1R0750", "Filters", Some("OIL FILTERS"), "OIL FILTERS").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifications.json");
        crate::etl::write_classifications(&path, &[image("part-0042.png", "Filters", "oil filter")])
            .unwrap();

        let summary = match_images(&db, &path).await.unwrap();
        assert_eq!(summary.matched, 1);
        let stored = PartEntity::find_by_id(id).one(db.as_ref()).await.unwrap().unwrap();
        assert_eq!(stored.image_url.as_deref(), Some("/images/parts/items/part-0042.png"));
    }
}
