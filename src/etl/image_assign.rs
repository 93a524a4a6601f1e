use std::collections::BTreeSet;

use sea_orm::{EntityTrait, QueryOrder};
use tracing::{info, instrument};

use super::{apply_image_assignments, tally, ImageAssignment, ITEM_IMAGE_PREFIX};
use crate::db::DbPool;
use crate::models::{part, PartEntity};

pub const DEFAULT_TOTAL_IMAGES: u32 = 975;
const BATCH_SIZE: usize = 500;

/// Contiguous run of numbered item images owned by one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlice {
    pub category: String,
    /// Zero-based index of the first image
    pub start: u32,
    pub len: u32,
}

impl ImageSlice {
    /// URL of the image the `nth` part of the category shows
    pub fn image_for(&self, nth: usize) -> String {
        let number = self.start as usize + nth % self.len.max(1) as usize + 1;
        format!("{}part-{:04}.png", ITEM_IMAGE_PREFIX, number)
    }
}

/// Splits `total_images` across categories in proportion to their part
/// counts. `counts` must be ordered largest first; every category gets at
/// least one image and the index wraps once the images run out.
pub fn plan_slices(counts: &[(String, u64)], total_images: u32) -> Vec<ImageSlice> {
    let total_images = total_images.max(1);
    let total_parts: u64 = counts.iter().map(|(_, n)| n).sum();
    if total_parts == 0 {
        return Vec::new();
    }

    let mut next = 0u32;
    let mut slices = Vec::with_capacity(counts.len());
    for (category, count) in counts {
        let share = (*count as f64 / total_parts as f64 * total_images as f64).round() as u32;
        let wanted = share.max(1);
        let end = (next + wanted).min(total_images);
        slices.push(ImageSlice {
            category: category.clone(),
            start: next,
            len: end - next,
        });
        next = if end >= total_images { 0 } else { end };
    }
    slices
}

#[instrument(skip(db))]
pub async fn assign_images(db: &DbPool, total_images: u32) -> anyhow::Result<usize> {
    let parts = PartEntity::find()
        .order_by_asc(part::Column::Id)
        .all(db)
        .await?;

    let mut counts: Vec<(String, u64)> = tally(parts.iter().map(|p| p.category.as_str()))
        .into_iter()
        .map(|(category, n)| (category.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    info!("Found {} categories, {} parts", counts.len(), parts.len());

    let mut assignments = Vec::with_capacity(parts.len());
    for slice in plan_slices(&counts, total_images) {
        let members = parts.iter().filter(|p| p.category == slice.category);
        let mut assigned = 0;
        for (nth, part) in members.enumerate() {
            assignments.push(ImageAssignment {
                part_id: part.id,
                image_url: slice.image_for(nth),
            });
            assigned += 1;
        }
        info!(
            "Category: {} ({} parts) -> images {} to {}",
            slice.category,
            assigned,
            slice.start + 1,
            slice.start + slice.len
        );
    }

    apply_image_assignments(db, &assignments, BATCH_SIZE).await?;

    let unique: BTreeSet<&str> = assignments.iter().map(|a| a.image_url.as_str()).collect();
    info!("Unique item images assigned: {}", unique.len());
    Ok(assignments.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::test_support::{insert_part, memory_db};

    fn counts(rows: &[(&str, u64)]) -> Vec<(String, u64)> {
        rows.iter().map(|(c, n)| (c.to_string(), *n)).collect()
    }

    #[test]
    fn slices_are_proportional_with_a_minimum_of_one() {
        let slices = plan_slices(&counts(&[("Filters", 900), ("Bearings", 99), ("Fluids", 1)]), 100);
        assert_eq!(
            slices,
            vec![
                ImageSlice { category: "Filters".into(), start: 0, len: 90 },
                ImageSlice { category: "Bearings".into(), start: 90, len: 10 },
                ImageSlice { category: "Fluids".into(), start: 0, len: 1 },
            ]
        );
    }

    #[test]
    fn parts_cycle_through_their_slice() {
        let slice = ImageSlice { category: "Bearings".into(), start: 90, len: 2 };
        assert_eq!(slice.image_for(0), "/images/parts/items/part-0091.png");
        assert_eq!(slice.image_for(1), "/images/parts/items/part-0092.png");
        assert_eq!(slice.image_for(2), "/images/parts/items/part-0091.png");
    }

    #[test]
    fn empty_catalog_plans_nothing() {
        assert!(plan_slices(&[], 975).is_empty());
    }

    #[tokio::test]
    async fn assigns_images_to_every_part() {
        let db = memory_db().await;
        let a = insert_part(&db, "1R0001", "Filters", None, "Oil filter").await;
        let b = insert_part(&db, "1R0002", "Filters", None, "Fuel filter").await;
        let c = insert_part(&db, "5P0001", "Bearings", None, "Bearing").await;

        assert_eq!(assign_images(&db, 3).await.unwrap(), 3);

        let url = |id| {
            let db = db.clone();
            async move { PartEntity::find_by_id(id).one(db.as_ref()).await.unwrap().unwrap().image_url }
        };
        assert_eq!(url(a).await.as_deref(), Some("/images/parts/items/part-0001.png"));
        assert_eq!(url(b).await.as_deref(), Some("/images/parts/items/part-0002.png"));
        assert_eq!(url(c).await.as_deref(), Some("/images/parts/items/part-0003.png"));
    }
}
