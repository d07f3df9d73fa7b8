use std::collections::HashMap;

use crate::domain::item::Item;

/// Aggregated signals from a user's liked items: how many liked items carried
/// each style tag, dominant color, and garment type. Repeat clicks on the
/// same item count each time, so a tag liked three times boosts three times.
#[derive(Clone, Debug, Default)]
pub struct HistoryProfile {
    style_tags: HashMap<String, u32>,
    dominant_colors: HashMap<String, u32>,
    garment_types: HashMap<String, u32>,
}

impl HistoryProfile {
    pub fn from_items<'a>(liked: impl IntoIterator<Item = &'a Item>) -> Self {
        let mut profile = Self::default();
        for item in liked {
            for tag in &item.style_tags {
                *profile.style_tags.entry(tag.clone()).or_insert(0) += 1;
            }
            for color in &item.dominant_colors {
                *profile.dominant_colors.entry(color.clone()).or_insert(0) += 1;
            }
            if !item.garment_type.is_empty() {
                *profile.garment_types.entry(item.garment_type.clone()).or_insert(0) += 1;
            }
        }
        profile
    }

    pub fn is_empty(&self) -> bool {
        self.style_tags.is_empty()
            && self.dominant_colors.is_empty()
            && self.garment_types.is_empty()
    }

    pub fn style_tag_count(&self, tag: &str) -> u32 {
        self.style_tags.get(tag).copied().unwrap_or(0)
    }

    pub fn color_count(&self, color: &str) -> u32 {
        self.dominant_colors.get(color).copied().unwrap_or(0)
    }

    pub fn liked_garment_type(&self, garment_type: &str) -> bool {
        self.garment_types.contains_key(garment_type)
    }
}
