//! Final ordering of extracted items.

use std::cmp::Ordering;

use crate::item::Item;

/// Concatenate item batches in the given order and sort them.
pub fn merge_items(batches: impl IntoIterator<Item = Vec<Item>>) -> Vec<Item> {
    let mut items: Vec<Item> = batches.into_iter().flatten().collect();
    sort_items(&mut items);
    items
}

/// Stable sort by page index, then paint order.
///
/// Items with equal `(pageIndex, zOrder)` keep their relative order.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(|a, b| {
        a.page_index()
            .cmp(&b.page_index())
            .then_with(|| compare_z(a.z_order(), b.z_order()))
    });
}

fn compare_z(a: f64, b: f64) -> Ordering {
    // -0.0 sorts before 0.0 and NaN after every number
    a.total_cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Anchor, ItemCommon, TextItem};

    fn text(page: usize, z: f64, label: &str) -> Item {
        Item::Text(TextItem {
            common: ItemCommon::new(page, 0.0, 0.0, z),
            text: label.to_string(),
            font_size: None,
            font_family: None,
            color: None,
            box_padding: None,
            id: None,
            anchor: Anchor::Top,
        })
    }

    fn labels(items: &[Item]) -> Vec<String> {
        items
            .iter()
            .map(|i| match i {
                Item::Text(t) => t.text.clone(),
                _ => String::new(),
            })
            .collect()
    }

    #[test]
    fn sorts_by_page_then_z() {
        let merged = merge_items([
            vec![text(1, 0.0, "p1"), text(0, 5.0, "p0-high")],
            vec![text(0, -1.0, "p0-low")],
        ]);
        assert_eq!(labels(&merged), ["p0-low", "p0-high", "p1"]);
    }

    #[test]
    fn equal_keys_keep_emission_order() {
        let merged = merge_items([
            vec![text(0, 1.0, "a"), text(0, 1.0, "b")],
            vec![text(0, 1.0, "c"), text(0, 0.0, "first")],
        ]);
        assert_eq!(labels(&merged), ["first", "a", "b", "c"]);
    }

    #[test]
    fn output_is_non_decreasing() {
        let mut items: Vec<Item> = (0..50)
            .map(|i| text(i % 3, ((i * 7) % 11) as f64, &i.to_string()))
            .collect();
        sort_items(&mut items);
        for pair in items.windows(2) {
            let a = (pair[0].page_index(), pair[0].z_order());
            let b = (pair[1].page_index(), pair[1].z_order());
            assert!(a.0 < b.0 || (a.0 == b.0 && a.1 <= b.1));
        }
    }

    #[test]
    fn negative_zero_and_zero_are_ordered() {
        let merged = merge_items([vec![text(0, 0.0, "zero"), text(0, -0.0, "neg")]]);
        assert_eq!(labels(&merged), ["neg", "zero"]);
    }
}
