//! # Sort Module
//!
//! Resolves the display order of a file set. The position of a file in
//! this order is the `index` positional rules see.

use crate::core::file::FileInfo;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Order in which the files were loaded
    #[default]
    Index,
    Name,
    Time,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortConfig {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }
}

/// Original indices of `files` in display order.
///
/// Sorting is stable in both directions: files that compare equal keep
/// their original relative order.
pub fn get_sorted_file_indices(files: &[FileInfo], config: SortConfig) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..files.len()).collect();

    let key = match config.key {
        SortKey::Time if files.iter().all(|f| f.timestamp.is_none()) => SortKey::Index,
        key => key,
    };

    let compare = |a: &usize, b: &usize| -> Ordering {
        match key {
            SortKey::Index => a.cmp(b),
            SortKey::Name => compare_names(&files[*a].full_name, &files[*b].full_name),
            SortKey::Time => files[*a]
                .timestamp
                .unwrap_or(0)
                .cmp(&files[*b].timestamp.unwrap_or(0)),
        }
    };

    match config.order {
        SortOrder::Asc => indices.sort_by(compare),
        SortOrder::Desc => indices.sort_by(|a, b| compare(b, a)),
    }
    indices
}

/// Human ordering of names.
///
/// Accents and case are ignored first, so `éclair` sorts with the `e`
/// names. Lowercase text and then raw text break ties.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    fold_name(a)
        .cmp(&fold_name(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Lowercase `name` with its combining marks dropped
fn fold_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// For each original index, its position in `order`
pub fn display_positions(order: &[usize]) -> Vec<usize> {
    let mut positions = vec![0; order.len()];
    for (position, &original) in order.iter().enumerate() {
        if let Some(slot) = positions.get_mut(original) {
            *slot = position;
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<FileInfo> {
        names.iter().map(|n| FileInfo::from_name(n)).collect()
    }

    fn timed(stamps: &[Option<i64>]) -> Vec<FileInfo> {
        stamps
            .iter()
            .enumerate()
            .map(|(i, ts)| FileInfo::from_name(&format!("f{}.txt", i)).with_timestamp(*ts))
            .collect()
    }

    #[test]
    fn index_order_and_reverse() {
        let set = files(&["c", "a", "b"]);
        assert_eq!(get_sorted_file_indices(&set, SortConfig::default()), vec![0, 1, 2]);
        assert_eq!(
            get_sorted_file_indices(&set, SortConfig::new(SortKey::Index, SortOrder::Desc)),
            vec![2, 1, 0]
        );
    }

    #[test]
    fn name_order_ignores_case_first() {
        let set = files(&["beta.txt", "Alpha.txt", "alpha.txt", "Gamma.txt"]);
        assert_eq!(
            get_sorted_file_indices(&set, SortConfig::new(SortKey::Name, SortOrder::Asc)),
            vec![1, 2, 0, 3]
        );
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let set = files(&["zebra.txt", "éclair.txt", "fig.txt"]);
        assert_eq!(
            get_sorted_file_indices(&set, SortConfig::new(SortKey::Name, SortOrder::Asc)),
            vec![1, 2, 0]
        );
        assert_eq!(compare_names("Éa", "eb"), Ordering::Less);
        assert_eq!(compare_names("éa", "ea"), Ordering::Greater);
    }

    #[test]
    fn equal_names_stay_stable_in_both_directions() {
        let set = files(&["same.txt", "other.txt", "same.txt"]);
        assert_eq!(
            get_sorted_file_indices(&set, SortConfig::new(SortKey::Name, SortOrder::Asc)),
            vec![1, 0, 2]
        );
        assert_eq!(
            get_sorted_file_indices(&set, SortConfig::new(SortKey::Name, SortOrder::Desc)),
            vec![0, 2, 1]
        );
    }

    #[test]
    fn time_order_treats_missing_as_zero() {
        let set = timed(&[Some(30), None, Some(10)]);
        assert_eq!(
            get_sorted_file_indices(&set, SortConfig::new(SortKey::Time, SortOrder::Asc)),
            vec![1, 2, 0]
        );
        assert_eq!(
            get_sorted_file_indices(&set, SortConfig::new(SortKey::Time, SortOrder::Desc)),
            vec![0, 2, 1]
        );
    }

    #[test]
    fn time_without_any_timestamp_falls_back_to_index() {
        let set = timed(&[None, None, None]);
        assert_eq!(
            get_sorted_file_indices(&set, SortConfig::new(SortKey::Time, SortOrder::Desc)),
            vec![2, 1, 0]
        );
    }

    #[test]
    fn display_positions_invert_order() {
        assert_eq!(display_positions(&[2, 0, 1]), vec![1, 2, 0]);
        assert!(display_positions(&[]).is_empty());
    }
}
