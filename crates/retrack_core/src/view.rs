//! Urgency-ordered presentation rows.
//!
//! # Invariants
//! - Rows are ordered by ascending `days_left` (most overdue first).
//! - Ties keep input order (stable sort).
//! - Display order is derived per call and never persisted.

use crate::model::item::Item;
use crate::reconcile::{days_left, next_date};
use chrono::NaiveDate;
use std::fmt::{Display, Formatter};

/// Category predicate applied before sorting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Items without a category.
    Uncategorized,
    /// Items whose category equals the label (case-insensitive).
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::All => true,
            Self::Uncategorized => item.category.is_none(),
            Self::Only(label) => item
                .category
                .as_deref()
                .is_some_and(|category| category.eq_ignore_ascii_case(label)),
        }
    }
}

/// Due state derived from `days_left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Overdue { days: u64 },
    DueToday,
    Upcoming { days: u64 },
}

impl DueStatus {
    pub fn from_days_left(days_left: i64) -> Self {
        match days_left {
            0 => Self::DueToday,
            d if d < 0 => Self::Overdue {
                days: d.unsigned_abs(),
            },
            d => Self::Upcoming {
                days: d.unsigned_abs(),
            },
        }
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, Self::Overdue { .. })
    }
}

impl Display for DueStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overdue { days } => write!(f, "Overdue by {days} {}", plural_days(*days)),
            Self::DueToday => write!(f, "Due today"),
            Self::Upcoming { days } => write!(f, "{days} {} left", plural_days(*days)),
        }
    }
}

fn plural_days(days: u64) -> &'static str {
    if days == 1 {
        "day"
    } else {
        "days"
    }
}

/// One item plus its derived schedule values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow<'a> {
    pub item: &'a Item,
    pub days_left: i64,
    pub next_date: NaiveDate,
    pub status: DueStatus,
}

impl<'a> ItemRow<'a> {
    pub fn new(item: &'a Item, today: NaiveDate) -> Self {
        let remaining = days_left(item.last_replaced, item.interval_days, today);
        Self {
            item,
            days_left: remaining,
            next_date: next_date(item.last_replaced, item.interval_days),
            status: DueStatus::from_days_left(remaining),
        }
    }
}

/// Filters `items` and orders them soonest-due first.
pub fn build_rows<'a>(
    items: &'a [Item],
    today: NaiveDate,
    filter: &CategoryFilter,
) -> Vec<ItemRow<'a>> {
    let mut rows: Vec<ItemRow<'a>> = items
        .iter()
        .filter(|item| filter.matches(item))
        .map(|item| ItemRow::new(item, today))
        .collect();
    rows.sort_by_key(|row| row.days_left);
    rows
}

#[cfg(test)]
mod tests {
    use super::{build_rows, CategoryFilter, DueStatus};
    use crate::model::item::Item;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item_with_days_left(name: &str, days_left: i64, today: NaiveDate) -> Item {
        // interval 10; shift last_replaced so that 10 - elapsed == days_left
        let elapsed = 10 - days_left;
        Item::new(name, 10, today - chrono::Duration::days(elapsed)).unwrap()
    }

    #[test]
    fn rows_sort_most_overdue_first_and_keep_ties_stable() {
        let today = date(2024, 6, 1);
        let items = vec![
            item_with_days_left("a", 5, today),
            item_with_days_left("b", -2, today),
            item_with_days_left("c", 5, today),
            item_with_days_left("d", 0, today),
        ];

        let rows = build_rows(&items, today, &CategoryFilter::All);
        let order: Vec<(&str, i64)> = rows
            .iter()
            .map(|row| (row.item.name.as_str(), row.days_left))
            .collect();
        assert_eq!(order, vec![("b", -2), ("d", 0), ("a", 5), ("c", 5)]);
    }

    #[test]
    fn category_filter_narrows_rows() {
        let today = date(2024, 6, 1);
        let mut kitchen = item_with_days_left("sponge", 3, today);
        kitchen.category = Some("Kitchen".to_string());
        let loose = item_with_days_left("loose", 1, today);
        let items = vec![kitchen, loose];

        let only = build_rows(&items, today, &CategoryFilter::Only("kitchen".to_string()));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].item.name, "sponge");

        let none = build_rows(&items, today, &CategoryFilter::Uncategorized);
        assert_eq!(none.len(), 1);
        assert_eq!(none[0].item.name, "loose");
    }

    #[test]
    fn status_labels_read_naturally() {
        assert_eq!(DueStatus::from_days_left(-1).to_string(), "Overdue by 1 day");
        assert_eq!(DueStatus::from_days_left(0).to_string(), "Due today");
        assert_eq!(DueStatus::from_days_left(12).to_string(), "12 days left");
    }
}
