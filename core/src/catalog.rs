//! Sorted projection of the ledger for display.

use crate::types::{Lesson, SortCriterion, SortField, SortOrder};
use std::cmp::Ordering;

/// Sort `lessons` by `criterion` into a new list
///
/// The sort is stable in both directions: lessons that compare equal keep
/// their ledger order.
#[must_use]
pub fn project(lessons: &[Lesson], criterion: SortCriterion) -> Vec<Lesson> {
    let mut view = lessons.to_vec();
    view.sort_by(|a, b| {
        let ordering = compare(a, b, criterion.field);
        match criterion.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    view
}

fn compare(a: &Lesson, b: &Lesson, field: SortField) -> Ordering {
    match field {
        SortField::Subject => a.subject.cmp(&b.subject),
        SortField::Location => a.location.cmp(&b.location),
        SortField::Price => a.price.cmp(&b.price),
        SortField::Spaces => a.spaces.cmp(&b.spaces),
    }
}
