//! Built-in catalog shown when the remote catalog cannot be reached

use lesson_cart_core::{Lesson, Money};

/// Twelve demo lessons across five subjects and five towns
#[must_use]
pub fn demo_catalog() -> Vec<Lesson> {
    [
        ("1", "Art", "Manchester", 75, 2),
        ("2", "Art", "Bristol", 80, 5),
        ("3", "English", "London", 90, 5),
        ("4", "English", "York", 85, 5),
        ("5", "English", "Bristol", 95, 5),
        ("6", "Math", "London", 100, 4),
        ("7", "Math", "Oxford", 100, 5),
        ("8", "Math", "York", 80, 4),
        ("9", "Music", "Bristol", 90, 5),
        ("10", "Music", "Manchester", 85, 5),
        ("11", "Science", "London", 110, 5),
        ("12", "Science", "Oxford", 120, 5),
    ]
    .into_iter()
    .map(|(id, subject, location, pounds, spaces)| {
        Lesson::new(id, subject, location, Money::from_pounds(pounds), spaces)
    })
    .collect()
}
