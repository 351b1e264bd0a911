//! Справочная таблица «час × день недели» → номер корзины
//!
//! Каноническая раскладка: первый столбец — воскресенье (день 1), как и в
//! нумерации корзин. Раскладка `SundayLast` только для отображения.

use serde::{Deserialize, Serialize};

use crate::types::{WeeklyBucketIndex, HOURS_PER_DAY};

pub const DAY_LABELS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayLayout {
    #[default]
    SundayFirst,
    SundayLast,
}

impl DayLayout {
    /// Номера дней (воскресенье = 1) в порядке столбцов
    pub fn day_order(self) -> [u32; 7] {
        match self {
            DayLayout::SundayFirst => [1, 2, 3, 4, 5, 6, 7],
            DayLayout::SundayLast => [2, 3, 4, 5, 6, 7, 1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub hours: String,
    pub buckets: Vec<WeeklyBucketIndex>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTable {
    pub layout: DayLayout,
    pub days: Vec<String>,
    pub rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn new(layout: DayLayout) -> Self {
        let order = layout.day_order();

        let rows = (0..HOURS_PER_DAY)
            .map(|hour| ReferenceRow {
                hours: hour_label(hour),
                buckets: order
                    .iter()
                    .filter_map(|&day| WeeklyBucketIndex::from_day_hour(day, hour))
                    .collect(),
            })
            .collect();

        Self {
            layout,
            days: order
                .iter()
                .map(|&day| DAY_LABELS[day as usize - 1].to_string())
                .collect(),
            rows,
        }
    }

    pub fn lookup(&self, day: &str, hour: u32) -> Option<WeeklyBucketIndex> {
        let column = self.days.iter().position(|d| d.eq_ignore_ascii_case(day))?;
        self.rows.get(hour as usize)?.buckets.get(column).copied()
    }
}

fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00-{hour:02}:59")
}
