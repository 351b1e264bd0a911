//! Индексация временных меток по корзинам недели

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::types::{BucketPosition, WeeklyBucketIndex, HOURS_PER_DAY};

/// Положение метки в неделе; воскресенье — первый день
pub fn index_of(timestamp: &NaiveDateTime) -> BucketPosition {
    let day_of_week = timestamp.weekday().number_from_sunday();
    let hour_of_day = timestamp.hour();

    BucketPosition {
        day_of_week,
        hour_of_day,
        minute_of_hour: timestamp.minute(),
        bucket: WeeklyBucketIndex((HOURS_PER_DAY * (day_of_week - 1) + hour_of_day + 1) as u16),
    }
}
