//! Распределение аористического веса по 168 корзинам недели
//!
//! Правила не исключают друг друга: каждое сработавшее правило добавляет
//! свой вклад в один и тот же аккумулятор.

use crate::types::{
    BucketPosition, DurationRecord, WeeklyBucketIndex, WeightVector, BUCKETS, MINUTES_PER_HOUR,
    MINUTES_PER_WEEK,
};

pub fn distribute(start: Option<&BucketPosition>, record: &DurationRecord) -> WeightVector {
    let mut weights = WeightVector::zeros();

    // Без начала вес не назначается вовсе
    let Some(start) = start else {
        return weights;
    };
    let duration = record.duration_minutes;

    if duration >= MINUTES_PER_WEEK {
        weights.add_flat(1.0 / BUCKETS as f64);
    }

    if !record.end_present {
        weights.add(start.bucket, duration as f64);
    }

    if record.end_present && (0..=1).contains(&duration) {
        weights.add(start.bucket, 1.0);
    }

    if duration < 0 {
        weights.add(start.bucket, 1.0);
    }

    if duration > 1 && duration < MINUTES_PER_WEEK {
        spread(start.bucket, start.left_in_hour(), duration, &mut weights);
    }

    weights
}

/// Пропорциональное деление по минутам, начиная с `start_bucket`.
///
/// `left_in_hour` — остаток минут в первом часе; далее каждый час по 60.
/// Суммарный добавленный вес равен 1.
pub fn spread(
    start_bucket: WeeklyBucketIndex,
    left_in_hour: i64,
    duration_minutes: i64,
    weights: &mut WeightVector,
) {
    if duration_minutes <= 0 {
        return;
    }

    let per_minute = 1.0 / duration_minutes as f64;
    let mut remaining = duration_minutes;
    let mut left = left_in_hour.clamp(0, MINUTES_PER_HOUR);
    let mut bucket = start_bucket;

    loop {
        let taken = remaining.min(left);
        weights.add(bucket, taken as f64 * per_minute);
        remaining -= taken;

        if remaining <= 0 {
            break;
        }
        bucket = bucket.next();
        left = MINUTES_PER_HOUR;
    }
}
