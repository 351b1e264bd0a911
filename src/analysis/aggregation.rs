//! Агрегация весов пакета для последующей визуализации

use ndarray::{Array1, Array2, Axis};

use crate::engine::OutputTable;
use crate::types::{
    AoristicSummary, BucketTotal, Diagnostics, WeeklyBucketIndex, BUCKETS, DAYS_PER_WEEK,
    HOURS_PER_DAY,
};

/// Матрица весов: строка на событие, колонка на корзину
pub struct WeightMatrix {
    weights: Array2<f64>,
    diagnostics: Diagnostics,
}

impl WeightMatrix {
    pub fn from_table(table: &OutputTable) -> Self {
        let mut weights = Array2::zeros((table.rows.len(), BUCKETS));
        for (i, row) in table.rows.iter().enumerate() {
            for (j, weight) in row.weights.as_slice().iter().enumerate() {
                weights[[i, j]] = *weight;
            }
        }

        Self {
            weights,
            diagnostics: table.diagnostics,
        }
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Сумма весов по каждой из 168 корзин
    pub fn bucket_totals(&self) -> Array1<f64> {
        self.weights.sum_axis(Axis(0))
    }

    pub fn day_totals(&self) -> Vec<f64> {
        let totals = self.bucket_totals();
        let mut days = vec![0.0; DAYS_PER_WEEK as usize];
        for bucket in WeeklyBucketIndex::all() {
            days[bucket.day_of_week() as usize - 1] += totals[bucket.slot()];
        }
        days
    }

    pub fn hour_totals(&self) -> Vec<f64> {
        let totals = self.bucket_totals();
        let mut hours = vec![0.0; HOURS_PER_DAY as usize];
        for bucket in WeeklyBucketIndex::all() {
            hours[bucket.hour_of_day() as usize] += totals[bucket.slot()];
        }
        hours
    }

    pub fn summarize(&self) -> AoristicSummary {
        let totals = self.bucket_totals();

        let by_bucket = WeeklyBucketIndex::all()
            .map(|bucket| BucketTotal {
                bucket,
                day_of_week: bucket.day_of_week(),
                hour_of_day: bucket.hour_of_day(),
                weight: totals[bucket.slot()],
            })
            .collect();

        AoristicSummary {
            events: self.weights.nrows(),
            total_weight: totals.sum(),
            by_bucket,
            by_day: self.day_totals(),
            by_hour: self.hour_totals(),
            diagnostics: self.diagnostics,
        }
    }
}
