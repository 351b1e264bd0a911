/// Анализ результатов пакета

pub mod aggregation;

pub use aggregation::WeightMatrix;
