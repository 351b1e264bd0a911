/// Движок аористического взвешивания

pub mod bucket;
pub mod duration;
pub mod distributor;
pub mod batch;

pub use batch::{run, run_with, OutputTable};
pub use bucket::index_of;
pub use distributor::distribute;
pub use duration::classify;
