pub mod etl;
pub mod pipeline;
pub mod runner;

pub use crate::domain::model::{Product, RawRecord, StoreReport, TransformResult};
pub use crate::domain::ports::{Pipeline, ProductStore, RecordStream};
pub use crate::utils::error::Result;
