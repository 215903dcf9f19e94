// Adapters layer: file loading, storage and report export around the pure core.

pub mod csv_loader;
pub mod report;
pub mod storage;
