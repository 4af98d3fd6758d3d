pub mod value_object;

pub use value_object::{FusekiStats, LogRecord, LogStatus, PathCount, PerfSnapshot, PerfStats};
