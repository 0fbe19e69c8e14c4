//! CLI commands for tonebench

pub mod dispatch;
pub mod diversity;
pub mod evaluate;
pub mod failures;
pub mod gather;
pub mod merge;
pub mod subjects;
