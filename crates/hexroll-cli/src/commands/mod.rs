pub mod batch;
pub mod sheet;
pub mod tube;
