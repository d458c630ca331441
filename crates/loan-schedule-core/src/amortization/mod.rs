pub mod analysis;
pub mod recalc;
pub mod schedule;
pub mod summary;
