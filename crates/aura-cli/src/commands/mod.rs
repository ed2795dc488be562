pub mod audit;
pub mod credit;
pub mod dashboard;
pub mod termsheet;
pub mod workflow;
