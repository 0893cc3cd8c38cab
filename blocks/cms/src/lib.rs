pub mod case_studies;
pub mod posts;
pub mod responses;
pub mod store;
pub mod types;
pub mod uploads;
