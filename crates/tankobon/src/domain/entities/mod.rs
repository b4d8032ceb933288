pub mod catalog;
pub mod trust;
