pub mod config;
pub mod form;
pub mod limits;
pub mod model;
pub mod observability;
pub mod schedule;
pub mod slot;
