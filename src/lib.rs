pub mod clock;
pub mod config;
pub mod engine;
pub mod form;
pub mod limits;
pub mod model;
pub mod observability;
pub mod session;
