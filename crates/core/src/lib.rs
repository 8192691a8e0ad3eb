#![forbid(unsafe_code)]

pub mod model;
pub mod pagination;
pub mod roles;
pub mod routes;
pub mod time;

pub use time::Clock;
