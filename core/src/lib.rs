pub mod dates;
pub mod hydration;
pub mod metrics;
pub mod models;
pub mod records;
pub mod responder;
pub mod service;
pub mod store;
pub mod theme;
pub mod transfer;
