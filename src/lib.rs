// Library for tests to access modules

pub mod aggregation;
pub mod aggregation_worker;
pub mod config;
pub mod device_repo;
pub mod error;
pub mod flush;
pub mod gauge_registry;
pub mod gauge_worker;
pub mod instance;
pub mod models;
pub mod routes;
pub mod sink;
