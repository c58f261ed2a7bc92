//! Family workload balancing service: SQLite persistence, cycle
//! orchestration and an HTTP API over [`balance_core`].

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
