pub mod config;
pub mod error;
pub mod machine_id;
pub mod service;
pub mod telemetry;
