//! Airflow REST API client and endpoint groups

pub mod client;
pub mod common;
pub mod connection;
pub mod error;
pub mod pool;
pub mod user;
pub mod variable;

pub use client::{Auth, Client, RetryConfig};
pub use connection::Connection;
pub use error::ApiError;
pub use pool::Pool;
pub use user::{User, UserRole};
pub use variable::Variable;
