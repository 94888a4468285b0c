// Life of a request:
// 1. A request id is picked and a request span opened
// 2. The bearer token, if any, is verified into a Principal
// 3. Route layers reject anonymous callers (401) and non-admins (403)
// 4. The handler looks the resource up, then runs the ownership check
// 5. Failures from any step are rendered as one ApiError shape
//
// System components:
//  - Token codec and access policy (auth)
//  - In-memory user and task stores
//  - Task and user admin services
//  - axum router

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod store;
pub mod tasks;
pub mod time;
pub mod users;

#[cfg(test)]
mod e2e_tests;

pub use config::ServerConfig;
pub use error::{ApiError, AppError};
pub use routes::{AppState, router};
