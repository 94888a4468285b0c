//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario and drives the real router over
//! in-memory stores.

#![cfg(test)]

mod helpers;

mod test_admin_users;
mod test_context_isolation;
mod test_ownership;
mod test_register_login;
mod test_request_id;
mod test_token_rejection;
