//! Core domain concepts shared across all subdomains.
//!
//! - [`role::RoleId`]: a boardroom seat (CEO, CFO, ...) casting votes
//! - [`decision_type::DecisionType`]: the category a proposal falls under
//! - [`error::DomainError`]: domain-level errors

pub mod decision_type;
pub mod error;
pub mod role;
pub mod text;
pub mod time;
