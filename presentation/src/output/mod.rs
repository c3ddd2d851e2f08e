//! Output formatting for outcomes and reports

pub mod console;
pub mod formatter;
