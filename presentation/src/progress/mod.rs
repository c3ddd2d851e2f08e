//! Progress reporting while votes are collected

pub mod reporter;
