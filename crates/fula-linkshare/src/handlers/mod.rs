//! Link sharing request handlers

pub mod share;

pub use share::*;
