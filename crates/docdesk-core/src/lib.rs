#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Shared configuration, settings, error and domain types for docdesk.

pub mod config;
pub mod error;
pub mod settings;
pub mod traits;
pub mod types;
