//! CLI command implementations

pub mod category;
pub mod company;
pub mod completions;
pub mod config;
pub mod dashboard;
pub mod demo;
pub mod group;
pub mod init;
pub mod project;
pub mod risk;
pub mod staff;
pub mod stakeholder;
