//! riskreg: a risk register with remediation project tracking
//!
//! Companies, staff, stakeholders, risks and remediation projects are kept
//! in a single JSON document. Every change to a risk or project is narrated
//! into an append-only history, and a command-line front end drives the
//! register from a workspace directory.

pub mod cli;
pub mod core;
pub mod entities;
