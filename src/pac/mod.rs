//! Power Platform CLI (`pac`) integration layer.
//!
//! - `sanitize`: shell-metacharacter filtering with an explicit policy
//! - `command`: the typed invocation surface (argument vectors per operation)
//! - `runner`: subprocess execution and the non-zero-exit contract
//! - `locator`: presence/version probing
//! - `parser`: auth profile, environment, and solution parsers
//! - `facade`: the operations both front ends call

pub mod command;
pub mod facade;
pub mod locator;
pub mod parser;
pub mod runner;
pub mod sanitize;

#[cfg(test)]
pub(crate) mod testing;
