// SPDX-License-Identifier: MIT OR Apache-2.0
//! cvr-resolver
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Repository contract (§6) plus the Repository Resolver (§4.C): lazy,
//! memoised translation from a component identity or explicit `repoSpec`
//! into a concrete [`Repository`] handle.

mod contract;
mod resolver;

pub use contract::{CredentialError, CredentialGraph, Credentials, Repository, RepositoryFactory};
pub use resolver::RepositoryResolver;
