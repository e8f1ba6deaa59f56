//! Upstream version resolution
//!
//! Looks up the best-known version of a source in an external reference
//! repository so that local versions can be judged for freshness.
//!
//! # Modules
//!
//! - [`nixos`]: Resolver backed by the NixOS channel package index
//! - [`resolver`]: Resolver trait, repository identifiers and errors

pub mod nixos;
pub mod resolver;

pub use nixos::NixosResolver;
pub use resolver::{
    ResolveError, Resolution, UpstreamRepository, UpstreamResolver, resolve_upstream,
};
