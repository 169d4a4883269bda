//! Import resource model.
//!
//! * [`ResourceKind`] - the closed set of importable kinds
//! * [`PartialImport`] - the bundle submitted in one import call
//! * [`ClientRepresentation`], [`IdentityProviderRepresentation`],
//!   [`UserRepresentation`] - kind-specific definitions

pub mod bundle;
pub mod kind;
pub mod representation;

pub use bundle::PartialImport;
pub use kind::ResourceKind;
pub use representation::{
    ClientRepresentation, IdentityProviderRepresentation, UserRepresentation,
};
