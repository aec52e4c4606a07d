//! Derivation of algebraic systems from weak formulations of PDEs in differential forms.
//!
//! A [`Session`] owns every entity of a derivation: meshes, spaces, forms, scalars, abstract
//! time sequences and arrays. A typical derivation builds a [`Pde`], tests it against spaces
//! to obtain a [`WeakFormulation`], discretizes it in time, and converts the result into an
//! [`AlgebraicProxy`] and a block-structured [`MatrixProxy`].

pub mod array;
pub mod error;
pub mod form;
pub mod mesh;
pub mod ode;
pub mod pde;
pub mod registry;
pub mod samples;
pub mod scalar;
pub mod session;
pub mod settings;
pub mod sign;
pub mod space;
pub mod term;
pub mod time_sequence;
pub mod wf;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub use error::{DerivationError, DerivationResult};
pub use ode::Ode;
pub use pde::Pde;
pub use session::Session;
pub use sign::Sign;
pub use wf::ap::AlgebraicProxy;
pub use wf::mp::MatrixProxy;
pub use wf::WeakFormulation;
