//! Chain definitions and their materialization.
//!
//! - [`spec`] — [`ChainSpec`], the fully-resolved chain configuration built
//!   from a request, plus chain-type templates.
//! - [`maker`] — [`ChainMaker`] trait and the filesystem-backed [`LocalMaker`].

mod maker;
mod spec;

pub use self::maker::*;
pub use self::spec::*;
