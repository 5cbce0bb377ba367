//! Command implementations.

mod check;
mod resolve;
mod run;

pub use check::CheckCommand;
pub use resolve::ResolveCommand;
pub use run::RunCommand;
