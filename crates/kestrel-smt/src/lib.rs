//! Kestrel SMT - incremental bitvector decision procedure
//!
//! Lowers typed program expressions onto SMT-LIB 2 and drives a solver
//! subprocess incrementally. The pipeline has three stages:
//!
//! 1. [`struct_encoding`] flattens aggregate types and operations onto the
//!    bitvector theory,
//! 2. [`convert`] lowers the struct-free expressions to solver terms,
//!    tracking address-taken objects and pointer sizes as it goes,
//! 3. [`session`] streams the resulting commands to a solver held open for
//!    the whole run, with assertion scopes, memoized definitions and model
//!    queries.
//!
//! ```no_run
//! use kestrel_ir::{Expr, Namespace, Type};
//! use kestrel_smt::{IncrementalSolver, SolverConfig};
//!
//! # fn main() -> kestrel_smt::SmtResult<()> {
//! let ns = Namespace::new();
//! let mut solver = IncrementalSolver::new(&ns, &SolverConfig::default())?;
//! let x = Expr::symbol("x", Type::UnsignedBv(8));
//! let three = Expr::bv_literal(3u8, Type::UnsignedBv(8));
//! solver.set_to(&Expr::equal(x.clone(), three), true)?;
//! solver.solve()?;
//! let value = solver.get(&x)?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod convert;
pub mod error;
pub mod object_map;
pub mod session;
pub mod smtlib;
pub mod solver;
pub mod sort;
pub mod struct_encoding;
pub mod term;

pub use config::SolverConfig;
pub use convert::{convert_type, ConversionContext};
pub use error::{SmtError, SmtResult};
pub use object_map::{associate_pointer_sizes, ObjectMap, ObjectSizeModel, PointerSizeMap};
pub use session::IncrementalSolver;
pub use smtlib::{CheckSatResponse, Command};
pub use solver::{find_executable, SolverDriver, SolverProcess};
pub use sort::Sort;
pub use struct_encoding::StructEncoding;
pub use term::{Identifier, Term};
