//! The semantic core of the trellis schema compiler.
//!
//! This crate consumes the parsed tree of a schema file and produces a
//! fully resolved descriptor tree with a bit-packed wire layout for every
//! struct. It performs name resolution across nested scopes and imports,
//! type-checks literal values, validates declaration numbering, packs
//! struct fields into data and pointer sections, and aggregates as many
//! diagnostics per run as it can instead of stopping at the first.
//!
//! Entry point: [`driver::compile_file`].

pub mod builtin;
pub mod compile;
pub mod desc;
pub mod driver;
pub mod error;
pub mod outcome;
pub mod resolve;

#[cfg(test)]
mod test;

pub mod prelude {
    pub use crate::builtin::{Builtin, PrimitiveType};
    pub use crate::desc::{
        AnnotationMap, DataSectionSize, DataSize, Desc, FieldOffset, FieldSize, FileDesc,
        MemberMap, Node, StructLayout, Type, UnionLayout, Value,
    };
    pub use crate::driver::{compile_file, CompileOptions, ImportResolver};
    pub use crate::outcome::Outcome;
}
