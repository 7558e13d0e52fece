//! Turning verified plans into output
//!
//! An emitter must keep the semantics fixed by the plan: actions in plan order, elements in
//! source order, failures passed through without wrapping.

mod interpreter;
mod rust_emitter;

pub use interpreter::{
    CompiledMapping, Converter, ConverterTable, Execution, ExecutionError, MutatorCall,
    PlanInterpreter, RaisedFailure,
};
pub use rust_emitter::{GeneratedSource, RustEmitter};

use crate::error::Result;
use crate::method::MappingMethod;
use crate::verify::VerifiedPlan;

/// Consumes verified plans
pub trait Emitter {
    /// What one emitted method produces
    type Output;

    /// Emit one method; the plan is consumed
    fn emit(&mut self, method: &MappingMethod, plan: VerifiedPlan) -> Result<Self::Output>;
}
