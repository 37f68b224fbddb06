//! Static-call resolution.
//!
//! The entry point is [`Analyzer::analyze_static_call`].  Resolution runs
//! in stages, one submodule each:
//!
//! 1. [`class_reference`]: turn the part before `::` into a receiver type.
//! 2. [`static_call`]: fan out over the receiver's atomic types and
//!    combine the per-atomic results.
//! 3. [`method_lookup`]: find the method, falling back to `__callStatic`.
//! 4. [`replay`]: replay `self::` callees during property passes.
//! 5. [`lifecycle`]: deprecation, `@internal`, visibility and
//!    static-context checks.
//! 6. [`return_type`]: bind generics and infer the return type.
//! 7. [`post_process`]: assertions, after-call plugins, node data and
//!    property forgetting.
//!
//! A fatal issue anywhere returns `Err(Fatal)` and abandons the call,
//! including any receiver atomics not visited yet.

mod class_reference;
mod lifecycle;
mod method_lookup;
mod post_process;
mod replay;
mod return_type;
mod static_call;

use crate::ttype::Union;
use crate::types::{Assertion, MethodId};

pub use class_reference::ClassResolution;

/// What a resolved static call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallResult {
    /// Combined return type of every receiver atomic that resolved.
    /// `None` when none did or none declared a type.
    pub inferred_type: Option<Union>,
    /// The last method id selected, if the call got as far as a lookup.
    pub method_id: Option<MethodId>,
    /// Facts that hold when the call returned a truthy value.
    pub if_true_assertions: Vec<Assertion>,
    /// Facts that hold when the call returned a falsy value.
    pub if_false_assertions: Vec<Assertion>,
}

impl CallResult {
    pub fn inferred_type_string(&self) -> Option<String> {
        self.inferred_type.as_ref().map(ToString::to_string)
    }
}

/// Result of resolving the call for one receiver atomic.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AtomicOutcome {
    /// Resolved; carries the return type when one is known.
    Success(Option<Union>),
    /// Not resolvable.  Any issue has already been reported.
    Skip,
}
