//! Turns a [`ParseResult`] into executable chains.
//!
//! Every top-level call is looked up in the [`ActionRegistry`] and its
//! arguments are bound, so unknown names and unacceptable arguments are
//! reported here, before any step can run.

use std::fmt;

use formset_rs_core::error::{FormsetError, FormsetResult};

use crate::argument::BoundArgument;
use crate::ast::{ActionCall, ParseResult};
use crate::registry::{ActionRegistry, ActionStep};

/// A call resolved to an executable step.
pub struct ResolvedStep {
    /// The call as written.
    pub call: ActionCall,
    /// The call's arguments after name resolution.
    pub arguments: Vec<BoundArgument>,
    /// The step to invoke.
    pub operation: Box<dyn ActionStep>,
}

impl ResolvedStep {
    /// The action name.
    pub fn name(&self) -> &str {
        &self.call.name
    }
}

impl fmt::Debug for ResolvedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedStep")
            .field("call", &self.call.to_string())
            .field("operation", &self.operation)
            .finish()
    }
}

/// Both chains of a button, ready to run.
#[derive(Debug, Default)]
pub struct ResolvedChains {
    /// Steps run on activation.
    pub success: Vec<ResolvedStep>,
    /// Steps run when the success chain rejects; may be empty.
    pub reject: Vec<ResolvedStep>,
}

impl fmt::Display for ResolvedChains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = |steps: &[ResolvedStep]| {
            steps
                .iter()
                .map(|s| s.call.to_string())
                .collect::<Vec<_>>()
                .join(" -> ")
        };
        write!(f, "{}", chain(&self.success))?;
        if !self.reject.is_empty() {
            write!(f, " !~ {}", chain(&self.reject))?;
        }
        Ok(())
    }
}

/// Resolves one call.
///
/// The action name is looked up before its arguments are bound, so an
/// unknown action is reported as such whatever its arguments contain.
pub fn resolve(call: &ActionCall, registry: &ActionRegistry) -> FormsetResult<ResolvedStep> {
    if !registry.contains(&call.name) {
        return Err(FormsetError::NameResolution {
            name: call.name.clone(),
        });
    }
    let arguments = call
        .args
        .iter()
        .map(|arg| BoundArgument::bind(&call.name, arg))
        .collect::<FormsetResult<Vec<_>>>()?;
    let operation = registry.create(&call.name, &arguments)?;
    Ok(ResolvedStep {
        call: call.clone(),
        arguments,
        operation,
    })
}

/// Resolves both chains of `parsed`, failing on the first call, in source
/// order, that cannot be resolved.
pub fn build(parsed: &ParseResult, registry: &ActionRegistry) -> FormsetResult<ResolvedChains> {
    let resolve_chain = |chain: &[ActionCall]| {
        chain
            .iter()
            .map(|call| resolve(call, registry))
            .collect::<FormsetResult<Vec<_>>>()
    };
    let chains = ResolvedChains {
        success: resolve_chain(&parsed.success_chain)?,
        reject: resolve_chain(&parsed.reject_chain)?,
    };
    tracing::debug!(
        success = chains.success.len(),
        reject = chains.reject.len(),
        "built action chains"
    );
    Ok(chains)
}
