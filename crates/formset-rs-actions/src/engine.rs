//! Chain execution.
//!
//! A chain runs its steps strictly in order; each step starts only after the
//! previous one has settled and receives its output. The first rejection
//! stops the success chain and hands the rejection to the reject chain. An
//! abort stops everything. Whatever the outcome, the button is restored
//! exactly once when the activation settles.

use serde::Serialize;

use crate::builder::{ResolvedChains, ResolvedStep};
use crate::button::ButtonContext;
use crate::formset::Response;
use crate::registry::{Rejection, StepFailure, StepInput, StepResult};

/// How one activation of a button settled.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// The success chain ran to its end.
    Fulfilled(StepInput),
    /// The success chain rejected and the reject chain ran to its end.
    Recovered(StepInput),
    /// A rejection was not recovered: either there was no reject chain, or
    /// the reject chain rejected too.
    Rejected(Rejection),
    /// The activation was aborted.
    Aborted,
    /// The activation was not started because another one was pending.
    Skipped,
}

impl Activation {
    /// Returns `true` if the success chain completed.
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    /// The final response handed along a completed chain, if any.
    pub const fn response(&self) -> Option<&Response> {
        match self {
            Self::Fulfilled(Some(response)) | Self::Recovered(Some(response)) => Some(response),
            _ => None,
        }
    }

    /// A short name of the outcome, for logs and reports.
    pub const fn outcome(&self) -> Outcome {
        match self {
            Self::Fulfilled(_) => Outcome::Fulfilled,
            Self::Recovered(_) => Outcome::Recovered,
            Self::Rejected(_) => Outcome::Rejected,
            Self::Aborted => Outcome::Aborted,
            Self::Skipped => Outcome::Skipped,
        }
    }
}

/// The kind of an [`Activation`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Fulfilled,
    Recovered,
    Rejected,
    Aborted,
    Skipped,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Fulfilled => "fulfilled",
            Self::Recovered => "recovered",
            Self::Rejected => "rejected",
            Self::Aborted => "aborted",
            Self::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Runs `steps` in order, threading each output into the next step.
pub async fn run_chain(steps: &[ResolvedStep], ctx: &ButtonContext, input: StepInput) -> StepResult {
    let mut value = input;
    for (index, step) in steps.iter().enumerate() {
        tracing::debug!(index, step = %step.call, "running step");
        value = step.operation.run(ctx, value).await.map_err(|failure| {
            tracing::debug!(index, step = %step.call, ?failure, "step failed");
            failure
        })?;
    }
    Ok(value)
}

/// Restores the button when dropped, so cleanup also happens when the
/// activation future itself is dropped mid-chain.
struct Settle<'a>(&'a ButtonContext);

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        self.0.restore();
    }
}

/// Runs one activation: the success chain, then the reject chain if the
/// success chain rejected, then cleanup.
pub async fn execute(chains: &ResolvedChains, ctx: &ButtonContext) -> Activation {
    let _settle = Settle(ctx);

    let activation = match run_chain(&chains.success, ctx, None).await {
        Ok(value) => Activation::Fulfilled(value),
        Err(StepFailure::Aborted) => Activation::Aborted,
        Err(StepFailure::Rejected(rejection)) if chains.reject.is_empty() => {
            Activation::Rejected(rejection)
        }
        Err(StepFailure::Rejected(rejection)) => {
            tracing::debug!(%rejection, "running reject chain");
            match run_chain(&chains.reject, ctx, rejection.into_input()).await {
                Ok(value) => Activation::Recovered(value),
                Err(StepFailure::Aborted) => Activation::Aborted,
                Err(StepFailure::Rejected(rejection)) => Activation::Rejected(rejection),
            }
        }
    };

    tracing::debug!(outcome = %activation.outcome(), "activation settled");
    activation
}
