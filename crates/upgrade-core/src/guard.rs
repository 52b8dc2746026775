//! Proposal-boundary containment for hook futures

use crate::error::{HarnessError, Phase};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use upgrade_proposal::PhaseError;

/// Await a hook, classifying its error and catching panics
///
/// A panicking hook becomes a `PhaseExecution` error in `phase`; it never
/// unwinds past the proposal that raised it.
pub(crate) async fn guarded<T, F>(phase: Phase, hook: F) -> Result<T, HarnessError>
where
    F: Future<Output = Result<T, PhaseError>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(HarnessError::from_phase(phase, error)),
        Err(payload) => Err(HarnessError::PhaseExecution {
            phase,
            message: format!("panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_values_through() {
        let value = guarded(Phase::Setup, async { Ok::<_, PhaseError>(7) }).await;
        assert_eq!(value, Ok(7));
    }

    #[tokio::test]
    async fn panics_become_phase_errors() {
        let err = guarded(Phase::Teardown, async {
            if true {
                panic!("boom");
            }
            Ok::<(), PhaseError>(())
        })
        .await
        .unwrap_err();

        assert_eq!(
            err,
            HarnessError::PhaseExecution {
                phase: Phase::Teardown,
                message: "panicked: boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn formatted_panics_keep_their_message() {
        let id = "p1";
        let err = guarded(Phase::Deploy, async move {
            if !id.is_empty() {
                panic!("{id} exploded");
            }
            Ok::<(), PhaseError>(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "deploy failed: panicked: p1 exploded");
    }
}
