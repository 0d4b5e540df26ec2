//! Compensating rollback for multi-step operations
//!
//! Each successful step pushes an undo action. If a later step fails, the
//! pending actions run in reverse order. Undo failures are logged and never
//! replace the error that triggered the rollback.
//!
//! ```ignore
//! let mut rollback = Rollback::new("provision");
//! create_vhost(&vhost).await?;
//! rollback.push(format!("delete vhost {}", vhost), delete_vhost(vhost.clone()));
//!
//! let outcome = create_user(&user).await;
//! rollback.finish(outcome).await
//! ```

use futures::future::BoxFuture;
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, error, info};

struct UndoStep<'a, E> {
    description: String,
    action: BoxFuture<'a, std::result::Result<(), E>>,
}

/// Ordered stack of undo actions
pub struct Rollback<'a, E> {
    operation: &'static str,
    steps: Vec<UndoStep<'a, E>>,
}

impl<'a, E: Display + Send + 'a> Rollback<'a, E> {
    /// Create an empty stack for the named operation
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            steps: Vec::new(),
        }
    }

    /// Register the undo action of a step that just succeeded.
    ///
    /// The action is not polled until [`Rollback::unwind`] runs it.
    pub fn push<F>(&mut self, description: impl Into<String>, action: F)
    where
        F: Future<Output = std::result::Result<(), E>> + Send + 'a,
    {
        self.steps.push(UndoStep {
            description: description.into(),
            action: Box::pin(action),
        });
    }

    /// Number of pending undo actions
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether there is nothing to undo
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Discard all undo actions; the operation completed.
    pub fn commit(self) {
        debug!(
            operation = self.operation,
            steps = self.steps.len(),
            "Operation committed"
        );
    }

    /// Run all undo actions, most recent first.
    ///
    /// Returns the descriptions of the actions that failed.
    pub async fn unwind(self) -> Vec<String> {
        let operation = self.operation;
        let mut failed = Vec::new();

        for step in self.steps.into_iter().rev() {
            match step.action.await {
                Ok(()) => {
                    info!(operation, step = %step.description, "Rolled back");
                }
                Err(e) => {
                    error!(
                        operation,
                        step = %step.description,
                        error = %e,
                        "Rollback step failed"
                    );
                    failed.push(step.description);
                }
            }
        }

        failed
    }

    /// Commit on success, unwind on failure, and hand back the outcome unchanged.
    pub async fn finish<T, F>(self, outcome: std::result::Result<T, F>) -> std::result::Result<T, F> {
        match outcome {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(err) => {
                self.unwind().await;
                Err(err)
            }
        }
    }
}
