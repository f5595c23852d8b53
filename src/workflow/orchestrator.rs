use super::{
    CombinedResult, FanOutTask, PartialResult, ProgressEvent, ProgressSink, RunPhase, TaskName,
    TaskOutcome, WorkflowDefinition, WorkflowState,
};
use crate::bundle::InputBundle;
use crate::error::WorkflowError;
use crate::provider::CompletionPort;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Message a fan-out task sends when it settles or fails
struct Settlement {
    task: TaskName,
    outcome: Result<TaskOutcome<PartialResult>, WorkflowError>,
    elapsed: Duration,
}

/// Aborts still-running fan-out tasks once the run stops listening.
struct InFlight(Vec<JoinHandle<()>>);

impl Drop for InFlight {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

pub struct Orchestrator {
    definition: Arc<WorkflowDefinition>,
    port: Arc<dyn CompletionPort>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(
        definition: WorkflowDefinition,
        port: Arc<dyn CompletionPort>,
        concurrency: usize,
    ) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            definition: Arc::new(definition),
            port,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    /// Run every fan-out task, then the join task.
    ///
    /// Emits one `Processing` event first, one `Done(task)` per settled
    /// fan-out task in settle order, and one final `Done` after the join.
    /// The first error ends the run; nothing after it is emitted.
    pub async fn run(
        &self,
        bundle: InputBundle,
        sink: &dyn ProgressSink,
    ) -> Result<CombinedResult, WorkflowError> {
        let run_id = Uuid::new_v4();
        let start = Instant::now();
        let mut state = WorkflowState::new(bundle);

        sink.emit(ProgressEvent::started());
        state.transition(RunPhase::FanOutRunning)?;

        info!(
            "Run {} starting {} analyses with concurrency {}",
            run_id,
            self.definition.fan_out().len(),
            self.concurrency
        );

        if let Err(e) = self.fan_out(&mut state, sink).await {
            error!("Run {} failed in {:?}: {}", run_id, state.phase(), e);
            state.fail();
            return Err(e);
        }

        state.transition(RunPhase::Joining)?;
        let missing = state.results.missing(&self.definition.task_names());
        if !missing.is_empty() {
            state.fail();
            return Err(WorkflowError::Internal(format!(
                "join reached with unsettled tasks: {:?}",
                missing
            )));
        }

        let joined = self
            .definition
            .join()
            .run(
                &state.results,
                state.input.subject_profile.as_ref(),
                self.port.as_ref(),
            )
            .await;
        let clinical = match joined {
            Ok(clinical) => clinical,
            Err(e) => {
                error!("Run {} failed in {:?}: {}", run_id, state.phase(), e);
                state.fail();
                return Err(e);
            }
        };

        state.transition(RunPhase::Completed)?;
        sink.emit(ProgressEvent::finished());

        info!(
            "Run {} completed in {:.1}s: {} of {} analyses produced ({:?})",
            run_id,
            start.elapsed().as_secs_f64(),
            state.results.produced_count(),
            state.results.len(),
            clinical.data_completeness
        );

        Ok(CombinedResult::assemble(state.results, clinical, &state.input))
    }

    async fn fan_out(
        &self,
        state: &mut WorkflowState,
        sink: &dyn ProgressSink,
    ) -> Result<(), WorkflowError> {
        let declared = self.definition.task_names();
        let (tx, mut rx) = mpsc::unbounded_channel::<Settlement>();
        let mut handles = Vec::with_capacity(declared.len());

        for task in self.definition.fan_out() {
            let task: Arc<dyn FanOutTask> = Arc::clone(task);
            let bundle = Arc::clone(&state.input);
            let port = Arc::clone(&self.port);
            let semaphore = Arc::clone(&self.semaphore);
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                let id = task.id();
                let started = Instant::now();
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => AssertUnwindSafe(task.settle(&bundle, port.as_ref()))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            Err(WorkflowError::TaskAborted {
                                task: id,
                                message: panic_message(panic.as_ref()),
                            })
                        }),
                    Err(e) => Err(WorkflowError::Internal(format!(
                        "semaphore closed: {}",
                        e
                    ))),
                };
                // Receiver is gone if a sibling already failed the run
                let _ = tx.send(Settlement {
                    task: id,
                    outcome,
                    elapsed: started.elapsed(),
                });
            }));
        }
        drop(tx);
        let _in_flight = InFlight(handles);

        while state.results.len() < declared.len() {
            let Some(settlement) = rx.recv().await else {
                return Err(WorkflowError::Internal(format!(
                    "fan-out ended with unsettled tasks: {:?}",
                    state.results.missing(&declared)
                )));
            };

            match settlement.outcome {
                Ok(outcome) => {
                    if outcome.is_produced() {
                        info!(
                            "Completed {} in {:.1}s",
                            settlement.task,
                            settlement.elapsed.as_secs_f64()
                        );
                    } else {
                        debug!("Skipped {} - no applicable records", settlement.task);
                    }
                    state.results.record(settlement.task, outcome)?;
                    sink.emit(ProgressEvent::settled(settlement.task));
                }
                Err(e) => {
                    warn!(
                        "{} failed after {:.1}s; abandoning remaining tasks",
                        settlement.task,
                        settlement.elapsed.as_secs_f64()
                    );
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}
