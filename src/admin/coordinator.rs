use super::backend::TableConfigBackend;
use crate::core::{AdminError, Result};
use serde_json::Value;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Level, event};

enum CoordinatorRequest {
    Read {
        primary_key: Value,
        cancel: CancellationToken,
        reply: oneshot::Sender<Result<Option<Value>>>,
    },
    ReadAll {
        cancel: CancellationToken,
        reply: oneshot::Sender<Result<Vec<Value>>>,
    },
    Write {
        primary_key: Value,
        pkey_was_autogenerated: bool,
        new_value: Option<Value>,
        cancel: CancellationToken,
        reply: oneshot::Sender<Result<Option<Value>>>,
    },
}

impl CoordinatorRequest {
    async fn run(self, backend: &TableConfigBackend) {
        // A dropped reply receiver means the caller gave up; nothing to report.
        match self {
            Self::Read {
                primary_key,
                cancel,
                reply,
            } => {
                let _ = reply.send(backend.read_row(&primary_key, &cancel));
            }
            Self::ReadAll { cancel, reply } => {
                let _ = reply.send(backend.read_all_rows(&cancel));
            }
            Self::Write {
                primary_key,
                pkey_was_autogenerated,
                mut new_value,
                cancel,
                reply,
            } => {
                let result = backend
                    .write_row(&primary_key, pkey_was_autogenerated, &mut new_value, &cancel)
                    .await
                    .map(|()| new_value);
                let _ = reply.send(result);
            }
        }
    }
}

/// Owns a [`TableConfigBackend`] on a dedicated task and processes requests
/// one at a time, in arrival order.
pub struct TableConfigCoordinator {
    handle: TableConfigHandle,
    shutdown: CancellationToken,
    join_handle: Option<JoinHandle<()>>,
}

impl TableConfigCoordinator {
    /// Spawns the coordinator task. Must be called within a tokio runtime.
    pub fn spawn(backend: TableConfigBackend) -> Self {
        let (sender, mut receiver) =
            mpsc::channel::<CoordinatorRequest>(backend.config().request_queue_depth.max(1));
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();

        let join_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => {
                        break;
                    }
                    request = receiver.recv() => match request {
                        Some(request) => request.run(&backend).await,
                        None => break,
                    }
                }
            }
            event!(Level::DEBUG, "table config coordinator stopped");
        });

        Self {
            handle: TableConfigHandle { sender },
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    pub fn handle(&self) -> TableConfigHandle {
        self.handle.clone()
    }

    /// Stops accepting requests and waits for the task to finish.
    pub async fn stop(mut self) -> Result<()> {
        self.shutdown.cancel();
        if let Some(join_handle) = self.join_handle.take() {
            join_handle
                .await
                .map_err(|err| AdminError::Coordinator(format!("join: {}", err)))?;
        }
        Ok(())
    }
}

impl Drop for TableConfigCoordinator {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

/// Cloneable entry point into the coordinator from any task.
///
/// Every call waits for the coordinator to pick the request up and finish
/// it. Cancelling before the request is accepted returns
/// [`AdminError::Interrupted`]; afterwards the backend observes the same
/// token, so the reply always reflects whether the write was committed.
#[derive(Clone)]
pub struct TableConfigHandle {
    sender: mpsc::Sender<CoordinatorRequest>,
}

impl TableConfigHandle {
    pub async fn read_row(
        &self,
        primary_key: Value,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>> {
        let (reply, response) = oneshot::channel();
        self.dispatch(
            CoordinatorRequest::Read {
                primary_key,
                cancel: cancel.clone(),
                reply,
            },
            response,
            cancel,
        )
        .await
    }

    pub async fn read_all_rows(&self, cancel: &CancellationToken) -> Result<Vec<Value>> {
        let (reply, response) = oneshot::channel();
        self.dispatch(
            CoordinatorRequest::ReadAll {
                cancel: cancel.clone(),
                reply,
            },
            response,
            cancel,
        )
        .await
    }

    /// Runs [`TableConfigBackend::write_row`] on the coordinator and returns
    /// the stored row (or `None` after a delete).
    pub async fn write_row(
        &self,
        primary_key: Value,
        pkey_was_autogenerated: bool,
        new_value: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>> {
        let (reply, response) = oneshot::channel();
        self.dispatch(
            CoordinatorRequest::Write {
                primary_key,
                pkey_was_autogenerated,
                new_value,
                cancel: cancel.clone(),
                reply,
            },
            response,
            cancel,
        )
        .await
    }

    async fn dispatch<T>(
        &self,
        request: CoordinatorRequest,
        response: oneshot::Receiver<Result<T>>,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let sent = until_cancelled(cancel, self.sender.send(request)).await?;
        sent.map_err(|_| AdminError::Coordinator("request mailbox is closed".to_string()))?;
        // Not raced against `cancel`: the commit may already have happened.
        response.await.map_err(|_| {
            AdminError::Coordinator("request was dropped before completion".to_string())
        })?
    }
}

async fn until_cancelled<F: Future>(cancel: &CancellationToken, future: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AdminError::Interrupted),
        output = future => Ok(output),
    }
}
