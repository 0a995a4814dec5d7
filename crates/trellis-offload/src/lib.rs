// File: crates/trellis-offload/src/lib.rs
// Summary: Dispatch shim: executes offload requests on a background worker
//          when one can be spawned, synchronously in-process otherwise.

use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use trellis_core::protocol::{dispatch, OffloadRequest, OffloadResponse};

/// Executes offload requests. Both implementations route through the same
/// pure `dispatch`, so responses are identical either way.
pub trait Executor: Send + Sync {
    fn execute(&self, request: OffloadRequest) -> OffloadResponse;
}

/// Runs the request inline on the caller's thread.
pub struct InProcessExecutor;

impl Executor for InProcessExecutor {
    fn execute(&self, request: OffloadRequest) -> OffloadResponse {
        dispatch(request)
    }
}

type Job = (OffloadRequest, Sender<OffloadResponse>);

/// Forwards requests to a single worker thread and blocks on the reply.
/// Any channel failure falls back to the in-process path, so callers observe
/// the same responses regardless.
pub struct BackgroundExecutor {
    tx: Mutex<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundExecutor {
    /// Spawn the worker; `None` when the platform refuses a new thread.
    pub fn spawn() -> Option<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name("trellis-offload".to_string())
            .spawn(move || {
                while let Ok((request, reply)) = rx.recv() {
                    // Receiver may have given up; a dead reply channel is fine.
                    let _ = reply.send(dispatch(request));
                }
            })
            .ok()?;
        Some(Self { tx: Mutex::new(tx), worker: Some(handle) })
    }
}

impl Executor for BackgroundExecutor {
    fn execute(&self, request: OffloadRequest) -> OffloadResponse {
        let (reply_tx, reply_rx) = mpsc::channel();
        let sent = {
            let guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
            guard.send((request.clone(), reply_tx)).is_ok()
        };
        if !sent {
            return dispatch(request);
        }
        match reply_rx.recv() {
            Ok(response) => response,
            Err(_) => dispatch(request),
        }
    }
}

impl Drop for BackgroundExecutor {
    fn drop(&mut self) {
        // Swap in a disconnected sender so the worker loop ends, then join.
        let (dead_tx, _) = mpsc::channel::<Job>();
        {
            let mut guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
            *guard = dead_tx;
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// Capability check at construction: background when a worker thread can be
/// spawned, in-process otherwise.
pub fn default_executor() -> Box<dyn Executor> {
    match BackgroundExecutor::spawn() {
        Some(executor) => Box::new(executor),
        None => Box::new(InProcessExecutor),
    }
}
