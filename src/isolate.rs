//! Worker isolation for run execution
//!
//! Runs execute on dedicated worker threads so a slow or pathological input
//! cannot stall the caller's loop. Workers are spawned lazily, one for the
//! dynamic VM and one for the heuristic simulator, and speak a small
//! id-tagged request/response protocol over channels. A response whose id
//! does not match the request in flight is stale (from an abandoned run) and
//! is dropped. If a worker cannot be spawned or has died, the dispatcher
//! falls back to executing synchronously on the calling thread; callers
//! cannot observe which mode served them.

use crate::language::Language;
use crate::sim::{self, SimStrategy};
use crate::step::ExecutionStep;
use crate::vm;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

enum Request {
    Vm {
        id: u64,
        code: String,
    },
    Sim {
        id: u64,
        code: String,
        language: Language,
        strategy: SimStrategy,
    },
}

struct Response {
    id: u64,
    result: Result<Vec<ExecutionStep>, String>,
}

struct Worker {
    req_tx: Sender<Request>,
    resp_rx: Receiver<Response>,
}

enum WorkerSlot {
    Untried,
    Ready(Worker),
    Unavailable,
}

pub struct IsolationDispatcher {
    vm_worker: WorkerSlot,
    sim_worker: WorkerSlot,
    next_id: u64,
}

impl IsolationDispatcher {
    pub fn new() -> Self {
        IsolationDispatcher {
            vm_worker: WorkerSlot::Untried,
            sim_worker: WorkerSlot::Untried,
            next_id: 0,
        }
    }

    pub fn run_vm(&mut self, code: &str) -> Result<Vec<ExecutionStep>, String> {
        let id = self.fresh_id();
        let request = Request::Vm {
            id,
            code: code.to_string(),
        };
        match dispatch(&mut self.vm_worker, "steplab-vm", id, request) {
            Some(result) => result,
            None => run_vm_sync(code),
        }
    }

    pub fn run_sim(
        &mut self,
        code: &str,
        language: Language,
        strategy: SimStrategy,
    ) -> Result<Vec<ExecutionStep>, String> {
        let id = self.fresh_id();
        let request = Request::Sim {
            id,
            code: code.to_string(),
            language,
            strategy,
        };
        match dispatch(&mut self.sim_worker, "steplab-sim", id, request) {
            Some(result) => result,
            None => sim::execute(code, language, strategy),
        }
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Default for IsolationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Send a request to the slot's worker and wait for the matching response.
/// `None` means the worker path is unusable and the caller must run
/// synchronously.
fn dispatch(
    slot: &mut WorkerSlot,
    name: &str,
    id: u64,
    request: Request,
) -> Option<Result<Vec<ExecutionStep>, String>> {
    if let WorkerSlot::Untried = slot {
        *slot = match spawn_worker(name) {
            Some(worker) => WorkerSlot::Ready(worker),
            None => WorkerSlot::Unavailable,
        };
    }

    let WorkerSlot::Ready(worker) = slot else {
        return None;
    };

    if worker.req_tx.send(request).is_err() {
        tracing::warn!(worker = name, "worker is gone; running synchronously");
        *slot = WorkerSlot::Unavailable;
        return None;
    }

    loop {
        match worker.resp_rx.recv() {
            Ok(response) if response.id == id => return Some(response.result),
            Ok(response) => {
                tracing::debug!(
                    worker = name,
                    stale = response.id,
                    expected = id,
                    "dropping stale worker response"
                );
            }
            Err(_) => {
                tracing::warn!(worker = name, "worker died mid-run; running synchronously");
                *slot = WorkerSlot::Unavailable;
                return None;
            }
        }
    }
}

fn spawn_worker(name: &str) -> Option<Worker> {
    let (req_tx, req_rx) = mpsc::channel::<Request>();
    let (resp_tx, resp_rx) = mpsc::channel::<Response>();

    let spawned = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || worker_loop(req_rx, resp_tx));

    match spawned {
        Ok(_) => Some(Worker { req_tx, resp_rx }),
        Err(e) => {
            tracing::warn!(worker = name, error = %e, "failed to spawn worker thread");
            None
        }
    }
}

fn worker_loop(req_rx: Receiver<Request>, resp_tx: Sender<Response>) {
    while let Ok(request) = req_rx.recv() {
        let (id, result) = match request {
            Request::Vm { id, code } => (id, run_vm_sync(&code)),
            Request::Sim {
                id,
                code,
                language,
                strategy,
            } => (id, sim::execute(&code, language, strategy)),
        };
        if resp_tx.send(Response { id, result }).is_err() {
            break;
        }
    }
}

fn run_vm_sync(code: &str) -> Result<Vec<ExecutionStep>, String> {
    vm::run_dynamic(code).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::ScopeValue;

    #[test]
    fn vm_run_through_worker() {
        let mut dispatcher = IsolationDispatcher::new();
        let steps = dispatcher.run_vm("var a = 1;\nconsole.log(a);").unwrap();
        let last = steps.last().unwrap();
        assert_eq!(last.final_output(), Some("1"));
    }

    #[test]
    fn vm_error_propagates_as_message() {
        let mut dispatcher = IsolationDispatcher::new();
        let err = dispatcher.run_vm("missing();").unwrap_err();
        assert!(err.contains("missing is not a function"));
    }

    #[test]
    fn sim_run_through_worker() {
        let mut dispatcher = IsolationDispatcher::new();
        let steps = dispatcher
            .run_sim("a = 1\nprint(a)", Language::Python, SimStrategy::LinePattern)
            .unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].scope().log, vec![ScopeValue::Num(1.0)]);
    }

    #[test]
    fn sequential_runs_reuse_the_worker() {
        let mut dispatcher = IsolationDispatcher::new();
        for i in 0..3 {
            let code = format!("var a = {};", i);
            let steps = dispatcher.run_vm(&code).unwrap();
            assert_eq!(steps.len(), 1);
            assert_eq!(
                steps[0].scope().vars.get("a"),
                Some(&ScopeValue::Num(i as f64))
            );
        }
    }

    #[test]
    fn sync_fallback_matches_worker_output() {
        let code = "var a = 2;\nconsole.log(a * 3);";
        let via_worker = IsolationDispatcher::new().run_vm(code).unwrap();
        let direct = run_vm_sync(code).unwrap();
        assert_eq!(via_worker, direct);
    }
}
