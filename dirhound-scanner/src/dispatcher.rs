use crate::cancel::CancelSignal;
use crate::error::{ProbeFailure, Result};
use crate::extract::is_static_asset;
use crate::observer::{NoopObserver, ScanObserver, ScanPhase};
use crate::policy::RequestPolicy;
use crate::probe::{ProbeOutcome, probe};
use crate::ratelimit::RateLimiter;
use crate::result::{Candidate, ResultSet};
use crate::transport::{ReqwestTransport, Transport};
use rand::seq::IndexedRandom;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "dirhound/0.1 (+https://github.com/dirhound/dirhound)";

/// Everything a finished (or interrupted) scan hands back.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub results: ResultSet,
    /// Candidates that never got an answer after all attempts.
    pub failed: usize,
    /// Requests actually sent, retries included.
    pub probed: usize,
    pub elapsed: Duration,
    /// `Completed` or `Cancelled`.
    pub phase: ScanPhase,
}

pub struct Dispatcher {
    policy: Arc<RequestPolicy>,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn ScanObserver>,
}

impl Dispatcher {
    pub fn new(policy: RequestPolicy, transport: Arc<dyn Transport>) -> Self {
        Self {
            policy: Arc::new(policy),
            transport,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Dispatcher backed by a `reqwest` client built from the policy.
    pub fn with_http_client(policy: RequestPolicy) -> Result<Self> {
        let transport = ReqwestTransport::new(&policy)?;
        Ok(Self::new(policy, Arc::new(transport)))
    }

    /// Attach an observer. It sees `Idle` right away, then every phase of each run.
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        observer.on_phase(ScanPhase::Idle);
        self.observer = observer;
        self
    }

    /// Probe every candidate and return what matched.
    ///
    /// Per-request failures are counted in the report, never returned as
    /// errors. Cancelling `cancel` stops new work; requests already on the
    /// wire are allowed to finish and the partial results come back as a
    /// normal report with phase `Cancelled`.
    pub async fn run<I, S>(
        &self,
        candidates: I,
        user_agents: Vec<String>,
        cancel: CancelSignal,
    ) -> Result<ScanReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let start = Instant::now();
        self.observer.on_phase(ScanPhase::Loading);

        let user_agents = if user_agents.is_empty() {
            vec![DEFAULT_USER_AGENT.to_string()]
        } else {
            user_agents
        };

        let mut visited = HashSet::new();
        let mut pending = VecDeque::new();
        for raw in candidates {
            let path = raw.as_ref().trim();
            if path.is_empty() {
                continue;
            }
            if visited.insert(visit_key(&self.policy.join(path))) {
                pending.push_back(Candidate::new(path, 0));
            } else {
                debug!("Skipping duplicate candidate {}", path);
            }
        }

        info!(
            "Scanning {} with {} candidates, {} workers",
            self.policy.base_url(),
            pending.len(),
            self.policy.concurrency()
        );

        let shared = Arc::new(Shared {
            policy: self.policy.clone(),
            transport: self.transport.clone(),
            observer: self.observer.clone(),
            user_agents,
            queue: Mutex::new(WorkQueue {
                pending,
                in_flight: 0,
                phase: ScanPhase::Running,
            }),
            wake: Notify::new(),
            visited: Mutex::new(visited),
            results: Mutex::new(ResultSet::new()),
            failed: AtomicUsize::new(0),
            probed: AtomicUsize::new(0),
            limiter: self.policy.rate_limit().map(RateLimiter::per_second).transpose()?,
            cancel,
        });
        self.observer.on_phase(ScanPhase::Running);

        let mut workers = JoinSet::new();
        for worker_id in 0..self.policy.concurrency() {
            let shared = shared.clone();
            workers.spawn(async move {
                debug!("Worker {} started", worker_id);
                while let Some(candidate) = shared.next_candidate().await {
                    shared.process(candidate).await;
                    shared.finish_task().await;
                }
                debug!("Worker {} finished", worker_id);
            });
        }

        // A crashed worker never releases its in-flight slot, so stop the
        // others instead of letting them wait for it.
        let mut crashed = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Worker crashed: {}", e);
                shared.cancel.cancel();
                crashed.get_or_insert(e);
            }
        }
        if let Some(e) = crashed {
            return Err(e.into());
        }

        let phase = {
            let mut queue = shared.queue.lock().await;
            if !queue.phase.is_finished() {
                shared.set_phase(&mut queue, ScanPhase::Cancelled);
            }
            queue.phase
        };

        let results = std::mem::take(&mut *shared.results.lock().await);
        let report = ScanReport {
            failed: shared.failed.load(Ordering::SeqCst),
            probed: shared.probed.load(Ordering::SeqCst),
            elapsed: start.elapsed(),
            phase,
            results,
        };

        info!(
            "Scan {} in {:.2?}: {} matches, {} failed, {} requests",
            report.phase,
            report.elapsed,
            report.results.len(),
            report.failed,
            report.probed
        );

        Ok(report)
    }
}

struct WorkQueue {
    pending: VecDeque<Candidate>,
    in_flight: usize,
    phase: ScanPhase,
}

struct Shared {
    policy: Arc<RequestPolicy>,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn ScanObserver>,
    user_agents: Vec<String>,
    queue: Mutex<WorkQueue>,
    wake: Notify,
    visited: Mutex<HashSet<String>>,
    results: Mutex<ResultSet>,
    failed: AtomicUsize,
    probed: AtomicUsize,
    limiter: Option<RateLimiter>,
    cancel: CancelSignal,
}

impl Shared {
    fn set_phase(&self, queue: &mut WorkQueue, phase: ScanPhase) {
        if queue.phase != phase {
            queue.phase = phase;
            self.observer.on_phase(phase);
        }
    }

    /// Wait for the next candidate. `None` means this worker should exit:
    /// either everything is done or the scan was cancelled.
    async fn next_candidate(&self) -> Option<Candidate> {
        loop {
            // registered before the check so a wakeup between the check and
            // the await is not lost
            let notified = self.wake.notified();
            {
                let mut queue = self.queue.lock().await;
                if queue.pending.is_empty() && queue.in_flight == 0 {
                    let done = if self.cancel.is_cancelled() {
                        ScanPhase::Cancelled
                    } else {
                        ScanPhase::Completed
                    };
                    self.set_phase(&mut queue, done);
                    self.wake.notify_waiters();
                    return None;
                }
                if self.cancel.is_cancelled() {
                    return None;
                }
                if let Some(candidate) = queue.pending.pop_front() {
                    queue.in_flight += 1;
                    return Some(candidate);
                }
                self.set_phase(&mut queue, ScanPhase::Draining);
            }

            tokio::select! {
                _ = notified => {}
                _ = self.cancel.cancelled() => {}
            }
        }
    }

    async fn finish_task(&self) {
        let idle = {
            let mut queue = self.queue.lock().await;
            queue.in_flight -= 1;
            queue.pending.is_empty()
        };
        if idle {
            self.wake.notify_waiters();
        }
    }

    async fn enqueue(&self, candidates: Vec<Candidate>) {
        {
            let mut queue = self.queue.lock().await;
            queue.pending.extend(candidates);
            if queue.phase == ScanPhase::Draining {
                self.set_phase(&mut queue, ScanPhase::Running);
            }
        }
        self.wake.notify_waiters();
    }

    fn user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Run up to `1 + retries` attempts for one candidate.
    async fn process(&self, candidate: Candidate) {
        let url = self.policy.join(&candidate.path);
        let mut last_failure = ProbeFailure::Cancelled;

        for attempt in 0..=self.policy.retries() {
            if attempt > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(self.policy.retry_backoff()) => {}
                    _ = self.cancel.cancelled() => {
                        last_failure = ProbeFailure::Cancelled;
                        break;
                    }
                }
            }

            if let Some(limiter) = &self.limiter {
                tokio::select! {
                    _ = limiter.acquire() => {}
                    _ = self.cancel.cancelled() => {
                        last_failure = ProbeFailure::Cancelled;
                        break;
                    }
                }
            }

            if self.cancel.is_cancelled() {
                last_failure = ProbeFailure::Cancelled;
                break;
            }

            self.observer.on_probe(&url);
            self.probed.fetch_add(1, Ordering::SeqCst);

            match probe(
                self.transport.as_ref(),
                &self.policy,
                &candidate.path,
                self.user_agent(),
            )
            .await
            {
                Ok(Some(outcome)) => {
                    self.record(candidate.depth, outcome).await;
                    return;
                }
                Ok(None) => return,
                Err(failure) => {
                    debug!("Attempt {} for {} failed: {}", attempt + 1, url, failure);
                    let retryable = failure.is_retryable();
                    last_failure = failure;
                    if !retryable {
                        break;
                    }
                }
            }
        }

        self.failed.fetch_add(1, Ordering::SeqCst);
        if last_failure != ProbeFailure::Cancelled {
            warn!("Giving up on {}: {}", url, last_failure);
        }
        self.observer.on_failure(&url, &last_failure);
    }

    async fn record(&self, depth: usize, outcome: ProbeOutcome) {
        let ProbeOutcome { result, links } = outcome;

        let inserted = self.results.lock().await.insert(result.clone());
        if inserted {
            self.observer.on_match(&result);
        }

        let next_depth = depth + 1;
        if !self.policy.crawl() || next_depth > self.policy.crawl_depth() || links.is_empty() {
            return;
        }

        let mut discovered = Vec::new();
        {
            let mut visited = self.visited.lock().await;
            for link in links {
                if is_static_asset(&link) {
                    continue;
                }
                let Some(path) = self.relative_path(&link) else {
                    continue;
                };
                if visited.insert(visit_key(&self.policy.join(&path))) {
                    discovered.push(Candidate::new(path, next_depth));
                }
            }
        }

        if !discovered.is_empty() {
            debug!(
                "{} new candidates at depth {} from {}",
                discovered.len(),
                next_depth,
                result.url
            );
            self.enqueue(discovered).await;
        }
    }

    /// Path of `link` below the base URL, or `None` when it lives outside it.
    fn relative_path(&self, link: &Url) -> Option<String> {
        let rest = link.as_str().strip_prefix(self.policy.base_url())?;
        let path = rest.strip_prefix('/')?;
        if path.is_empty() {
            None
        } else {
            Some(path.to_string())
        }
    }
}

fn visit_key(url: &str) -> String {
    Url::parse(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}
