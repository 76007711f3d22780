//! Registry of web-triggered send attempts.
//!
//! At most one job runs at a time. Finished jobs stay readable until
//! `history` newer ones have been started.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use {
    serde::Serialize,
    tracing::{debug, info},
    whatsend_whatsapp::{SendError, SendReport, StatusEvent, StatusSink, StatusUpdate},
};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    Succeeded,
    Failed,
}

/// What `GET /api/jobs/{id}` returns.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub id: String,
    pub state: JobState,
    pub statuses: Vec<StatusEvent>,
    pub qr_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SendReport>,
}

#[derive(Debug)]
struct JobInner {
    state: JobState,
    statuses: Vec<StatusEvent>,
    qr_code: Option<String>,
    report: Option<SendReport>,
}

/// One send attempt. Doubles as the status sink for its run.
#[derive(Debug)]
pub struct Job {
    id: String,
    inner: Mutex<JobInner>,
}

impl Job {
    fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            inner: Mutex::new(JobInner {
                state: JobState::Running,
                statuses: Vec::new(),
                qr_code: None,
                report: None,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> JobState {
        self.lock().state
    }

    pub fn view(&self) -> JobView {
        let inner = self.lock();
        JobView {
            id: self.id.clone(),
            state: inner.state,
            statuses: inner.statuses.clone(),
            qr_code: inner.qr_code.clone(),
            report: inner.report.clone(),
        }
    }

    /// Record the outcome. The QR code is dropped either way.
    pub fn finish(&self, result: Result<SendReport, SendError>) {
        let mut inner = self.lock();
        inner.qr_code = None;
        match result {
            Ok(report) => {
                inner.state = JobState::Succeeded;
                inner.report = Some(report);
            },
            Err(_) => inner.state = JobState::Failed,
        }
        info!(job = %self.id, state = ?inner.state, "job finished");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JobInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StatusSink for Job {
    fn publish(&self, update: StatusUpdate) {
        let mut inner = self.lock();
        match update {
            StatusUpdate::Status(event) => {
                debug!(job = %self.id, level = %event.level, message = %event.message, "job status");
                inner.statuses.push(event);
            },
            StatusUpdate::QrCode(qr) => inner.qr_code = qr,
        }
    }
}

pub struct JobRegistry {
    jobs: Mutex<VecDeque<Arc<Job>>>,
    history: usize,
}

impl JobRegistry {
    pub fn new(history: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            history: history.max(1),
        }
    }

    /// Register a new running job, unless one is already running.
    pub fn start(&self) -> Result<Arc<Job>, Error> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = jobs.iter().find(|j| j.state() == JobState::Running) {
            return Err(Error::Busy {
                job_id: running.id.clone(),
            });
        }

        let job = Arc::new(Job::new());
        jobs.push_back(Arc::clone(&job));
        while jobs.len() > self.history {
            jobs.pop_front();
        }
        info!(job = %job.id, "job started");
        Ok(job)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Job>> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|j| j.id == id)
            .cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        whatsend_whatsapp::{LoginOutcome, StatusLevel},
    };

    fn report() -> SendReport {
        SendReport {
            contact: "Guilherme".into(),
            login: LoginOutcome::AlreadyLoggedIn,
            duration_ms: 12,
        }
    }

    #[test]
    fn second_job_refused_while_first_runs() {
        let registry = JobRegistry::new(4);
        let first = registry.start().unwrap();

        match registry.start() {
            Err(Error::Busy { job_id }) => assert_eq!(job_id, first.id()),
            other => panic!("expected busy, got {other:?}"),
        }

        first.finish(Ok(report()));
        assert!(registry.start().is_ok());
    }

    #[test]
    fn history_is_bounded() {
        let registry = JobRegistry::new(2);
        let mut ids = Vec::new();
        for _ in 0..3 {
            let job = registry.start().unwrap();
            ids.push(job.id().to_string());
            job.finish(Err(SendError::MessageBoxNotFound));
        }

        assert!(registry.get(&ids[0]).is_none());
        assert!(registry.get(&ids[1]).is_some());
        assert!(registry.get(&ids[2]).is_some());
    }

    #[test]
    fn job_collects_statuses_and_qr() {
        let registry = JobRegistry::new(4);
        let job = registry.start().unwrap();

        job.info("checking login status");
        job.qr_code(Some("data:image/png;base64,AA==".into()));
        let view = job.view();
        assert_eq!(view.state, JobState::Running);
        assert_eq!(view.statuses[0].level, StatusLevel::Info);
        assert!(view.qr_code.is_some());

        job.finish(Err(SendError::ContactNotFound("x".into())));
        let view = registry.get(job.id()).unwrap().view();
        assert_eq!(view.state, JobState::Failed);
        assert!(view.qr_code.is_none());
        assert!(view.report.is_none());
    }

    #[test]
    fn view_serializes_lowercase_state() {
        let job = Job::new();
        job.finish(Ok(report()));
        let json = serde_json::to_value(job.view()).unwrap();
        assert_eq!(json["state"], "succeeded");
        assert_eq!(json["report"]["login"], "already_logged_in");
        assert!(json["qr_code"].is_null());
    }
}
