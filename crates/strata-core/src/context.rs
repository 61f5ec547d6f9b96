//! Per-request execution context
//!
//! A [`Context`] travels alongside the request through every handler of a
//! chain. It carries the request deadline; handlers that perform I/O should
//! run it through [`Context::run`] so the deadline is honoured. The chain
//! itself never checks the deadline between steps.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Execution context of a single request
#[derive(Clone, Debug, Default)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// A context without deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that expires after `timeout`
    ///
    /// If this context already has an earlier deadline, that one is kept. A
    /// timeout too large to be represented leaves the context unchanged.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Derive a context that expires at `deadline`
    ///
    /// If this context already has an earlier deadline, that one is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
        }
    }

    /// The instant at which this context expires, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` if there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns true once the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// Drive `fut` to completion unless the deadline passes first
    pub async fn run<F>(&self, fut: F) -> Result<F::Output>
    where
        F: Future,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| Error::DeadlineExceeded),
            None => Ok(fut.await),
        }
    }
}
