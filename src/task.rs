//! Background Task
//!
//! Runs a closure on its own thread and hands back a handle to poll or
//! block on. Tasks cannot be cancelled; once started they run to completion.

use crate::error::TaskError;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

#[derive(Debug)]
pub struct BackgroundTask<T> {
    handle: Option<JoinHandle<T>>,
    result: Option<T>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub fn start<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        debug!("Starting background task");
        BackgroundTask {
            handle: Some(thread::spawn(work)),
            result: None,
        }
    }

    /// Non-blocking completion check.
    pub fn is_done(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => true,
        }
    }

    /// Block until the task finishes and take its result.
    pub fn wait(mut self) -> Result<T, TaskError> {
        self.collect()?;
        self.result.take().ok_or(TaskError::Panicked)
    }

    /// Result of a finished task, or `NotYetDone` while it is still running.
    pub fn try_result(&mut self) -> Result<&T, TaskError> {
        if !self.is_done() {
            return Err(TaskError::NotYetDone);
        }
        self.collect()?;
        self.result.as_ref().ok_or(TaskError::Panicked)
    }

    fn collect(&mut self) -> Result<(), TaskError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(value) => self.result = Some(value),
                Err(_) => {
                    error!("Background task panicked");
                    return Err(TaskError::Panicked);
                }
            }
        }
        Ok(())
    }
}
