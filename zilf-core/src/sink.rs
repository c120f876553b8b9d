// zilf-core - Diagnostic sinks
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Receivers for recoverable errors.
//!
//! Expansion keeps going after a bad subform. The error is handed to the
//! context's sink along with the source position of the value that failed,
//! and the host decides what to do with it.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use zilf_value::SourceLine;

use crate::error::Error;

/// Something that receives recoverable errors.
pub trait ErrorSink {
    fn report(&mut self, error: &Error, source: &SourceLine);
}

/// Logs each error at `warn` level. The default sink.
#[derive(Debug, Default)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&mut self, error: &Error, source: &SourceLine) {
        warn!("{}: {}", source, error);
    }
}

/// Collects errors into a shared list the host can inspect afterwards.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    reports: Rc<RefCell<Vec<(Error, SourceLine)>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far.
    #[must_use]
    pub fn reports(&self) -> Vec<(Error, SourceLine)> {
        self.reports.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.reports.borrow_mut().clear();
    }
}

impl ErrorSink for CollectingSink {
    fn report(&mut self, error: &Error, source: &SourceLine) {
        self.reports
            .borrow_mut()
            .push((error.clone(), source.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_shares_reports() {
        let sink = CollectingSink::new();
        let mut handle = sink.clone();
        handle.report(
            &Error::Internal("boom".into()),
            &SourceLine::file("x.zil", 2),
        );
        assert_eq!(sink.len(), 1);
        let (err, at) = &sink.reports()[0];
        assert_eq!(err, &Error::Internal("boom".into()));
        assert_eq!(at, &SourceLine::file("x.zil", 2));

        sink.clear();
        assert!(sink.is_empty());
    }
}
