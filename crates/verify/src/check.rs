//! Pass/fail records produced by every scenario

use crate::transport::{Body, Exchange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    Skip,
}

/// What a check compared
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    /// HTTP status against a set of acceptable codes. The body is kept only
    /// when the check failed.
    Status {
        status: u16,
        expected: Vec<u16>,
        body: Option<Body>,
    },
    /// Field value against an exact expected string
    Value {
        expected: String,
        observed: Option<String>,
    },
    /// Free-form condition, e.g. a search hit
    Condition { note: String },
    /// Not attempted because a prerequisite was missing
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub name: String,
    pub verdict: Verdict,
    pub detail: Detail,
}

impl Check {
    pub fn status(name: impl Into<String>, exchange: &Exchange, expected: &[u16]) -> Self {
        let passed = expected.contains(&exchange.status);
        Self {
            name: name.into(),
            verdict: if passed { Verdict::Pass } else { Verdict::Fail },
            detail: Detail::Status {
                status: exchange.status,
                expected: expected.to_vec(),
                body: (!passed).then(|| exchange.body.clone()),
            },
        }
    }

    pub fn value(name: impl Into<String>, expected: &str, observed: Option<&str>) -> Self {
        let passed = observed == Some(expected);
        Self {
            name: name.into(),
            verdict: if passed { Verdict::Pass } else { Verdict::Fail },
            detail: Detail::Value {
                expected: expected.to_string(),
                observed: observed.map(str::to_string),
            },
        }
    }

    pub fn condition(name: impl Into<String>, passed: bool, note: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdict: if passed { Verdict::Pass } else { Verdict::Fail },
            detail: Detail::Condition { note: note.into() },
        }
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdict: Verdict::Skip,
            detail: Detail::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    pub fn failed(&self) -> bool {
        self.verdict == Verdict::Fail
    }
}

/// Checks grouped under one heading
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub checks: Vec<Check>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            checks: Vec::new(),
        }
    }

    pub fn push(&mut self, check: Check) -> bool {
        let passed = check.passed();
        self.checks.push(check);
        passed
    }

    pub fn failures(&self) -> usize {
        self.checks.iter().filter(|c| c.failed()).count()
    }
}
