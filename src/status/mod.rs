// src/status/mod.rs
use hyper::StatusCode;

use crate::check::Check;

/// The overall service verdict: an HTTP status code plus the label reported
/// in the body's `status` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: StatusCode,
    pub name: String,
}

impl Status {
    pub fn new(code: StatusCode, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
        }
    }

    pub fn pass() -> Self {
        Self::new(StatusCode::OK, "pass")
    }

    pub fn warn() -> Self {
        Self::new(StatusCode::OK, "warn")
    }

    pub fn fail() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "fail")
    }
}

/// The three statuses an aggregation run can resolve to. Callers may replace
/// any of them to change codes or labels (e.g. `Status::new(200, "ok")`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPolicy {
    pub pass: Status,
    pub warn: Status,
    pub fail: Status,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            pass: Status::pass(),
            warn: Status::warn(),
            fail: Status::fail(),
        }
    }
}

impl StatusPolicy {
    /// Reduce a flat collection of checks to one status.
    ///
    /// Fail dominates: the first check whose status matches the fail name
    /// short-circuits. Warn is only reported when unanimous across a
    /// non-empty collection; an empty collection or any pass-equivalent
    /// entry resolves to pass.
    pub fn aggregate<'a, I>(&self, checks: I) -> Status
    where
        I: IntoIterator<Item = &'a Check>,
    {
        let mut total = 0usize;
        let mut warns = 0usize;
        for check in checks {
            total += 1;
            match check.status.as_deref() {
                Some(status) if status == self.fail.name => return self.fail.clone(),
                Some(status) if status == self.warn.name => warns += 1,
                _ => {}
            }
        }
        if total > 0 && warns == total {
            self.warn.clone()
        } else {
            self.pass.clone()
        }
    }
}
