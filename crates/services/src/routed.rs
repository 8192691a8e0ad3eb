use lms_core::routes::Route;
use serde::Serialize;

/// Result of a role-gated operation: the value, or the view the caller
/// should be sent to instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Routed<T> {
    Done(T),
    Redirect(Route),
}

impl<T> Routed<T> {
    #[must_use]
    pub fn done(self) -> Option<T> {
        match self {
            Routed::Done(value) => Some(value),
            Routed::Redirect(_) => None,
        }
    }

    #[must_use]
    pub fn redirect(&self) -> Option<Route> {
        match self {
            Routed::Done(_) => None,
            Routed::Redirect(route) => Some(*route),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Routed<U> {
        match self {
            Routed::Done(value) => Routed::Done(f(value)),
            Routed::Redirect(route) => Routed::Redirect(route),
        }
    }
}

/// Returns early with a redirect unless `allowed` holds.
macro_rules! require {
    ($allowed:expr, $route:expr) => {
        if !$allowed {
            return Ok($crate::routed::Routed::Redirect($route));
        }
    };
}

pub(crate) use require;
