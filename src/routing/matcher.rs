//! Route matching logic.
//!
//! # Responsibilities
//! - Decide whether a component's route specifier matches the current fragment
//! - Support the three specifier shapes: absent, literal fragment, predicate
//!
//! # Design Decisions
//! - Absent specifier = always matches (unconditionally visible)
//! - Literal matching is exact path equality, never prefix
//! - The current fragment is normalized before any comparison
//! - Predicate results are coerced with value truthiness (`false`, `0`, `""`, null are falsy)

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::reactive::value::is_truthy;
use crate::routing::fragment::{normalize, Fragment};

/// Trait for matching a fragment against a route condition.
pub trait Matcher: fmt::Debug {
    /// Returns true if the (already normalized) fragment matches this condition.
    fn matches(&self, current: &Fragment) -> bool;
}

/// A user-supplied visibility predicate.
///
/// Receives the normalized current fragment; its result is coerced to a boolean.
#[derive(Clone)]
pub struct Predicate(Rc<dyn Fn(&str) -> Value>);

impl Predicate {
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&str) -> R + 'static,
        R: Into<Value>,
    {
        Self(Rc::new(move |fragment| f(fragment).into()))
    }

    fn call(&self, fragment: &str) -> bool {
        is_truthy(&(self.0)(fragment))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Route specifier gating an instance's visibility.
#[derive(Debug, Clone, Default)]
pub enum RouteSpec {
    /// No route declared.
    #[default]
    Always,
    /// Visible when the current fragment's path equals this fragment's path.
    Literal(Fragment),
    /// Visible when the predicate returns a truthy value.
    Predicate(Predicate),
}

impl RouteSpec {
    /// Literal specifier from raw input; the input is normalized.
    pub fn literal(fragment: &str) -> Self {
        Self::Literal(Fragment::normalize(fragment))
    }

    pub fn predicate<F, R>(f: F) -> Self
    where
        F: Fn(&str) -> R + 'static,
        R: Into<Value>,
    {
        Self::Predicate(Predicate::new(f))
    }
}

impl Matcher for RouteSpec {
    fn matches(&self, current: &Fragment) -> bool {
        match self {
            RouteSpec::Always => true,
            RouteSpec::Literal(expected) => expected.path() == current.path(),
            RouteSpec::Predicate(predicate) => predicate.call(current.as_str()),
        }
    }
}

/// Match a specifier against raw, possibly non-normalized input.
pub fn match_route(spec: &RouteSpec, current: Option<&str>) -> bool {
    spec.matches(&normalize(current))
}
