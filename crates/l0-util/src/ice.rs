//! Internal compiler errors (spec.md §7, "unrecoverable").
//!
//! An [`IceError`] is raised only when an invariant the earlier passes are
//! supposed to guarantee turns out to be false (a missing inferred type, a
//! cycle in a graph that topological sort already should have rejected, a
//! scope-stack underflow). It is not a substitute for a diagnostic: user
//! input never causes one.

use crate::span::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
#[error("internal compiler error: [ICE-{code:04}] {message}")]
pub struct IceError {
    pub code: u32,
    pub message: String,
    pub span: Option<Span>,
}

impl IceError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

pub type IceResult<T> = Result<T, IceError>;
