pub mod card;
pub mod color;
pub mod fonts;
pub mod glyphs;
pub mod pdf;
pub mod renderer;
pub mod units;

/// Result of a render that always yields usable output.
///
/// The card and PDF layout routines never fail outright; when something
/// along the way had to be absorbed (missing font, unmeasurable line,
/// unreadable font file) they return `Degraded` so the caller can log
/// the reason while still serving the output.
pub enum RenderOutcome<T> {
    Full(T),
    Degraded { value: T, reason: String },
}

impl<T> RenderOutcome<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Full(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Full(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Full(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RenderOutcome<U> {
        match self {
            Self::Full(value) => RenderOutcome::Full(f(value)),
            Self::Degraded { value, reason } => RenderOutcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}
