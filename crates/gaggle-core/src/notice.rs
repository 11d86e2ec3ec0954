//! User-facing notices.
//!
//! Operations that can degrade without failing (a progress write that did
//! not stick, a planner call that errored) push a [`Notice`] onto the queue
//! they were handed. The caller decides how to show them.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// FIFO queue of notices collected during one operation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Notices {
    queue: Vec<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(message = %notice.message, "notice"),
            NoticeLevel::Warning => tracing::warn!(message = %notice.message, "notice"),
            NoticeLevel::Error => tracing::error!(message = %notice.message, "notice"),
        }
        self.queue.push(notice);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    /// Take every queued notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.queue)
    }
}
