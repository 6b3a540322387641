use std::fmt;

use crate::session::{SessionError, ToolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

/// Short user-facing message. Rendering is up to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    pub fn processed(tool: ToolKind) -> Self {
        Self::success(format!("{tool} finished"))
    }

    /// Error toast carrying the session error message unchanged.
    pub fn from_session_error(err: &SessionError) -> Self {
        Self::error(err.to_string())
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub trait Notifier {
    fn notify(&self, toast: &Toast);
}

/// Emits toasts as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: &Toast) {
        match toast.level {
            ToastLevel::Info | ToastLevel::Success => {
                tracing::info!(level = ?toast.level, "{}", toast.message)
            }
            ToastLevel::Error => tracing::warn!("{}", toast.message),
        }
    }
}
