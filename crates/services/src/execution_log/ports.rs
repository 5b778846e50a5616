/// Asks the user to confirm a destructive action.
pub trait ConfirmPrompt: Send + Sync {
    /// `true` to proceed.
    fn confirm(&self, message: &str) -> bool;
}

/// Blocking notice shown to the user when a write fails.
pub trait UserNotice: Send + Sync {
    fn notify(&self, message: &str);
}

/// Confirms every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmPrompt for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Declines every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl ConfirmPrompt for NeverConfirm {
    fn confirm(&self, _message: &str) -> bool {
        false
    }
}

/// Routes notices to the log at `error` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotice;

impl UserNotice for TracingNotice {
    fn notify(&self, message: &str) {
        tracing::error!(notice = message, "user notice");
    }
}
