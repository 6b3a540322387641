#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Empty,
    Uploaded,
    Configuring,
    Processing,
    ResultReady,
    Downloaded,
}

impl SessionPhase {
    pub const fn has_source(self) -> bool {
        !matches!(self, Self::Empty)
    }

    pub const fn is_processing(self) -> bool {
        matches!(self, Self::Processing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    UploadCompleted,
    Configure,
    Process,
    ProcessSucceeded,
    ProcessFailed,
    Download,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: SessionPhase,
    pub event: SessionEvent,
    pub to: SessionPhase,
}

impl PhaseTransition {
    pub const fn new(from: SessionPhase, event: SessionEvent, to: SessionPhase) -> Self {
        Self { from, event, to }
    }
}
