use super::error::{StateError, StateResult};
use super::state::{PhaseTransition, SessionEvent, SessionPhase};

#[derive(Debug, Default)]
pub struct SessionMachine {
    phase: SessionPhase,
    /// Phase to return to when the in-flight request fails.
    resume: Option<SessionPhase>,
    transition_history: Vec<PhaseTransition>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.transition_history
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_phase(event).is_some()
    }

    pub fn next_phase(&self, event: SessionEvent) -> Option<SessionPhase> {
        use SessionEvent::*;
        use SessionPhase as P;
        match (self.phase, event) {
            (_, Reset) => Some(P::Empty),
            (P::Processing, UploadCompleted) => None,
            (_, UploadCompleted) => Some(P::Uploaded),
            (P::Uploaded | P::Configuring | P::ResultReady | P::Downloaded, Configure) => {
                Some(P::Configuring)
            }
            (P::Uploaded | P::Configuring | P::ResultReady | P::Downloaded, Process) => {
                Some(P::Processing)
            }
            (P::Processing, ProcessSucceeded) => Some(P::ResultReady),
            (P::Processing, ProcessFailed) => Some(self.resume.unwrap_or(P::Uploaded)),
            (P::ResultReady | P::Downloaded, Download) => Some(P::Downloaded),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<SessionPhase> {
        tracing::debug!(from = ?self.phase, event = ?event, "request session transition");
        let next = self.next_phase(event).ok_or_else(|| {
            let from = self.phase;
            tracing::warn!(from = ?from, event = ?event, "invalid session transition requested");
            StateError::InvalidTransition { from, event }
        })?;

        self.resume = if next == SessionPhase::Processing {
            Some(self.phase)
        } else {
            None
        };
        self.transition_history
            .push(PhaseTransition::new(self.phase, event, next));
        self.phase = next;

        Ok(self.phase)
    }
}

impl std::fmt::Display for SessionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionPhase::{:?}", self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_transition_tracks_valid_and_invalid_events() {
        let mut machine = SessionMachine::new();
        assert!(machine.can_transition(SessionEvent::UploadCompleted));
        assert!(machine.can_transition(SessionEvent::Reset));
        assert!(!machine.can_transition(SessionEvent::Process));
        assert!(!machine.can_transition(SessionEvent::Download));

        let _ = machine
            .transition(SessionEvent::UploadCompleted)
            .expect("empty -> uploaded should transition");

        assert!(machine.can_transition(SessionEvent::Configure));
        assert!(machine.can_transition(SessionEvent::Process));
        assert!(!machine.can_transition(SessionEvent::Download));
    }

    #[test]
    fn transition_records_history_with_ordered_entries() {
        let mut machine = SessionMachine::new();
        for event in [
            SessionEvent::UploadCompleted,
            SessionEvent::Configure,
            SessionEvent::Process,
            SessionEvent::ProcessSucceeded,
            SessionEvent::Download,
        ] {
            machine.transition(event).expect("pipeline step should work");
        }

        assert_eq!(machine.phase(), SessionPhase::Downloaded);
        assert_eq!(machine.history().len(), 5);
        assert_eq!(
            machine.history()[0],
            PhaseTransition::new(
                SessionPhase::Empty,
                SessionEvent::UploadCompleted,
                SessionPhase::Uploaded
            )
        );
        assert_eq!(
            machine.history()[3],
            PhaseTransition::new(
                SessionPhase::Processing,
                SessionEvent::ProcessSucceeded,
                SessionPhase::ResultReady
            )
        );
    }

    #[test]
    fn failed_process_returns_to_phase_before_processing() {
        let mut machine = SessionMachine::new();
        machine
            .transition(SessionEvent::UploadCompleted)
            .expect("upload should work");
        machine
            .transition(SessionEvent::Configure)
            .expect("configure should work");
        machine
            .transition(SessionEvent::Process)
            .expect("process should work");
        let phase = machine
            .transition(SessionEvent::ProcessFailed)
            .expect("failure should revert");
        assert_eq!(phase, SessionPhase::Configuring);

        machine
            .transition(SessionEvent::Process)
            .expect("retry should work");
        machine
            .transition(SessionEvent::ProcessSucceeded)
            .expect("success should work");
        machine
            .transition(SessionEvent::Process)
            .expect("chained process should work");
        let phase = machine
            .transition(SessionEvent::ProcessFailed)
            .expect("failure should revert");
        assert_eq!(phase, SessionPhase::ResultReady);
    }

    #[test]
    fn reset_is_valid_from_every_phase() {
        let mut machine = SessionMachine::new();
        machine
            .transition(SessionEvent::UploadCompleted)
            .expect("upload should work");
        machine
            .transition(SessionEvent::Process)
            .expect("process should work");
        assert!(!machine.can_transition(SessionEvent::UploadCompleted));
        let phase = machine
            .transition(SessionEvent::Reset)
            .expect("reset should work while processing");
        assert_eq!(phase, SessionPhase::Empty);
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_history() {
        let mut machine = SessionMachine::new();

        let err = machine
            .transition(SessionEvent::Download)
            .expect_err("empty -> download should fail");
        assert!(matches!(
            err,
            StateError::InvalidTransition {
                from: SessionPhase::Empty,
                event: SessionEvent::Download
            }
        ));
        assert_eq!(machine.phase(), SessionPhase::Empty);
        assert!(machine.history().is_empty());
    }
}
