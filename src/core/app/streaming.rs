use uuid::Uuid;

use crate::core::providers::StreamController;

/// The one in-flight provider stream, if any.
///
/// The stream is identified by the id its assistant message will carry.
/// Events for any other id belong to a superseded stream and are dropped.
#[derive(Debug, Default)]
pub struct StreamingState {
    pub is_streaming: bool,
    pub accumulated_content: String,
    pub message_id: Option<Uuid>,
    pub controller: Option<StreamController>,
    /// Learner message that started this turn; drives the difficulty update.
    pub user_message: Option<String>,
}

/// What a finished stream leaves behind for the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedStream {
    pub message_id: Uuid,
    pub content: String,
    pub user_message: Option<String>,
}

impl StreamingState {
    pub fn start(&mut self, message_id: Uuid, user_message: String) {
        self.is_streaming = true;
        self.accumulated_content.clear();
        self.message_id = Some(message_id);
        self.controller = None;
        self.user_message = Some(user_message);
    }

    pub fn is_current(&self, stream_id: Uuid) -> bool {
        self.is_streaming && self.message_id == Some(stream_id)
    }

    /// Returns false when no stream is active; the chunk is then ignored.
    pub fn append(&mut self, chunk: &str) -> bool {
        if !self.is_streaming {
            return false;
        }
        self.accumulated_content.push_str(chunk);
        true
    }

    /// Keep the cancellation handle for `controller`'s stream. A handle for
    /// a stream that is no longer current is cancelled straight away.
    pub fn attach_controller(&mut self, controller: StreamController) {
        if self.is_current(controller.stream_id()) {
            self.controller = Some(controller);
        } else {
            controller.abort();
        }
    }

    /// Return to idle. `None` when nothing was streaming.
    pub fn finish(&mut self) -> Option<FinishedStream> {
        if !self.is_streaming {
            return None;
        }
        self.is_streaming = false;
        self.controller = None;
        let message_id = self.message_id.take()?;
        Some(FinishedStream {
            message_id,
            content: std::mem::take(&mut self.accumulated_content),
            user_message: self.user_message.take(),
        })
    }

    /// Cancel the adapter and return to idle with the partial content.
    pub fn abort(&mut self) -> Option<FinishedStream> {
        if let Some(controller) = self.controller.take() {
            controller.abort();
        }
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn chunks_outside_a_stream_are_ignored() {
        let mut state = StreamingState::default();
        assert!(!state.append("late"));
        assert!(state.accumulated_content.is_empty());
        assert!(state.finish().is_none());
    }

    #[test]
    fn abort_cancels_controller_and_returns_partial_text() {
        let mut state = StreamingState::default();
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        state.start(id, "hello".into());
        state.attach_controller(StreamController::new(id, token.clone()));
        state.append("Hel");

        let finished = state.abort().unwrap();
        assert!(token.is_cancelled());
        assert_eq!(finished.content, "Hel");
        assert_eq!(finished.message_id, id);
        assert_eq!(finished.user_message.as_deref(), Some("hello"));
        assert!(!state.is_streaming);
        assert!(!state.is_current(id));
    }

    #[test]
    fn stale_controllers_are_cancelled_on_attach() {
        let mut state = StreamingState::default();
        let token = CancellationToken::new();
        state.attach_controller(StreamController::new(Uuid::new_v4(), token.clone()));
        assert!(token.is_cancelled());
        assert!(state.controller.is_none());
    }
}
