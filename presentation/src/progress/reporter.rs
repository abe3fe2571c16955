//! Live rendering of a streaming assistant turn

use crate::output::console::ConsoleFormatter;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use streamchat_domain::{ConversationObserver, MutationEvent, MutationKind, TurnStatus};

/// Prints assistant chunks as they arrive, with a spinner while the turn is
/// still `pending`.
///
/// Subscribed to the conversation store, so every callback runs under the
/// store lock. It only writes to its sink and never touches the store.
pub struct StreamReporter<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
    show_progress: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl StreamReporter<io::Stdout> {
    pub fn stdout(show_progress: bool) -> Self {
        Self::new(io::stdout(), show_progress)
    }
}

impl<W: Write + Send> StreamReporter<W> {
    pub fn new(out: W, show_progress: bool) -> Self {
        Self {
            out: Mutex::new(out),
            show_progress,
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start_spinner(&self) {
        if !self.show_progress {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message("waiting for the model...");
        pb.enable_steady_tick(Duration::from_millis(80));
        *self.spinner.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn stop_spinner(&self) {
        if let Some(pb) = self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_and_clear();
        }
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    /// Text to print for `event`, if any.
    fn render(event: &MutationEvent) -> Option<String> {
        match &event.kind {
            MutationKind::ChunkAppended { delta } => Some(delta.clone()),
            MutationKind::Completed => Some("\n".to_string()),
            MutationKind::Errored { reason } => {
                let separator = if event.content_len > 0 { " " } else { "" };
                Some(format!(
                    "{}{}\n",
                    separator,
                    ConsoleFormatter::failure_marker(reason)
                ))
            }
            MutationKind::Appended | MutationKind::StreamingStarted | MutationKind::Reset => None,
        }
    }
}

impl<W: Write + Send> ConversationObserver for StreamReporter<W> {
    fn on_mutation(&self, event: &MutationEvent) {
        match event.kind {
            // Only assistant turns are appended as pending.
            MutationKind::Appended if event.status == TurnStatus::Pending => self.start_spinner(),
            MutationKind::StreamingStarted | MutationKind::Reset => self.stop_spinner(),
            _ => {}
        }
        if let Some(text) = Self::render(event) {
            self.write(&text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use streamchat_domain::{ConversationStore, FailureReason, Role};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn store_with_reporter() -> (ConversationStore, SharedBuf) {
        colored::control::set_override(false);
        let buf = SharedBuf::default();
        let mut store = ConversationStore::new();
        store.subscribe(Arc::new(StreamReporter::new(buf.clone(), false)));
        (store, buf)
    }

    #[test]
    fn prints_chunks_then_newline() {
        let (mut store, buf) = store_with_reporter();
        store.append_turn(Role::User, "2+2?").unwrap();
        let id = store.append_turn(Role::Assistant, "").unwrap();
        store.begin_streaming(id).unwrap();
        store.append_chunk(id, "The answer").unwrap();
        store.append_chunk(id, " is 4.").unwrap();
        store.complete_turn(id).unwrap();

        assert_eq!(buf.text(), "The answer is 4.\n");
    }

    #[test]
    fn cancelled_turn_keeps_partial_output_with_marker() {
        let (mut store, buf) = store_with_reporter();
        store.append_turn(Role::User, "Hello").unwrap();
        let id = store.append_turn(Role::Assistant, "").unwrap();
        store.begin_streaming(id).unwrap();
        store.append_chunk(id, "Hel").unwrap();
        store.error_turn(id, FailureReason::Cancelled).unwrap();

        assert_eq!(buf.text(), "Hel [cancelled]\n");
    }

    #[test]
    fn error_before_first_chunk_prints_marker_only() {
        let (mut store, buf) = store_with_reporter();
        store.append_turn(Role::User, "x").unwrap();
        let id = store.append_turn(Role::Assistant, "").unwrap();
        store.begin_streaming(id).unwrap();
        store.error_turn(id, FailureReason::Timeout).unwrap();

        assert_eq!(buf.text(), "[timed out waiting for the model]\n");
    }
}
