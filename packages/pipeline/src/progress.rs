//! Progress reporting for the pipeline stages.
//!
//! The pipeline only knows about [`ProgressCallback`]; binaries decide how
//! to render it (an `indicatif` bar in the CLI, nothing in tests).

/// Receives stage-level progress from [`crate::run`] and
/// [`crate::link_only`].
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of stages.
    fn set_total(&self, total: u64);

    /// Advance by `delta` stages.
    fn inc(&self, delta: u64);

    /// Update the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every progress update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Walks a [`ProgressCallback`] through a fixed list of named stages.
pub(crate) struct Stages<'a> {
    progress: &'a dyn ProgressCallback,
    started: bool,
}

impl<'a> Stages<'a> {
    pub(crate) fn new(progress: &'a dyn ProgressCallback, total: u64) -> Self {
        progress.set_total(total);
        Self {
            progress,
            started: false,
        }
    }

    /// Completes the previous stage (if any) and announces `name`.
    pub(crate) fn begin(&mut self, name: &str) {
        if self.started {
            self.progress.inc(1);
        }
        self.started = true;
        log::info!("Stage: {name}");
        self.progress.set_message(name.to_string());
    }

    pub(crate) fn finish(self, msg: &str) {
        if self.started {
            self.progress.inc(1);
        }
        self.progress.finish(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<String>>,
    }

    impl Recording {
        fn push(&self, event: String) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }
    }

    impl ProgressCallback for Recording {
        fn set_total(&self, total: u64) {
            self.push(format!("total {total}"));
        }
        fn inc(&self, delta: u64) {
            self.push(format!("inc {delta}"));
        }
        fn set_message(&self, msg: String) {
            self.push(format!("msg {msg}"));
        }
        fn finish(&self, msg: String) {
            self.push(format!("finish {msg}"));
        }
    }

    #[test]
    fn stages_advance_once_per_stage() {
        let recording = Recording::default();
        let mut stages = Stages::new(&recording, 2);
        stages.begin("load");
        stages.begin("link");
        stages.finish("done");

        assert_eq!(
            *recording.events.lock().unwrap(),
            vec![
                "total 2",
                "msg load",
                "inc 1",
                "msg link",
                "inc 1",
                "finish done"
            ]
        );
    }
}
