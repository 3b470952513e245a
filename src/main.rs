use std::process::ExitCode;
use std::sync::Arc;

use sensorhub::{Config, RuntimeError, Subscribe, Supervisor};

/// Line to print when `run` fails, unless a subscriber already reported it.
///
/// Every `RuntimeError` is also published as an error-level event
/// (`StartupFailed` or `GraceExceeded`), which `LogWriter` prints.
fn exit_line(err: &RuntimeError) -> Option<String> {
    if cfg!(feature = "logging") {
        None
    } else {
        Some(format!("[error] {}: {err}", err.as_label()))
    }
}

fn subscribers() -> Vec<Arc<dyn Subscribe>> {
    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(sensorhub::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();
    subs
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let sup = Supervisor::builder(Config::default())
        .with_subscribers(subscribers())
        .build();

    match sup.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(line) = exit_line(&e) {
                eprintln!("{line}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sensorhub::{Event, Level};

    /// Counts the events `LogWriter` would print as `[error]` lines.
    struct ErrorLines(Arc<Mutex<usize>>);

    #[async_trait]
    impl Subscribe for ErrorLines {
        async fn on_event(&self, event: &Event) {
            if event.kind.level() == Level::Error {
                *self.0.lock().unwrap() += 1;
            }
        }

        fn name(&self) -> &'static str {
            "error-lines"
        }
    }

    #[tokio::test]
    async fn startup_failure_prints_one_error_line() {
        let logged = Arc::new(Mutex::new(0));
        let mut subs = Vec::new();
        if cfg!(feature = "logging") {
            // Stands in for LogWriter, which prints exactly the error-level events.
            subs.push(Arc::new(ErrorLines(Arc::clone(&logged))) as Arc<dyn Subscribe>);
        }

        let sup = Supervisor::builder(Config {
            queue_capacity: 0,
            set_capacity: 4,
            ..Config::default()
        })
        .with_subscribers(subs)
        .build();
        let err = sup.run().await.unwrap_err();
        assert!(err.is_startup());

        let printed = exit_line(&err).into_iter().count();
        assert_eq!(*logged.lock().unwrap() + printed, 1);
    }
}
