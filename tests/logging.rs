//! Exercises the `tracing` events SPEC_FULL.md §2.1 requires `JobCache` to emit, rather than
//! just trusting that the `tracing::info!`/`debug!`/`trace!` call sites compile. A custom
//! `MakeWriter` captures formatted output into a shared buffer so the test can assert on it.

use jobcache::{JobCache, Threshold};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).expect("log output was not utf8")
    }
}

impl io::Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedOutput {
    type Writer = CapturedOutput;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn stop_logs_the_number_of_waiters_parked_at_shutdown() {
    let captured = CapturedOutput::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let cache = Arc::new(JobCache::new(4, 0, Vec::new()).unwrap());

        let worker = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || cache.shift(Threshold::Any))
        };

        // Wait for the worker to actually park before stopping, so `stop` has one waiter to
        // report.
        while cache.space() == 4 {
            std::thread::yield_now();
        }

        cache.stop();
        assert_eq!(worker.join().unwrap(), None);
    });

    let output = captured.contents();
    assert!(
        output.contains("JobCache stopping"),
        "expected a stopping event in captured output, got: {output}"
    );
    assert!(
        output.contains("parked_waiters=1"),
        "expected the stop event to report one parked waiter, got: {output}"
    );
}

#[test]
fn stop_on_an_idle_cache_reports_zero_parked_waiters() {
    let captured = CapturedOutput::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let cache = JobCache::new(4, 0, Vec::new()).unwrap();
        cache.stop();
    });

    let output = captured.contents();
    assert!(output.contains("parked_waiters=0"), "got: {output}");
}
