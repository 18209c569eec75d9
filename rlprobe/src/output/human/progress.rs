use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Draws the in-flight batch as a line of `.`/`!` marks under a progress bar on stderr, and
/// commits each finished batch as a plain line on stdout.
pub(crate) struct HumanProgress {
    inner: Mutex<Inner>,
}

struct Inner {
    total: u64,
    bar: Option<ProgressBar>,
    marks: String,
}

impl HumanProgress {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                total: 0,
                bar: None,
                marks: String::new(),
            }),
        }
    }

    pub(crate) fn set_total(&self, total: u64) {
        let mut inner = self.lock();
        inner.total = total;
        if let Some(bar) = &inner.bar {
            bar.set_length(total);
        }
    }

    pub(crate) fn batch_started(&self, batch: u64, batches: u64, size: u64) {
        let mut inner = self.lock();
        inner.marks.clear();
        inner.marks.reserve(size as usize);

        let bar = inner.bar_or_create();
        bar.set_prefix(format!("batch {batch}/{batches}"));
        bar.set_message(String::new());
    }

    pub(crate) fn request_completed(&self, mark: char) {
        let mut inner = self.lock();
        inner.marks.push(mark);

        let message = inner.marks.clone();
        let bar = inner.bar_or_create();
        bar.inc(1);
        bar.set_message(message);
    }

    pub(crate) fn batch_finished(&self) {
        let mut inner = self.lock();
        let line = std::mem::take(&mut inner.marks);

        match &inner.bar {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    pub(crate) fn finish(&self) {
        let mut inner = self.lock();
        if let Some(bar) = inner.bar.take() {
            bar.finish_and_clear();
        }
    }

    pub(crate) fn is_drawing(&self) -> bool {
        self.lock().bar.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inner {
    fn bar_or_create(&mut self) -> &ProgressBar {
        let total = self.total;
        self.bar.get_or_insert_with(|| {
            let pb =
                ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr_with_hz(5));
            pb.set_style(bar_style());
            pb
        })
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} [ {bar:20.cyan/blue} ] {pos}/{len} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░")
}
