use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use papatch_archive::{ExtractCallback, ExtractProgress};
use papatch_fetch::{FetchPhase, Progress, ProgressCallback};

const BAR_STYLE: &str = "{spinner:.blue} {prefix:>10.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const SPINNER_STYLE: &str = "{spinner:.blue} {prefix:>10.cyan.bold} [{elapsed_precise}] {pos} entries {wide_msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const BAR_CHARS: &str = "█▓▒░  ";

static DOWNLOAD_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(BAR_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK).progress_chars(BAR_CHARS))
});

static EXTRACT_TEMPLATE: Lazy<Option<ProgressStyle>> =
    Lazy::new(|| ProgressStyle::with_template(SPINNER_STYLE).ok().map(|style| style.tick_chars(TICK)));

/// Terminal progress for a run: one bar per in-flight download and a single
/// spinner counting extracted entries.
pub struct SyncTracker {
    multi: MultiProgress,
    downloads: Mutex<HashMap<String, ProgressBar>>,
    extract: Mutex<Option<ProgressBar>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn short(checksum: &str) -> &str {
    checksum.get(..8).unwrap_or(checksum)
}

impl SyncTracker {
    /// Draws to stderr when it is a terminal, otherwise stays silent.
    pub fn new() -> Arc<Self> {
        let target = if console::Term::stderr().is_term() {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self::with_draw_target(target)
    }

    pub fn hidden() -> Arc<Self> {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Arc<Self> {
        Arc::new(Self {
            multi: MultiProgress::with_draw_target(target),
            downloads: Mutex::default(),
            extract: Mutex::default(),
        })
    }

    pub fn fetch_callback(self: &Arc<Self>) -> ProgressCallback {
        let this = Arc::clone(self);
        Arc::new(move |progress: &Progress| this.on_fetch(progress))
    }

    pub fn extract_callback(self: &Arc<Self>) -> ExtractCallback {
        let this = Arc::clone(self);
        Arc::new(move |progress: &ExtractProgress| this.on_extract(progress))
    }

    pub fn on_fetch(&self, progress: &Progress) {
        let mut downloads = lock(&self.downloads);

        match progress.phase {
            FetchPhase::Connecting => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                if let Some(style) = DOWNLOAD_TEMPLATE.as_ref() {
                    bar.set_style(style.clone());
                }
                bar.set_prefix(short(&progress.resource).to_owned());
                bar.enable_steady_tick(Duration::from_millis(120));
                downloads.insert(progress.resource.clone(), bar);
            }
            FetchPhase::Downloading => {
                if let Some(bar) = downloads.get(&progress.resource) {
                    if let Some(total) = progress.total_bytes {
                        bar.set_length(total);
                    }
                    bar.set_position(progress.bytes_downloaded);
                }
            }
            FetchPhase::Verifying | FetchPhase::Committing => {
                if let Some(bar) = downloads.get(&progress.resource) {
                    bar.set_message(progress.phase.to_string());
                }
            }
            FetchPhase::Completed => {
                if let Some(bar) = downloads.remove(&progress.resource) {
                    bar.finish_and_clear();
                    self.multi.remove(&bar);
                }
            }
        }
    }

    pub fn on_extract(&self, progress: &ExtractProgress) {
        let mut extract = lock(&self.extract);
        let bar = extract.get_or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new_spinner());
            if let Some(style) = EXTRACT_TEMPLATE.as_ref() {
                bar.set_style(style.clone());
            }
            bar.set_prefix("extract");
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        bar.inc(1);
        bar.set_message(progress.current_file.display().to_string());
    }

    /// Clear every bar still on screen.
    pub fn finish(&self) {
        for (_, bar) in lock(&self.downloads).drain() {
            bar.finish_and_clear();
        }
        if let Some(bar) = lock(&self.extract).take() {
            bar.finish_and_clear();
        }
        let _ = self.multi.clear();
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.downloads).len()
    }
}
