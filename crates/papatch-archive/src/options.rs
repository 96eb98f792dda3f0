use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Snapshot handed to extraction progress callbacks after each entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractProgress {
    pub bundle: String,
    pub entries_done: usize,
    pub entries_total: usize,
    pub current_file: PathBuf,
}

pub type ExtractCallback = Arc<dyn Fn(&ExtractProgress) + Send + Sync>;

#[derive(Clone, Default)]
pub struct ExtractOptions {
    /// fsync each entry before it is renamed into place.
    pub sync: bool,
    pub on_progress: Option<ExtractCallback>,
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("sync", &self.sync)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl ExtractOptions {
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(&ExtractProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn progress_callback(mut self, callback: Option<ExtractCallback>) -> Self {
        self.on_progress = callback;
        self
    }
}
