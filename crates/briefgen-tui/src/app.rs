use std::path::{Path, PathBuf};
use std::sync::Arc;

use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use briefgen_core::{
    run_submission, BriefService, Config, OutputLanguage, PendingFile, Session, SubmissionOutcome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Files,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultsTab {
    #[default]
    Meetings,
    Actions,
    Brief,
}

impl ResultsTab {
    pub fn next(self) -> Self {
        match self {
            ResultsTab::Meetings => ResultsTab::Actions,
            ResultsTab::Actions => ResultsTab::Brief,
            ResultsTab::Brief => ResultsTab::Meetings,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ResultsTab::Meetings => "Meetings",
            ResultsTab::Actions => "Action Items",
            ResultsTab::Brief => "Brief",
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub results_tab: ResultsTab,

    // Core session (selection, lifecycle, artifact)
    pub session: Session,
    pub service: Arc<dyn BriefService>,
    pub config: Config,
    pub submission_task: Option<JoinHandle<SubmissionOutcome>>,

    // File list
    pub file_state: ListState,

    // Path input (add file)
    pub path_input: String,
    pub path_cursor: usize,

    // Local feedback that is not session status (bad path, saved file)
    pub notice: Option<String>,

    pub results_scroll: u16,
    pub animation_frame: u8,
}

impl App {
    pub fn new(config: Config, service: Arc<dyn BriefService>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Files,
            results_tab: ResultsTab::default(),

            session: Session::with_config(&config),
            service,
            config,
            submission_task: None,

            file_state: ListState::default(),

            path_input: String::new(),
            path_cursor: 0,

            notice: None,

            results_scroll: 0,
            animation_frame: 0,
        }
    }

    // File selection

    pub async fn add_path(&mut self, raw: &str) {
        let path = clean_path(raw);
        if path.as_os_str().is_empty() {
            return;
        }

        match PendingFile::from_path(&path).await {
            Ok(file) => {
                info!("Added {} ({} bytes)", file.name(), file.size());
                self.notice = if file.kind().is_supported() {
                    None
                } else {
                    Some(format!("{} may not be supported by the service", file.name()))
                };
                self.session.add_files(vec![file]);
                self.file_state.select(Some(self.session.selection().len() - 1));
            }
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                self.notice = Some(format!("Could not read {}: {}", path.display(), e));
            }
        }
    }

    /// Add every path in a paste (one per line)
    pub async fn add_pasted(&mut self, text: &str) {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.add_path(line).await;
        }
    }

    pub fn remove_selected_file(&mut self) {
        let Some(idx) = self.file_state.selected() else {
            return;
        };

        match self.session.remove_file(idx) {
            Ok(_) => {
                let len = self.session.selection().len();
                self.file_state.select(if len == 0 { None } else { Some(idx.min(len - 1)) });
                self.after_selection_change();
            }
            Err(e) => warn!("Remove failed: {}", e),
        }
    }

    pub fn clear_files(&mut self) {
        self.session.clear_files();
        self.file_state.select(None);
        self.after_selection_change();
    }

    fn after_selection_change(&mut self) {
        if self.session.result().is_none() {
            self.results_scroll = 0;
        }
        self.notice = None;
    }

    pub fn file_down(&mut self) {
        let len = self.session.selection().len();
        if len == 0 {
            return;
        }
        let next = self.file_state.selected().map(|i| (i + 1).min(len - 1)).unwrap_or(0);
        self.file_state.select(Some(next));
    }

    pub fn file_up(&mut self) {
        if self.session.selection().is_empty() {
            return;
        }
        let prev = self.file_state.selected().map(|i| i.saturating_sub(1)).unwrap_or(0);
        self.file_state.select(Some(prev));
    }

    // Language

    pub fn cycle_language(&mut self, forward: bool) {
        let current = self.session.language();
        let language = if forward { current.next() } else { current.prev() };
        self.set_language(language);
    }

    pub fn set_language(&mut self, language: OutputLanguage) {
        self.session.set_language(language);
        self.config.language = language;
        if let Err(e) = Config::save_language(language) {
            warn!("Could not persist language: {}", e);
        }
    }

    // Submission

    pub fn start_submission(&mut self) {
        if self.submission_task.is_some() {
            return;
        }
        let Some(ticket) = self.session.begin_submission() else {
            return;
        };

        self.notice = None;
        self.results_scroll = 0;
        let service = Arc::clone(&self.service);
        self.submission_task = Some(tokio::spawn(async move {
            run_submission(service.as_ref(), ticket).await
        }));
    }

    /// Apply the submission outcome once the background task finishes
    pub async fn poll_submission(&mut self) {
        let finished = self
            .submission_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        let Some(task) = self.submission_task.take() else {
            return;
        };
        match task.await {
            Ok(outcome) => {
                self.session.complete_submission(outcome);
            }
            Err(e) => {
                warn!("Submission task failed: {}", e);
                // Nothing will complete this generation; start clean
                self.session.reset();
                self.notice = Some(format!("Submission aborted: {}", e));
            }
        }
    }

    pub async fn save_artifact(&mut self) {
        let dir = self.config.resolve_download_dir();
        self.notice = Some(match self.session.save_artifact(&dir).await {
            Ok(path) => {
                info!("Saved brief to {}", path.display());
                format!("Saved {}", path.display())
            }
            Err(e) => format!("No document saved: {}", e),
        });
    }

    // Results

    pub fn scroll_results_down(&mut self) {
        self.results_scroll = self.results_scroll.saturating_add(1);
    }

    pub fn scroll_results_up(&mut self) {
        self.results_scroll = self.results_scroll.saturating_sub(1);
    }

    pub fn next_results_tab(&mut self) {
        self.results_tab = self.results_tab.next();
        self.results_scroll = 0;
    }

    pub fn tick_animation(&mut self) {
        if self.session.is_submitting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

/// Strip quotes and `file://` that terminals add to dropped paths
fn clean_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim().trim_matches(|c| c == '\'' || c == '"');
    let trimmed = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    Path::new(&trimmed.replace("\\ ", " ")).to_path_buf()
}
