use anyhow::{Context, Result};
// Use anyhow::Result as standard Result for service layer
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

// --- Declare modules ---
pub mod ai;
mod config;
pub mod export;
pub mod logo;
pub mod sheet;
pub mod store;
pub mod sync;

// --- Expose public types ---
pub use ai::{
    apply_outcome, merge_suggestion, parse_suggestion, GeminiClient, GenerationOutcome,
    GenerationRequest, MergeSummary, SuggestedExercise, WorkoutGenerator, WorkoutSuggestion,
};
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, AiConfig, Config, Error as ConfigError, StandardColor, Theme,
};
pub use sheet::{
    block_start_index, suggestions_for_group, ExerciseRow, GroupBlock, HeaderField, RowField,
    SheetModel, Split, WeekDay, ROWS_PER_SHEET,
};
pub use store::{get_db_path as get_db_path_util, Error as StoreError, StateStore, STATE_KEY};
pub use sync::{mirror, AppState, SheetId, StateKey};

/// Result of asking the generation service to fill the sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// The goal was blank; nothing was requested.
    EmptyGoal,
    /// The service failed or returned nothing usable; sheets are unchanged.
    NoResult,
    Merged(MergeSummary),
}

/// Shared "request in flight" indicator. Clones observe the same flag, so a
/// UI can hold one and disable submission while the service is awaiting.
#[derive(Debug, Clone, Default)]
pub struct GeneratingFlag(Arc<AtomicBool>);

impl GeneratingFlag {
    #[must_use]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Raises the flag for its lifetime; dropping it, including when the
/// request future is cancelled, lowers it again.
struct GeneratingGuard<'a>(&'a GeneratingFlag);

impl<'a> GeneratingGuard<'a> {
    fn raise(flag: &'a GeneratingFlag) -> Self {
        flag.0.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        self.0 .0.store(false, Ordering::SeqCst);
    }
}

pub struct AppService {
    pub config: Config,
    pub store: StateStore,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
    state: AppState,
    generating: GeneratingFlag,
}

impl AppService {
    /// Initializes the application service around an already loaded config:
    /// opens the database and restores the saved sheets.
    /// # Errors
    /// Returns `anyhow::Error` if the database path cannot be determined or opened.
    pub fn initialize(config: Config, config_path: PathBuf) -> Result<Self> {
        let db_path = store::get_db_path().context("Failed to determine database path")?;
        let store = StateStore::open(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;

        Self::with_store(config, store, db_path, config_path)
    }

    /// Loads the config from its default location.
    /// # Errors
    /// Returns `anyhow::Error` if the config file cannot be located, read or parsed.
    pub fn load_config() -> Result<(Config, PathBuf)> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;
        Ok((config, config_path))
    }

    /// Builds a service over an already opened store, restoring its state.
    /// # Errors
    /// Returns `anyhow::Error` if the store cannot be read.
    pub fn with_store(
        config: Config,
        store: StateStore,
        db_path: PathBuf,
        config_path: PathBuf,
    ) -> Result<Self> {
        let state = store.load().context("Failed to read saved state")?;
        Ok(Self {
            config,
            store,
            db_path,
            config_path,
            state,
            generating: GeneratingFlag::default(),
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    pub const fn state(&self) -> &AppState {
        &self.state
    }

    pub const fn sheet(&self, which: SheetId) -> &SheetModel {
        self.state.sheet(which)
    }

    /// True while a generation request is outstanding.
    pub fn is_generating(&self) -> bool {
        self.generating.get()
    }

    /// A handle on the in-flight flag that stays readable while
    /// [`Self::fill_from_goal`] holds the service mutably.
    pub fn generating_flag(&self) -> GeneratingFlag {
        self.generating.clone()
    }

    /// # Errors
    /// Returns `anyhow::Error` if the store cannot be read.
    pub fn last_saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.store.saved_at()?)
    }

    /// Persists `next` and makes it the current state.
    fn commit(&mut self, next: AppState) -> Result<()> {
        self.store.save(&next).context("Failed to save state")?;
        self.state = next;
        Ok(())
    }

    // --- Sheet edits ---

    /// # Errors
    /// Returns `anyhow::Error` if saving fails.
    pub fn update_sheet(&mut self, which: SheetId, new_sheet: SheetModel) -> Result<()> {
        let next = self.state.update_sheet(which, new_sheet);
        self.commit(next)
    }

    /// Routes an edited sheet by its state key. Returns `false` when the key
    /// does not name a sheet (the logo key), leaving the state untouched.
    /// # Errors
    /// Returns `anyhow::Error` if the key is unknown or saving fails.
    pub fn update_by_key(&mut self, key: &str, new_sheet: SheetModel) -> Result<bool> {
        let key = StateKey::try_from(key)?;
        match self.state.update(key, new_sheet) {
            Some(next) => {
                self.commit(next)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// # Errors
    /// Returns `anyhow::Error` if saving fails.
    pub fn set_header_field(&mut self, which: SheetId, field: HeaderField, value: &str) -> Result<()> {
        let edited = self.sheet(which).with_header_field(field, value);
        self.update_sheet(which, edited)
    }

    /// # Errors
    /// Returns `anyhow::Error` if saving fails.
    pub fn toggle_week_day(&mut self, which: SheetId, day: WeekDay) -> Result<()> {
        let edited = self.sheet(which).with_week_day_toggled(day);
        self.update_sheet(which, edited)
    }

    /// Edits one cell of the row at `index` (0-based).
    /// # Errors
    /// Returns `anyhow::Error` if saving fails.
    pub fn set_row_field(&mut self, which: SheetId, index: usize, field: RowField, value: &str) -> Result<()> {
        let edited = self.sheet(which).with_row_field(index, field, value);
        self.update_sheet(which, edited)
    }

    /// # Errors
    /// Returns `anyhow::Error` if saving fails.
    pub fn set_side_label(&mut self, which: SheetId, block_idx: usize, value: &str) -> Result<()> {
        let edited = self.sheet(which).with_side_label(block_idx, value);
        self.update_sheet(which, edited)
    }

    // --- Logo ---

    /// # Errors
    /// Returns `anyhow::Error` if the image cannot be read or saving fails.
    pub fn set_logo_from_file(&mut self, path: &Path) -> Result<()> {
        let data_uri = logo::load_data_uri(path)?;
        info!("Loaded logo from {:?} ({} bytes encoded)", path, data_uri.len());
        let next = self.state.with_logo(Some(data_uri));
        self.commit(next)
    }

    /// # Errors
    /// Returns `anyhow::Error` if saving fails.
    pub fn clear_logo(&mut self) -> Result<()> {
        let next = self.state.with_logo(None);
        self.commit(next)
    }

    /// Replaces both sheets with empty ones, keeping the logo.
    /// # Errors
    /// Returns `anyhow::Error` if saving fails.
    pub fn reset(&mut self) -> Result<()> {
        info!("Resetting both sheets");
        let next = self.state.reset();
        self.commit(next)
    }

    // --- AI fill ---

    /// Builds the HTTP generator from the loaded configuration.
    /// # Errors
    /// Returns `anyhow::Error` if the HTTP client cannot be built.
    pub fn gemini_client(&self) -> Result<GeminiClient> {
        GeminiClient::new(&self.config.ai, self.config.ai.resolve_api_key())
    }

    /// Asks `generator` for a workout matching `goal` and merges the result
    /// into both sheets. A blank goal is rejected before any request is made;
    /// a failed or empty answer leaves the sheets as they were.
    /// # Errors
    /// Returns `anyhow::Error` only if saving the merged state fails.
    pub async fn fill_from_goal<G: WorkoutGenerator>(&mut self, goal: &str, generator: &G) -> Result<FillOutcome> {
        let goal = goal.trim();
        if goal.is_empty() {
            debug!("Rejecting generation request with an empty goal");
            return Ok(FillOutcome::EmptyGoal);
        }

        let student_name = match self.state.sheet_a.student_name.trim() {
            "" => self.config.student_placeholder.clone(),
            name => name.to_string(),
        };
        let request = GenerationRequest {
            goal: goal.to_string(),
            student_name,
        };

        let guard = GeneratingGuard::raise(&self.generating);
        let outcome = generator.generate(&request).await;
        drop(guard);

        match apply_outcome(&self.state, &outcome) {
            Some((next, summary)) => {
                info!(
                    "Merged generated workout: {} rows on sheet A, {} rows on sheet B",
                    summary.sheet_a_rows, summary.sheet_b_rows
                );
                self.commit(next)?;
                Ok(FillOutcome::Merged(summary))
            }
            None => Ok(FillOutcome::NoResult),
        }
    }

    /// # Errors
    /// Returns `anyhow::Error` if writing fails.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        export::write_csv(&self.state, writer)
    }
}
