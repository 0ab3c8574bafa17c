//src/ai.rs
use crate::config::AiConfig;
use crate::sheet::{ExerciseRow, ROWS_PER_SHEET};
use crate::sync::AppState;
use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What the user asked for, plus the student the workout is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub goal: String,
    pub student_name: String,
}

impl GenerationRequest {
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "Generate a comprehensive gym workout for the goal: \"{}\".\n\
             The student name is \"{}\".\n\
             The workout should fit into a structured table format with groups, specific exercises, sets, reps and observations.\n\
             Return strictly a JSON object matching the workout sheet structure.",
            self.goal, self.student_name
        )
    }
}

/// One suggested row. `group` and `order` are requested from the service but
/// never applied: block labels and row numbers belong to the sheet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestedExercise {
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub exercise: Option<String>,
    #[serde(default)]
    pub kg: Option<String>,
    #[serde(default)]
    pub sets: Option<String>,
    #[serde(default)]
    pub reps: Option<String>,
    #[serde(default)]
    pub obs: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkoutSuggestion {
    #[serde(default)]
    pub warmup: Option<String>,
    pub exercises: Vec<SuggestedExercise>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(WorkoutSuggestion),
    /// The service answered without any content.
    Empty,
    Failure(String),
}

/// Anything able to turn a goal into a workout suggestion. Implementations
/// never fail: transport and schema problems come back as
/// [`GenerationOutcome::Failure`].
#[allow(async_fn_in_trait)]
pub trait WorkoutGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome;
}

/// Raw shape used only to tell "no exercises field" apart from bad JSON.
#[derive(Deserialize)]
struct RawSuggestion {
    #[serde(default)]
    warmup: Option<String>,
    #[serde(default)]
    exercises: Option<Vec<SuggestedExercise>>,
}

/// Interprets the text body returned by the service.
#[must_use]
pub fn parse_suggestion(text: &str) -> GenerationOutcome {
    if text.trim().is_empty() {
        return GenerationOutcome::Empty;
    }
    match serde_json::from_str::<RawSuggestion>(text) {
        Ok(RawSuggestion {
            warmup,
            exercises: Some(exercises),
        }) => GenerationOutcome::Success(WorkoutSuggestion { warmup, exercises }),
        Ok(_) => GenerationOutcome::Failure("Response has no exercises".to_string()),
        Err(e) => GenerationOutcome::Failure(format!("Malformed response: {e}")),
    }
}

/// Counts of what a merge touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    pub sheet_a_rows: usize,
    pub sheet_b_rows: usize,
    pub warmup_updated: bool,
}

fn merge_row(existing: &ExerciseRow, suggested: &SuggestedExercise, position: usize) -> ExerciseRow {
    let pick = |incoming: &Option<String>, current: &String| {
        incoming.clone().unwrap_or_else(|| current.clone())
    };
    ExerciseRow {
        group: existing.group.clone(),
        order: (position + 1).to_string(),
        exercise: pick(&suggested.exercise, &existing.exercise),
        kg: pick(&suggested.kg, &existing.kg),
        sets: pick(&suggested.sets, &existing.sets),
        reps: pick(&suggested.reps, &existing.reps),
        obs: pick(&suggested.obs, &existing.obs),
    }
}

/// Splices the suggestion into the 48 slots: the first 24 land on sheet A,
/// the next 24 on sheet B, anything further is dropped. Row numbers are
/// forced to the slot position. Only sheet A's warm-up can change.
#[must_use]
pub fn merge_suggestion(state: &AppState, suggestion: &WorkoutSuggestion) -> (AppState, MergeSummary) {
    let mut next = state.clone();
    let mut summary = MergeSummary::default();

    for (i, suggested) in suggestion.exercises.iter().enumerate().take(ROWS_PER_SHEET * 2) {
        let (sheet, slot) = if i < ROWS_PER_SHEET {
            (&mut next.sheet_a, i)
        } else {
            (&mut next.sheet_b, i - ROWS_PER_SHEET)
        };
        if let Some(row) = sheet.exercises.get_mut(slot) {
            *row = merge_row(row, suggested, i);
            if i < ROWS_PER_SHEET {
                summary.sheet_a_rows += 1;
            } else {
                summary.sheet_b_rows += 1;
            }
        }
    }

    if let Some(warmup) = suggestion.warmup.as_deref().filter(|w| !w.is_empty()) {
        next.sheet_a.warmup = warmup.to_string();
        summary.warmup_updated = true;
    }

    if suggestion.exercises.len() > ROWS_PER_SHEET * 2 {
        debug!(
            "Discarding {} suggested exercises beyond the available slots",
            suggestion.exercises.len() - ROWS_PER_SHEET * 2
        );
    }

    (next, summary)
}

/// Applies a generation outcome; anything but success leaves the state as is.
#[must_use]
pub fn apply_outcome(state: &AppState, outcome: &GenerationOutcome) -> Option<(AppState, MergeSummary)> {
    match outcome {
        GenerationOutcome::Success(suggestion) => Some(merge_suggestion(state, suggestion)),
        GenerationOutcome::Empty => {
            info!("Generation returned no content; sheets left unchanged");
            None
        }
        GenerationOutcome::Failure(reason) => {
            warn!("Generation failed, sheets left unchanged: {}", reason);
            None
        }
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http_client: Client,
    api_base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AiConfig, api_key: Option<String>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http_client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn request_body(request: &GenerationRequest) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": request.prompt() }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "warmup": { "type": "STRING", "description": "Cardio or warm-up instructions" },
                        "exercises": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "group": { "type": "STRING" },
                                    "order": { "type": "STRING" },
                                    "exercise": { "type": "STRING" },
                                    "sets": { "type": "STRING" },
                                    "reps": { "type": "STRING" },
                                    "obs": { "type": "STRING" }
                                },
                                "required": ["group", "order", "exercise", "sets", "reps"]
                            }
                        }
                    }
                }
            }
        })
    }

    /// Sends the request and returns the first candidate's text, if any.
    async fn request_text(&self, request: &GenerationRequest) -> Result<Option<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("No API key configured for the generation service");
        };
        let url = format!("{}/models/{}:generateContent", self.api_base_url, self.model);
        info!("Sending POST to {} for goal {:?}", url, request.goal);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(request))
            .send()
            .await
            .context("Failed to send generation request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            bail!("Service returned error: {} - {}", status, error_body);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to deserialize generation response")?;
        debug!("Generation response: {}", body);

        Ok(body
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

impl WorkoutGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        match self.request_text(request).await {
            Ok(Some(text)) => parse_suggestion(&text),
            Ok(None) => GenerationOutcome::Empty,
            Err(e) => {
                error!("Error generating workout: {:#}", e);
                GenerationOutcome::Failure(format!("{e:#}"))
            }
        }
    }
}
