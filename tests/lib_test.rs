use anyhow::Result;
use std::cell::Cell;
use std::path::Path;
use std::time::Duration;
use workout_sheets_lib::{
    apply_outcome, block_start_index, merge_suggestion, mirror, parse_suggestion,
    load_config_util, parse_color, save_config_util, AppService, AppState, Config, FillOutcome,
    GenerationOutcome, GenerationRequest, GeneratingFlag, HeaderField, RowField, SheetId, SheetModel, Split,
    StateKey, StateStore, SuggestedExercise, WeekDay, WorkoutGenerator, WorkoutSuggestion, ROWS_PER_SHEET,
};

// Helper function to create a test service with in-memory database
fn create_test_service() -> Result<AppService> {
    let store = StateStore::open_in_memory()?;
    AppService::with_store(
        Config::default(),
        store,
        ":memory:".into(),
        "test_config.toml".into(),
    )
}

/// Generator that returns a canned outcome and counts how often it was asked.
struct StubGenerator {
    outcome: GenerationOutcome,
    calls: Cell<usize>,
    last_student: std::cell::RefCell<Option<String>>,
}

impl StubGenerator {
    fn new(outcome: GenerationOutcome) -> Self {
        Self {
            outcome,
            calls: Cell::new(0),
            last_student: std::cell::RefCell::new(None),
        }
    }
}

impl WorkoutGenerator for StubGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        self.calls.set(self.calls.get() + 1);
        *self.last_student.borrow_mut() = Some(request.student_name.clone());
        self.outcome.clone()
    }
}

/// Generator whose request never completes.
struct HangingGenerator;

impl WorkoutGenerator for HangingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> GenerationOutcome {
        std::future::pending::<GenerationOutcome>().await
    }
}

/// Generator that records whether the service reported a request in flight.
struct FlagWatcher {
    flag: GeneratingFlag,
    seen: Cell<Option<bool>>,
}

impl WorkoutGenerator for FlagWatcher {
    async fn generate(&self, _request: &GenerationRequest) -> GenerationOutcome {
        self.seen.set(Some(self.flag.get()));
        GenerationOutcome::Empty
    }
}

fn open_service_at(db_path: &Path) -> Result<AppService> {
    AppService::with_store(
        Config::default(),
        StateStore::open(db_path)?,
        db_path.to_path_buf(),
        "test_config.toml".into(),
    )
}

fn suggestion_with(count: usize) -> WorkoutSuggestion {
    WorkoutSuggestion {
        warmup: Some("10 min esteira".to_string()),
        exercises: (0..count)
            .map(|i| SuggestedExercise {
                group: Some("Qualquer".to_string()),
                exercise: Some(format!("Exercise {i}")),
                kg: None,
                sets: Some("3".to_string()),
                reps: Some("12".to_string()),
                obs: None,
            })
            .collect(),
    }
}

#[test]
fn test_empty_sheets_have_numbered_rows_and_block_labels() {
    for split in [Split::A, Split::B] {
        let sheet = SheetModel::empty(split);
        assert_eq!(sheet.training_split, split);
        assert_eq!(sheet.exercises.len(), ROWS_PER_SHEET);
        assert_eq!(sheet.side_labels.len(), split.block_count());
        assert!(sheet.side_labels.iter().all(String::is_empty));

        for (i, row) in sheet.exercises.iter().enumerate() {
            assert_eq!(row.order, (i + 1).to_string());
            assert!(row.exercise.is_empty() && row.kg.is_empty() && row.obs.is_empty());
        }

        let block_starts: Vec<usize> = (0..split.block_count())
            .map(|b| block_start_index(split, b))
            .collect();
        for (i, row) in sheet.exercises.iter().enumerate() {
            assert_eq!(!row.group.is_empty(), block_starts.contains(&i), "row {i} of {split}");
        }
    }
}

#[test]
fn test_block_layout() {
    assert_eq!(block_start_index(Split::A, 0), 0);
    assert_eq!(block_start_index(Split::A, 1), 6);
    assert_eq!(block_start_index(Split::A, 3), 20);
    assert_eq!(block_start_index(Split::A, 4), ROWS_PER_SHEET);
    assert_eq!(block_start_index(Split::B, 1), 8);
    assert_eq!(block_start_index(Split::B, 3), 18);

    let sheet = SheetModel::empty(Split::B);
    let groups: Vec<&str> = sheet.blocks().map(|(_, block, _)| block.name).collect();
    assert_eq!(groups, vec!["Pernas", "Bíceps", "Tríceps", "Glúteo"]);
    let sizes: Vec<usize> = sheet.blocks().map(|(_, _, rows)| rows.len()).collect();
    assert_eq!(sizes, vec![8, 5, 5, 6]);
}

#[test]
fn test_row_and_side_label_edits() {
    let sheet = SheetModel::empty(Split::A);
    let edited = sheet.with_row_field(6, RowField::Exercise, "Puxada Alta");
    assert_eq!(edited.exercises[6].exercise, "Puxada Alta");
    assert_eq!(edited.exercises[6].group, "Costas");
    assert_eq!(edited.exercises[6].order, "7");
    for (i, row) in edited.exercises.iter().enumerate().filter(|(i, _)| *i != 6) {
        assert_eq!(row, &sheet.exercises[i]);
    }

    // Out of range edits are ignored
    assert_eq!(sheet.with_row_field(24, RowField::Kg, "10"), sheet);
    assert_eq!(sheet.with_side_label(4, "X"), sheet);

    let labelled = sheet.with_side_label(2, "TREINO A");
    assert_eq!(labelled.side_labels, vec!["", "", "TREINO A", ""]);
}

#[test]
fn test_week_day_toggle_keeps_order_without_duplicates() {
    let sheet = SheetModel::empty(Split::A)
        .with_week_day_toggled(WeekDay::Qua)
        .with_week_day_toggled(WeekDay::Seg);
    assert_eq!(sheet.week_days, vec![WeekDay::Qua, WeekDay::Seg]);
    let sheet = sheet.with_week_day_toggled(WeekDay::Qua);
    assert_eq!(sheet.week_days, vec![WeekDay::Seg]);
    assert_eq!(WeekDay::try_from("sáb").ok(), Some(WeekDay::Sab));
    assert!(WeekDay::try_from("DOM").is_err());
}

#[test]
fn test_suggestions_follow_block_group() {
    let sheet = SheetModel::empty(Split::A);
    assert!(sheet.suggestions(0).contains(&"Supino Reto"));
    assert!(sheet.suggestions(3).contains(&"Prancha"));
    assert!(sheet.suggestions(9).is_empty());
}

#[test]
fn test_mirror_copies_only_shared_fields() {
    let edited = SheetModel::empty(Split::A)
        .with_header_field(HeaderField::StudentName, "Maria")
        .with_header_field(HeaderField::EndDate, "31/12/2026")
        .with_header_field(HeaderField::Warmup, "Bike 5 min")
        .with_week_day_toggled(WeekDay::Ter);
    let other = SheetModel::empty(Split::B).with_header_field(HeaderField::TrainingDayName, "Pernas");

    let mirrored = mirror(&edited, &other);
    assert_eq!(mirrored.student_name, "Maria");
    assert_eq!(mirrored.end_date, "31/12/2026");
    assert_eq!(mirrored.week_days, vec![WeekDay::Ter]);
    assert_eq!(mirrored.warmup, "");
    assert_eq!(mirrored.training_day_name, "Pernas");
    assert_eq!(mirrored.training_split, Split::B);
    assert_eq!(mirrored.exercises, other.exercises);
}

#[test]
fn test_shared_fields_stay_in_sync_after_edits() -> Result<()> {
    let mut service = create_test_service()?;

    service.set_header_field(SheetId::A, HeaderField::StudentName, "João")?;
    assert!(service.state().shared_fields_in_sync());
    assert_eq!(service.sheet(SheetId::B).student_name, "João");

    service.toggle_week_day(SheetId::B, WeekDay::Sex)?;
    service.set_header_field(SheetId::B, HeaderField::EndDate, "01/03/2027")?;
    assert!(service.state().shared_fields_in_sync());
    assert_eq!(service.sheet(SheetId::A).week_days, vec![WeekDay::Sex]);
    assert_eq!(service.sheet(SheetId::A).end_date, "01/03/2027");

    // Non-shared fields stay on their own sheet
    service.set_header_field(SheetId::B, HeaderField::BirthDate, "02/02/2000")?;
    service.set_row_field(SheetId::B, 0, RowField::Exercise, "Agachamento")?;
    assert_eq!(service.sheet(SheetId::A).birth_date, "");
    assert_eq!(service.sheet(SheetId::A).exercises[0].exercise, "");
    assert!(service.state().shared_fields_in_sync());

    Ok(())
}

#[test]
fn test_edited_sheet_is_authoritative() -> Result<()> {
    let mut service = create_test_service()?;
    service.set_header_field(SheetId::A, HeaderField::StudentName, "Ana")?;

    // A sheet B built from stale data overwrites the shared fields on A
    let stale_b = SheetModel::empty(Split::B).with_header_field(HeaderField::StudentName, "Bia");
    service.update_sheet(SheetId::B, stale_b)?;
    assert_eq!(service.sheet(SheetId::A).student_name, "Bia");
    assert!(service.state().shared_fields_in_sync());
    Ok(())
}

#[test]
fn test_logo_key_is_rejected_on_sheet_path() -> Result<()> {
    let mut service = create_test_service()?;
    let before = service.state().clone();
    let edited = SheetModel::empty(Split::A).with_header_field(HeaderField::StudentName, "X");

    assert!(!service.update_by_key("logoRef", edited.clone())?);
    assert_eq!(service.state(), &before);

    assert!(service.update_by_key("sheetA", edited)?);
    assert_eq!(service.sheet(SheetId::B).student_name, "X");
    assert!(service.update_by_key("sheet3", SheetModel::empty(Split::A)).is_err());
    Ok(())
}

#[test]
fn test_merge_thirty_exercises() {
    let before = AppState::default().update_sheet(
        SheetId::B,
        SheetModel::empty(Split::B).with_row_field(10, RowField::Exercise, "Rosca Direta"),
    );
    let (after, summary) = merge_suggestion(&before, &suggestion_with(30));

    assert_eq!(summary.sheet_a_rows, 24);
    assert_eq!(summary.sheet_b_rows, 6);
    assert!(summary.warmup_updated);

    for i in 0..24 {
        let row = &after.sheet_a.exercises[i];
        assert_eq!(row.order, (i + 1).to_string());
        assert_eq!(row.exercise, format!("Exercise {i}"));
        assert_eq!(row.group, before.sheet_a.exercises[i].group);
    }
    for i in 0..6 {
        let row = &after.sheet_b.exercises[i];
        assert_eq!(row.order, (i + 25).to_string());
        assert_eq!(row.exercise, format!("Exercise {}", i + 24));
        assert_eq!(row.sets, "3");
    }
    assert_eq!(after.sheet_b.exercises[6..], before.sheet_b.exercises[6..]);
    assert_eq!(after.sheet_b.exercises[10].exercise, "Rosca Direta");

    assert_eq!(after.sheet_a.warmup, "10 min esteira");
    assert_eq!(after.sheet_b.warmup, before.sheet_b.warmup);
    assert_eq!(after.sheet_a.side_labels, before.sheet_a.side_labels);
}

#[test]
fn test_merge_keeps_fields_the_service_left_out() {
    let before = AppState::default().update_sheet(
        SheetId::A,
        SheetModel::empty(Split::A)
            .with_row_field(0, RowField::Kg, "20")
            .with_row_field(0, RowField::Obs, "drop-set")
            .with_header_field(HeaderField::Warmup, "Alongamento"),
    );
    let suggestion = WorkoutSuggestion {
        warmup: None,
        exercises: vec![SuggestedExercise {
            exercise: Some("Supino Reto".to_string()),
            ..Default::default()
        }],
    };
    let (after, summary) = merge_suggestion(&before, &suggestion);
    let row = &after.sheet_a.exercises[0];
    assert_eq!(row.exercise, "Supino Reto");
    assert_eq!(row.kg, "20");
    assert_eq!(row.obs, "drop-set");
    assert_eq!(after.sheet_a.warmup, "Alongamento");
    assert!(!summary.warmup_updated);
}

#[test]
fn test_merge_discards_exercises_beyond_both_sheets() {
    let (after, summary) = merge_suggestion(&AppState::default(), &suggestion_with(60));
    assert_eq!(summary.sheet_a_rows + summary.sheet_b_rows, 48);
    assert_eq!(after.sheet_b.exercises.len(), ROWS_PER_SHEET);
    assert_eq!(after.sheet_b.exercises[23].order, "48");
    assert_eq!(after.sheet_b.exercises[23].exercise, "Exercise 47");
}

#[test]
fn test_response_without_exercises_changes_nothing() {
    let before = AppState::default()
        .update_sheet(SheetId::A, SheetModel::empty(Split::A).with_row_field(3, RowField::Reps, "10"));

    let outcome = parse_suggestion(r#"{"warmup": "Bike"}"#);
    assert!(matches!(outcome, GenerationOutcome::Failure(_)));
    assert!(apply_outcome(&before, &outcome).is_none());

    assert!(matches!(parse_suggestion("not json"), GenerationOutcome::Failure(_)));
    assert_eq!(parse_suggestion("  "), GenerationOutcome::Empty);
    assert!(apply_outcome(&before, &GenerationOutcome::Empty).is_none());
}

#[test]
fn test_parse_suggestion_ignores_order_field() {
    let text = r#"{"exercises":[{"group":"Peito","order":"99","exercise":"Crucifixo","sets":"4","reps":"10"}]}"#;
    let GenerationOutcome::Success(suggestion) = parse_suggestion(text) else {
        panic!("expected a parsed suggestion");
    };
    let (after, _) = merge_suggestion(&AppState::default(), &suggestion);
    assert_eq!(after.sheet_a.exercises[0].order, "1");
    assert_eq!(after.sheet_a.exercises[0].exercise, "Crucifixo");
}

#[tokio::test]
async fn test_empty_goal_never_calls_the_service() -> Result<()> {
    let mut service = create_test_service()?;
    let before = service.state().clone();
    let generator = StubGenerator::new(GenerationOutcome::Success(suggestion_with(5)));

    assert_eq!(service.fill_from_goal("", &generator).await?, FillOutcome::EmptyGoal);
    assert_eq!(service.fill_from_goal("   ", &generator).await?, FillOutcome::EmptyGoal);
    assert_eq!(generator.calls.get(), 0);
    assert_eq!(service.state(), &before);
    assert!(service.store.load_raw()?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_fill_from_goal_merges_and_persists() -> Result<()> {
    let mut service = create_test_service()?;
    let generator = StubGenerator::new(GenerationOutcome::Success(suggestion_with(30)));

    let outcome = service.fill_from_goal("Hipertrofia", &generator).await?;
    let FillOutcome::Merged(summary) = outcome else {
        panic!("expected a merge, got {outcome:?}");
    };
    assert_eq!((summary.sheet_a_rows, summary.sheet_b_rows), (24, 6));
    assert_eq!(generator.calls.get(), 1);
    assert_eq!(generator.last_student.borrow().as_deref(), Some("Aluno"));
    assert!(!service.is_generating());
    assert_eq!(&service.store.load()?, service.state());
    Ok(())
}

#[tokio::test]
async fn test_failed_generation_is_a_no_op() -> Result<()> {
    let mut service = create_test_service()?;
    service.set_header_field(SheetId::A, HeaderField::StudentName, "Carla")?;
    let before = service.state().clone();
    let generator = StubGenerator::new(GenerationOutcome::Failure("timeout".to_string()));

    assert_eq!(service.fill_from_goal("Força", &generator).await?, FillOutcome::NoResult);
    assert_eq!(generator.last_student.borrow().as_deref(), Some("Carla"));
    assert_eq!(service.state(), &before);
    assert!(!service.is_generating());
    Ok(())
}

#[test]
fn test_state_round_trip_through_store() -> Result<()> {
    let store = StateStore::open_in_memory()?;
    let state = AppState::default()
        .update_sheet(
            SheetId::A,
            SheetModel::empty(Split::A)
                .with_header_field(HeaderField::StudentName, "Rui")
                .with_week_day_toggled(WeekDay::Sab)
                .with_side_label(1, "DIA 2")
                .with_row_field(5, RowField::Obs, "cadência 3s"),
        )
        .with_logo(Some("data:image/png;base64,AAAA".to_string()));

    store.save(&state)?;
    assert_eq!(store.load()?, state);
    assert!(store.saved_at()?.is_some());

    let raw = store.load_raw()?.unwrap_or_default();
    assert!(raw.contains("\"sheetA\"") && raw.contains("\"logoRef\""));
    assert!(raw.contains("\"studentName\":\"Rui\""));
    Ok(())
}

#[test]
fn test_corrupt_storage_falls_back_to_empty_sheets() -> Result<()> {
    let store = StateStore::open_in_memory()?;
    store.save_raw("{ this is not json")?;
    assert_eq!(store.load()?, AppState::default());

    // Parsable but with the wrong number of rows
    let mut broken = AppState::default();
    broken.sheet_b.exercises.truncate(3);
    store.save_raw(&serde_json::to_string(&broken)?)?;
    assert_eq!(store.load()?, AppState::default());

    store.clear()?;
    assert!(store.load_raw()?.is_none());
    assert_eq!(store.load()?, AppState::default());
    Ok(())
}

#[test]
fn test_service_restores_saved_state() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("sheets.sqlite");

    {
        let mut service = AppService::with_store(
            Config::default(),
            StateStore::open(&db_path)?,
            db_path.clone(),
            "test_config.toml".into(),
        )?;
        service.set_row_field(SheetId::A, 0, RowField::Exercise, "Supino Reto")?;
    }

    let service = AppService::with_store(
        Config::default(),
        StateStore::open(&db_path)?,
        db_path.clone(),
        "test_config.toml".into(),
    )?;
    assert_eq!(service.sheet(SheetId::A).exercises[0].exercise, "Supino Reto");
    Ok(())
}

#[test]
fn test_reset_clears_sheets_but_keeps_logo() -> Result<()> {
    let mut service = create_test_service()?;
    let dir = tempfile::tempdir()?;
    let logo_path = dir.path().join("logo.png");
    std::fs::write(&logo_path, [0x89, b'P', b'N', b'G'])?;

    service.set_logo_from_file(&logo_path)?;
    service.set_header_field(SheetId::A, HeaderField::StudentName, "Leo")?;
    service.toggle_week_day(SheetId::A, WeekDay::Seg)?;
    service.set_row_field(SheetId::B, 4, RowField::Exercise, "Leg Press")?;
    service.set_side_label(SheetId::B, 0, "B")?;

    service.reset()?;
    let state = service.state();
    assert_eq!(state.sheet_a.exercises.len(), ROWS_PER_SHEET);
    assert_eq!(state.sheet_b.exercises.len(), ROWS_PER_SHEET);
    assert!(state.sheet_a.exercises.iter().chain(&state.sheet_b.exercises).all(|r| r.exercise.is_empty()));
    assert_eq!(state.sheet_a.student_name, "");
    assert!(state.sheet_b.week_days.is_empty());
    assert_eq!(state.sheet_b.end_date, "");
    assert_eq!(state.sheet_a, SheetModel::empty(Split::A));
    assert_eq!(state.logo_ref.as_deref(), Some("data:image/png;base64,iVBORw=="));
    Ok(())
}

#[test]
fn test_logo_rejects_non_images() -> Result<()> {
    let mut service = create_test_service()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello")?;
    assert!(service.set_logo_from_file(&path).is_err());
    assert!(service.state().logo_ref.is_none());

    service.clear_logo()?;
    assert!(service.state().logo_ref.is_none());
    Ok(())
}

#[test]
fn test_export_csv_lists_both_sheets() -> Result<()> {
    let mut service = create_test_service()?;
    service.set_row_field(SheetId::B, 23, RowField::Reps, "15")?;

    let mut out = Vec::new();
    service.export_csv(&mut out)?;
    let text = String::from_utf8(out)?;
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 1 + 2 * ROWS_PER_SHEET);
    assert_eq!(lines[0], "sheet,group,order,exercise,kg,sets,reps,obs");
    assert_eq!(lines[1], "A,Peito,1,,,,,");
    assert_eq!(lines[48], "B,Glúteo,24,,,,15,");
    Ok(())
}

#[test]
fn test_config_round_trip_and_defaults() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");

    let config = load_config_util(&path)?;
    assert_eq!(config, Config::default());
    assert!(path.exists());

    let mut changed = config.clone();
    changed.student_placeholder = "Atleta".to_string();
    changed.ai.timeout_secs = 5;
    save_config_util(&path, &changed)?;
    assert_eq!(load_config_util(&path)?, changed);

    // Missing fields fall back to defaults
    std::fs::write(&path, "student_placeholder = \"X\"\n")?;
    let partial = load_config_util(&path)?;
    assert_eq!(partial.student_placeholder, "X");
    assert_eq!(partial.ai.model, "gemini-3-flash-preview");

    assert!(parse_color("yellow").is_ok());
    assert!(parse_color("chartreuse").is_err());
    Ok(())
}

#[tokio::test]
async fn test_generating_flag_is_visible_during_request() -> Result<()> {
    let mut service = create_test_service()?;
    let watcher = FlagWatcher {
        flag: service.generating_flag(),
        seen: Cell::new(None),
    };
    assert!(!service.is_generating());

    let outcome = service.fill_from_goal("treino de força", &watcher).await?;
    assert!(matches!(outcome, FillOutcome::NoResult));
    assert_eq!(watcher.seen.get(), Some(true));
    assert!(!service.is_generating());
    Ok(())
}

#[tokio::test]
async fn test_cancelled_generation_clears_generating_flag() -> Result<()> {
    let mut service = create_test_service()?;
    service.set_header_field(SheetId::A, HeaderField::StudentName, "Ana")?;
    let before = service.state().clone();
    let flag = service.generating_flag();

    let result = tokio::time::timeout(
        Duration::from_millis(50),
        service.fill_from_goal("hipertrofia", &HangingGenerator),
    )
    .await;
    assert!(result.is_err(), "generation should have timed out");

    assert!(!flag.get());
    assert!(!service.is_generating());
    assert_eq!(service.state(), &before);

    // A later request still goes through
    let stub = StubGenerator::new(GenerationOutcome::Success(suggestion_with(2)));
    assert!(matches!(
        service.fill_from_goal("hipertrofia", &stub).await?,
        FillOutcome::Merged(_)
    ));
    Ok(())
}

#[test]
fn test_malformed_sheet_update_does_not_wipe_saved_data() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("sheets.sqlite");

    {
        let mut service = open_service_at(&db_path)?;
        service.set_row_field(SheetId::A, 0, RowField::Exercise, "Supino Reto")?;
        service.set_header_field(SheetId::A, HeaderField::StudentName, "Ana")?;

        let mut extra_label = service.sheet(SheetId::B).clone();
        extra_label.side_labels.push("EXTRA".to_string());
        service.update_sheet(SheetId::B, extra_label)?;

        // Sheet A's layout routed into slot B
        let swapped = service.sheet(SheetId::A).with_header_field(HeaderField::StudentName, "Outro");
        service.update_sheet(SheetId::B, swapped)?;

        assert!(service.state().is_well_formed());
        assert_eq!(service.sheet(SheetId::B).student_name, "Ana");
    }

    let service = open_service_at(&db_path)?;
    assert_eq!(service.sheet(SheetId::A).exercises[0].exercise, "Supino Reto");
    assert_eq!(service.sheet(SheetId::A).student_name, "Ana");
    assert_eq!(service.sheet(SheetId::B).student_name, "Ana");
    assert_eq!(service.sheet(SheetId::B).side_labels.len(), Split::B.block_count());
    Ok(())
}

#[test]
fn test_sheet_update_through_logo_key_yields_nothing() {
    let state = AppState::default();
    let sheet = state.sheet_a.with_header_field(HeaderField::StudentName, "Ana");
    assert!(state.update(StateKey::Logo, sheet.clone()).is_none());
    assert_eq!(
        state.update(StateKey::Sheet(SheetId::A), sheet).map(|s| s.sheet_b.student_name),
        Some("Ana".to_string())
    );
}

#[test]
fn test_unknown_week_day_codes_do_not_discard_state() -> Result<()> {
    let store = StateStore::open_in_memory()?;
    let state = AppState::default()
        .update_sheet(
            SheetId::A,
            SheetModel::empty(Split::A)
                .with_header_field(HeaderField::StudentName, "Ana")
                .with_row_field(0, RowField::Exercise, "Supino Reto"),
        );

    let mut blob = serde_json::to_value(&state)?;
    for key in ["sheetA", "sheetB"] {
        blob[key]["weekDays"] = serde_json::json!(["SAB", "DOM", "SEG", "SEG"]);
    }
    store.save_raw(&serde_json::to_string(&blob)?)?;

    let restored = store.load()?;
    assert_eq!(restored.sheet_a.week_days, vec![WeekDay::Sab, WeekDay::Seg]);
    assert_eq!(restored.sheet_b.week_days, vec![WeekDay::Sab, WeekDay::Seg]);
    assert_eq!(restored.sheet_a.exercises[0].exercise, "Supino Reto");
    assert_eq!(restored.sheet_b.student_name, "Ana");

    // Saving writes the accented canonical code back
    store.save(&restored)?;
    let raw = store.load_raw()?.unwrap_or_default();
    assert!(raw.contains("\"SÁB\""));
    Ok(())
}
