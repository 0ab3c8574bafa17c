//src/sheet.rs
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use strum_macros::EnumIter;
use tracing::{debug, warn};

/// Every sheet holds exactly this many exercise rows.
pub const ROWS_PER_SHEET: usize = 24;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    A,
    B,
}

impl Split {
    /// The block layout this split is created with.
    #[must_use]
    pub const fn layout(self) -> &'static [GroupBlock] {
        match self {
            Self::A => SPLIT_A_LAYOUT,
            Self::B => SPLIT_B_LAYOUT,
        }
    }

    #[must_use]
    pub const fn block_count(self) -> usize {
        self.layout().len()
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

impl TryFrom<&str> for Split {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            _ => anyhow::bail!("Invalid training split: {}", value),
        }
    }
}

/// A contiguous run of rows sharing one muscle group label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBlock {
    pub name: &'static str,
    pub size: usize,
}

const SPLIT_A_LAYOUT: &[GroupBlock] = &[
    GroupBlock { name: "Peito", size: 6 },
    GroupBlock { name: "Costas", size: 8 },
    GroupBlock { name: "Ombro", size: 6 },
    GroupBlock { name: "Abs", size: 4 },
];

const SPLIT_B_LAYOUT: &[GroupBlock] = &[
    GroupBlock { name: "Pernas", size: 8 },
    GroupBlock { name: "Bíceps", size: 5 },
    GroupBlock { name: "Tríceps", size: 5 },
    GroupBlock { name: "Glúteo", size: 6 },
];

/// Suggestion lists offered while typing an exercise name, keyed by group.
const EXERCISE_DATABASE: &[(&str, &[&str])] = &[
    ("Peito", &["Supino Reto", "Supino Inclinado", "Crucifixo", "Peck Deck", "Crossover", "Supino Halter"]),
    ("Costas", &["Puxada Alta", "Remada Baixa", "Remada Curvada", "Serrote", "Barra Fixa", "Pulldown"]),
    ("Pernas", &["Agachamento", "Leg Press", "Extensora", "Flexora", "Stiff", "Afundo", "Hack"]),
    ("Ombro", &["Desenvolvimento", "Elevação Lateral", "Elevação Frontal", "Crucifixo Inverso"]),
    ("Bíceps", &["Rosca Direta", "Rosca Alternada", "Rosca Martelo", "Rosca Scott"]),
    ("Tríceps", &["Tríceps Pulley", "Tríceps Corda", "Tríceps Testa", "Tríceps Francês"]),
    ("Abs", &["Abdominal Supra", "Abdominal Infra", "Prancha", "Abdominal Remador"]),
    ("Glúteo", &["Elevação Pélvica", "Cadeira Abdutora", "Glúteo 4 Apoios", "Glúteo no Cabo", "Glúteo Máquina", "Extensão de Quadril"]),
    ("Abs/Cardio", &["Abdominal Supra", "Abdominal Infra", "Prancha", "Esteira", "Bike", "Elíptico"]),
    ("Cardio", &["Esteira", "Bike", "Elíptico"]),
];

/// Exercise suggestions for a muscle group; empty for unknown groups.
#[must_use]
pub fn suggestions_for_group(group: &str) -> &'static [&'static str] {
    EXERCISE_DATABASE
        .iter()
        .find(|(name, _)| *name == group)
        .map(|(_, list)| *list)
        .unwrap_or_default()
}

/// Index of the first row of `block_idx` in a sheet of the given split.
/// Indices past the last block yield the total row count.
#[must_use]
pub fn block_start_index(split: Split, block_idx: usize) -> usize {
    split.layout().iter().take(block_idx).map(|b| b.size).sum()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum WeekDay {
    #[serde(rename = "SEG")]
    Seg,
    #[serde(rename = "TER")]
    Ter,
    #[serde(rename = "QUA")]
    Qua,
    #[serde(rename = "QUI")]
    Qui,
    #[serde(rename = "SEX")]
    Sex,
    #[serde(rename = "SÁB", alias = "SAB")]
    Sab,
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::Seg => "SEG",
            Self::Ter => "TER",
            Self::Qua => "QUA",
            Self::Qui => "QUI",
            Self::Sex => "SEX",
            Self::Sab => "SÁB",
        };
        write!(f, "{code}")
    }
}

impl TryFrom<&str> for WeekDay {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_uppercase().as_str() {
            "SEG" | "MON" => Ok(Self::Seg),
            "TER" | "TUE" => Ok(Self::Ter),
            "QUA" | "WED" => Ok(Self::Qua),
            "QUI" | "THU" => Ok(Self::Qui),
            "SEX" | "FRI" => Ok(Self::Sex),
            "SÁB" | "SAB" | "SAT" => Ok(Self::Sab), // Allow the unaccented spelling
            _ => anyhow::bail!("Invalid week day: {}", value),
        }
    }
}

/// Reads a stored day list, dropping unknown codes and repeats instead of
/// failing the whole sheet.
fn lenient_week_days<'de, D>(deserializer: D) -> Result<Vec<WeekDay>, D::Error>
where
    D: Deserializer<'de>,
{
    let codes = Vec::<String>::deserialize(deserializer)?;
    let mut days = Vec::with_capacity(codes.len());
    for code in &codes {
        match WeekDay::try_from(code.as_str()) {
            Ok(day) if !days.contains(&day) => days.push(day),
            Ok(_) => debug!("Dropping repeated week day {}", code),
            Err(_) => warn!("Dropping unknown week day code {:?}", code),
        }
    }
    Ok(days)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ExerciseRow {
    pub group: String,
    pub order: String,
    pub exercise: String,
    pub kg: String,
    pub sets: String,
    pub reps: String,
    pub obs: String,
}

/// Cells of a row that may be edited after the sheet is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    Exercise,
    Kg,
    Sets,
    Reps,
    Obs,
}

impl ExerciseRow {
    #[must_use]
    pub fn with_field(&self, field: RowField, value: &str) -> Self {
        let mut row = self.clone();
        let cell = match field {
            RowField::Exercise => &mut row.exercise,
            RowField::Kg => &mut row.kg,
            RowField::Sets => &mut row.sets,
            RowField::Reps => &mut row.reps,
            RowField::Obs => &mut row.obs,
        };
        *cell = value.to_string();
        row
    }
}

/// Header-level text fields of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    TrainingDayName,
    StudentName,
    BirthDate,
    StartDate,
    EndDate,
    Warmup,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SheetModel {
    pub training_split: Split,
    pub training_day_name: String,
    pub student_name: String,
    pub birth_date: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(deserialize_with = "lenient_week_days")]
    pub week_days: Vec<WeekDay>,
    pub warmup: String,
    pub exercises: Vec<ExerciseRow>,
    pub side_labels: Vec<String>, // Vertical "TREINO/DIA" tags, one per block
}

impl SheetModel {
    /// Builds a blank sheet: 24 numbered rows, group names on each block's
    /// first row, one empty side label per block.
    #[must_use]
    pub fn empty(split: Split) -> Self {
        let layout = split.layout();
        let mut exercises = Vec::with_capacity(ROWS_PER_SHEET);
        for block in layout {
            for i in 0..block.size {
                exercises.push(ExerciseRow {
                    group: if i == 0 { block.name.to_string() } else { String::new() },
                    order: (exercises.len() + 1).to_string(),
                    ..Default::default()
                });
            }
        }

        Self {
            training_split: split,
            training_day_name: String::new(),
            student_name: String::new(),
            birth_date: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            week_days: Vec::new(),
            warmup: String::new(),
            exercises,
            side_labels: vec![String::new(); layout.len()],
        }
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.training_split.block_count()
    }

    /// Checks the shape a restored sheet must have before it can be used.
    #[must_use]
    pub fn is_well_formed(&self, expected: Split) -> bool {
        self.training_split == expected
            && self.exercises.len() == ROWS_PER_SHEET
            && self.side_labels.len() == expected.block_count()
    }

    #[must_use]
    pub fn with_row_field(&self, index: usize, field: RowField, value: &str) -> Self {
        let mut sheet = self.clone();
        match sheet.exercises.get_mut(index) {
            Some(row) => *row = row.with_field(field, value),
            None => debug!("Ignoring edit of row {} on sheet {}", index, self.training_split),
        }
        sheet
    }

    #[must_use]
    pub fn with_side_label(&self, block_idx: usize, value: &str) -> Self {
        let mut sheet = self.clone();
        match sheet.side_labels.get_mut(block_idx) {
            Some(label) => *label = value.to_string(),
            None => debug!("Ignoring side label for block {} on sheet {}", block_idx, self.training_split),
        }
        sheet
    }

    #[must_use]
    pub fn with_header_field(&self, field: HeaderField, value: &str) -> Self {
        let mut sheet = self.clone();
        let target = match field {
            HeaderField::TrainingDayName => &mut sheet.training_day_name,
            HeaderField::StudentName => &mut sheet.student_name,
            HeaderField::BirthDate => &mut sheet.birth_date,
            HeaderField::StartDate => &mut sheet.start_date,
            HeaderField::EndDate => &mut sheet.end_date,
            HeaderField::Warmup => &mut sheet.warmup,
        };
        *target = value.to_string();
        sheet
    }

    /// Removes the day if selected, otherwise appends it.
    #[must_use]
    pub fn with_week_day_toggled(&self, day: WeekDay) -> Self {
        let mut sheet = self.clone();
        if sheet.week_days.contains(&day) {
            sheet.week_days.retain(|d| *d != day);
        } else {
            sheet.week_days.push(day);
        }
        sheet
    }

    /// Iterates blocks in layout order with the rows each one spans.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &GroupBlock, &[ExerciseRow])> + '_ {
        let split = self.training_split;
        split.layout().iter().enumerate().map(move |(idx, block)| {
            let start = block_start_index(split, idx).min(self.exercises.len());
            let end = (start + block.size).min(self.exercises.len());
            (idx, block, &self.exercises[start..end])
        })
    }

    /// Suggestions keyed by the group label on the block's first row.
    #[must_use]
    pub fn suggestions(&self, block_idx: usize) -> &'static [&'static str] {
        if block_idx >= self.block_count() {
            return &[];
        }
        let start = block_start_index(self.training_split, block_idx);
        self.exercises
            .get(start)
            .map(|row| suggestions_for_group(&row.group))
            .unwrap_or_default()
    }
}
