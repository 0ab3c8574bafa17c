//src/sync.rs
use crate::sheet::{SheetModel, Split};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Which of the two linked sheets an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetId {
    A,
    B,
}

impl SheetId {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    #[must_use]
    pub const fn split(self) -> Split {
        match self {
            Self::A => Split::A,
            Self::B => Split::B,
        }
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.split())
    }
}

/// Top-level keys of the persisted state, as named in the stored JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKey {
    Sheet(SheetId),
    Logo,
}

impl TryFrom<&str> for StateKey {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "sheetA" => Ok(Self::Sheet(SheetId::A)),
            "sheetB" => Ok(Self::Sheet(SheetId::B)),
            "logoRef" => Ok(Self::Logo),
            _ => anyhow::bail!("Unknown state key: {}", value),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub sheet_a: SheetModel,
    pub sheet_b: SheetModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_ref: Option<String>, // data URI
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            sheet_a: SheetModel::empty(Split::A),
            sheet_b: SheetModel::empty(Split::B),
            logo_ref: None,
        }
    }
}

/// Copies the shared header fields of `edited` onto `other`; everything else
/// on `other` is kept.
#[must_use]
pub fn mirror(edited: &SheetModel, other: &SheetModel) -> SheetModel {
    SheetModel {
        student_name: edited.student_name.clone(),
        week_days: edited.week_days.clone(),
        end_date: edited.end_date.clone(),
        ..other.clone()
    }
}

impl AppState {
    #[must_use]
    pub const fn sheet(&self, which: SheetId) -> &SheetModel {
        match which {
            SheetId::A => &self.sheet_a,
            SheetId::B => &self.sheet_b,
        }
    }

    /// Stores `new_sheet` verbatim and pushes its student name, week days and
    /// end date onto the other sheet. A sheet whose split, row count or side
    /// label count does not fit the slot is ignored.
    #[must_use]
    pub fn update_sheet(&self, which: SheetId, new_sheet: SheetModel) -> Self {
        if !new_sheet.is_well_formed(which.split()) {
            warn!("Ignoring sheet {} update with a layout that does not match the slot", which);
            return self.clone();
        }
        let other = mirror(&new_sheet, self.sheet(which.other()));
        let (sheet_a, sheet_b) = match which {
            SheetId::A => (new_sheet, other),
            SheetId::B => (other, new_sheet),
        };
        Self {
            sheet_a,
            sheet_b,
            logo_ref: self.logo_ref.clone(),
        }
    }

    /// Key-routed variant of [`Self::update_sheet`]. The logo key is not a
    /// sheet and leaves the state untouched; returns `None` in that case.
    #[must_use]
    pub fn update(&self, key: StateKey, new_sheet: SheetModel) -> Option<Self> {
        match key {
            StateKey::Sheet(which) => Some(self.update_sheet(which, new_sheet)),
            StateKey::Logo => {
                debug!("Ignoring sheet update routed through the logo key");
                None
            }
        }
    }

    /// Fresh empty sheets for both splits. The logo survives a reset.
    #[must_use]
    pub fn reset(&self) -> Self {
        Self {
            logo_ref: self.logo_ref.clone(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_logo(&self, logo_ref: Option<String>) -> Self {
        Self {
            logo_ref,
            ..self.clone()
        }
    }

    /// True when both sheets carry the layout they were created with.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.sheet_a.is_well_formed(Split::A) && self.sheet_b.is_well_formed(Split::B)
    }

    #[must_use]
    pub fn shared_fields_in_sync(&self) -> bool {
        self.sheet_a.student_name == self.sheet_b.student_name
            && self.sheet_a.week_days == self.sheet_b.week_days
            && self.sheet_a.end_date == self.sheet_b.end_date
    }
}
