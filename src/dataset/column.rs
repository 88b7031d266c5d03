use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    Integer,
    Real,
}

/// Canonical dataset column. Declaration order matches the CSV export.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    EmployeeId,
    ReasonCode,
    Month,
    DayOfWeek,
    Season,
    TransportationExpense,
    Distance,
    ServiceTime,
    Age,
    Workload,
    HitTarget,
    DisciplinaryFailure,
    Education,
    Children,
    SocialDrinker,
    SocialSmoker,
    Pets,
    Weight,
    Height,
    Bmi,
    AbsenceHours,
}

impl Column {
    pub const ALL: [Column; 21] = [
        Column::EmployeeId,
        Column::ReasonCode,
        Column::Month,
        Column::DayOfWeek,
        Column::Season,
        Column::TransportationExpense,
        Column::Distance,
        Column::ServiceTime,
        Column::Age,
        Column::Workload,
        Column::HitTarget,
        Column::DisciplinaryFailure,
        Column::Education,
        Column::Children,
        Column::SocialDrinker,
        Column::SocialSmoker,
        Column::Pets,
        Column::Weight,
        Column::Height,
        Column::Bmi,
        Column::AbsenceHours,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmployeeId => "employee_id",
            Self::ReasonCode => "reason_code",
            Self::Month => "month",
            Self::DayOfWeek => "day_of_week",
            Self::Season => "season",
            Self::TransportationExpense => "transportation_expense",
            Self::Distance => "distance",
            Self::ServiceTime => "service_time",
            Self::Age => "age",
            Self::Workload => "workload",
            Self::HitTarget => "hit_target",
            Self::DisciplinaryFailure => "disciplinary_failure",
            Self::Education => "education",
            Self::Children => "children",
            Self::SocialDrinker => "social_drinker",
            Self::SocialSmoker => "social_smoker",
            Self::Pets => "pets",
            Self::Weight => "weight",
            Self::Height => "height",
            Self::Bmi => "bmi",
            Self::AbsenceHours => "absence_hours",
        }
    }

    /// Header used by the published absenteeism CSV.
    pub fn label(self) -> &'static str {
        match self {
            Self::EmployeeId => "ID",
            Self::ReasonCode => "Reason for absence",
            Self::Month => "Month of absence",
            Self::DayOfWeek => "Day of the week",
            Self::Season => "Seasons",
            Self::TransportationExpense => "Transportation expense",
            Self::Distance => "Distance from Residence to Work",
            Self::ServiceTime => "Service time",
            Self::Age => "Age",
            Self::Workload => "Work load Average/day",
            Self::HitTarget => "Hit target",
            Self::DisciplinaryFailure => "Disciplinary failure",
            Self::Education => "Education",
            Self::Children => "Son",
            Self::SocialDrinker => "Social drinker",
            Self::SocialSmoker => "Social smoker",
            Self::Pets => "Pet",
            Self::Weight => "Weight",
            Self::Height => "Height",
            Self::Bmi => "Body mass index",
            Self::AbsenceHours => "Absenteeism time in hours",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Self::TransportationExpense
            | Self::Distance
            | Self::Workload
            | Self::Weight
            | Self::Height
            | Self::Bmi
            | Self::AbsenceHours => ColumnKind::Real,
            _ => ColumnKind::Integer,
        }
    }

    /// Matches a raw CSV header; the export pads some headers with spaces.
    pub fn from_label(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|column| column.label().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const REASON_DESCRIPTIONS: [&str; 29] = [
    "Unknown",
    "Infectious diseases",
    "Neoplasms",
    "Blood diseases",
    "Endocrine diseases",
    "Mental disorders",
    "Nervous system",
    "Eye diseases",
    "Ear diseases",
    "Circulatory system",
    "Respiratory system",
    "Digestive system",
    "Skin diseases",
    "Musculoskeletal",
    "Genitourinary",
    "Pregnancy",
    "Perinatal conditions",
    "Congenital malformations",
    "Abnormal findings",
    "Injury/poisoning",
    "External causes",
    "Health factors",
    "Patient follow-up",
    "Medical consultation",
    "Blood donation",
    "Lab examination",
    "Unjustified absence",
    "Physiotherapy",
    "Dental consultation",
];

pub fn reason_description(code: i64) -> &'static str {
    usize::try_from(code)
        .ok()
        .and_then(|index| REASON_DESCRIPTIONS.get(index).copied())
        .unwrap_or("Unknown")
}

const MONTH_NAMES: [&str; 13] = [
    "Unknown",
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_name(month: i64) -> String {
    usize::try_from(month)
        .ok()
        .and_then(|index| MONTH_NAMES.get(index))
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| month.to_string())
}
