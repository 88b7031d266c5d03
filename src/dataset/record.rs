use serde::{Deserialize, Serialize};

use super::column::{Column, ColumnKind};

/// One absence event from the dataset, keyed by its row identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbsenceRecord {
    pub row_id: i64,
    pub employee_id: i64,
    pub reason_code: i64,
    pub month: i64,
    pub day_of_week: i64,
    pub season: i64,
    pub transportation_expense: f64,
    pub distance: f64,
    pub service_time: i64,
    pub age: i64,
    pub workload: f64,
    pub hit_target: i64,
    pub disciplinary_failure: i64,
    pub education: i64,
    pub children: i64,
    pub social_drinker: i64,
    pub social_smoker: i64,
    pub pets: i64,
    pub weight: f64,
    pub height: f64,
    pub bmi: f64,
    pub absence_hours: f64,
}

impl AbsenceRecord {
    pub fn value(&self, column: Column) -> f64 {
        match column {
            Column::EmployeeId => self.employee_id as f64,
            Column::ReasonCode => self.reason_code as f64,
            Column::Month => self.month as f64,
            Column::DayOfWeek => self.day_of_week as f64,
            Column::Season => self.season as f64,
            Column::TransportationExpense => self.transportation_expense,
            Column::Distance => self.distance,
            Column::ServiceTime => self.service_time as f64,
            Column::Age => self.age as f64,
            Column::Workload => self.workload,
            Column::HitTarget => self.hit_target as f64,
            Column::DisciplinaryFailure => self.disciplinary_failure as f64,
            Column::Education => self.education as f64,
            Column::Children => self.children as f64,
            Column::SocialDrinker => self.social_drinker as f64,
            Column::SocialSmoker => self.social_smoker as f64,
            Column::Pets => self.pets as f64,
            Column::Weight => self.weight,
            Column::Height => self.height,
            Column::Bmi => self.bmi,
            Column::AbsenceHours => self.absence_hours,
        }
    }

    /// Integer-coded columns reject fractional input so group keys stay exact.
    pub fn set(&mut self, column: Column, raw: f64) -> Result<(), String> {
        if !raw.is_finite() {
            return Err(format!("{} is not a finite number", column.as_str()));
        }

        match column {
            Column::EmployeeId => self.employee_id = integer_code(column, raw)?,
            Column::ReasonCode => self.reason_code = integer_code(column, raw)?,
            Column::Month => self.month = integer_code(column, raw)?,
            Column::DayOfWeek => self.day_of_week = integer_code(column, raw)?,
            Column::Season => self.season = integer_code(column, raw)?,
            Column::TransportationExpense => self.transportation_expense = raw,
            Column::Distance => self.distance = raw,
            Column::ServiceTime => self.service_time = integer_code(column, raw)?,
            Column::Age => self.age = integer_code(column, raw)?,
            Column::Workload => self.workload = raw,
            Column::HitTarget => self.hit_target = integer_code(column, raw)?,
            Column::DisciplinaryFailure => {
                self.disciplinary_failure = integer_code(column, raw)?
            }
            Column::Education => self.education = integer_code(column, raw)?,
            Column::Children => self.children = integer_code(column, raw)?,
            Column::SocialDrinker => self.social_drinker = integer_code(column, raw)?,
            Column::SocialSmoker => self.social_smoker = integer_code(column, raw)?,
            Column::Pets => self.pets = integer_code(column, raw)?,
            Column::Weight => self.weight = raw,
            Column::Height => self.height = raw,
            Column::Bmi => self.bmi = raw,
            Column::AbsenceHours => self.absence_hours = raw,
        }
        Ok(())
    }
}

fn integer_code(column: Column, raw: f64) -> Result<i64, String> {
    debug_assert_eq!(column.kind(), ColumnKind::Integer);
    if raw.fract() != 0.0 {
        return Err(format!(
            "{} expects an integer code, found {raw}",
            column.as_str()
        ));
    }
    Ok(raw as i64)
}
