use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of empty course slots the form starts with.
pub const INITIAL_COURSE_SLOTS: usize = 4;

pub const MISSING_FIELDS_MESSAGE: &str =
    "Please complete all required fields before generating schedule.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quarter {
    Fall,
    Winter,
    Spring,
}

impl Quarter {
    pub const ALL: [Quarter; 3] = [Quarter::Fall, Quarter::Winter, Quarter::Spring];

    pub fn as_str(self) -> &'static str {
        match self {
            Quarter::Fall => "fall",
            Quarter::Winter => "winter",
            Quarter::Spring => "spring",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quarter::Fall => "Fall",
            Quarter::Winter => "Winter",
            Quarter::Spring => "Spring",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Mw,
    Mwf,
    Tth,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 8] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Mw,
        DayOfWeek::Mwf,
        DayOfWeek::Tth,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Mw => "mw",
            DayOfWeek::Mwf => "mwf",
            DayOfWeek::Tth => "tth",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Mw => "Monday/Wednesday",
            DayOfWeek::Mwf => "Monday/Wednesday/Friday",
            DayOfWeek::Tth => "Tuesday/Thursday",
        }
    }

    /// Weekdays covered by this selection, Monday = 0.
    pub fn weekdays(self) -> &'static [u32] {
        match self {
            DayOfWeek::Monday => &[0],
            DayOfWeek::Tuesday => &[1],
            DayOfWeek::Wednesday => &[2],
            DayOfWeek::Thursday => &[3],
            DayOfWeek::Friday => &[4],
            DayOfWeek::Mw => &[0, 2],
            DayOfWeek::Mwf => &[0, 2, 4],
            DayOfWeek::Tth => &[1, 3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 3] = [TimeOfDay::Morning, TimeOfDay::Afternoon, TimeOfDay::Evening];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
        }
    }

    /// First class hour in this part of the day.
    pub fn first_hour(self) -> u32 {
        match self {
            TimeOfDay::Morning => 9,
            TimeOfDay::Afternoon => 13,
            TimeOfDay::Evening => 18,
        }
    }
}

macro_rules! select_value {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $ty::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s) || v.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        let options: Vec<&str> = $ty::ALL.iter().map(|v| v.as_str()).collect();
                        AppError::Validation(format!(
                            "Unknown {} '{}' (expected one of: {})",
                            $what,
                            s,
                            options.join(", ")
                        ))
                    })
            }
        }
    };
}

select_value!(Quarter, "quarter");
select_value!(DayOfWeek, "day of week");
select_value!(TimeOfDay, "time of day");

/// Everything the user has typed or picked on the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub course_names: Vec<String>,
    pub quarter: Option<Quarter>,
    pub day_of_week: Option<DayOfWeek>,
    pub time_of_day: Option<TimeOfDay>,
    pub professor_preferences: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            course_names: vec![String::new(); INITIAL_COURSE_SLOTS],
            quarter: None,
            day_of_week: None,
            time_of_day: None,
            professor_preferences: String::new(),
        }
    }
}

impl FormState {
    pub fn add_course_slot(&mut self) {
        self.course_names.push(String::new());
    }

    /// Removes the slot at `index`. The last remaining slot is never removed.
    pub fn remove_course_slot(&mut self, index: usize) -> bool {
        if self.course_names.len() <= 1 || index >= self.course_names.len() {
            return false;
        }
        self.course_names.remove(index);
        true
    }

    pub fn set_course_name(&mut self, index: usize, value: impl Into<String>) -> Result<(), AppError> {
        let slots = self.course_names.len();
        let slot = self.course_names.get_mut(index).ok_or_else(|| {
            AppError::Validation(format!("Course slot {} does not exist ({} slots)", index + 1, slots))
        })?;
        *slot = value.into();
        Ok(())
    }

    /// Course names that are non-empty after trimming, trimmed, in slot order.
    pub fn filled_courses(&self) -> Vec<String> {
        self.course_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn to_request(&self) -> Result<ScheduleRequest, AppError> {
        let courses = self.filled_courses();
        match (self.quarter, self.day_of_week, self.time_of_day) {
            (Some(quarter), Some(day), Some(time)) if !courses.is_empty() => Ok(ScheduleRequest {
                courses,
                quarter,
                days_of_week: vec![day],
                time_preference: time,
                teacher_preference: self.professor_preferences.clone(),
            }),
            _ => Err(AppError::Validation(MISSING_FIELDS_MESSAGE.to_string())),
        }
    }
}

/// Body of `POST /api/generate-schedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub courses: Vec<String>,
    pub quarter: Quarter,
    pub days_of_week: Vec<DayOfWeek>,
    pub time_preference: TimeOfDay,
    #[serde(default)]
    pub teacher_preference: String,
}

/// Echo of the form shown once a schedule has been added to the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedConfirmation {
    pub course_names: Vec<String>,
    pub quarter: Option<Quarter>,
    pub day_of_week: Option<DayOfWeek>,
    pub time_of_day: Option<TimeOfDay>,
    pub professor_preferences: String,
}

impl From<&FormState> for SubmittedConfirmation {
    fn from(form: &FormState) -> Self {
        Self {
            course_names: form.filled_courses(),
            quarter: form.quarter,
            day_of_week: form.day_of_week,
            time_of_day: form.time_of_day,
            professor_preferences: form.professor_preferences.clone(),
        }
    }
}
