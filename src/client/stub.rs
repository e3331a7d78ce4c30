use async_trait::async_trait;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use serde_json::Map;
use tracing::info;

use crate::client::ScheduleService;
use crate::error::AppError;
use crate::models::{CalendarSubmission, Placement, ScheduleOption, ScheduleRequest, ScheduleResult};

const PROFESSORS: [&str; 4] = ["Dr. Alvarez", "Dr. Chen", "Prof. Okafor", "Dr. Lindqvist"];
const ROOMS: [&str; 4] = ["Kemper 1001", "Olson 158", "Wellman 126", "Haring 2205"];
const CLASS_MINUTES: i64 = 80;
const LAST_START_HOUR: u32 = 21;

/// Local stand-in for the scheduling backend.
///
/// Builds two candidates from the requested courses: one with classes back
/// to back, one with an hour between classes. Every calendar submission with
/// at least one placement is accepted.
pub struct StubScheduleService {
    anchor: Option<NaiveDate>,
}

impl StubScheduleService {
    pub fn new() -> Self {
        Self { anchor: None }
    }

    /// Start times are computed from `anchor` instead of today.
    pub fn with_anchor(anchor: NaiveDate) -> Self {
        Self { anchor: Some(anchor) }
    }

    fn first_class_day(&self, request: &ScheduleRequest) -> NaiveDate {
        let anchor = self.anchor.unwrap_or_else(|| Local::now().date_naive());
        let target = request
            .days_of_week
            .first()
            .and_then(|day| day.weekdays().first().copied())
            .unwrap_or(0);
        let current = anchor.weekday().num_days_from_monday();
        anchor + Duration::days(((target + 7 - current) % 7) as i64)
    }

    fn build_option(&self, request: &ScheduleRequest, variant: usize) -> ScheduleOption {
        let day = self.first_class_day(request);
        let first_hour = request.time_preference.first_hour();
        let gap = variant as u32 + 1;

        let schedule = request
            .courses
            .iter()
            .enumerate()
            .map(|(i, course)| {
                let hour = (first_hour + i as u32 * gap).min(LAST_START_HOUR);
                let start = day.and_hms_opt(hour, 0, 0);
                Placement {
                    summary: course.clone(),
                    description: PROFESSORS[(i + variant) % PROFESSORS.len()].to_string(),
                    location: Some(ROOMS[(i + variant * 2) % ROOMS.len()].to_string()),
                    start: start.map(format_naive),
                    end: start.map(|s| format_naive(s + Duration::minutes(CLASS_MINUTES))),
                    extra: Map::new(),
                }
            })
            .collect();

        let time = request.time_preference.label().to_lowercase();
        let (mut pros, cons) = if variant == 0 {
            (
                vec![
                    format!("All classes in the {}", time),
                    "Shortest time on campus".to_string(),
                ],
                vec!["No breaks between classes".to_string()],
            )
        } else {
            (
                vec!["Breaks between every class".to_string()],
                vec!["Longer day on campus".to_string()],
            )
        };
        if !request.teacher_preference.trim().is_empty() {
            pros.push(format!(
                "Instructors matched to: {}",
                request.teacher_preference.trim()
            ));
        }

        ScheduleOption { schedule, pros, cons }
    }
}

impl Default for StubScheduleService {
    fn default() -> Self {
        Self::new()
    }
}

fn format_naive(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[async_trait]
impl ScheduleService for StubScheduleService {
    async fn generate(&self, request: &ScheduleRequest) -> Result<ScheduleResult, AppError> {
        if request.courses.is_empty() {
            return Err(AppError::Rejected(Some("No courses requested".to_string())));
        }
        info!(
            "stub: generating schedules for {} course(s), {} quarter",
            request.courses.len(),
            request.quarter.as_str()
        );
        Ok(ScheduleResult {
            recommendations: (0..2).map(|variant| self.build_option(request, variant)).collect(),
        })
    }

    async fn submit(&self, submission: &CalendarSubmission) -> Result<(), AppError> {
        if submission.schedule.is_empty() {
            return Err(AppError::Rejected(Some("Schedule is empty".to_string())));
        }
        info!(
            "stub: accepted {} event(s) for calendar '{}'",
            submission.schedule.len(),
            submission.calendar_name
        );
        Ok(())
    }
}
