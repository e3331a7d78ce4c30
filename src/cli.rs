use std::fmt::Write as _;
use std::io::{self, Write};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::error::AppError;
use crate::models::{DayOfWeek, FormState, Quarter, ScheduleResult, SubmittedConfirmation, TimeOfDay};
use crate::services::notify::{ConfirmPrompt, Notification, NotificationKind, Notifier};
use crate::services::{ScheduleController, ViewState};

pub const HELP: &str = "\
Commands:
  show                  show the form and any schedule options
  add                   add an empty course slot
  remove <n>            remove course slot n
  course <n> <name>     set course slot n
  quarter <q>           fall | winter | spring (empty to clear)
  day <d>               monday .. friday | mw | mwf | tth (empty to clear)
  time <t>              morning | afternoon | evening (empty to clear)
  prof <text>           what you want in a professor
  generate              generate schedule options
  select <n>            pick schedule option n
  submit                add the selected option to the calendar
  redo                  clear the form and start over
  help                  show this message
  quit                  leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Add,
    Remove(usize),
    Course(usize, String),
    Quarter(Option<Quarter>),
    Day(Option<DayOfWeek>),
    Time(Option<TimeOfDay>),
    Prof(String),
    Generate,
    Select(usize),
    Submit,
    Redo,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, AppError> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match word.to_ascii_lowercase().as_str() {
            "show" => Command::Show,
            "add" => Command::Add,
            "remove" => Command::Remove(parse_position(rest)?),
            "course" => {
                let (position, name) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Command::Course(parse_position(position)?, name.trim().to_string())
            }
            "quarter" => Command::Quarter(parse_selection(rest)?),
            "day" => Command::Day(parse_selection(rest)?),
            "time" => Command::Time(parse_selection(rest)?),
            "prof" => Command::Prof(rest.to_string()),
            "generate" => Command::Generate,
            "select" => Command::Select(parse_position(rest)?),
            "submit" => Command::Submit,
            "redo" => Command::Redo,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(AppError::Validation(format!(
                    "Unknown command '{}', type 'help' for a list",
                    other
                )));
            }
        };
        Ok(command)
    }
}

/// 1-based position typed by the user to 0-based index.
fn parse_position(s: &str) -> Result<usize, AppError> {
    match s.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(AppError::Validation(format!("Expected a position starting at 1, got '{}'", s))),
    }
}

fn parse_selection<T>(s: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr<Err = AppError>,
{
    if s.is_empty() || s.eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        s.parse().map(Some)
    }
}

pub fn format_time(time: Option<DateTime<Local>>) -> String {
    time.map(|t| t.format("%a %b %-d, %-I:%M %p").to_string())
        .unwrap_or_else(|| "TBA".to_string())
}

fn label_or_blank<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "(not selected)".to_string())
}

pub fn render_form(form: &FormState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Courses:");
    for (i, name) in form.course_names.iter().enumerate() {
        let name = if name.trim().is_empty() { "(empty)" } else { name.as_str() };
        let _ = writeln!(out, "  {}. {}", i + 1, name);
    }
    let _ = writeln!(out, "Quarter:      {}", label_or_blank(form.quarter));
    let _ = writeln!(out, "Day of week:  {}", label_or_blank(form.day_of_week));
    let _ = writeln!(out, "Time of day:  {}", label_or_blank(form.time_of_day));
    if !form.professor_preferences.trim().is_empty() {
        let _ = writeln!(out, "Professor:    {}", form.professor_preferences.trim());
    }
    out
}

pub fn render_results(results: &ScheduleResult, selected: Option<usize>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Your Schedule");
    if results.is_empty() {
        let _ = writeln!(out, "  (no schedule options returned)");
        return out;
    }

    for (index, option) in results.recommendations.iter().enumerate() {
        let is_selected = selected == Some(index);
        let _ = writeln!(
            out,
            "{} Schedule Option {}{}",
            if is_selected { ">" } else { " " },
            index + 1,
            if is_selected { " (selected)" } else { "" }
        );
        if !option.pros.is_empty() {
            let _ = writeln!(out, "    Pros:");
            for pro in &option.pros {
                let _ = writeln!(out, "      + {}", pro);
            }
        }
        if !option.cons.is_empty() {
            let _ = writeln!(out, "    Cons:");
            for con in &option.cons {
                let _ = writeln!(out, "      - {}", con);
            }
        }
        for placement in &option.schedule {
            let _ = writeln!(out, "    {}", placement.summary);
            let _ = writeln!(out, "      Professor: {}", placement.description);
            let _ = writeln!(
                out,
                "      Location:  {}",
                placement.location.as_deref().filter(|l| !l.is_empty()).unwrap_or("TBA")
            );
            let _ = writeln!(out, "      Time:      {}", format_time(placement.start_time()));
        }
    }
    out
}

pub fn render_confirmation(confirmation: &SubmittedConfirmation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Schedule Created!");
    let _ = writeln!(out, "  Courses:     {}", confirmation.course_names.join(", "));
    let _ = writeln!(out, "  Quarter:     {}", label_or_blank(confirmation.quarter));
    let _ = writeln!(out, "  Day of week: {}", label_or_blank(confirmation.day_of_week));
    let _ = writeln!(out, "  Time of day: {}", label_or_blank(confirmation.time_of_day));
    if !confirmation.professor_preferences.trim().is_empty() {
        let _ = writeln!(out, "  Professor:   {}", confirmation.professor_preferences.trim());
    }
    out
}

pub fn render_view(view: &ViewState) -> String {
    let mut out = render_form(&view.form);
    if view.generating {
        out.push_str("Generating...\n");
    }
    if view.submitting {
        out.push_str("Adding...\n");
    }
    if let Some(results) = &view.results {
        out.push('\n');
        out.push_str(&render_results(results, view.selected));
    }
    if let Some(confirmation) = &view.submitted {
        out.push('\n');
        out.push_str(&render_confirmation(confirmation));
    }
    out
}

/// Prints notifications to stdout as they arrive.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        let tag = match notification.kind {
            NotificationKind::Loading => "...",
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
        };
        println!("[{}] {}", tag, notification.message);
    }
}

/// Asks on stdout and reads a y/N answer from stdin.
pub struct StdinConfirm;

impl ConfirmPrompt for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        print!("{}\n[y/N] ", message);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match blocking(|| io::stdin().read_line(&mut answer)) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

/// Runs a blocking read in place, handing the worker's other tasks off first
/// when called on a multi-thread runtime.
fn blocking<T>(read: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}

/// Where a session reads its commands from.
#[async_trait]
pub trait LineSource: Send {
    /// `None` at end of input.
    async fn next_line(&mut self) -> Option<io::Result<String>>;
}

#[async_trait]
impl<I> LineSource for I
where
    I: Iterator<Item = io::Result<String>> + Send,
{
    async fn next_line(&mut self) -> Option<io::Result<String>> {
        self.next()
    }
}

/// Lines from stdin, each read on the blocking pool. The stdin lock is taken
/// only for each read so that `StdinConfirm` can read in between.
pub struct StdinLines;

#[async_trait]
impl LineSource for StdinLines {
    async fn next_line(&mut self) -> Option<io::Result<String>> {
        let read = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            io::stdin().read_line(&mut line).map(|n| (n > 0).then_some(line))
        })
        .await;
        match read {
            Ok(Ok(Some(line))) => Some(Ok(line)),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => Some(Err(e)),
            Err(e) => Some(Err(io::Error::other(e))),
        }
    }
}

/// Runs commands from `lines` against the controller until `quit` or end of
/// input. Failures are reported by the controller's notifier, so only
/// parse errors are written to `out` here.
pub async fn run_session<L, W>(controller: &ScheduleController, mut lines: L, mut out: W) -> io::Result<()>
where
    L: LineSource,
    W: Write,
{
    writeln!(out, "Course Scheduler - make your schedule for next quarter")?;
    writeln!(out, "Type 'help' for commands.\n")?;
    write!(out, "{}", render_form(&controller.form()))?;
    out.flush()?;

    while let Some(line) = lines.next_line().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Show => write!(out, "{}", render_view(&controller.snapshot()))?,
            Command::Add => {
                controller.add_course();
                write!(out, "{}", render_form(&controller.form()))?;
            }
            Command::Remove(index) => {
                if controller.remove_course(index) {
                    write!(out, "{}", render_form(&controller.form()))?;
                } else {
                    writeln!(out, "Course slot {} cannot be removed", index + 1)?;
                }
            }
            Command::Course(index, name) => {
                if controller.update_course(index, name).is_ok() {
                    write!(out, "{}", render_form(&controller.form()))?;
                }
            }
            Command::Quarter(quarter) => controller.set_quarter(quarter),
            Command::Day(day) => controller.set_day_of_week(day),
            Command::Time(time) => controller.set_time_of_day(time),
            Command::Prof(text) => controller.set_professor_preferences(text),
            Command::Generate => {
                if controller.generate_schedule().await.is_ok() {
                    if let Some(results) = controller.results() {
                        write!(out, "{}", render_results(&results, controller.selected_index()))?;
                    }
                }
            }
            Command::Select(index) => {
                if controller.select_option(index).is_ok() {
                    if let Some(results) = controller.results() {
                        write!(out, "{}", render_results(&results, controller.selected_index()))?;
                    }
                }
            }
            Command::Submit => {
                if let Ok(confirmation) = controller.submit_to_calendar().await {
                    write!(out, "{}", render_confirmation(&confirmation))?;
                }
            }
            Command::Redo => {
                if controller.reset_form() {
                    write!(out, "{}", render_form(&controller.form()))?;
                }
            }
        }
        out.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use super::*;
    use crate::client::StubScheduleService;
    use crate::models::{Placement, ScheduleOption};
    use crate::services::NotificationLog;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("course 2  CS 101").unwrap(), Command::Course(1, "CS 101".to_string()));
        assert_eq!(Command::parse("day mwf").unwrap(), Command::Day(Some(DayOfWeek::Mwf)));
        assert_eq!(Command::parse("quarter").unwrap(), Command::Quarter(None));
        assert_eq!(Command::parse("SELECT 1").unwrap(), Command::Select(0));
        assert_eq!(Command::parse("prof likes office hours").unwrap(), Command::Prof("likes office hours".to_string()));
        assert!(Command::parse("remove 0").is_err());
        assert!(Command::parse("time midnight").is_err());
        assert!(Command::parse("dance").is_err());
    }

    #[test]
    fn renders_missing_location_and_time_as_tba() {
        let results = ScheduleResult {
            recommendations: vec![ScheduleOption {
                schedule: vec![Placement {
                    summary: "CS 101".to_string(),
                    description: "Dr. Chen".to_string(),
                    location: None,
                    start: None,
                    end: None,
                    extra: Default::default(),
                }],
                pros: vec!["Early finish".to_string()],
                cons: Vec::new(),
            }],
        };
        let text = render_results(&results, Some(0));
        assert!(text.contains("> Schedule Option 1 (selected)"));
        assert!(text.contains("+ Early finish"));
        assert!(!text.contains("Cons:"));
        assert!(text.contains("Professor: Dr. Chen"));
        assert!(text.contains("Location:  TBA"));
        assert!(text.contains("Time:      TBA"));
    }

    #[test]
    fn formats_start_time() {
        let placement: Placement = serde_json::from_value(serde_json::json!({
            "summary": "CS 101",
            "start": "2025-01-06T09:05:00"
        }))
        .unwrap();
        assert_eq!(format_time(placement.start_time()), "Mon Jan 6, 9:05 AM");
    }

    #[tokio::test]
    async fn session_generates_and_submits_with_stub() {
        let log = Arc::new(NotificationLog::new());
        let controller = ScheduleController::new(
            Arc::new(StubScheduleService::with_anchor(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap())),
            Arc::new(|_: &str| true),
            log.clone(),
        );
        let script = [
            "course 1 CS 101",
            "quarter fall",
            "day monday",
            "time morning",
            "generate",
            "select 2",
            "submit",
            "quit",
            "generate",
        ];
        let mut out = Vec::new();
        run_session(&controller, script.iter().map(|l| Ok(l.to_string())), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("> Schedule Option 2 (selected)"));
        assert!(text.contains("Schedule Created!"));
        assert!(text.contains("Courses:     CS 101"));
        assert_eq!(controller.selected_index(), Some(1));
        assert!(controller.submitted().is_some());
        // nothing after quit runs
        assert_eq!(
            log.entries().iter().filter(|n| n.kind == NotificationKind::Loading).count(),
            2
        );
    }

    struct YieldingLines {
        lines: Vec<&'static str>,
        reads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LineSource for YieldingLines {
        async fn next_line(&mut self) -> Option<io::Result<String>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.lines.pop().map(|line| Ok(line.to_string()))
        }
    }

    #[tokio::test]
    async fn session_awaits_each_line_from_source() {
        let controller = ScheduleController::new(
            Arc::new(StubScheduleService::new()),
            Arc::new(|_: &str| false),
            Arc::new(NotificationLog::new()),
        );
        let reads = Arc::new(AtomicUsize::new(0));
        // popped from the back
        let source = YieldingLines {
            lines: vec!["course 1 MATH 20", "add"],
            reads: reads.clone(),
        };
        let mut out = Vec::new();
        run_session(&controller, source, &mut out).await.unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 3);
        assert_eq!(controller.form().course_names.len(), 5);
        assert_eq!(controller.form().course_names[0], "MATH 20");
    }

    #[test]
    fn blocking_read_runs_outside_a_runtime() {
        assert_eq!(blocking(|| 7), 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocking_read_runs_in_place_on_multi_thread_runtime() {
        let caller = std::thread::current().id();
        assert_eq!(blocking(|| std::thread::current().id()), caller);
    }

    #[tokio::test]
    async fn session_reports_parse_errors_and_continues() {
        let controller = ScheduleController::new(
            Arc::new(StubScheduleService::new()),
            Arc::new(|_: &str| false),
            Arc::new(NotificationLog::new()),
        );
        let script = ["bogus", "add", "remove 9"];
        let mut out = Vec::new();
        run_session(&controller, script.iter().map(|l| Ok(l.to_string())), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Unknown command 'bogus'"));
        assert!(text.contains("  5. (empty)"));
        assert!(text.contains("Course slot 9 cannot be removed"));
    }
}
