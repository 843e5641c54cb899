use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test harness running the binary inside a temporary working directory
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    /// Create a new test harness with an empty working directory
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");
        cmd.current_dir(self.temp_dir.path());
        cmd.env_remove("RUST_LOG");
        cmd.env("CADENCE_DEFAULT_TIMEZONE", "UTC");
        cmd
    }

    /// Write a file into the working directory and return its path
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Write the sample calendar and return its path as a string argument
    pub fn sample_calendar(&self) -> String {
        self.write_file("calendar.toml", TestFixtures::CALENDAR)
            .to_string_lossy()
            .into_owned()
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const CALENDAR: &'static str = r#"
[[component]]
uid = "standup"
start = "2024-01-01T09:00:00"
duration_minutes = 15
exdate = ["2024-01-03"]

[[component.rrule]]
freq = "daily"
count = 20
by_day = ["MO", "TU", "WE", "TH", "FR"]

[[component]]
uid = "payday"
kind = "todo"
start = "2024-01-31"

[[component.rrule]]
freq = "monthly"
by_month_day = [-1]
count = 3

[[timezone]]
tzid = "US-Eastern"

[[timezone.observance]]
kind = "daylight"
start = "2007-03-11T02:00:00"
offset_from = "-0500"
offset_to = "-0400"
name = "EDT"
rrule = { freq = "yearly", by_month = [3], by_day = ["2SU"] }

[[timezone.observance]]
kind = "standard"
start = "2007-11-04T02:00:00"
offset_from = "-0400"
offset_to = "-0500"
name = "EST"
rrule = { freq = "yearly", by_month = [11], by_day = ["1SU"] }
"#;
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output contains the occurrence table headers
    pub fn has_occurrence_table_headers() -> impl Predicate<str> {
        predicate::str::contains("Start")
            .and(predicate::str::contains("Component"))
            .and(predicate::str::contains("Kind"))
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
