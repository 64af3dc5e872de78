//! Session Runner
//!
//! One [`Session`] exists per runner invocation and owns one [`Harness`],
//! so every check run by that invocation shares one settings store: a `set`
//! or `set_defaults` made inside one check is visible to the checks after
//! it. Separate invocations never share anything.
//!
//! ```text
//! INIT ──discover──▶ DISCOVER ──run──▶ RUN* ──summarize──▶ SUMMARIZE ──▶ DONE
//! ```
//!
//! Each check runs under `catch_unwind`. A limit violation, a configuration
//! or baseline error, any other error, or a panic becomes a failed outcome
//! and the session moves on to the next check.

use crate::discovery::{DiscoveredCheck, DiscoveryError, discover};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use perftest_core::{CheckDef, CheckError, Harness, PerfError, SettingsStore};
use perftest_report::{CheckOutcome, ErrorInfo, OutcomeStatus, ReportMeta, SessionReport};
use std::any::Any;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Fresh store, empty report
    Init,
    /// Checks enumerated
    Discover,
    /// Checks executing
    Run,
    /// Report frozen
    Summarize,
    /// Report handed off
    Done,
}

/// One runner invocation
pub struct Session {
    state: SessionState,
    root: PathBuf,
    harness: Harness,
    checks: Vec<DiscoveredCheck>,
    outcomes: Vec<CheckOutcome>,
    show_progress: bool,
}

impl Session {
    /// Start a session with default samplers
    pub fn new(settings: SettingsStore, root: impl Into<PathBuf>) -> Self {
        Self::with_harness(Harness::new(settings), root)
    }

    /// Start a session with a prepared harness
    pub fn with_harness(harness: Harness, root: impl Into<PathBuf>) -> Self {
        Self {
            state: SessionState::Init,
            root: root.into(),
            harness,
            checks: Vec::new(),
            outcomes: Vec::new(),
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while running
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Root the session discovers from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Harness shared by every check of this session
    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    /// Discovered checks, in run order
    pub fn checks(&self) -> &[DiscoveredCheck] {
        &self.checks
    }

    /// Outcomes recorded so far
    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    /// INIT → DISCOVER: find the checks to run
    pub fn discover(
        &mut self,
        registry: &[&'static CheckDef],
        filter: Option<&regex::Regex>,
    ) -> Result<&[DiscoveredCheck], DiscoveryError> {
        self.checks = discover(&self.root, registry, filter)?;
        self.state = SessionState::Discover;
        tracing::info!(
            root = %self.root.display(),
            checks = self.checks.len(),
            "discovered checks"
        );
        Ok(&self.checks)
    }

    /// Use an explicit list of checks instead of walking the filesystem
    pub fn with_checks(mut self, checks: Vec<DiscoveredCheck>) -> Self {
        self.checks = checks;
        self.state = SessionState::Discover;
        self
    }

    /// DISCOVER → RUN*: execute every discovered check in order
    pub fn run(&mut self) {
        self.state = SessionState::Run;

        let pb = ProgressBar::new(self.checks.len() as u64);
        if !self.show_progress {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let checks = std::mem::take(&mut self.checks);
        for check in &checks {
            pb.set_message(check.def.name);
            let outcome = self.run_check(check.def);
            self.outcomes.push(outcome);
            pb.inc(1);
        }
        self.checks = checks;

        pb.finish_with_message("Complete");
    }

    /// Run one check under failure isolation
    pub fn run_check(&mut self, def: &CheckDef) -> CheckOutcome {
        let check = def.qualified_name();
        let start = Instant::now();

        let mut ctx = self.harness.context(check.clone());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            (def.runner_fn)(&mut ctx)
        }));
        let evaluations = ctx.into_evaluations();

        let status = match result {
            Ok(Ok(())) => OutcomeStatus::Passed,
            Ok(Err(err)) => status_from_error(err),
            Err(panic) => OutcomeStatus::Errored(ErrorInfo::new("Panic", panic_message(&*panic))),
        };

        match &status {
            OutcomeStatus::Passed => tracing::debug!(check = %check, "passed"),
            status => tracing::debug!(
                check = %check,
                kind = status.kind_name().unwrap_or("Error"),
                "failed"
            ),
        }

        CheckOutcome {
            check,
            file: def.file.to_string(),
            line: def.line,
            evaluations,
            status,
            duration_ms: start.elapsed().as_secs_f64() * 1e3,
        }
    }

    /// RUN* → SUMMARIZE → DONE: freeze the report and hand it off
    pub fn summarize(mut self) -> SessionReport {
        self.state = SessionState::Summarize;
        let report = SessionReport::new(
            ReportMeta::now(self.root.display().to_string()),
            std::mem::take(&mut self.outcomes),
        );
        tracing::info!(
            total = report.summary.total,
            passed = report.summary.passed,
            failed = report.summary.failed,
            "session finished"
        );
        self.state = SessionState::Done;
        report
    }
}

fn status_from_error(err: CheckError) -> OutcomeStatus {
    match err.downcast_ref::<PerfError>() {
        Some(perf) => OutcomeStatus::from(perf),
        None => OutcomeStatus::Errored(ErrorInfo::new("Error", err.to_string())),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Discover, run and summarize checks under `root` in a fresh session
pub fn run_session(
    settings: SettingsStore,
    root: &Path,
    registry: &[&'static CheckDef],
    filter: Option<&regex::Regex>,
    show_progress: bool,
) -> Result<SessionReport, DiscoveryError> {
    let mut session = Session::new(settings, root).show_progress(show_progress);
    session.discover(registry, filter)?;
    session.run();
    Ok(session.summarize())
}
