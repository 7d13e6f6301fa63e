//! Markdown rendering of a replay outcome.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::replay::{ReplayOutcome, ReplayResult};

const REPORT_TEMPLATE: &str = include_str!("templates/report.md");

/// Template engine wrapper around minijinja.
struct ReportEngine {
    env: Environment<'static>,
}

impl ReportEngine {
    fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("report", REPORT_TEMPLATE)
            .context("load report template")?;
        Ok(Self { env })
    }

    fn render(&self, outcome: &ReplayOutcome) -> Result<String> {
        let (path, enforcement) = match &outcome.result {
            ReplayResult::Answer(path) => (Some(path), &path.enforcement),
            ReplayResult::EnforcementNotMet(status) => (None, status),
        };
        let template = self.env.get_template("report")?;
        let rendered = template.render(context! {
            task => outcome.task_prompt.trim(),
            summary => &outcome.summary,
            enforcement => enforcement,
            nodes_remaining => enforcement.nodes_remaining(),
            rounds => &outcome.rounds,
            path => path,
        })?;
        Ok(rendered)
    }
}

pub fn render_report(outcome: &ReplayOutcome) -> Result<String> {
    ReportEngine::new()?
        .render(outcome)
        .context("render replay report")
}
