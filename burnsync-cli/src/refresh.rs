use anyhow::{Context, Result};
use burnsync_config::ProjectConfig;
use burnsync_domain::{burndown, IssueSource, SyncError, TitleFilter};
use burnsync_sheet::{render_burndown, validate_sheet_name, Spreadsheet};
use chrono::Local;

use crate::{
    telemetry::timed,
    types::{ProjectFailure, RefreshReport, RefreshSummary},
};

/// Drives fetch, filter, aggregation and rendering for the project table.
pub struct Refresher<'a> {
    source: &'a dyn IssueSource,
    projects: &'a [ProjectConfig],
    filter: TitleFilter,
}

impl<'a> Refresher<'a> {
    pub fn new(source: &'a dyn IssueSource, projects: &'a [ProjectConfig], filter: TitleFilter) -> Self {
        Self {
            source,
            projects,
            filter,
        }
    }

    /// Refreshes the sheet named after `name`, creating it if needed.
    ///
    /// Unknown names fail with a configuration error before anything is
    /// touched; every later failure is reported as `Failed to refresh <name>`.
    pub fn refresh_project(&self, book: &mut Spreadsheet, name: &str) -> Result<RefreshReport> {
        let project = self.resolve(name)?;
        self.refresh_resolved(book, project)
            .with_context(|| format!("Failed to refresh {name}"))
    }

    /// Refreshes every configured project in order, isolating failures.
    pub fn refresh_all(&self, book: &mut Spreadsheet) -> RefreshSummary {
        log::info!("Fetching data for all customers...");
        let mut summary = RefreshSummary::default();

        for project in self.projects {
            match self.refresh_project(book, &project.name) {
                Ok(report) => summary.succeeded.push(report),
                Err(error) => {
                    log::warn!("Error refreshing {}: {error:#}", project.name);
                    summary.failed.push(ProjectFailure {
                        project: project.name.clone(),
                        kind: error.downcast_ref::<SyncError>().map_or("unexpected", SyncError::kind),
                        message: format!("{error:#}"),
                    });
                }
            }
        }

        log::info!("{summary}");
        summary
    }

    fn resolve(&self, name: &str) -> Result<&'a ProjectConfig> {
        self.projects
            .iter()
            .find(|project| project.name == name)
            .ok_or_else(|| SyncError::configuration(format!("Invalid project: {name}")).into())
    }

    fn refresh_resolved(&self, book: &mut Spreadsheet, project: &ProjectConfig) -> Result<RefreshReport> {
        validate_sheet_name(&project.name)
            .map_err(|error| SyncError::render(project.name.as_str(), format!("{error:#}")))?;
        let sheet = book.sheet_or_insert(&project.name);
        let fetched = timed("fetch_project", Some(&project.name), || {
            self.source.fetch_project(&project.id)
        })?;

        let tracked = self.filter.apply(&fetched.issues);
        let series = burndown(&tracked);
        log::debug!(
            "{}: {} issues fetched, {} tracked, {} days",
            project.name,
            fetched.issues.len(),
            tracked.len(),
            series.len()
        );

        render_burndown(sheet, &project.name, &series, Local::now().naive_local())
            .map_err(|error| SyncError::render(project.name.as_str(), format!("{error:#}")))?;

        Ok(RefreshReport {
            project: project.name.clone(),
            fetched: fetched.issues.len(),
            tracked: tracked.len(),
            points: series.len(),
            remaining: series.last().map_or(0, |point| point.remaining),
        })
    }
}
