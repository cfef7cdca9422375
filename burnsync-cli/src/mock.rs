use anyhow::Result;
use burnsync_domain::{Issue, IssueSource, IssueState, Project, StateType};
use chrono::{DateTime, Duration, Utc};

const MOCK_ISSUE_COUNT: i64 = 10;
const MOCK_HISTORY_DAYS: i64 = 21;

/// Offline stand-in for Linear, used by `--mock`.
#[derive(Debug, Default)]
pub struct MockSource;

impl IssueSource for MockSource {
    fn fetch_project(&self, project_id: &str) -> Result<Project> {
        Ok(Project {
            id: project_id.to_string(),
            name: format!("Mock {project_id}"),
            issues: mock_issues(project_id, Utc::now()),
        })
    }
}

/// Deterministic issue history spread over the three weeks before `now`;
/// every third issue lacks the `ghIssue` marker.
pub fn mock_issues(project_id: &str, now: DateTime<Utc>) -> Vec<Issue> {
    let seed = project_id.bytes().map(i64::from).sum::<i64>() % 4;

    (0..MOCK_ISSUE_COUNT)
        .map(|index| {
            let created_at = now - Duration::days(MOCK_HISTORY_DAYS - index * 2) + Duration::hours(seed);
            let completed_at = (index % 2 == 0)
                .then(|| created_at + Duration::days(seed + index / 2 + 1))
                .filter(|completed_at| *completed_at <= now);
            let title = if index % 3 == 2 {
                format!("Internal chore {index}")
            } else {
                format!("ghIssue-{} sync follow-up", 100 + index)
            };
            let state_type = if completed_at.is_some() {
                StateType::Completed
            } else {
                StateType::Started
            };

            Issue {
                id: format!("{project_id}-{index}"),
                identifier: format!("MOCK-{}", index + 1),
                title,
                state: IssueState {
                    name: if completed_at.is_some() { "Done" } else { "In Progress" }.to_string(),
                    state_type,
                },
                created_at,
                completed_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use burnsync_domain::{IssueSource, TitleFilter};
    use chrono::{TimeZone, Utc};

    use super::{mock_issues, MockSource};

    #[test]
    fn mock_history_is_deterministic_and_partially_tracked() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let issues = mock_issues("857fa6e14378", now);

        assert_eq!(issues, mock_issues("857fa6e14378", now));
        assert_eq!(issues.len(), 10);
        let tracked = TitleFilter::default().apply(&issues);
        assert_eq!(tracked.len(), 7);
        assert!(issues.iter().all(|issue| issue.created_at <= now));
        assert!(issues
            .iter()
            .filter_map(|issue| issue.completed_at.map(|done| (issue.created_at, done)))
            .all(|(created, done)| created < done && done <= now));
    }

    #[test]
    fn mock_source_echoes_project_id() {
        let project = MockSource.fetch_project("abc").expect("project");
        assert_eq!(project.id, "abc");
        assert_eq!(project.issues.len(), 10);
    }
}
