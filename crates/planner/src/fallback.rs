use mission_core::{Action, Plan, Step};

/// Deterministic two-step plan used whenever the planner is unavailable or
/// its output is rejected.
pub fn static_plan(mission_id: &str, repo_path: &str) -> Plan {
    Plan::new(
        mission_id,
        vec![
            Step::new("s-1", "Open Kiro and open project")
                .with_action(Action::new("open_app").with_param("app", "Kiro"))
                .with_action(Action::new("open_project").with_param("path", repo_path))
                .with_action(Action::new("screenshot"))
                .with_expect_marker("C-1001"),
            Step::new("s-2", "Run tests")
                .with_action(Action::new("run_command").with_param("cmd", "npm test"))
                .with_expect_marker("C-1002"),
        ],
    )
}
