pub fn plan_prompt(mission_id: &str, prompt: &str, repo_path: &str) -> String {
    format!(
        r#"You are an assistant that generates execution plans for software development tasks.

Given a user prompt and repository path, generate a JSON plan with the following structure:
{{
  "mission_id": "{mission_id}",
  "plan": [
    {{
      "step_id": "s-1",
      "title": "Step title",
      "actions": [
        {{"type": "open_app", "app": "Kiro"}},
        {{"type": "open_project", "path": "{repo_path}"}},
        {{"type": "screenshot"}},
        {{"type": "run_command", "cmd": "npm test"}},
        {{"type": "prompt_ai", "prompt": "Create a component", "expected_files": ["src/Component.tsx"]}}
      ],
      "expect_marker": "C-1001"
    }}
  ]
}}

Available action types:
- open_app: Open an application ("app")
- open_project: Open the project in the IDE ("path")
- screenshot: Take a screenshot
- run_command: Run a shell command ("cmd", optional "cwd", "timeout")
- prompt_ai: Send a prompt to the IDE's AI assistant ("prompt", optional "expected_files", "wait_timeout")
- wait_for_file: Wait for a file to exist ("file_path", optional "timeout")
- wait_for_marker: Wait for a code marker to appear in the repository ("marker", optional "timeout")
- wait_for_completion: Wait for the assistant to finish ("expected_files", optional "timeout")

User prompt: {prompt}
Repository path: {repo_path}

Generate a practical plan with 2-4 steps. Each step must have a unique step_id (s-1, s-2, ...) and an expect_marker (C-1001, C-1002, ...).
Output ONLY valid JSON, no additional text."#
    )
}
