//! PRD prompt construction

/// Character budget for repository context embedded in the prompt
pub const MAX_PROMPT_CONTEXT_CHARS: usize = 40_000;

/// Truncate repository context to the prompt budget (in chars, not bytes)
pub fn truncate_context(repo_context: &str) -> &str {
    match repo_context.char_indices().nth(MAX_PROMPT_CONTEXT_CHARS) {
        Some((byte_index, _)) => &repo_context[..byte_index],
        None => repo_context,
    }
}

/// Build the PRD generator prompt for a proposed change
pub fn build_prd_prompt(proposed_change: &str, repo_context: &str) -> String {
    format!(
        r#"
You are an expert software architect and project manager. Your task is to generate a Product Requirements Document (PRD) and an implementation plan based on a proposed change and the current repository context.

**Proposed Change:**
{change}

**Current Repository Context:**
```
{context}
```
(Context may be truncated for brevity)

**Instructions:**

1.  **Analyze:** Understand the proposed change in the context of the existing repository structure and files.
2.  **Generate PRD:** Create a concise PRD including:
    *   **Goal:** What is the objective of this change?
    *   **Scope:** What is included and excluded?
    *   **High-Level Requirements:** Key functionalities or changes needed.
3.  **Implementation Plan:** Outline the steps to implement the change.
4.  **Agent Breakdown for Parallel Execution:**
    *   Analyze the implementation plan and identify tasks suitable for parallel execution by independent `aider` agents. Consider file dependencies: agents should ideally work on separate, non-conflicting sets of files or tasks.
    *   **Suggest an optimal number of parallel agents (N).** Base this on the natural divisions in the work.
    *   Provide a breakdown in the following JSON format directly within this response. Ensure the JSON is valid. Do not include the JSON block inside a markdown code block.

```json
{{
  "suggested_num_agents": N,
  "agents": [
    {{
      "agent_id": 0,
      "task_description": "Detailed description of the task for agent 0. Be specific about what functions/classes/files to create or modify.",
      "target_files": ["path/to/file1.py", "path/to/relevant/dir/"]
    }},
    {{
      "agent_id": 1,
      "task_description": "Detailed description of the task for agent 1.",
      "target_files": ["path/to/another/file.js", "path/to/config.json"]
    }}
  ]
}}
```

Add more agent objects as needed, with agent_id values 0 to N-1. `target_files` lists the files or directories aider should focus on.

**Output Format:**

Provide the PRD and Implementation Plan first as clear markdown text. Then, provide the Agent Breakdown strictly in the JSON format specified above, ensuring it is valid JSON.
"#,
        change = proposed_change,
        context = truncate_context(repo_context),
    )
}
