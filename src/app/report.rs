//! Text formatting for command output.

use crate::drag::OperationDecision;
use crate::plan::RebasePlan;
use crate::preview::{Preview, PreviewStatus};

pub fn format_preview(plan: &RebasePlan, preview: &Preview) -> String {
    let mut output = String::new();

    for entry in &preview.entries {
        let status = match entry.status {
            PreviewStatus::Kept => "kept",
            PreviewStatus::Reworded => "reworded",
            PreviewStatus::Edited => "edited",
            PreviewStatus::Squashed => "squashed",
            PreviewStatus::Dropped => "dropped",
        };
        output.push_str(&format!("{:>9}  {}  {}", status, entry.short_id, entry.message));
        if let Some(note) = &entry.note {
            output.push_str(&format!("  {}", note));
        }
        output.push('\n');
    }

    let groups = plan.fold_groups();
    if !groups.is_empty() {
        output.push_str("\nFold groups:\n");
        for (n, group) in groups.iter().enumerate() {
            let target = plan
                .get(group.target)
                .map(|e| e.commit.short_id.as_str())
                .unwrap_or("?");
            let members: Vec<&str> = group
                .members
                .iter()
                .filter_map(|m| plan.get(*m))
                .map(|e| e.commit.short_id.as_str())
                .collect();
            output.push_str(&format!("  [{}] {} <- {}\n", n, target, members.join(", ")));
        }
    }

    output.push_str(&format!(
        "\n{} of {} commits remain after the rebase\n",
        preview.surviving_count,
        plan.len()
    ));
    output
}

pub fn format_decision(decision: &OperationDecision) -> String {
    if !decision.is_valid {
        return format!("invalid: {}\n", decision.description);
    }

    let mut output = format!(
        "{}: {}\n  git {}\n",
        decision.operation, decision.description, decision.command
    );
    if decision.dangerous {
        output.push_str("  requires confirmation\n");
    }
    if let Some(warning) = &decision.warning {
        output.push_str(&format!("  warning: {}\n", warning));
    }
    output
}
