//! Table formatting for CLI output (spec §6 "Ambient: CLI surface").

use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use crate::domain::models::{Agent, Project, Proposal, Trigger};

fn base_table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(table: &mut Table, columns: &[&str]) {
    table.set_header(columns.iter().map(|c| Cell::new(c).add_attribute(Attribute::Bold)));
}

#[must_use]
pub fn projects_table(projects: &[Project]) -> String {
    let mut table = base_table();
    header(&mut table, &["ID", "Slug", "Name", "Status"]);
    for project in projects {
        table.add_row(vec![
            short_id(&project.id.to_string()),
            project.slug.clone(),
            project.name.clone(),
            project.status.as_str().to_string(),
        ]);
    }
    table.to_string()
}

#[must_use]
pub fn agents_table(agents: &[Agent]) -> String {
    let mut table = base_table();
    header(&mut table, &["ID", "Name", "Role", "Status", "Capabilities"]);
    for agent in agents {
        table.add_row(vec![
            short_id(&agent.id.to_string()),
            agent.name.clone(),
            agent.role.clone(),
            agent.status.as_str().to_string(),
            agent.config.capabilities.join(","),
        ]);
    }
    table.to_string()
}

#[must_use]
pub fn proposals_table(proposals: &[Proposal]) -> String {
    let mut table = base_table();
    header(&mut table, &["ID", "Title", "Priority", "Status", "Auto"]);
    for proposal in proposals {
        table.add_row(vec![
            short_id(&proposal.id.to_string()),
            truncate(&proposal.title, 48),
            proposal.priority.as_str().to_string(),
            proposal.status.as_str().to_string(),
            proposal.auto_approve.to_string(),
        ]);
    }
    table.to_string()
}

#[must_use]
pub fn triggers_table(triggers: &[Trigger]) -> String {
    let mut table = base_table();
    header(&mut table, &["ID", "Name", "Enabled", "Last fired"]);
    for trigger in triggers {
        table.add_row(vec![
            short_id(&trigger.id.to_string()),
            trigger.name.clone(),
            trigger.enabled.to_string(),
            trigger.last_fired_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.to_string()
}

fn short_id(id: &str) -> String {
    id.get(..8).unwrap_or(id).to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max.saturating_sub(3)).collect::<String>())
    }
}
