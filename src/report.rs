use std::fmt::Write;

use chrono::NaiveDate;

use crate::dedupe::TABLE_CHECK_ORDER;
use crate::models::{AgentPerformance, AgentRole, PanchayathReport};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Share of inactive agents as a percentage with two decimals. An empty
/// agent list yields 0 rather than dividing by zero.
pub fn inactive_percentage(total_agents: usize, inactive_agents: usize) -> f64 {
    if total_agents == 0 {
        return 0.0;
    }
    round2(inactive_agents as f64 / total_agents as f64 * 100.0)
}

pub fn assemble(
    panchayath: &str,
    month_start: NaiveDate,
    month_end: NaiveDate,
    agents: Vec<AgentPerformance>,
) -> PanchayathReport {
    let total_agents = agents.len();
    let inactive_agents = agents.iter().filter(|agent| agent.is_inactive).count();

    PanchayathReport {
        panchayath: panchayath.to_string(),
        month_start,
        month_end,
        total_agents,
        inactive_agents,
        inactive_percentage: inactive_percentage(total_agents, inactive_agents),
        agents,
    }
}

/// Groups agents by role in table check order. Roles with no agents are
/// dropped.
pub fn group_by_role(agents: &[AgentPerformance]) -> Vec<(AgentRole, Vec<&AgentPerformance>)> {
    TABLE_CHECK_ORDER
        .iter()
        .filter_map(|role| {
            let members: Vec<&AgentPerformance> = agents
                .iter()
                .filter(|agent| agent.agent_type == *role)
                .collect();
            if members.is_empty() {
                None
            } else {
                Some((*role, members))
            }
        })
        .collect()
}

fn agent_line(agent: &AgentPerformance) -> String {
    let last_active = match agent.last_activity_date {
        Some(date) => format!("last active {date}"),
        None => "no activity recorded".to_string(),
    };
    let day_word = if agent.consecutive_leave_days == 1 {
        "day"
    } else {
        "days"
    };
    let marker = if agent.is_inactive { " [INACTIVE]" } else { "" };

    format!(
        "- {} ({}): {} consecutive leave {day_word}, {last_active}, {} notes{marker}",
        agent.agent_name, agent.mobile_number, agent.consecutive_leave_days, agent.total_notes
    )
}

pub fn render_markdown(report: &PanchayathReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Field Agent Activity Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} to {})",
        report.panchayath, report.month_start, report.month_end
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Total agents: {}", report.total_agents);
    let _ = writeln!(
        output,
        "- Inactive agents (3+ consecutive leave days): {}",
        report.inactive_agents
    );
    let _ = writeln!(
        output,
        "- Inactive percentage: {:.2}%",
        report.inactive_percentage
    );

    let groups = group_by_role(&report.agents);

    if groups.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No agents on record for this panchayath.");
        return output;
    }

    for (role, members) in groups {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}s", role.label());
        for agent in members {
            let _ = writeln!(output, "{}", agent_line(agent));
        }
    }

    output
}
