use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Coordinator,
    Supervisor,
    GroupLeader,
    Pro,
}

impl AgentRole {
    pub fn table_name(self) -> &'static str {
        match self {
            AgentRole::Coordinator => "coordinators",
            AgentRole::Supervisor => "supervisors",
            AgentRole::GroupLeader => "group_leaders",
            AgentRole::Pro => "pros",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgentRole::Coordinator => "Coordinator",
            AgentRole::Supervisor => "Supervisor",
            AgentRole::GroupLeader => "Group Leader",
            AgentRole::Pro => "PRO",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for AgentRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "coordinator" => Ok(AgentRole::Coordinator),
            "supervisor" => Ok(AgentRole::Supervisor),
            "group-leader" | "group_leader" => Ok(AgentRole::GroupLeader),
            "pro" => Ok(AgentRole::Pro),
            other => Err(format!(
                "unknown role {other:?}; expected coordinator, supervisor, group-leader, or pro"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Panchayath {
    pub id: Uuid,
    pub name: String,
    pub number_of_wards: i32,
}

/// A persisted agent row from one of the four role tables.
#[derive(Debug, Clone)]
pub struct AgentRecord {
    pub id: Uuid,
    pub role: AgentRole,
    pub name: String,
    pub mobile_number: String,
    pub ward: i32,
    pub panchayath_id: Uuid,
    pub rating: Option<i32>,
    pub group_leader_id: Option<Uuid>,
}

/// A candidate record as submitted, before validation and normalization.
/// The group leader is still the raw mobile number the caller typed; it is
/// resolved to an id only after validation passes.
#[derive(Debug, Clone)]
pub struct AgentDraft {
    pub role: AgentRole,
    pub name: String,
    pub mobile_number: String,
    pub ward: i32,
    pub rating: Option<i32>,
    pub group_leader_mobile: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DailyNote {
    pub mobile_number: String,
    pub note_date: NaiveDate,
    pub is_leave: bool,
    pub activity: String,
}

/// Derived per-agent status for one month. Never persisted; recomputed on
/// every report request.
#[derive(Debug, Clone, Serialize)]
pub struct AgentPerformance {
    pub agent_id: Uuid,
    pub agent_name: String,
    pub agent_type: AgentRole,
    pub mobile_number: String,
    pub consecutive_leave_days: i64,
    pub is_inactive: bool,
    pub last_activity_date: Option<NaiveDate>,
    pub total_notes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanchayathReport {
    pub panchayath: String,
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    pub total_agents: usize,
    pub inactive_agents: usize,
    pub inactive_percentage: f64,
    pub agents: Vec<AgentPerformance>,
}
