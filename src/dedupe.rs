use uuid::Uuid;

use crate::models::AgentRole;

/// Fixed order in which the agent tables are checked. The first table with a
/// conflicting row wins; later tables are not reported.
pub const TABLE_CHECK_ORDER: [AgentRole; 4] = [
    AgentRole::Coordinator,
    AgentRole::Supervisor,
    AgentRole::GroupLeader,
    AgentRole::Pro,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub table: Option<AgentRole>,
}

impl DuplicateCheck {
    pub fn clear() -> Self {
        DuplicateCheck {
            is_duplicate: false,
            table: None,
        }
    }

    pub fn conflict(table: AgentRole) -> Self {
        DuplicateCheck {
            is_duplicate: true,
            table: Some(table),
        }
    }
}

/// Picks the first conflicting row out of every row matching a candidate
/// mobile number. `exclude_id` is honored only within `target`: editing a
/// record never conflicts with itself, but the same number sitting in a
/// different table still does.
pub fn first_conflict(
    matches: &[(AgentRole, Uuid)],
    exclude_id: Option<Uuid>,
    target: AgentRole,
) -> DuplicateCheck {
    for table in TABLE_CHECK_ORDER {
        for (row_table, row_id) in matches {
            if *row_table != table {
                continue;
            }
            if table == target && exclude_id == Some(*row_id) {
                continue;
            }
            return DuplicateCheck::conflict(table);
        }
    }
    DuplicateCheck::clear()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_conflict_from_another_table() {
        let existing = vec![(AgentRole::Supervisor, Uuid::new_v4())];
        let check = first_conflict(&existing, None, AgentRole::Coordinator);
        assert_eq!(check, DuplicateCheck::conflict(AgentRole::Supervisor));
    }

    #[test]
    fn clean_number_passes() {
        let check = first_conflict(&[], None, AgentRole::Coordinator);
        assert_eq!(check, DuplicateCheck::clear());
        assert!(!check.is_duplicate);
    }

    #[test]
    fn editing_own_record_does_not_self_conflict() {
        let own_id = Uuid::new_v4();
        let existing = vec![(AgentRole::Coordinator, own_id)];
        let check = first_conflict(&existing, Some(own_id), AgentRole::Coordinator);
        assert_eq!(check, DuplicateCheck::clear());
    }

    #[test]
    fn exclusion_only_applies_within_the_target_table() {
        let id = Uuid::new_v4();
        let existing = vec![(AgentRole::GroupLeader, id)];
        let check = first_conflict(&existing, Some(id), AgentRole::Coordinator);
        assert_eq!(check, DuplicateCheck::conflict(AgentRole::GroupLeader));
    }

    #[test]
    fn first_table_in_check_order_wins() {
        let existing = vec![
            (AgentRole::Pro, Uuid::new_v4()),
            (AgentRole::Supervisor, Uuid::new_v4()),
        ];
        let check = first_conflict(&existing, None, AgentRole::Coordinator);
        assert_eq!(check.table, Some(AgentRole::Supervisor));
    }

    #[test]
    fn another_row_in_the_target_table_still_conflicts() {
        let own_id = Uuid::new_v4();
        let existing = vec![
            (AgentRole::Coordinator, own_id),
            (AgentRole::Coordinator, Uuid::new_v4()),
        ];
        let check = first_conflict(&existing, Some(own_id), AgentRole::Coordinator);
        assert_eq!(check, DuplicateCheck::conflict(AgentRole::Coordinator));
    }
}
