use crate::error::ValidationError;
use crate::models::{AgentDraft, AgentRole, Panchayath};

pub const MOBILE_DIGITS: usize = 10;
pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;

/// Strips separators and whitespace so "98470-12345" and "9847012345"
/// compare equal everywhere downstream.
pub fn normalize_mobile(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Checks a submitted draft against its panchayath. Returns the normalized
/// mobile number on success; the stored and duplicate-checked form is always
/// the normalized one.
pub fn validate_draft(
    draft: &AgentDraft,
    panchayath: &Panchayath,
) -> Result<String, ValidationError> {
    if draft.name.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "name" });
    }

    let mobile = normalize_mobile(&draft.mobile_number);
    if mobile.len() != MOBILE_DIGITS {
        return Err(ValidationError::MalformedMobile {
            value: draft.mobile_number.clone(),
        });
    }

    if draft.ward < 1 || draft.ward > panchayath.number_of_wards {
        return Err(ValidationError::WardOutOfRange {
            ward: draft.ward,
            max: panchayath.number_of_wards,
        });
    }

    match draft.role {
        AgentRole::Coordinator => {
            let rating = draft
                .rating
                .ok_or(ValidationError::MissingField { field: "rating" })?;
            if !(RATING_MIN..=RATING_MAX).contains(&rating) {
                return Err(ValidationError::RatingOutOfRange { rating });
            }
        }
        AgentRole::Pro => {
            let has_group_leader = draft
                .group_leader_mobile
                .as_deref()
                .is_some_and(|value| !value.trim().is_empty());
            if !has_group_leader {
                return Err(ValidationError::MissingField {
                    field: "group leader",
                });
            }
        }
        AgentRole::Supervisor | AgentRole::GroupLeader => {}
    }

    Ok(mobile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_panchayath() -> Panchayath {
        Panchayath {
            id: Uuid::new_v4(),
            name: "Kumbalangi".to_string(),
            number_of_wards: 16,
        }
    }

    fn supervisor_draft(mobile: &str, ward: i32) -> AgentDraft {
        AgentDraft {
            role: AgentRole::Supervisor,
            name: "Rajeev Menon".to_string(),
            mobile_number: mobile.to_string(),
            ward,
            rating: None,
            group_leader_mobile: None,
        }
    }

    #[test]
    fn normalization_strips_separators() {
        assert_eq!(normalize_mobile("98470-12345"), "9847012345");
        assert_eq!(normalize_mobile(" 98470 12345 "), "9847012345");
        assert_eq!(normalize_mobile("abc"), "");
    }

    #[test]
    fn accepts_valid_draft_and_returns_normalized_mobile() {
        let mobile = validate_draft(&supervisor_draft("98470 12345", 3), &sample_panchayath());
        assert_eq!(mobile, Ok("9847012345".to_string()));
    }

    #[test]
    fn rejects_short_and_long_mobiles() {
        let panchayath = sample_panchayath();
        for bad in ["984701234", "98470123456", "", "phone"] {
            let result = validate_draft(&supervisor_draft(bad, 3), &panchayath);
            assert!(
                matches!(result, Err(ValidationError::MalformedMobile { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_ward_outside_panchayath_range() {
        let panchayath = sample_panchayath();
        for bad in [0, -1, 17] {
            let result = validate_draft(&supervisor_draft("9847012345", bad), &panchayath);
            assert_eq!(
                result,
                Err(ValidationError::WardOutOfRange { ward: bad, max: 16 })
            );
        }
        assert!(validate_draft(&supervisor_draft("9847012345", 16), &panchayath).is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let mut draft = supervisor_draft("9847012345", 3);
        draft.name = "   ".to_string();
        assert_eq!(
            validate_draft(&draft, &sample_panchayath()),
            Err(ValidationError::MissingField { field: "name" })
        );
    }

    #[test]
    fn coordinator_rating_must_be_present_and_in_range() {
        let panchayath = sample_panchayath();
        let mut draft = supervisor_draft("9847012345", 3);
        draft.role = AgentRole::Coordinator;

        assert_eq!(
            validate_draft(&draft, &panchayath),
            Err(ValidationError::MissingField { field: "rating" })
        );

        draft.rating = Some(6);
        assert_eq!(
            validate_draft(&draft, &panchayath),
            Err(ValidationError::RatingOutOfRange { rating: 6 })
        );

        draft.rating = Some(4);
        assert!(validate_draft(&draft, &panchayath).is_ok());
    }

    #[test]
    fn pro_requires_group_leader() {
        let panchayath = sample_panchayath();
        let mut draft = supervisor_draft("9847012345", 3);
        draft.role = AgentRole::Pro;

        assert_eq!(
            validate_draft(&draft, &panchayath),
            Err(ValidationError::MissingField {
                field: "group leader"
            })
        );

        draft.group_leader_mobile = Some("   ".to_string());
        assert_eq!(
            validate_draft(&draft, &panchayath),
            Err(ValidationError::MissingField {
                field: "group leader"
            })
        );

        draft.group_leader_mobile = Some("9847034567".to_string());
        assert!(validate_draft(&draft, &panchayath).is_ok());
    }
}
