use anyhow::Context;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::dedupe::{self, DuplicateCheck};
use crate::error::SubmitError;
use crate::models::{AgentRecord, AgentRole, DailyNote, Panchayath};
use crate::validate;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn fetch_panchayath(pool: &PgPool, name: &str) -> anyhow::Result<Option<Panchayath>> {
    let row = sqlx::query(
        "SELECT id, name, number_of_wards FROM panchayath_ops.panchayaths WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Panchayath {
        id: row.get("id"),
        name: row.get("name"),
        number_of_wards: row.get("number_of_wards"),
    }))
}

/// Scans every agent table in check order for rows holding `mobile`.
/// Read-only; the caller decides what a match means.
pub async fn fetch_mobile_matches(
    pool: &PgPool,
    mobile: &str,
) -> anyhow::Result<Vec<(AgentRole, Uuid)>> {
    let mut matches = Vec::new();

    for table in dedupe::TABLE_CHECK_ORDER {
        let query = format!(
            "SELECT id FROM panchayath_ops.{} WHERE mobile_number = $1",
            table.table_name()
        );
        for row in sqlx::query(&query).bind(mobile).fetch_all(pool).await? {
            matches.push((table, row.get("id")));
        }
    }

    Ok(matches)
}

pub async fn check_duplicate(
    pool: &PgPool,
    mobile: &str,
    exclude_id: Option<Uuid>,
    target: AgentRole,
) -> anyhow::Result<DuplicateCheck> {
    let mobile = validate::normalize_mobile(mobile);
    let matches = fetch_mobile_matches(pool, &mobile).await?;
    Ok(dedupe::first_conflict(&matches, exclude_id, target))
}

pub async fn find_group_leader(pool: &PgPool, mobile: &str) -> anyhow::Result<Option<Uuid>> {
    let row = sqlx::query("SELECT id FROM panchayath_ops.group_leaders WHERE mobile_number = $1")
        .bind(mobile)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| row.get("id")))
}

fn agent_columns(role: AgentRole) -> &'static str {
    match role {
        AgentRole::Coordinator => "id, name, mobile_number, ward, panchayath_id, rating",
        AgentRole::Pro => "id, name, mobile_number, ward, panchayath_id, group_leader_id",
        AgentRole::Supervisor | AgentRole::GroupLeader => {
            "id, name, mobile_number, ward, panchayath_id"
        }
    }
}

fn agent_from_row(role: AgentRole, row: &PgRow) -> AgentRecord {
    AgentRecord {
        id: row.get("id"),
        role,
        name: row.get("name"),
        mobile_number: row.get("mobile_number"),
        ward: row.get("ward"),
        panchayath_id: row.get("panchayath_id"),
        rating: match role {
            AgentRole::Coordinator => Some(row.get("rating")),
            _ => None,
        },
        group_leader_id: match role {
            AgentRole::Pro => Some(row.get("group_leader_id")),
            _ => None,
        },
    }
}

pub async fn fetch_agent(
    pool: &PgPool,
    role: AgentRole,
    id: Uuid,
) -> anyhow::Result<Option<AgentRecord>> {
    let query = format!(
        "SELECT {} FROM panchayath_ops.{} WHERE id = $1",
        agent_columns(role),
        role.table_name()
    );
    let row = sqlx::query(&query).bind(id).fetch_optional(pool).await?;
    Ok(row.map(|row| agent_from_row(role, &row)))
}

/// All agents of a panchayath across the four role tables, in table check
/// order, ward-then-name within each table.
pub async fn fetch_agents(pool: &PgPool, panchayath_id: Uuid) -> anyhow::Result<Vec<AgentRecord>> {
    let mut agents = Vec::new();

    for role in dedupe::TABLE_CHECK_ORDER {
        let query = format!(
            "SELECT {} FROM panchayath_ops.{} WHERE panchayath_id = $1 ORDER BY ward, name",
            agent_columns(role),
            role.table_name()
        );
        for row in sqlx::query(&query)
            .bind(panchayath_id)
            .fetch_all(pool)
            .await?
        {
            agents.push(agent_from_row(role, &row));
        }
    }

    Ok(agents)
}

fn map_write_error(err: sqlx::Error, table: AgentRole) -> SubmitError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            let constraint = db_err.constraint().unwrap_or_default();
            if constraint.ends_with("_ward_key") {
                return SubmitError::WardTaken;
            }
            if constraint.ends_with("_mobile_number_key") {
                return SubmitError::DuplicateMobile { table };
            }
        }
    }
    SubmitError::Persistence(err)
}

pub async fn insert_agent(pool: &PgPool, agent: &AgentRecord) -> Result<(), SubmitError> {
    let result = match agent.role {
        AgentRole::Coordinator => {
            sqlx::query(
                r#"
                INSERT INTO panchayath_ops.coordinators
                (id, name, mobile_number, ward, panchayath_id, rating)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(agent.id)
            .bind(&agent.name)
            .bind(&agent.mobile_number)
            .bind(agent.ward)
            .bind(agent.panchayath_id)
            .bind(agent.rating)
            .execute(pool)
            .await
        }
        AgentRole::Pro => {
            sqlx::query(
                r#"
                INSERT INTO panchayath_ops.pros
                (id, name, mobile_number, ward, panchayath_id, group_leader_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(agent.id)
            .bind(&agent.name)
            .bind(&agent.mobile_number)
            .bind(agent.ward)
            .bind(agent.panchayath_id)
            .bind(agent.group_leader_id)
            .execute(pool)
            .await
        }
        AgentRole::Supervisor | AgentRole::GroupLeader => {
            let query = format!(
                r#"
                INSERT INTO panchayath_ops.{}
                (id, name, mobile_number, ward, panchayath_id)
                VALUES ($1, $2, $3, $4, $5)
                "#,
                agent.role.table_name()
            );
            sqlx::query(&query)
                .bind(agent.id)
                .bind(&agent.name)
                .bind(&agent.mobile_number)
                .bind(agent.ward)
                .bind(agent.panchayath_id)
                .execute(pool)
                .await
        }
    };

    result.map_err(|err| map_write_error(err, agent.role))?;
    tracing::info!(role = %agent.role, id = %agent.id, "agent inserted");
    Ok(())
}

pub async fn update_agent(pool: &PgPool, agent: &AgentRecord) -> Result<(), SubmitError> {
    let result = match agent.role {
        AgentRole::Coordinator => {
            sqlx::query(
                r#"
                UPDATE panchayath_ops.coordinators
                SET name = $2, mobile_number = $3, ward = $4, panchayath_id = $5, rating = $6
                WHERE id = $1
                "#,
            )
            .bind(agent.id)
            .bind(&agent.name)
            .bind(&agent.mobile_number)
            .bind(agent.ward)
            .bind(agent.panchayath_id)
            .bind(agent.rating)
            .execute(pool)
            .await
        }
        AgentRole::Pro => {
            sqlx::query(
                r#"
                UPDATE panchayath_ops.pros
                SET name = $2, mobile_number = $3, ward = $4, panchayath_id = $5,
                    group_leader_id = $6
                WHERE id = $1
                "#,
            )
            .bind(agent.id)
            .bind(&agent.name)
            .bind(&agent.mobile_number)
            .bind(agent.ward)
            .bind(agent.panchayath_id)
            .bind(agent.group_leader_id)
            .execute(pool)
            .await
        }
        AgentRole::Supervisor | AgentRole::GroupLeader => {
            let query = format!(
                r#"
                UPDATE panchayath_ops.{}
                SET name = $2, mobile_number = $3, ward = $4, panchayath_id = $5
                WHERE id = $1
                "#,
                agent.role.table_name()
            );
            sqlx::query(&query)
                .bind(agent.id)
                .bind(&agent.name)
                .bind(&agent.mobile_number)
                .bind(agent.ward)
                .bind(agent.panchayath_id)
                .execute(pool)
                .await
        }
    };

    let done = result.map_err(|err| map_write_error(err, agent.role))?;
    if done.rows_affected() == 0 {
        return Err(SubmitError::Persistence(sqlx::Error::RowNotFound));
    }
    tracing::info!(role = %agent.role, id = %agent.id, "agent updated");
    Ok(())
}

pub async fn fetch_notes(
    pool: &PgPool,
    mobile: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<Vec<DailyNote>> {
    let rows = sqlx::query(
        r#"
        SELECT mobile_number, note_date, is_leave, activity
        FROM panchayath_ops.daily_notes
        WHERE mobile_number = $1 AND note_date >= $2 AND note_date <= $3
        ORDER BY note_date
        "#,
    )
    .bind(mobile)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| DailyNote {
            mobile_number: row.get("mobile_number"),
            note_date: row.get("note_date"),
            is_leave: row.get("is_leave"),
            activity: row.get("activity"),
        })
        .collect())
}

/// One note per (mobile, date): recording again overwrites the earlier entry.
pub async fn upsert_note(pool: &PgPool, note: &DailyNote) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO panchayath_ops.daily_notes (mobile_number, note_date, is_leave, activity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (mobile_number, note_date) DO UPDATE
        SET is_leave = EXCLUDED.is_leave, activity = EXCLUDED.activity
        "#,
    )
    .bind(&note.mobile_number)
    .bind(note.note_date)
    .bind(note.is_leave)
    .bind(&note.activity)
    .execute(pool)
    .await?;

    tracing::info!(mobile = %note.mobile_number, date = %note.note_date, "daily note recorded");
    Ok(())
}

/// Bulk-loads daily notes. Existing (mobile, date) rows are left untouched
/// so an import never clobbers manually recorded notes.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        mobile_number: String,
        note_date: NaiveDate,
        is_leave: bool,
        activity: String,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let mobile = validate::normalize_mobile(&row.mobile_number);
        anyhow::ensure!(
            mobile.len() == validate::MOBILE_DIGITS,
            "malformed mobile number {:?} in CSV row dated {}",
            row.mobile_number,
            row.note_date
        );

        let result = sqlx::query(
            r#"
            INSERT INTO panchayath_ops.daily_notes (mobile_number, note_date, is_leave, activity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (mobile_number, note_date) DO NOTHING
            "#,
        )
        .bind(&mobile)
        .bind(row.note_date)
        .bind(row.is_leave)
        .bind(&row.activity)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tracing::info!(inserted, "csv import finished");
    Ok(inserted)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let panchayath_id = Uuid::parse_str("6f1c8a4e-2d5b-4c8f-9a3e-1b7d2e9c4f60")?;
    sqlx::query(
        r#"
        INSERT INTO panchayath_ops.panchayaths (id, name, number_of_wards)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, number_of_wards = EXCLUDED.number_of_wards
        "#,
    )
    .bind(panchayath_id)
    .bind("Kumbalangi")
    .bind(16)
    .execute(pool)
    .await?;

    let group_leader_id = Uuid::parse_str("b3e9d2c1-7a4f-4e6b-8c5d-9f0a1b2c3d4e")?;
    sqlx::query(
        r#"
        INSERT INTO panchayath_ops.group_leaders (id, name, mobile_number, ward, panchayath_id)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, mobile_number = EXCLUDED.mobile_number,
            ward = EXCLUDED.ward, panchayath_id = EXCLUDED.panchayath_id
        "#,
    )
    .bind(group_leader_id)
    .bind("Divya Krishnan")
    .bind("9847034567")
    .bind(2)
    .bind(panchayath_id)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO panchayath_ops.coordinators
        (id, name, mobile_number, ward, panchayath_id, rating)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, mobile_number = EXCLUDED.mobile_number,
            ward = EXCLUDED.ward, panchayath_id = EXCLUDED.panchayath_id,
            rating = EXCLUDED.rating
        "#,
    )
    .bind(Uuid::parse_str("4a7b6c5d-1e2f-4a3b-8c9d-0e1f2a3b4c5d")?)
    .bind("Anitha Suresh")
    .bind("9847012345")
    .bind(3)
    .bind(panchayath_id)
    .bind(4)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO panchayath_ops.supervisors (id, name, mobile_number, ward, panchayath_id)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, mobile_number = EXCLUDED.mobile_number,
            ward = EXCLUDED.ward, panchayath_id = EXCLUDED.panchayath_id
        "#,
    )
    .bind(Uuid::parse_str("8d9e0f1a-3b4c-4d5e-9f6a-7b8c9d0e1f2a")?)
    .bind("Rajeev Menon")
    .bind("9847023456")
    .bind(5)
    .bind(panchayath_id)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO panchayath_ops.pros
        (id, name, mobile_number, ward, panchayath_id, group_leader_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, mobile_number = EXCLUDED.mobile_number,
            ward = EXCLUDED.ward, panchayath_id = EXCLUDED.panchayath_id,
            group_leader_id = EXCLUDED.group_leader_id
        "#,
    )
    .bind(Uuid::parse_str("c5d6e7f8-9a0b-4c1d-8e2f-3a4b5c6d7e8f")?)
    .bind("Faisal Rahman")
    .bind("9847045678")
    .bind(7)
    .bind(panchayath_id)
    .bind(group_leader_id)
    .execute(pool)
    .await?;

    let notes = vec![
        ("9847012345", 27, false, "Ward 3 house visits and ration survey"),
        ("9847012345", 28, false, "Collected beneficiary list from ward office"),
        ("9847012345", 29, true, ""),
        ("9847023456", 27, false, "Reviewed group leader submissions"),
        ("9847023456", 29, false, "Ward 5 site inspection"),
        ("9847034567", 28, false, "Team meeting at panchayath hall"),
        ("9847045678", 26, false, "Distributed notices in ward 7"),
    ];

    for (mobile, day, is_leave, activity) in notes {
        let note_date =
            NaiveDate::from_ymd_opt(2026, 7, day).context("invalid seed note date")?;
        let note = DailyNote {
            mobile_number: mobile.to_string(),
            note_date,
            is_leave,
            activity: activity.to_string(),
        };
        upsert_note(pool, &note).await?;
    }

    Ok(())
}
