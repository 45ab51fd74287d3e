use anyhow::Context;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classify;
use crate::models::{
    Analytics, CandidateStatus, FeedbackAssessment, InterviewResponse, Position,
    PositionAggregate,
};

const RESPONSE_COLUMNS: &str = "id, interview_id, call_id, name, email, candidate_status, \
     analytics, duration, tab_switch_count, created_at";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_interview(
    pool: &PgPool,
    organization_id: &str,
    name: &str,
    description: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO hire_signal.interviews (id, name, description, organization_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (organization_id, name) DO UPDATE
        SET description = EXCLUDED.description
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .bind(organization_id)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

struct NewResponse<'a> {
    interview_id: Uuid,
    call_id: &'a str,
    name: Option<&'a str>,
    email: Option<&'a str>,
    candidate_status: Option<&'a str>,
    analytics: Value,
    duration: Option<i32>,
    created_at: DateTime<Utc>,
}

/// Returns false when the call id was already recorded.
async fn insert_response(pool: &PgPool, response: NewResponse<'_>) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO hire_signal.responses
        (id, interview_id, call_id, name, email, candidate_status, analytics, duration,
         is_ended, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9)
        ON CONFLICT (call_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(response.interview_id)
    .bind(response.call_id)
    .bind(response.name)
    .bind(response.email)
    .bind(response.candidate_status)
    .bind(Json(response.analytics))
    .bind(response.duration)
    .bind(response.created_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let organization = "org_demo";
    let interviews = vec![
        (
            "Frontend Engineer",
            "React and TypeScript engineer for the candidate portal",
        ),
        (
            "Data Analyst",
            "SQL-heavy analyst supporting the growth team",
        ),
    ];

    let mut interview_ids = Vec::new();
    for (name, description) in interviews {
        interview_ids.push(upsert_interview(pool, organization, name, description).await?);
    }

    let base = Utc
        .with_ymd_and_hms(2026, 2, 2, 14, 0, 0)
        .single()
        .context("invalid seed timestamp")?;

    let responses = vec![
        (0, "seed-call-001", "Avery Lee", "avery.lee@example.com", Some("SELECTED"), 92.4, vec!["React", "TypeScript"], 1820),
        (0, "seed-call-002", "Jules Moreno", "jules.moreno@example.com", Some("POTENTIAL"), 78.0, vec!["React", "CSS"], 1540),
        (0, "seed-call-003", "Kiara Patel", "kiara.patel@example.com", Some("NOT_SELECTED"), 54.5, vec!["jQuery"], 960),
        (0, "seed-call-004", "Sam Okafor", "sam.okafor@example.com", None, 81.2, vec!["Vue", "Node.js"], 1710),
        (1, "seed-call-005", "Lena Fischer", "lena.fischer@example.com", Some("POTENTIAL"), 88.6, vec!["SQL", "Python"], 2010),
        (1, "seed-call-006", "Marco Rossi", "marco.rossi@example.com", Some("NO_STATUS"), 66.0, vec!["Excel"], 1320),
    ];

    for (offset, (interview, call_id, name, email, status, score, skills, duration)) in
        responses.into_iter().enumerate()
    {
        insert_response(
            pool,
            NewResponse {
                interview_id: interview_ids[interview],
                call_id,
                name: Some(name),
                email: Some(email),
                candidate_status: status,
                analytics: json!({ "overallScore": score, "skills": skills }),
                duration: Some(duration),
                created_at: base + Duration::hours(offset as i64 * 20),
            },
        )
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        organization_id: String,
        interview_name: String,
        call_id: String,
        name: Option<String>,
        email: Option<String>,
        candidate_status: Option<String>,
        overall_score: Option<f64>,
        skills: Option<String>,
        duration: Option<i32>,
        created_at: DateTime<Utc>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid row {}", line + 1))?;
        let interview_id =
            upsert_interview(pool, &row.organization_id, &row.interview_name, "").await?;

        let skills: Vec<&str> = row
            .skills
            .as_deref()
            .map(|value| {
                value
                    .split(';')
                    .map(str::trim)
                    .filter(|skill| !skill.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let mut analytics = json!({ "skills": skills });
        if let Some(score) = row.overall_score {
            analytics["overallScore"] = json!(score);
        }

        let fresh = insert_response(
            pool,
            NewResponse {
                interview_id,
                call_id: &row.call_id,
                name: row.name.as_deref(),
                email: row.email.as_deref(),
                candidate_status: row.candidate_status.as_deref(),
                analytics,
                duration: row.duration,
                created_at: row.created_at,
            },
        )
        .await?;

        if fresh {
            inserted += 1;
        } else {
            debug!(call_id = %row.call_id, "call already imported");
        }
    }

    Ok(inserted)
}

fn response_from_row(row: &PgRow) -> Result<InterviewResponse, sqlx::Error> {
    let analytics: Option<Json<Value>> = row.try_get("analytics")?;
    let candidate_status: Option<String> = row.try_get("candidate_status")?;
    let name: Option<String> = row.try_get("name")?;
    let email: Option<String> = row.try_get("email")?;

    Ok(InterviewResponse {
        id: row.try_get("id")?,
        interview_id: row.try_get("interview_id")?,
        call_id: row.try_get("call_id")?,
        name: name.unwrap_or_else(|| "Anonymous".to_string()),
        email: email.unwrap_or_default(),
        status: CandidateStatus::from_raw(candidate_status.as_deref()),
        created_at: row.try_get("created_at")?,
        duration: row.try_get("duration")?,
        tab_switch_count: row.try_get("tab_switch_count")?,
        analytics: Analytics::from_value(analytics.as_ref().map(|json| &json.0)),
    })
}

fn position_from_row(row: &PgRow) -> Result<Position, sqlx::Error> {
    let name: Option<String> = row.try_get("name")?;
    let description: Option<String> = row.try_get("description")?;

    Ok(Position {
        id: row.try_get("id")?,
        name: name.unwrap_or_else(|| "Unnamed Interview".to_string()),
        description: description.unwrap_or_default(),
        organization_id: row.try_get("organization_id")?,
        created_at: row.try_get("created_at")?,
        counts: PositionAggregate::default(),
    })
}

/// Ended responses for an interview, newest first.
pub async fn fetch_responses(
    pool: &PgPool,
    interview_id: Uuid,
) -> anyhow::Result<Vec<InterviewResponse>> {
    let query = format!(
        "SELECT {RESPONSE_COLUMNS} FROM hire_signal.responses \
         WHERE interview_id = $1 AND is_ended \
         ORDER BY created_at DESC"
    );

    let rows = sqlx::query(&query).bind(interview_id).fetch_all(pool).await?;
    let responses = rows
        .iter()
        .map(response_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(responses)
}

/// Like `fetch_responses`, but a failed read is logged and yields no rows.
pub async fn load_responses(pool: &PgPool, interview_id: Uuid) -> Vec<InterviewResponse> {
    match fetch_responses(pool, interview_id).await {
        Ok(responses) => responses,
        Err(err) => {
            warn!(%interview_id, error = %err, "failed to fetch responses");
            Vec::new()
        }
    }
}

pub async fn fetch_response_by_call(
    pool: &PgPool,
    call_id: &str,
) -> anyhow::Result<Option<InterviewResponse>> {
    let query = format!("SELECT {RESPONSE_COLUMNS} FROM hire_signal.responses WHERE call_id = $1");

    let row = sqlx::query(&query).bind(call_id).fetch_optional(pool).await?;
    Ok(row.as_ref().map(response_from_row).transpose()?)
}

/// Active interviews owned by the organization (or the user), newest first,
/// each with counters over its ended responses.
pub async fn fetch_positions(
    pool: &PgPool,
    organization_id: &str,
    user_id: Option<&str>,
) -> anyhow::Result<Vec<Position>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, description, organization_id, created_at
        FROM hire_signal.interviews
        WHERE is_active AND (organization_id = $1 OR ($2::TEXT IS NOT NULL AND user_id = $2))
        ORDER BY created_at DESC
        "#,
    )
    .bind(organization_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut positions = rows
        .iter()
        .map(position_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = positions.len(), organization_id, "fetched interviews");

    for position in positions.iter_mut() {
        let responses = load_responses(pool, position.id).await;
        position.counts = classify::aggregate(&responses);
    }

    Ok(positions)
}

/// The position with its counters, plus the ended responses they were
/// aggregated from.
pub async fn fetch_position(
    pool: &PgPool,
    position_id: Uuid,
) -> anyhow::Result<Option<(Position, Vec<InterviewResponse>)>> {
    let row = sqlx::query(
        "SELECT id, name, description, organization_id, created_at \
         FROM hire_signal.interviews WHERE id = $1",
    )
    .bind(position_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut position = position_from_row(&row)?;
    let responses = load_responses(pool, position.id).await;
    position.counts = classify::aggregate(&responses);
    Ok(Some((position, responses)))
}

pub async fn get_cached_feedback(
    pool: &PgPool,
    call_id: &str,
) -> anyhow::Result<Option<FeedbackAssessment>> {
    let row = sqlx::query(
        "SELECT feedback_data FROM hire_signal.resume_feedback_cache WHERE call_id = $1",
    )
    .bind(call_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let Json(feedback): Json<FeedbackAssessment> = row
        .try_get("feedback_data")
        .with_context(|| format!("cached feedback for {call_id} is malformed"))?;
    Ok(Some(feedback))
}

pub async fn cache_feedback(
    pool: &PgPool,
    call_id: &str,
    interview_id: &str,
    feedback: &FeedbackAssessment,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO hire_signal.resume_feedback_cache
        (id, call_id, interview_id, feedback_data, updated_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (call_id) DO UPDATE
        SET interview_id = EXCLUDED.interview_id,
            feedback_data = EXCLUDED.feedback_data,
            updated_at = NOW()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(call_id)
    .bind(interview_id)
    .bind(Json(feedback))
    .execute(pool)
    .await?;

    info!(call_id, interview_id, "feedback cached");
    Ok(())
}

pub async fn has_cached_feedback(pool: &PgPool, call_id: &str) -> anyhow::Result<bool> {
    let exists: bool = sqlx::query(
        "SELECT EXISTS (SELECT 1 FROM hire_signal.resume_feedback_cache WHERE call_id = $1) AS present",
    )
    .bind(call_id)
    .fetch_one(pool)
    .await?
    .get("present");

    Ok(exists)
}

pub async fn delete_cached_feedback(pool: &PgPool, call_id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM hire_signal.resume_feedback_cache WHERE call_id = $1")
        .bind(call_id)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        info!(call_id, "cached feedback deleted");
    }
    Ok(result.rows_affected() > 0)
}

pub async fn cached_feedback_by_interview(
    pool: &PgPool,
    interview_id: &str,
) -> anyhow::Result<Vec<(String, FeedbackAssessment)>> {
    let rows = sqlx::query(
        r#"
        SELECT call_id, feedback_data
        FROM hire_signal.resume_feedback_cache
        WHERE interview_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(interview_id)
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let call_id: String = row.get("call_id");
        let Json(feedback): Json<FeedbackAssessment> = row.try_get("feedback_data")?;
        entries.push((call_id, feedback));
    }

    Ok(entries)
}
