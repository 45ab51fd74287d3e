use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Hiring decision recorded against a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Selected,
    Potential,
    NotSelected,
    NoStatus,
}

impl CandidateStatus {
    /// Maps the raw database value. Matching is case-sensitive and anything
    /// unrecognised, including a missing value, lands in `NoStatus`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("SELECTED") => Self::Selected,
            Some("POTENTIAL") => Self::Potential,
            Some("NOT_SELECTED") => Self::NotSelected,
            _ => Self::NoStatus,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Selected => "selected",
            Self::Potential => "potential",
            Self::NotSelected => "not_selected",
            Self::NoStatus => "no_status",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Selected => "Selected",
            Self::Potential => "Potential",
            Self::NotSelected => "Not Selected",
            Self::NoStatus => "No Status",
        }
    }
}

/// Interview analytics, validated from the loose JSON bag stored per response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analytics {
    pub overall_score: f64,
    pub skills: Vec<String>,
}

impl Analytics {
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };

        let overall_score = value
            .get("overallScore")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let skills = value
            .get("skills")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            overall_score,
            skills,
        }
    }
}

/// One completed interview attempt.
#[derive(Debug, Clone)]
pub struct InterviewResponse {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub call_id: String,
    pub name: String,
    pub email: String,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
    pub duration: Option<i32>,
    pub tab_switch_count: Option<i32>,
    pub analytics: Analytics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PositionAggregate {
    pub total_candidates: usize,
    pub hired_count: usize,
    pub interviewed_count: usize,
    pub pending_count: usize,
    pub rejected_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub organization_id: String,
    pub created_at: DateTime<Utc>,
    pub counts: PositionAggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceRating {
    Excellent,
    Good,
    Average,
    #[serde(rename = "Below Average")]
    BelowAverage,
}

impl PerformanceRating {
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::BelowAverage => "Below Average",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateDisplayRecord {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub call_id: String,
    pub name: String,
    pub email: String,
    pub score: i64,
    pub status: CandidateStatus,
    pub performance_rating: PerformanceRating,
    pub interview_date: NaiveDate,
    pub skills: Vec<String>,
    pub duration: Option<i32>,
    pub tab_switch_count: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionStats {
    pub counts: PositionAggregate,
    pub average_score: i64,
    pub top_performers: Vec<CandidateDisplayRecord>,
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// AI-produced resume/interview assessment. Every field tolerates absence
/// and `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAssessment {
    #[serde(default)]
    pub ats_score: Option<AtsScore>,
    #[serde(default)]
    pub topic_wise_feedback: Option<Vec<TopicFeedback>>,
    #[serde(default)]
    pub overall_assessment: Option<OverallAssessment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtsScore {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub factors: Option<AtsFactors>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub improvement_suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtsFactors {
    #[serde(default)]
    pub keyword_match: Option<f64>,
    #[serde(default)]
    pub experience_relevance: Option<f64>,
    #[serde(default)]
    pub skills_alignment: Option<f64>,
    #[serde(default)]
    pub education_match: Option<f64>,
    #[serde(default)]
    pub format_quality: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicFeedback {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions_asked: Vec<String>,
    #[serde(default)]
    pub candidate_response_summary: Option<String>,
    #[serde(default)]
    pub resume_alignment: Option<String>,
    #[serde(default)]
    pub performance_rating: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub areas_for_improvement: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    #[serde(default)]
    pub resume_interview_consistency: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// Catalog entry offered to candidates who need remedial work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub title: &'static str,
    pub duration: &'static str,
    pub level: &'static str,
    pub skills: &'static [&'static str],
    pub description: &'static str,
    pub rating: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_mapping_is_total() {
        assert_eq!(CandidateStatus::from_raw(Some("SELECTED")), CandidateStatus::Selected);
        assert_eq!(CandidateStatus::from_raw(Some("POTENTIAL")), CandidateStatus::Potential);
        assert_eq!(
            CandidateStatus::from_raw(Some("NOT_SELECTED")),
            CandidateStatus::NotSelected
        );
        assert_eq!(CandidateStatus::from_raw(Some("NO_STATUS")), CandidateStatus::NoStatus);
        assert_eq!(CandidateStatus::from_raw(Some("selected")), CandidateStatus::NoStatus);
        assert_eq!(CandidateStatus::from_raw(Some("HIRED")), CandidateStatus::NoStatus);
        assert_eq!(CandidateStatus::from_raw(None), CandidateStatus::NoStatus);
    }

    #[test]
    fn analytics_defaults_missing_fields() {
        assert_eq!(Analytics::from_value(None), Analytics::default());

        let value = json!({ "overallScore": 82.4, "skills": ["Rust", 7, "SQL"] });
        let analytics = Analytics::from_value(Some(&value));
        assert_eq!(analytics.overall_score, 82.4);
        assert_eq!(analytics.skills, vec!["Rust".to_string(), "SQL".to_string()]);

        let value = json!({ "overallScore": "high" });
        let analytics = Analytics::from_value(Some(&value));
        assert_eq!(analytics.overall_score, 0.0);
        assert!(analytics.skills.is_empty());
    }

    #[test]
    fn feedback_decodes_partial_documents() {
        let feedback: FeedbackAssessment = serde_json::from_value(json!({
            "ats_score": { "score": 64 },
            "topic_wise_feedback": [{ "topic": "React", "performance_rating": 2 }]
        }))
        .unwrap();

        assert_eq!(feedback.ats_score.unwrap().score, Some(64.0));
        let topics = feedback.topic_wise_feedback.unwrap();
        assert_eq!(topics[0].performance_rating, Some(2.0));
        assert!(topics[0].areas_for_improvement.is_empty());
        assert!(feedback.overall_assessment.is_none());
    }

    #[test]
    fn feedback_treats_null_lists_as_empty() {
        let feedback: FeedbackAssessment = serde_json::from_value(json!({
            "ats_score": { "score": 40, "improvement_suggestions": null },
            "topic_wise_feedback": [{
                "topic": null,
                "questions_asked": null,
                "performance_rating": 1,
                "areas_for_improvement": null
            }],
            "overall_assessment": {
                "recommendation": "NOT_SELECTED",
                "strengths": null,
                "weaknesses": null
            }
        }))
        .unwrap();

        assert!(feedback.ats_score.unwrap().improvement_suggestions.is_empty());
        let topics = feedback.topic_wise_feedback.unwrap();
        assert_eq!(topics[0].topic, "");
        assert!(topics[0].questions_asked.is_empty());
        assert!(topics[0].areas_for_improvement.is_empty());
        let overall = feedback.overall_assessment.unwrap();
        assert!(overall.strengths.is_empty());
        assert!(overall.weaknesses.is_empty());
    }
}
