use std::fmt::Write;

use crate::classify::{self, ShareBand};
use crate::models::{AtsFactors, CandidateDisplayRecord, Course, FeedbackAssessment, Position};
use crate::roadmap;

const SUMMARY_PREVIEW_CHARS: usize = 120;

fn share_marker(band: ShareBand) -> &'static str {
    match band {
        ShareBand::Strong => " (majority)",
        ShareBand::Moderate => " (notable)",
        ShareBand::Low | ShareBand::None => "",
    }
}

pub fn format_duration(seconds: Option<i32>) -> String {
    match seconds {
        Some(value) => format!("{} min", classify::round_score(f64::from(value) / 60.0)),
        None => "N/A".to_string(),
    }
}

pub fn position_report(position: &Position, candidates: &[CandidateDisplayRecord]) -> String {
    let stats = classify::position_stats(candidates);
    let counts = &position.counts;
    let mut output = String::new();

    let _ = writeln!(output, "# {}", position.name);
    if !position.description.is_empty() {
        let _ = writeln!(output, "{}", position.description);
    }
    let _ = writeln!(output, "Opened {}", position.created_at.date_naive());
    let _ = writeln!(output);

    let _ = writeln!(output, "## Pipeline");
    let _ = writeln!(output, "- Total: {}", counts.total_candidates);
    let _ = writeln!(
        output,
        "- Selected: {}{}",
        counts.hired_count,
        share_marker(classify::selection_share(counts.hired_count, counts.total_candidates))
    );
    let _ = writeln!(output, "- Potential: {}", counts.interviewed_count);
    let _ = writeln!(output, "- Not Selected: {}", counts.rejected_count);
    let _ = writeln!(output, "- No Status: {}", counts.pending_count);
    let _ = writeln!(output, "- Average score: {}", stats.average_score);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Performers");

    if stats.top_performers.is_empty() {
        let _ = writeln!(output, "No completed interviews yet.");
    } else {
        for candidate in stats.top_performers.iter() {
            let _ = writeln!(
                output,
                "- {} ({}) score {} [{}]",
                candidate.name,
                candidate.email,
                candidate.score,
                candidate.performance_rating.label()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Candidates");

    if candidates.is_empty() {
        let _ = writeln!(output, "No completed interviews yet.");
    } else {
        let _ = writeln!(
            output,
            "| Name | Score | Status | Performance | Interview Date | Duration |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for candidate in candidates {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} |",
                candidate.name,
                candidate.score,
                candidate.status.label(),
                candidate.performance_rating.label(),
                candidate.interview_date,
                format_duration(candidate.duration)
            );
        }
    }

    output
}

/// Absent feedback renders no verdict; only feedback that fails the
/// eligibility check is reported as strong.
pub fn roadmap_report(
    subject: &str,
    feedback: Option<&FeedbackAssessment>,
    catalog: &[Course],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Learning Roadmap for {subject}");

    let Some(feedback) = feedback else {
        let _ = writeln!(output, "No feedback available for {subject}.");
        return output;
    };

    let Some(roadmap) = roadmap::build_roadmap(Some(feedback), catalog) else {
        let _ = writeln!(output, "No roadmap needed; performance is strong across all areas.");
        return output;
    };

    let _ = writeln!(output);
    let _ = writeln!(output, "## Areas for Improvement");

    for topic in roadmap.weak_topics.iter() {
        let _ = writeln!(output, "- {} ({}/5)", topic.topic, topic.rating);
        for area in topic.areas.iter() {
            let _ = writeln!(output, "  - {area}");
        }
    }

    if !roadmap.general_areas.is_empty() {
        let _ = writeln!(output, "- General areas");
        for area in roadmap.general_areas.iter() {
            let _ = writeln!(output, "  - {area}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommended Courses");

    for course in roadmap.courses.iter() {
        let _ = writeln!(
            output,
            "- {} ({}, {}, rated {:.1})",
            course.title, course.duration, course.level, course.rating
        );
        let _ = writeln!(output, "  {}", course.description);
        let _ = writeln!(output, "  Skills: {}", course.skills.join(", "));
    }

    output
}

fn topic_rating_label(rating: f64) -> &'static str {
    if rating >= 4.0 {
        "strong"
    } else if rating >= 3.0 {
        "fair"
    } else {
        "weak"
    }
}

fn stars(rating: f64) -> String {
    (1..=5)
        .map(|star| if f64::from(star) <= rating { '★' } else { '☆' })
        .collect()
}

fn preview(text: &str) -> String {
    if text.chars().count() > SUMMARY_PREVIEW_CHARS {
        let head: String = text.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn factor_lines(factors: &AtsFactors) -> Vec<(&'static str, f64)> {
    [
        ("keyword match", factors.keyword_match),
        ("experience relevance", factors.experience_relevance),
        ("skills alignment", factors.skills_alignment),
        ("education match", factors.education_match),
        ("format quality", factors.format_quality),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|value| (label, value)))
    .collect()
}

pub fn feedback_summary(call_id: &str, feedback: &FeedbackAssessment) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Resume Feedback for {call_id}");

    if let Some(ats) = feedback.ats_score.as_ref().filter(|ats| ats.score.is_some()) {
        let _ = writeln!(output);
        let _ = writeln!(output, "## ATS Score");
        let _ = writeln!(
            output,
            "{} / {}",
            ats.score.unwrap_or(0.0),
            ats.max_score.unwrap_or(100.0)
        );
        if let Some(factors) = &ats.factors {
            for (label, value) in factor_lines(factors) {
                let _ = writeln!(output, "- {label}: {value}");
            }
        }
        for suggestion in ats.improvement_suggestions.iter() {
            let _ = writeln!(output, "- Suggestion: {suggestion}");
        }
    }

    let topics = feedback.topic_wise_feedback.as_deref().unwrap_or_default();
    if !topics.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Topics");
        for topic in topics {
            match topic.performance_rating {
                Some(rating) => {
                    let _ = writeln!(
                        output,
                        "- {} {} {}/5 ({})",
                        topic.topic,
                        stars(rating),
                        rating,
                        topic_rating_label(rating)
                    );
                }
                None => {
                    let _ = writeln!(output, "- {} (unrated)", topic.topic);
                }
            }
            if !topic.questions_asked.is_empty() {
                let _ = writeln!(output, "  Questions asked: {}", topic.questions_asked.len());
            }
            if let Some(summary) = &topic.candidate_response_summary {
                let _ = writeln!(output, "  Response: {}", preview(summary));
            }
            if let Some(alignment) = &topic.resume_alignment {
                let _ = writeln!(output, "  Resume alignment: {alignment}");
            }
            if let Some(note) = &topic.feedback {
                let _ = writeln!(output, "  Feedback: {note}");
            }
        }
    }

    if let Some(overall) = &feedback.overall_assessment {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Overall");
        if let Some(consistency) = overall.resume_interview_consistency {
            let _ = writeln!(output, "- Resume/interview consistency: {consistency}%");
        }
        if let Some(recommendation) = &overall.recommendation {
            let _ = writeln!(output, "- Recommendation: {}", recommendation.to_uppercase());
        }
        if !overall.strengths.is_empty() {
            let _ = writeln!(output, "- Strengths: {}", overall.strengths.join("; "));
        }
        if !overall.weaknesses.is_empty() {
            let _ = writeln!(output, "- Weaknesses: {}", overall.weaknesses.join("; "));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Analytics, AtsScore, CandidateStatus, InterviewResponse, OverallAssessment,
        PositionAggregate, TopicFeedback,
    };
    use crate::roadmap::COURSE_CATALOG;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_candidate(name: &str, status: CandidateStatus, score: f64) -> CandidateDisplayRecord {
        classify::display_record(&InterviewResponse {
            id: Uuid::new_v4(),
            interview_id: Uuid::nil(),
            call_id: format!("call-{name}"),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            status,
            created_at: Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap(),
            duration: Some(1500),
            tab_switch_count: Some(0),
            analytics: Analytics {
                overall_score: score,
                skills: Vec::new(),
            },
        })
    }

    fn sample_position(counts: PositionAggregate) -> Position {
        Position {
            id: Uuid::nil(),
            name: "Backend Engineer".to_string(),
            description: "Payments team".to_string(),
            organization_id: "org_demo".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
            counts,
        }
    }

    #[test]
    fn duration_is_rendered_in_minutes() {
        assert_eq!(format_duration(Some(1500)), "25 min");
        assert_eq!(format_duration(Some(89)), "1 min");
        assert_eq!(format_duration(None), "N/A");
    }

    #[test]
    fn position_report_lists_pipeline_and_candidates() {
        let candidates = vec![
            sample_candidate("Ada", CandidateStatus::Selected, 93.0),
            sample_candidate("Ben", CandidateStatus::NotSelected, 58.0),
        ];
        let counts = PositionAggregate {
            total_candidates: 2,
            hired_count: 1,
            rejected_count: 1,
            ..PositionAggregate::default()
        };

        let report = position_report(&sample_position(counts), &candidates);
        assert!(report.contains("# Backend Engineer"));
        assert!(report.contains("- Selected: 1 (majority)"));
        assert!(report.contains("- Average score: 76"));
        assert!(report.contains("- Ada (ada@example.com) score 93 [Excellent]"));
        assert!(report.contains("| Ben | 58 | Not Selected | Below Average | 2026-01-20 | 25 min |"));
    }

    #[test]
    fn empty_position_report_says_so() {
        let report = position_report(&sample_position(PositionAggregate::default()), &[]);
        assert!(report.contains("- Total: 0"));
        assert!(report.contains("No completed interviews yet."));
    }

    #[test]
    fn roadmap_report_renders_courses() {
        let feedback = FeedbackAssessment {
            overall_assessment: Some(OverallAssessment {
                weaknesses: vec!["Docker".to_string()],
                ..OverallAssessment::default()
            }),
            ..FeedbackAssessment::default()
        };
        let report = roadmap_report("call-123", Some(&feedback), &COURSE_CATALOG);
        assert!(report.contains("## Recommended Courses"));
        assert!(report.contains("- Cloud Computing & DevOps (5 months, Intermediate, rated 4.5)"));
        assert!(report.contains("  - Docker"));
    }

    #[test]
    fn roadmap_report_for_strong_feedback() {
        let feedback = FeedbackAssessment {
            ats_score: Some(AtsScore {
                score: Some(90.0),
                ..AtsScore::default()
            }),
            overall_assessment: Some(OverallAssessment {
                resume_interview_consistency: Some(95.0),
                recommendation: Some("SELECTED".to_string()),
                ..OverallAssessment::default()
            }),
            ..FeedbackAssessment::default()
        };

        let report = roadmap_report("call-123", Some(&feedback), &COURSE_CATALOG);
        assert!(report.contains("No roadmap needed"));
        assert!(!report.contains("## Recommended Courses"));
    }

    #[test]
    fn roadmap_report_without_feedback_gives_no_verdict() {
        let report = roadmap_report("call-123", None, &COURSE_CATALOG);
        assert!(report.contains("No feedback available for call-123."));
        assert!(!report.contains("No roadmap needed"));
        assert!(!report.contains("## Recommended Courses"));
    }

    #[test]
    fn roadmap_report_for_weak_feedback_with_null_lists() {
        let feedback: FeedbackAssessment = serde_json::from_str(
            r#"{
                "ats_score": { "score": 40, "improvement_suggestions": null },
                "topic_wise_feedback": [
                    { "topic": "Docker", "performance_rating": 1, "areas_for_improvement": null }
                ],
                "overall_assessment": { "recommendation": "NOT_SELECTED", "strengths": null, "weaknesses": null }
            }"#,
        )
        .unwrap();

        let report = roadmap_report("call-123", Some(&feedback), &COURSE_CATALOG);
        assert!(!report.contains("No roadmap needed"));
        assert!(report.contains("- Docker (1/5)"));
        assert!(report.contains("- Cloud Computing & DevOps"));
    }

    #[test]
    fn feedback_summary_covers_each_section() {
        let feedback = FeedbackAssessment {
            ats_score: Some(AtsScore {
                score: Some(64.0),
                factors: Some(AtsFactors {
                    keyword_match: Some(55.0),
                    ..AtsFactors::default()
                }),
                improvement_suggestions: vec!["List measurable outcomes".to_string()],
                ..AtsScore::default()
            }),
            topic_wise_feedback: Some(vec![TopicFeedback {
                topic: "SQL".to_string(),
                performance_rating: Some(2.0),
                candidate_response_summary: Some("x".repeat(130)),
                ..TopicFeedback::default()
            }]),
            overall_assessment: Some(OverallAssessment {
                resume_interview_consistency: Some(72.0),
                recommendation: Some("potential".to_string()),
                strengths: vec!["Clear communicator".to_string()],
                ..OverallAssessment::default()
            }),
        };

        let summary = feedback_summary("call-9", &feedback);
        assert!(summary.contains("64 / 100"));
        assert!(summary.contains("- keyword match: 55"));
        assert!(!summary.contains("format quality"));
        assert!(summary.contains("- SQL ★★☆☆☆ 2/5 (weak)"));
        assert!(summary.contains(&format!("  Response: {}...", "x".repeat(120))));
        assert!(summary.contains("- Recommendation: POTENTIAL"));
        assert!(summary.contains("- Resume/interview consistency: 72%"));
    }

    #[test]
    fn feedback_summary_skips_missing_ats_score() {
        let summary = feedback_summary("call-9", &FeedbackAssessment::default());
        assert!(!summary.contains("## ATS Score"));
        assert!(!summary.contains("## Topics"));
    }
}
