use serde::Serialize;

use crate::models::{Course, FeedbackAssessment, TopicFeedback};

const ATS_THRESHOLD: f64 = 70.0;
const CONSISTENCY_THRESHOLD: f64 = 70.0;
const WEAK_TOPIC_RATING: f64 = 2.0;
const MAX_COURSES: usize = 3;
const PREVIEW_ITEMS: usize = 2;

/// Courses offered to candidates whose feedback shows weak areas.
pub const COURSE_CATALOG: [Course; 5] = [
    Course {
        title: "Full Stack Web Development",
        duration: "6 months",
        level: "Beginner to Advanced",
        skills: &["React", "Node.js", "JavaScript", "MongoDB", "Express"],
        description: "Master modern web development with hands-on projects and industry mentorship.",
        rating: 4.8,
    },
    Course {
        title: "Data Science & Machine Learning",
        duration: "8 months",
        level: "Intermediate",
        skills: &["Python", "Machine Learning", "Data Analysis", "Statistics", "AI"],
        description: "Become a data scientist with real-world projects and expert guidance.",
        rating: 4.7,
    },
    Course {
        title: "Software Engineering Fundamentals",
        duration: "4 months",
        level: "Beginner",
        skills: &["Programming", "Algorithms", "System Design", "Problem Solving"],
        description: "Build strong programming foundations with industry best practices.",
        rating: 4.6,
    },
    Course {
        title: "Cloud Computing & DevOps",
        duration: "5 months",
        level: "Intermediate",
        skills: &["AWS", "Docker", "Kubernetes", "CI/CD", "Cloud Architecture"],
        description: "Master cloud technologies and deployment strategies.",
        rating: 4.5,
    },
    Course {
        title: "Product Management",
        duration: "6 months",
        level: "Beginner to Intermediate",
        skills: &["Product Strategy", "User Research", "Analytics", "Leadership"],
        description: "Learn to build and manage successful products from ideation to launch.",
        rating: 4.4,
    },
];

/// Catalog positions recommended when nothing matches the weak areas.
const FALLBACK_COURSES: [usize; 2] = [2, 0];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeakTopic {
    pub topic: String,
    pub rating: f64,
    pub areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roadmap<'a> {
    pub weak_topics: Vec<WeakTopic>,
    pub general_areas: Vec<String>,
    pub courses: Vec<&'a Course>,
}

/// Missing ATS or consistency values count as zero, so incomplete feedback
/// always qualifies.
pub fn should_show_roadmap(feedback: &FeedbackAssessment) -> bool {
    let ats_score = feedback
        .ats_score
        .as_ref()
        .and_then(|ats| ats.score)
        .unwrap_or(0.0);
    let overall = feedback.overall_assessment.as_ref();
    let consistency = overall
        .and_then(|assessment| assessment.resume_interview_consistency)
        .unwrap_or(0.0);
    let recommendation = overall
        .and_then(|assessment| assessment.recommendation.as_deref())
        .map(str::to_uppercase);

    ats_score < ATS_THRESHOLD
        || consistency < CONSISTENCY_THRESHOLD
        || matches!(
            recommendation.as_deref(),
            Some("NOT_SELECTED") | Some("DEVELOPMENTAL")
        )
        || weak_topics(feedback).next().is_some()
}

/// Topics rated 2 or lower. A topic without a rating, including an explicit
/// `null`, is never weak.
fn weak_topics(feedback: &FeedbackAssessment) -> impl Iterator<Item = &TopicFeedback> {
    feedback
        .topic_wise_feedback
        .iter()
        .flatten()
        .filter(|topic| {
            topic
                .performance_rating
                .is_some_and(|rating| rating <= WEAK_TOPIC_RATING)
        })
}

/// Lowercased keywords: each weak topic followed by its improvement areas,
/// then the overall weaknesses.
pub fn weak_areas(feedback: &FeedbackAssessment) -> Vec<String> {
    let mut areas = Vec::new();

    for topic in weak_topics(feedback) {
        areas.push(topic.topic.to_lowercase());
        areas.extend(
            topic
                .areas_for_improvement
                .iter()
                .map(|area| area.to_lowercase()),
        );
    }

    if let Some(overall) = &feedback.overall_assessment {
        areas.extend(overall.weaknesses.iter().map(|weakness| weakness.to_lowercase()));
    }

    areas
}

fn overlaps(skill: &str, areas: &[String]) -> bool {
    let skill = skill.to_lowercase();
    areas
        .iter()
        .any(|area| area.contains(&skill) || skill.contains(area.as_str()))
}

pub fn recommend_courses<'a>(feedback: &FeedbackAssessment, catalog: &'a [Course]) -> Vec<&'a Course> {
    let areas = weak_areas(feedback);
    let matched: Vec<&Course> = catalog
        .iter()
        .filter(|course| course.skills.iter().any(|skill| overlaps(skill, &areas)))
        .take(MAX_COURSES)
        .collect();

    if matched.is_empty() {
        return FALLBACK_COURSES
            .iter()
            .filter_map(|index| catalog.get(*index))
            .collect();
    }

    matched
}

pub fn build_roadmap<'a>(
    feedback: Option<&FeedbackAssessment>,
    catalog: &'a [Course],
) -> Option<Roadmap<'a>> {
    let feedback = feedback?;
    if !should_show_roadmap(feedback) {
        return None;
    }

    let topics = weak_topics(feedback)
        .map(|topic| WeakTopic {
            topic: topic.topic.clone(),
            rating: topic.performance_rating.unwrap_or(0.0),
            areas: topic
                .areas_for_improvement
                .iter()
                .take(PREVIEW_ITEMS)
                .cloned()
                .collect(),
        })
        .collect();
    let general_areas = feedback
        .overall_assessment
        .as_ref()
        .map(|overall| overall.weaknesses.iter().take(PREVIEW_ITEMS).cloned().collect())
        .unwrap_or_default();

    Some(Roadmap {
        weak_topics: topics,
        general_areas,
        courses: recommend_courses(feedback, catalog),
    })
}
