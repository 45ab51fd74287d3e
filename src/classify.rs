use clap::ValueEnum;

use crate::models::{
    CandidateDisplayRecord, CandidateStatus, InterviewResponse, PerformanceRating,
    PositionAggregate, PositionStats,
};

/// Candidate list views offered on a position page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CandidateFilter {
    #[default]
    All,
    #[value(name = "top5")]
    Top5,
    #[value(name = "top10")]
    Top10,
    Selected,
    Potential,
    #[value(name = "not_selected")]
    NotSelected,
    #[value(name = "no_status")]
    NoStatus,
}

/// Colour band used next to a raw score. Independent of `PerformanceRating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Green,
    Blue,
    Yellow,
    Red,
}

impl ScoreBand {
    pub fn label(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

/// How large a counter is relative to the position total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareBand {
    None,
    Low,
    Moderate,
    Strong,
}

pub fn aggregate(responses: &[InterviewResponse]) -> PositionAggregate {
    let mut counts = PositionAggregate::default();

    for response in responses {
        tally(&mut counts, response.status);
    }

    counts
}

// Every record bumps the total and exactly one status counter.
fn tally(counts: &mut PositionAggregate, status: CandidateStatus) {
    counts.total_candidates += 1;
    match status {
        CandidateStatus::Selected => counts.hired_count += 1,
        CandidateStatus::Potential => counts.interviewed_count += 1,
        CandidateStatus::NotSelected => counts.rejected_count += 1,
        CandidateStatus::NoStatus => counts.pending_count += 1,
    }
}

/// Half-up rounding, so 84.5 becomes 85 and -0.5 becomes 0.
pub fn round_score(raw: f64) -> i64 {
    (raw + 0.5).floor() as i64
}

pub fn performance_rating(score: i64) -> PerformanceRating {
    match score {
        s if s >= 90 => PerformanceRating::Excellent,
        s if s >= 80 => PerformanceRating::Good,
        s if s >= 70 => PerformanceRating::Average,
        _ => PerformanceRating::BelowAverage,
    }
}

pub fn score_band(score: i64) -> ScoreBand {
    if score >= 90 {
        ScoreBand::Green
    } else if score >= 80 {
        ScoreBand::Blue
    } else if score >= 70 {
        ScoreBand::Yellow
    } else {
        ScoreBand::Red
    }
}

pub fn selection_share(count: usize, total: usize) -> ShareBand {
    if total == 0 {
        return ShareBand::None;
    }

    let percentage = count as f64 / total as f64 * 100.0;
    if percentage >= 50.0 {
        ShareBand::Strong
    } else if percentage >= 25.0 {
        ShareBand::Moderate
    } else {
        ShareBand::Low
    }
}

pub fn display_record(response: &InterviewResponse) -> CandidateDisplayRecord {
    let score = round_score(response.analytics.overall_score);

    CandidateDisplayRecord {
        id: response.id,
        interview_id: response.interview_id,
        call_id: response.call_id.clone(),
        name: response.name.clone(),
        email: response.email.clone(),
        score,
        status: response.status,
        performance_rating: performance_rating(score),
        interview_date: response.created_at.date_naive(),
        skills: response.analytics.skills.clone(),
        duration: response.duration,
        tab_switch_count: response.tab_switch_count,
    }
}

pub fn display_records(responses: &[InterviewResponse]) -> Vec<CandidateDisplayRecord> {
    responses.iter().map(display_record).collect()
}

pub fn filter_candidates(
    candidates: &[CandidateDisplayRecord],
    filter: CandidateFilter,
) -> Vec<CandidateDisplayRecord> {
    let by_status = |status: CandidateStatus| {
        candidates
            .iter()
            .filter(|candidate| candidate.status == status)
            .cloned()
            .collect()
    };

    match filter {
        CandidateFilter::All => candidates.to_vec(),
        CandidateFilter::Top5 => top_by_score(candidates, 5),
        CandidateFilter::Top10 => top_by_score(candidates, 10),
        CandidateFilter::Selected => by_status(CandidateStatus::Selected),
        CandidateFilter::Potential => by_status(CandidateStatus::Potential),
        CandidateFilter::NotSelected => by_status(CandidateStatus::NotSelected),
        CandidateFilter::NoStatus => by_status(CandidateStatus::NoStatus),
    }
}

// sort_by is stable, so equal scores keep their incoming order.
fn top_by_score(candidates: &[CandidateDisplayRecord], limit: usize) -> Vec<CandidateDisplayRecord> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(limit);
    ranked
}

pub fn position_stats(candidates: &[CandidateDisplayRecord]) -> PositionStats {
    let mut counts = PositionAggregate::default();
    for candidate in candidates {
        tally(&mut counts, candidate.status);
    }

    let average_score = if candidates.is_empty() {
        0
    } else {
        let total: i64 = candidates.iter().map(|candidate| candidate.score).sum();
        round_score(total as f64 / candidates.len() as f64)
    };

    PositionStats {
        counts,
        average_score,
        top_performers: top_by_score(candidates, 5),
    }
}
