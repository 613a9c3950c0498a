//! Sample candidates shown in every new workspace. ATS scores are not computed.

use uuid::Uuid;

use super::models::{AtsScore, Candidate, CandidateStatus};
use crate::errors::AppError;

struct Fixture {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    score: u8,
    strengths: &'static [&'static str],
    gaps: &'static [&'static str],
    status: CandidateStatus,
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        name: "John Smith",
        email: "john.smith@email.com",
        phone: "+1-555-0123",
        score: 92,
        strengths: &["React", "Node.js", "AWS", "Leadership"],
        gaps: &["Python", "Machine Learning"],
        status: CandidateStatus::Qualified,
    },
    Fixture {
        name: "Sarah Johnson",
        email: "sarah.j@email.com",
        phone: "+1-555-0124",
        score: 88,
        strengths: &["JavaScript", "TypeScript", "React", "Database Design"],
        gaps: &["DevOps", "Microservices"],
        status: CandidateStatus::Qualified,
    },
    Fixture {
        name: "Mike Davis",
        email: "mike.davis@email.com",
        phone: "+1-555-0125",
        score: 65,
        strengths: &["HTML", "CSS", "Basic JavaScript"],
        gaps: &["React", "Backend Development", "Cloud Platforms"],
        status: CandidateStatus::Review,
    },
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fresh copies of the sample candidates, each with a new id.
pub fn sample_candidates() -> Result<Vec<Candidate>, AppError> {
    FIXTURES
        .iter()
        .map(|f| {
            Ok(Candidate {
                id: Uuid::new_v4(),
                name: f.name.to_string(),
                email: f.email.to_string(),
                phone: f.phone.to_string(),
                ats_score: AtsScore::new(f.score)?,
                strengths: to_strings(f.strengths),
                gaps: to_strings(f.gaps),
                status: f.status,
                shortlisted: false,
            })
        })
        .collect()
}
