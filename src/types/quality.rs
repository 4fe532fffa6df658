//! Quality score model produced by the scorer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Rubric criteria in declaration order (used for tie-breaking)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    Overview,
    Installation,
    Examples,
    ApiDocs,
    Structure,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Overview,
        Criterion::Installation,
        Criterion::Examples,
        Criterion::ApiDocs,
        Criterion::Structure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Overview => "overview",
            Criterion::Installation => "installation",
            Criterion::Examples => "examples",
            Criterion::ApiDocs => "apiDocs",
            Criterion::Structure => "structure",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionStatus {
    Complete,
    Partial,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    pub points_earned: u32,
    pub points_max: u32,
    pub status: CriterionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CriterionScore {
    /// Earned share of max points, in percent
    pub fn percent(&self) -> u32 {
        if self.points_max == 0 {
            100
        } else {
            self.points_earned * 100 / self.points_max
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySummary {
    pub strengths: Vec<Criterion>,
    pub improvements: Vec<Criterion>,
    pub top_suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    pub score: u32,
    pub grade: Grade,
    pub breakdown: BTreeMap<Criterion, CriterionScore>,
    pub summary: QualitySummary,
}

impl QualityScore {
    pub fn criterion(&self, criterion: Criterion) -> Option<&CriterionScore> {
        self.breakdown.get(&criterion)
    }

    pub fn earned_total(&self) -> u32 {
        self.breakdown.values().map(|c| c.points_earned).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(90), Grade::A);
        assert_eq!(Grade::from_score(89), Grade::B);
        assert_eq!(Grade::from_score(80), Grade::B);
        assert_eq!(Grade::from_score(79), Grade::C);
        assert_eq!(Grade::from_score(70), Grade::C);
        assert_eq!(Grade::from_score(60), Grade::D);
        assert_eq!(Grade::from_score(59), Grade::F);
        assert_eq!(Grade::from_score(0), Grade::F);
    }

    #[test]
    fn test_breakdown_serializes_as_named_map() {
        let mut breakdown = BTreeMap::new();
        breakdown.insert(
            Criterion::ApiDocs,
            CriterionScore {
                points_earned: 25,
                points_max: 25,
                status: CriterionStatus::Complete,
                suggestion: None,
            },
        );
        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json["apiDocs"]["pointsEarned"], 25);
        assert_eq!(json["apiDocs"]["status"], "complete");
        assert!(json["apiDocs"].get("suggestion").is_none());
    }
}
