use std::collections::BTreeMap;

use serde::Serialize;

/// One rubric bucket: its points are awarded only if every required test
/// name maps to `true` in the outcome map. A name absent from the map
/// counts as failed, not as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubricEntry {
    pub points: u32,
    pub requires: Vec<String>,
}

impl RubricEntry {
    pub fn new(points: u32, requires: &[&str]) -> Self {
        Self {
            points,
            requires: requires.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    fn is_satisfied(&self, outcomes: &BTreeMap<String, bool>) -> bool {
        self.requires
            .iter()
            .all(|name| outcomes.get(name).copied().unwrap_or(false))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeReport {
    pub achieved: u32,
    pub possible: u32,
    pub outcomes: BTreeMap<String, bool>,
}

/// Evaluates the rubric against an outcome map. `possible` is the full
/// rubric total regardless of outcomes; no partial credit within a bucket.
pub fn score(outcomes: &BTreeMap<String, bool>, rubric: &[RubricEntry]) -> GradeReport {
    let mut achieved = 0;
    let mut possible = 0;
    for entry in rubric {
        if entry.is_satisfied(outcomes) {
            achieved += entry.points;
        }
        possible += entry.points;
    }
    GradeReport {
        achieved,
        possible,
        outcomes: outcomes.clone(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::btreemap;

    fn entry(points: u32, requires: &[&str]) -> RubricEntry {
        RubricEntry::new(points, requires)
    }

    #[test]
    fn awards_bucket_only_on_unanimous_success() {
        let rubric = vec![entry(3, &["t1"]), entry(2, &["t1", "t2"])];
        let outcomes = btreemap! {
            "t1".to_owned() => true,
            "t2".to_owned() => false,
        };
        let report = score(&outcomes, &rubric);
        assert_eq!((report.achieved, report.possible), (3, 5));
    }

    #[test]
    fn flipping_one_name_removes_exactly_its_buckets() {
        let rubric = vec![entry(3, &["t1"]), entry(2, &["t2"])];
        let all_pass = btreemap! {
            "t1".to_owned() => true,
            "t2".to_owned() => true,
        };
        let t1_flipped = btreemap! {
            "t1".to_owned() => false,
            "t2".to_owned() => true,
        };
        assert_eq!(score(&all_pass, &rubric).achieved, 5);
        assert_eq!(score(&t1_flipped, &rubric).achieved, 2);
    }

    #[test]
    fn possible_is_invariant_under_outcomes() {
        let rubric = vec![entry(3, &["t1"]), entry(2, &["t2"]), entry(7, &["t3"])];
        let none = BTreeMap::new();
        let some = btreemap! { "t2".to_owned() => true };
        assert_eq!(score(&none, &rubric).possible, 12);
        assert_eq!(score(&some, &rubric).possible, 12);
    }

    #[test]
    fn absent_name_counts_as_failed() {
        let rubric = vec![entry(4, &["ghost"])];
        let report = score(&BTreeMap::new(), &rubric);
        assert_eq!((report.achieved, report.possible), (0, 4));
    }

    #[test]
    fn empty_requirement_list_awards_unconditionally() {
        let rubric = vec![entry(2, &[])];
        assert_eq!(score(&BTreeMap::new(), &rubric).achieved, 2);
    }

    #[test]
    fn rescoring_is_idempotent() {
        let rubric = vec![entry(3, &["t1"]), entry(2, &["t1", "t2"])];
        let outcomes = btreemap! {
            "t1".to_owned() => true,
            "t2".to_owned() => false,
        };
        assert_eq!(score(&outcomes, &rubric), score(&outcomes, &rubric));
    }
}
