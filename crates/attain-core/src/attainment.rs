use crate::model::{CoAttainment, PoAttainment, ScriptMarkRow};
use crate::rubric::Rubric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attainment {
    pub co: CoAttainment,
    pub po: PoAttainment,
}

#[derive(Default)]
struct CoTotals {
    awarded: f64,
    max: f64,
}

/// Folds one script's marks against the rubric into CO and PO attainment.
///
/// Marks whose question number is not in the rubric are ignored here. The
/// CO a mark counts towards is the rubric's, not the one read off the
/// script. Awarded marks above the maximum are kept as-is, so a CO can
/// exceed 100%.
pub fn aggregate(rubric: &Rubric, marks: &[ScriptMarkRow]) -> Attainment {
    if marks.is_empty() {
        return Attainment::default();
    }

    let totals = marks
        .iter()
        .filter_map(|m| rubric.row(&m.question_no).map(|r| (r, m.marks_awarded)))
        .fold(
            BTreeMap::<String, CoTotals>::new(),
            |mut acc, (row, awarded)| {
                let t = acc.entry(row.co.clone()).or_default();
                t.awarded += awarded;
                t.max += row.max_marks;
                acc
            },
        );

    let co: CoAttainment = totals
        .into_iter()
        .map(|(name, t)| {
            let pct = if t.max == 0.0 {
                0.0
            } else {
                round2(t.awarded / t.max * 100.0)
            };
            (name, pct)
        })
        .collect();

    let po = po_attainment(rubric, &co);

    Attainment { co, po }
}

/// Unweighted mean of each PO's related COs. A PO with no related CO is left
/// out; a related CO with nothing computed counts as 0.
pub fn po_attainment(rubric: &Rubric, co: &CoAttainment) -> PoAttainment {
    rubric
        .columns
        .po
        .iter()
        .filter_map(|po| {
            let related = rubric.cos_for_po(po);
            if related.is_empty() {
                return None;
            }
            let sum: f64 = related
                .iter()
                .map(|c| co.get(*c).copied().unwrap_or(0.0))
                .sum();
            Some((po.clone(), round2(sum / related.len() as f64)))
        })
        .collect()
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rubric(text: &str) -> Rubric {
        Rubric::load("rubric.csv", text.as_bytes()).unwrap()
    }

    #[test]
    fn two_cos_one_po() {
        let r = rubric("Q.No,CO,Max Marks,PO1\nQ1,CO1,10,1\nQ2,CO2,10,0\n");
        let marks = vec![
            ScriptMarkRow::new("Q1", "CO1", 8.0),
            ScriptMarkRow::new("Q2", "CO2", 5.0),
        ];
        let a = aggregate(&r, &marks);
        assert_eq!(a.co.get("CO1"), Some(&80.0));
        assert_eq!(a.co.get("CO2"), Some(&50.0));
        assert_eq!(a.po.len(), 1);
        assert_eq!(a.po.get("PO1"), Some(&80.0));
    }

    #[test]
    fn unknown_questions_contribute_nothing() {
        let r = rubric("Q.No,CO,Max Marks\n1,CO1,10\n");
        let marks = vec![
            ScriptMarkRow::new("1", "CO1", 5.0),
            ScriptMarkRow::new("99", "CO1", 10.0),
        ];
        let a = aggregate(&r, &marks);
        assert_eq!(a.co.get("CO1"), Some(&50.0));
    }

    #[test]
    fn rubric_co_wins_over_script_co() {
        let r = rubric("Q.No,CO,Max Marks\n1,CO1,4\n");
        let a = aggregate(&r, &[ScriptMarkRow::new("1", "CO7", 3.0)]);
        assert_eq!(a.co.get("CO1"), Some(&75.0));
        assert!(!a.co.contains_key("CO7"));
    }

    #[test]
    fn zero_max_yields_zero_percent() {
        let r = rubric("Q.No,CO,Max Marks\n1,CO1,0\n");
        let a = aggregate(&r, &[ScriptMarkRow::new("1", "CO1", 3.0)]);
        assert_eq!(a.co.get("CO1"), Some(&0.0));
    }

    #[test]
    fn over_max_is_not_clamped() {
        let r = rubric("Q.No,CO,Max Marks\n1,CO1,10\n");
        let a = aggregate(&r, &[ScriptMarkRow::new("1", "CO1", 12.0)]);
        assert_eq!(a.co.get("CO1"), Some(&120.0));
    }

    #[test]
    fn empty_marks_yield_empty_attainment() {
        let r = rubric("Q.No,CO,Max Marks,PO1\n1,CO1,10,1\n");
        assert_eq!(aggregate(&r, &[]), Attainment::default());
    }

    #[test]
    fn po_without_related_co_is_absent() {
        let r = rubric("Q.No,CO,Max Marks,PO1,PO2\n1,CO1,10,1,0\n");
        let a = aggregate(&r, &[ScriptMarkRow::new("1", "CO1", 7.0)]);
        assert_eq!(a.po.get("PO1"), Some(&70.0));
        assert!(!a.po.contains_key("PO2"));
    }

    #[test]
    fn po_counts_unanswered_co_as_zero() {
        let r = rubric("Q.No,CO,Max Marks,PO1\n1,CO1,10,1\n2,CO2,10,1\n");
        let a = aggregate(&r, &[ScriptMarkRow::new("1", "CO1", 9.0)]);
        assert_eq!(a.co.len(), 1);
        assert_eq!(a.po.get("PO1"), Some(&45.0));
    }

    #[test]
    fn percentages_round_to_two_decimals() {
        let r = rubric("Q.No,CO,Max Marks,PO1\n1,CO1,3,1\n2,CO2,3,1\n3,CO2,3,0\n");
        let marks = vec![
            ScriptMarkRow::new("1", "", 1.0),
            ScriptMarkRow::new("2", "", 1.0),
            ScriptMarkRow::new("3", "", 1.0),
        ];
        let a = aggregate(&r, &marks);
        assert_eq!(a.co.get("CO1"), Some(&33.33));
        assert_eq!(a.co.get("CO2"), Some(&33.33));
        assert_eq!(a.po.get("PO1"), Some(&33.33));
    }

    #[test]
    fn aggregation_is_independent_per_call() {
        let r = rubric("Q.No,CO,Max Marks\n1,CO1,10\n");
        let first = aggregate(&r, &[ScriptMarkRow::new("1", "CO1", 10.0)]);
        let second = aggregate(&r, &[ScriptMarkRow::new("1", "CO1", 2.0)]);
        assert_eq!(first.co.get("CO1"), Some(&100.0));
        assert_eq!(second.co.get("CO1"), Some(&20.0));
    }
}
