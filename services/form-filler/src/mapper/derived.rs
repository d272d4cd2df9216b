//! Composite rules: choice groups with per-option flags, split dates,
//! two-digit years and mirrored totals.

use tracing::debug;

use complymate_models::{FactDictionary, ResolutionSource, ResolvedAssignment};
use complymate_utils::{parse_month_day, two_digit_year};

use crate::catalog::{ChoiceRule, DateRule, FormMapping, TotalRule, YearRule};
use crate::field_index::FieldIndex;

pub fn apply(mapping: &FormMapping, facts: &FactDictionary, index: &FieldIndex, assignment: &mut ResolvedAssignment) {
    let mut writer = RuleWriter { index, assignment };

    for rule in &mapping.choices {
        writer.choice(rule, facts);
    }
    for rule in &mapping.dates {
        writer.date(rule, facts);
    }
    for rule in &mapping.years {
        writer.year(rule, facts);
    }
    for rule in &mapping.totals {
        writer.total(rule, facts);
    }
}

/// Lower-case, trimmed, with spaces and hyphens turned into underscores
pub fn normalize_choice(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split(|c: char| c == ' ' || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

struct RuleWriter<'a> {
    index: &'a FieldIndex,
    assignment: &'a mut ResolvedAssignment,
}

impl RuleWriter<'_> {
    /// Assign only identifiers the template actually has
    fn put(&mut self, identifier: &str, value: &str, fact: &str) -> bool {
        if !self.index.contains(identifier) {
            debug!(field = %identifier, fact = %fact, "Rule target not in template");
            return false;
        }
        self.assignment.assign(identifier, value, ResolutionSource::Derived, fact)
    }

    fn choice(&mut self, rule: &ChoiceRule, facts: &FactDictionary) {
        let Some(raw) = facts.rendered(&rule.fact) else {
            return;
        };

        let wanted = normalize_choice(&raw);
        let Some(selected) = rule
            .options
            .iter()
            .find(|option| normalize_choice(&option.value) == wanted || normalize_choice(&option.export) == wanted)
        else {
            debug!(fact = %rule.fact, value = %raw, "Value matches no option");
            return;
        };

        self.put(&rule.group, &selected.export, &rule.fact);
        for option in &rule.options {
            if let Some(total) = &option.total {
                let flag = if option.value == selected.value { "1" } else { "0" };
                self.put(total, flag, &rule.fact);
            }
        }
    }

    fn date(&mut self, rule: &DateRule, facts: &FactDictionary) {
        let Some(raw) = facts.rendered(&rule.fact) else {
            return;
        };

        match parse_month_day(&raw) {
            Some((month, day)) => {
                self.put(&rule.month, &month, &rule.fact);
                self.put(&rule.day, &day, &rule.fact);
            }
            None => debug!(fact = %rule.fact, value = %raw, "Unparseable date dropped"),
        }
    }

    fn year(&mut self, rule: &YearRule, facts: &FactDictionary) {
        let Some(raw) = facts.rendered(&rule.fact) else {
            return;
        };

        match two_digit_year(&raw) {
            Some(year) => {
                self.put(&rule.field, &year, &rule.fact);
            }
            None => debug!(fact = %rule.fact, value = %raw, "Not a four digit year"),
        }
    }

    fn total(&mut self, rule: &TotalRule, facts: &FactDictionary) {
        let Some(raw) = facts.rendered(&rule.fact) else {
            return;
        };

        if raw.parse::<f64>().is_ok_and(f64::is_finite) {
            self.put(&rule.field, &raw, &rule.fact);
        } else {
            debug!(fact = %rule.fact, value = %raw, "Non-numeric total skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FormCatalog;
    use crate::field_index::{ChoiceMember, FieldDescriptor};
    use complymate_models::FormType;

    const TOTALS: [&str; 4] = [
        "Death Total",
        "Days away from work Total",
        "Job transfer or restriction Total",
        "Other recordable cases Total",
    ];

    fn log_index() -> FieldIndex {
        let exports = ["Death", "Days away from work", "Job transfer or restriction", "Other recordable cases"];
        let members = exports
            .iter()
            .enumerate()
            .map(|(position, export)| ChoiceMember {
                export_value: export.to_string(),
                widget: (20 + position as u32, 0),
                selected: false,
            })
            .collect();

        let mut descriptors = vec![FieldDescriptor::choice_group("Group1", (19, 0), members)];
        for (position, total) in TOTALS.iter().enumerate() {
            descriptors.push(FieldDescriptor::text(*total, (30 + position as u32, 0)));
        }
        descriptors.push(FieldDescriptor::text("Date of injury or Illness month 1", (40, 0)));
        descriptors.push(FieldDescriptor::text("Date of injury or illness day 1", (41, 0)));
        descriptors.push(FieldDescriptor::text("Number of days injured or ill away from work Total", (42, 0)));
        FieldIndex::from_descriptors(descriptors)
    }

    fn resolve(facts: &FactDictionary) -> ResolvedAssignment {
        let catalog = FormCatalog::builtin().unwrap();
        let mut assignment = ResolvedAssignment::new();
        apply(catalog.mapping(FormType::Log300).unwrap(), facts, &log_index(), &mut assignment);
        assignment
    }

    #[test]
    fn test_normalize_choice() {
        assert_eq!(normalize_choice("  Days away "), "days_away");
        assert_eq!(normalize_choice("Job-Transfer"), "job_transfer");
        assert_eq!(normalize_choice("Other recordable cases"), "other_recordable_cases");
    }

    #[test]
    fn test_classification_sets_group_and_exclusive_totals() {
        let assignment = resolve(&FactDictionary::new().with("classification", "days_away"));

        assert_eq!(assignment.value("Group1"), Some("Days away from work"));
        let flags: Vec<&str> = TOTALS.iter().map(|total| assignment.value(total).unwrap()).collect();
        assert_eq!(flags, vec!["0", "1", "0", "0"]);
    }

    #[test]
    fn test_classification_accepts_export_spelling() {
        let assignment = resolve(&FactDictionary::new().with("classification", "Job transfer or restriction"));
        assert_eq!(assignment.value("Group1"), Some("Job transfer or restriction"));
        assert_eq!(assignment.value("Job transfer or restriction Total"), Some("1"));
    }

    #[test]
    fn test_unknown_classification_assigns_nothing() {
        let assignment = resolve(&FactDictionary::new().with("classification", "sprained"));
        assert!(assignment.is_empty());
    }

    #[test]
    fn test_date_splits_into_month_and_day() {
        let assignment = resolve(&FactDictionary::new().with("date_of_injury", "3/7/2024"));

        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.value("Date of injury or Illness month 1"), Some("03"));
        assert_eq!(assignment.value("Date of injury or illness day 1"), Some("07"));
    }

    #[test]
    fn test_unparseable_date_is_dropped() {
        let assignment = resolve(&FactDictionary::new().with("date_of_injury", "last tuesday"));
        assert!(assignment.is_empty());
    }

    #[test]
    fn test_totals_mirror_numeric_facts_only() {
        let assignment = resolve(&FactDictionary::new().with("days_away_from_work", 12i64));
        assert_eq!(assignment.value("Number of days injured or ill away from work Total"), Some("12"));

        for raw in ["twelve", "NaN", "inf", "-infinity"] {
            let assignment = resolve(&FactDictionary::new().with("days_away_from_work", raw));
            assert!(assignment.is_empty(), "{}", raw);
        }
    }

    #[test]
    fn test_missing_targets_are_skipped() {
        // the injury-type group and its totals are not part of this index
        let assignment = resolve(&FactDictionary::new().with("type_of_injury_or_illness", "hearing loss"));
        assert!(assignment.is_empty());
    }

    #[test]
    fn test_injury_type_writes_misspelled_hearing_loss_total() {
        let totals = [
            "Injury Total",
            "SkinDisorder Total",
            "RespiratoryCond Total",
            "Poisoning Total",
            "Hearling Loss Total",
            "Allother Total",
        ];
        let exports = ["Injury", "Skin Disorder", "Respiratory Cond", "Poisoning", "Hearing Loss", "All other"];
        let members = exports
            .iter()
            .enumerate()
            .map(|(position, export)| ChoiceMember {
                export_value: export.to_string(),
                widget: (50 + position as u32, 0),
                selected: false,
            })
            .collect();
        let mut descriptors = vec![FieldDescriptor::choice_group("Group1a", (49, 0), members)];
        for (position, total) in totals.iter().enumerate() {
            descriptors.push(FieldDescriptor::text(*total, (60 + position as u32, 0)));
        }
        let index = FieldIndex::from_descriptors(descriptors);

        let catalog = FormCatalog::builtin().unwrap();
        let facts = FactDictionary::new().with("type_of_injury_or_illness", "hearing_loss");
        let mut assignment = ResolvedAssignment::new();
        apply(catalog.mapping(FormType::Log300).unwrap(), &facts, &index, &mut assignment);

        assert_eq!(assignment.value("Group1a"), Some("Hearing Loss"));
        let flags: Vec<&str> = totals.iter().map(|total| assignment.value(total).unwrap()).collect();
        assert_eq!(flags, vec!["0", "0", "0", "0", "1", "0"]);
    }

    #[test]
    fn test_year_keeps_last_two_digits() {
        let index = FieldIndex::from_descriptors(vec![FieldDescriptor::text("Summary of Injury/Illness Year", (70, 0))]);
        let catalog = FormCatalog::builtin().unwrap();
        let mapping = catalog.mapping(FormType::Summary300A).unwrap();

        let mut assignment = ResolvedAssignment::new();
        apply(mapping, &FactDictionary::new().with("year", "2024"), &index, &mut assignment);
        assert_eq!(assignment.value("Summary of Injury/Illness Year"), Some("24"));

        let mut assignment = ResolvedAssignment::new();
        apply(mapping, &FactDictionary::new().with("year", "24"), &index, &mut assignment);
        assert!(assignment.is_empty());
    }
}
