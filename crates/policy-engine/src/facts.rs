//! Fact review: consistent/inconsistent classification and overview metrics
//!
//! A field is inconsistent when it is one of [`VOLATILE_FIELDS`] and more
//! than one document reports it. Values are not compared.

use shared_types::{
    Fact, FactIndex, FactMetrics, FactsOverview, FieldStatus, FieldView,
};

use crate::patterns::VOLATILE_FIELDS;

pub fn field_status(field_name: &str, facts: &[Fact]) -> FieldStatus {
    if VOLATILE_FIELDS.contains(&field_name) && facts.len() > 1 {
        FieldStatus::Inconsistent
    } else {
        FieldStatus::Consistent
    }
}

/// Split the index into (inconsistent, consistent), each in index order
pub fn categorize(facts: &FactIndex) -> (FactIndex, FactIndex) {
    let mut inconsistent = FactIndex::new();
    let mut consistent = FactIndex::new();

    for (field_name, entries) in facts {
        let target = match field_status(field_name, entries) {
            FieldStatus::Inconsistent => &mut inconsistent,
            FieldStatus::Consistent => &mut consistent,
        };
        target.insert(field_name.clone(), entries.clone());
    }

    (inconsistent, consistent)
}

pub fn metrics(facts: &FactIndex) -> FactMetrics {
    let total = facts.len();
    let inconsistent = facts
        .iter()
        .filter(|(name, entries)| field_status(name, entries) == FieldStatus::Inconsistent)
        .count();
    let consistent = total - inconsistent;

    let consistency_rate = if total == 0 {
        0.0
    } else {
        consistent as f64 / total as f64 * 100.0
    };

    FactMetrics {
        total,
        inconsistent,
        consistent,
        consistency_rate,
    }
}

/// "password_minimum_length" -> "Password Minimum Length"
///
/// Underscores become spaces. A letter is upper-cased when it follows any
/// non-letter (space, `-`, digit, ...) and lower-cased otherwise.
pub fn title_case(field_name: &str) -> String {
    let mut out = String::with_capacity(field_name.len());
    let mut after_letter = false;

    for c in field_name.chars() {
        if c == '_' {
            out.push(' ');
            after_letter = false;
        } else if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }

    out
}

/// Label for a field group.
///
/// Consistent groups use the first fact's name. Inconsistent groups use it
/// only when every fact agrees on the name. Either falls back to the
/// title-cased field name.
pub fn display_name(field_name: &str, facts: &[Fact]) -> String {
    let first = facts
        .first()
        .map(|f| f.fact_name.as_str())
        .filter(|name| !name.is_empty());

    let agreed = match field_status(field_name, facts) {
        FieldStatus::Consistent => first,
        FieldStatus::Inconsistent => {
            first.filter(|name| facts.iter().all(|f| f.fact_name == *name))
        }
    };

    agreed
        .map(str::to_string)
        .unwrap_or_else(|| title_case(field_name))
}

/// Everything the facts screen shows, computed from one index
pub fn overview(facts: &FactIndex) -> FactsOverview {
    let fields: Vec<FieldView> = facts
        .iter()
        .map(|(field_name, entries)| FieldView {
            field_name: field_name.clone(),
            display_name: display_name(field_name, entries),
            status: field_status(field_name, entries),
            facts: entries.clone(),
        })
        .collect();

    let names_with = |status: FieldStatus| {
        fields
            .iter()
            .filter(|f| f.status == status)
            .map(|f| f.field_name.clone())
            .collect::<Vec<_>>()
    };

    FactsOverview {
        metrics: metrics(facts),
        inconsistent_fields: names_with(FieldStatus::Inconsistent),
        consistent_fields: names_with(FieldStatus::Consistent),
        fields,
    }
}
