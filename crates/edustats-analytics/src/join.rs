//! School-name resolution against the mapping relation.
//!
//! Left-join semantics throughout: the primary relation's row count is
//! preserved exactly, and an id with no mapping entry resolves to a
//! missing name rather than dropping the row or failing.

use edustats_domain::{columns, int, text, CellValue, Row};
use std::collections::HashMap;

/// Index the mapping relation by school id. Duplicate ids keep the
/// first occurrence in relation order, so a malformed mapping never
/// fans rows out.
#[must_use]
pub fn school_name_index(mapping: &[Row]) -> HashMap<i64, String> {
    let mut index = HashMap::with_capacity(mapping.len());
    for row in mapping {
        let Some(id) = int(row, columns::SCHOOL_ID) else {
            continue;
        };
        if let Some(name) = text(row, columns::FULL_NAME) {
            index.entry(id).or_insert_with(|| name.to_string());
        }
    }
    index
}

/// Attach the resolved `full_name` column to every row of the primary
/// relation. Unmatched ids yield a missing name.
pub fn attach_school_names(rows: &mut [Row], mapping: &[Row]) {
    let index = school_name_index(mapping);
    for row in rows.iter_mut() {
        let name = int(row, columns::SCHOOL_ID)
            .and_then(|id| index.get(&id))
            .map_or(CellValue::Missing, |n| CellValue::from(n.as_str()));
        row.insert(columns::FULL_NAME.to_string(), name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edustats_domain::row;

    fn mapping() -> Vec<Row> {
        vec![
            row([
                (columns::SCHOOL_ID, CellValue::from(1)),
                (columns::FULL_NAME, CellValue::from("National University")),
            ]),
            row([
                (columns::SCHOOL_ID, CellValue::from(2)),
                (columns::FULL_NAME, CellValue::from("Polytechnic A")),
            ]),
        ]
    }

    #[test]
    fn resolves_known_ids() {
        let mut rows = vec![row([(columns::SCHOOL_ID, CellValue::from(2))])];
        attach_school_names(&mut rows, &mapping());
        assert_eq!(text(&rows[0], columns::FULL_NAME), Some("Polytechnic A"));
    }

    #[test]
    fn unmatched_id_gets_missing_name_not_dropped() {
        let mut rows = vec![
            row([(columns::SCHOOL_ID, CellValue::from(1))]),
            row([(columns::SCHOOL_ID, CellValue::from(99))]),
        ];
        attach_school_names(&mut rows, &mapping());

        assert_eq!(rows.len(), 2);
        assert!(rows[1][columns::FULL_NAME].is_missing());
    }

    #[test]
    fn empty_mapping_preserves_row_count() {
        let mut rows = vec![row([(columns::SCHOOL_ID, CellValue::from(1))])];
        attach_school_names(&mut rows, &[]);
        assert_eq!(rows.len(), 1);
        assert!(rows[0][columns::FULL_NAME].is_missing());
    }

    #[test]
    fn duplicate_mapping_ids_keep_first_occurrence() {
        let mut dup = mapping();
        dup.push(row([
            (columns::SCHOOL_ID, CellValue::from(1)),
            (columns::FULL_NAME, CellValue::from("Shadow Entry")),
        ]));

        let mut rows = vec![row([(columns::SCHOOL_ID, CellValue::from(1))])];
        attach_school_names(&mut rows, &dup);

        assert_eq!(rows.len(), 1);
        assert_eq!(
            text(&rows[0], columns::FULL_NAME),
            Some("National University")
        );
    }
}
