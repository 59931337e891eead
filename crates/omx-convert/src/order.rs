//! Table order reconciliation.
//!
//! Containers address tables by name; legacy files address them by position.
//! Each container table declares its legacy position in an attribute, and
//! [`reconcile_order`] turns those declarations into a complete `1..=N` map,
//! collecting every fault instead of stopping at the first.

use std::collections::BTreeMap;
use std::fmt;

use omx_store::MatrixStore;
use tracing::error;

/// One problem with the declared positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderFault {
    /// Table has no position attribute, or a non-positive one.
    MissingAttribute { table: String },
    /// Two tables declare the same position.
    DuplicatePosition {
        position: usize,
        first: String,
        second: String,
    },
    /// No table claims this position.
    MissingPosition { position: usize, tables: usize },
}

impl fmt::Display for OrderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttribute { table } => {
                write!(f, "table '{table}' has no valid position attribute")
            }
            Self::DuplicatePosition {
                position,
                first,
                second,
            } => write!(
                f,
                "tables '{first}' and '{second}' both declare position {position}"
            ),
            Self::MissingPosition { position, tables } => {
                write!(f, "no table declares position {position} of {tables}")
            }
        }
    }
}

/// Reconciliation failed; every fault found is listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingError {
    pub faults: Vec<OrderFault>,
}

impl fmt::Display for OrderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table positions are not a complete 1..N ordering")?;
        for fault in &self.faults {
            write!(f, "; {fault}")?;
        }
        Ok(())
    }
}

impl std::error::Error for OrderingError {}

/// A complete `1..=N` position to table-name map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOrder {
    by_position: BTreeMap<usize, String>,
}

impl TableOrder {
    /// Table name at 1-based `position`.
    pub fn name(&self, position: usize) -> Option<&str> {
        self.by_position.get(&position).map(String::as_str)
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    /// Whether the order is empty.
    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }

    /// `(position, name)` pairs in ascending position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.by_position.iter().map(|(p, n)| (*p, n.as_str()))
    }

    /// Owned table names in positional order.
    pub fn names_in_order(&self) -> Vec<String> {
        self.by_position.values().cloned().collect()
    }

    /// Reconcile the tables of an open store.
    pub fn from_store(store: &MatrixStore) -> Result<Self, OrderingError> {
        reconcile_order(
            store.table_count(),
            store
                .tables()
                .iter()
                .map(|t| (t.name.as_str(), t.position)),
        )
    }
}

/// Build a `1..=table_count` order from `(name, declared position)` pairs.
///
/// Missing or non-positive positions and duplicates are all collected; the
/// contiguity check only runs when none were found.
pub fn reconcile_order<'a, I>(table_count: usize, tables: I) -> Result<TableOrder, OrderingError>
where
    I: IntoIterator<Item = (&'a str, Option<i64>)>,
{
    let mut by_position: BTreeMap<usize, String> = BTreeMap::new();
    let mut faults = Vec::new();

    for (name, declared) in tables {
        let Some(position) = declared.filter(|p| *p >= 1).map(|p| p as usize) else {
            faults.push(OrderFault::MissingAttribute {
                table: name.to_string(),
            });
            continue;
        };
        if let Some(first) = by_position.get(&position) {
            faults.push(OrderFault::DuplicatePosition {
                position,
                first: first.clone(),
                second: name.to_string(),
            });
            continue;
        }
        by_position.insert(position, name.to_string());
    }

    if faults.is_empty() {
        faults.extend(
            (1..=table_count)
                .filter(|p| !by_position.contains_key(p))
                .map(|position| OrderFault::MissingPosition {
                    position,
                    tables: table_count,
                }),
        );
    }

    if !faults.is_empty() {
        for fault in &faults {
            error!("{fault}");
        }
        return Err(OrderingError { faults });
    }
    Ok(TableOrder { by_position })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_complete_order() {
        let order = reconcile_order(3, [("C", Some(3)), ("A", Some(1)), ("B", Some(2))]).unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(order.name(1), Some("A"));
        assert_eq!(order.name(3), Some("C"));
        assert_eq!(order.names_in_order(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_duplicate_position_names_both_tables() {
        let err = reconcile_order(3, [("SOV", Some(1)), ("HOV", Some(1)), ("AM", Some(3))])
            .unwrap_err();
        assert_eq!(
            err.faults,
            vec![OrderFault::DuplicatePosition {
                position: 1,
                first: "SOV".to_string(),
                second: "HOV".to_string(),
            }]
        );
    }

    #[test]
    fn test_gap_reports_missing_position() {
        let err = reconcile_order(3, [("A", Some(1)), ("C", Some(3))]).unwrap_err();
        assert_eq!(
            err.faults,
            vec![OrderFault::MissingPosition {
                position: 2,
                tables: 3
            }]
        );
        assert!(err.to_string().contains("position 2"));
    }

    #[test]
    fn test_position_beyond_count_leaves_gap() {
        let err = reconcile_order(2, [("A", Some(1)), ("B", Some(5))]).unwrap_err();
        assert_eq!(
            err.faults,
            vec![OrderFault::MissingPosition {
                position: 2,
                tables: 2
            }]
        );
    }

    #[test]
    fn test_all_attribute_faults_collected() {
        let err = reconcile_order(
            4,
            [
                ("A", None),
                ("B", Some(0)),
                ("C", Some(-4)),
                ("D", Some(2)),
            ],
        )
        .unwrap_err();
        assert_eq!(err.faults.len(), 3);
        assert!(
            err.faults
                .iter()
                .all(|f| matches!(f, OrderFault::MissingAttribute { .. }))
        );
    }

    #[test]
    fn test_contiguity_skipped_after_faults() {
        // Position 2 is also missing, but the attribute fault wins.
        let err = reconcile_order(3, [("A", Some(1)), ("B", None), ("C", Some(3))]).unwrap_err();
        assert_eq!(
            err.faults,
            vec![OrderFault::MissingAttribute {
                table: "B".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_set() {
        let order = reconcile_order(0, std::iter::empty()).unwrap();
        assert!(order.is_empty());
    }

    proptest! {
        #[test]
        fn permutation_always_reconciles(
            positions in Just((1..=12i64).collect::<Vec<_>>()).prop_shuffle()
        ) {
            let names: Vec<String> = positions.iter().map(|p| format!("T{p}")).collect();
            let order = reconcile_order(
                positions.len(),
                names.iter().map(String::as_str).zip(positions.iter().map(|p| Some(*p))),
            )
            .unwrap();
            for position in 1..=positions.len() {
                let expected = format!("T{position}");
                prop_assert_eq!(order.name(position), Some(expected.as_str()));
            }
        }
    }
}
