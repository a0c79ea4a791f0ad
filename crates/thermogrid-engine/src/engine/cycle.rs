//! Circular reference detection for computed columns.
//!
//! A computed column may read other computed columns. Columns are evaluated
//! in schema order, so a cycle can never loop forever, but it always reads
//! stale values and is rejected when the schema is built.

use std::collections::HashSet;

use crate::schema::ColumnDefinition;

/// Detect a reference cycle among computed columns.
/// Returns Some(cycle_path) if a cycle is found, None otherwise.
pub fn detect_cycle(columns: &[ColumnDefinition]) -> Option<Vec<String>> {
    for start in columns.iter().filter(|c| c.is_computed()) {
        let mut visiting = HashSet::new();
        let mut path = Vec::new();
        if detect_cycle_dfs(start.field(), columns, &mut visiting, &mut path) {
            return Some(path);
        }
    }
    None
}

fn detect_cycle_dfs(
    current: &str,
    columns: &[ColumnDefinition],
    visiting: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> bool {
    if visiting.contains(current) {
        path.push(current.to_string());
        return true;
    }

    let deps = match columns.iter().find(|c| c.field() == current) {
        Some(col) => col.references(),
        None => return false,
    };

    visiting.insert(current.to_string());
    path.push(current.to_string());

    for dep in deps {
        if detect_cycle_dfs(dep, columns, visiting, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(current);
    false
}
