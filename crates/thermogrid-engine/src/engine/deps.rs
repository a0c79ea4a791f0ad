//! Dependency extraction from compiled formulas.
//!
//! Walks a formula's expression tree to find every field it reads. The
//! result feeds cycle detection when computed columns are defined or
//! reordered.

use super::formula::Expr;

/// Append the distinct field references of `expr` to `out`, in order of first use.
fn collect_references(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Field(name) => {
            if !out.iter().any(|f| f == name) {
                out.push(name.clone());
            }
        }
        Expr::Neg(inner) => collect_references(inner, out),
        Expr::Binary(_, lhs, rhs) => {
            collect_references(lhs, out);
            collect_references(rhs, out);
        }
        Expr::Call(_, args) => {
            for arg in args {
                collect_references(arg, out);
            }
        }
    }
}

/// Distinct field references of `expr`.
pub fn extract_dependencies(expr: &Expr) -> Vec<String> {
    let mut deps = Vec::new();
    collect_references(expr, &mut deps);
    deps
}
