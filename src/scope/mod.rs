//! The scope & dependency checker (spec.md §4.C).
//!
//! Runs between parsing and elaboration over the whole program at once:
//! duplicate names, unbound identifiers, self-references and cycles are all
//! detected here, so that the elaborator and type checker downstream never
//! have to deal with a name that doesn't resolve.

pub mod errors;

use std::collections::{HashMap, HashSet};

use log::trace;

pub use errors::{CtxError, DepKind, Edge};

use crate::pos::Range;
use crate::syntax::concrete::{Binder, Decl, LocalElem, PTerm, Program};

/// Check that `program` is well-scoped: every global name is unique, every
/// declaration's local parameter names are unique, every referenced name
/// resolves to something already in scope, and the global use/definition
/// graph is acyclic.
pub fn check_scope(program: &Program) -> Result<(), CtxError> {
    check_unique_globals(program)?;

    let global_names: HashSet<&str> = program.decls().iter().map(|d| d.name.as_str()).collect();

    let mut edges: Vec<Edge> = Vec::new();

    for decl in program.decls() {
        check_unique_locals(decl)?;

        let own_params: HashSet<String> = decl
            .flatten_locals()
            .iter()
            .map(|l| l.name().to_string())
            .collect();

        let type_deps = free_vars(&decl.ty, &own_params);
        for (name, range) in type_deps {
            edges.push(validate_global_dep(decl, name, range, DepKind::Type, &global_names)?);
        }
        if let Some(def) = &decl.def {
            let def_deps = free_vars(def, &own_params);
            for (name, range) in def_deps {
                edges.push(validate_global_dep(decl, name, range, DepKind::Def, &global_names)?);
            }
        }

        let locals = decl.flatten_locals();
        let mut seen: HashSet<String> = HashSet::new();
        for local in &locals {
            for (name, range, kind) in local_deps(local) {
                if name == local.name() {
                    return Err(CtxError::SelfReference {
                        name: name.to_string(),
                        kind,
                        range,
                    });
                }
                if seen.contains(name) {
                    edges.push(Edge {
                        from: local_node(&decl.name, local.name()),
                        to: local_node(&decl.name, name),
                        kind,
                        range,
                    });
                } else if global_names.contains(name) {
                    edges.push(Edge {
                        from: local_node(&decl.name, local.name()),
                        to: global_node(name),
                        kind,
                        range,
                    });
                } else {
                    return Err(CtxError::Undefined {
                        name: name.to_string(),
                        enclosing: local.name().to_string(),
                        kind,
                        range,
                    });
                }
            }
            seen.insert(local.name().to_string());
        }
    }

    trace!("scope graph has {} edges", edges.len());
    detect_cycle(&edges)
}

fn global_node(name: &str) -> String {
    format!("global:{}", name)
}

fn local_node(owner: &str, name: &str) -> String {
    format!("local:{}:{}", owner, name)
}

fn validate_global_dep<'a>(
    decl: &Decl,
    name: &'a str,
    range: Range,
    kind: DepKind,
    global_names: &HashSet<&str>,
) -> Result<Edge, CtxError> {
    if name == decl.name {
        return Err(CtxError::SelfReference {
            name: name.to_string(),
            kind,
            range,
        });
    }
    if !global_names.contains(name) {
        return Err(CtxError::Undefined {
            name: name.to_string(),
            enclosing: decl.name.clone(),
            kind,
            range,
        });
    }
    Ok(Edge {
        from: global_node(&decl.name),
        to: global_node(name),
        kind,
        range,
    })
}

fn check_unique_globals(program: &Program) -> Result<(), CtxError> {
    let mut seen: HashMap<&str, Range> = HashMap::new();
    for decl in program.decls() {
        if seen.contains_key(decl.name.as_str()) {
            return Err(CtxError::DuplicateGlobal {
                name: decl.name.clone(),
                range: decl.name_range,
            });
        }
        seen.insert(&decl.name, decl.name_range);
    }
    Ok(())
}

fn check_unique_locals(decl: &Decl) -> Result<(), CtxError> {
    let mut seen: HashSet<String> = HashSet::new();
    for local in decl.flatten_locals() {
        if seen.contains(local.name()) {
            return Err(CtxError::DuplicateLocal {
                name: local.name().to_string(),
                range: local.range(),
            });
        }
        seen.insert(local.name().to_string());
    }
    Ok(())
}

/// Dependencies of one local parameter element: its type (for a `Var`
/// binder) or its type-and-definition (for a `Def` binder).
fn local_deps(local: &LocalElem) -> Vec<(&str, Range, DepKind)> {
    match local {
        LocalElem::Var { ty, .. } => free_vars(ty, &HashSet::new())
            .into_iter()
            .map(|(n, r)| (n, r, DepKind::Type))
            .collect(),
        LocalElem::Def { ty, def, .. } => {
            let mut out: Vec<(&str, Range, DepKind)> = Vec::new();
            if let Some(ty) = ty {
                out.extend(
                    free_vars(ty, &HashSet::new())
                        .into_iter()
                        .map(|(n, r)| (n, r, DepKind::Type)),
                );
            }
            out.extend(
                free_vars(def, &HashSet::new())
                    .into_iter()
                    .map(|(n, r)| (n, r, DepKind::Def)),
            );
            out
        }
    }
}

/// Free surface-level variable occurrences of `t`, skipping anything bound
/// within `t` itself, not counting `already_bound` as free.
fn free_vars<'a>(t: &'a PTerm, already_bound: &HashSet<String>) -> Vec<(&'a str, Range)> {
    let mut out = Vec::new();
    free_vars_rec(t, already_bound, &mut out);
    out
}

fn free_vars_rec<'a>(t: &'a PTerm, bound: &HashSet<String>, out: &mut Vec<(&'a str, Range)>) {
    match t {
        PTerm::Sort { .. } => {}
        PTerm::Variable { name, range } => {
            if !bound.contains(name) {
                out.push((name, *range));
            }
        }
        PTerm::Lambda { binders, body, .. }
        | PTerm::Pi { binders, body, .. }
        | PTerm::Sigma { binders, body, .. } => {
            let mut bound = bound.clone();
            for binder in binders {
                bind_binder(binder, &mut bound, out);
            }
            free_vars_rec(body, &bound, out);
        }
        PTerm::Arrow { input, output, .. } => {
            free_vars_rec(input, bound, out);
            free_vars_rec(output, bound, out);
        }
        PTerm::Pair {
            first, second, ty, ..
        } => {
            free_vars_rec(first, bound, out);
            free_vars_rec(second, bound, out);
            if let Some(ty) = ty {
                free_vars_rec(ty, bound, out);
            }
        }
        PTerm::First { term, .. } | PTerm::Second { term, .. } => free_vars_rec(term, bound, out),
        PTerm::Prod { first, second, .. } => {
            free_vars_rec(first, bound, out);
            free_vars_rec(second, bound, out);
        }
        PTerm::Let {
            name,
            params,
            ty,
            def,
            body,
            ..
        } => {
            let mut bound = bound.clone();
            for binder in params {
                bind_binder(binder, &mut bound, out);
            }
            if let Some(ty) = ty {
                free_vars_rec(ty, &bound, out);
            }
            free_vars_rec(def, &bound, out);
            bound.insert(name.clone());
            free_vars_rec(body, &bound, out);
        }
        PTerm::Apply { terms, .. } => {
            for term in terms {
                free_vars_rec(term, bound, out);
            }
        }
    }
}

fn bind_binder<'a>(binder: &'a Binder, bound: &mut HashSet<String>, out: &mut Vec<(&'a str, Range)>) {
    match binder {
        Binder::Var { names, ty, .. } => {
            free_vars_rec(ty, bound, out);
            for (name, _) in names {
                bound.insert(name.clone());
            }
        }
        Binder::Def { name, ty, def, .. } => {
            if let Some(ty) = ty {
                free_vars_rec(ty, bound, out);
            }
            free_vars_rec(def, bound, out);
            bound.insert(name.clone());
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    OnStack,
    Done,
}

/// Three-color DFS cycle detection over the use/definition graph (spec.md
/// §4.C step 4). Forward references between globals are fine (that's what
/// makes the graph need a real cycle check rather than a topological-order
/// check); the only thing that's illegal is an actual cycle.
fn detect_cycle(edges: &[Edge]) -> Result<(), CtxError> {
    let mut adjacency: HashMap<&str, Vec<&Edge>> = HashMap::new();
    let mut nodes: HashSet<&str> = HashSet::new();
    for edge in edges {
        nodes.insert(edge.from.as_str());
        nodes.insert(edge.to.as_str());
        adjacency.entry(edge.from.as_str()).or_default().push(edge);
    }

    let mut color: HashMap<&str, Color> = nodes.iter().map(|&n| (n, Color::Unvisited)).collect();
    let mut stack: Vec<&Edge> = Vec::new();

    let mut sorted_nodes: Vec<&str> = nodes.into_iter().collect();
    sorted_nodes.sort_unstable();

    for start in sorted_nodes {
        if color[start] == Color::Unvisited {
            visit(start, &adjacency, &mut color, &mut stack)?;
        }
    }
    Ok(())
}

fn visit<'a>(
    node: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a Edge>>,
    color: &mut HashMap<&'a str, Color>,
    stack: &mut Vec<&'a Edge>,
) -> Result<(), CtxError> {
    color.insert(node, Color::OnStack);

    if let Some(out_edges) = adjacency.get(node) {
        for edge in out_edges {
            let target = edge.to.as_str();
            match color.get(target).copied().unwrap_or(Color::Unvisited) {
                Color::Unvisited => {
                    stack.push(edge);
                    visit(target, adjacency, color, stack)?;
                    stack.pop();
                }
                Color::OnStack => {
                    let mut path: Vec<Edge> = stack
                        .iter()
                        .skip_while(|e| e.from != target)
                        .map(|&e| e.clone())
                        .collect();
                    let range = edge.range;
                    path.push((*edge).clone());
                    return Err(CtxError::Cycle { path, range });
                }
                Color::Done => {}
            }
        }
    }

    color.insert(node, Color::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse::parse_program;

    fn scope_check(src: &str) -> Result<(), CtxError> {
        let (program, _) = parse_program(src).unwrap();
        check_scope(&program)
    }

    #[test]
    fn simple_program_is_well_scoped() {
        assert!(scope_check("def id (A : Prop) (x : A) : A := x;").is_ok());
    }

    #[test]
    fn forward_reference_between_globals_is_allowed() {
        assert!(scope_check("def a : Prop := b; def b : Prop := Prop;").is_ok());
    }

    #[test]
    fn duplicate_global_is_rejected() {
        let err = scope_check("def a : Prop := Prop; def a : Prop := Prop;").unwrap_err();
        assert!(matches!(err, CtxError::DuplicateGlobal { .. }));
    }

    #[test]
    fn duplicate_local_is_rejected() {
        let err = scope_check("def f (x : Prop) (x : Prop) : Prop := x;").unwrap_err();
        assert!(matches!(err, CtxError::DuplicateLocal { .. }));
    }

    #[test]
    fn undefined_global_is_rejected() {
        let err = scope_check("def a : Prop := undefined_name;").unwrap_err();
        assert!(matches!(err, CtxError::Undefined { .. }));
    }

    #[test]
    fn forward_reference_within_locals_is_rejected() {
        // `y`'s type mentions `x`, which comes later in the parameter list.
        let err = scope_check("def f (y : x) (x : Prop) : Prop := Prop;").unwrap_err();
        assert!(matches!(err, CtxError::Undefined { .. }));
    }

    #[test]
    fn self_reference_is_rejected() {
        let err = scope_check("def a : Prop := a;").unwrap_err();
        assert!(matches!(err, CtxError::SelfReference { .. }));
    }

    #[test]
    fn cycle_between_globals_is_rejected() {
        let err = scope_check("def a : Prop := b; def b : Prop := a;").unwrap_err();
        assert!(matches!(err, CtxError::Cycle { .. }));
    }
}
