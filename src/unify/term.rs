//! Owned snapshot of a term with all bindings substituted.
//!
//! Terms can nest arbitrarily deep (a long chain of `s(s(...))` is a valid
//! answer), so printing, comparing, cloning and dropping all walk an explicit
//! stack instead of recursing.

use crate::symbol::{SymbolId, Value};
use std::fmt;
use std::mem;

/// A fully dereferenced term, produced by
/// [`Unifier::resolve`](super::Unifier::resolve).
pub enum Term {
    /// Unbound variable
    Var { id: SymbolId, name: Option<String> },
    Anonymous,
    Null,
    /// Symbol with no logical interpretation yet
    Undefined(SymbolId),
    Constant(Value),
    /// `[items... | tail]`; `tail` is [`Term::Null`] for proper lists
    List { items: Vec<Term>, tail: Box<Term> },
    Structure { functor: Box<Term>, args: Vec<Term> },
}

impl Term {
    /// String constant, the usual representation of an atom.
    pub fn atom(name: &str) -> Self {
        Term::Constant(Value::Str(name.to_string()))
    }

    pub fn int(n: i64) -> Self {
        Term::Constant(Value::Int(n))
    }

    pub fn is_ground(&self) -> bool {
        let mut pending = vec![self];
        while let Some(term) = pending.pop() {
            match term {
                Term::Var { .. } | Term::Undefined(_) => return false,
                Term::Anonymous | Term::Null | Term::Constant(_) => {}
                Term::List { items, tail } => {
                    pending.push(&**tail);
                    pending.extend(items);
                }
                Term::Structure { functor, args } => {
                    pending.push(&**functor);
                    pending.extend(args);
                }
            }
        }
        true
    }

    /// Copy of a term without children.
    fn clone_leaf(&self) -> Option<Term> {
        match self {
            Term::Var { id, name } => Some(Term::Var {
                id: *id,
                name: name.clone(),
            }),
            Term::Anonymous => Some(Term::Anonymous),
            Term::Null => Some(Term::Null),
            Term::Undefined(id) => Some(Term::Undefined(*id)),
            Term::Constant(v) => Some(Term::Constant(v.clone())),
            Term::List { .. } | Term::Structure { .. } => None,
        }
    }
}

enum CloneStep<'a> {
    Visit(&'a Term),
    List(usize),
    Structure(usize),
}

impl Clone for Term {
    fn clone(&self) -> Self {
        let mut steps = vec![CloneStep::Visit(self)];
        let mut built: Vec<Term> = Vec::new();

        while let Some(step) = steps.pop() {
            match step {
                CloneStep::Visit(term) => {
                    if let Some(leaf) = term.clone_leaf() {
                        built.push(leaf);
                        continue;
                    }
                    match term {
                        Term::List { items, tail } => {
                            steps.push(CloneStep::List(items.len()));
                            steps.push(CloneStep::Visit(&**tail));
                            steps.extend(items.iter().rev().map(CloneStep::Visit));
                        }
                        Term::Structure { functor, args } => {
                            steps.push(CloneStep::Structure(args.len()));
                            steps.extend(args.iter().rev().map(CloneStep::Visit));
                            steps.push(CloneStep::Visit(&**functor));
                        }
                        _ => {}
                    }
                }
                CloneStep::List(n) => {
                    let tail = built.pop().unwrap_or(Term::Null);
                    let items = built.split_off(built.len() - n);
                    built.push(Term::List {
                        items,
                        tail: Box::new(tail),
                    });
                }
                CloneStep::Structure(n) => {
                    let args = built.split_off(built.len() - n);
                    let functor = built.pop().unwrap_or(Term::Null);
                    built.push(Term::Structure {
                        functor: Box::new(functor),
                        args,
                    });
                }
            }
        }

        built.pop().unwrap_or(Term::Null)
    }
}

impl Drop for Term {
    fn drop(&mut self) {
        let mut orphans = Vec::new();
        take_children(self, &mut orphans);
        while let Some(mut term) = orphans.pop() {
            take_children(&mut term, &mut orphans);
        }
    }
}

/// Move the children of a compound term into `out`, leaving it shallow.
fn take_children(term: &mut Term, out: &mut Vec<Term>) {
    match term {
        Term::List { items, tail } => {
            out.append(items);
            out.push(mem::replace(&mut **tail, Term::Null));
        }
        Term::Structure { functor, args } => {
            out.append(args);
            out.push(mem::replace(&mut **functor, Term::Null));
        }
        _ => {}
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some(pair) = pending.pop() {
            match pair {
                (Term::Var { id: a, name: x }, Term::Var { id: b, name: y }) => {
                    if a != b || x != y {
                        return false;
                    }
                }
                (Term::Anonymous, Term::Anonymous) | (Term::Null, Term::Null) => {}
                (Term::Undefined(a), Term::Undefined(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (Term::Constant(a), Term::Constant(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (Term::List { items: xs, tail: xt }, Term::List { items: ys, tail: yt }) => {
                    if xs.len() != ys.len() {
                        return false;
                    }
                    pending.push((&**xt, &**yt));
                    pending.extend(xs.iter().zip(ys));
                }
                (
                    Term::Structure { functor: xf, args: xs },
                    Term::Structure { functor: yf, args: ys },
                ) => {
                    if xs.len() != ys.len() {
                        return false;
                    }
                    pending.push((&**xf, &**yf));
                    pending.extend(xs.iter().zip(ys));
                }
                _ => return false,
            }
        }
        true
    }
}

enum Piece<'a> {
    Term(&'a Term),
    Text(&'static str),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pieces = vec![Piece::Term(self)];
        while let Some(piece) = pieces.pop() {
            let term = match piece {
                Piece::Text(s) => {
                    f.write_str(s)?;
                    continue;
                }
                Piece::Term(term) => term,
            };
            match term {
                Term::Var { name: Some(name), .. } => write!(f, "{}", name)?,
                Term::Var { id, name: None } => write!(f, "_G{}", id.as_u32())?,
                Term::Anonymous => f.write_str("_")?,
                Term::Null => f.write_str("[]")?,
                Term::Undefined(id) => write!(f, "?{}", id.as_u32())?,
                Term::Constant(Value::Str(s)) if needs_quotes(s) => write!(f, "{:?}", s)?,
                Term::Constant(v) => write!(f, "{}", v)?,
                Term::List { items, tail } => {
                    pieces.push(Piece::Text("]"));
                    if !matches!(**tail, Term::Null) {
                        pieces.push(Piece::Term(&**tail));
                        pieces.push(Piece::Text(" | "));
                    }
                    push_separated(&mut pieces, items);
                    pieces.push(Piece::Text("["));
                }
                Term::Structure { functor, args } => {
                    pieces.push(Piece::Text(")"));
                    push_separated(&mut pieces, args);
                    pieces.push(Piece::Text("("));
                    pieces.push(Piece::Term(&**functor));
                }
            }
        }
        Ok(())
    }
}

/// Queue `terms` joined by `", "`, in reverse so they pop in order.
fn push_separated<'a>(pieces: &mut Vec<Piece<'a>>, terms: &'a [Term]) {
    for (i, term) in terms.iter().enumerate().rev() {
        pieces.push(Piece::Term(term));
        if i > 0 {
            pieces.push(Piece::Text(", "));
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Term({})", self)
    }
}

/// Strings that would not read back as a bare atom.
fn needs_quotes(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => !chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `s(s(...s(inner)...))`, `depth` levels deep.
    fn nest(depth: usize, inner: Term) -> Term {
        let mut term = inner;
        for _ in 0..depth {
            term = Term::Structure {
                functor: Box::new(Term::atom("s")),
                args: vec![term],
            };
        }
        term
    }

    #[test]
    fn test_display() {
        let list = Term::List {
            items: vec![Term::atom("a"), Term::int(2)],
            tail: Box::new(Term::Var { id: SymbolId::new(1200), name: Some("T".into()) }),
        };
        assert_eq!(list.to_string(), "[a, 2 | T]");

        let s = Term::Structure {
            functor: Box::new(Term::atom("likes")),
            args: vec![Term::atom("john"), Term::atom("Mary Ann")],
        };
        assert_eq!(s.to_string(), "likes(john, \"Mary Ann\")");

        let proper = Term::List { items: vec![Term::Null], tail: Box::new(Term::Null) };
        assert_eq!(proper.to_string(), "[[]]");
        assert_eq!(Term::Var { id: SymbolId::new(1500), name: None }.to_string(), "_G1500");
        assert_eq!(nest(2, Term::int(0)).to_string(), "s(s(0))");
    }

    #[test]
    fn test_is_ground() {
        assert!(Term::atom("a").is_ground());
        let open = Term::Structure {
            functor: Box::new(Term::atom("f")),
            args: vec![Term::Var { id: SymbolId::new(1100), name: None }],
        };
        assert!(!open.is_ground());
    }

    #[test]
    fn test_clone_and_eq() {
        let list = Term::List {
            items: vec![nest(3, Term::atom("a")), Term::Anonymous],
            tail: Box::new(Term::Var { id: SymbolId::new(1300), name: Some("T".into()) }),
        };
        let copy = list.clone();
        assert_eq!(copy, list);
        assert_eq!(copy.to_string(), "[s(s(s(a))), _ | T]");
        assert_ne!(nest(3, Term::atom("a")), nest(2, Term::atom("a")));
        assert_ne!(Term::int(1), Term::atom("1"));
    }

    #[test]
    fn test_deep_terms_do_not_recurse() {
        let depth = 200_000;
        let deep = nest(depth, Term::atom("a"));
        assert!(deep.is_ground());

        let text = deep.to_string();
        assert!(text.starts_with("s(s(s("));
        assert_eq!(text.len(), depth * 3 + 1);

        let copy = deep.clone();
        assert_eq!(copy, deep);
        drop(copy);
        drop(deep);
    }
}
