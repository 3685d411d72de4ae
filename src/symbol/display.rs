//! One-line diagnostic rendering of a symbol record.
//!
//! Children of lists and structures are shown by name only, and bound
//! variables show the next link of their chain, so rendering never recurses.

use super::{LogicalKind, Payload, SymbolId, SymbolTable};
use std::fmt;

/// `[name | ID:n | Kind | State | Semantic | value]`
pub struct SymbolInfo<'a> {
    table: &'a SymbolTable,
    id: SymbolId,
}

impl SymbolTable {
    /// Diagnostic view of a symbol, for logs and the REPL.
    pub fn info(&self, id: SymbolId) -> SymbolInfo<'_> {
        SymbolInfo { table: self, id }
    }

    fn short_name(&self, id: SymbolId) -> String {
        match self.get(id) {
            Some(sym) => sym.display_name(),
            None => format!("?{}", id.as_u32()),
        }
    }
}

impl fmt::Display for SymbolInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(sym) = self.table.get(self.id) else {
            return write!(f, "[unknown | ID:{}]", self.id.as_u32());
        };

        let value = match &sym.value {
            Payload::Constant(v) => v.to_string(),
            Payload::List(pair) => format!(
                "[{}|{}]",
                self.table.short_name(pair.head),
                self.table.short_name(pair.tail)
            ),
            Payload::Structure(term) => {
                let args: Vec<String> = term.args.iter().map(|&a| self.table.short_name(a)).collect();
                format!("{}({})", self.table.short_name(term.functor), args.join(", "))
            }
            Payload::None => match (sym.logical_kind, sym.binding) {
                (LogicalKind::Variable, Some(target)) => format!("-> {}", self.table.short_name(target)),
                _ => "<nil>".to_string(),
            },
        };

        write!(
            f,
            "[{} | ID:{} | {} | {} | {} | {}]",
            sym.display_name(),
            sym.id.as_u32(),
            sym.logical_kind,
            sym.state,
            sym.semantic_kind,
            value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_constant_and_structure() {
        let mut table = SymbolTable::new();
        let john = table.new_constant("john", "john");
        let x = table.new_variable("X");
        let likes = table.new_constant("likes", "likes");
        let s = table.new_structure(likes, vec![john, x]);

        let text = table.info(john).to_string();
        assert_eq!(
            text,
            format!("[john | ID:{} | Constant | Embodied | Literal | john]", john.as_u32())
        );
        let text = table.info(s).to_string();
        assert!(text.ends_with("| Structure | Embodied | Predicate | likes(john, X)]"));
    }

    #[test]
    fn test_render_unnamed_list_and_bound_variable() {
        let mut table = SymbolTable::new();
        let a = table.new_constant("a", "a");
        let list = table.new_list(a, SymbolId::NULL);
        let text = table.info(list).to_string();
        assert!(text.starts_with(&format!("[anon:{}", list.as_u32())));
        assert!(text.ends_with("| [a|nil]]"));

        let x = table.new_variable("X");
        table.set_binding(x, a).unwrap();
        assert!(table.info(x).to_string().ends_with("| -> a]"));
        assert_eq!(table.info(SymbolId::new(1)).to_string(), "[unknown | ID:1]");
    }
}
