//! S-expression rendering.
//!
//! Only named and missing nodes are printed. Fields prefix their child as
//! `name: (...)`, and missing tokens print as `(MISSING kind)`, with
//! anonymous kinds quoted.

use whorl_ir::stack::ensure_sufficient_stack;

use crate::Node;

pub(crate) fn write_sexp(node: Node<'_>, field: Option<&str>, out: &mut String) {
    ensure_sufficient_stack(|| write_node(node, field, out));
}

fn write_node(node: Node<'_>, field: Option<&str>, out: &mut String) {
    if !node.is_named() && !node.is_missing() {
        return;
    }
    if !out.is_empty() {
        out.push(' ');
    }
    if let Some(field) = field {
        out.push_str(field);
        out.push_str(": ");
    }
    if node.is_missing() {
        out.push_str("(MISSING ");
        if node.is_named() {
            out.push_str(node.kind());
        } else {
            out.push('"');
            out.push_str(node.kind());
            out.push('"');
        }
        out.push(')');
        return;
    }

    out.push('(');
    out.push_str(node.kind());
    let grammar = node.tree().grammar();
    for (child, field) in node.child_fields() {
        let name = field.and_then(|f| grammar.field_name(f));
        write_sexp(child, name, out);
    }
    out.push(')');
}
