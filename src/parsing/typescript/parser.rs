//! TypeScript parser implementation
//!
//! **Tree-sitter ABI**: tree-sitter-typescript 0.23.2
//!
//! TypeScript is JavaScript plus a type layer. Every construct the two
//! languages share (functions, classes, arrow functions, imports, calls)
//! is extracted by the same engine `JavaScriptParser` already implements,
//! reconfigured here with the TypeScript grammar (`with_grammar`). This
//! parser adds a second pass over the tree for the declarations that only
//! exist in TypeScript: `interface`, `type` aliases, and `enum`.

use crate::parsing::javascript::JavaScriptParser;
use crate::parsing::parser::check_recursion_depth;
use crate::parsing::{
    HandledNode, Import, LanguageParser, MethodCall, NodeTracker, NodeTrackingState, TypeAliasEdge,
    TypeAliasTarget,
};
use crate::relationship::RelationKind;
use crate::types::SymbolCounter;
use crate::{FileId, Range, Symbol, SymbolKind, Visibility};
use std::any::Any;
use std::collections::HashSet;
use tree_sitter::{Language, Node, Parser};

/// Scalar keyword types skipped as union/intersection members (spec §4.5).
const BUILTIN_SCALARS: &[&str] = &[
    "string", "number", "boolean", "symbol", "bigint", "void", "never", "any", "unknown", "null",
    "undefined",
];

/// Generic wrappers recursed into rather than referenced directly (spec §4.5).
const BUILTIN_WRAPPERS: &[&str] = &[
    "Array",
    "Promise",
    "Partial",
    "Required",
    "Readonly",
    "Pick",
    "Omit",
    "Record",
    "Exclude",
    "Extract",
    "NonNullable",
    "ReturnType",
    "Parameters",
    "InstanceType",
    "ConstructorParameters",
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    "Date",
    "RegExp",
    "Error",
    "Function",
    "Object",
];

/// TypeScript language parser
pub struct TypeScriptParser {
    inner: JavaScriptParser,
    /// Second parser instance kept solely for the TS-only declaration pass,
    /// so the inner parser's tree ownership isn't disturbed.
    ts_parser: Parser,
    node_tracker: NodeTrackingState,
}

impl TypeScriptParser {
    pub fn new() -> Result<Self, String> {
        let language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let inner = JavaScriptParser::with_grammar(language.clone())?;

        let mut ts_parser = Parser::new();
        ts_parser
            .set_language(&language)
            .map_err(|e| format!("Failed to set TypeScript language: {e}"))?;

        Ok(Self {
            inner,
            ts_parser,
            node_tracker: NodeTrackingState::new(),
        })
    }

    /// Create a parser over the `.tsx` grammar (JSX syntax allowed).
    pub fn new_tsx() -> Result<Self, String> {
        let language: Language = tree_sitter_typescript::LANGUAGE_TSX.into();
        let inner = JavaScriptParser::with_grammar(language.clone())?;

        let mut ts_parser = Parser::new();
        ts_parser
            .set_language(&language)
            .map_err(|e| format!("Failed to set TSX language: {e}"))?;

        Ok(Self {
            inner,
            ts_parser,
            node_tracker: NodeTrackingState::new(),
        })
    }

    fn parse(&mut self, code: &str, file_id: FileId, symbol_counter: &mut SymbolCounter) -> Vec<Symbol> {
        let mut symbols = self.inner.parse(code, file_id, symbol_counter);
        symbols.extend(self.extract_type_declarations(code, file_id, symbol_counter));
        symbols
    }

    /// Walk the tree for `interface_declaration`, `type_alias_declaration`
    /// and `enum_declaration` nodes, which have no JavaScript counterpart.
    fn extract_type_declarations(
        &mut self,
        code: &str,
        file_id: FileId,
        symbol_counter: &mut SymbolCounter,
    ) -> Vec<Symbol> {
        let Some(tree) = self.ts_parser.parse(code, None) else {
            return Vec::new();
        };

        let mut symbols = Vec::new();
        let mut depth = 0usize;
        self.walk_type_decls(tree.root_node(), code, file_id, symbol_counter, &mut symbols, &mut depth);
        symbols
    }

    fn walk_type_decls(
        &mut self,
        node: Node,
        code: &str,
        file_id: FileId,
        symbol_counter: &mut SymbolCounter,
        out: &mut Vec<Symbol>,
        depth: &mut usize,
    ) {
        if !check_recursion_depth(*depth, node) {
            return;
        }

        let exported = node.parent().map(|p| p.kind() == "export_statement").unwrap_or(false);
        let name_node = node.child_by_field_name("name");

        match node.kind() {
            "interface_declaration" => {
                self.register_handled_node(node.kind(), node.kind_id());
                if let Some(name_node) = name_node {
                    out.push(self.make_symbol(
                        symbol_counter,
                        code,
                        file_id,
                        &name_node,
                        &node,
                        SymbolKind::Interface,
                        exported,
                    ));
                }
            }
            "type_alias_declaration" => {
                self.register_handled_node(node.kind(), node.kind_id());
                if let Some(name_node) = name_node {
                    out.push(self.make_symbol(
                        symbol_counter,
                        code,
                        file_id,
                        &name_node,
                        &node,
                        SymbolKind::TypeAlias,
                        exported,
                    ));
                }
            }
            "enum_declaration" => {
                self.register_handled_node(node.kind(), node.kind_id());
                if let Some(name_node) = name_node {
                    out.push(self.make_symbol(
                        symbol_counter,
                        code,
                        file_id,
                        &name_node,
                        &node,
                        SymbolKind::Enum,
                        exported,
                    ));
                }
            }
            _ => {}
        }

        *depth += 1;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk_type_decls(child, code, file_id, symbol_counter, out, depth);
        }
        *depth -= 1;
    }

    fn make_symbol(
        &self,
        symbol_counter: &mut SymbolCounter,
        code: &str,
        file_id: FileId,
        name_node: &Node,
        decl_node: &Node,
        kind: SymbolKind,
        exported: bool,
    ) -> Symbol {
        let name = &code[name_node.byte_range()];
        let range = Range::new(
            decl_node.start_position().row as u32,
            decl_node.start_position().column as u16,
            decl_node.end_position().row as u32,
            decl_node.end_position().column as u16,
        );

        let mut symbol = Symbol::new(symbol_counter.next_id(), name, kind, file_id, range)
            .with_visibility(if exported {
                Visibility::Public
            } else {
                Visibility::Module
            });

        if let Some(doc) = self.inner.extract_doc_comment(decl_node, code) {
            symbol = symbol.with_doc(doc);
        }

        symbol
    }

    /// Walk the tree for `type_alias_declaration` nodes and resolve their
    /// RHS into DERIVES_FROM/ALIAS_FOR edges (spec §4.5 type-alias rules).
    fn extract_type_alias_edges(&mut self, code: &str) -> Vec<TypeAliasEdge> {
        let Some(tree) = self.ts_parser.parse(code, None) else {
            return Vec::new();
        };
        let mut edges = Vec::new();
        let mut depth = 0usize;
        walk_type_alias_edges(tree.root_node(), code, &mut edges, &mut depth);
        edges
    }
}

/// `type X = <value>` where `<value>` is the node following the `=` in a
/// `type_alias_declaration`. Tree-sitter exposes it under the `value` field;
/// some grammar versions call it `type` instead, so both are tried.
fn type_alias_value<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    node.child_by_field_name("value")
        .or_else(|| node.child_by_field_name("type"))
}

fn walk_type_alias_edges(node: Node, code: &str, out: &mut Vec<TypeAliasEdge>, depth: &mut usize) {
    if !check_recursion_depth(*depth, node) {
        return;
    }

    if node.kind() == "type_alias_declaration" {
        if let (Some(name_node), Some(value)) = (node.child_by_field_name("name"), type_alias_value(&node)) {
            let alias = code[name_node.byte_range()].to_string();
            resolve_type_alias_value(&alias, value, code, out);
        }
    }

    *depth += 1;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_type_alias_edges(child, code, out, depth);
    }
    *depth -= 1;
}

/// Resolve one alias's RHS type node into zero or more edges, per the
/// union/intersection/direct-reference/array/built-in-wrapper/synthetic
/// rules in spec §4.5.
fn resolve_type_alias_value(alias: &str, value: Node, code: &str, out: &mut Vec<TypeAliasEdge>) {
    match value.kind() {
        "union_type" => {
            for member in flatten_binary_type(value, "union_type") {
                if let Some(target) = resolve_type_member(member, code) {
                    out.push(TypeAliasEdge {
                        alias: alias.to_string(),
                        kind: RelationKind::DerivesFrom,
                        target,
                    });
                }
            }
        }
        "intersection_type" => {
            for member in flatten_binary_type(value, "intersection_type") {
                if let Some(target) = resolve_type_member(member, code) {
                    out.push(TypeAliasEdge {
                        alias: alias.to_string(),
                        kind: RelationKind::DerivesFrom,
                        target,
                    });
                }
            }
        }
        _ => {
            if let Some(target) = resolve_type_member(value, code) {
                out.push(TypeAliasEdge {
                    alias: alias.to_string(),
                    kind: RelationKind::AliasFor,
                    target,
                });
            }
        }
    }
}

/// Flatten a left/right-recursive (or flat) binary type node into its
/// leaf members, regardless of how the grammar nests repeated operators.
fn flatten_binary_type<'a>(node: Node<'a>, kind: &str) -> Vec<Node<'a>> {
    let mut members = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !child.is_named() {
            continue;
        }
        if child.kind() == kind {
            members.extend(flatten_binary_type(child, kind));
        } else {
            members.push(child);
        }
    }
    members
}

/// Resolve a single type node to the referenced name, recursing through
/// arrays and built-in generic wrappers per spec §4.5. Returns `None` for
/// built-in scalars and literal types (skipped, not referenced).
fn resolve_type_member(node: Node, code: &str) -> Option<TypeAliasTarget> {
    match node.kind() {
        "type_identifier" | "nested_type_identifier" => {
            let name = &code[node.byte_range()];
            if BUILTIN_SCALARS.contains(&name) {
                None
            } else {
                Some(TypeAliasTarget::Named(name.to_string()))
            }
        }
        // Literal/inline-shape members contribute no named reference:
        // `& { id: string }`, `| "a"`, built-in scalar keywords.
        "predefined_type" | "literal_type" | "object_type" | "tuple_type" => None,
        "array_type" => node
            .named_child(0)
            .and_then(|el| resolve_type_member(el, code)),
        "parenthesized_type" => node
            .named_child(0)
            .and_then(|inner| resolve_type_member(inner, code)),
        "generic_type" => {
            let name_node = node.child_by_field_name("name")?;
            let name = &code[name_node.byte_range()];
            if BUILTIN_WRAPPERS.contains(&name) {
                let args = node.child_by_field_name("type_arguments")?;
                let mut cursor = args.walk();
                for arg in args.named_children(&mut cursor) {
                    if let Some(target) = resolve_type_member(arg, code) {
                        return Some(target);
                    }
                }
                // Every argument was a built-in scalar or unresolved: fall
                // back to the printed form as a synthetic reference.
                Some(TypeAliasTarget::Synthetic(code[node.byte_range()].to_string()))
            } else if BUILTIN_SCALARS.contains(&name) {
                None
            } else {
                Some(TypeAliasTarget::Named(name.to_string()))
            }
        }
        // Anything else (conditional types, mapped types, type queries
        // like `typeof f`, …): address by printed form.
        _ => Some(TypeAliasTarget::Synthetic(code[node.byte_range()].to_string())),
    }
}

impl NodeTracker for TypeScriptParser {
    fn get_handled_nodes(&self) -> &HashSet<HandledNode> {
        self.node_tracker.get_handled_nodes()
    }

    fn register_handled_node(&mut self, node_kind: &str, node_id: u16) {
        self.node_tracker.register_handled_node(node_kind, node_id);
    }
}

impl LanguageParser for TypeScriptParser {
    fn parse(&mut self, code: &str, file_id: FileId, symbol_counter: &mut SymbolCounter) -> Vec<Symbol> {
        self.parse(code, file_id, symbol_counter)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn extract_doc_comment(&self, node: &Node, code: &str) -> Option<String> {
        self.inner.extract_doc_comment(node, code)
    }

    fn find_calls<'a>(&mut self, code: &'a str) -> Vec<(&'a str, &'a str, Range)> {
        self.inner.find_calls(code)
    }

    fn find_method_calls(&mut self, code: &str) -> Vec<MethodCall> {
        self.inner.find_method_calls(code)
    }

    fn find_implementations<'a>(&mut self, code: &'a str) -> Vec<(&'a str, &'a str, Range)> {
        self.inner.find_implementations(code)
    }

    fn find_extends<'a>(&mut self, code: &'a str) -> Vec<(&'a str, &'a str, Range)> {
        self.inner.find_extends(code)
    }

    fn find_uses<'a>(&mut self, code: &'a str) -> Vec<(&'a str, &'a str, Range)> {
        self.inner.find_uses(code)
    }

    fn find_defines<'a>(&mut self, code: &'a str) -> Vec<(&'a str, &'a str, Range)> {
        self.inner.find_defines(code)
    }

    fn find_imports(&mut self, code: &str, file_id: FileId) -> Vec<Import> {
        self.inner.find_imports(code, file_id)
    }

    fn language(&self) -> crate::parsing::Language {
        crate::parsing::Language::TypeScript
    }

    fn find_variable_types<'a>(&mut self, code: &'a str) -> Vec<(&'a str, &'a str, Range)> {
        self.inner.find_variable_types(code)
    }

    fn find_type_alias_edges(&mut self, code: &str) -> Vec<TypeAliasEdge> {
        self.extract_type_alias_edges(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_interface_and_type_alias() {
        let mut parser = TypeScriptParser::new().unwrap();
        let mut counter = SymbolCounter::new();
        let file_id = FileId::new(1).unwrap();
        let code = r#"
export interface Point {
    x: number;
    y: number;
}

type Id = string | number;

enum Color { Red, Green, Blue }
"#;
        let symbols = parser.parse(code, file_id, &mut counter);
        assert!(symbols.iter().any(|s| s.name.as_ref() == "Point" && s.kind == SymbolKind::Interface));
        assert!(symbols.iter().any(|s| s.name.as_ref() == "Id" && s.kind == SymbolKind::TypeAlias));
        assert!(symbols.iter().any(|s| s.name.as_ref() == "Color" && s.kind == SymbolKind::Enum));
    }

    #[test]
    fn exported_interface_is_public() {
        let mut parser = TypeScriptParser::new().unwrap();
        let mut counter = SymbolCounter::new();
        let file_id = FileId::new(1).unwrap();
        let code = "export interface Shape { area(): number; }";
        let symbols = parser.parse(code, file_id, &mut counter);
        let shape = symbols.iter().find(|s| s.name.as_ref() == "Shape").unwrap();
        assert_eq!(shape.visibility, Visibility::Public);
    }
}
