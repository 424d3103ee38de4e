//! TypeScript code emission via the Emit trait.
//!
//! Each document model type implements `Emit`. Emission is purely mechanical:
//! every decision about what to generate has already been made when the
//! model was built.

use super::types::{
    ClassMember, TemplatePart, TsClass, TsExpr, TsFunction, TsImport, TsItem, TsLiteral, TsMethod,
    TsModule, TsParam, TsPrimitive, TsProp, TsSignature, TsStmt, TsType, TsTypeDef, TsTypeParam,
    TypeDefKind,
};
use super::utils::{escape_js_string, indent, quote_if_needed};

/// Trait for emitting TypeScript code from document model nodes.
pub trait Emit {
    /// Convert the node to its TypeScript string representation.
    fn emit(&self) -> String;
}

fn join<T: Emit>(items: &[T], sep: &str) -> String {
    items.iter().map(Emit::emit).collect::<Vec<_>>().join(sep)
}

// =============================================================================
// Primitive Types
// =============================================================================

impl Emit for TsPrimitive {
    fn emit(&self) -> String {
        match self {
            TsPrimitive::String => "string",
            TsPrimitive::Number => "number",
            TsPrimitive::Boolean => "boolean",
            TsPrimitive::Null => "null",
            TsPrimitive::Void => "void",
            TsPrimitive::Unknown => "unknown",
            TsPrimitive::Any => "any",
            TsPrimitive::Never => "never",
            TsPrimitive::Object => "object",
        }
        .to_string()
    }
}

impl Emit for TsLiteral {
    fn emit(&self) -> String {
        match self {
            TsLiteral::String(s) => format!("\"{}\"", escape_js_string(s)),
            TsLiteral::Int(i) => i.to_string(),
            TsLiteral::Bool(b) => b.to_string(),
            TsLiteral::Null => "null".to_string(),
        }
    }
}

// =============================================================================
// Types
// =============================================================================

/// Wrap `ty` in parentheses when it sits in a postfix position (`T[]`) or
/// after `keyof`.
fn emit_operand(ty: &TsType) -> String {
    let s = ty.emit();
    let wrap = match ty {
        TsType::Union(_)
        | TsType::Intersection(_)
        | TsType::Conditional { .. }
        | TsType::Infer(_)
        | TsType::Keyof(_) => true,
        TsType::Raw(text) => text.contains(['|', '&', ' ']),
        _ => false,
    };
    if wrap { format!("({s})") } else { s }
}

fn emit_wrapped_conditional(ty: &TsType) -> String {
    match ty {
        TsType::Conditional { .. } => format!("({})", ty.emit()),
        _ => ty.emit(),
    }
}

impl Emit for TsType {
    fn emit(&self) -> String {
        match self {
            TsType::Primitive(p) => p.emit(),
            TsType::Array(inner) => format!("{}[]", emit_operand(inner)),
            TsType::ReadonlyArray(inner) => format!("readonly {}[]", emit_operand(inner)),
            TsType::Union(types) => types
                .iter()
                .map(emit_wrapped_conditional)
                .collect::<Vec<_>>()
                .join(" | "),
            TsType::Intersection(types) => types
                .iter()
                .map(|t| match t {
                    TsType::Union(_) => format!("({})", t.emit()),
                    _ => emit_wrapped_conditional(t),
                })
                .collect::<Vec<_>>()
                .join(" & "),
            TsType::Object(props) => {
                if props.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", join(props, "; "))
                }
            }
            TsType::Record { key, value } => {
                format!("Record<{}, {}>", key.emit(), value.emit())
            }
            TsType::Literal(lit) => lit.emit(),
            TsType::Ref(name) => name.clone(),
            TsType::Generic { name, args } => format!("{}<{}>", name, join(args, ", ")),
            TsType::Conditional {
                check,
                extends,
                then,
                otherwise,
            } => format!(
                "{} extends {} ? {} : {}",
                emit_wrapped_conditional(check),
                emit_wrapped_conditional(extends),
                then.emit(),
                otherwise.emit()
            ),
            TsType::Infer(name) => format!("infer {name}"),
            TsType::Keyof(inner) => format!("keyof {}", emit_operand(inner)),
            TsType::Raw(text) => text.clone(),
        }
    }
}

/// Emit a conditional chain one branch per line:
///
/// ```ts
/// P extends A
///   ? X
///   : P extends B
///   ? Y
///   : Z
/// ```
fn emit_chain(ty: &TsType) -> String {
    match ty {
        TsType::Conditional {
            check,
            extends,
            then,
            otherwise,
        } => format!(
            "{} extends {}\n  ? {}\n  : {}",
            emit_wrapped_conditional(check),
            emit_wrapped_conditional(extends),
            then.emit(),
            emit_chain(otherwise)
        ),
        _ => ty.emit(),
    }
}

impl Emit for TsProp {
    fn emit(&self) -> String {
        let key = quote_if_needed(&self.name);
        let opt = if self.optional { "?" } else { "" };
        format!("{}{}: {}", key, opt, self.ty.emit())
    }
}

impl Emit for TsTypeParam {
    fn emit(&self) -> String {
        let mut out = String::new();
        if self.is_const {
            out.push_str("const ");
        }
        out.push_str(&self.name);
        if let Some(constraint) = &self.constraint {
            out.push_str(" extends ");
            out.push_str(&constraint.emit());
        }
        if let Some(default) = &self.default {
            out.push_str(" = ");
            out.push_str(&default.emit());
        }
        out
    }
}

fn emit_type_params(params: &[TsTypeParam]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("<{}>", join(params, ", "))
    }
}

fn emit_doc(doc: Option<&String>) -> String {
    doc.map(|d| format!("/** {d} */\n")).unwrap_or_default()
}

// =============================================================================
// Type Definitions
// =============================================================================

impl Emit for TsTypeDef {
    fn emit(&self) -> String {
        let mut output = emit_doc(self.doc.as_ref());
        let params = emit_type_params(&self.type_params);
        match &self.kind {
            TypeDefKind::Interface {
                extends,
                properties,
            } => {
                let extends_str = if extends.is_empty() {
                    String::new()
                } else {
                    format!(" extends {}", join(extends, ", "))
                };
                output.push_str(&format!(
                    "export interface {}{}{} {{",
                    self.name, params, extends_str
                ));
                if properties.is_empty() {
                    output.push_str("}\n");
                } else {
                    output.push('\n');
                    for prop in properties {
                        output.push_str(&format!("  {};\n", prop.emit()));
                    }
                    output.push_str("}\n");
                }
            }
            TypeDefKind::TypeAlias { ty } => {
                output.push_str(&format!(
                    "export type {}{} = {};\n",
                    self.name,
                    params,
                    emit_chain(ty)
                ));
            }
            TypeDefKind::Namespace { members } => {
                output.push_str(&format!("export namespace {} {{\n", self.name));
                for member in members {
                    output.push_str(&indent(&member.emit(), 1));
                }
                output.push_str("}\n");
            }
        }
        output
    }
}

// =============================================================================
// Expressions
// =============================================================================

impl Emit for TsExpr {
    fn emit(&self) -> String {
        match self {
            TsExpr::Ident(name) => name.clone(),
            TsExpr::Literal(lit) => lit.emit(),
            TsExpr::Call {
                callee,
                type_args,
                args,
            } => {
                let type_args_str = if type_args.is_empty() {
                    String::new()
                } else {
                    format!("<{}>", join(type_args, ", "))
                };
                format!("{}{}({})", callee.emit(), type_args_str, join(args, ", "))
            }
            TsExpr::Object(props) => {
                if props.is_empty() {
                    "{}".to_string()
                } else {
                    let parts: Vec<_> = props
                        .iter()
                        .map(|(k, v)| match v {
                            TsExpr::Ident(name) if name == k => name.clone(),
                            _ => format!("{}: {}", quote_if_needed(k), v.emit()),
                        })
                        .collect();
                    format!("{{ {} }}", parts.join(", "))
                }
            }
            TsExpr::Member { object, prop } => {
                format!("{}.{}", object.emit(), prop)
            }
            TsExpr::Template(parts) => {
                let content: String = parts
                    .iter()
                    .map(|p| match p {
                        TemplatePart::Static(s) => s.replace('`', "\\`"),
                        TemplatePart::Dynamic(e) => format!("${{{}}}", e.emit()),
                    })
                    .collect();
                format!("`{content}`")
            }
            TsExpr::Await(inner) => format!("await {}", inner.emit()),
            TsExpr::New { callee, args } => {
                format!("new {}({})", callee.emit(), join(args, ", "))
            }
            TsExpr::Raw(code) => code.clone(),
        }
    }
}

impl Emit for TsParam {
    fn emit(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        match &self.ty {
            Some(ty) => format!("{}{}: {}", self.name, opt, ty.emit()),
            None => format!("{}{}", self.name, opt),
        }
    }
}

// =============================================================================
// Statements
// =============================================================================

impl Emit for TsStmt {
    fn emit(&self) -> String {
        self.emit_indented(1)
    }
}

impl TsStmt {
    /// Emit with specified indentation level (2 spaces per level)
    pub fn emit_indented(&self, level: usize) -> String {
        let prefix = "  ".repeat(level);
        match self {
            TsStmt::Const { name, init } => {
                format!("{}const {} = {};\n", prefix, name, init.emit())
            }
            TsStmt::Expr(expr) => format!("{}{};\n", prefix, expr.emit()),
            TsStmt::Return(expr) => match expr {
                Some(e) => format!("{}return {};\n", prefix, e.emit()),
                None => format!("{prefix}return;\n"),
            },
            TsStmt::Try {
                body,
                binding,
                handler,
            } => format!(
                "{prefix}try {{\n{}{prefix}}} catch ({binding}) {{\n{}{prefix}}}\n",
                emit_body(body, level + 1),
                emit_body(handler, level + 1),
            ),
            TsStmt::Raw(code) => indent(code, level),
        }
    }
}

fn emit_body(body: &[TsStmt], level: usize) -> String {
    body.iter().map(|stmt| stmt.emit_indented(level)).collect()
}

// =============================================================================
// Functions and classes
// =============================================================================

impl Emit for TsSignature {
    fn emit(&self) -> String {
        let ret = self
            .return_type
            .as_ref()
            .map(|t| format!(": {}", t.emit()))
            .unwrap_or_default();
        format!(
            "{}({}){}",
            emit_type_params(&self.type_params),
            join(&self.params, ", "),
            ret
        )
    }
}

impl Emit for TsMethod {
    fn emit(&self) -> String {
        let mut output = emit_doc(self.doc.as_ref());
        for overload in &self.overloads {
            output.push_str(&format!("{}{};\n", self.name, overload.emit()));
        }
        let async_str = if self.is_async { "async " } else { "" };
        output.push_str(&format!(
            "{}{}{} {{\n",
            async_str,
            self.name,
            self.implementation.emit()
        ));
        output.push_str(&emit_body(&self.body, 1));
        output.push_str("}\n");
        output
    }
}

impl Emit for ClassMember {
    fn emit(&self) -> String {
        match self {
            ClassMember::Property { name, ty, readonly } => {
                let readonly = if *readonly { "readonly " } else { "" };
                format!("{}{}: {};\n", readonly, quote_if_needed(name), ty.emit())
            }
            ClassMember::Constructor { params, body } => {
                format!(
                    "constructor({}) {{\n{}}}\n",
                    join(params, ", "),
                    emit_body(body, 1)
                )
            }
            ClassMember::Method(method) => method.emit(),
        }
    }
}

impl Emit for TsClass {
    fn emit(&self) -> String {
        let mut output = emit_doc(self.doc.as_ref());
        let extends = self
            .extends
            .as_ref()
            .map(|t| format!(" extends {}", t.emit()))
            .unwrap_or_default();
        output.push_str(&format!("export class {}{} {{\n", self.name, extends));

        let mut previous_was_property = false;
        for (i, member) in self.members.iter().enumerate() {
            let is_property = matches!(member, ClassMember::Property { .. });
            if i > 0 && !(is_property && previous_was_property) {
                output.push('\n');
            }
            output.push_str(&indent(&member.emit(), 1));
            previous_was_property = is_property;
        }
        output.push_str("}\n");
        output
    }
}

impl Emit for TsFunction {
    fn emit(&self) -> String {
        format!(
            "export function {}{} {{\n{}}}\n",
            self.name,
            self.signature.emit(),
            emit_body(&self.body, 1)
        )
    }
}

// =============================================================================
// Imports
// =============================================================================

impl Emit for TsImport {
    fn emit(&self) -> String {
        let type_keyword = if self.type_only { "type " } else { "" };
        if self.items.len() <= 3 {
            format!(
                "import {}{{ {} }} from \"{}\";\n",
                type_keyword,
                self.items.join(", "),
                self.from
            )
        } else {
            let items: String = self.items.iter().map(|i| format!("  {i},\n")).collect();
            format!("import {}{{\n{}}} from \"{}\";\n", type_keyword, items, self.from)
        }
    }
}

// =============================================================================
// Module
// =============================================================================

impl Emit for TsItem {
    fn emit(&self) -> String {
        match self {
            TsItem::Raw(code) => {
                let mut s = code.trim_end().to_string();
                s.push('\n');
                s
            }
            TsItem::Type(def) => def.emit(),
            TsItem::Class(class) => class.emit(),
            TsItem::Function(func) => func.emit(),
        }
    }
}

impl Emit for TsModule {
    fn emit(&self) -> String {
        let mut output = String::new();

        for line in &self.header {
            if line.is_empty() {
                output.push_str("//\n");
            } else {
                output.push_str(&format!("// {line}\n"));
            }
        }
        if !self.header.is_empty() {
            output.push('\n');
        }

        for import in &self.imports {
            output.push_str(&import.emit());
        }
        if !self.imports.is_empty() {
            output.push('\n');
        }

        for item in &self.items {
            output.push_str(&item.emit());
            output.push('\n');
        }

        let trimmed = output.trim_end().len();
        output.truncate(trimmed);
        output.push('\n');
        output
    }
}

// =============================================================================
// Tests
// =============================================================================
