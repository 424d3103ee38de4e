//! TypeScript document model for code generation.
//!
//! - `TsType`: type expressions, including the conditional / `infer` /
//!   `keyof` forms the populate payload types are built from
//! - `TsTypeDef`: interfaces, type aliases and namespaces with generic
//!   parameters
//! - `TsClass`, `TsFunction`: client runtime surface, with overloads
//! - `TsModule`: one emitted file
//!
//! Synthesizers build these values and tests inspect them before anything is
//! rendered to text.

/// TypeScript type representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsType {
    /// Primitive types: string, number, boolean, null, ...
    Primitive(TsPrimitive),
    /// Array type: T[]
    Array(Box<TsType>),
    /// Readonly array type: readonly T[]
    ReadonlyArray(Box<TsType>),
    /// Union type: A | B | C
    Union(Vec<TsType>),
    /// Intersection type: A & B & C
    Intersection(Vec<TsType>),
    /// Object type: { foo: string; bar?: number }
    Object(Vec<TsProp>),
    /// Record type: Record<K, V>
    Record {
        /// Key type
        key: Box<TsType>,
        /// Value type
        value: Box<TsType>,
    },
    /// Literal type: "foo", 42, true
    Literal(TsLiteral),
    /// Named type reference: Item
    Ref(String),
    /// Generic instantiation: Pick<T, K>
    Generic {
        /// Generic type name
        name: String,
        /// Type arguments
        args: Vec<TsType>,
    },
    /// Conditional type: C extends E ? T : F
    Conditional {
        /// Checked type `C`
        check: Box<TsType>,
        /// Pattern `E`
        extends: Box<TsType>,
        /// Result when `C` matches
        then: Box<TsType>,
        /// Result otherwise
        otherwise: Box<TsType>,
    },
    /// Inference site inside an `extends` clause: infer K
    Infer(String),
    /// keyof T
    Keyof(Box<TsType>),
    /// Type text taken verbatim from input
    Raw(String),
}

impl TsType {
    /// `string`
    pub fn string() -> Self {
        Self::Primitive(TsPrimitive::String)
    }

    /// `number`
    pub fn number() -> Self {
        Self::Primitive(TsPrimitive::Number)
    }

    /// `boolean`
    pub fn boolean() -> Self {
        Self::Primitive(TsPrimitive::Boolean)
    }

    /// `null`
    pub fn null() -> Self {
        Self::Primitive(TsPrimitive::Null)
    }

    /// Reference to a named type.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref(name.into())
    }

    /// String literal type: `"value"`
    pub fn string_literal(value: impl Into<String>) -> Self {
        Self::Literal(TsLiteral::String(value.into()))
    }

    /// `Name<Args...>`
    pub fn generic(name: impl Into<String>, args: Vec<TsType>) -> Self {
        Self::Generic {
            name: name.into(),
            args,
        }
    }

    /// `T[]`
    pub fn array(inner: TsType) -> Self {
        Self::Array(Box::new(inner))
    }

    /// `T | null`
    pub fn nullable(inner: TsType) -> Self {
        Self::Union(vec![inner, Self::null()])
    }

    /// `check extends pattern ? then : otherwise`
    pub fn conditional(check: TsType, extends: TsType, then: TsType, otherwise: TsType) -> Self {
        Self::Conditional {
            check: Box::new(check),
            extends: Box::new(extends),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// The empty object type `{}`.
    pub fn empty_object() -> Self {
        Self::Object(Vec::new())
    }

    /// Length of the chain of conditionals nested in `otherwise` position.
    pub fn conditional_depth(&self) -> usize {
        match self {
            TsType::Conditional { otherwise, .. } => 1 + otherwise.conditional_depth(),
            _ => 0,
        }
    }

    /// Every named type referenced anywhere inside this type.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TsType::Ref(name) => out.push(name),
            TsType::Generic { name, args } => {
                out.push(name);
                args.iter().for_each(|a| a.collect_names(out));
            }
            TsType::Array(inner) | TsType::ReadonlyArray(inner) | TsType::Keyof(inner) => {
                inner.collect_names(out);
            }
            TsType::Union(types) | TsType::Intersection(types) => {
                types.iter().for_each(|t| t.collect_names(out));
            }
            TsType::Object(props) => props.iter().for_each(|p| p.ty.collect_names(out)),
            TsType::Record { key, value } => {
                key.collect_names(out);
                value.collect_names(out);
            }
            TsType::Conditional {
                check,
                extends,
                then,
                otherwise,
            } => {
                for t in [check, extends, then, otherwise] {
                    t.collect_names(out);
                }
            }
            TsType::Primitive(_) | TsType::Literal(_) | TsType::Infer(_) | TsType::Raw(_) => {}
        }
    }
}

/// TypeScript primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `null`
    Null,
    /// `void`
    Void,
    /// `unknown`
    Unknown,
    /// `any`
    Any,
    /// `never`
    Never,
    /// `object`
    Object,
}

/// Object property definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsProp {
    /// Property name, quoted on emission when not an identifier
    pub name: String,
    /// Property type
    pub ty: TsType,
    /// Emitted with `?`
    pub optional: bool,
}

impl TsProp {
    /// `name: ty`
    pub fn required(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    /// `name?: ty`
    pub fn optional(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}

/// TypeScript literal values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsLiteral {
    /// Double-quoted string
    String(String),
    /// Integer
    Int(i64),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
}

/// TypeScript expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsExpr {
    /// Identifier: foo
    Ident(String),
    /// Literal value: "bar", 42
    Literal(TsLiteral),
    /// Function call with optional type arguments: foo<T>(a, b)
    Call {
        /// Called expression
        callee: Box<TsExpr>,
        /// Explicit type arguments
        type_args: Vec<TsType>,
        /// Call arguments
        args: Vec<TsExpr>,
    },
    /// Object literal: { a: 1, b: 2 }
    Object(Vec<(String, TsExpr)>),
    /// Member access: foo.bar
    Member {
        /// Accessed object
        object: Box<TsExpr>,
        /// Property name
        prop: String,
    },
    /// Template literal: `${foo}/bar`
    Template(Vec<TemplatePart>),
    /// Await expression: await this.request(...)
    Await(Box<TsExpr>),
    /// new Foo(...)
    New {
        /// Constructed class
        callee: Box<TsExpr>,
        /// Constructor arguments
        args: Vec<TsExpr>,
    },
    /// Raw code that doesn't fit the AST
    Raw(String),
}

impl TsExpr {
    /// Identifier expression.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    /// String literal expression.
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(TsLiteral::String(value.into()))
    }

    /// `object.prop`
    pub fn member(object: TsExpr, prop: impl Into<String>) -> Self {
        Self::Member {
            object: Box::new(object),
            prop: prop.into(),
        }
    }

    /// `this.<prop>`
    pub fn this(prop: impl Into<String>) -> Self {
        Self::member(Self::ident("this"), prop)
    }

    /// `callee(args...)` without type arguments
    pub fn call(callee: TsExpr, args: Vec<TsExpr>) -> Self {
        Self::Call {
            callee: Box::new(callee),
            type_args: Vec::new(),
            args,
        }
    }

    /// `await self`
    pub fn awaited(self) -> Self {
        Self::Await(Box::new(self))
    }

    /// Named types appearing as type arguments inside this expression.
    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TsExpr::Call {
                callee,
                type_args,
                args,
            } => {
                callee.collect_names(out);
                type_args.iter().for_each(|t| t.collect_names(out));
                args.iter().for_each(|a| a.collect_names(out));
            }
            TsExpr::New { callee, args } => {
                callee.collect_names(out);
                args.iter().for_each(|a| a.collect_names(out));
            }
            TsExpr::Object(props) => props.iter().for_each(|(_, v)| v.collect_names(out)),
            TsExpr::Member { object, .. } => object.collect_names(out),
            TsExpr::Await(inner) => inner.collect_names(out),
            TsExpr::Template(parts) => parts.iter().for_each(|p| {
                if let TemplatePart::Dynamic(e) = p {
                    e.collect_names(out);
                }
            }),
            TsExpr::Ident(_) | TsExpr::Literal(_) | TsExpr::Raw(_) => {}
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsParam {
    /// Parameter name
    pub name: String,
    /// Annotation; untyped when `None`
    pub ty: Option<TsType>,
    /// Emitted with `?`
    pub optional: bool,
}

impl TsParam {
    /// Required typed parameter.
    pub fn new(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            optional: false,
        }
    }

    /// Optional typed parameter.
    pub fn optional(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            optional: true,
        }
    }
}

/// Template literal part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Static string part
    Static(String),
    /// Dynamic expression part: ${expr}
    Dynamic(TsExpr),
}

/// Generic type parameter: `const P extends X = D`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsTypeParam {
    /// Parameter name
    pub name: String,
    /// `extends` bound
    pub constraint: Option<TsType>,
    /// `=` default
    pub default: Option<TsType>,
    /// `const` modifier, for literal inference of arguments
    pub is_const: bool,
}

impl TsTypeParam {
    /// Unconstrained parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
            default: None,
            is_const: false,
        }
    }

    /// `name extends constraint`
    pub fn extends(name: impl Into<String>, constraint: TsType) -> Self {
        Self {
            constraint: Some(constraint),
            ..Self::new(name)
        }
    }
}

// =============================================================================
// Module-Level IR (for printer)
// =============================================================================

/// Import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsImport {
    /// Items to import
    pub items: Vec<String>,
    /// Module path
    pub from: String,
    /// Whether this is a type-only import
    pub type_only: bool,
}

/// Type definition kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefKind {
    /// interface Foo extends Bar { ... }
    Interface {
        /// Base interfaces
        extends: Vec<TsType>,
        /// Declared properties
        properties: Vec<TsProp>,
    },
    /// type Foo = ...
    TypeAlias {
        /// Aliased type
        ty: TsType,
    },
    /// namespace Foo { ... }
    Namespace {
        /// Exported declarations of the namespace
        members: Vec<TsTypeDef>,
    },
}

/// Exported type definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsTypeDef {
    /// Declared name
    pub name: String,
    /// Generic parameters
    pub type_params: Vec<TsTypeParam>,
    /// Interface, alias or namespace body
    pub kind: TypeDefKind,
    /// JSDoc text
    pub doc: Option<String>,
}

impl TsTypeDef {
    /// Interface without base types.
    pub fn interface(name: impl Into<String>, properties: Vec<TsProp>) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            kind: TypeDefKind::Interface {
                extends: Vec::new(),
                properties,
            },
            doc: None,
        }
    }

    /// Type alias.
    pub fn alias(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            kind: TypeDefKind::TypeAlias { ty },
            doc: None,
        }
    }

    /// Namespace of type declarations.
    pub fn namespace(name: impl Into<String>, members: Vec<TsTypeDef>) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            kind: TypeDefKind::Namespace { members },
            doc: None,
        }
    }

    /// Replace the generic parameters.
    pub fn with_type_params(mut self, type_params: Vec<TsTypeParam>) -> Self {
        self.type_params = type_params;
        self
    }

    /// Attach a JSDoc comment.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Properties of an interface; empty for other kinds.
    pub fn properties(&self) -> &[TsProp] {
        match &self.kind {
            TypeDefKind::Interface { properties, .. } => properties,
            _ => &[],
        }
    }

    /// Aliased type of a type alias.
    pub fn aliased(&self) -> Option<&TsType> {
        match &self.kind {
            TypeDefKind::TypeAlias { ty } => Some(ty),
            _ => None,
        }
    }
}

/// Statement in a function body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsStmt {
    /// const declaration
    Const {
        /// Bound name
        name: String,
        /// Initializer
        init: TsExpr,
    },
    /// Expression statement
    Expr(TsExpr),
    /// Return statement
    Return(Option<TsExpr>),
    /// try { body } catch (binding) { handler }
    Try {
        /// Guarded statements
        body: Vec<TsStmt>,
        /// Name bound to the caught error
        binding: String,
        /// Statements of the catch clause
        handler: Vec<TsStmt>,
    },
    /// Raw code block (for patterns that don't fit the AST)
    Raw(String),
}

impl TsStmt {
    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TsStmt::Const { init: expr, .. } | TsStmt::Expr(expr) | TsStmt::Return(Some(expr)) => {
                expr.collect_names(out);
            }
            TsStmt::Try { body, handler, .. } => {
                body.iter().chain(handler).for_each(|s| s.collect_names(out));
            }
            TsStmt::Return(None) | TsStmt::Raw(_) => {}
        }
    }
}

/// One call signature: type parameters, parameters and return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsSignature {
    /// Generic parameters
    pub type_params: Vec<TsTypeParam>,
    /// Value parameters
    pub params: Vec<TsParam>,
    /// Return annotation
    pub return_type: Option<TsType>,
}

impl TsSignature {
    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        for param in &self.type_params {
            param.constraint.iter().chain(&param.default).for_each(|t| t.collect_names(out));
        }
        self.params
            .iter()
            .filter_map(|p| p.ty.as_ref())
            .chain(&self.return_type)
            .for_each(|t| t.collect_names(out));
    }
}

/// Class method with optional overload signatures preceding the
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsMethod {
    /// Method name
    pub name: String,
    /// Overload signatures, in resolution order
    pub overloads: Vec<TsSignature>,
    /// Signature of the implementation
    pub implementation: TsSignature,
    /// Implementation body
    pub body: Vec<TsStmt>,
    /// Emitted with `async`
    pub is_async: bool,
    /// JSDoc text
    pub doc: Option<String>,
}

/// Class member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassMember {
    /// `readonly name: Type;`
    Property {
        /// Property name
        name: String,
        /// Property type
        ty: TsType,
        /// Emitted with `readonly`
        readonly: bool,
    },
    /// `constructor(params) { body }`
    Constructor {
        /// Constructor parameters
        params: Vec<TsParam>,
        /// Constructor body
        body: Vec<TsStmt>,
    },
    /// Method with its overloads
    Method(TsMethod),
}

/// Exported class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsClass {
    /// Class name
    pub name: String,
    /// Base class
    pub extends: Option<TsType>,
    /// Members in emission order
    pub members: Vec<ClassMember>,
    /// JSDoc text
    pub doc: Option<String>,
}

impl TsClass {
    /// Methods in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &TsMethod> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Method(method) => Some(method),
            _ => None,
        })
    }

    /// Method by name.
    pub fn method(&self, name: &str) -> Option<&TsMethod> {
        self.methods().find(|m| m.name == name)
    }

    /// Every named type the class refers to: base class, member types,
    /// signatures, and type arguments in method bodies.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if let Some(extends) = &self.extends {
            extends.collect_names(&mut out);
        }
        for member in &self.members {
            match member {
                ClassMember::Property { ty, .. } => ty.collect_names(&mut out),
                ClassMember::Constructor { params, body } => {
                    params.iter().filter_map(|p| p.ty.as_ref()).for_each(|t| t.collect_names(&mut out));
                    body.iter().for_each(|s| s.collect_names(&mut out));
                }
                ClassMember::Method(method) => {
                    method.overloads.iter().for_each(|s| s.collect_names(&mut out));
                    method.implementation.collect_names(&mut out);
                    method.body.iter().for_each(|s| s.collect_names(&mut out));
                }
            }
        }
        out
    }
}

/// Exported function definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsFunction {
    /// Function name
    pub name: String,
    /// Parameters and return type
    pub signature: TsSignature,
    /// Function body
    pub body: Vec<TsStmt>,
}

impl TsFunction {
    /// Every named type in the signature and in body type arguments.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.signature.collect_names(&mut out);
        self.body.iter().for_each(|s| s.collect_names(&mut out));
        out
    }
}

/// Top-level item of a module, in emission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsItem {
    /// Hand-written runtime or prelude block
    Raw(String),
    /// Exported type declaration
    Type(TsTypeDef),
    /// Exported class
    Class(TsClass),
    /// Exported function
    Function(TsFunction),
}

/// Complete TypeScript module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsModule {
    /// Leading comment lines, without comment markers
    pub header: Vec<String>,
    /// Import statements
    pub imports: Vec<TsImport>,
    /// Top-level items in emission order
    pub items: Vec<TsItem>,
}

impl TsModule {
    /// Type declarations in emission order.
    pub fn type_defs(&self) -> impl Iterator<Item = &TsTypeDef> {
        self.items.iter().filter_map(|item| match item {
            TsItem::Type(def) => Some(def),
            _ => None,
        })
    }

    /// Type declaration by name.
    pub fn type_def(&self, name: &str) -> Option<&TsTypeDef> {
        self.type_defs().find(|def| def.name == name)
    }

    /// Classes in emission order.
    pub fn classes(&self) -> impl Iterator<Item = &TsClass> {
        self.items.iter().filter_map(|item| match item {
            TsItem::Class(class) => Some(class),
            _ => None,
        })
    }

    /// Class by name.
    pub fn class(&self, name: &str) -> Option<&TsClass> {
        self.classes().find(|class| class.name == name)
    }
}
