//! TypeScript document model and emitter.
//!
//! - `types`: the model (TsType, TsTypeDef, TsClass, TsModule)
//! - `emit`: model -> code strings via the `Emit` trait
//! - `utils`: identifier and string helpers

pub mod emit;
pub mod types;
pub mod utils;

pub use emit::Emit;
pub use types::{
    ClassMember, TemplatePart, TsClass, TsExpr, TsFunction, TsImport, TsItem, TsLiteral, TsMethod,
    TsModule, TsParam, TsPrimitive, TsProp, TsSignature, TsStmt, TsType, TsTypeDef, TsTypeParam,
    TypeDefKind,
};
