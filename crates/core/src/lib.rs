//! Compiler from headless CMS content schemas and custom route declarations
//! to TypeScript: entity, input, filter and populate-aware payload types plus
//! a typed CRUD client.
//!
//! Pipeline: raw schema / routes -> IR -> TypeScript document model -> text.
//! Every stage is a pure function of its input; the only non-deterministic
//! value, the generation timestamp, is reported but never emitted.

pub mod codegen;
pub mod config;
pub mod error;
pub mod hash;
pub mod routes;
pub mod schema;
pub mod text;
pub mod ts;

use tracing::info;

// Re-export commonly used types
pub use config::GeneratorConfig;
pub use error::{CompileError, Result};
pub use routes::{RouteDescriptor, RouteSet};
pub use schema::{
    DeclarationExtractor, DeclarationSources, ParsedSchema, SchemaExtractor, SchemaFilter,
    SchemaInput, StructuredExtractor,
};
use ts::{Emit, TsModule};

/// Result of one compilation run.
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    /// Text of the types module.
    pub types: String,
    /// Text of the client module; empty when client emission is disabled.
    pub client: String,
    /// Hex SHA-256 over the Schema IR and Route IR.
    pub schema_hash: String,
    /// RFC 3339 UTC time of the run.
    pub generated_at: String,
    /// Document model behind `types`.
    pub types_module: TsModule,
    /// Document model behind `client`, when emitted.
    pub client_module: Option<TsModule>,
}

/// Compile a structured schema document and route descriptors.
pub fn compile(
    input: &SchemaInput,
    descriptors: &[RouteDescriptor],
    config: &GeneratorConfig,
) -> Result<GeneratedOutput> {
    let schema = StructuredExtractor::new(SchemaFilter::from_config(config)).extract(input)?;
    compile_schema(schema, routes::extract_routes(descriptors), config)
}

/// Compile schema declaration text and route descriptors.
pub fn compile_declarations(
    sources: &DeclarationSources,
    descriptors: &[RouteDescriptor],
    config: &GeneratorConfig,
) -> Result<GeneratedOutput> {
    let schema = DeclarationExtractor::new(SchemaFilter::from_config(config)).extract(sources)?;
    compile_schema(schema, routes::extract_routes(descriptors), config)
}

/// Synthesize and emit both modules from already extracted IR.
pub fn compile_schema(
    schema: ParsedSchema,
    routes: RouteSet,
    config: &GeneratorConfig,
) -> Result<GeneratedOutput> {
    let schema_hash = hash::schema_hash(&schema, &routes)?;
    let types_module = codegen::synthesize_types(&schema, &routes, &schema_hash);
    let client_module = config.emit_client.then(|| {
        codegen::synthesize_client(&schema, &routes, &types_module, config, &schema_hash)
    });

    let types = types_module.emit();
    let client = client_module.as_ref().map(Emit::emit).unwrap_or_default();
    info!(
        entities = schema.entities.len(),
        components = schema.components.len(),
        routes = routes.routes.len(),
        schema_hash = %schema_hash,
        "Generated TypeScript output."
    );

    Ok(GeneratedOutput {
        types,
        client,
        schema_hash,
        generated_at: hash::generated_at(),
        types_module,
        client_module,
    })
}
