//! `cms-typegen`: drive the compiler from files on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use cms_typegen_core::routes::{descriptors_from_json, load_declared_routes};
use cms_typegen_core::{
    CompileError, DeclarationSources, GeneratedOutput, GeneratorConfig, RouteDescriptor,
    SchemaInput, compile, compile_declarations,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const CONTENT_TYPES_FILE: &str = "contentTypes.d.ts";
const COMPONENTS_FILE: &str = "components.d.ts";

#[derive(Parser, Debug)]
#[command(
    name = "cms-typegen",
    version,
    about = "Generate TypeScript types and a typed client from a CMS content schema"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate types.ts, client.ts and meta.json
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with = "declarations",
        required_unless_present = "declarations",
        help = "Structured schema JSON ({ entities, components })"
    )]
    schema: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        help = "Directory holding contentTypes.d.ts and components.d.ts"
    )]
    declarations: Option<PathBuf>,
    #[arg(long, value_name = "FILE", help = "Route descriptors JSON array")]
    routes: Option<PathBuf>,
    #[arg(
        long = "route-module",
        value_name = "FILE",
        help = "Routes module (export default { routes: [...] }); repeatable"
    )]
    route_modules: Vec<PathBuf>,
    #[arg(
        long = "route-types",
        value_name = "FILE",
        help = "Type declarations for the actions of --route-module routes"
    )]
    route_types: Option<PathBuf>,
    #[arg(long, value_name = "FILE", help = "Generator configuration (TOML)")]
    config: Option<PathBuf>,
    #[arg(long, value_name = "DIR", default_value = "generated", help = "Output directory")]
    out: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn read(path: &Path) -> Result<String, CompileError> {
    fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), CompileError> {
    fs::write(path, contents).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = contents.len(), "Wrote output file.");
    Ok(())
}

fn load_routes(args: &GenerateArgs) -> Result<Vec<RouteDescriptor>, CompileError> {
    let mut descriptors = match &args.routes {
        Some(path) => descriptors_from_json(&read(path)?)?,
        None => Vec::new(),
    };
    let route_types = args.route_types.as_deref().map(read).transpose()?;
    for module in &args.route_modules {
        descriptors.extend(load_declared_routes(
            &read(module)?,
            route_types.as_deref(),
            None,
        )?);
    }
    Ok(descriptors)
}

fn run_generate(args: &GenerateArgs) -> Result<GeneratedOutput, CompileError> {
    let config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    let routes = load_routes(args)?;

    let output = match (&args.schema, &args.declarations) {
        (Some(schema), _) => compile(&SchemaInput::from_json(&read(schema)?)?, &routes, &config)?,
        (None, Some(dir)) => {
            let components = dir.join(COMPONENTS_FILE);
            let sources = DeclarationSources {
                content_types: read(&dir.join(CONTENT_TYPES_FILE))?,
                components: if components.exists() {
                    read(&components)?
                } else {
                    String::new()
                },
            };
            compile_declarations(&sources, &routes, &config)?
        }
        (None, None) => {
            return Err(CompileError::InvalidSchema(
                "either --schema or --declarations is required".into(),
            ));
        }
    };

    fs::create_dir_all(&args.out).map_err(|source| CompileError::Io {
        path: args.out.clone(),
        source,
    })?;
    write(&args.out.join("types.ts"), &output.types)?;
    if config.emit_client {
        write(&args.out.join("client.ts"), &output.client)?;
    }
    let meta = serde_json::json!({
        "schemaHash": output.schema_hash,
        "generatedAt": output.generated_at,
    });
    write(&args.out.join("meta.json"), &serde_json::to_string_pretty(&meta)?)?;

    info!(
        out = %args.out.display(),
        schema_hash = %output.schema_hash,
        "Generation complete."
    );
    Ok(output)
}

/// Exit code per failure category: 1 invalid input, 3 bad configuration,
/// 4 file access. Usage errors exit with clap's code 2.
fn exit_code(err: &CompileError) -> u8 {
    match err {
        CompileError::InvalidSchema(_)
        | CompileError::InvalidDeclarations(_)
        | CompileError::InvalidRoutes(_)
        | CompileError::Json(_) => 1,
        CompileError::Config(_) => 3,
        CompileError::Io { .. } => 4,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Generate(args) => match run_generate(&args) {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                error!(error = %err, "Generation failed.");
                eprintln!("{err}");
                ExitCode::from(exit_code(&err))
            }
        },
    }
}
