use std::fs;
use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use textedit_mcp::config::Config;
use textedit_mcp::mcp::{Server, Tools};
use textedit_mcp::output;
use textedit_mcp::{Converter, TemplateRegistry};

#[derive(Parser)]
#[command(name = "textedit-mcp")]
#[command(about = "Convert formatting markup to RTF documents, standalone or as an MCP tool")]
struct Cli {
    /// Config file (defaults to ~/.config/textedit-mcp/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the create_rtf_document tool over stdin/stdout (default)
    Serve,

    /// Convert a markup file to RTF
    Convert {
        /// Input markup file
        input: PathBuf,

        /// Output RTF file (defaults to input name with .rtf extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Template to format with
        #[arg(short, long)]
        template: Option<String>,
    },

    /// List available templates
    Templates,
}

fn main() {
    // stdout carries the protocol, so logs go to stderr; RUST_LOG overrides
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?
            .ok_or_else(|| format!("config file {} not found", path.display()))?,
        None => Config::load()?,
    };

    let mut registry = TemplateRegistry::builtin()?;
    if let Some(templates_file) = &config.templates_file {
        registry.load_file(templates_file)?;
        log::info!("loaded templates from {}", templates_file.display());
    }
    if !registry.contains(&config.conversion.default_template) {
        log::warn!(
            "default template '{}' is not defined; requests without a template will fail",
            config.conversion.default_template
        );
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let converter = Converter::new(registry, config.conversion.parse_options());
            let tools = Tools::new(
                converter,
                config.conversion.default_template.clone(),
                config.output.create_dirs,
            );
            let server = Server::new(config.server.name.clone(), tools);
            server.run(io::stdin().lock(), io::stdout().lock())?;
        }
        Command::Convert {
            input,
            output,
            template,
        } => {
            let markup = fs::read_to_string(&input)
                .map_err(|e| format!("reading {}: {}", input.display(), e))?;

            let converter = Converter::new(registry, config.conversion.parse_options());
            let template = template.unwrap_or(config.conversion.default_template);
            let bytes = converter.convert(&markup, Some(&template))?;

            let output = output.unwrap_or_else(|| input.with_extension("rtf"));
            output::write_document(&output, &bytes, config.output.create_dirs)?;

            println!("Created {}", output.display());
        }
        Command::Templates => {
            for (name, template) in registry.iter() {
                println!("{:<12} {}", name, template.description);
            }
        }
    }

    Ok(())
}
