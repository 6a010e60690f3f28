mod commands;
mod context;
mod examples;
mod output;
mod theme;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::control::ShouldColorize;

use commands::{
    config::handle_config,
    render::{RenderArgs, handle_render},
    rules::handle_rules,
    schema::{SchemaCommands, handle_schema_commands},
    send::{SendArgs, handle_send},
};
use context::ProjectContext;
use examples::{command_examples, render_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{THEME, help_styles, paint};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("RUST_LOG", "Log filter, e.g. 'zbxconf=debug'"),
    ("ZABBIX_URL", "API endpoint referenced by the default [api] url"),
];

#[derive(Parser)]
#[command(name = "zbxconf")]
#[command(version)]
#[command(
    about = "Declarative Zabbix configuration compiled into import-ready XML",
    long_about = r#"Declarative Zabbix configuration for 2.0 exports that provides:

• Typed models for hosts, templates, items, graphs, screens and discovery
• Default pruning so documents only carry what differs from the server defaults
• Document splitting into import-sized fragments

Commands:
  render    Compile a bundled example document
  schema    Inspect the standard model catalogue
  rules     List the effective default-pruning rules
  config    Show the effective configuration
  send      Push one value to a trapper port
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Config file (defaults to the nearest zbxconf.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a bundled example document into XML
    Render(RenderArgs),

    /// Inspect the standard model catalogue
    #[command(subcommand)]
    Schema(SchemaCommands),

    /// List the effective default-pruning rules
    Rules,

    /// Show the effective configuration
    Config,

    /// Push one value to a trapper port
    Send(SendArgs),
}

impl Cli {
    /// Parse with themed help and per-command example appendices. Help,
    /// version and usage errors exit through clap.
    fn parse_with_styles() -> Self {
        let matches = cli_command().get_matches();
        Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }
}

fn cli_command() -> Command {
    let use_color = ShouldColorize::from_env().should_colorize();
    let mut command = Cli::command()
        .styles(help_styles())
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never })
        .after_long_help(top_level_appendix(use_color));

    for example in command_examples() {
        if let Some(subcommand) = command.find_subcommand_mut(example.name) {
            *subcommand = subcommand.clone().after_long_help(render_examples(example.groups, use_color));
        }
    }
    command
}

fn top_level_appendix(use_color: bool) -> String {
    let mut lines = vec![paint("Environment Variables:", THEME.heading, true, use_color)];
    lines.extend(ENVIRONMENT_VARIABLES.iter().map(|(key, description)| {
        format!(
            "  {}  {}",
            paint(key, THEME.key, true, use_color),
            paint(description, THEME.value, false, use_color)
        )
    }));
    lines.push(String::new());
    lines.push(format!(
        "{} {}",
        paint("Tip:", THEME.heading, true, use_color),
        paint("Use 'zbxconf <command> --help' to view examples for each command.", THEME.command, false, use_color)
    ));
    lines.join("\n") + "\n"
}

fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();
    let no_color = cli.no_color;

    if let Err(err) = execute(cli) {
        let output = OutputManager::new(GlobalOptions {
            no_color,
            ..Default::default()
        });
        output.error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let global_options = GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };
    if global_options.no_color {
        colored::control::set_override(false);
    }

    let output = OutputManager::new(global_options);
    let ctx = ProjectContext::load(cli.config.as_deref())?;
    if let Some(path) = &ctx.config_path {
        output.verbose(&format!("Using {}", path.display()));
    }

    match cli.command {
        Commands::Render(args) => handle_render(args, &ctx, &output)?,
        Commands::Schema(schema_cmd) => handle_schema_commands(schema_cmd, &output)?,
        Commands::Rules => handle_rules(&ctx, &output)?,
        Commands::Config => handle_config(&ctx, &output)?,
        Commands::Send(args) => handle_send(args, &ctx, &output)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_every_example_targets_a_subcommand() {
        let command = Cli::command();
        for example in command_examples() {
            assert!(command.find_subcommand(example.name).is_some(), "{} exists", example.name);
        }
    }

    #[test]
    fn test_render_split_flags() {
        let cli = Cli::try_parse_from(["zbxconf", "render", "circus", "--split", "--output-dir", "out"])
            .expect("parses");
        assert!(matches!(cli.command, Commands::Render(ref args) if args.split));
        assert!(Cli::try_parse_from(["zbxconf", "render", "circus", "--output-dir", "out"]).is_err());
        assert!(Cli::try_parse_from(["zbxconf", "render", "nginx"]).is_err());
    }
}
