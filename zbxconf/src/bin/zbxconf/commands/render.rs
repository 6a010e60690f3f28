use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Args;
use serde::Serialize;

use zbxconf::examples;

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;
use crate::theme::ICONS;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Render",
        commands: &[
            "zbxconf render circus                          # Print the circus template as XML",
            "zbxconf render cluster --output-file out.xml   # Write the cluster document to a file",
        ],
    },
    ExampleGroup {
        title: "Split",
        commands: &[
            "zbxconf render circus --split                  # Print every import fragment",
            "zbxconf render circus --split --output-dir out # One file per fragment",
            "zbxconf --output json render circus --split    # Fragments as JSON",
        ],
    },
];

#[derive(Args)]
pub struct RenderArgs {
    /// Bundled example to render
    #[arg(value_parser = clap::builder::PossibleValuesParser::new(examples::NAMES))]
    pub example: String,

    /// Cut the document into import fragments
    #[arg(long)]
    pub split: bool,

    /// Write the document to this file instead of stdout
    #[arg(long, conflicts_with = "split")]
    pub output_file: Option<PathBuf>,

    /// Write one file per fragment into this directory
    #[arg(long, requires = "split")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Serialize)]
struct FragmentOutput {
    kind: zbxconf::FragmentKind,
    name: String,
    path: &'static str,
    xml: String,
}

pub fn handle_render(args: RenderArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let document = examples::generate(&args.example)
        .ok_or_else(|| anyhow!("Unknown example '{}'", args.example))?
        .with_context(|| format!("Failed to build the '{}' example", args.example))?;
    let mut compiler = ctx.compiler();
    output.verbose(&format!("Compiling with {} pruning rules", compiler.rules().len()));

    if !args.split {
        let xml = compiler.render(&document).context("Failed to compile document")?;
        match args.output_file {
            Some(path) => {
                write_file(&path, &xml)?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => output.raw(&xml),
        }
        return Ok(());
    }

    let fragments = compiler.fragments(&document).context("Failed to split document")?;
    let mut rendered = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        rendered.push(FragmentOutput {
            kind: fragment.kind,
            path: fragment.kind.path(),
            xml: compiler.dumps(&fragment.document)?,
            name: fragment.name,
        });
    }

    if let Some(dir) = args.output_dir {
        std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        for (index, fragment) in rendered.iter().enumerate() {
            let path = dir.join(fragment_file_name(index, fragment));
            write_file(&path, &fragment.xml)?;
            output.verbose(&format!("{} {}", ICONS.file, path.display()));
        }
        output.success(&format!("Wrote {} fragments to {}", rendered.len(), dir.display()));
        return Ok(());
    }

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
        return Ok(());
    }

    for fragment in &rendered {
        output.info(&format!("xml for: {} {}", fragment.path, fragment.name));
        output.raw(&fragment.xml);
    }
    Ok(())
}

fn fragment_file_name(index: usize, fragment: &FragmentOutput) -> String {
    let kind = fragment.path.replace('/', "_");
    let name: String = fragment
        .name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{:03}_{kind}_{name}.xml", index + 1)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_file_name_is_sanitized() {
        let fragment = FragmentOutput {
            kind: zbxconf::FragmentKind::TemplateScreen,
            name: "Generic Screen - Circus".to_string(),
            path: zbxconf::FragmentKind::TemplateScreen.path(),
            xml: String::new(),
        };
        assert_eq!(
            fragment_file_name(4, &fragment),
            "005_templates_template_screens_screen_Generic_Screen_-_Circus.xml"
        );
    }
}
