use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};
use serde::Serialize;

use zbxconf::catalogue;
use zbxconf::{FieldKind, ModelRef};

use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Schema Listing",
        commands: &["zbxconf schema list                            # Every model in the standard catalogue"],
    },
    ExampleGroup {
        title: "Schema Details",
        commands: &[
            "zbxconf schema show Item                       # Field table of the Item model",
            "zbxconf --output json schema show Screen       # Field table as JSON",
        ],
    },
];

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// List the models of the standard catalogue
    #[command(name = "list")]
    List,

    /// Show the ordered field table of one model
    #[command(name = "show")]
    Show {
        /// Model name, e.g. Item or ScreenItem
        model: String,
    },
}

#[derive(Serialize)]
struct ModelSummary {
    name: String,
    tag: String,
    fields: usize,
    positional: Option<String>,
    referenced_by: Vec<String>,
    host_scope: bool,
}

impl ModelSummary {
    fn from_model(model: &ModelRef) -> Self {
        let schema = model.schema();
        Self {
            name: schema.name.clone(),
            tag: schema.tag.clone(),
            fields: schema.fields.len(),
            positional: schema.positional.clone(),
            referenced_by: schema
                .reference
                .as_ref()
                .map(|shape| vec![shape.field.clone()])
                .unwrap_or_default(),
            host_scope: schema.host_scope,
        }
    }
}

#[derive(Serialize)]
struct ModelList(Vec<ModelSummary>);

impl TableDisplay for ModelList {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table(&["Model", "Tag", "Fields", "Positional", "Referenced by", "Host scope"]);
        for model in &self.0 {
            table.add_row(vec![
                Cell::new(&model.name),
                Cell::new(&model.tag),
                Cell::new(model.fields),
                Cell::new(model.positional.as_deref().unwrap_or("-")),
                Cell::new(if model.referenced_by.is_empty() { "-".to_string() } else { model.referenced_by.join(", ") }),
                Cell::new(if model.host_scope { "yes" } else { "" }),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.0.iter().map(|model| model.name.as_str()).collect::<Vec<_>>().join(" ")
    }
}

#[derive(Serialize)]
struct FieldRow {
    name: String,
    kind: &'static str,
    target: Option<String>,
    default: Option<String>,
    choices: Vec<String>,
    validators: Vec<&'static str>,
    description: Option<String>,
}

#[derive(Serialize)]
struct ModelDetail {
    #[serde(flatten)]
    summary: ModelSummary,
    field_table: Vec<FieldRow>,
}

impl ModelDetail {
    fn from_model(model: &ModelRef) -> Self {
        let field_table = model
            .schema()
            .fields
            .iter()
            .map(|field| FieldRow {
                name: field.name.clone(),
                kind: field.kind.label(),
                target: match &field.kind {
                    FieldKind::Set { model, .. } | FieldKind::Reference { model, .. } => Some(model.clone()),
                    FieldKind::Elastic { size_field, items_field } => Some(format!("{items_field} / {size_field}")),
                    _ => None,
                },
                default: field.default.as_ref().map(|value| value.render()),
                choices: field
                    .choices
                    .iter()
                    .map(|choice| format!("{}={}", choice.code.render(), choice.label))
                    .collect(),
                validators: field.validator_names(),
                description: field.description.clone(),
            })
            .collect();
        Self {
            summary: ModelSummary::from_model(model),
            field_table,
        }
    }
}

impl TableDisplay for ModelDetail {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table(&["Field", "Kind", "Target", "Default", "Choices", "Validators"]);
        for field in &self.field_table {
            table.add_row(vec![
                Cell::new(&field.name),
                Cell::new(field.kind),
                Cell::new(field.target.as_deref().unwrap_or("")),
                Cell::new(field.default.as_deref().unwrap_or("")),
                Cell::new(field.choices.join("\n")),
                Cell::new(field.validators.join(", ")),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        let names: Vec<&str> = self.field_table.iter().map(|field| field.name.as_str()).collect();
        format!("{}: {}", self.summary.name, names.join(" "))
    }
}

pub fn handle_schema_commands(command: SchemaCommands, output: &OutputManager) -> Result<()> {
    let registry = catalogue::standard().context("Failed to build the standard catalogue")?;

    match command {
        SchemaCommands::List => {
            let models: Vec<ModelSummary> = registry.models().iter().map(ModelSummary::from_model).collect();
            output.heading(&format!("Standard catalogue ({} models)", models.len()));
            output.display(&ModelList(models))?;
        }
        SchemaCommands::Show { model } => {
            let model = registry.model(&model)?;
            output.heading(&format!("{} <{}>", model.name(), model.tag()));
            if let Some(positional) = &model.schema().positional {
                output.key_value("positional", positional);
            }
            let detail = ModelDetail::from_model(&model);
            for field in detail.field_table.iter().filter(|field| field.description.is_some()) {
                output.bullet(&format!("{}: {}", field.name, field.description.as_deref().unwrap_or_default()));
            }
            output.display(&detail)?;
        }
    }

    Ok(())
}
