use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use zbxconf::DefaultRules;

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Pruning Rules",
    commands: &[
        "zbxconf rules                                  # Effective default-pruning rules",
        "zbxconf --config ./zbxconf.toml rules          # Rules after applying a config file",
        "zbxconf --output json rules                    # Rules as JSON",
    ],
}];

#[derive(Serialize)]
struct RuleTable {
    #[serde(flatten)]
    rules: DefaultRules,
}

impl TableDisplay for RuleTable {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table(&["#", "Path", "Default"]);
        for (index, rule) in self.rules.iter().enumerate() {
            table.add_row(vec![
                Cell::new(index + 1),
                Cell::new(&rule.path),
                Cell::new(rule.value.render()),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.rules
            .iter()
            .map(|rule| format!("{}={}", rule.path, rule.value.render()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn handle_rules(ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let rules = ctx.rules();
    if ctx.config.rules.replace {
        output.warning("Standard rules replaced by the config file");
    }
    output.heading(&format!("Default-pruning rules ({})", rules.len()));
    output.display(&RuleTable { rules })
}
