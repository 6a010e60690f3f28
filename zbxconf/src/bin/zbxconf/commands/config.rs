use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Configuration",
    commands: &[
        "zbxconf config                                 # Show the effective configuration",
        "zbxconf --config ci/zbxconf.toml config        # Show a specific config file",
    ],
}];

#[derive(Serialize)]
struct ConfigSummary {
    file: Option<String>,
    version: String,
    indent: usize,
    rules: usize,
    rules_replaced: bool,
    api_url: String,
    api_user: String,
    sender_server: String,
}

impl TableDisplay for ConfigSummary {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table(&["Setting", "Value"]);
        let rows = [
            ("file", self.file.clone().unwrap_or_else(|| "(defaults)".to_string())),
            ("export.version", self.version.clone()),
            ("export.indent", self.indent.to_string()),
            ("rules", self.rules.to_string()),
            ("rules.replace", self.rules_replaced.to_string()),
            ("api.url", self.api_url.clone()),
            ("api.user", self.api_user.clone()),
            ("sender.server", self.sender_server.clone()),
        ];
        for (key, value) in rows {
            table.add_row(vec![Cell::new(key), Cell::new(value)]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "version={} indent={} rules={} api={} sender={}",
            self.version, self.indent, self.rules, self.api_url, self.sender_server
        )
    }
}

pub fn handle_config(ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let api_url = ctx.api_url().unwrap_or_else(|err| {
        output.warning(&err.to_string());
        ctx.config.api.url.clone()
    });
    let sender_server = ctx.sender_server().unwrap_or_else(|err| {
        output.warning(&err.to_string());
        ctx.config.sender.server.clone()
    });
    let summary = ConfigSummary {
        file: ctx.config_path.as_ref().map(|path| path.display().to_string()),
        version: ctx.config.export.version.clone(),
        indent: ctx.config.export.indent,
        rules: ctx.rules().len(),
        rules_replaced: ctx.config.rules.replace,
        api_url,
        api_user: ctx.config.api.user.clone(),
        sender_server,
    };
    output.heading("Configuration");
    output.display(&summary)
}
