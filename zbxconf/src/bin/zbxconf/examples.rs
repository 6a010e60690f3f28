use crate::commands::{config, render, rules, schema, send};
use crate::theme::{ICONS, THEME, paint};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "render",
            groups: render::EXAMPLES,
        },
        CommandExample {
            name: "schema",
            groups: schema::EXAMPLES,
        },
        CommandExample {
            name: "rules",
            groups: rules::EXAMPLES,
        },
        CommandExample {
            name: "config",
            groups: config::EXAMPLES,
        },
        CommandExample {
            name: "send",
            groups: send::EXAMPLES,
        },
    ]
}

/// Help appendix listing `groups`, one indented line per command.
pub fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let mut sections = vec![paint("Examples:", THEME.heading, true, use_color)];
    for group in groups {
        let mut lines = vec![format!("  {}", paint(group.title, THEME.accent, true, use_color))];
        lines.extend(group.commands.iter().map(|command| {
            format!(
                "    {} {}",
                paint(ICONS.arrow, THEME.command, false, use_color),
                paint(command, THEME.command, false, use_color)
            )
        }));
        sections.push(lines.join("\n"));
    }
    sections.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subcommand_has_examples() {
        for example in command_examples() {
            assert!(!example.groups.is_empty(), "{} has examples", example.name);
        }
    }

    #[test]
    fn test_plain_examples_render() {
        let text = render_examples(rules::EXAMPLES, false);
        assert!(text.starts_with("Examples:\n  Pruning Rules\n    → zbxconf rules"));
    }
}
