use crate::errors::ConfigResult;
use crate::fields::Field;
use crate::registry::{Arrangement, ModelDecl};
use crate::types::Fields;

/// `graph` is accepted as an alias of `resource`.
fn graph_alias(fields: &mut Fields) -> ConfigResult<()> {
    if let Some(graph) = fields.remove("graph") {
        if !graph.is_null() {
            fields.insert("resource", graph);
        }
    }
    Ok(())
}

pub fn declarations() -> Vec<ModelDecl> {
    vec![
        ModelDecl::new("Screen")
            .tag("screen")
            .positional("name")
            .arrange(Arrangement::Grid {
                items: "screen_items".into(),
                columns: "hsize".into(),
                x: "x".into(),
                y: "y".into(),
            })
            .field("name", Field::new())
            .field("screen_items", Field::set("ScreenItem"))
            .field("hsize", Field::fixed_size(1).default(3))
            .field("vsize", Field::elastic("hsize", "screen_items")),
        ModelDecl::new("ScreenItem")
            .tag("screen_item")
            .positional("graph")
            .prepare(graph_alias)
            .field(
                "resourcetype",
                Field::new().default(0).choices(&[
                    (0, "graph"),
                    (1, "simple graph"),
                    (2, "map"),
                    (3, "plain text"),
                    (4, "hosts info"),
                    (5, "triggers info"),
                    (6, "server info"),
                    (7, "clock"),
                    (8, "screen"),
                    (9, "triggers overview"),
                    (10, "data overview"),
                    (11, "URL"),
                    (12, "history of actions"),
                    (13, "history of events"),
                    (14, "status of host group triggers"),
                    (15, "system status"),
                    (16, "status of host triggers"),
                ]),
            )
            .field("width", Field::new().default(320))
            .field("height", Field::new().default(200))
            .field("x", Field::new())
            .field("y", Field::new())
            .field("colspan", Field::new().default(1))
            .field("rowspan", Field::new().default(1))
            .field("resource", Field::reference("Graph").append_host())
            .field(
                "dynamic",
                Field::new().default(0).choices(&[(0, "not dynamic"), (1, "dynamic")]),
            )
            .field("elements", Field::new().default(25))
            .field(
                "halign",
                Field::new().default(0).choices(&[(0, "center"), (1, "left"), (2, "right")]),
            )
            .field(
                "valign",
                Field::new().default(0).choices(&[(0, "middle"), (1, "top"), (2, "bottom")]),
            )
            .field(
                "sort_triggers",
                Field::new().default(0).choices(&[
                    (0, "last change, descending"),
                    (1, "severity, descending"),
                    (2, "host, ascending"),
                    (3, "time, ascending"),
                    (4, "time, descending"),
                    (5, "type, ascending"),
                    (6, "type, descending"),
                    (7, "status, ascending"),
                    (8, "status, descending"),
                    (9, "retries left, ascending"),
                    (10, "retries left, descending"),
                    (11, "recipient, ascending"),
                    (12, "recipient, descending"),
                ]),
            )
            .field("style", Field::new().default(0)),
    ]
}
