use crate::fields::Field;
use crate::registry::{Arrangement, ModelDecl};

const SHOW_HIDE: [(i32, &str); 2] = [(0, "hide"), (1, "show")];

pub fn declarations() -> Vec<ModelDecl> {
    vec![
        ModelDecl::new("Graph")
            .tag("graph")
            .positional("name")
            .referenced_by("name")
            .arrange(Arrangement::Sequence {
                items: "graph_items".into(),
                position: "sortorder".into(),
            })
            .field("name", Field::new())
            .field("width", Field::new().default(900))
            .field("height", Field::new().default(200))
            .field("yaxismin", Field::new().default(0.0))
            .field("yaxismax", Field::new().default(0.0))
            .field("show_work_period", Field::new().default(1).choices(&SHOW_HIDE))
            .field("show_triggers", Field::new().default(1).choices(&SHOW_HIDE))
            .field(
                "type",
                Field::new()
                    .default("normal")
                    .choices(&[(0, "normal"), (1, "stacked"), (2, "pie"), (3, "exploded")]),
            )
            .field("show_legend", Field::new().default(1).choices(&SHOW_HIDE))
            .field("show_3d", Field::new().default(0).choices(&[(0, "2d"), (1, "3d")]))
            .field("percent_left", Field::new().default(0.0))
            .field("percent_right", Field::new().default(0.0))
            .field(
                "ymin_type",
                Field::new()
                    .default(0)
                    .choices(&[(0, "calculated"), (1, "fixed"), (2, "item")]),
            )
            .field("ymin_item_1", Field::new().default(0))
            .field("ymax_item_1", Field::new().default(0))
            .field("graph_items", Field::set("GraphItem")),
        ModelDecl::new("GraphItem")
            .tag("graph_item")
            .positional("item")
            .field("sortorder", Field::new().default(0))
            .field("color", Field::color())
            .field(
                "yaxisside",
                Field::new().default(1).choices(&[(0, "left side"), (1, "right side")]),
            )
            .field(
                "calc_fnc",
                Field::new().default(2).choices(&[
                    (1, "minimum value"),
                    (2, "average value"),
                    (4, "maximum value"),
                    (9, "last value, used only by pie and exploded graphs"),
                ]),
            )
            .field(
                "drawtype",
                Field::new().default(0).choices(&[
                    (0, "line"),
                    (1, "filled region"),
                    (2, "bold line"),
                    (3, "dot"),
                    (4, "dashed line"),
                    (5, "gradient line"),
                ]),
            )
            .field(
                "type",
                Field::new()
                    .default(0)
                    .choices(&[(0, "simple"), (2, "graph sum, used only by pie and exploded graphs")]),
            )
            .field("item", Field::reference("Item")),
    ]
}
