use crate::fields::Field;
use crate::registry::ModelDecl;

/// Tag-like models: equal when their names are equal.
pub fn declarations() -> Vec<ModelDecl> {
    vec![
        ModelDecl::new("Application")
            .tag("application")
            .positional("name")
            .identity(&["name"])
            .field("name", Field::new()),
        ModelDecl::new("Group")
            .tag("group")
            .positional("name")
            .identity(&["name"])
            .field("name", Field::new()),
    ]
}
