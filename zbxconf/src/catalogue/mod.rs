//! The standard model catalogue for the 2.0 export format.
//!
//! [`standard`] builds the registry once per process and hands out shared
//! handles to it. [`declarations`] exposes the raw declarations so callers can
//! extend the catalogue with models of their own before building.

pub mod discovery;
pub mod graph;
pub mod hosts;
pub mod items;
pub mod screen;
pub mod tagging;

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::errors::{ConfigResult, SchemaError};
use crate::fields::Field;
use crate::model::Entity;
use crate::registry::{ModelDecl, Registry, SchemaBuilder};

pub use items::{avg_item, item_expression, sum_item};

static STANDARD: Lazy<Result<Arc<Registry>, SchemaError>> =
    Lazy::new(|| SchemaBuilder::new().extend(declarations()).build());

fn document_declarations() -> Vec<ModelDecl> {
    vec![
        ModelDecl::new("Config")
            .tag("zabbix_export")
            .document()
            .field("templates", Field::set("Template"))
            .field("graphs", Field::set("Graph"))
            .field("hosts", Field::set("Host"))
            .field("screens", Field::set("Screen")),
        ModelDecl::new("Trigger")
            .tag("trigger")
            .positional("name")
            .field("name", Field::new())
            .field("expression", Field::new())
            .field("status", Field::new().default(0).choices(&[(0, "enabled"), (1, "disabled")]))
            .field(
                "priority",
                Field::new().default(0).choices(&[
                    (0, "not classified"),
                    (1, "information"),
                    (2, "warning"),
                    (3, "average"),
                    (4, "high"),
                    (5, "disaster"),
                ]),
            )
            .field(
                "type",
                Field::new().default(0).choices(&[
                    (0, "do not generate multiple events"),
                    (1, "generate multiple events"),
                ]),
            ),
    ]
}

/// Every standard model declaration.
pub fn declarations() -> Vec<ModelDecl> {
    let mut decls = document_declarations();
    decls.extend(tagging::declarations());
    decls.extend(hosts::declarations());
    decls.extend(items::declarations());
    decls.extend(graph::declarations());
    decls.extend(screen::declarations());
    decls.extend(discovery::declarations());
    decls
}

/// The standard registry, built on first use.
pub fn standard() -> ConfigResult<Arc<Registry>> {
    STANDARD.as_ref().map(Arc::clone).map_err(|err| err.clone().into())
}

/// An empty document root from the standard catalogue.
pub fn document() -> ConfigResult<Entity> {
    standard()?.instantiate("Config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalogue_builds() {
        let registry = standard().expect("catalogue builds");
        for name in ["Config", "Template", "Host", "Item", "AggregateItem", "Graph", "Screen", "DiscoveryRule"] {
            assert!(registry.model(name).is_ok(), "{name} is declared");
        }
        let aggregate = registry.model("AggregateItem").expect("declared");
        assert_eq!(aggregate.tag(), "item");
        assert!(aggregate.is_a(&registry.model("Item").expect("declared")));
    }

    #[test]
    fn standard_catalogue_is_shared() {
        let first = standard().expect("catalogue builds");
        let second = standard().expect("catalogue builds");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
