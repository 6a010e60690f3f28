//! Template for the Circus process manager: plain items, one graph per item,
//! a screen holding every graph and a per-worker discovery rule.

use crate::catalogue;
use crate::errors::ConfigResult;
use crate::fields;
use crate::model::Entity;

pub const TEMPLATE: &str = "Template - Generic - Circus Process Manager";
const APPLICATION: &str = "Circus server usage";

/// `(name, key, value_type, units, description)`
const ITEMS: [(&str, &str, Option<&str>, &str, &str); 7] = [
    ("Circus - Number of processes", "circus.numprocesses", None, "", "Total number of circusd processes"),
    ("Circus - Number of children", "circus.dstats.children", None, "", "Total number of circusd children"),
    (
        "Circus - Memory usage",
        "circus.dstats.mem",
        Some("numeric_float"),
        "%",
        "Percentage of circusd process memory usage",
    ),
    (
        "Circus - RSS Memory",
        "circus.dstats.mem_info1",
        Some("numeric_float"),
        "M",
        "Resident Set Size Memory in bytes (RSS)",
    ),
    (
        "Circus - VMS Memory",
        "circus.dstats.mem_info2",
        Some("numeric_float"),
        "M",
        "Resident Set Size Memory in bytes (VMS)",
    ),
    (
        "Circus - CPU usage",
        "circus.dstats.cpu",
        Some("numeric_float"),
        "%",
        "Percentage of circusd process CPU usage",
    ),
    ("Circus - Nice", "circus.dstats.nice", None, "", "Niceness of the circusd process (between -20 and 20)"),
];

/// `(key, name, value_type, units, description, graph)`
const PROTOTYPES: [(&str, &str, Option<&str>, &str, &str, &str); 5] = [
    (
        "circus.worker.sum.numprocesses[{#WORKER}]",
        "Processes count for $1",
        None,
        "",
        "Processes count for all worker processes",
        "Circus - Processes count for {#WORKER}",
    ),
    (
        "circus.worker.sum.mem[{#WORKER}]",
        "Memory usage for $1",
        Some("numeric_float"),
        "%",
        "Percentage of worker processes memory usage",
        "Circus - Memory usage for {#WORKER}",
    ),
    (
        "circus.worker.sum.mem_info1[{#WORKER}]",
        "RSS Memory usage for $1",
        Some("numeric_float"),
        "M",
        "Resident Set Size Memory in bytes (RSS) for all worker processes",
        "Circus - RSS Memory usage for {#WORKER}",
    ),
    (
        "circus.worker.sum.mem_info2[{#WORKER}]",
        "VMS Memory usage for $1",
        Some("numeric_float"),
        "M",
        "Resident Set Size Memory in bytes (VMS) for all worker processes",
        "Circus - VMS Memory usage for {#WORKER}",
    ),
    (
        "circus.worker.sum.cpu[{#WORKER}]",
        "CPU usage for $1",
        Some("numeric_float"),
        "%",
        "Percentage of CPU usage of a worker",
        "Circus - CPU usage for {#WORKER}",
    ),
];

fn discovery(template: &Entity) -> ConfigResult<()> {
    let rule = template
        .collection("discovery_rules")?
        .new("Circus discovery", fields! { "key" => "circus.discovery" })?;
    let prototypes = rule.collection("item_prototypes")?;
    let graphs = rule.collection("graph_prototypes")?;

    for (key, name, value_type, units, description, graph) in PROTOTYPES {
        let mut fields = fields! {
            "key" => key,
            "name" => name,
            "units" => units,
            "description" => description,
            "applications" => [APPLICATION],
        };
        if let Some(value_type) = value_type {
            fields.insert("value_type", value_type);
        }
        let prototype = prototypes.create(fields)?;
        graphs.new(graph, fields!())?.collection("graph_items")?.new(&prototype, fields!())?;
    }
    Ok(())
}

/// Build the Circus template document.
pub fn generate() -> ConfigResult<Entity> {
    let doc = catalogue::document()?;
    let template = doc.collection("templates")?.new(
        TEMPLATE,
        fields! {
            "groups" => ["Templates - Services"],
            "applications" => [APPLICATION],
        },
    )?;

    let items = template.collection("items")?;
    let graphs = template.collection("graphs")?;
    let screen = template.collection("screens")?.new("Generic Screen - Circus", fields!())?;
    let screen_items = screen.collection("screen_items")?;

    for (name, key, value_type, units, description) in ITEMS {
        let mut fields = fields! {
            "name" => name,
            "key" => key,
            "units" => units,
            "description" => description,
            "applications" => [APPLICATION],
        };
        if let Some(value_type) = value_type {
            fields.insert("value_type", value_type);
        }
        let item = items.create(fields)?;
        let graph = graphs.new(name, fields!())?;
        graph.collection("graph_items")?.new(&item, fields!())?;
        screen_items.new(&graph, fields!())?;
    }

    discovery(&template)?;
    Ok(doc)
}
