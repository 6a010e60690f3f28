//! A small web cluster: two hosts linked by name to a shared template,
//! aggregate items over the cluster group and a per-host screen.

use crate::catalogue::{self, avg_item, item_expression, sum_item};
use crate::errors::ConfigResult;
use crate::fields;
use crate::model::Entity;

pub const GROUP: &str = "Web servers";
pub const TEMPLATE: &str = "Template - Web Cluster";
const HOSTS: [(&str, &str); 2] = [("web-1", "10.0.0.1:10050"), ("web-2", "web-2.example.net")];

fn cluster_template(doc: &Entity) -> ConfigResult<()> {
    let template = doc.collection("templates")?.new(
        TEMPLATE,
        fields! {
            "groups" => ["Templates - Services"],
            "applications" => ["Cluster"],
        },
    )?;
    let items = template.collection("items")?;
    let load = items.create(fields! {
        "name" => "CPU load",
        "key" => "system.cpu.load[percpu,avg1]",
        "type" => "Zabbix agent",
        "value_type" => "numeric_float",
        "applications" => ["Cluster"],
    })?;
    avg_item(&items, "Cluster CPU load", GROUP, fields! { "key" => "system.cpu.load[percpu,avg1]" })?;
    sum_item(
        &items,
        "Cluster connections",
        [GROUP],
        fields! { "key" => "nginx.connections", "timeperiod" => 300 },
    )?;

    template.collection("triggers")?.new(
        "High CPU load on {HOST.NAME}",
        fields! {
            "expression" => format!("{{{}.avg(5m)}}>5", item_expression(&load)?),
            "priority" => "warning",
        },
    )?;
    Ok(())
}

/// Build the web cluster document.
pub fn generate() -> ConfigResult<Entity> {
    let doc = catalogue::document()?;
    cluster_template(&doc)?;

    for (name, ident) in HOSTS {
        let host = doc.collection("hosts")?.new(
            name,
            fields! {
                "groups" => [GROUP],
                "interfaces" => [ident],
                "templates" => [TEMPLATE],
            },
        )?;
        let traffic = host.collection("items")?.create(fields! {
            "name" => "Incoming traffic",
            "key" => "net.if.in[eth0]",
            "units" => "bps",
            "delta" => "delta_per_second",
        })?;
        let graph = host.collection("graphs")?.new("Network traffic", fields! { "type" => "stacked" })?;
        graph.collection("graph_items")?.new(&traffic, fields! { "drawtype" => 1 })?;
        host.collection("screens")?
            .new(format!("{name} overview"), fields! { "hsize" => 1 })?
            .collection("screen_items")?
            .new(&graph, fields!())?;
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Binding;
    use crate::types::Value;

    #[test]
    fn hosts_link_the_template_by_name() {
        let doc = generate().expect("cluster builds");
        let hosts = doc.collection("hosts").expect("set");
        assert_eq!(hosts.len(), 2);
        let first = hosts.get(0).expect("host");
        let linked = first.collection("templates").expect("set").get(0).expect("linked");
        assert_eq!(linked.text("name").as_deref(), Some(TEMPLATE));
        assert!(linked.collection("items").expect("set").is_empty());

        let interface = first.collection("interfaces").expect("set").get(0).expect("interface");
        assert_eq!(interface.get("port").expect("field"), Some(Value::from(10050)));
    }

    #[test]
    fn screen_resources_resolve_with_host() {
        let doc = generate().expect("cluster builds");
        let host = doc.collection("hosts").expect("set").get(1).expect("host");
        let screen = host.collection("screens").expect("set").get(0).expect("screen");
        let item = screen.collection("screen_items").expect("set").get(0).expect("item");
        let resource = item.reference("resource").expect("reference");
        assert!(matches!(resource.binding(), Binding::Entity(_)));
        let identity = resource.resolve().expect("resolves");
        assert_eq!(identity.get("name"), Some(&Value::from("Network traffic")));
        assert_eq!(identity.get("host"), Some(&Value::from("web-2")));
    }
}
