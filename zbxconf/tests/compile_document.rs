use chrono::NaiveDate;
use zbxconf::catalogue;
use zbxconf::fields;
use zbxconf::{Compiler, Entity, Node, Value};

fn pinned() -> Compiler {
    let captured = NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|day| day.and_hms_micro_opt(3, 4, 5, 6))
        .expect("valid timestamp");
    Compiler::new().with_timestamp(captured)
}

fn texts<'a>(root: &'a Node, path: &str) -> Vec<&'a str> {
    root.find_all(path).into_iter().filter_map(|node| node.text.as_deref()).collect()
}

fn template_with_ping() -> (Entity, Entity) {
    let doc = catalogue::document().expect("document");
    let template = doc
        .collection("templates")
        .expect("set")
        .new("Template OS", fields!())
        .expect("added");
    template
        .collection("items")
        .expect("set")
        .create(fields! { "name" => "Ping", "key" => "agent.ping" })
        .expect("added");
    (doc, template)
}

#[test]
fn template_items_compile_under_one_container() {
    let (doc, _) = template_with_ping();
    let root = pinned().compile(&doc).expect("compiles");

    assert_eq!(root.tag, "zabbix_export");
    assert_eq!(texts(&root, "templates/template/items/item/key"), vec!["agent.ping"]);
    let template = root.find("templates/template").expect("template node");
    assert_eq!(template.children_named("items").count(), 1);
}

#[test]
fn header_carries_version_and_pinned_date() {
    let (doc, _) = template_with_ping();
    let root = pinned().compile(&doc).expect("compiles");
    assert_eq!(root.text_at("version"), Some("2.0"));
    assert_eq!(root.text_at("date"), Some("2024-01-02T03:04:05.000006"));

    let root = pinned().with_version("3.0").compile(&doc).expect("compiles");
    assert_eq!(root.text_at("version"), Some("3.0"));
}

#[test]
fn whole_second_dates_carry_no_fraction() {
    let (doc, _) = template_with_ping();
    let on_the_second = NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|day| day.and_hms_opt(3, 4, 5))
        .expect("valid timestamp");
    let root = Compiler::new().with_timestamp(on_the_second).compile(&doc).expect("compiles");
    assert_eq!(root.text_at("date"), Some("2024-01-02T03:04:05"));
}

#[test]
fn default_values_are_pruned() {
    let (doc, template) = template_with_ping();
    template
        .collection("items")
        .expect("set")
        .create(fields! { "name" => "Uptime", "key" => "system.uptime", "history" => 30 })
        .expect("added");
    let root = pinned().compile(&doc).expect("compiles");

    let items = root.find_all("templates/template/items/item");
    assert_eq!(items.len(), 2);
    assert!(items[0].child("history").is_none());
    assert!(items[0].child("status").is_none());
    assert_eq!(items[0].text_at("delay"), Some("60"));
    assert_eq!(items[1].text_at("history"), Some("30"));
}

#[test]
fn groups_roll_up_to_the_root_once() {
    let doc = catalogue::document().expect("document");
    doc.collection("templates")
        .expect("set")
        .new("Template OS", fields! { "groups" => ["Templates"] })
        .expect("added");
    doc.collection("hosts")
        .expect("set")
        .new("web1", fields! { "groups" => ["Templates", "Linux servers"] })
        .expect("added");
    let root = pinned().compile(&doc).expect("compiles");

    assert_eq!(root.children_named("groups").count(), 1);
    assert_eq!(texts(&root, "groups/group/name"), vec!["Templates", "Linux servers"]);
    assert_eq!(texts(&root, "hosts/host/groups/group/name"), vec!["Templates", "Linux servers"]);
}

#[test]
fn graphs_and_triggers_are_hoisted() {
    let doc = catalogue::document().expect("document");
    let host = doc
        .collection("hosts")
        .expect("set")
        .new("web1", fields! { "groups" => ["Linux servers"] })
        .expect("added");
    host.collection("graphs").expect("set").new("CPU", fields!()).expect("added");
    host.collection("triggers")
        .expect("set")
        .new("Down", fields! { "expression" => "{web1:agent.ping.nodata(5m)}=1" })
        .expect("added");
    let root = pinned().compile(&doc).expect("compiles");

    assert!(root.find("hosts/host/graphs").is_none());
    assert!(root.find("hosts/host/triggers").is_none());
    assert_eq!(texts(&root, "graphs/graph/name"), vec!["CPU"]);
    assert_eq!(texts(&root, "triggers/trigger/expression"), vec!["{web1:agent.ping.nodata(5m)}=1"]);
}

#[test]
fn applications_roll_up_into_their_host_scope() {
    let doc = catalogue::document().expect("document");
    let template = doc
        .collection("templates")
        .expect("set")
        .new("Template OS", fields! { "applications" => ["Own"] })
        .expect("added");
    template
        .collection("items")
        .expect("set")
        .create(fields! { "name" => "Ping", "key" => "agent.ping", "applications" => ["Nested", "Own"] })
        .expect("added");
    let root = pinned().compile(&doc).expect("compiles");

    assert_eq!(texts(&root, "templates/template/applications/application/name"), vec!["Own", "Nested"]);
    assert_eq!(
        texts(&root, "templates/template/items/item/applications/application/name"),
        vec!["Nested", "Own"]
    );
}

#[test]
fn graph_items_are_ordered_without_touching_the_entities() {
    let (doc, template) = template_with_ping();
    let items = template.collection("items").expect("set");
    let ping = items.get(0).expect("item");
    let uptime = items
        .create(fields! { "name" => "Uptime", "key" => "system.uptime" })
        .expect("added");
    let graph = template.collection("graphs").expect("set").new("Health", fields!()).expect("added");
    let graph_items = graph.collection("graph_items").expect("set");
    graph_items.new(&ping, fields!()).expect("added");
    let second = graph_items.new(&uptime, fields!()).expect("added");

    let root = pinned().compile(&doc).expect("compiles");
    let compiled = root.find_all("graphs/graph/graph_items/graph_item");
    assert_eq!(compiled.len(), 2);
    assert!(compiled[0].child("sortorder").is_none());
    assert_eq!(compiled[1].text_at("sortorder"), Some("1"));
    assert_eq!(compiled[0].text_at("color"), Some("C80000"));
    assert_eq!(compiled[1].text_at("color"), Some("009600"));
    assert_eq!(compiled[1].text_at("item/key"), Some("system.uptime"));
    assert_eq!(compiled[1].text_at("item/host"), Some("Template OS"));

    assert_eq!(second.get("sortorder").expect("field"), Some(Value::from(0)));
    assert_eq!(second.get("color").expect("field"), None);
}

#[test]
fn screen_items_are_laid_out_on_a_grid() {
    let doc = catalogue::document().expect("document");
    let template = doc
        .collection("templates")
        .expect("set")
        .new("Template OS", fields!())
        .expect("added");
    let graphs = template.collection("graphs").expect("set");
    let screen = template
        .collection("screens")
        .expect("set")
        .new("Overview", fields! { "hsize" => 2 })
        .expect("added");
    let screen_items = screen.collection("screen_items").expect("set");
    for name in ["CPU", "Memory", "Disk"] {
        let graph = graphs.new(name, fields!()).expect("added");
        screen_items.new(&graph, fields!()).expect("added");
    }

    let root = pinned().compile(&doc).expect("compiles");
    let compiled = root.find("templates/template/screens/screen").expect("screen");
    assert_eq!(compiled.text_at("vsize"), Some("2"));
    assert_eq!(texts(compiled, "screen_items/screen_item/x"), vec!["0", "1", "0"]);
    assert_eq!(texts(compiled, "screen_items/screen_item/y"), vec!["0", "0", "1"]);
    assert_eq!(texts(compiled, "screen_items/screen_item/resource/name"), vec!["CPU", "Memory", "Disk"]);

    let first = screen_items.get(0).expect("screen item");
    assert_eq!(first.get("x").expect("field"), None);
}

#[test]
fn root_children_follow_the_export_order() {
    let doc = catalogue::document().expect("document");
    let host = doc
        .collection("hosts")
        .expect("set")
        .new("web1", fields! { "groups" => ["Linux servers"] })
        .expect("added");
    host.collection("triggers")
        .expect("set")
        .new("Down", fields! { "expression" => "{web1:agent.ping.nodata(5m)}=1" })
        .expect("added");
    doc.collection("templates")
        .expect("set")
        .new("Template OS", fields!())
        .expect("added");

    let root = pinned().compile(&doc).expect("compiles");
    let tags: Vec<&str> = root.children.iter().map(|child| child.tag.as_str()).collect();
    assert_eq!(tags, vec!["version", "date", "templates", "hosts", "triggers", "groups"]);
}

#[test]
fn rendering_is_indented_xml_and_repeatable() {
    let (doc, template) = template_with_ping();
    let ping = template.collection("items").expect("set").get(0).expect("item");
    template
        .collection("graphs")
        .expect("set")
        .new("Ping", fields!())
        .expect("added")
        .collection("graph_items")
        .expect("set")
        .new(&ping, fields!())
        .expect("added");

    let mut compiler = pinned();
    let first = compiler.render(&doc).expect("renders");
    let second = compiler.render(&doc).expect("renders");
    assert_eq!(first, second);
    assert!(first.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(first.contains("\n  <version>2.0</version>"));
    assert!(first.contains("<color>C80000</color>"));
    assert!(first.ends_with("</zabbix_export>\n"));

    let wide = pinned().with_indent(4).render(&doc).expect("renders");
    assert!(wide.contains("\n    <version>2.0</version>"));
}

#[test]
fn single_entities_compile_to_their_own_element() {
    let registry = catalogue::standard().expect("catalogue builds");
    let item = registry
        .build("Item", fields! { "name" => "Ping", "key" => "agent.ping", "history" => 7 })
        .expect("built");
    let root = pinned().compile(&item).expect("compiles");

    assert_eq!(root.tag, "item");
    assert_eq!(root.text_at("key"), Some("agent.ping"));
    assert!(root.child("history").is_none());
    assert!(root.child("version").is_none());
}
