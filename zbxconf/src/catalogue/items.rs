//! Items, value maps and aggregate items.

use crate::collection::Collection;
use crate::errors::{ConfigError, ConfigResult, ValidationError};
use crate::fields::Field;
use crate::model::Entity;
use crate::registry::ModelDecl;
use crate::types::{Fields, Input, Value};
use crate::util::{escape, format_timeperiod};

const AGGREGATE: &str = "AggregateItem";
const UNSET_GROUP: &str = "<not set>";

fn aggregate_error(field: &str, message: String) -> ConfigError {
    ConfigError::invalid_value(AGGREGATE, field, ValidationError::new("aggregate", message))
}

fn take_text(fields: &mut Fields, key: &str) -> ConfigResult<Option<String>> {
    match fields.remove(key) {
        None | Some(Input::Null) => Ok(None),
        Some(Input::Value(value)) => Ok(Some(value.render())),
        Some(other) => Err(aggregate_error(key, format!("expected a value, got {}", other.describe()))),
    }
}

fn take_groups(fields: &mut Fields) -> ConfigResult<Vec<String>> {
    let inputs = match fields.remove("groups") {
        None | Some(Input::Null) => Vec::new(),
        Some(Input::List(items)) => items,
        Some(single) => vec![single],
    };
    let mut groups: Vec<String> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let name = match input {
            Input::Value(value) => value.render(),
            Input::Entity(entity) => entity
                .text("name")
                .ok_or_else(|| aggregate_error("groups", format!("{entity:?} has no name")))?,
            other => return Err(aggregate_error("groups", format!("expected a group name, got {}", other.describe()))),
        };
        if !groups.contains(&name) {
            groups.push(name);
        }
    }
    Ok(groups)
}

/// Build the aggregate key `groupfunc[groups,"key",itemfunc,period]` from the
/// aggregate parameters, which are consumed from `fields`.
fn aggregate_key(fields: &mut Fields) -> ConfigResult<()> {
    let groups = take_groups(fields)?;
    let groupfunc = take_text(fields, "groupfunc")?.unwrap_or_else(|| "grpavg".to_string());
    let itemfunc = take_text(fields, "itemfunc")?.unwrap_or_else(|| "avg".to_string());
    let timeperiod = match fields.remove("timeperiod") {
        None | Some(Input::Null) => Value::Int(0),
        Some(Input::Value(value)) => value,
        Some(other) => return Err(aggregate_error("timeperiod", format!("expected a period, got {}", other.describe()))),
    };
    let timeperiod = format_timeperiod(&timeperiod).map_err(|source| ConfigError::invalid_value(AGGREGATE, "timeperiod", source))?;
    let key = take_text(fields, "key")?.unwrap_or_default();

    let groups = match groups.as_slice() {
        [] => escape(&serde_json::Value::from(UNSET_GROUP)),
        [single] => escape(&serde_json::Value::from(single.as_str())),
        many => escape(&serde_json::Value::from(many.to_vec())),
    };
    fields.insert(
        "key",
        format!("{groupfunc}[{groups},{},{itemfunc},{timeperiod}]", escape(&serde_json::Value::from(key))),
    );
    fields.set_default("type", 8);
    fields.set_default("data_type", "decimal");
    Ok(())
}

/// Add an aggregate item averaging `key` over `groups`. The name gets an
/// ` (avg)` suffix.
pub fn avg_item(items: &Collection, name: &str, groups: impl Into<Input>, fields: Fields) -> ConfigResult<Entity> {
    aggregate(items, name, " (avg)", "grpavg", "avg", groups.into(), fields)
}

/// Add an aggregate item summing `key` over `groups`. The name gets a
/// ` (sum)` suffix.
pub fn sum_item(items: &Collection, name: &str, groups: impl Into<Input>, fields: Fields) -> ConfigResult<Entity> {
    aggregate(items, name, " (sum)", "grpsum", "sum", groups.into(), fields)
}

fn aggregate(
    items: &Collection,
    name: &str,
    suffix: &str,
    groupfunc: &str,
    itemfunc: &str,
    groups: Input,
    mut fields: Fields,
) -> ConfigResult<Entity> {
    let name = if name.ends_with(suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    };
    fields.insert("groups", groups);
    fields.set_default("groupfunc", groupfunc);
    fields.set_default("itemfunc", itemfunc);
    fields.set_default("timeperiod", "1m");

    let model = items.element().registry().model(AGGREGATE)?;
    let item = Entity::build(&model, name, fields)?;
    items.add(item)
}

/// Trigger-expression form of an item: `host:key`, or just `key` when the
/// item is not nested under a host or template.
pub fn item_expression(item: &Entity) -> ConfigResult<String> {
    let identity = item.identity()?;
    let key = identity.get("key").map(Value::render).unwrap_or_default();
    Ok(match identity.get("host") {
        Some(host) => format!("{host}:{key}"),
        None => key,
    })
}

pub fn declarations() -> Vec<ModelDecl> {
    vec![
        ModelDecl::new("ValueMap").tag("valuemap").positional("name").field("name", Field::new()),
        ModelDecl::new("Item")
            .tag("item")
            .positional("name")
            .referenced_by("key")
            .field("name", Field::new().describe("Item name"))
            .field("key", Field::new().describe("Item key"))
            .field("description", Field::new().describe("Item description"))
            .field(
                "type",
                Field::new()
                    .default(2)
                    .choices(&[
                        (0, "Zabbix agent"),
                        (1, "SNMPv1"),
                        (2, "Trapper"),
                        (3, "Simple check"),
                        (4, "SNMPv2"),
                        (5, "Internal"),
                        (6, "SNMPv3"),
                        (7, "Active check"),
                        (8, "Aggregate"),
                        (9, "HTTP test (web monitoring scenario step)"),
                        (10, "External"),
                        (11, "Database monitor"),
                        (12, "IPMI"),
                        (13, "SSH"),
                        (14, "telnet"),
                        (15, "Calculated"),
                        (16, "JMX"),
                        (17, "SNMP trap"),
                    ])
                    .describe("Item type"),
            )
            .field(
                "data_type",
                Field::new()
                    .default(0)
                    .choices(&[(0, "decimal"), (1, "octal"), (2, "hexadecimal"), (3, "boolean")])
                    .describe("Data type of the item"),
            )
            .field("delay", Field::new().default(60).describe("Check interval"))
            .field("history", Field::new().default(7).describe("How long to keep item history (days)"))
            .field("trends", Field::new().default(365).describe("How long to keep item trends (days)"))
            .field(
                "status",
                Field::new()
                    .default(0)
                    .choices(&[(0, "enabled item"), (1, "disabled item"), (3, "unsupported item")])
                    .describe("Item status"),
            )
            .field(
                "value_type",
                Field::new()
                    .default(3)
                    .choices(&[
                        (0, "numeric_float"),
                        (1, "character"),
                        (2, "log"),
                        (3, "numeric_unsigned"),
                        (4, "text"),
                    ])
                    .describe("Value type"),
            )
            .field("units", Field::new().default("").describe("Value units"))
            .field("multiplier", Field::new().default(0).describe("Value multiplier"))
            .field(
                "delta",
                Field::new()
                    .default(0)
                    .choices(&[(0, "as_is"), (1, "delta_per_second"), (2, "delta_simple")])
                    .describe("Store values as delta"),
            )
            .field("formula", Field::new().default(1))
            .field("delay_flex", Field::new().describe("Flexible delay"))
            .field("trapper_hosts", Field::new())
            .field("snmp_community", Field::new().describe("SNMP community name"))
            .field("snmp_oid", Field::new().describe("SNMP OID"))
            .field("port", Field::new().describe("Item custom port"))
            .field("snmpv3_securityname", Field::new().describe("SNMPv3 security name"))
            .field("snmpv3_securitylevel", Field::new().describe("SNMPv3 security level"))
            .field("snmpv3_authpassphrase", Field::new().describe("SNMPv3 authentication phrase"))
            .field("snmpv3_privpassphrase", Field::new().describe("SNMPv3 private phrase"))
            .field("params", Field::new())
            .field("ipmi_sensor", Field::new().describe("IPMI sensor"))
            .field(
                "authtype",
                Field::new()
                    .default(0)
                    .choices(&[(0, "password"), (1, "public key")])
                    .describe("SSH authentication method, used only by SSH agent item prototypes"),
            )
            .field("username", Field::new())
            .field("password", Field::new())
            .field("publickey", Field::new())
            .field("privatekey", Field::new())
            .field("interface_ref", Field::new().describe("Reference to host interface"))
            .field(
                "inventory_link",
                Field::new()
                    .default(0)
                    .describe("Host inventory field number updated with the value returned by the item"),
            )
            .field("applications", Field::set("Application"))
            .field(
                "valuemap",
                Field::set("ValueMap").allow_empty().describe("Value map assigned to item"),
            ),
        ModelDecl::new(AGGREGATE).extends("Item").prepare(aggregate_key),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn aggregate_key_for_one_group() {
        let mut fields = fields! {
            "groups" => "Web servers",
            "groupfunc" => "grpavg",
            "itemfunc" => "last",
            "timeperiod" => "60",
            "key" => "system.cpu.load",
        };
        aggregate_key(&mut fields).expect("builds");
        assert_eq!(
            fields.get("key").and_then(Input::as_value).map(Value::render).as_deref(),
            Some("grpavg[\"Web servers\",\"system.cpu.load\",last,1m]")
        );
        assert!(!fields.contains_key("groups"));
        assert_eq!(fields.get("type").and_then(Input::as_value), Some(&Value::Int(8)));
    }

    #[test]
    fn aggregate_key_for_many_groups() {
        let mut fields = fields! {
            "groups" => vec!["a", "b", "a"],
            "timeperiod" => 3600,
            "key" => "net.if.in",
        };
        aggregate_key(&mut fields).expect("builds");
        assert_eq!(
            fields.get("key").and_then(Input::as_value).map(Value::render).as_deref(),
            Some("grpavg[[\"a\",\"b\"],\"net.if.in\",avg,1h]")
        );
    }

    #[test]
    fn aggregate_key_without_groups() {
        let mut fields = fields! { "key" => "k" };
        aggregate_key(&mut fields).expect("builds");
        assert_eq!(
            fields.get("key").and_then(Input::as_value).map(Value::render).as_deref(),
            Some("grpavg[\"<not set>\",\"k\",avg,0s]")
        );
    }
}
