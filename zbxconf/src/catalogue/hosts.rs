//! Hosts, templates and what hangs directly off them.

use std::net::IpAddr;

use crate::errors::{ConfigError, ConfigResult, ValidationError};
use crate::fields::Field;
use crate::registry::ModelDecl;
use crate::types::{Fields, Input, Value};

/// `template` defaults to the template's name.
fn template_defaults(fields: &mut Fields) -> ConfigResult<()> {
    if let Some(name) = fields.get("name").cloned() {
        fields.set_default("template", name);
    }
    Ok(())
}

/// `host` defaults to the visible name.
fn host_defaults(fields: &mut Fields) -> ConfigResult<()> {
    if let Some(name) = fields.get("name").cloned() {
        fields.set_default("host", name);
    }
    Ok(())
}

fn is_ip_like(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok()
}

/// Address and optional port of an ident. A bare IPv6 literal has no port;
/// `[::1]:10050` brackets the address to carry one.
fn split_ident(ident: &str) -> (&str, Option<&str>) {
    if is_ip_like(ident) {
        return (ident, None);
    }
    if let Some((address, rest)) = ident.strip_prefix('[').and_then(|inner| inner.split_once(']')) {
        return (address, rest.strip_prefix(':'));
    }
    match ident.rsplit_once(':') {
        Some((address, port)) => (address, Some(port)),
        None => (ident, None),
    }
}

/// Expand an `ident` such as `10.0.0.1:10050` or `db.local` into
/// `ip`, `dns`, `port` and `useip`. Explicit fields win.
fn parse_ident(fields: &mut Fields) -> ConfigResult<()> {
    let ident = match fields.remove("ident") {
        None => return Ok(()),
        Some(Input::Null) => String::new(),
        Some(Input::Value(value)) => value.render(),
        Some(other) => {
            return Err(ConfigError::invalid_value(
                "Interface",
                "ident",
                ValidationError::new("type", format!("expected an address, got {}", other.describe())),
            ));
        }
    };

    let (address, port) = match split_ident(&ident) {
        (address, Some(port)) => {
            let port: i64 = port.parse().map_err(|_| {
                ConfigError::invalid_value(
                    "Interface",
                    "ident",
                    ValidationError::new("port", format!("{port:?} is not a port number")),
                )
            })?;
            (address, Input::from(port))
        }
        (address, None) => (address, Input::from("")),
    };
    let (ip, dns) = match address {
        "" => ("", ""),
        address if is_ip_like(address) => (address, ""),
        address => ("", address),
    };

    fields.set_default("ip", ip);
    fields.set_default("dns", dns);
    fields.set_default("port", port);
    let uses_dns = fields
        .get("dns")
        .and_then(Input::as_value)
        .is_some_and(|dns| !dns.render().is_empty());
    fields.set_default("useip", Value::Bool(!uses_dns));
    Ok(())
}

pub fn declarations() -> Vec<ModelDecl> {
    vec![
        ModelDecl::new("Template")
            .tag("template")
            .positional("name")
            .host_scope()
            .prepare(template_defaults)
            .field("name", Field::new())
            .field("template", Field::new())
            .field("groups", Field::set("Group"))
            .field("applications", Field::set("Application"))
            .field("items", Field::set("Item"))
            .field("discovery_rules", Field::set("DiscoveryRule"))
            .field("macros", Field::set("Macro").allow_empty())
            .field("screens", Field::set("Screen"))
            .field("graphs", Field::set("Graph"))
            .field("triggers", Field::set("Trigger")),
        ModelDecl::new("Host")
            .tag("host")
            .positional("name")
            .host_scope()
            .prepare(host_defaults)
            .field("host", Field::new().describe("Host name"))
            .field("name", Field::new().describe("Visible host name"))
            .field("proxy", Field::new().default("").describe("Proxy name"))
            .field(
                "status",
                Field::new()
                    .default(0)
                    .choices(&[(0, "monitored"), (1, "unmonitored")])
                    .describe("Host status"),
            )
            .field("ipmi_authtype", Field::new().default(-1).describe("IPMI authentication type"))
            .field("ipmi_privilege", Field::new().default(2).describe("IPMI privilege"))
            .field("ipmi_username", Field::new().default("").describe("IPMI username"))
            .field("ipmi_password", Field::new().default("").describe("IPMI password"))
            .field("templates", Field::set("Template").allow_empty())
            .field("groups", Field::set("Group"))
            .field("interfaces", Field::set("Interface"))
            .field("applications", Field::set("Application"))
            .field("items", Field::set("Item").allow_empty())
            .field("discovery_rules", Field::set("DiscoveryRule").allow_empty())
            .field("description", Field::new())
            .field("graphs", Field::set("Graph"))
            .field("triggers", Field::set("Trigger"))
            .field("screens", Field::set("Screen"))
            .field("macros", Field::set("Macro").allow_empty())
            .field("inventory", Field::new().default("")),
        ModelDecl::new("Interface")
            .tag("interface")
            .positional("ident")
            .prepare(parse_ident)
            .field("ip", Field::new().describe("IP address, can be either IPv4 or IPv6"))
            .field("dns", Field::new().default("").describe("DNS name"))
            .field("port", Field::new().describe("Port number"))
            .field(
                "type",
                Field::new()
                    .default(1)
                    .choices(&[(1, "agent"), (2, "SNMP"), (3, "IPMI"), (4, "JMX")])
                    .describe("Interface type"),
            )
            .field(
                "useip",
                Field::new()
                    .default(0)
                    .choices(&[
                        (0, "connect to the host using DNS name"),
                        (1, "connect to the host using IP address"),
                    ])
                    .describe("How to connect to the host"),
            )
            .field(
                "default",
                Field::new()
                    .default(0)
                    .choices(&[(0, "Not default interface"), (1, "Default interface")])
                    .describe("Interface status"),
            )
            .field(
                "interface_ref",
                Field::new()
                    .default("if1")
                    .describe("Interface reference name to be used in items"),
            ),
        ModelDecl::new("Macro")
            .tag("macro")
            .identity(&["macro"])
            .field("macro", Field::new())
            .field("value", Field::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    fn text(fields: &Fields, key: &str) -> Option<String> {
        fields.get(key).and_then(Input::as_value).map(Value::render)
    }

    #[test]
    fn ident_with_ip_and_port() {
        let mut fields = fields! { "ident" => "10.0.0.1:10050" };
        parse_ident(&mut fields).expect("parses");
        assert_eq!(text(&fields, "ip").as_deref(), Some("10.0.0.1"));
        assert_eq!(text(&fields, "dns").as_deref(), Some(""));
        assert_eq!(text(&fields, "port").as_deref(), Some("10050"));
        assert_eq!(text(&fields, "useip").as_deref(), Some("1"));
        assert!(!fields.contains_key("ident"));
    }

    #[test]
    fn ident_with_ipv6_addresses() {
        let mut fields = fields! { "ident" => "fe80::1" };
        parse_ident(&mut fields).expect("parses");
        assert_eq!(text(&fields, "ip").as_deref(), Some("fe80::1"));
        assert_eq!(text(&fields, "dns").as_deref(), Some(""));
        assert_eq!(text(&fields, "port").as_deref(), Some(""));
        assert_eq!(text(&fields, "useip").as_deref(), Some("1"));

        let mut fields = fields! { "ident" => "[2001:db8::10]:10050" };
        parse_ident(&mut fields).expect("parses");
        assert_eq!(text(&fields, "ip").as_deref(), Some("2001:db8::10"));
        assert_eq!(text(&fields, "port").as_deref(), Some("10050"));
        assert_eq!(text(&fields, "useip").as_deref(), Some("1"));
    }

    #[test]
    fn ident_with_dns_name() {
        let mut fields = fields! { "ident" => "db.local" };
        parse_ident(&mut fields).expect("parses");
        assert_eq!(text(&fields, "dns").as_deref(), Some("db.local"));
        assert_eq!(text(&fields, "ip").as_deref(), Some(""));
        assert_eq!(text(&fields, "useip").as_deref(), Some("0"));
    }

    #[test]
    fn ident_with_bad_port() {
        let mut fields = fields! { "ident" => "db.local:http" };
        assert!(parse_ident(&mut fields).is_err());
    }

    #[test]
    fn host_name_fills_host() {
        let mut fields = fields! { "name" => "web1" };
        host_defaults(&mut fields).expect("fills");
        assert_eq!(text(&fields, "host").as_deref(), Some("web1"));

        let mut fields = fields! { "name" => "Web 1", "host" => "web1" };
        host_defaults(&mut fields).expect("keeps");
        assert_eq!(text(&fields, "host").as_deref(), Some("web1"));
    }
}
