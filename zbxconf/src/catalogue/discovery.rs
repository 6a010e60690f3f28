use crate::fields::Field;
use crate::registry::ModelDecl;

pub fn declarations() -> Vec<ModelDecl> {
    vec![
        ModelDecl::new("DiscoveryRule")
            .tag("discovery_rule")
            .positional("name")
            .field("key", Field::new())
            .field("name", Field::new().describe("Visible discovery rule name"))
            .field("description", Field::new())
            .field("type", Field::new().default(2))
            .field("status", Field::new().default(0).choices(&[(0, "enabled"), (1, "disabled")]))
            .field("proxy", Field::new().describe("Proxy name"))
            .field("applications", Field::set("Application"))
            .field("templates", Field::set("Template"))
            .field("groups", Field::set("Group"))
            .field("interfaces", Field::set("Interface"))
            .field("filter", Field::new().default(":"))
            .field("delay", Field::new().default(3600))
            .field("delay_flex", Field::new())
            .field("lifetime", Field::new().default(30))
            .field("item_prototypes", Field::set("Item").tag("item_prototype"))
            .field("trigger_prototypes", Field::set("Trigger").tag("trigger_prototype"))
            .field("graph_prototypes", Field::set("Graph").tag("graph_prototype"))
            .field("allowed_hosts", Field::new())
            .field("ipmi_authtype", Field::new().describe("IPMI authentication type"))
            .field("ipmi_password", Field::new().describe("IPMI password"))
            .field("ipmi_privilege", Field::new().describe("IPMI privilege"))
            .field("ipmi_sensor", Field::new())
            .field("ipmi_username", Field::new().describe("IPMI username"))
            .field("snmp_community", Field::new())
            .field("snmp_oid", Field::new())
            .field("snmpv3_contextname", Field::new())
            .field("snmpv3_securityname", Field::new())
            .field("snmpv3_securitylevel", Field::new().default(0))
            .field("snmpv3_authprotocol", Field::new().default(0))
            .field("snmpv3_authpassphrase", Field::new())
            .field("snmpv3_privprotocol", Field::new().default(0))
            .field("snmpv3_privpassphrase", Field::new())
            .field("params", Field::new())
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
            .field("port", Field::new())
            .field("host_prototypes", Field::set("Host").tag("host_prototype")),
    ]
}
