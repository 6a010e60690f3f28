use std::collections::VecDeque;

use serde_json::{Value, json};
use zbxconf::api::{Api, RpcError, RpcResult, Transport};

#[derive(Default)]
struct Recorded {
    requests: Vec<(String, Value)>,
    replies: VecDeque<String>,
}

impl Recorded {
    fn replying(replies: &[&str]) -> Self {
        Self {
            requests: Vec::new(),
            replies: replies.iter().map(|reply| reply.to_string()).collect(),
        }
    }

    fn methods(&self) -> Vec<&str> {
        self.requests
            .iter()
            .filter_map(|(_, body)| body["method"].as_str())
            .collect()
    }
}

impl Transport for Recorded {
    fn post(&mut self, url: &str, body: &str) -> RpcResult<String> {
        let parsed = serde_json::from_str(body).map_err(|err| RpcError::Transport(err.to_string()))?;
        self.requests.push((url.to_string(), parsed));
        self.replies
            .pop_front()
            .ok_or_else(|| RpcError::Transport("no reply queued".to_string()))
    }
}

const URL: &str = "http://monitor.local/api_jsonrpc.php";

#[test]
fn requests_log_in_once_and_reuse_the_token() {
    let transport = Recorded::replying(&[
        r#"{"jsonrpc":"2.0","result":"0424bd59b807674191e7d77572075f33","id":1}"#,
        r#"{"jsonrpc":"2.0","result":[{"hostid":"10084","host":"web1"}],"id":2}"#,
        r#"{"jsonrpc":"2.0","result":[],"id":3}"#,
    ]);
    let mut api = Api::new(transport, URL, "Admin", "zabbix");

    let hosts = api.request("host.get", json!({ "output": ["host"] })).expect("host.get");
    assert_eq!(hosts, json!([{ "hostid": 10084, "host": "web1" }]));
    api.request("item.get", json!({})).expect("item.get");
    assert_eq!(api.auth_token(), Some("0424bd59b807674191e7d77572075f33"));

    let requests = &api.transport().requests;
    assert_eq!(api.transport().methods(), vec!["user.login", "host.get", "item.get"]);
    let (url, login) = &requests[0];
    assert_eq!(url, URL);
    assert_eq!(login["jsonrpc"], "2.0");
    assert_eq!(login["params"], json!({ "user": "Admin", "password": "zabbix" }));
    assert!(login.get("auth").is_none());

    let (_, get) = &requests[1];
    assert_eq!(get["auth"], "0424bd59b807674191e7d77572075f33");
    assert_eq!(get["id"], 2);
    assert_eq!(requests[2].1["id"], 3);
}

#[test]
fn unauthenticated_methods_skip_the_login() {
    let transport = Recorded::replying(&[r#"{"jsonrpc":"2.0","result":"2.0.4","id":1}"#]);
    let mut api = Api::new(transport, URL, "Admin", "zabbix");

    let version = api.request("apiinfo.version", json!([])).expect("version");
    assert_eq!(version, json!("2.0.4"));
    assert_eq!(api.transport().methods(), vec!["apiinfo.version"]);
    assert!(api.auth_token().is_none());
}

#[test]
fn remote_errors_surface_with_their_details() {
    let transport = Recorded::replying(&[
        r#"{"jsonrpc":"2.0","result":"token","id":1}"#,
        r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid params.","data":"No permissions to referred object."},"id":2}"#,
    ]);
    let mut api = Api::new(transport, URL, "Admin", "zabbix");

    let err = api.request("host.delete", json!(["1"])).expect_err("rejected");
    match &err {
        RpcError::Remote { message, code, data } => {
            assert_eq!(message, "Invalid params.");
            assert_eq!(*code, -32602);
            assert_eq!(data.as_deref(), Some("No permissions to referred object."));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Invalid params.(-32602): No permissions to referred object."
    );
}

#[test]
fn login_without_a_token_fails() {
    let transport = Recorded::replying(&[r#"{"jsonrpc":"2.0","result":true,"id":1}"#]);
    let mut api = Api::new(transport, URL, "Admin", "wrong");
    assert!(matches!(api.authenticate(false), Err(RpcError::NoToken)));
    assert!(api.auth_token().is_none());
}

#[test]
fn forced_authentication_logs_in_again() {
    let transport = Recorded::replying(&[
        r#"{"jsonrpc":"2.0","result":"first","id":1}"#,
        r#"{"jsonrpc":"2.0","result":"second","id":2}"#,
    ]);
    let mut api = Api::new(transport, URL, "Admin", "zabbix");
    assert_eq!(api.authenticate(false).expect("login"), "first");
    assert_eq!(api.authenticate(false).expect("cached"), "first");
    assert_eq!(api.authenticate(true).expect("login"), "second");
    assert_eq!(api.transport().requests.len(), 2);
}

#[test]
fn import_sends_the_document_with_create_and_update_rules() {
    let transport = Recorded::replying(&[
        r#"{"jsonrpc":"2.0","result":"token","id":1}"#,
        r#"{"jsonrpc":"2.0","result":true,"id":2}"#,
    ]);
    let mut api = Api::new(transport, URL, "Admin", "zabbix");
    let source = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<zabbix_export/>\n";

    assert_eq!(api.import_configuration(source).expect("imported"), json!(true));

    let (_, import) = &api.transport().requests[1];
    assert_eq!(import["method"], "configuration.import");
    assert_eq!(import["params"]["format"], "xml");
    assert_eq!(import["params"]["source"], source);
    let rules = &import["params"]["rules"];
    assert_eq!(rules["groups"], json!({ "createMissing": true }));
    assert_eq!(rules["templateLinkage"], json!({ "createMissing": true }));
    assert_eq!(rules["hosts"], json!({ "createMissing": true, "updateExisting": true }));
    assert_eq!(rules["valueMaps"], json!({ "createMissing": true, "updateExisting": true }));
}

#[test]
fn empty_bodies_read_as_null() {
    let transport = Recorded::replying(&["", "  "]);
    let mut api = Api::new(transport, URL, "Admin", "zabbix");
    assert_eq!(api.request("apiinfo.version", json!([])).expect("empty"), Value::Null);
    assert!(matches!(api.authenticate(false), Err(RpcError::NoToken)));
}
