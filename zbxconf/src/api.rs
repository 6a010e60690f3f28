//! JSON-RPC client for pushing configuration to a monitoring server.
//!
//! The client is written against a [`Transport`] so callers choose how bytes
//! travel; nothing here opens sockets.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Methods callable without an auth token.
pub const WITHOUT_AUTH: [&str; 3] = ["user.login", "user.checkAuthentication", "apiinfo.version"];

#[derive(Debug, Error)]
pub enum RpcError {
    /// The server answered with an error object.
    #[error("{message}({code}): {}", .data.as_deref().unwrap_or("no details"))]
    Remote {
        message: String,
        code: i64,
        data: Option<String>,
    },

    #[error("transport failed: {0}")]
    Transport(String),

    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("login did not return a token")]
    NoToken,
}

pub type RpcResult<T> = Result<T, RpcError>;

/// Sends one request body and returns the raw response body.
pub trait Transport {
    fn post(&mut self, url: &str, body: &str) -> RpcResult<String>;
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    code: i64,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

/// Turn digit-only strings into integers, recursively.
pub fn cast(value: Value) -> Value {
    match value {
        Value::String(text) if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) => {
            text.parse::<u64>().map(Value::from).unwrap_or(Value::String(text))
        }
        Value::Array(items) => Value::Array(items.into_iter().map(cast).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(key, value)| (key, cast(value))).collect::<Map<_, _>>()),
        other => other,
    }
}

pub struct Api<T: Transport> {
    url: String,
    user: String,
    password: String,
    auth_token: Option<String>,
    transport: T,
    next_id: u64,
}

impl<T: Transport> Api<T> {
    pub fn new(transport: T, url: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: user.into(),
            password: password.into(),
            auth_token: None,
            transport,
            next_id: 1,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Log in, reusing the cached token unless `reset` is set.
    pub fn authenticate(&mut self, reset: bool) -> RpcResult<String> {
        if !reset {
            if let Some(token) = &self.auth_token {
                return Ok(token.clone());
            }
        }
        let params = json!({ "user": self.user, "password": self.password });
        let token = match self.call("user.login", &params, None)? {
            Value::String(token) => token,
            _ => return Err(RpcError::NoToken),
        };
        self.auth_token = Some(token.clone());
        Ok(token)
    }

    /// Call `method`, authenticating first when it requires a token.
    /// Digit strings in the result are cast to integers.
    pub fn request(&mut self, method: &str, params: Value) -> RpcResult<Value> {
        let token = if WITHOUT_AUTH.contains(&method) {
            None
        } else {
            Some(self.authenticate(false)?)
        };
        let result = self.call(method, &params, token.as_deref())?;
        Ok(cast(result))
    }

    /// Import a rendered XML document, creating and updating everything it holds.
    pub fn import_configuration(&mut self, source: &str) -> RpcResult<Value> {
        let update = json!({ "createMissing": true, "updateExisting": true });
        let create = json!({ "createMissing": true });
        let params = json!({
            "format": "xml",
            "source": source,
            "rules": {
                "groups": create,
                "applications": create,
                "templateLinkage": create,
                "hosts": update,
                "templates": update,
                "templateScreens": update,
                "items": update,
                "discoveryRules": update,
                "triggers": update,
                "graphs": update,
                "screens": update,
                "valueMaps": update,
            },
        });
        self.request("configuration.import", params)
    }

    fn call(&mut self, method: &str, params: &Value, auth: Option<&str>) -> RpcResult<Value> {
        let request = Request {
            jsonrpc: "2.0",
            id: self.next_id,
            method,
            params,
            auth,
        };
        self.next_id += 1;
        let body = serde_json::to_string(&request)?;
        debug!("api --> {method} {params}");

        let raw = self.transport.post(&self.url, &body)?;
        if raw.trim().is_empty() {
            debug!("api <-- no result");
            return Ok(Value::Null);
        }
        let response: Response = serde_json::from_str(&raw)?;
        if let Some(error) = response.error {
            debug!("api <-- error {} ({})", error.message, error.code);
            return Err(RpcError::Remote {
                message: error.message,
                code: error.code,
                data: error.data.map(|data| match data {
                    Value::String(text) => text,
                    other => other.to_string(),
                }),
            });
        }
        let result = response.result.unwrap_or(Value::Null);
        debug!("api <-- result {result}");
        Ok(result)
    }
}
