//! Sender protocol framing for pushing runtime values to a trapper port.
//!
//! A frame is `ZBXD\x01`, the payload length as a little-endian `u64`, then
//! the JSON payload.

use std::io::{Read, Write};

use chrono::Utc;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Value;

pub const HEADER: &[u8; 5] = b"ZBXD\x01";
const FRAME_PREFIX: usize = 13;
/// Largest response body accepted from a server.
pub const MAX_RESPONSE: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum SenderError {
    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response does not start with a sender header")]
    BadHeader,

    #[error("server rejected the data: {0}")]
    Rejected(String),
}

/// One value for one item key.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub key: String,
    pub value: Option<Value>,
    pub host: Option<String>,
    pub clock: Option<i64>,
}

impl Metric {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            host: None,
            clock: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn clock(mut self, clock: i64) -> Self {
        self.clock = Some(clock);
        self
    }
}

#[derive(Debug, Serialize)]
struct Entry<'a> {
    host: &'a str,
    key: &'a str,
    value: String,
    clock: i64,
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    request: &'static str,
    data: Vec<Entry<'a>>,
    clock: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SenderResponse {
    pub response: String,
    #[serde(default)]
    pub info: Option<String>,
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(FRAME_PREFIX + payload.len());
    packet.extend_from_slice(HEADER);
    packet.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    packet.extend_from_slice(payload);
    packet
}

/// Frame `metrics` as a `sender data` request. Metrics without a host go to
/// `localhost`; metrics without a clock use `now`.
pub fn encode_request(metrics: &[Metric], now: i64) -> Result<Vec<u8>, SenderError> {
    let data = metrics
        .iter()
        .map(|metric| Entry {
            host: match metric.host.as_deref() {
                None | Some("-") => "localhost",
                Some(host) => host,
            },
            key: &metric.key,
            value: metric
                .value
                .as_ref()
                .map(Value::render)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| "-".to_string()),
            clock: metric.clock.unwrap_or(now),
        })
        .collect();
    let payload = serde_json::to_vec(&Request {
        request: "sender data",
        data,
        clock: now,
    })?;
    Ok(frame(&payload))
}

/// Body length announced by a frame prefix.
fn body_length(prefix: &[u8]) -> Result<usize, SenderError> {
    if prefix.len() < FRAME_PREFIX || &prefix[..5] != HEADER {
        return Err(SenderError::BadHeader);
    }
    let mut length = [0u8; 8];
    length.copy_from_slice(&prefix[5..FRAME_PREFIX]);
    match usize::try_from(u64::from_le_bytes(length)) {
        Ok(length) if length <= MAX_RESPONSE => Ok(length),
        _ => Err(SenderError::BadHeader),
    }
}

/// Parse a framed response body.
pub fn decode_response(packet: &[u8]) -> Result<SenderResponse, SenderError> {
    let length = body_length(packet)?;
    let end = FRAME_PREFIX.checked_add(length).ok_or(SenderError::BadHeader)?;
    let body = packet.get(FRAME_PREFIX..end).ok_or(SenderError::BadHeader)?;
    Ok(serde_json::from_slice(body)?)
}

/// Send `metrics` over `stream` and return the server's info line.
pub fn send<S: Read + Write>(stream: &mut S, metrics: &[Metric]) -> Result<Option<String>, SenderError> {
    send_at(stream, metrics, Utc::now().timestamp())
}

pub fn send_at<S: Read + Write>(stream: &mut S, metrics: &[Metric], now: i64) -> Result<Option<String>, SenderError> {
    let packet = encode_request(metrics, now)?;
    debug!("sending {} metrics ({} bytes)", metrics.len(), packet.len());
    stream.write_all(&packet)?;
    stream.flush()?;

    let mut prefix = [0u8; FRAME_PREFIX];
    stream.read_exact(&mut prefix)?;
    let length = body_length(&prefix).inspect_err(|_| error!("wrong sender response header"))?;
    let mut body = vec![0u8; length];
    stream.read_exact(&mut body)?;

    let response: SenderResponse = serde_json::from_slice(&body)?;
    if response.response != "success" {
        return Err(SenderError::Rejected(
            response.info.unwrap_or_else(|| "error from server".to_string()),
        ));
    }
    Ok(response.info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Duplex {
        written: Vec<u8>,
        reply: Cursor<Vec<u8>>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reply.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn request_is_framed_with_length() {
        let packet = encode_request(&[Metric::new("load", 1.5)], 1_700_000_000).expect("encodes");
        assert_eq!(&packet[..5], HEADER);
        let length = u64::from_le_bytes(packet[5..13].try_into().expect("eight bytes")) as usize;
        assert_eq!(length, packet.len() - 13);
        let body: serde_json::Value = serde_json::from_slice(&packet[13..]).expect("json");
        assert_eq!(body["request"], "sender data");
        assert_eq!(body["data"][0]["host"], "localhost");
        assert_eq!(body["data"][0]["value"], "1.5");
        assert_eq!(body["data"][0]["clock"], 1_700_000_000);
    }

    #[test]
    fn send_reads_success_info() {
        let reply = frame(br#"{"response":"success","info":"processed: 1; failed: 0"}"#);
        let mut stream = Duplex {
            written: Vec::new(),
            reply: Cursor::new(reply),
        };
        let info = send_at(&mut stream, &[Metric::new("up", 1).host("web1").clock(5)], 10).expect("sent");
        assert_eq!(info.as_deref(), Some("processed: 1; failed: 0"));
        assert!(stream.written.starts_with(HEADER));
    }

    #[test]
    fn oversized_lengths_are_rejected() {
        let mut reply = HEADER.to_vec();
        reply.extend_from_slice(&(u64::MAX / 2).to_le_bytes());
        let mut stream = Duplex {
            written: Vec::new(),
            reply: Cursor::new(reply),
        };
        let err = send_at(&mut stream, &[Metric::new("up", 1)], 10).expect_err("too long");
        assert!(matches!(err, SenderError::BadHeader));

        let mut huge = HEADER.to_vec();
        huge.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(decode_response(&huge), Err(SenderError::BadHeader)));

        let mut just_over = HEADER.to_vec();
        just_over.extend_from_slice(&(MAX_RESPONSE as u64 + 1).to_le_bytes());
        assert!(matches!(decode_response(&just_over), Err(SenderError::BadHeader)));
    }

    #[test]
    fn truncated_bodies_are_rejected() {
        let mut packet = frame(br#"{"response":"success"}"#);
        packet.truncate(packet.len() - 3);
        assert!(matches!(decode_response(&packet), Err(SenderError::BadHeader)));
    }

    #[test]
    fn failures_and_bad_headers_surface() {
        let reply = frame(br#"{"response":"failed","info":"bad key"}"#);
        let mut stream = Duplex {
            written: Vec::new(),
            reply: Cursor::new(reply),
        };
        let err = send_at(&mut stream, &[Metric::new("up", 1)], 10).expect_err("rejected");
        assert!(matches!(err, SenderError::Rejected(info) if info == "bad key"));

        assert!(matches!(decode_response(b"HTTP/1.1 400"), Err(SenderError::BadHeader)));
        let decoded = decode_response(&frame(br#"{"response":"success"}"#)).expect("decodes");
        assert_eq!(decoded.response, "success");
    }
}
