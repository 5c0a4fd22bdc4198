use crate::command::{Command, Method};
use crate::notification::Notification;
use biolink_core::constants::STATUS_OK;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation identifier assigned by the channel to each outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        RequestId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A command tagged with the metadata needed to correlate its response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "Id")]
    pub id: RequestId,

    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    pub fn new(id: RequestId, command: Command) -> Self {
        Request { id, command }
    }

    pub fn method(&self) -> Method {
        self.command.method
    }
}

/// Service reply to exactly one [`Request`].
///
/// The data blob is opaque here; only the caller knows how to decode it for
/// the command it sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "Id")]
    pub id: RequestId,

    #[serde(rename = "Method")]
    pub method: Method,

    #[serde(rename = "Result", default)]
    pub status: i32,

    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Response {
    /// Successful response to `request` carrying `data`.
    pub fn ok(request: &Request, data: Option<String>) -> Self {
        Response {
            id: request.id,
            method: request.method(),
            status: STATUS_OK,
            data,
        }
    }

    /// Failed response to `request` with the service status code.
    pub fn failed(request: &Request, status: i32) -> Self {
        Response {
            id: request.id,
            method: request.method(),
            status,
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Data blob, treating an empty string like an absent one.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref().filter(|data| !data.is_empty())
    }
}

/// Anything the service may push towards the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inbound {
    Response(Response),
    Notification(Notification),
}

impl From<Response> for Inbound {
    fn from(response: Response) -> Self {
        Inbound::Response(response)
    }
}

impl From<Notification> for Inbound {
    fn from(notification: Notification) -> Self {
        Inbound::Notification(notification)
    }
}
