//! WebSocket messages.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CloseCode, WsError, WsResult};

/// A WebSocket message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Binary(Bytes),
    /// Ping control frame.
    Ping(Bytes),
    /// Pong control frame.
    Pong(Bytes),
    /// Close control frame.
    Close(Option<CloseFrame>),
}

impl Message {
    /// Creates a text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a binary message.
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::Binary(data.into())
    }

    /// Creates a close message.
    pub fn close(code: CloseCode, reason: impl Into<String>) -> Self {
        Self::Close(Some(CloseFrame::new(code, reason)))
    }

    /// Serializes `value` into a JSON text message.
    pub fn json<T: Serialize>(value: &T) -> WsResult<Self> {
        Ok(Self::Text(serde_json::to_string(value)?))
    }

    /// Parses a text or binary message as JSON.
    pub fn parse_json<T: DeserializeOwned>(&self) -> WsResult<T> {
        match self {
            Self::Text(text) => Ok(serde_json::from_str(text)?),
            Self::Binary(data) => Ok(serde_json::from_slice(data)?),
            other => Err(WsError::UnexpectedMessage {
                expected: "text or binary",
                actual: other.kind(),
            }),
        }
    }

    /// Returns a short name for the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Ping(_) => "ping",
            Self::Pong(_) => "pong",
            Self::Close(_) => "close",
        }
    }

    /// Returns `true` for close frames.
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close(_))
    }

    /// Returns `true` for ping, pong and close frames.
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Ping(_) | Self::Pong(_) | Self::Close(_))
    }

    /// Returns the text of a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Bytes> for Message {
    fn from(data: Bytes) -> Self {
        Self::Binary(data)
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(data))
    }
}

impl From<tungstenite::Message> for Message {
    fn from(msg: tungstenite::Message) -> Self {
        match msg {
            tungstenite::Message::Text(text) => Self::Text(text.as_str().to_owned()),
            tungstenite::Message::Binary(data) => Self::Binary(data),
            tungstenite::Message::Ping(data) => Self::Ping(data),
            tungstenite::Message::Pong(data) => Self::Pong(data),
            tungstenite::Message::Close(frame) => Self::Close(frame.map(CloseFrame::from)),
            // Raw frames are never yielded while reading.
            tungstenite::Message::Frame(frame) => Self::Binary(Bytes::copy_from_slice(frame.payload())),
        }
    }
}

impl From<Message> for tungstenite::Message {
    fn from(msg: Message) -> Self {
        match msg {
            Message::Text(text) => Self::Text(text.into()),
            Message::Binary(data) => Self::Binary(data),
            Message::Ping(data) => Self::Ping(data),
            Message::Pong(data) => Self::Pong(data),
            Message::Close(frame) => Self::Close(frame.map(Into::into)),
        }
    }
}

/// Code and reason of a close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    /// Numeric close code.
    pub code: u16,
    /// Close reason.
    pub reason: String,
}

impl CloseFrame {
    /// Creates a close frame.
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code: code.as_u16(),
            reason: reason.into(),
        }
    }

    /// Returns the code as a known [`CloseCode`].
    pub fn close_code(&self) -> Option<CloseCode> {
        CloseCode::from_u16(self.code)
    }
}

impl From<tungstenite::protocol::CloseFrame> for CloseFrame {
    fn from(frame: tungstenite::protocol::CloseFrame) -> Self {
        Self {
            code: frame.code.into(),
            reason: frame.reason.as_str().to_owned(),
        }
    }
}

impl From<CloseFrame> for tungstenite::protocol::CloseFrame {
    fn from(frame: CloseFrame) -> Self {
        Self {
            code: frame.code.into(),
            reason: frame.reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        seq: u32,
    }

    #[test]
    fn test_json_messages() {
        let msg = Message::json(&Ping { seq: 4 }).unwrap();
        assert_eq!(msg.as_text(), Some(r#"{"seq":4}"#));
        assert_eq!(msg.parse_json::<Ping>().unwrap(), Ping { seq: 4 });

        let binary = Message::binary(Bytes::from_static(br#"{"seq":5}"#));
        assert_eq!(binary.parse_json::<Ping>().unwrap(), Ping { seq: 5 });
    }

    #[test]
    fn test_parse_json_rejects_control_frames() {
        let err = Message::Ping(Bytes::new()).parse_json::<Ping>().unwrap_err();
        assert!(matches!(err, WsError::UnexpectedMessage { actual: "ping", .. }));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Message::from("hi").kind(), "text");
        assert!(Message::close(CloseCode::Normal, "done").is_control());
        assert!(!Message::from(vec![1, 2]).is_control());
    }

    #[test]
    fn test_tungstenite_conversion() {
        let frame = CloseFrame::new(CloseCode::PolicyViolation, "nope");
        let native: tungstenite::Message = Message::Close(Some(frame.clone())).into();
        let back = Message::from(native);
        assert_eq!(back, Message::Close(Some(frame)));

        let native: tungstenite::Message = Message::text("hello").into();
        assert_eq!(Message::from(native).as_text(), Some("hello"));
    }
}
