//! `google.rpc.Status` encoding.
//!
//! gRPC carries structured error details in the `grpc-status-details-bin`
//! trailer as a serialized `google.rpc.Status`. tonic exposes that trailer as
//! the raw `details` bytes of a [`Status`].

use bytes::Bytes;
use prost::Message;
use tonic::{Code, Status};

/// Wire form of `google.rpc.Status`
#[derive(Clone, PartialEq, prost::Message)]
pub struct RpcStatus {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, repeated, tag = "3")]
    pub details: Vec<prost_types::Any>,
}

/// Build a status carrying packed detail messages
pub fn status_with_details(
    code: Code,
    message: impl Into<String>,
    details: Vec<prost_types::Any>,
) -> Status {
    let message = message.into();
    if details.is_empty() {
        return Status::new(code, message);
    }
    let encoded = RpcStatus {
        code: code as i32,
        message: message.clone(),
        details,
    }
    .encode_to_vec();
    Status::with_details(code, message, Bytes::from(encoded))
}

/// Decode the detail messages carried by a status
pub fn decode_details(status: &Status) -> Result<Vec<prost_types::Any>, prost::DecodeError> {
    if status.details().is_empty() {
        return Ok(Vec::new());
    }
    Ok(RpcStatus::decode(status.details())?.details)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_status_without_details() {
        let status = status_with_details(Code::NotFound, "gone", Vec::new());
        assert_eq!(status.code(), Code::NotFound);
        assert!(status.details().is_empty());
        assert!(decode_details(&status).unwrap().is_empty());
    }

    #[test]
    fn test_details_survive_encoding() {
        let any = prost_types::Any {
            type_url: "type.googleapis.com/google.rpc.DebugInfo".to_string(),
            value: vec![0x12, 0x02, b'h', b'i'],
        };
        let status = status_with_details(Code::FailedPrecondition, "nope", vec![any.clone()]);
        assert_eq!(status.code(), Code::FailedPrecondition);
        assert_eq!(status.message(), "nope");

        let decoded = RpcStatus::decode(status.details()).unwrap();
        assert_eq!(decoded.code, Code::FailedPrecondition as i32);
        assert_eq!(decoded.message, "nope");
        assert_eq!(decode_details(&status).unwrap(), vec![any]);
    }
}
