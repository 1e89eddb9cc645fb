use bincode::config;
use bincode::{Decode, Encode};

use crate::common::range::{DelayRange, RangeError};

/// Request frame sent by a client. One request is answered by exactly one
/// [`Response`] on the same connection.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum Request {
    Delay { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum Response {
    Delay { value: f64 },
    Error { code: ErrorCode, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum ErrorCode {
    /// Frame did not decode as a [`Request`].
    MalformedRequest,
    /// `min > max`.
    InvalidRange,
    /// A bound was NaN or infinite.
    NonFiniteBound,
    /// The range span is not representable as an `f64`.
    SamplingFailed,
}

impl Request {
    pub fn delay(range: &DelayRange) -> Self {
        Request::Delay {
            min: range.min(),
            max: range.max(),
        }
    }
}

impl Response {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error {
            code,
            message: message.into(),
        }
    }
}

impl From<&RangeError> for ErrorCode {
    fn from(err: &RangeError) -> Self {
        match err {
            RangeError::NonFinite { .. } => ErrorCode::NonFiniteBound,
            RangeError::Inverted { .. } => ErrorCode::InvalidRange,
        }
    }
}

pub fn encode_request(request: &Request) -> anyhow::Result<Vec<u8>> {
    Ok(bincode::encode_to_vec(request, config::standard())?)
}

pub fn encode_response(response: &Response) -> anyhow::Result<Vec<u8>> {
    Ok(bincode::encode_to_vec(response, config::standard())?)
}

pub fn decode_request(frame: &[u8]) -> anyhow::Result<Request> {
    decode_exact(frame)
}

pub fn decode_response(frame: &[u8]) -> anyhow::Result<Response> {
    decode_exact(frame)
}

// A frame carries exactly one message; leftover bytes mean the peer speaks
// a different schema.
fn decode_exact<T: Decode<()>>(frame: &[u8]) -> anyhow::Result<T> {
    let (message, read): (T, usize) = bincode::decode_from_slice(frame, config::standard())?;
    if read != frame.len() {
        return Err(anyhow::anyhow!(
            "trailing bytes in frame: decoded {} of {}",
            read,
            frame.len()
        ));
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_keeps_min_first() {
        let range = DelayRange::new(0.5, 2.0).unwrap();
        let bytes = encode_request(&Request::delay(&range)).unwrap();
        assert_eq!(
            decode_request(&bytes).unwrap(),
            Request::Delay { min: 0.5, max: 2.0 }
        );
    }

    #[test]
    fn error_response_carries_code_and_message() {
        let response = Response::error(ErrorCode::InvalidRange, "min > max");
        let bytes = encode_response(&response).unwrap();
        match decode_response(&bytes).unwrap() {
            Response::Error { code, message } => {
                assert_eq!(code, ErrorCode::InvalidRange);
                assert_eq!(message, "min > max");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn rejects_truncated_frame() {
        let bytes = encode_request(&Request::Delay { min: 1.0, max: 2.0 }).unwrap();
        assert!(decode_request(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = encode_request(&Request::Delay { min: 1.0, max: 2.0 }).unwrap();
        bytes.extend_from_slice(&3.0f64.to_le_bytes());
        assert!(decode_request(&bytes).is_err());
    }

    #[test]
    fn rejects_unknown_variant() {
        assert!(decode_request(&[7]).is_err());
    }

    #[test]
    fn maps_range_errors_to_codes() {
        let inverted = DelayRange::new(5.0, 1.0).unwrap_err();
        let non_finite = DelayRange::new(f64::NAN, 1.0).unwrap_err();
        assert_eq!(ErrorCode::from(&inverted), ErrorCode::InvalidRange);
        assert_eq!(ErrorCode::from(&non_finite), ErrorCode::NonFiniteBound);
    }
}
