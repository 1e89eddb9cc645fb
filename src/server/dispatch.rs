use anyhow::Context;
use bytes::Bytes;

use crate::common::message::{ErrorCode, Request, Response, decode_request, encode_response};
use crate::handler::context::HandlerContext;
use crate::handler::delay::handle_delay_request;

/// Decode one request frame, run its handler and encode the reply.
///
/// Peer mistakes never surface as `Err`: a frame that does not decode is
/// answered with [`ErrorCode::MalformedRequest`] so the connection keeps its
/// one-reply-per-request rhythm. `Err` means the reply itself could not be
/// encoded.
pub fn dispatch_frame(frame: Bytes, handler_ctx: &mut HandlerContext) -> anyhow::Result<Vec<u8>> {
    let response = match decode_request(&frame) {
        Ok(Request::Delay { min, max }) => handle_delay_request(min, max, handler_ctx),
        Err(e) => {
            log::warn!("Failed to decode request ({} bytes): {:?}", frame.len(), e);
            handler_ctx.rejected += 1;
            Response::error(ErrorCode::MalformedRequest, format!("malformed request: {}", e))
        }
    };
    encode_response(&response).context("failed to encode response")
}
