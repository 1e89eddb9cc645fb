use crate::common::message::{ErrorCode, Response};
use crate::common::range::DelayRange;
use crate::handler::context::HandlerContext;

pub fn handle_delay_request(min: f64, max: f64, handler_ctx: &mut HandlerContext) -> Response {
    log::info!("Received request for delay range: [{}, {}]", min, max);

    let range = match DelayRange::new(min, max) {
        Ok(range) => range,
        Err(e) => {
            log::warn!("Rejecting delay request: {}", e);
            handler_ctx.rejected += 1;
            return Response::error(ErrorCode::from(&e), e.to_string());
        }
    };

    match handler_ctx.delay_source.sample(&range) {
        Ok(value) => {
            log::info!("Generated delay: {:.2} seconds", value);
            handler_ctx.served += 1;
            Response::Delay { value }
        }
        Err(e) => {
            log::warn!("Failed to sample delay for {}: {:?}", range, e);
            handler_ctx.rejected += 1;
            Response::error(ErrorCode::SamplingFailed, e.to_string())
        }
    }
}
