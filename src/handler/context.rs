use crate::common::config::ServerConfig;
use crate::generator::uniform::UniformDelaySource;
use crate::traits::delay_source::DelaySource;

/// State shared by every exchange the server handles. Owned by the serve
/// loop and borrowed mutably per request.
pub struct HandlerContext {
    pub delay_source: Box<dyn DelaySource>,
    pub served: u64,
    pub rejected: u64,
}

impl HandlerContext {
    pub fn new(delay_source: Box<dyn DelaySource>) -> Self {
        Self {
            delay_source,
            served: 0,
            rejected: 0,
        }
    }

    pub fn from_config(server_config: &ServerConfig) -> Self {
        Self::new(Box::new(UniformDelaySource::from_seed(server_config.rng_seed)))
    }
}
