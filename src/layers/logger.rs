use axum::{Extension, middleware::AddExtension};
use tower::Layer;

use crate::{config::DispatchSettings, logger::DualSinkLogger, sinks::Sink};

#[derive(Clone)]
pub struct LoggerLayer(pub DualSinkLogger);

impl LoggerLayer {
    pub fn new(log_group: Sink, index: Sink, settings: DispatchSettings) -> Self {
        Self(DualSinkLogger::new(log_group, index, settings))
    }
}

impl<S> Layer<S> for LoggerLayer {
    type Service = AddExtension<S, DualSinkLogger>;

    fn layer(&self, inner: S) -> Self::Service {
        Extension(self.0.clone()).layer(inner)
    }
}
