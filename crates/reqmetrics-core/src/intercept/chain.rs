use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::observation::Observation;
use super::{Interceptor, Outcome, RequestAttrs};

/// An interceptor whose `on_enter` has run; fires its finish half once.
pub(crate) trait Armed: Send {
    fn name(&self) -> &'static str;
    fn fire(self: Box<Self>, req: &RequestAttrs, outcome: &Outcome);
}

struct ArmedWith<I: Interceptor> {
    interceptor: Arc<I>,
    state: I::State,
}

impl<I: Interceptor> Armed for ArmedWith<I> {
    fn name(&self) -> &'static str {
        self.interceptor.name()
    }

    fn fire(self: Box<Self>, req: &RequestAttrs, outcome: &Outcome) {
        let ArmedWith { interceptor, state } = *self;
        interceptor.on_finish(req, outcome, state);
    }
}

/// Type-erased chain link.
trait Link: Send + Sync {
    fn name(&self) -> &'static str;
    fn arm(&self, req: &RequestAttrs) -> Box<dyn Armed>;
}

impl<I: Interceptor> Link for Arc<I> {
    fn name(&self) -> &'static str {
        Interceptor::name(self.as_ref())
    }

    fn arm(&self, req: &RequestAttrs) -> Box<dyn Armed> {
        let state = self.on_enter(req);
        Box::new(ArmedWith {
            interceptor: Arc::clone(self),
            state,
        })
    }
}

/// Ordered sequence of interceptors.
#[derive(Default)]
pub struct Chain {
    links: Vec<Box<dyn Link>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor (builder style).
    pub fn with<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.push(interceptor);
        self
    }

    pub fn push<I: Interceptor>(&mut self, interceptor: I) {
        self.links.push(Box::new(Arc::new(interceptor)));
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.links.iter().map(|l| l.name()).collect()
    }

    /// Run every `on_enter` and return the armed observation.
    ///
    /// A panicking `on_enter` is logged and skipped; interceptors already
    /// armed still finish.
    pub fn enter(&self, req: RequestAttrs) -> Arc<Observation> {
        let mut armed = Vec::with_capacity(self.links.len());
        for link in &self.links {
            match catch_unwind(AssertUnwindSafe(|| link.arm(&req))) {
                Ok(a) => armed.push(a),
                Err(_) => {
                    tracing::error!(interceptor = link.name(), method = %req.method, path = %req.path, "on_enter panicked");
                }
            }
        }
        Arc::new(Observation::new(req, armed))
    }
}
