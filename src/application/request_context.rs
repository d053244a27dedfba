use std::future::Future;
use std::net::IpAddr;
use uuid::Uuid;

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// Who triggered the current operation and from where.
///
/// Middleware attaches a context with [`RequestContext::scope`]; change
/// capture only ever reads it through [`RequestContext::current`]. The
/// context is local to the task running the scoped future, so concurrent
/// requests never observe each other's actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub actor: Option<Uuid>,
    pub ip_address: Option<IpAddr>,
}

impl RequestContext {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            actor: None,
            ip_address: None,
        }
    }

    #[must_use]
    pub const fn with_actor(mut self, actor: Uuid) -> Self {
        self.actor = Some(actor);
        self
    }

    #[must_use]
    pub const fn with_ip_address(mut self, ip: IpAddr) -> Self {
        self.ip_address = Some(ip);
        self
    }

    /// Runs `fut` with this context attached.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        REQUEST_CONTEXT.scope(self, fut).await
    }

    /// The context attached to the current task, if any.
    pub fn current() -> Option<RequestContext> {
        REQUEST_CONTEXT.try_with(Clone::clone).ok()
    }
}
