//! Command middleware chain.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::context::CommandContext;
use super::error::CommandError;

/// One stage of the command pipeline. Call `next.run(context)` to continue.
#[async_trait]
pub trait CommandMiddleware: Send + Sync {
    async fn handle(
        &self,
        context: &mut CommandContext,
        next: Next<'_>,
    ) -> Result<(), CommandError>;
}

/// The rest of the chain after the current stage.
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn CommandMiddleware>],
}

impl Next<'_> {
    pub async fn run(self, context: &mut CommandContext) -> Result<(), CommandError> {
        match self.middlewares.split_first() {
            Some((head, tail)) => head.handle(context, Next { middlewares: tail }).await,
            None => Ok(()),
        }
    }
}

/// Terminal stage built from a closure.
pub struct HandlerFn<F>(F);

/// Wrap a closure as the final stage (typically aggregate dispatch).
pub fn handler<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut CommandContext) -> Result<(), CommandError> + Send + Sync + 'static,
{
    HandlerFn(f)
}

#[async_trait]
impl<F> CommandMiddleware for HandlerFn<F>
where
    F: Fn(&mut CommandContext) -> Result<(), CommandError> + Send + Sync + 'static,
{
    async fn handle(
        &self,
        context: &mut CommandContext,
        next: Next<'_>,
    ) -> Result<(), CommandError> {
        (self.0)(context)?;
        next.run(context).await
    }
}

/// Runs commands through the registered middlewares in order.
#[derive(Clone, Default)]
pub struct CommandBus {
    middlewares: Vec<Arc<dyn CommandMiddleware>>,
}

impl CommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage. Returns `self` for chaining.
    pub fn with(mut self, middleware: impl CommandMiddleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn with_shared(mut self, middleware: Arc<dyn CommandMiddleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub async fn publish(
        &self,
        mut context: CommandContext,
    ) -> Result<CommandContext, CommandError> {
        let name = context.command().name();
        Next {
            middlewares: &self.middlewares,
        }
        .run(&mut context)
        .await
        .inspect_err(|err| debug!(command = name, error = %err, "command failed"))?;
        Ok(context)
    }
}
