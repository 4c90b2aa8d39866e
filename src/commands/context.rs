//! Routing context and the per-command context the pipeline passes along.

use std::collections::HashMap;

use serde_json::Value;

use super::command::Command;
use crate::id::NamedId;

/// Route parameter naming the schema (a name or a GUID).
pub const SCHEMA_NAME_PARAM: &str = "name";

/// Ambient request context: the app resolved for the request plus the route values.
#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    app: Option<NamedId>,
    values: HashMap<String, String>,
}

impl RouteContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self { app: None, values }
    }

    pub fn with_app(mut self, app: NamedId) -> Self {
        self.app = Some(app);
        self
    }

    pub fn app(&self) -> Option<&NamedId> {
        self.app.as_ref()
    }

    /// Get a route value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.get(SCHEMA_NAME_PARAM)
    }
}

/// A command on its way through the pipeline.
///
/// Middlewares may mutate the command in place; the terminal stage records
/// its result with [`CommandContext::complete`].
#[derive(Debug)]
pub struct CommandContext {
    command: Box<dyn Command>,
    route: Option<RouteContext>,
    result: Option<Value>,
}

impl CommandContext {
    pub fn new(command: Box<dyn Command>) -> Self {
        Self {
            command,
            route: None,
            result: None,
        }
    }

    pub fn with_route(mut self, route: RouteContext) -> Self {
        self.route = Some(route);
        self
    }

    pub fn command(&self) -> &dyn Command {
        self.command.as_ref()
    }

    pub fn command_mut(&mut self) -> &mut dyn Command {
        self.command.as_mut()
    }

    /// Downcast the command to its concrete type.
    pub fn command_as<C: Command>(&self) -> Option<&C> {
        self.command.as_any().downcast_ref::<C>()
    }

    /// `None` outside of a request (e.g. commands from background jobs).
    pub fn route(&self) -> Option<&RouteContext> {
        self.route.as_ref()
    }

    pub fn complete(&mut self, result: Value) {
        self.result = Some(result);
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<Value> {
        self.result
    }
}
