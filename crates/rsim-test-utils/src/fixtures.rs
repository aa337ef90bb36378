//! A scriptable component for kernel tests.
//!
//! [`ScriptedComponent`] logs every hook call to an [`EventLog`] as
//! `"{name}:{event}"` and then runs an optional closure:
//!
//! | Hook | Log entry |
//! |------|-----------|
//! | `init` | `name:init` |
//! | `on_pre_step` | `name:pre` |
//! | `on_post_step` | `name:post` |
//! | `on_message` | `name:msg:{major}:{minor}` |
//! | `finish` | `name:finish` |
//!
//! Subscriptions and tick registrations declared on the builder are
//! made from `init`, before the `on_init` closure runs.

use rsim_core::{Component, ComponentContext, ComponentError, Message, MessageType, Priority};

use crate::EventLog;

type HookFn = Box<dyn FnMut(&mut dyn ComponentContext) -> Result<(), ComponentError> + Send>;
type MessageFn =
    Box<dyn FnMut(&mut dyn ComponentContext, &Message) -> Result<(), ComponentError> + Send>;
type FinishFn = Box<dyn FnMut() -> Result<(), ComponentError> + Send>;

pub struct ScriptedComponent {
    name: String,
    priority: Priority,
    log: EventLog,
    subscriptions: Vec<MessageType>,
    pre_step: bool,
    post_step: bool,
    on_init: Option<HookFn>,
    on_pre_step: Option<HookFn>,
    on_post_step: Option<HookFn>,
    on_message: Option<MessageFn>,
    on_finish: Option<FinishFn>,
}

impl ScriptedComponent {
    pub fn new(name: impl Into<String>, log: &EventLog) -> Self {
        Self {
            name: name.into(),
            priority: Priority::Normal,
            log: log.clone(),
            subscriptions: Vec::new(),
            pre_step: false,
            post_step: false,
            on_init: None,
            on_pre_step: None,
            on_post_step: None,
            on_message: None,
            on_finish: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Subscribe to `message_type` during `init`.
    pub fn subscribe(mut self, message_type: MessageType) -> Self {
        self.subscriptions.push(message_type);
        self
    }

    /// Register for pre-step ticks during `init`.
    pub fn pre_step(mut self) -> Self {
        self.pre_step = true;
        self
    }

    /// Register for post-step ticks during `init`.
    pub fn post_step(mut self) -> Self {
        self.post_step = true;
        self
    }

    pub fn on_init(
        mut self,
        f: impl FnMut(&mut dyn ComponentContext) -> Result<(), ComponentError> + Send + 'static,
    ) -> Self {
        self.on_init = Some(Box::new(f));
        self
    }

    pub fn on_pre_step(
        mut self,
        f: impl FnMut(&mut dyn ComponentContext) -> Result<(), ComponentError> + Send + 'static,
    ) -> Self {
        self.on_pre_step = Some(Box::new(f));
        self
    }

    pub fn on_post_step(
        mut self,
        f: impl FnMut(&mut dyn ComponentContext) -> Result<(), ComponentError> + Send + 'static,
    ) -> Self {
        self.on_post_step = Some(Box::new(f));
        self
    }

    pub fn on_message(
        mut self,
        f: impl FnMut(&mut dyn ComponentContext, &Message) -> Result<(), ComponentError>
            + Send
            + 'static,
    ) -> Self {
        self.on_message = Some(Box::new(f));
        self
    }

    pub fn on_finish(
        mut self,
        f: impl FnMut() -> Result<(), ComponentError> + Send + 'static,
    ) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }

    fn record(&self, event: &str) {
        self.log.push(format!("{}:{event}", self.name));
    }
}

impl Component for ScriptedComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn init(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        self.record("init");
        for ty in &self.subscriptions {
            ctx.subscribe(*ty);
        }
        if self.pre_step {
            ctx.register_pre_step();
        }
        if self.post_step {
            ctx.register_post_step();
        }
        match self.on_init.as_mut() {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    fn finish(&mut self) -> Result<(), ComponentError> {
        self.record("finish");
        match self.on_finish.as_mut() {
            Some(f) => f(),
            None => Ok(()),
        }
    }

    fn on_pre_step(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        self.record("pre");
        match self.on_pre_step.as_mut() {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    fn on_post_step(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        self.record("post");
        match self.on_post_step.as_mut() {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    fn on_message(
        &mut self,
        ctx: &mut dyn ComponentContext,
        message: &Message,
    ) -> Result<(), ComponentError> {
        self.record(&format!("msg:{}", message.message_type()));
        match self.on_message.as_mut() {
            Some(f) => f(ctx, message),
            None => Ok(()),
        }
    }
}
