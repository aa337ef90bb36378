//! The [`ComponentContext`] handed to component hooks.

use std::sync::atomic::Ordering;
use std::time::Duration;

use rsim_broker::MessageBroker;
use rsim_core::{
    Component, ComponentContext, ComponentId, Message, MessageType, PhysicsWorld, VisWorld,
};
use tracing::trace;

use crate::kernel::KernelState;

/// Borrowed view of the kernel for the duration of one hook call.
///
/// The component whose hook is running is out of its registry slot, so
/// nothing reachable from here can call back into it.
pub(crate) struct KernelCtx<'a> {
    id: ComponentId,
    broker: &'a mut MessageBroker,
    state: &'a mut KernelState,
}

impl<'a> KernelCtx<'a> {
    pub(crate) fn new(
        id: ComponentId,
        broker: &'a mut MessageBroker,
        state: &'a mut KernelState,
    ) -> Self {
        Self { id, broker, state }
    }
}

impl ComponentContext for KernelCtx<'_> {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn time_simulated(&self) -> Duration {
        self.state.clock.simulated()
    }

    fn time_real(&self) -> Duration {
        self.state.clock.real.elapsed()
    }

    fn time_step(&self) -> Duration {
        self.state.config.step
    }

    fn subscribe(&mut self, message_type: MessageType) {
        if let Err(err) = self.broker.subscribe(self.id, message_type) {
            trace!(component = %self.id, %message_type, %err, "subscribe ignored");
        }
    }

    fn unsubscribe(&mut self, message_type: MessageType) {
        if let Err(err) = self.broker.unsubscribe(self.id, message_type) {
            trace!(component = %self.id, %message_type, %err, "unsubscribe ignored");
        }
    }

    fn unsubscribe_all(&mut self) {
        if let Err(err) = self.broker.unsubscribe_all(self.id) {
            trace!(component = %self.id, %err, "unsubscribe_all ignored");
        }
    }

    fn publish(&mut self, message: Message) {
        self.broker.publish(message);
    }

    fn register_pre_step(&mut self) {
        if self.state.is_live(self.id) {
            self.state.pre_step.register(self.id);
        }
    }

    fn unregister_pre_step(&mut self) {
        self.state.pre_step.unregister(self.id);
    }

    fn register_post_step(&mut self) {
        if self.state.is_live(self.id) {
            self.state.post_step.register(self.id);
        }
    }

    fn unregister_post_step(&mut self) {
        self.state.post_step.unregister(self.id);
    }

    fn add_component(&mut self, component: Box<dyn Component>) -> ComponentId {
        self.state.add(self.broker, component)
    }

    fn remove_component(&mut self, id: ComponentId) -> bool {
        self.state.request_removal(self.broker, id)
    }

    fn pause(&mut self) {
        self.state.pause();
    }

    fn resume(&mut self) {
        self.state.resume();
    }

    fn is_paused(&self) -> bool {
        self.state.paused
    }

    fn request_terminate(&mut self) {
        self.state.terminate.store(true, Ordering::Release);
    }

    fn world(&mut self) -> Option<&mut dyn PhysicsWorld> {
        match self.state.world.as_mut() {
            Some(world) => Some(world.as_mut()),
            None => None,
        }
    }

    fn vis_world(&mut self) -> Option<&mut dyn VisWorld> {
        match self.state.vis.as_mut() {
            Some(vis) => Some(vis.as_mut()),
            None => None,
        }
    }
}
