//! The [`Component`] contract and the kernel services it may call.
//!
//! Components are simulation participants. The kernel owns them and
//! invokes their hooks serially; a component reaches back into the
//! kernel only through the [`ComponentContext`] handed to each hook,
//! never through a stored pointer.

use std::time::Duration;

use crate::collaborator::{PhysicsWorld, VisWorld};
use crate::error::ComponentError;
use crate::id::{ComponentId, MessageType};
use crate::message::Message;
use crate::priority::Priority;

/// A simulation participant.
///
/// Every hook has a no-op default, so a component implements only what
/// it reacts to. Hooks are cooperative: a hook that blocks stalls the
/// kernel loop that called it.
///
/// # Contract
///
/// - `init` runs once, at the first kernel safe point after the
///   component was added.
/// - `on_pre_step` / `on_post_step` run only while the component is
///   registered for that tick list.
/// - `on_message` runs once per delivered message, in batch order.
/// - `finish` runs once when an initialized component is removed or the
///   kernel shuts down.
pub trait Component: Send + 'static {
    /// Name used in log records.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Priority class used to order message delivery between
    /// components. Read once, when the component is added.
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    /// Called at the first safe point after the component is added.
    fn init(&mut self, _ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Called when the component leaves the kernel.
    fn finish(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Called before each physics step while registered for pre-step.
    fn on_pre_step(&mut self, _ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Called after each physics step while registered for post-step.
    fn on_post_step(&mut self, _ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Called once for each message delivered to this component.
    fn on_message(
        &mut self,
        _ctx: &mut dyn ComponentContext,
        _message: &Message,
    ) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Kernel services available to a component while one of its hooks runs.
///
/// Subscription changes take effect immediately. Tick-list changes
/// requested while that list is being walked are applied once the walk
/// finishes. Added components are initialized at the next safe point.
pub trait ComponentContext {
    /// Id of the component whose hook is running.
    fn id(&self) -> ComponentId;

    /// Simulated time accumulated by successful physics steps.
    fn time_simulated(&self) -> Duration;

    /// Real time elapsed since the kernel clock started, excluding pauses.
    fn time_real(&self) -> Duration;

    /// Fixed physics step duration.
    fn time_step(&self) -> Duration;

    /// Subscribe this component to a message type. Idempotent.
    fn subscribe(&mut self, message_type: MessageType);

    /// Drop this component's subscription to a message type.
    fn unsubscribe(&mut self, message_type: MessageType);

    /// Drop all of this component's subscriptions.
    fn unsubscribe_all(&mut self);

    /// Queue a message for the next delivery batch.
    fn publish(&mut self, message: Message);

    /// Receive `on_pre_step` from the next pre-step round on.
    fn register_pre_step(&mut self);

    /// Stop receiving `on_pre_step`.
    fn unregister_pre_step(&mut self);

    /// Receive `on_post_step` from the next post-step round on.
    fn register_post_step(&mut self);

    /// Stop receiving `on_post_step`.
    fn unregister_post_step(&mut self);

    /// Attach another component. It is initialized at the next safe point.
    fn add_component(&mut self, component: Box<dyn Component>) -> ComponentId;

    /// Remove a component. Returns `false` if the id is unknown.
    fn remove_component(&mut self, id: ComponentId) -> bool;

    /// Remove the component whose hook is running.
    fn remove_self(&mut self) {
        let id = self.id();
        self.remove_component(id);
    }

    /// Stop simulated time from advancing.
    fn pause(&mut self);

    /// Resume simulated time.
    fn resume(&mut self);

    /// Whether the simulation is paused.
    fn is_paused(&self) -> bool;

    /// Ask both kernel loops to stop after their current iteration.
    fn request_terminate(&mut self);

    /// The physics collaborator, if one is attached.
    fn world(&mut self) -> Option<&mut dyn PhysicsWorld>;

    /// The rendering collaborator, if one is attached.
    fn vis_world(&mut self) -> Option<&mut dyn VisWorld>;
}
