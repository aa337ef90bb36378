//! Benchmark profiles for the rsim kernel.
//!
//! - [`fan_out_broker`]: a broker with many subscribers spread over all
//!   five priorities and a handful of message types
//! - [`busy_kernel`]: a lockstep kernel whose components tick every step
//!   and echo messages to each other

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::time::Duration;

use rsim_broker::MessageBroker;
use rsim_core::{
    CollaboratorError, Component, ComponentContext, ComponentError, ComponentId, Message,
    MessageType, PhysicsWorld, Priority,
};
use rsim_engine::{KernelConfig, SimKernel};
use slotmap::SlotMap;

/// Message types used by the profiles.
pub fn bench_type(i: usize) -> MessageType {
    MessageType::new(200, i as u16)
}

/// Broker with `components` subscribers, each subscribed to `types`
/// message types, priorities assigned round-robin.
pub fn fan_out_broker(components: usize, types: usize) -> (MessageBroker, Vec<ComponentId>) {
    let mut keys: SlotMap<ComponentId, ()> = SlotMap::with_key();
    let mut broker = MessageBroker::new();
    let ids: Vec<ComponentId> = (0..components)
        .map(|i| {
            let id = keys.insert(());
            let priority = Priority::ALL[i % Priority::COUNT];
            broker.attach(id, priority).unwrap();
            for t in 0..types {
                broker.subscribe(id, bench_type(t)).unwrap();
            }
            id
        })
        .collect();
    (broker, ids)
}

/// Physics collaborator that does no work.
pub struct NullWorld;

impl PhysicsWorld for NullWorld {
    fn step(&mut self, _dt: Duration, _substeps: u32) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Ticks every step and republishes every message it receives once.
struct Echo {
    priority: Priority,
    ty: MessageType,
}

impl Component for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn init(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        ctx.subscribe(self.ty);
        ctx.register_pre_step();
        ctx.register_post_step();
        Ok(())
    }

    fn on_pre_step(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        ctx.publish(Message::signal(self.ty));
        Ok(())
    }
}

/// Initialized lockstep kernel with `components` echo components.
pub fn busy_kernel(components: usize) -> SimKernel {
    let mut kernel = SimKernel::new(KernelConfig {
        simulate_real: false,
        ..KernelConfig::default()
    })
    .unwrap();
    kernel.set_world(NullWorld);
    for i in 0..components {
        kernel.add_component(Echo {
            priority: Priority::ALL[i % Priority::COUNT],
            ty: bench_type(i % 4),
        });
    }
    kernel.init().unwrap();
    kernel
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsim_engine::StepOutcome;

    #[test]
    fn fan_out_broker_subscribes_everyone() {
        let (broker, ids) = fan_out_broker(10, 3);
        assert_eq!(ids.len(), 10);
        assert_eq!(broker.subscribers(bench_type(2)).count(), 10);
    }

    #[test]
    fn busy_kernel_steps() {
        let mut kernel = busy_kernel(5);
        assert_eq!(kernel.step(), StepOutcome::Stepped);
        assert!(kernel.last_metrics().messages_delivered > 0);
    }
}
