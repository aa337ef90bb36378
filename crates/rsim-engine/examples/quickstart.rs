//! rsim Quickstart: a lockstep simulation from scratch.
//!
//! Demonstrates:
//!   1. Implementing a physics collaborator (a falling point mass)
//!   2. Writing a component that reacts to ticks and messages
//!   3. Stepping the kernel by hand and reading the clocks
//!   4. Publishing a key press and handling it on the next step
//!
//! Run with:
//!   cargo run --example quickstart

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rsim_core::{
    CollaboratorError, Component, ComponentContext, ComponentError, KeyPressed, Message,
    MessageKind, PhysicsWorld, Priority,
};
use rsim_engine::{KernelConfig, SimKernel, StepOutcome};

// ─── Physics: one body under gravity ────────────────────────────

#[derive(Default)]
struct PointMass {
    state: Arc<Mutex<(f64, f64)>>, // (height m, velocity m/s)
}

impl PhysicsWorld for PointMass {
    fn step(&mut self, dt: Duration, substeps: u32) -> Result<(), CollaboratorError> {
        let h = dt.as_secs_f64() / f64::from(substeps);
        let mut s = self.state.lock().map_err(|_| CollaboratorError::StepFailed {
            reason: "state poisoned".into(),
        })?;
        for _ in 0..substeps {
            s.1 -= 9.81 * h;
            s.0 = (s.0 + s.1 * h).max(0.0);
        }
        Ok(())
    }
}

// ─── Component: altitude reporter with a key-driven "thrust" ────

struct Altimeter {
    body: Arc<Mutex<(f64, f64)>>,
}

impl Component for Altimeter {
    fn name(&self) -> &str {
        "altimeter"
    }

    fn priority(&self) -> Priority {
        Priority::Higher
    }

    fn init(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        ctx.subscribe(KeyPressed::TYPE);
        ctx.register_post_step();
        Ok(())
    }

    fn on_post_step(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        let (height, velocity) = *self
            .body
            .lock()
            .map_err(|_| ComponentError::failed("body poisoned"))?;
        println!(
            "t={:>4} ms  h={height:6.3} m  v={velocity:6.3} m/s",
            ctx.time_simulated().as_millis()
        );
        if height <= 0.0 {
            ctx.request_terminate();
        }
        Ok(())
    }

    fn on_message(
        &mut self,
        _ctx: &mut dyn ComponentContext,
        message: &Message,
    ) -> Result<(), ComponentError> {
        if let Some(KeyPressed { key }) = message.decode() {
            println!("key {key}: thrust");
            if let Ok(mut body) = self.body.lock() {
                body.1 += 2.0;
            }
        }
        Ok(())
    }
}

fn main() {
    let config = KernelConfig {
        step: Duration::from_millis(50),
        substeps: 4,
        simulate_real: false,
        time_end: Some(Duration::from_secs(5)),
        ..KernelConfig::default()
    };
    let mut kernel = SimKernel::new(config).unwrap();

    let world = PointMass::default();
    *world.state.lock().unwrap() = (2.0, 0.0);
    let body = Arc::clone(&world.state);
    kernel.set_world(world);
    kernel.add_component(Altimeter { body });
    kernel.init().unwrap();

    let mut steps = 0;
    loop {
        if steps == 5 {
            kernel.press_key(32);
        }
        match kernel.step() {
            StepOutcome::Terminated => break,
            _ => steps += 1,
        }
    }

    kernel.finish().unwrap();
    println!(
        "landed after {steps} steps ({} ms simulated)",
        kernel.time_simulated().as_millis()
    );
}
