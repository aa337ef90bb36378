//! rsim RealtimeSim: physics and render loops on two threads.
//!
//! Demonstrates:
//!   1. Starting a RealtimeSim with throttled physics and a render loop
//!   2. Sending key presses from another thread through a SimHandle
//!   3. Pausing and resuming simulated time
//!   4. Stopping the run with a Watchdog and reading the RunReport
//!
//! Run with:
//!   RUST_LOG=rsim_engine=debug cargo run --example realtime

use std::thread;
use std::time::Duration;

use rsim_core::{
    CollaboratorError, Component, ComponentContext, ComponentError, KeyPressed, Message,
    MessageKind, PhysicsWorld, VisWorld,
};
use rsim_engine::{KernelConfig, RealtimeSim, SimKernel, Watchdog};
use tracing_subscriber::EnvFilter;

struct Idle;

impl PhysicsWorld for Idle {
    fn step(&mut self, _dt: Duration, _substeps: u32) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

struct Console {
    frames: u64,
}

impl VisWorld for Console {
    fn step(&mut self) -> Result<(), CollaboratorError> {
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CollaboratorError> {
        println!("rendered {} frames", self.frames);
        Ok(())
    }
}

struct KeyEcho;

impl Component for KeyEcho {
    fn init(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        ctx.subscribe(KeyPressed::TYPE);
        Ok(())
    }

    fn on_message(
        &mut self,
        ctx: &mut dyn ComponentContext,
        message: &Message,
    ) -> Result<(), ComponentError> {
        if let Some(KeyPressed { key }) = message.decode() {
            println!("key {key} at t={:?}", ctx.time_simulated());
        }
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut kernel = SimKernel::new(KernelConfig {
        step: Duration::from_millis(10),
        render_period: Duration::from_millis(33),
        ..KernelConfig::default()
    })
    .unwrap();
    kernel.set_world(Idle);
    kernel.set_vis_world(Console { frames: 0 });
    kernel.add_component(KeyEcho);
    kernel.add_component(Watchdog::new(Duration::from_secs(1)));

    let sim = RealtimeSim::start(kernel).unwrap();
    let handle = sim.handle();

    let typist = thread::spawn(move || {
        for key in [72, 73] {
            thread::sleep(Duration::from_millis(150));
            if handle.press_key(key).is_err() {
                return;
            }
        }
        handle.pause();
        thread::sleep(Duration::from_millis(200));
        handle.resume();
    });

    let report = sim.join().unwrap();
    typist.join().unwrap();
    println!(
        "{} steps, {} paused iterations, {} frames, {:?} simulated in {:?}",
        report.steps, report.paused_iterations, report.frames, report.time_simulated, report.elapsed
    );
}
