//! Two-thread driver: loops, ingress channel, pause, shutdown.

use std::thread;
use std::time::{Duration, Instant};

use rsim_core::{CollaboratorError, KeyPressed, Message, MessageKind, VisWorld};
use rsim_engine::{
    KernelConfig, RealtimeSim, RunError, RunReport, SimKernel, SubmitError, Watchdog,
};
use rsim_test_utils::{EventLog, MockVisWorld, MockWorld, ScriptedComponent, VisProbe};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_config() -> KernelConfig {
    KernelConfig {
        step: Duration::from_millis(1),
        render_period: Duration::from_millis(2),
        ..KernelConfig::default()
    }
}

fn kernel(config: KernelConfig, log: &EventLog) -> (SimKernel, VisProbe) {
    let mut k = SimKernel::new(config).unwrap();
    k.set_world(MockWorld::new(log));
    let vis = MockVisWorld::new(log);
    let probe = vis.probe();
    k.set_vis_world(vis);
    (k, probe)
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn run_stops_at_time_ceiling() {
    init_tracing();
    let log = EventLog::new();
    let config = KernelConfig {
        time_end: Some(Duration::from_millis(50)),
        simulate_real: false,
        ..fast_config()
    };
    let (k, _) = kernel(config, &log);

    let report = RealtimeSim::run(k).unwrap();
    assert!(report.physics_joined && report.render_joined);
    assert_eq!(report.steps, 50);
    assert_eq!(report.time_simulated, Duration::from_millis(50));
    assert_eq!(report.counters.steps, 50);
    assert_eq!(log.position("world:init"), Some(0));
    assert_eq!(log.count("world:finish"), 1);
    assert_eq!(log.count("vis:finish"), 1);
}

#[test]
fn throttled_run_keeps_pace_with_wall_clock() {
    init_tracing();
    let log = EventLog::new();
    let config = KernelConfig {
        step: Duration::from_millis(10),
        time_end: Some(Duration::from_millis(200)),
        simulate_real: true,
        ..KernelConfig::default()
    };
    let (k, _) = kernel(config, &log);

    let report = RealtimeSim::run(k).unwrap();
    assert_eq!(report.steps, 20);
    assert_eq!(report.time_simulated, Duration::from_millis(200));
    assert!(
        report.elapsed >= Duration::from_millis(180),
        "ran ahead of real time: {:?}",
        report.elapsed
    );
}

/// Renders one frame, then panics.
struct BrittleVis {
    frames: u32,
}

impl VisWorld for BrittleVis {
    fn step(&mut self) -> Result<(), CollaboratorError> {
        self.frames += 1;
        if self.frames == 2 {
            panic!("render surface lost");
        }
        Ok(())
    }
}

#[test]
fn render_thread_panic_ends_run() {
    init_tracing();
    let log = EventLog::new();
    let mut k = SimKernel::new(KernelConfig {
        simulate_real: false,
        ..fast_config()
    })
    .unwrap();
    k.set_world(MockWorld::new(&log));
    k.set_vis_world(BrittleVis { frames: 0 });
    let sim = RealtimeSim::start(k).unwrap();

    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let _ = tx.send(sim.join());
    });
    let result = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("join must return once a loop panics");
    assert!(matches!(
        result,
        Err(RunError::LoopPanicked {
            name: "rsim-render"
        })
    ));
    assert_eq!(log.count("world:finish"), 1);
}

#[test]
fn published_key_reaches_component() {
    init_tracing();
    let log = EventLog::new();
    let (mut k, _) = kernel(fast_config(), &log);
    let seen = log.clone();
    k.add_component(
        ScriptedComponent::new("kbd", &log)
            .subscribe(KeyPressed::TYPE)
            .on_message(move |_, m| {
                if let Some(key) = m.decode::<KeyPressed>() {
                    seen.push(format!("key:{}", key.key));
                }
                Ok(())
            }),
    );

    let sim = RealtimeSim::start(k).unwrap();
    let handle = sim.handle();
    handle.press_key(7).unwrap();
    assert!(wait_until(|| log.count("key:7") == 1));

    handle.terminate();
    let report = sim.join().unwrap();
    assert_eq!(report.ingested, 1);
    assert_eq!(log.count("kbd:finish"), 1);
}

#[test]
fn closing_the_window_ends_the_run() {
    let log = EventLog::new();
    let (k, vis) = kernel(fast_config(), &log);
    let sim = RealtimeSim::start(k).unwrap();
    assert!(wait_until(|| vis.frames() > 0));
    vis.close();
    let report = sim.join().unwrap();
    assert!(report.frames > 0);
}

#[test]
fn pause_freezes_simulated_time_while_running() {
    let log = EventLog::new();
    let (k, _) = kernel(fast_config(), &log);
    let mut sim = RealtimeSim::start(k).unwrap();
    let handle = sim.handle();
    assert!(wait_until(|| handle.time_simulated() > Duration::ZERO));

    handle.pause();
    let frozen = handle.time_simulated();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(handle.time_simulated(), frozen);

    handle.resume();
    assert!(wait_until(|| handle.time_simulated() > frozen));
    let report = sim.shutdown();
    assert!(report.paused_iterations > 0);
}

#[test]
fn components_can_come_and_go_while_running() {
    let log = EventLog::new();
    let (k, _) = kernel(fast_config(), &log);
    let mut sim = RealtimeSim::start(k).unwrap();
    let handle = sim.handle();

    let id = handle.add_component(ScriptedComponent::new("c", &log).post_step());
    assert!(wait_until(|| log.count("c:post") > 0));
    assert!(handle.remove_component(id));
    assert_eq!(log.count("c:finish"), 1);

    let posts = log.count("c:post");
    thread::sleep(Duration::from_millis(10));
    assert_eq!(log.count("c:post"), posts);
    sim.shutdown();
}

#[test]
fn watchdog_ends_realtime_run() {
    let log = EventLog::new();
    let config = KernelConfig {
        simulate_real: false,
        ..fast_config()
    };
    let (mut k, _) = kernel(config, &log);
    k.add_component(Watchdog::new(Duration::from_millis(30)));
    let report = RealtimeSim::run(k).unwrap();
    assert_eq!(report.time_simulated, Duration::from_millis(30));
}

#[test]
fn full_ingress_channel_rejects() {
    let log = EventLog::new();
    let config = KernelConfig {
        ingress_capacity: 1,
        ..fast_config()
    };
    let (k, _) = kernel(config, &log);
    let mut sim = RealtimeSim::start(k).unwrap();
    let handle = sim.handle();
    let probe = handle.clone();

    // Holding the kernel lock keeps the physics loop from draining.
    handle.with_kernel(|_| {
        assert_eq!(probe.publish(Message::new(KeyPressed { key: 1 })), Ok(()));
        assert_eq!(
            probe.publish(Message::new(KeyPressed { key: 2 })),
            Err(SubmitError::ChannelFull)
        );
    });
    sim.shutdown();
}

#[test]
fn handle_reports_shutdown() {
    let log = EventLog::new();
    let (k, _) = kernel(fast_config(), &log);
    let mut sim = RealtimeSim::start(k).unwrap();
    let handle = sim.handle();

    let first = sim.shutdown();
    assert!(first.physics_joined && first.render_joined);
    assert!(handle.is_terminated());
    assert_eq!(handle.press_key(1), Err(SubmitError::Shutdown));
    assert_eq!(sim.shutdown(), RunReport::default());
}

#[test]
fn drop_shuts_down() {
    let log = EventLog::new();
    let (k, _) = kernel(fast_config(), &log);
    let sim = RealtimeSim::start(k).unwrap();
    assert!(sim.is_running());
    drop(sim);
    assert_eq!(log.count("world:finish"), 1);
}
