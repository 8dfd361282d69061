//! Incline Lab entry point
//!
//! The browser build is driven from JS through `WebSimulation`. Natively the
//! lab runs headless against a manual frame source and logs a summary once
//! per simulated second.
//!
//! Usage: `incline-lab [settings.json] [seconds]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::error::Error;
    use std::rc::Rc;

    use incline_lab::platform::ManualFrames;
    use incline_lab::sim::views;
    use incline_lab::{Settings, Simulation};

    /// Host frame interval for the headless run (60 Hz display)
    const FRAME_MS: f64 = 1000.0 / 60.0;
    const DEFAULT_SECONDS: f64 = 5.0;

    pub fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
        let settings = match args.first() {
            Some(path) => {
                log::info!("Loading settings from {path}");
                Settings::from_json(&std::fs::read_to_string(path)?)?
            }
            None => Settings::default(),
        };
        let seconds = match args.get(1) {
            Some(s) => s.parse::<f64>()?,
            None => DEFAULT_SECONDS,
        };

        log::debug!("Effective settings:\n{}", settings.to_json()?);

        let frames = Rc::new(ManualFrames::new());
        let sim = Simulation::new(settings, frames.clone());
        log::info!("Parameters: {:?}", sim.select(views::params));

        let reporter = sim.clone();
        let summary = sim.subscribe_view(
            |s| s.time_s.floor() as i64,
            move |second| {
                let s = reporter.state();
                log::info!(
                    "t={second}s x={:.3} m v={:.3} m/s a={:.3} m/s² F={:.3} N W={:.3} J P={:.3} W",
                    s.position,
                    s.velocity,
                    s.acceleration,
                    s.forces.total,
                    s.energy.work,
                    s.power.instant,
                );
            },
        );

        sim.start()?;
        let frame_count = (seconds * 1000.0 / FRAME_MS).ceil() as usize;
        frames.run_frames(frame_count, FRAME_MS);
        sim.pause();

        let stats = sim.clock_stats();
        let state = sim.state();
        log::info!(
            "Finished: {} frames, {} ticks, t={:.3}s, x={:.3} m, {} power samples",
            stats.frames,
            stats.ticks,
            state.time_s,
            state.position,
            state.power.log.len(),
        );

        // The reporter holds a handle to the session
        summary.unsubscribe();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Incline Lab (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = headless::run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::init, this is just to satisfy the compiler
}
