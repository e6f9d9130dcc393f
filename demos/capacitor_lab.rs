use std::error::Error;
use std::io;

use circuit_lab::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const FRAME: f64 = 1.0 / 60.0;

fn run(lab: &mut Lab, seconds: f64) {
    for _ in 0..(seconds / FRAME).round() as usize {
        lab.tick(FRAME);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,circuit_lab=info"));
    fmt().with_env_filter(filter).with_target(false).with_writer(io::stderr).init();

    let (mut lab, bench) = Lab::capacitor_experiment(&LabConfig::default())?;
    lab.experiment_mut().events_mut().step_changed.subscribe(|index: &usize| {
        eprintln!("-> step {index}");
    });

    lab.start();
    lab.confirm_next();

    // Scripted learner: one miss, then the right terminals.
    lab.begin_drag(bench.red_wire);
    lab.drag_wire(bench.red_wire, P2::new(5.8, 1.9));
    lab.release_wire(bench.red_wire, P2::new(5.8, 1.9));
    lab.release_wire(bench.red_wire, P2::new(6.1, 0.1));
    lab.release_wire(bench.black_wire, P2::new(5.9, -2.1));
    lab.toggle_switch(bench.switch);

    lab.press_power();
    run(&mut lab, 4.0);
    eprintln!("charged to {:.3} V", lab.capacitor().voltage());

    lab.press_power();
    run(&mut lab, 20.0);
    eprintln!(
        "discharged to {:.3} V, tau = {:.3} s",
        lab.capacitor().voltage(),
        lab.capacitor().time_constant()
    );

    lab.confirm_next();
    eprintln!("finished: {}", lab.experiment().is_finished());

    write_samples_csv(io::stdout().lock(), lab.capacitor().recorder().samples())?;
    Ok(())
}
