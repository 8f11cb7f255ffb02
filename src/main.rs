//! Desktop launcher.

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

/// Spinning colored cube rendered with wgpu.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Camera and rotation preset
    #[arg(long, value_enum, default_value_t = cube_core::Preset::Classic)]
    preset: cube_core::Preset,

    /// Override the preset's angular velocity, in degrees per second
    #[arg(long, allow_negative_numbers = true)]
    step_rate: Option<f32>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = args.preset.config();
    if let Some(step_rate) = args.step_rate {
        config.step_rate = step_rate;
    }

    // `run` has already logged the failure.
    match cube_core::run(args.preset, config) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(_) => std::process::ExitCode::FAILURE,
    }
}

// The web build starts from `cube_core::start`.
#[cfg(target_arch = "wasm32")]
fn main() {}
