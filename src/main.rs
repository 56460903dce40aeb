use anyhow::Result;
use rs_traffic::{LightConfig, TrafficLight};

const GREEN_LIGHTS: usize = 3;

#[cfg(feature = "simulate")]
fn load_config() -> Result<LightConfig> {
    Ok(LightConfig::accelerated())
}

#[cfg(not(feature = "simulate"))]
fn load_config() -> Result<LightConfig> {
    use anyhow::Context;

    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path))?;
            Ok(LightConfig::from_json(&json)?)
        }
        None => Ok(LightConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    log::info!("Config: {:?}", config);

    let light = TrafficLight::with_config(config)?;
    light.simulate()?;

    for i in 1..=GREEN_LIGHTS {
        log::info!(
            "Waiting for green ({}/{}), light is {}",
            i,
            GREEN_LIGHTS,
            light.current_phase()
        );
        light.wait_for_green()?;
        log::info!("Green! light is {}", light.current_phase());
    }

    light.shutdown()?;
    Ok(())
}
