use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, SupportedStreamConfig};

fn get_host() -> cpal::Host {
    cpal::default_host()
}

/// Returns the input device with the given name, or the host's default input device.
pub fn get_or_default_input(device_name: Option<String>) -> anyhow::Result<Device> {
    let host = get_host();
    tracing::debug!("Host: {:?}", host.id());

    let Some(target) = device_name else {
        return host
            .default_input_device()
            .context("No default input device available");
    };

    host.input_devices()
        .context("Failed to enumerate input devices")?
        .find(|device| device.name().is_ok_and(|name| name == target))
        .with_context(|| format!("No input device named '{}'", target))
}

/// Returns the output device with the given name, or the host's default output device.
pub fn get_or_default_output(device_name: Option<String>) -> anyhow::Result<Device> {
    let host = get_host();
    tracing::debug!("Host: {:?}", host.id());

    let Some(target) = device_name else {
        return host
            .default_output_device()
            .context("No default output device available");
    };

    host.output_devices()
        .context("Failed to enumerate output devices")?
        .find(|device| device.name().is_ok_and(|name| name == target))
        .with_context(|| format!("No output device named '{}'", target))
}

/// Lists the input devices as ` * name(2ch, 48000hz) [default]` lines.
pub fn get_available_inputs() -> anyhow::Result<String> {
    let host = get_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut lines = Vec::new();
    for device in host.input_devices().context("Failed to enumerate input devices")? {
        let config = device.default_input_config();
        lines.push(describe(&device, config.ok(), default_name.as_deref()));
    }
    Ok(lines.join("\n"))
}

/// Lists the output devices as ` * name(2ch, 48000hz) [default]` lines.
pub fn get_available_outputs() -> anyhow::Result<String> {
    let host = get_host();
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let mut lines = Vec::new();
    for device in host.output_devices().context("Failed to enumerate output devices")? {
        let config = device.default_output_config();
        lines.push(describe(&device, config.ok(), default_name.as_deref()));
    }
    Ok(lines.join("\n"))
}

fn describe(device: &Device, config: Option<SupportedStreamConfig>, default_name: Option<&str>) -> String {
    let name = device.name().unwrap_or_else(|_| "<unnamed>".to_string());
    let mut line = match config {
        Some(cfg) => format!(" * {}({}ch, {}hz)", name, cfg.channels(), cfg.sample_rate().0),
        None => format!(" * {}(no default config)", name),
    };
    if default_name == Some(name.as_str()) {
        line.push_str(" [default]");
    }
    line
}
