use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream};

use crate::audio;

fn get_host() -> cpal::Host {
    cpal::default_host()
}

/// Finds the named input device, or the host default when no name is given.
pub fn get_or_default_input(device_name: Option<String>) -> anyhow::Result<Device> {
    let host = get_host();
    tracing::debug!("Host: {:?}", host.id());

    let target = match device_name {
        Some(name) => name,
        None => host
            .default_input_device()
            .context("No default input device")?
            .name()
            .context("Default input device has no name")?,
    };

    host.input_devices()
        .context("Failed to enumerate input devices")?
        .find(|device| device.name().is_ok_and(|name| name == target))
        .ok_or_else(|| anyhow::anyhow!("No target device found"))
}

pub fn get_available_inputs() -> anyhow::Result<String> {
    let host = get_host();
    let default_device = host
        .default_input_device()
        .and_then(|device| device.name().ok())
        .unwrap_or_default();

    let mut device_names: Vec<String> = Vec::new();
    for in_device in host.input_devices()? {
        let d_name = in_device.name()?;
        let d_cfg = in_device.default_input_config()?;
        let mut d = format!(
            " * {}({}ch, {}hz)",
            d_name,
            d_cfg.channels(),
            d_cfg.sample_rate().0
        );
        if d_name == default_device {
            d.push_str(" [default]");
        }
        device_names.push(d);
    }
    Ok(device_names.join("\n"))
}

pub fn input_sample_rate(device: &Device) -> anyhow::Result<u32> {
    Ok(device
        .default_input_config()
        .context("Failed to get default input config")?
        .sample_rate()
        .0)
}

/// Starts capturing from `device`, handing mono f32 frames to `on_samples`.
///
/// Returns the playing stream and its sample rate. Capture stops when the stream is dropped.
pub fn start_mono_capture<F>(device: &Device, mut on_samples: F) -> anyhow::Result<(Stream, u32)>
where
    F: FnMut(Vec<f32>) + Send + 'static,
{
    let config = device
        .default_input_config()
        .context("Failed to get default input config")?
        .config();
    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0;
    tracing::info!("Input stream config: {:?}", &config);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            on_samples(audio::downmix(data, channels));
        },
        move |err| tracing::error!("An error occurred on input stream: {}", err),
        None,
    )?;
    stream.play()?;
    Ok((stream, sample_rate))
}
