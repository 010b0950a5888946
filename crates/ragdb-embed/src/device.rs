use candle_core::Device;

/// Pick the best available compute device: CUDA, then Metal, then CPU.
/// Accelerator initialization failures are not fatal; the next option
/// in line is tried.
pub fn select_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(dev) = Device::new_cuda(0) {
            tracing::info!("device: CUDA");
            return dev;
        }
    }
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            tracing::info!("device: Metal");
            return dev;
        }
    }
    tracing::info!("device: CPU");
    Device::Cpu
}
