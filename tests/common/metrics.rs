use std::fmt;

#[derive(Debug, Clone)]
pub struct PsnrResult {
    pub overall_psnr: f64,
    pub overall_mse: f64,
    pub channel_results: [ChannelMetrics; 4],
}

#[derive(Debug, Clone, Copy)]
pub struct ChannelMetrics {
    pub psnr: f64,
    pub mse: f64,
}

impl PsnrResult {
    pub fn red(&self) -> ChannelMetrics {
        self.channel_results[0]
    }

    pub fn green(&self) -> ChannelMetrics {
        self.channel_results[1]
    }

    pub fn blue(&self) -> ChannelMetrics {
        self.channel_results[2]
    }

    pub fn alpha(&self) -> ChannelMetrics {
        self.channel_results[3]
    }
}

impl fmt::Display for PsnrResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overall PSNR: {:.2} dB", self.overall_psnr)?;
        writeln!(f, "Overall MSE: {:.6}", self.overall_mse)?;
        for (name, metrics) in ["Red", "Green", "Blue", "Alpha"].iter().zip(&self.channel_results) {
            writeln!(f, "{name} channel PSNR: {:.2} dB", metrics.psnr)?;
        }
        Ok(())
    }
}

/// Calculates quality metrics of a decoded image against its source. Both
/// buffers must be RGBA data. Color is compared in linear light, alpha as is.
///
/// `channels` is the number of channels that count towards the overall result.
/// An identical channel reports an infinite PSNR.
pub fn calculate_image_metrics(
    original: &[u8],
    decoded: &[u8],
    width: u32,
    height: u32,
    channels: u32,
) -> PsnrResult {
    assert_eq!(original.len(), decoded.len(), "image buffers must have same length");
    assert_eq!(
        original.len(),
        (width * height * 4) as usize,
        "buffer size doesn't match dimensions"
    );

    let mut channel_mse = [0.0; 4];
    let pixel_count = (width * height) as f64;

    for (source, result) in original.chunks_exact(4).zip(decoded.chunks_exact(4)) {
        for channel in 0..4 {
            let (source, result) = if channel < 3 {
                (srgb_to_linear(source[channel]), srgb_to_linear(result[channel]))
            } else {
                (source[channel] as f64 / 255.0, result[channel] as f64 / 255.0)
            };

            let diff = source - result;
            channel_mse[channel] += diff * diff;
        }
    }

    channel_mse.iter_mut().for_each(|mse| *mse /= pixel_count);

    let overall_mse = channel_mse[..channels as usize].iter().sum::<f64>() / channels as f64;

    PsnrResult {
        overall_psnr: psnr(overall_mse),
        overall_mse,
        channel_results: channel_mse.map(|mse| ChannelMetrics {
            psnr: psnr(mse),
            mse,
        }),
    }
}

fn psnr(mse: f64) -> f64 {
    if mse == 0.0 {
        f64::INFINITY
    } else {
        20.0 * (1.0 / mse.sqrt()).log10()
    }
}

#[inline]
fn srgb_to_linear(srgb: u8) -> f64 {
    let v = (srgb as f64) / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
