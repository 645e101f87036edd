//! Windowed-sinc sample-rate conversion.
//!
//! Push-model converter from the device's native render rate down to the
//! host mixer's rate. Each call to [`SincResampler::input`] buffers one
//! native-rate sample and reports whether an output-rate sample became
//! ready; [`SincResampler::output`] fetches it.
//!
//! The filter is a Kaiser-windowed sinc FIR, pre-computed at construction as
//! a bank of phase-shifted tap tables with linear interpolation between
//! adjacent phases. This follows the resampling method described on the
//! "Digital Audio Resampling Home Page"
//! (http://www-ccrma.stanford.edu/~jos/resample/): building shifted FIR
//! tables per output phase keeps the per-sample work to one short
//! convolution. The render path performs no allocation.

use crate::{BlasterError, Result};

const FIXP_SHIFT: i32 = 16;
const FIXP_MASK: i32 = 0xffff;

/// Interpolated filter table resolution.
///
/// The error in interpolated lookup is bounded by 1.234/L^2; for 16-bit
/// resolution this yields L >= 285, see
/// http://www-ccrma.stanford.edu/~jos/resample/Choice_Table_Size.html
const FIR_RES_INTERPOLATE: f64 = 285.0;

/// Single-channel windowed-sinc rate converter
///
/// Constructed once per stereo channel at device open time; the left/right
/// pair must be driven in strict lockstep.
#[derive(Debug, Clone)]
pub struct SincResampler {
    /// Input cycles per output sample, 16.16 fixed point
    cycles_per_sample: i32,
    /// Fractional position of the last due output, 16.16 fraction part
    offset: i32,
    /// Whole input samples remaining until the next output is due
    until_next: i32,
    /// Phase-shifted FIR tap tables, `fir_res` tables of `fir_n` taps
    fir: Vec<f32>,
    fir_n: i32,
    fir_res: i32,
    /// Input history, duplicated so every window is one contiguous slice
    buffer: Vec<f32>,
    ring_size: usize,
    index: usize,
    /// Output computed by the most recent ready `input` call
    pending: Option<f32>,
}

impl SincResampler {
    /// Create a converter between the given rates
    ///
    /// `pass_freq_hz` is the top of the preserved band; it must sit below
    /// the output Nyquist frequency. The input rate must exceed the output
    /// rate: this converter only downsamples, so at most one output becomes
    /// ready per input sample.
    pub fn new(input_rate_hz: f64, output_rate_hz: f64, pass_freq_hz: f64) -> Result<Self> {
        if !(input_rate_hz > 0.0 && output_rate_hz > 0.0) {
            return Err(BlasterError::ConfigError(format!(
                "Resampler rates must be positive: {input_rate_hz} -> {output_rate_hz}"
            )));
        }
        if input_rate_hz <= output_rate_hz {
            return Err(BlasterError::ConfigError(format!(
                "Resampler input rate {input_rate_hz} must exceed output rate {output_rate_hz}"
            )));
        }
        if 2.0 * pass_freq_hz >= output_rate_hz {
            return Err(BlasterError::ConfigError(format!(
                "Passband {pass_freq_hz} Hz must sit below the output Nyquist frequency"
            )));
        }

        let pi = std::f64::consts::PI;
        let samples_per_cycle = output_rate_hz / input_rate_hz;
        let cycles_per_sample_f = input_rate_hz / output_rate_hz;

        // 16 bits -> ~96 dB stopband attenuation
        let atten = -20.0_f64 * (1.0 / f64::from(1_i32 << 16)).log10();
        // A fraction of the bandwidth is allocated to the transition band
        let dw = (1.0 - 2.0 * pass_freq_hz / output_rate_hz) * pi;
        // The cutoff frequency is midway through the transition band
        let wc = (2.0 * pass_freq_hz / output_rate_hz + 1.0) * pi / 2.0;

        // Kaiser window shape and filter order per the kaiserord estimate
        let beta = 0.1102 * (atten - 8.7);
        let i0_beta = i0(beta);

        // The filter order equals the number of zero crossings and must be
        // even (sinc is symmetric about x = 0)
        let mut n_cap = ((atten - 7.95) / (2.285 * dw) + 0.5) as i32;
        n_cap += n_cap & 1;

        // Tap count scaled to input-rate samples, kept odd
        let mut fir_n = (f64::from(n_cap) * cycles_per_sample_f) as i32 + 1;
        fir_n |= 1;

        // Clamp the table resolution to a power of two so the fixed-point
        // offset maps onto whole tables
        let res_exp = ((FIR_RES_INTERPOLATE / cycles_per_sample_f).ln() / 2.0_f64.ln())
            .ceil()
            .max(0.0) as i32;
        let fir_res = 1 << res_exp;

        let mut fir = vec![0.0_f32; (fir_n * fir_res) as usize];
        let fir_n_div2 = fir_n / 2;
        for i in 0..fir_res {
            let fir_offset = i * fir_n + fir_n_div2;
            let j_offset = f64::from(i) / f64::from(fir_res);
            // Sinc weighted by the Kaiser window
            for j in -fir_n_div2..=fir_n_div2 {
                let jx = f64::from(j) - j_offset;
                let wt = wc * jx / cycles_per_sample_f;
                let temp = jx / f64::from(fir_n_div2);
                let kaiser = if temp.abs() <= 1.0 {
                    i0(beta * (1.0 - temp * temp).sqrt()) / i0_beta
                } else {
                    0.0
                };
                let sincwt = if wt.abs() >= 1e-6 { wt.sin() / wt } else { 1.0 };
                let val = samples_per_cycle * wc / pi * sincwt * kaiser;
                fir[(fir_offset + j) as usize] = val as f32;
            }
        }

        let ring_size = (fir_n as usize).next_power_of_two();
        let cycles_per_sample =
            (cycles_per_sample_f * f64::from(1_i32 << FIXP_SHIFT) + 0.5) as i32;

        Ok(SincResampler {
            cycles_per_sample,
            offset: cycles_per_sample & FIXP_MASK,
            until_next: cycles_per_sample >> FIXP_SHIFT,
            fir,
            fir_n,
            fir_res,
            buffer: vec![0.0; ring_size * 2],
            ring_size,
            index: 0,
            pending: None,
        })
    }

    /// Buffer one input-rate sample
    ///
    /// Returns true when an output-rate sample became ready; fetch it with
    /// [`SincResampler::output`] before the next `input` call.
    pub fn input(&mut self, sample: f32) -> bool {
        self.buffer[self.index] = sample;
        self.buffer[self.index + self.ring_size] = sample;
        self.index = (self.index + 1) & (self.ring_size - 1);

        self.until_next -= 1;
        debug_assert!(self.until_next >= 0);
        if self.until_next > 0 {
            return false;
        }

        self.pending = Some(self.convolve());

        let next_sample_offset = self.offset + self.cycles_per_sample;
        self.until_next = next_sample_offset >> FIXP_SHIFT;
        self.offset = next_sample_offset & FIXP_MASK;
        true
    }

    /// Fetch the output-rate sample produced by the last ready `input`
    ///
    /// # Panics
    ///
    /// Panics when called without a preceding ready signal; that is a
    /// broken lockstep contract, not a runtime condition.
    pub fn output(&mut self) -> f32 {
        self.pending
            .take()
            .expect("resampler output() called without a ready sample")
    }

    /// Convolution against the two phase tables bracketing `offset`,
    /// linearly interpolated
    fn convolve(&self) -> f32 {
        let n = self.fir_n as usize;

        let fir_offset_1 = (self.offset * self.fir_res) >> FIXP_SHIFT;
        let fir_offset_rmd = (self.offset * self.fir_res) & FIXP_MASK;
        let fir_start_1 = (fir_offset_1 * self.fir_n) as usize;
        let sample_start_1 = self.index + self.ring_size - n;

        let v1 = dot(
            &self.buffer[sample_start_1..sample_start_1 + n],
            &self.fir[fir_start_1..fir_start_1 + n],
        );

        // Next table, wrapping to the first table against the previous sample
        let mut fir_offset_2 = fir_offset_1 + 1;
        let mut sample_start_2 = sample_start_1;
        if fir_offset_2 == self.fir_res {
            fir_offset_2 = 0;
            sample_start_2 -= 1;
        }
        let fir_start_2 = (fir_offset_2 * self.fir_n) as usize;

        let v2 = dot(
            &self.buffer[sample_start_2..sample_start_2 + n],
            &self.fir[fir_start_2..fir_start_2 + n],
        );

        let weight = fir_offset_rmd as f32 / (1_i64 << FIXP_SHIFT) as f32;
        v1 + weight * (v2 - v1)
    }
}

/// Convolution with the filter impulse response.
/// LLVM auto-vectorizes this well on SSE/NEON.
#[inline]
fn dot(samples: &[f32], taps: &[f32]) -> f32 {
    samples
        .iter()
        .zip(taps)
        .fold(0.0, |sum, (&s, &t)| sum + s * t)
}

/// Zeroth-order modified Bessel function of the first kind
fn i0(x: f64) -> f64 {
    // Max error acceptable in I0
    let i0e = 1e-6;
    let halfx = x / 2.0;
    let mut sum = 1.0;
    let mut u = 1.0;
    let mut n = 1;
    loop {
        let temp = halfx / f64::from(n);
        n += 1;
        u *= temp * temp;
        sum += u;
        if u < i0e * sum {
            break;
        }
    }
    sum
}
