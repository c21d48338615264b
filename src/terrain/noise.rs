//! Deterministic 2D value noise and fractal Brownian motion
//!
//! Everything here is a pure function of its inputs: there is no seed state
//! beyond the constants baked into [`hash`]. Decorrelated signals are made by
//! offsetting the sample coordinates, not by reseeding.

/// Lattice hash multipliers (large odd primes)
const PRIME_X: u32 = 374_761_393;
const PRIME_Z: u32 = 668_265_263;
const PRIME_MIX: u32 = 1_274_126_177;

/// Largest value of the 24-bit hash mantissa
const HASH_MAX: f32 = ((1u32 << 24) - 1) as f32;

/// Integer lattice hash mapped to `[-1, 1]`.
///
/// Both coordinates are multiplied by large primes and folded together with
/// XOR shifts. The top 24 bits are kept so the conversion to `f32` is exact.
pub fn hash(x: i32, z: i32) -> f32 {
    let mut n = (x as u32).wrapping_mul(PRIME_X) ^ (z as u32).wrapping_mul(PRIME_Z);
    n = (n ^ (n >> 13)).wrapping_mul(PRIME_MIX);
    n ^= n >> 16;
    (n >> 8) as f32 / HASH_MAX * 2.0 - 1.0
}

/// Quintic fade `t³(t(6t - 15) + 10)`, C2-continuous at the lattice
#[inline]
pub fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Value noise: bilinear blend of the four surrounding lattice hashes with
/// faded weights. Always lies between the smallest and largest corner.
pub fn smooth_noise(x: f32, z: f32) -> f32 {
    let x0 = x.floor();
    let z0 = z.floor();
    let tx = fade(x - x0);
    let tz = fade(z - z0);
    let (ix, iz) = (x0 as i32, z0 as i32);

    let c00 = hash(ix, iz);
    let c10 = hash(ix.wrapping_add(1), iz);
    let c01 = hash(ix, iz.wrapping_add(1));
    let c11 = hash(ix.wrapping_add(1), iz.wrapping_add(1));

    lerp(lerp(c00, c10, tx), lerp(c01, c11, tx), tz)
}

/// Fractal Brownian motion: `octaves` layers of [`smooth_noise`], each at
/// double the frequency and half the amplitude of the last, divided by the
/// amplitude sum so the result stays in `[-1, 1]`.
///
/// `octaves == 0` is treated as a single octave.
pub fn fbm(x: f32, z: f32, octaves: u32) -> f32 {
    let mut sum = 0.0;
    let mut norm = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;

    for _ in 0..octaves.max(1) {
        sum += amplitude * smooth_noise(x * frequency, z * frequency);
        norm += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    sum / norm
}

/// One named noise signal: an fBm sampled at its own frequency band and
/// coordinate offset
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NoiseBand {
    /// Lattice cells per grid side
    pub frequency: f32,
    /// Coordinate offset in lattice units, decorrelates bands
    pub offset: [f32; 2],
    /// fBm octave count
    pub octaves: u32,
}

impl NoiseBand {
    pub const fn new(frequency: f32, offset: [f32; 2], octaves: u32) -> Self {
        Self { frequency, offset, octaves }
    }

    /// Sample the band at normalized grid coordinates (`0..1` across the grid)
    pub fn sample(&self, fx: f32, fz: f32) -> f32 {
        fbm(
            fx * self.frequency + self.offset[0],
            fz * self.frequency + self.offset[1],
            self.octaves,
        )
    }

    /// Sample and fold into sharp ridges: `(1 - |n|)²`, peaking where the
    /// underlying noise crosses zero. Range `[0, 1]`.
    pub fn sample_ridged(&self, fx: f32, fz: f32) -> f32 {
        let n = 1.0 - self.sample(fx, fz).abs();
        n * n
    }
}
