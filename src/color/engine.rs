//! Daltonization engine.
//!
//! Each pixel is moved into LMS cone-response space, the deficient viewer's
//! response is simulated there, and the colour information lost in that
//! simulation is redistributed into channels the viewer can still tell apart.

use rayon::prelude::*;

use crate::color::deficiency::DeficiencyMode;
use crate::color::error::{ColorError, Result};
use crate::color::matrix::Mat3;
use crate::frame::{Frame, CHANNELS};

/// Use row-parallel processing at or above this many pixels.
const PARALLEL_THRESHOLD: usize = 100_000;

/// Linear RGB to LMS cone response.
pub const RGB_TO_LMS: Mat3 = Mat3::new([
    [17.8824, 43.5161, 4.11935],
    [3.45565, 27.1554, 3.86714],
    [0.0299566, 0.184309, 1.46709],
]);

/// Per-deficiency calibration: how the viewer's cones respond, and where the
/// lost error is pushed back into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeficiencyProfile {
    pub simulate: Mat3,
    pub shift: Mat3,
}

const PROTANOPIA: DeficiencyProfile = DeficiencyProfile {
    simulate: Mat3::new([[0.0, 2.02344, -2.52581], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
    shift: Mat3::new([[0.0, 0.0, 0.0], [0.5, 1.0, 0.0], [0.5, 0.0, 1.0]]),
};

const DEUTERANOPIA: DeficiencyProfile = DeficiencyProfile {
    simulate: Mat3::new([
        [1.42319, -0.88995, 1.77557],
        [0.67558, -0.42203, 2.82788],
        [0.00267, -0.00504, 0.99914],
    ]),
    shift: Mat3::new([[1.0, 0.5, 0.0], [0.0, 0.0, 0.0], [0.0, 0.5, 1.0]]),
};

const TRITANOPIA: DeficiencyProfile = DeficiencyProfile {
    simulate: Mat3::new([
        [0.95451, -0.04719, 2.74872],
        [-0.00447, 0.96543, 0.88835],
        [-0.01251, 0.07312, -0.01161],
    ]),
    shift: Mat3::new([[1.0, 0.0, 0.7], [0.0, 1.0, 0.7], [0.0, 0.0, 0.0]]),
};

/// Mode-indexed profile table.
const PROFILES: [(DeficiencyMode, DeficiencyProfile); 3] = [
    (DeficiencyMode::Protanopia, PROTANOPIA),
    (DeficiencyMode::Deuteranopia, DEUTERANOPIA),
    (DeficiencyMode::Tritanopia, TRITANOPIA),
];

/// The full set of matrices used by the engine. Built once at startup and
/// never mutated.
#[derive(Debug, Clone)]
pub struct TransformMatrixSet {
    to_opponent: Mat3,
    from_opponent: Mat3,
    profiles: Vec<(DeficiencyMode, DeficiencyProfile)>,
}

impl TransformMatrixSet {
    /// Build the standard set, inverting `RGB_TO_LMS`.
    pub fn new() -> Result<Self> {
        Self::with_forward(RGB_TO_LMS)
    }

    /// Build a set around a custom forward matrix. Fails with
    /// `ColorError::Configuration` if it cannot be inverted.
    pub fn with_forward(to_opponent: Mat3) -> Result<Self> {
        let from_opponent = to_opponent.inverse()?;
        Ok(Self {
            to_opponent,
            from_opponent,
            profiles: PROFILES.to_vec(),
        })
    }

    pub fn to_opponent(&self) -> &Mat3 {
        &self.to_opponent
    }

    pub fn from_opponent(&self) -> &Mat3 {
        &self.from_opponent
    }

    /// Calibration profile for a mode. `None` for pass-through.
    pub fn profile(&self, mode: DeficiencyMode) -> Option<&DeficiencyProfile> {
        self.profiles
            .iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, profile)| profile)
    }
}

/// Stateless frame transformer.
#[derive(Debug, Clone)]
pub struct ColorTransform {
    matrices: TransformMatrixSet,
}

impl ColorTransform {
    /// Create a transformer over the standard matrix set.
    pub fn new() -> Result<Self> {
        Ok(Self::from_matrices(TransformMatrixSet::new()?))
    }

    pub fn from_matrices(matrices: TransformMatrixSet) -> Self {
        Self { matrices }
    }

    /// Produce the compensated frame for a viewer with `mode`.
    ///
    /// Pass-through is the caller's job: `DeficiencyMode::None` yields
    /// `ColorError::UnsupportedMode`.
    pub fn transform(&self, frame: &Frame, mode: DeficiencyMode) -> Result<Frame> {
        let profile = self
            .matrices
            .profile(mode)
            .ok_or(ColorError::UnsupportedMode(mode))?;
        self.transform_with(frame, profile)
    }

    /// Run the pipeline with an explicit profile.
    pub fn transform_with(&self, frame: &Frame, profile: &DeficiencyProfile) -> Result<Frame> {
        frame.validate()?;

        let stride = frame.stride();
        let pixel_count = frame.width as usize * frame.height as usize;
        let mut data = vec![0u8; frame.data.len()];

        let process_row = |(src, dst): (&[u8], &mut [u8])| -> Result<()> {
            for (s, d) in src
                .chunks_exact(CHANNELS)
                .zip(dst.chunks_exact_mut(CHANNELS))
            {
                let px = self
                    .transform_pixel([s[0], s[1], s[2]], profile)
                    .ok_or_else(|| {
                        ColorError::InvalidFrame("non-finite value during transform".to_string())
                    })?;
                d.copy_from_slice(&px);
            }
            Ok(())
        };

        if pixel_count >= PARALLEL_THRESHOLD {
            frame
                .data
                .par_chunks_exact(stride)
                .zip(data.par_chunks_exact_mut(stride))
                .try_for_each(process_row)?;
        } else {
            frame
                .data
                .chunks_exact(stride)
                .zip(data.chunks_exact_mut(stride))
                .try_for_each(process_row)?;
        }

        Ok(Frame {
            data,
            width: frame.width,
            height: frame.height,
            timestamp_us: frame.timestamp_us,
        })
    }

    /// Transform one RGB pixel. Returns `None` if any intermediate value is
    /// not finite.
    #[inline]
    pub fn transform_pixel(&self, rgb: [u8; 3], profile: &DeficiencyProfile) -> Option<[u8; 3]> {
        let c = rgb.map(f64::from);

        let lms = self.matrices.to_opponent.apply(c);
        let simulated = profile.simulate.apply(lms);
        let perceived = self.matrices.from_opponent.apply(simulated);

        let error = [c[0] - perceived[0], c[1] - perceived[1], c[2] - perceived[2]];
        let shifted = profile.shift.apply(error);

        let out = [
            perceived[0] + shifted[0],
            perceived[1] + shifted[1],
            perceived[2] + shifted[2],
        ];
        if !out.iter().all(|v| v.is_finite()) {
            return None;
        }
        // Rounded, not truncated: identity simulations come back exact.
        // Truncation would give red under protanopia as [28, 113, 113].
        Some(out.map(|v| v.clamp(0.0, 255.0).round() as u8))
    }
}
