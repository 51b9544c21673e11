use super::{FIR_N, Real};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum KernelError {
    #[error("Expected {FIR_N} filter taps, got {0}")]
    WrongLength(usize),
    #[error("Filter taps sum to {0}, which cannot normalise the filter gain")]
    DegenerateSum(Real),
    #[error("RC time constant must be positive and finite, got {0}")]
    InvalidTimeConstant(Real),
}

/// The fixed-length shaping filter and the sum of its taps.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterKernel {
    taps: [Real; FIR_N],
    sum: Real,
}

impl FilterKernel {
    /// Loads the taps, which must number exactly [FIR_N] and have a finite, non-zero sum.
    pub fn new(taps: &[Real]) -> Result<Self, KernelError> {
        let taps: [Real; FIR_N] = taps
            .try_into()
            .map_err(|_| KernelError::WrongLength(taps.len()))?;
        let sum = taps.iter().sum::<Real>();
        if sum == 0.0 || !sum.is_finite() {
            return Err(KernelError::DegenerateSum(sum));
        }
        Ok(Self { taps, sum })
    }

    /// Builds the discrete RC integrator with time constant `rc` (in samples),
    /// whose taps are `a·bⁱ` where `b = exp(-1/rc)` and `a = 1 - b`.
    pub fn rc(rc: Real) -> Result<Self, KernelError> {
        if rc <= 0.0 || !rc.is_finite() {
            return Err(KernelError::InvalidTimeConstant(rc));
        }
        let b = Real::exp(-1.0 / rc);
        let a = 1.0 - b;
        let taps: Vec<Real> = (0..FIR_N).map(|i| a * b.powi(i as i32)).collect();
        Self::new(&taps)
    }

    pub fn taps(&self) -> &[Real; FIR_N] {
        &self.taps
    }

    pub fn sum(&self) -> Real {
        self.sum
    }
}
