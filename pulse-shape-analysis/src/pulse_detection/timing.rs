use super::Real;
use crate::parameters::Polarity;

/// Locates the discriminator zero-crossing preceding the detection at `index`.
///
/// Walks backwards from `index` while the discriminator carries the pulse's sign, then
/// linearly interpolates between the bracketing pair `j, j+1`. Returns the crossing
/// relative to the start of `cfd`, or `None` if the walk reaches the start first.
pub fn zero_crossing(cfd: &[Real], index: usize, polarity: Polarity) -> Option<Real> {
    let sign = polarity.sign();
    let mut bracket = index;
    loop {
        bracket = bracket.checked_sub(1)?;
        if sign * *cfd.get(bracket)? <= 0.0 {
            break;
        }
    }
    let below = *cfd.get(bracket)?;
    let above = *cfd.get(bracket + 1)?;
    Some(bracket as Real - below / (above - below))
}

/// The time of the detection at `index` in absolute trace samples, given the window `start`.
/// Falls back to the detection index itself when no crossing can be bracketed.
pub fn pulse_time(cfd: &[Real], index: usize, polarity: Polarity, start: isize) -> Real {
    zero_crossing(cfd, index, polarity).unwrap_or(index as Real) + start as Real
}
