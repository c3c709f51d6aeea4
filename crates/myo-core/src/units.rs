//! SI time quantities for loop pacing.

use uom::si::f64::{Frequency as UomFrequency, Time as UomTime};
use uom::si::frequency::hertz;
use uom::si::time::second;

pub type Frequency = UomFrequency;
pub type Time = UomTime;

#[inline]
pub fn hz(v: f64) -> Frequency {
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    Time::new::<second>(v)
}

/// Period of a process running at `rate`.
#[inline]
pub fn period_of(rate: Frequency) -> Time {
    s(1.0 / rate.get::<hertz>())
}

/// Value of a time quantity in seconds.
#[inline]
pub fn seconds(t: Time) -> f64 {
    t.get::<second>()
}
