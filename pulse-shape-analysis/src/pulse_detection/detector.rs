//! The streaming discriminator abstraction shared by the threshold scan and the peak finder.
//!
//! A [Detector] consumes one indexed value at a time and occasionally emits an event.
//! Any iterator of `(index, value)` pairs can be turned into a stream of events using
//! [EventFilter::events].
//! ```ignore
//! let crossings = samples
//!     .iter()
//!     .copied()
//!     .enumerate()
//!     .events(CrossingDetector::new(&config));
//! ```

pub(crate) trait Detector {
    type Value;
    type Event;

    /// Feeds the value at `index` into the detector, returning an event if one is registered.
    fn signal(&mut self, index: usize, value: Self::Value) -> Option<Self::Event>;
}

#[derive(Clone)]
pub(crate) struct EventIter<I, D>
where
    I: Iterator<Item = (usize, D::Value)>,
    D: Detector,
{
    source: I,
    detector: D,
}

impl<I, D> Iterator for EventIter<I, D>
where
    I: Iterator<Item = (usize, D::Value)>,
    D: Detector,
{
    type Item = D::Event;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, value) = self.source.next()?;
            if let Some(event) = self.detector.signal(index, value) {
                return Some(event);
            }
        }
    }
}

pub(crate) trait EventFilter<I, D>
where
    I: Iterator<Item = (usize, D::Value)>,
    D: Detector,
{
    fn events(self, detector: D) -> EventIter<I, D>;
}

impl<I, D> EventFilter<I, D> for I
where
    I: Iterator<Item = (usize, D::Value)>,
    D: Detector,
{
    fn events(self, detector: D) -> EventIter<I, D> {
        EventIter {
            source: self,
            detector,
        }
    }
}
