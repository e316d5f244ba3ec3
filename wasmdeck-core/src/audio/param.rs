//! Scheduled automation parameter.
//!
//! [`AudioParam`] evaluates a small list of automation events against the
//! audio clock: immediate sets, linear ramps, and exponential approach
//! toward a target. This is the whole envelope machinery for the oscillator
//! voices; the voice manager schedules events, the renderer samples
//! `value_at` as time advances.
//!
//! Ramps are fire-and-forget: nothing is awaited, and canceling drops only
//! events scheduled at or after the cancel time.

#[derive(Clone, Copy, Debug)]
enum Event {
    /// Hold `value` from `time` onward.
    SetValue { time: f64, value: f32 },
    /// Ramp linearly from the previous event to `value`, arriving at `end_time`.
    LinearRamp { end_time: f64, value: f32 },
    /// From `start_time`, approach `target` exponentially with `time_constant`.
    SetTarget { start_time: f64, target: f32, time_constant: f64 },
}

impl Event {
    /// Scheduling key: the time at which the event is considered scheduled
    /// (ramps are keyed by their end time).
    fn time(&self) -> f64 {
        match self {
            Event::SetValue { time, .. } => *time,
            Event::LinearRamp { end_time, .. } => *end_time,
            Event::SetTarget { start_time, .. } => *start_time,
        }
    }
}

/// An automatable scalar parameter with Web-Audio-shaped scheduling.
#[derive(Clone, Debug)]
pub struct AudioParam {
    initial: f32,
    events: Vec<Event>,
}

impl AudioParam {
    pub fn new(initial: f32) -> Self {
        Self { initial, events: Vec::new() }
    }

    fn insert(&mut self, event: Event) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }

    pub fn set_value_at(&mut self, value: f32, time: f64) {
        self.insert(Event::SetValue { time, value });
    }

    pub fn linear_ramp_to_value_at(&mut self, value: f32, end_time: f64) {
        self.insert(Event::LinearRamp { end_time, value });
    }

    pub fn set_target_at(&mut self, target: f32, start_time: f64, time_constant: f64) {
        self.insert(Event::SetTarget { start_time, target, time_constant });
    }

    /// Drop every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Evaluate the parameter at time `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        let mut prev_time = 0.0f64;
        let mut prev_value = self.initial;

        let mut i = 0;
        while i < self.events.len() {
            match self.events[i] {
                Event::SetValue { time, value } => {
                    if time > t {
                        break;
                    }
                    prev_time = time;
                    prev_value = value;
                }
                Event::LinearRamp { end_time, value } => {
                    if end_time <= t {
                        prev_time = end_time;
                        prev_value = value;
                    } else {
                        if t <= prev_time {
                            return prev_value;
                        }
                        let frac = (t - prev_time) / (end_time - prev_time);
                        return prev_value + (value - prev_value) * frac as f32;
                    }
                }
                Event::SetTarget { start_time, target, time_constant } => {
                    if start_time > t {
                        break;
                    }
                    let from = prev_value;
                    let eval = move |at: f64| -> f32 {
                        if time_constant <= 0.0 {
                            return target;
                        }
                        let decay = (-(at - start_time) / time_constant).exp() as f32;
                        target + (from - target) * decay
                    };
                    // A later event takes over from its own scheduled time.
                    match self.events.get(i + 1).map(Event::time) {
                        Some(next) if next <= t => {
                            prev_time = next;
                            prev_value = eval(next);
                        }
                        _ => return eval(t),
                    }
                }
            }
            i += 1;
        }

        prev_value
    }
}
