use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("deepchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("deepchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("deepchat.client.request_duration_seconds");

pub(crate) static STREAM_FRAMES: Counter = Counter::new("deepchat.stream.frames");
pub(crate) static STREAM_MALFORMED_FRAMES: Counter =
    Counter::new("deepchat.stream.malformed_frames");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("deepchat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("deepchat.stream.bytes");
pub(crate) static STREAM_INTERRUPTS: Counter = Counter::new("deepchat.stream.interrupts");
pub(crate) static STREAM_DURATION: Moments = Moments::new("deepchat.stream.duration_seconds");

pub(crate) static SESSION_TURNS: Counter = Counter::new("deepchat.session.turns");
pub(crate) static SESSION_EMPTY_REPLIES: Counter = Counter::new("deepchat.session.empty_replies");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_FRAMES);
    collector.register_counter(&STREAM_MALFORMED_FRAMES);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_INTERRUPTS);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_EMPTY_REPLIES);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_with_fresh_collector() {
        register_biometrics(Collector::new());
    }
}
