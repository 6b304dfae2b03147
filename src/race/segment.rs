//! Cutting one race out of a continuous packet stream

use std::sync::Arc;

use tracing::{debug, trace};

use super::lifecycle::LifecycleState;
use crate::protocol::Packet;
use crate::stream::PacketStream;

/// Packets of one race together with how the race ended.
#[derive(Debug, Clone, Default)]
pub struct RaceSegment {
    /// Packets after the race started, up to but excluding the packet that
    /// closed it.
    pub packets: Vec<Arc<Packet>>,
    /// Last two lifecycle states observed, including the tick that closed
    /// the race.
    pub previous: LifecycleState,
    pub current: LifecycleState,
    /// A closing transition or the exhaustion rule ended the race, as opposed
    /// to the stream simply running out.
    pub closed: bool,
}

impl RaceSegment {
    /// The feed ran until the chequered flag rather than being cut off.
    pub fn is_complete(&self) -> bool {
        matches!(
            (self.previous, self.current),
            (LifecycleState::Racing, LifecycleState::Finished)
                | (LifecycleState::Finished, LifecycleState::Finished)
        )
    }
}

/// Consume `stream` up to the end of the next race.
///
/// Packets before the first pre-race tick are skipped. The race ends when a
/// telemetry tick's lifecycle state closes it, or when the stream runs dry in
/// a finished or undefined state. The closing tick is not retained, but it
/// does become the final `current` state, so a race that leaves `Finished`
/// for anything but a loading screen reports as incomplete. The stream is
/// left positioned right after the closing tick, ready for the next race.
///
/// The exhaustion rule is evaluated after every packet, including one that
/// failed to decode. A tick followed only by undecodable frames is therefore
/// retained, whereas the same tick at the very end of the stream is not.
pub fn capture_segment(stream: &mut PacketStream) -> RaceSegment {
    let mut segment = RaceSegment::default();
    let mut started = false;
    let mut finished = false;

    while !finished && stream.has_next() {
        let packet = stream.next_packet();

        if let Some(telemetry) = packet.as_deref().and_then(Packet::as_telemetry) {
            let state = LifecycleState::of(telemetry);
            if state != segment.current {
                trace!("Lifecycle {:?} -> {:?}", segment.current, state);
            }
            segment.previous = segment.current;
            segment.current = state;
            if state.finishes_race(segment.previous) {
                debug!("{:?} after {:?} closes the race", state, segment.previous);
                finished = true;
            } else if !started && state.starts_race() {
                debug!("Race started");
                started = true;
            }
        }

        if !finished && !stream.has_next() && segment.current.closes_on_exhaustion() {
            debug!("Stream exhausted in {:?}", segment.current);
            finished = true;
        }

        if started && !finished {
            if let Some(packet) = packet {
                segment.packets.push(packet);
            }
        }
    }

    segment.closed = finished;
    debug!(
        "Segment holds {} packets, final states {:?} -> {:?}",
        segment.packets.len(),
        segment.previous,
        segment.current
    );
    segment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{encode, framed_capture, participant_packet, race_packets, shared, telemetry_in};
    use super::LifecycleState::*;

    fn stream_of(states: &[LifecycleState]) -> PacketStream {
        PacketStream::from_packets(states.iter().map(|s| shared(telemetry_in(*s, 2))).collect())
    }

    /// Framed capture of telemetry ticks followed by one undecodable frame.
    fn framed_then_garbage(states: &[LifecycleState]) -> PacketStream {
        let mut datagrams: Vec<Vec<u8>> =
            states.iter().map(|s| encode(&Packet::from(telemetry_in(*s, 2)))).collect();
        datagrams.push(vec![1, 2, 3]);
        PacketStream::from_bytes(framed_capture(&datagrams))
    }

    fn states_of(segment: &RaceSegment) -> Vec<LifecycleState> {
        segment
            .packets
            .iter()
            .filter_map(|p| p.as_telemetry().map(LifecycleState::of))
            .collect()
    }

    #[test]
    fn full_lifecycle_yields_one_complete_race() {
        let mut stream = stream_of(&[Loading, PreRacePaused, PreRace, Racing, Finished]);
        let segment = capture_segment(&mut stream);

        assert_eq!(states_of(&segment), [PreRace, Racing]);
        assert!(segment.is_complete());
        assert!(!stream.has_next());
    }

    #[test]
    fn trailing_finished_ticks_stay_in_the_race() {
        let mut stream = PacketStream::from_packets(
            race_packets(&["Alice", "Bob"], 3).into_iter().map(Arc::new).collect(),
        );
        let segment = capture_segment(&mut stream);

        assert_eq!(segment.packets.len(), 1 + 1 + 3 + 1);
        assert_eq!((segment.previous, segment.current), (Finished, Finished));
        assert!(segment.is_complete());
    }

    #[test]
    fn races_split_on_closing_transitions() {
        let mut stream = stream_of(&[
            PreRace, Racing, Finished, Finished, Undefined, Loading, PreRace, Racing, Racing,
            Loading, PreRace, Racing,
        ]);

        let first = capture_segment(&mut stream);
        assert_eq!(states_of(&first), [PreRace, Racing, Finished, Finished]);
        assert_eq!((first.previous, first.current), (Finished, Undefined));
        assert!(first.closed);
        assert!(!first.is_complete());

        let restarted = capture_segment(&mut stream);
        assert_eq!(states_of(&restarted), [PreRace, Racing, Racing]);
        assert_eq!((restarted.previous, restarted.current), (Racing, Loading));
        assert!(!restarted.is_complete());

        let last = capture_segment(&mut stream);
        assert_eq!(states_of(&last), [PreRace, Racing]);
        assert!(!last.closed);
        assert!(!last.is_complete());
        assert!(!stream.has_next());
    }

    #[test]
    fn leaving_finished_for_another_state_is_incomplete() {
        let mut stream = stream_of(&[PreRace, Racing, Finished, Undefined, Racing]);
        let segment = capture_segment(&mut stream);

        assert_eq!(states_of(&segment), [PreRace, Racing, Finished]);
        assert_eq!((segment.previous, segment.current), (Finished, Undefined));
        assert!(!segment.is_complete());
        assert!(stream.has_next());
    }

    #[test]
    fn exhaustion_after_undecodable_frame_closes_undefined() {
        let mut stream = framed_then_garbage(&[PreRace, Racing, Undefined]);
        let segment = capture_segment(&mut stream);

        assert_eq!(states_of(&segment), [PreRace, Racing, Undefined]);
        assert_eq!(segment.current, Undefined);
        assert!(segment.closed);
        assert!(!segment.is_complete());
        assert!(!stream.has_next());
        assert_eq!(stream.stats().unknown_length, 1);
    }

    #[test]
    fn exhaustion_after_undecodable_frame_leaves_racing_open() {
        let mut stream = framed_then_garbage(&[PreRace, Racing, Racing]);
        let segment = capture_segment(&mut stream);

        assert_eq!(states_of(&segment), [PreRace, Racing, Racing]);
        assert!(!segment.closed);
        assert!(!segment.is_complete());
        assert!(!stream.has_next());
    }

    #[test]
    fn finished_tick_before_undecodable_frame_is_kept() {
        let mut trailing = framed_then_garbage(&[PreRace, Racing, Finished]);
        let kept = capture_segment(&mut trailing);
        assert_eq!(states_of(&kept), [PreRace, Racing, Finished]);
        assert!(kept.closed && kept.is_complete());

        let clean = [PreRace, Racing, Finished].map(|s| encode(&Packet::from(telemetry_in(s, 2))));
        let clean = framed_capture(&clean);
        let dropped = capture_segment(&mut PacketStream::from_bytes(clean));
        assert_eq!(states_of(&dropped), [PreRace, Racing]);
        assert!(dropped.closed && dropped.is_complete());
    }

    #[test]
    fn loading_after_finish_does_not_close() {
        let mut stream = stream_of(&[PreRace, Racing, Finished, Loading, Racing, Finished]);
        let segment = capture_segment(&mut stream);
        assert_eq!(states_of(&segment), [PreRace, Racing, Finished, Loading, Racing]);
        assert!(segment.is_complete());
    }

    #[test]
    fn cut_off_feed_is_incomplete() {
        let mut stream = stream_of(&[PreRace, Racing, Racing, Loading, Undefined]);
        let segment = capture_segment(&mut stream);

        assert_eq!(states_of(&segment), [PreRace, Racing, Racing]);
        assert!(!segment.is_complete());
        assert!(stream.has_next());
    }

    #[test]
    fn stream_ending_mid_race_keeps_packets() {
        let mut stream = stream_of(&[PreRace, Racing, Racing]);
        let segment = capture_segment(&mut stream);

        assert_eq!(segment.packets.len(), 3);
        assert!(!segment.is_complete());
    }

    #[test]
    fn identity_packets_ride_along() {
        let packets = vec![
            shared(telemetry_in(Loading, 0)),
            shared(participant_packet(&["Early"])),
            shared(telemetry_in(PreRace, 1)),
            shared(participant_packet(&["Alice"])),
            shared(telemetry_in(Racing, 1)),
            shared(telemetry_in(Finished, 1)),
        ];
        let segment = capture_segment(&mut PacketStream::from_packets(packets));

        assert_eq!(segment.packets.len(), 3);
        assert!(segment.packets[1].names().is_some());
    }

    #[test]
    fn closing_before_any_start_yields_empty_segments() {
        let mut stream = stream_of(&[Racing, Finished, Racing, Undefined]);

        let segment = capture_segment(&mut stream);
        assert!(segment.packets.is_empty());
        assert!(stream.has_next());

        let segment = capture_segment(&mut stream);
        assert!(segment.packets.is_empty());
        assert!(!stream.has_next());
    }
}
