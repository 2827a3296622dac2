// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The six concrete end-to-end scenarios, driven through the public
//! `Client` API against an in-memory mock `ByteStream` instead of a real
//! socket, so they run without a network and without sleeping — time is
//! passed explicitly via `Instant`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::net::Shutdown;
use std::rc::Rc;
use std::time::{Duration, Instant};

use open_protocol_client::connection::{BoxedByteStream, ByteStream};
use open_protocol_client::events::Event;
use open_protocol_client::protocol::mid;
use open_protocol_client::{Client, ClientConfig};

#[derive(Debug, Default)]
struct MockState {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    closed: bool,
}

/// A handle retained by the test after the stream itself has been moved
/// into the `Client`, so the test can keep pushing inbound bytes and
/// inspecting what was written to the wire.
#[derive(Clone, Default)]
struct MockHandle(Rc<RefCell<MockState>>);

impl MockHandle {
    fn new_pair() -> (MockHandle, MockStream) {
        let state = Rc::new(RefCell::new(MockState::default()));
        (MockHandle(state.clone()), MockStream(state))
    }

    fn push_inbound(&self, bytes: &[u8]) {
        self.0.borrow_mut().inbound.extend(bytes.iter().copied());
    }

    fn outbound(&self) -> Vec<u8> {
        self.0.borrow().outbound.clone()
    }

    /// Simulate the peer hanging up: the next read returns `Ok(0)`.
    fn close_remote(&self) {
        self.0.borrow_mut().closed = true;
    }
}

#[derive(Default)]
struct MockStream(Rc<RefCell<MockState>>);

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.0.borrow_mut();
        if state.closed {
            return Ok(0);
        }
        if state.inbound.is_empty() {
            return Err(io::Error::new(ErrorKind::WouldBlock, "no data"));
        }
        let mut n = 0;
        while n < buf.len() {
            match state.inbound.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().outbound.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteStream for MockStream {
    fn shutdown(&mut self, _how: Shutdown) -> io::Result<()> {
        self.0.borrow_mut().closed = true;
        Ok(())
    }

    fn set_nonblocking(&self, _nonblocking: bool) -> io::Result<()> {
        Ok(())
    }

    fn set_read_timeout(&self, _dur: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

/// Build a raw on-wire frame with an explicit header revision field,
/// independent of the codec's fixed `"001"` on encode — these scenarios
/// need to declare a specific protocol revision and spindle.
fn raw_frame(wire_mid: u16, revision: u16, spindle: u8, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("{wire_mid:04}").as_bytes());
    body.extend_from_slice(format!("{revision:03}").as_bytes());
    body.push(b'0'); // ack required
    body.extend_from_slice(b"01"); // station
    body.extend_from_slice(format!("{spindle:02}").as_bytes());
    body.extend_from_slice(b"    "); // spare
    body.extend_from_slice(payload);
    let mut frame = format!("{:04}", body.len() + 4).into_bytes();
    frame.extend_from_slice(&body);
    frame
}

fn contains_mid(wire: &[u8], wire_mid: u16) -> bool {
    let needle = format!("{wire_mid:04}").into_bytes();
    wire.windows(4).any(|w| w == needle.as_slice())
}

fn client_with_mock(config: ClientConfig) -> (Client, MockHandle) {
    let now = Instant::now();
    let mut client = Client::new(config, now);
    let (handle, stream) = MockHandle::new_pair();
    let stream: BoxedByteStream = Box::new(stream);
    client.connect_with_stream(stream, now);
    (client, handle)
}

/// Scenario 1: handshake establishes the link and auto-subscribes.
#[test]
fn scenario_handshake_establishes_link_and_auto_subscribes() {
    let (mut client, handle) = client_with_mock(ClientConfig::new("controller").unwrap());
    let now = Instant::now();
    handle.push_inbound(&raw_frame(mid::COMM_START_ACK_ALT, 2, 0, b""));

    let events = client.poll(now);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::LinkEstablished { revision: 2 })));
    assert!(client.get_state().connection.link_ready);

    let sent = handle.outbound();
    assert!(contains_mid(&sent, mid::SUBSCRIBE_RESULTS));
    assert!(contains_mid(&sent, mid::ALARM));
}

/// Scenario 2: a single-spindle Revision 1 cycle completes and acks.
#[test]
fn scenario_single_spindle_cycle_rev1_completes_and_acks() {
    let config = ClientConfig::new("controller").unwrap().with_spindle_count(1).unwrap();
    let (mut client, handle) = client_with_mock(config);
    let now = Instant::now();

    handle.push_inbound(&raw_frame(mid::TOOL_STATUS, 1, 0, b"1110"));
    let events = client.poll(now);
    assert!(events.iter().any(|e| matches!(e, Event::TighteningCycleStarted { .. })));

    let mut payload = Vec::new();
    payload.extend_from_slice(b"1234567890"); // tightening_id
    payload.extend_from_slice(b"001234"); // torque, /100 = 12.34
    payload.extend_from_slice(b"000090"); // angle
    payload.extend_from_slice(b"11"); // torque_status, angle_status
    handle.push_inbound(&raw_frame(mid::LAST_RESULT, 1, 1, &payload));

    let events = client.poll(now);
    let result = events
        .iter()
        .find_map(|e| match e {
            Event::SpindleResult { result } => Some(result),
            _ => None,
        })
        .expect("spindleResult event");
    assert!((result.torque - 12.34).abs() < 1e-9);
    assert_eq!(result.angle, 90.0);
    assert!(result.ok);

    assert!(events
        .iter()
        .any(|e| matches!(e, Event::TighteningCycleCompleted { overall_ok: true, .. })));
    assert!(contains_mid(&handle.outbound(), mid::RESULT_ACK));
}

/// Scenario 3: the watchdog declares a cycle incomplete when a spindle
/// never reports.
#[test]
fn scenario_watchdog_fires_when_second_spindle_never_reports() {
    let config = ClientConfig::new("controller").unwrap().with_spindle_count(2).unwrap();
    let (mut client, handle) = client_with_mock(config);
    let now = Instant::now();

    handle.push_inbound(&raw_frame(mid::TOOL_STATUS, 1, 0, b"1110"));
    client.poll(now);

    let mut payload = Vec::new();
    payload.extend_from_slice(b"1234567890");
    payload.extend_from_slice(b"001234");
    payload.extend_from_slice(b"000090");
    payload.extend_from_slice(b"11");
    handle.push_inbound(&raw_frame(mid::LAST_RESULT, 1, 1, &payload));
    let events = client.poll(now);
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::TighteningCycleCompleted { .. })));

    let events = client.poll(now + Duration::from_secs(8));
    match events.iter().find(|e| matches!(e, Event::TighteningIncomplete { .. })) {
        Some(Event::TighteningIncomplete { expected, received, .. }) => {
            assert_eq!(*expected, 2);
            assert_eq!(*received, 1);
        }
        other => panic!("expected tighteningIncomplete, got {other:?}"),
    }
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::TighteningCycleCompleted { .. })));
}

/// Scenario 4: an unexpected disconnect schedules reconnect with
/// exponential backoff (doubling/capping is covered directly against the
/// connection manager, since the mock can't drive a real TCP reconnect).
#[test]
fn scenario_reconnect_backs_off_after_unexpected_disconnect() {
    let (mut client, handle) = client_with_mock(ClientConfig::new("controller").unwrap());
    let now = Instant::now();
    handle.push_inbound(&raw_frame(mid::COMM_START_ACK_ALT, 1, 0, b""));
    client.poll(now);
    assert!(client.is_connected());

    handle.close_remote();
    let events = client.poll(now);
    assert!(events.iter().any(|e| matches!(e, Event::Disconnected)));
    assert!(!client.is_connected());
    match events.iter().find(|e| matches!(e, Event::Reconnecting { .. })) {
        Some(Event::Reconnecting { attempt, delay }) => {
            assert_eq!(*attempt, 1);
            assert_eq!(*delay, Duration::from_secs(1));
        }
        other => panic!("expected reconnecting{{attempt:1}}, got {other:?}"),
    }
}

/// Scenario 5: `startTightening()` fails on the first violated interlock
/// rule (tool disabled takes priority over controller-not-ready).
#[test]
fn scenario_interlock_fails_on_first_violated_rule() {
    let (mut client, handle) = client_with_mock(ClientConfig::new("controller").unwrap());
    let now = Instant::now();
    handle.push_inbound(&raw_frame(mid::COMM_START_ACK_ALT, 1, 0, b""));
    client.poll(now);
    handle.push_inbound(&raw_frame(mid::JOB_REPLY, 1, 0, b"0001001"));
    client.poll(now);

    // tool.enabled is false (never enabled) and controller.ready is also
    // false; the gate must report TOOL_DISABLED, not CTRL_NOT_READY.
    let err = client.start_tightening(now).unwrap_err();
    match err {
        open_protocol_client::Error::Interlock(v) => assert_eq!(v.code(), "TOOL_DISABLED"),
        other => panic!("expected interlock violation, got {other:?}"),
    }
}

/// Scenario 6: the two-sided batch-reset protocol.
#[test]
fn scenario_batch_reset_protocol() {
    // Confirmed path.
    let (mut client, handle) = client_with_mock(ClientConfig::new("controller").unwrap());
    let now = Instant::now();
    handle.push_inbound(&raw_frame(mid::COMM_START_ACK_ALT, 1, 0, b""));
    client.poll(now);

    client.reset_batch(now).unwrap();
    assert!(client.get_state().batch.pending_reset);

    handle.push_inbound(&raw_frame(mid::COMMAND_ACCEPTED, 1, 0, b"0020"));
    let events = client.poll(now);
    assert!(events.iter().any(|e| matches!(e, Event::BatchResetConfirmed)));
    assert!(!client.get_state().batch.pending_reset);
    assert_eq!(client.get_state().batch.counter, 0);

    // Failed path, on a fresh client.
    let (mut client, handle) = client_with_mock(ClientConfig::new("controller").unwrap());
    handle.push_inbound(&raw_frame(mid::COMM_START_ACK_ALT, 1, 0, b""));
    client.poll(now);
    client.reset_batch(now).unwrap();

    let mut error_payload = Vec::new();
    error_payload.extend_from_slice(b"0020"); // failed_mid
    error_payload.extend_from_slice(b"0001"); // error_code
    error_payload.extend_from_slice(b"denied");
    handle.push_inbound(&raw_frame(mid::COMMAND_ERROR, 1, 0, &error_payload));
    let events = client.poll(now);
    assert!(events.iter().any(|e| matches!(e, Event::BatchResetFailed)));
    assert!(!client.get_state().batch.pending_reset);
}
