use bno055::{format_line, ScriptedTransport};
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;
use sweep::{
    ImuError, LineTransport, SweepCommand, SweepConfig, SweepError, SweepEvent, SweepReader,
};

const WAIT: Duration = Duration::from_secs(5);

fn config() -> SweepConfig {
    SweepConfig {
        sampling_rate: 2,
        window_size: 1,
        calibration_length: 1,
        sample_delay: 1,
        warmup_count: 0,
        settle_delay: Duration::ZERO,
    }
}

fn home_lines() -> Vec<String> {
    vec![format_line(&[1.0, 2.0, 3.0, 0.0, 0.0, 9.8]); 2]
}

/// Serves a fixed set of lines, then stays quiet like an idle sensor.
struct QuietAfter {
    lines: VecDeque<String>,
}

impl LineTransport for QuietAfter {
    fn read_line(&mut self) -> Result<Option<String>, ImuError> {
        match self.lines.pop_front() {
            Some(line) => Ok(Some(line)),
            None => {
                thread::sleep(Duration::from_millis(1));
                Ok(None)
            }
        }
    }

    fn clear_buffers(&mut self) -> Result<(), ImuError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), ImuError> {
        Ok(())
    }
}

fn wait_for(reader: &SweepReader, wanted: impl Fn(&SweepEvent) -> bool) -> SweepEvent {
    loop {
        match reader.recv_event(WAIT) {
            Some(event) if wanted(&event) => return event,
            Some(_) => {}
            None => panic!("timed out waiting for event"),
        }
    }
}

#[test]
fn commands_reach_the_reading_thread() {
    let transport = QuietAfter {
        lines: home_lines().into(),
    };
    let reader = SweepReader::with_transport(transport, config()).unwrap();

    let complete = wait_for(&reader, |e| matches!(e, SweepEvent::CalibrationComplete(_)));
    let SweepEvent::CalibrationComplete(home) = complete else {
        unreachable!()
    };
    assert_eq!(home.angles().to_array(), [1.0, 2.0, 3.0]);

    reader.start_live().unwrap();
    let rejected = wait_for(&reader, |e| matches!(e, SweepEvent::Rejected { .. }));
    assert!(matches!(
        rejected,
        SweepEvent::Rejected {
            command: SweepCommand::StartLive,
            ..
        }
    ));

    reader.start_mapping().unwrap();
    wait_for(&reader, |e| *e == SweepEvent::MappingStarted);

    reader.join().unwrap();
}

#[test]
fn stream_end_is_reported_as_failure() {
    let transport = ScriptedTransport::from_lines(home_lines());
    let reader = SweepReader::with_transport(transport, config()).unwrap();

    wait_for(&reader, |e| matches!(e, SweepEvent::CalibrationComplete(_)));
    let failed = wait_for(&reader, |e| !matches!(e, SweepEvent::Angles(_)));
    assert!(matches!(failed, SweepEvent::Failed(_)));
    assert_eq!(reader.recv_event(WAIT), Some(SweepEvent::Stopped));

    assert!(matches!(
        reader.join(),
        Err(SweepError::Transport(ImuError::Disconnected))
    ));
}

#[test]
fn invalid_config_fails_before_spawning() {
    let config = SweepConfig {
        sample_delay: 0,
        ..config()
    };
    let result = SweepReader::with_transport(ScriptedTransport::default(), config);
    assert!(matches!(result, Err(SweepError::InvalidConfig(_))));
}
