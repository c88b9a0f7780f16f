//! Tests for the [`Instrument`] interface itself.
//!
//! An in-memory `VecDeque<u8>` serves as port: everything that is written can be read back.

use std::{collections::VecDeque, time::Duration};

use rstest::*;

use scpirs::{Instrument, InstrumentError, InstrumentInterface};

/// Set up an empty instrument.
#[fixture]
fn empt_inst() -> Instrument<VecDeque<u8>> {
    Instrument::new(VecDeque::new())
}

/// Set up an instrument whose port holds a reply without prompt.
#[fixture]
fn no_prompt_inst() -> Instrument<VecDeque<u8>> {
    Instrument::new(VecDeque::from(b"resp".to_vec()))
}

#[rstest]
fn test_instrument_terminator(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert_eq!(empt_inst.get_terminator(), "\n");

    empt_inst.set_terminator("\n\r");
    assert_eq!(empt_inst.get_terminator(), "\n\r");
}

#[rstest]
fn test_instrument_sendcmd_appends_terminator(mut empt_inst: Instrument<VecDeque<u8>>) {
    empt_inst.set_terminator("\n\r");
    empt_inst.sendcmd("*RST").unwrap();
    assert_eq!(empt_inst.port().iter().copied().collect::<Vec<u8>>(), b"*RST\n\r");
}

#[rstest]
fn test_instrument_write_receive(mut empt_inst: Instrument<VecDeque<u8>>) {
    empt_inst.write_raw(b"1550.000>0>").unwrap();

    let first = empt_inst.receive_until(b">", Duration::from_secs(1)).unwrap();
    assert_eq!(first, b"1550.000");
    let second = empt_inst.receive_until(b">", Duration::from_secs(1)).unwrap();
    assert_eq!(second, b"0");
}

/// Timing out with a zero timeout, no read is even attempted.
#[rstest]
fn test_instrument_receive_timeout(mut no_prompt_inst: Instrument<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);

    match no_prompt_inst.receive_until(b">", timeout_exp) {
        Err(InstrumentError::Timeout(timeout)) => {
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}

/// An exhausted in-memory port reads zero bytes, which is a closed channel.
#[rstest]
fn test_instrument_receive_closed(mut no_prompt_inst: Instrument<VecDeque<u8>>) {
    assert!(matches!(
        no_prompt_inst.receive_until(b">", Duration::from_secs(1)),
        Err(InstrumentError::ChannelClosed)
    ));
}

#[rstest]
fn test_instrument_close_is_idempotent(mut empt_inst: Instrument<VecDeque<u8>>) {
    empt_inst.close();
    empt_inst.close();
    assert!(empt_inst.is_closed());
    assert!(matches!(
        empt_inst.sendcmd("*RST"),
        Err(InstrumentError::ChannelClosed)
    ));
    assert!(matches!(
        empt_inst.receive_until(b">", Duration::from_secs(1)),
        Err(InstrumentError::ChannelClosed)
    ));
}
