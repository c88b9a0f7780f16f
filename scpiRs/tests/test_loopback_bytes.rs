//! Test cases for the LoopbackInterfaceBytes.

use std::time::Duration;

use rstest::*;

use scpirs::{InstrumentError, InstrumentInterface, LoopbackInterfaceBytes};

const PROMPT: &[u8] = b"atlas ready>";

/// A function that creates a new `LoopbackInterfaceBytes` with the given input and output vectors.
fn crt_lbk(input: Vec<Vec<u8>>, output: Vec<Vec<u8>>) -> LoopbackInterfaceBytes {
    LoopbackInterfaceBytes::new(input, output)
}

/// Create a loopback interface that contains no commands.
#[fixture]
fn emp_lbk() -> LoopbackInterfaceBytes {
    crt_lbk(vec![], vec![])
}

/// Ensure `finalize` method passes if an empty loopback interface is used.
///
/// This routine calls the finalize method manually, however, it is not necessary to do so as it is
/// implemented in the `Drop` trait for `LoopbackInterfaceBytes`.
#[rstest]
fn finalize_test(mut emp_lbk: LoopbackInterfaceBytes) {
    emp_lbk.finalize();
}

/// Ensure `finalize` method panics if bytes are left in the loopback interface.
///
/// Note that the finalize method is called in the `Drop` trait, so it is not necessary to call it
/// directly.
#[rstest]
#[case(vec![vec![0x01]], vec![])]
#[case(vec![], vec![vec![0x02]])]
#[case(vec![vec![0x01]], vec![vec![0x02]])]
#[should_panic]
fn finalize_test_panic(#[case] from_host: Vec<Vec<u8>>, #[case] from_inst: Vec<Vec<u8>>) {
    let _ = crt_lbk(from_host, from_inst);
}

#[rstest]
fn write_raw() {
    let mut lbk = crt_lbk(vec![vec![0x01], vec![0x02]], vec![]);
    lbk.write_raw(&[0x01]).unwrap();
    lbk.write_raw(&[0x02]).unwrap();
}

#[rstest]
#[should_panic]
fn write_raw_mismatch() {
    let mut lbk = crt_lbk(vec![vec![0x01]], vec![]);
    let _ = lbk.write_raw(&[0x03]);
}

/// The prompt arrives in two chunks and is still found as one delimiter.
#[rstest]
fn split_prompt() {
    let mut lbk = crt_lbk(
        vec![b"*OPC?\n".to_vec()],
        vec![b"1atlas re".to_vec(), b"ady>".to_vec()],
    );
    lbk.sendcmd("*OPC?").unwrap();
    assert_eq!(
        lbk.receive_until(PROMPT, Duration::from_secs(1)).unwrap(),
        b"1"
    );
}

/// Once the script is exhausted, the instrument is silent and reads time out.
#[rstest]
fn silence_times_out(mut emp_lbk: LoopbackInterfaceBytes) {
    let timeout = Duration::from_millis(10);
    assert!(matches!(
        emp_lbk.receive_until(PROMPT, timeout),
        Err(InstrumentError::Timeout(t)) if t == timeout
    ));
}

/// An empty chunk closes the channel.
#[rstest]
fn empty_chunk_closes_channel() {
    let mut lbk = crt_lbk(vec![], vec![b"partial".to_vec(), vec![]]);
    assert!(matches!(
        lbk.receive_until(PROMPT, Duration::from_secs(1)),
        Err(InstrumentError::ChannelClosed)
    ));
}

#[rstest]
fn closed_interface_refuses_traffic(mut emp_lbk: LoopbackInterfaceBytes) {
    emp_lbk.close();
    assert!(emp_lbk.is_closed());
    assert!(matches!(
        emp_lbk.write_raw(b"*RST\n"),
        Err(InstrumentError::ChannelClosed)
    ));
}
