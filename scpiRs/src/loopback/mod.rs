//! The loopback module provides an instrument simulator for testing purposes.
//!
//! The [`LoopbackInterfaceString`] allows to test instruments drivers that communicate using
//! strings (which are then encoded as bytes of course), have a fixed terminator to declare the
//! end of a command, and end every reply with a ready prompt.
//!
//! The [`LoopbackInterfaceBytes`] hands out raw chunks, one per read, and goes silent when it runs
//! out. Use it to test framing, timeouts, and closed channels.
//!
//! Check out the [`LoopbackInterfaceString`] for more details and examples on how to use it. You can
//! also find simple and more advanced test examples that use the loopback interface in the
//! instrument drivers that are available in the GitHub repository of this project.

mod loopback_interface_bytes;
mod loopback_interface_string;

pub use loopback_interface_bytes::*;
pub use loopback_interface_string::*;

/// A self-incrementing index structure that by default starts at 0 and increments whenever `next`
/// is called.
#[derive(Debug, Default)]
struct IncrIndex {
    index: usize,
}

impl IncrIndex {
    fn next(&mut self) -> usize {
        let current = self.index;
        self.index += 1;
        current
    }

    /// The index that `next` would return, without incrementing.
    fn peek(&self) -> usize {
        self.index
    }
}

/// Panic if scripted traffic was left unused, unless we are already unwinding.
fn check_leftovers<T: std::fmt::Debug>(direction: &str, script: &[T], index: &IncrIndex) {
    if std::thread::panicking() {
        return;
    }
    if let Some(leftover) = script.get(index.peek()) {
        panic!("Leftover expected commands found from {direction}: {leftover:?}");
    }
}
