//! Paces delivery of tempo values to the metronome wall, one device per tick.
//!
//! The scheduler is a cyclic state machine driven by one call per update
//! tick. With M device slots the cycle is M + 2 ticks long:
//!
//! - ticks `0 .. M-1` (FILL): one "set tempo pair" command per tick, for the
//!   device at the cursor (routed through the wiring rotation when enabled);
//! - tick `M` (SYNC): one "Start" command restarting all devices in phase;
//! - tick `M + 1` (WATCH): tracking-loss bookkeeping, and a one-shot
//!   "Reset_all" after the debounce window expires.
//!
//! Sends are best effort. A write failure becomes the rolling status string
//! and the machine advances regardless: losing one frame's command beats
//! stalling the whole installation.

use crate::transport::Transport;
use log::warn;

/// Wire command: restart every device in phase.
pub const CMD_START: &str = "Start\n";
/// Wire command: full reset of the wall.
pub const CMD_RESET_ALL: &str = "Set Reset_all\n";
/// Wire command: stop every device.
pub const CMD_STOP_ALL: &str = "Set Stop_all\n";
/// Wire command: per-device tempo reset.
pub const CMD_RESET_DEVICES: &str = "Set Reset_t_all\n";

/// Formats a "set tempo pair" command for a 1-based device number.
pub fn cmd_set_tempo_pair(device: usize, even: i64, odd: i64) -> String {
    format!("Set {} BPM {} {}\n", device, even, odd)
}

/// Ticks before a lost-tracking reset fires; the counter must exceed this.
const LOSS_DEBOUNCE_TICKS: u32 = 3;

/// The per-tick serial delivery state machine.
pub struct SerialFrameScheduler<T: Transport> {
    transport: Option<T>,
    slots: usize,
    rotation: Option<Vec<usize>>,
    index: usize,
    loss_ticks: u32,
    reset_armed: bool,
    status: String,
}

impl<T: Transport> SerialFrameScheduler<T> {
    /// Creates a scheduler over `slots` device slots. `transport` may be
    /// `None` when no serial device was found; every send is then a quiet
    /// no-op. `rotation` remaps the slot cursor onto physical wiring order
    /// and must cover at least `slots` entries when present.
    pub fn new(transport: Option<T>, slots: usize, rotation: Option<Vec<usize>>) -> Self {
        if let Some(table) = &rotation {
            assert!(table.len() >= slots, "rotation table shorter than slot count");
        }
        Self {
            transport,
            slots,
            rotation,
            index: 0,
            loss_ticks: 0,
            reset_armed: true,
            status: String::new(),
        }
    }

    /// Runs one tick of the cycle against this frame's tempo values.
    ///
    /// `even` and `odd` are the parity-split tempo sequences and must cover
    /// every rotation target; `blob_count` is the number of blobs the tracker
    /// reported this frame.
    pub fn tick(&mut self, even: &[i64], odd: &[i64], blob_count: usize) {
        if self.index < self.slots {
            let target = match &self.rotation {
                Some(table) => table[self.index],
                None => self.index,
            };
            let line = cmd_set_tempo_pair(target + 1, even[target], odd[target]);
            self.send(&line);
        } else if self.index == self.slots {
            self.send(CMD_START);
        } else {
            self.watch(blob_count);
        }
        self.advance();
    }

    fn watch(&mut self, blob_count: usize) {
        if blob_count == 0 {
            self.loss_ticks += 1;
            if self.loss_ticks > LOSS_DEBOUNCE_TICKS && self.reset_armed {
                self.send(CMD_RESET_ALL);
                self.reset_armed = false;
            }
        } else {
            self.loss_ticks = 0;
            self.reset_armed = true;
        }
    }

    fn advance(&mut self) {
        if self.index > self.slots {
            self.index = 0;
        } else {
            self.index += 1;
        }
    }

    /// Stops every device. Called on shutdown.
    pub fn stop_all(&mut self) {
        self.send(CMD_STOP_ALL);
    }

    /// Resets the whole wall immediately, outside the loss debounce.
    pub fn reset_all(&mut self) {
        self.send(CMD_RESET_ALL);
    }

    /// Issues the per-device tempo reset.
    pub fn reset_devices(&mut self) {
        self.send(CMD_RESET_DEVICES);
    }

    fn send(&mut self, line: &str) {
        // No transport means no device was found at startup; stay quiet
        // rather than logging once per tick.
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        match transport.send_line(line) {
            Ok(()) => self.status = line.trim_end().to_owned(),
            Err(error) => {
                self.status = error.to_string();
                warn!("dropped command {:?}: {}", line.trim_end(), error);
            }
        }
    }

    /// The current device slot cursor.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Consecutive WATCH ticks without tracking.
    pub fn loss_ticks(&self) -> u32 {
        self.loss_ticks
    }

    /// Whether the one-shot loss reset is still armed.
    pub fn reset_armed(&self) -> bool {
        self.reset_armed
    }

    /// The last command sent or the last error, whichever came later.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The transport, when a device was found.
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }
}
