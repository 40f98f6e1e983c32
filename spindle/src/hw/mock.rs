// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! In-memory stand-ins for the I2C bus and GPIO pins, used by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation};

/// Output pin that records its level. Clones share the same state.
#[derive(Clone, Default)]
pub struct MockPin {
    level: Arc<Mutex<Option<bool>>>,
    fail: Arc<AtomicBool>,
    drives: Arc<AtomicUsize>,
}

impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level driven, `None` if never driven.
    pub fn level(&self) -> Option<bool> {
        *self.level.lock().unwrap()
    }

    /// Make every subsequent drive fail (or succeed again).
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of successful drives.
    pub fn drives(&self) -> usize {
        self.drives.load(Ordering::SeqCst)
    }

    fn drive(&mut self, high: bool) -> Result<(), digital::ErrorKind> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(digital::ErrorKind::Other);
        }
        *self.level.lock().unwrap() = Some(high);
        self.drives.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl digital::ErrorType for MockPin {
    type Error = digital::ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

type Hook = Box<dyn FnMut(u16) + Send>;

/// I2C bus that records every successful write. Clones share the same state.
#[derive(Clone, Default)]
pub struct MockI2c {
    writes: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
    fail_all: Arc<AtomicBool>,
    fail_code: Arc<Mutex<Option<u16>>>,
    hook: Arc<Mutex<Option<Hook>>>,
}

/// Handle for a ramp paused inside a bus write.
pub struct Pause {
    pub reached: Receiver<()>,
    pub release: Sender<()>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw frames written so far, with their target address.
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    /// DAC codes carried by the fast-write frames written so far.
    pub fn codes(&self) -> Vec<u16> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, frame)| frame.len() == 4)
            .map(|(_, frame)| (((frame[0] & 0x0F) as u16) << 8) | frame[1] as u16)
            .collect()
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Fail every write that carries `code`.
    pub fn fail_code(&self, code: Option<u16>) {
        *self.fail_code.lock().unwrap() = code;
    }

    /// Block the writer the first time it writes `code`, until the test releases it.
    pub fn pause_at(&self, code: u16) -> Pause {
        let (reached_tx, reached) = mpsc::channel();
        let (release, release_rx) = mpsc::channel::<()>();
        let mut armed = true;
        *self.hook.lock().unwrap() = Some(Box::new(move |written| {
            if armed && written == code {
                armed = false;
                let _ = reached_tx.send(());
                let _ = release_rx.recv();
            }
        }));
        Pause { reached, release }
    }

    /// Panic inside the write of `code`, taking the writing thread down.
    pub fn panic_at(&self, code: u16) {
        *self.hook.lock().unwrap() = Some(Box::new(move |written| {
            if written == code {
                panic!("bus wedged at code {}", code);
            }
        }));
    }

    fn record(&mut self, address: u8, frame: &[u8]) -> Result<(), i2c::ErrorKind> {
        let code = if frame.len() == 4 {
            Some((((frame[0] & 0x0F) as u16) << 8) | frame[1] as u16)
        } else {
            None
        };

        if self.fail_all.load(Ordering::SeqCst)
            || (code.is_some() && *self.fail_code.lock().unwrap() == code)
        {
            return Err(i2c::ErrorKind::Other);
        }

        self.writes.lock().unwrap().push((address, frame.to_vec()));

        if let Some(code) = code {
            if let Some(hook) = self.hook.lock().unwrap().as_mut() {
                hook(code);
            }
        }
        Ok(())
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = i2c::ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations.iter_mut() {
            match op {
                Operation::Write(frame) => self.record(address, frame)?,
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}
