// SPDX-FileCopyrightText: 2023 IBM Corporation
// SPDX-FileContributor: Wojciech Ozga <woz@zurich.ibm.com>, IBM Research - Zurich
// SPDX-License-Identifier: Apache-2.0
use core::fmt::{Error, Write};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::{mutex::Mutex, Once};

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error:expr) => {
        if !$cond {
            Err($error)
        } else {
            Ok(())
        }
    };
}

#[macro_export]
macro_rules! ensure_not {
    ($cond:expr, $error:expr) => {
        if $cond {
            Err($error)
        } else {
            Ok(())
        }
    };
}

const PREFIX: &str = "[SBI-DOMAIN]: ";

/// Byte sink of the firmware console, usually the platform `putc`.
static SINK: Once<fn(u8)> = Once::new();

/// Keeps lines from different harts from interleaving.
static CONSOLE_LOCK: Mutex<()> = Mutex::new(());

static LOGGER: ConsoleLogger = ConsoleLogger;

pub struct Console {}

impl Console {
    pub fn new() -> Self {
        Console {}
    }

    /// Drops the byte when no sink has been registered yet.
    pub fn put(c: u8) {
        if let Some(putc) = SINK.get() {
            putc(c);
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for Console {
    fn write_str(&mut self, s: &str) -> Result<(), Error> {
        for i in s.bytes() {
            Self::put(i);
        }

        Ok(())
    }
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let _guard = CONSOLE_LOCK.lock();
        if write!(Console::new(), "{}{}\r\n", PREFIX, record.args()).is_err() {
            // we can safely ignore
        }
    }

    fn flush(&self) {}
}

/// Installs the logger and registers the console sink. Nothing is registered when another logger
/// is already installed.
pub fn init(putc: fn(u8), level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    SINK.call_once(|| putc);
    log::set_max_level(level);
    Ok(())
}
