//! Leveled progress messages for the minimizers.
//!
//! A [`LogManager`] is a plain value handed to each minimizer, so different
//! minimizers may log at different levels or to different destinations. By default
//! messages are forwarded to the [`log`] facade (`Normal` as `info`, `Verbose` as
//! `debug`, target `noisymin`); [`LogManager::redirect`] sends them to any writer
//! instead. Formatting only happens for messages that pass the level filter.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use ndarray::ArrayView1;

use crate::noisy::{NoisyBracket, NoisyIOPair, NoisyValue};

const TARGET: &str = "noisymin";

/// Verbosity of a [`LogManager`], and the level attached to each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    #[default]
    Off,
    Normal,
    Verbose,
}

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

#[derive(Clone, Default)]
enum Destination {
    #[default]
    Facade,
    Writer(SharedWriter),
}

#[derive(Clone, Default)]
pub struct LogManager {
    level: LogLevel,
    destination: Destination,
}

impl fmt::Debug for LogManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let destination = match self.destination {
            Destination::Facade => "facade",
            Destination::Writer(_) => "writer",
        };
        f.debug_struct("LogManager")
            .field("level", &self.level)
            .field("destination", &destination)
            .finish()
    }
}

impl LogManager {
    /// A manager that discards everything.
    pub fn off() -> Self {
        LogManager::default()
    }

    pub fn with_level(level: LogLevel) -> Self {
        LogManager {
            level,
            destination: Destination::Facade,
        }
    }

    /// Sets the level to `Verbose` or `Normal`.
    pub fn set_logging_on(&mut self, verbose: bool) {
        self.level = if verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        };
    }

    pub fn set_logging_off(&mut self) {
        self.level = LogLevel::Off;
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn is_logging_on(&self) -> bool {
        self.level > LogLevel::Off
    }

    pub fn is_verbose(&self) -> bool {
        self.level >= LogLevel::Verbose
    }

    /// Would a message of `level` be emitted?
    #[inline]
    pub fn should_log(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level <= self.level
    }

    /// Sends all further messages to `writer`, one line per message.
    pub fn redirect<W: Write + Send + 'static>(&mut self, writer: W) {
        self.destination = Destination::Writer(Arc::new(Mutex::new(Box::new(writer))));
    }

    /// Sends all further messages to the `log` facade again.
    pub fn redirect_to_facade(&mut self) {
        self.destination = Destination::Facade;
    }

    pub fn log_string(&self, message: &str, level: LogLevel) {
        if self.should_log(level) {
            self.emit(message, level);
        }
    }

    /// Builds the message only if it will be emitted.
    #[inline]
    pub fn log_with<M: FnOnce() -> String>(&self, level: LogLevel, message: M) {
        if self.should_log(level) {
            self.emit(&message(), level);
        }
    }

    pub fn log_noisy_value(&self, nv: NoisyValue, level: LogLevel, name: &str, flabel: &str) {
        self.log_with(level, || format!("{}{} = {}", prefix(name), flabel, nv));
    }

    pub fn log_vector(&self, x: ArrayView1<f64>, level: LogLevel, name: &str, xlabel: &str) {
        self.log_with(level, || {
            format!("{}{} = [{}]", prefix(name), xlabel, join(x.iter()))
        });
    }

    pub fn log_noisy_vector(
        &self,
        g: ArrayView1<NoisyValue>,
        level: LogLevel,
        print_errors: bool,
        name: &str,
        glabel: &str,
    ) {
        self.log_with(level, || {
            let body = if print_errors {
                join(g.iter())
            } else {
                join(g.iter().map(|gi| gi.val))
            };
            format!("{}{} = [{}]", prefix(name), glabel, body)
        });
    }

    pub fn log_io_pair(&self, pair: &NoisyIOPair, level: LogLevel, name: &str) {
        self.log_with(level, || {
            format!("{}x = [{}]    f = {}", prefix(name), join(pair.x.iter()), pair.f)
        });
    }

    pub fn log_bracket(&self, key: &str, bracket: &NoisyBracket) {
        self.log_with(LogLevel::Verbose, || {
            format!(
                "{}:    {} -> {}    {} -> {}    {} -> {}",
                key,
                bracket.a.x,
                bracket.a.f,
                bracket.b.x,
                bracket.b.f,
                bracket.c.x,
                bracket.c.f
            )
        });
    }

    fn emit(&self, message: &str, level: LogLevel) {
        match self.destination {
            Destination::Facade => match level {
                LogLevel::Verbose => log::debug!(target: TARGET, "{}", message),
                _ => log::info!(target: TARGET, "{}", message),
            },
            Destination::Writer(ref writer) => {
                // a poisoned or failing writer only loses the message
                if let Ok(mut w) = writer.lock() {
                    let _ = writeln!(w, "{}", message);
                }
            }
        }
    }
}

fn prefix(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else {
        format!("{}: ", name)
    }
}

fn join<T: fmt::Display, I: Iterator<Item = T>>(items: I) -> String {
    items
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::noisy::NoisyIOPair1D;
    use ndarray::arr1;

    /// Writer whose contents stay readable after it has been moved into a manager.
    #[derive(Clone, Default)]
    pub(crate) struct Capture(pub Arc<Mutex<Vec<u8>>>);

    impl Capture {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn level_switches() {
        let mut log = LogManager::off();
        assert!(!log.is_logging_on());

        log.set_logging_on(true);
        assert!(log.is_logging_on());
        assert!(log.is_verbose());

        log.set_logging_on(false);
        assert!(log.is_logging_on());
        assert!(!log.is_verbose());
        assert!(log.should_log(LogLevel::Normal));
        assert!(!log.should_log(LogLevel::Verbose));
        assert!(!log.should_log(LogLevel::Off));

        log.set_logging_off();
        assert_eq!(log.level(), LogLevel::Off);
        assert!(!log.is_verbose());
    }

    #[test]
    fn redirected_messages_are_filtered() {
        let capture = Capture::default();
        let mut log = LogManager::with_level(LogLevel::Normal);
        log.redirect(capture.clone());

        log.log_string("kept", LogLevel::Normal);
        log.log_string("dropped", LogLevel::Verbose);
        log.log_with(LogLevel::Verbose, || panic!("must not be formatted"));

        assert_eq!(capture.contents(), "kept\n");
    }

    #[test]
    fn structured_helpers() {
        let capture = Capture::default();
        let mut log = LogManager::with_level(LogLevel::Verbose);
        log.redirect(capture.clone());

        log.log_noisy_value(NoisyValue::new(1.5, 0.25), LogLevel::Normal, "", "f");
        log.log_vector(arr1(&[1.0, 2.0]).view(), LogLevel::Normal, "pos", "x");
        let g = arr1(&[NoisyValue::new(0.5, 0.125), NoisyValue::exact(-1.0)]);
        log.log_noisy_vector(g.view(), LogLevel::Verbose, false, "grad", "g");
        log.log_io_pair(
            &NoisyIOPair::new(arr1(&[3.0]), NoisyValue::exact(9.0)),
            LogLevel::Normal,
            "step",
        );
        let p = |x: f64| NoisyIOPair1D::new(x, NoisyValue::exact(x * x));
        log.log_bracket("init", &NoisyBracket::new(p(-1.0), p(0.0), p(2.0)));

        assert_eq!(
            capture.contents(),
            "f = 1.5 +- 0.25\n\
             pos: x = [1, 2]\n\
             grad: g = [0.5, -1]\n\
             step: x = [3]    f = 9 +- 0\n\
             init:    -1 -> 1 +- 0    0 -> 0 +- 0    2 -> 4 +- 0\n"
        );
    }

    #[test]
    fn facade_destination_is_restorable() {
        let capture = Capture::default();
        let mut log = LogManager::with_level(LogLevel::Normal);
        log.redirect(capture.clone());
        log.redirect_to_facade();
        log.log_string("to the facade", LogLevel::Normal);
        assert!(capture.contents().is_empty());
        assert_eq!(format!("{:?}", log), "LogManager { level: Normal, destination: \"facade\" }");
    }
}
