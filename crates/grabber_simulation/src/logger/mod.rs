//! Глобальный logger симуляции
//!
//! Host (движок, headless binary, тесты) регистрирует свой `LogPrinter`.
//! Без printer'а все сообщения молча отбрасываются - ядро никогда не паникует из-за логов.

use once_cell::sync::Lazy;
use std::sync::Mutex;

static PRINTER: Lazy<Mutex<Option<Box<dyn LogPrinter>>>> = Lazy::new(|| Mutex::new(None));

static MIN_LEVEL: Lazy<Mutex<LogLevel>> = Lazy::new(|| Mutex::new(LogLevel::Debug));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Куда печатать (stdout, engine console, test capture)
pub trait LogPrinter: Send + Sync {
    fn print(&self, level: LogLevel, message: &str);
}

pub fn set_printer(printer: Box<dyn LogPrinter>) {
    if let Ok(mut slot) = PRINTER.lock() {
        *slot = Some(printer);
    }
}

pub fn set_printer_if_needed(printer: Box<dyn LogPrinter>) {
    if let Ok(mut slot) = PRINTER.lock() {
        if slot.is_none() {
            *slot = Some(printer);
        }
    }
}

pub fn set_log_level(level: LogLevel) {
    if let Ok(mut min) = MIN_LEVEL.lock() {
        *min = level;
    }
}

pub fn log_level() -> LogLevel {
    MIN_LEVEL.lock().map(|min| *min).unwrap_or(LogLevel::Debug)
}

pub fn log(message: &str) {
    log_with_level(LogLevel::Debug, message);
}

pub fn log_info(message: &str) {
    log_with_level(LogLevel::Info, message);
}

pub fn log_warning(message: &str) {
    log_with_level(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log_with_level(LogLevel::Error, message);
}

pub fn log_with_level(level: LogLevel, message: &str) {
    if level < log_level() {
        return;
    }

    // Timestamp добавляем здесь, printer получает готовую строку
    let Ok(slot) = PRINTER.lock() else {
        return;
    };
    if let Some(printer) = slot.as_ref() {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        printer.print(level, &format!("[{}] {}", timestamp, message));
    }
}

pub struct ConsoleLogger;

impl LogPrinter for ConsoleLogger {
    fn print(&self, level: LogLevel, message: &str) {
        println!("[{}] {}", level.as_str(), message);
    }
}

pub fn init_logger() {
    set_printer_if_needed(Box::new(ConsoleLogger));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert_eq!(LogLevel::Warning.as_str(), "WARNING");
    }

    #[test]
    fn test_log_without_printer_is_noop() {
        // Не паникует даже если printer ещё не зарегистрирован
        log_error("no printer yet");
    }
}
