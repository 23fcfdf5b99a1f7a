//! Shared CLI plumbing: the console notification sink and permission
//! gate, and the scheduler constructor over the default data directory.

use happyday_core::{
    FileBackend, Notification, NotificationSink, Permission, PermissionGate, ReminderScheduler,
};

/// Terminal gate: the console can always "show" notifications.
pub struct ConsoleGate;

impl PermissionGate for ConsoleGate {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn prompt(&mut self) -> Permission {
        Permission::Granted
    }
}

/// Prints notifications to stdout.
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn show(&mut self, n: &Notification) -> Result<(), Box<dyn std::error::Error>> {
        println!();
        println!("┌──────────────────────────────────────────────");
        println!("│ {}", n.title);
        println!("│ {}", n.body);
        println!("└──────────────────────────────────────────────");
        Ok(())
    }
}

pub type CliScheduler = ReminderScheduler<ConsoleGate, ConsoleSink, FileBackend>;

/// Scheduler over `~/.config/happyday/` with console delivery.
pub fn open_scheduler() -> Result<CliScheduler, Box<dyn std::error::Error>> {
    let backend = FileBackend::open_default()?;
    Ok(ReminderScheduler::new(ConsoleGate, ConsoleSink, backend))
}
