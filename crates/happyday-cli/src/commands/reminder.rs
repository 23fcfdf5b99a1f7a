//! Reminder settings commands.

use chrono::Local;
use clap::Subcommand;
use happyday_core::{Event, Notification, Recurrence, ReminderKind, TimeOfDay};

use crate::common;

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Enable a reminder (journal, meditation, watering, or a custom slug)
    Set {
        /// Reminder kind
        kind: String,
        /// Wall-clock time as HH:MM; defaults to the kind's usual time
        #[arg(long)]
        time: Option<String>,
        /// Fire once instead of daily
        #[arg(long)]
        once: bool,
    },
    /// Disable a reminder
    Disable {
        /// Reminder kind
        kind: String,
    },
    /// List enabled reminders
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Send a test notification
    Test,
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ReminderAction::Set { kind, time, once } => set(&kind, time.as_deref(), once),
        ReminderAction::Disable { kind } => disable(&kind),
        ReminderAction::List { json } => list(json),
        ReminderAction::Test => test(),
    }
}

fn set(kind: &str, time: Option<&str>, once: bool) -> Result<(), Box<dyn std::error::Error>> {
    let kind = ReminderKind::parse(kind)?;
    let time_of_day = match time {
        Some(t) => t.parse::<TimeOfDay>()?,
        None => kind.default_time_of_day(),
    };
    let recurrence = if once { Recurrence::Once } else { Recurrence::Daily };

    let mut scheduler = common::open_scheduler()?;
    let event = scheduler.set_reminder(kind.clone(), time_of_day, true, recurrence)?;

    if let Event::ReminderArmed { fire_at, .. } = event {
        println!(
            "Reminder '{kind}' set for {time_of_day} ({recurrence:?}), next fire {}",
            fire_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
        println!("Note: a running `happyday run` picks this up on its next restart.");
    }
    Ok(())
}

fn disable(kind: &str) -> Result<(), Box<dyn std::error::Error>> {
    let kind = ReminderKind::parse(kind)?;
    let mut scheduler = common::open_scheduler()?;
    scheduler.remove_reminder(&kind)?;
    println!("Reminder '{kind}' disabled.");
    Ok(())
}

fn list(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = common::open_scheduler()?;
    let reminders = scheduler.active_reminders()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reminders)?);
        return Ok(());
    }

    if reminders.is_empty() {
        println!("No reminders set.");
        return Ok(());
    }
    println!("{:<14} {:<7} {:<7} next fire", "kind", "time", "repeat");
    for r in reminders {
        println!(
            "{:<14} {:<7} {:<7} {}",
            r.kind.to_string(),
            r.time_of_day.to_string(),
            format!("{:?}", r.recurrence).to_lowercase(),
            r.next_fire_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn test() -> Result<(), Box<dyn std::error::Error>> {
    let mut scheduler = common::open_scheduler()?;
    if scheduler.notify_now(&Notification::test()) {
        println!("Test notification delivered.");
    } else {
        println!("Test notification was not delivered (permission missing).");
    }
    Ok(())
}
