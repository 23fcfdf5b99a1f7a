//! Foreground scheduler loop.
//!
//! Recovers persisted reminders once, then ticks the scheduler on a
//! fixed interval until Ctrl-C. Reminders set while the loop is running
//! in another process are picked up on the next start.

use std::time::Duration;

use chrono::Local;
use happyday_core::Event;

use crate::common;

pub fn run(interval_secs: u64) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut scheduler = common::open_scheduler()?;

        let report = scheduler.recover()?;
        println!(
            "Recovered {} reminder(s): {} re-armed, {} fired missed, {} dropped.",
            report.examined, report.rearmed, report.fired, report.dropped
        );
        match scheduler.next_wake() {
            Some(at) => println!(
                "Next fire at {}. Press Ctrl-C to stop.",
                at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            ),
            None => println!("No reminders armed. Press Ctrl-C to stop."),
        }

        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for event in scheduler.tick()? {
                        if let Event::ReminderFired { id, delivered, .. } = event {
                            tracing::info!(%id, delivered, "reminder fired");
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("\nStopping.");
                    break;
                }
            }
        }
        Ok(())
    })
}
