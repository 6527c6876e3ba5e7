use tracing::info;

use schedcore::clock::{Clock, SystemClock};
use schedcore::config::SchedulerConfig;
use schedcore::engine::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = SchedulerConfig::from_env()?;
    let store = match &config.data_path {
        Some(path) => {
            info!("seeding store from {}", path.display());
            InMemoryStore::from_json(&std::fs::read_to_string(path)?)?
        }
        None => InMemoryStore::new(),
    };
    let clock = SystemClock::new(config.local_zone);
    let now = clock.now();
    info!("local time {now} ({})", config.local_zone);

    let scheduler = Scheduler::new(store, clock, config)?;
    let snapshot = scheduler.snapshot();
    info!(
        "{} customers, {} appointments, {} this week",
        scheduler.customers()?.len(),
        snapshot.len(),
        filter_view(snapshot, ViewFilter::Week, now.date()).len()
    );

    println!("{}\n", scheduler.login_notice());

    let hours = scheduler.config().business_hours.bookable_hours(scheduler.config().local_zone, now.date())?;
    println!("Bookable hours on {}: {hours:?}\n", now.date().format("%Y-%m-%d"));

    println!("Appointments by type and month\n{}\n", render_type_then_month(&count_by_type_then_month(snapshot)));
    println!("Appointments by date\n{}\n", render_by_date(&count_by_date(snapshot)));
    println!("Schedule by contact\n{}", render_by_contact(&group_by_contact(snapshot)));
    Ok(())
}
