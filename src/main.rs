use challenge_buddy::{
    config::{challenge, database},
    core::{
        challenge::ChallengeStatus,
        clock::{Clock, SystemClock},
        countdown::DeadlineSnapshot,
        dates,
        gating::GatingDecision,
    },
    db::{cohorts, meals},
    errors::{Error, Result},
    session::ChallengeSession,
    sync::{SyncHandle, SyncWorker},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn print_gating(decision: &GatingDecision) {
    if decision.should_block_dashboard {
        println!(
            "Dashboard blocked: {:?} (week {})",
            decision.blocking_reason,
            decision.week_needing_selection.unwrap_or_default()
        );
    } else if decision.show_banner {
        println!(
            "Banner ({:?}): choose meals for week {}",
            decision.banner_urgency,
            decision.week_needing_selection.unwrap_or_default()
        );
    } else {
        println!("Dashboard open");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the challenge configuration
    let config = challenge::load_default_config()
        .inspect(|_| info!("Loaded challenge configuration."))
        .inspect_err(|e| error!("Failed to load challenge configuration: {}", e))?;

    // 4. Initialize database
    std::fs::create_dir_all("data")?;
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed reference data
    cohorts::seed_cohorts(&db, &config.cohorts)
        .await
        .inspect(|n| info!("Seeded {} new cohorts.", n))
        .inspect_err(|e| error!("Failed to seed cohorts: {}", e))?;
    meals::seed_meal_options(&db, &config.meal_options)
        .await
        .inspect(|n| info!("Wrote {} meal options.", n))
        .inspect_err(|e| error!("Failed to seed meal options: {}", e))?;

    // 6. Resolve the user, enrolling them if a cohort is given
    let user_id = env::var("CHALLENGE_USER_ID")
        .inspect_err(|e| error!("CHALLENGE_USER_ID not found: {}", e))
        .map_err(Error::EnvVar)?;
    let clock = Arc::new(SystemClock);
    if let Ok(cohort_id) = env::var("CHALLENGE_COHORT_ID") {
        cohorts::assign_user_to_cohort(&db, &user_id, &cohort_id, clock.now())
            .await
            .inspect_err(|e| error!("Failed to enrol {} in {}: {}", user_id, cohort_id, e))?;
    }

    // 7. Load the session with a background sync worker
    let (handle, receiver) = SyncHandle::channel();
    let worker = SyncWorker::new(db.clone(), user_id.clone(), receiver).spawn();
    let mut session = ChallengeSession::load(
        &db,
        &user_id,
        clock,
        handle,
        config.settings.habit_history_days,
    )
    .await?;
    session.check_week1_selection(&db).await;

    // 8. Report
    let summary = session.dashboard_summary();
    println!("User: {}", session.user_id());
    println!("Status: {}", summary.status);
    if summary.status == ChallengeStatus::Active {
        println!(
            "Day {} of {} (week {}), {} days remaining",
            summary.current_day, summary.total_days, summary.current_week, summary.days_remaining
        );
    }
    println!(
        "Streak: {} (longest {})",
        summary.streak.current_streak, summary.streak.longest_streak
    );
    println!(
        "Today: checked in {}, can check in {}",
        summary.checked_in_today, summary.can_check_in_today
    );
    print_gating(&summary.gating);
    if let (Some(week), Some(cohort)) = (summary.gating.week_needing_selection, session.cohort()) {
        let deadline = dates::week_deadline(cohort.start_date, week);
        let snapshot = DeadlineSnapshot::at(deadline, session.now());
        println!("Week {} deadline: {}", week, snapshot.text);
    }

    for week in session.accessible_weeks() {
        if let Some(status) = session.meal_week_status(week) {
            println!(
                "Week {}: {}/{} meals, locked {}, deadline {} ({})",
                status.week,
                status.selected_count,
                status.required_count,
                status.is_locked,
                status.deadline_text,
                status.countdown
            );
        }
    }
    if session.menu().is_empty() {
        warn!("No meal options configured.");
    }

    // 9. Flush pending writes
    drop(session);
    match worker.await {
        Ok(0) => {}
        Ok(failures) => warn!("{} pending writes failed to sync.", failures),
        Err(e) => error!("Sync worker panicked: {}", e),
    }

    Ok(())
}
