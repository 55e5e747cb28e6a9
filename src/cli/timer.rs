use std::{cell::RefCell, io::Write};

use ansi_term::Colour;
use anyhow::Result;
use chrono::Duration;
use clap::Parser;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    select,
    sync::broadcast::{error::RecvError, Receiver},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    tracker::{
        database::Database,
        entities::{EntryId, NewEntry, TicketId},
        store::Store,
        timer::{
            shutdown::detect_shutdown,
            ticker::{TimerTicker, TICK_INTERVAL},
            Timer, TimerEvent, TimerSession,
        },
    },
    utils::{
        clock::DefaultClock,
        time::{format_duration, format_hours},
    },
};

use super::{find_ticket, Context};

#[derive(Debug, Parser)]
pub struct TimerCommand {
    #[arg(help = "Id of the ticket to time, for example APP-12")]
    ticket: String,
    #[arg(short, long, help = "Note attached to the logged entry")]
    note: Option<String>,
}

/// Line typed by the user while the timer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    Stop,
    Switch(String),
    Status,
    Unknown(String),
}

fn parse_session_command(line: &str) -> SessionCommand {
    let line = line.trim();
    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };
    match (command.to_lowercase().as_str(), argument) {
        ("" | "stop" | "q" | "quit", "") => SessionCommand::Stop,
        ("status", "") => SessionCommand::Status,
        ("switch", key) if !key.is_empty() => SessionCommand::Switch(key.to_string()),
        _ => SessionCommand::Unknown(line.to_string()),
    }
}

/// Runs a live timer until the user stops it or presses Ctrl-C, then logs the session.
pub async fn process_timer_command(
    TimerCommand { ticket, note }: TimerCommand,
    context: &Context,
) -> Result<()> {
    let store = context.database.load().await?;
    let ticket = find_ticket(&store, &ticket)?.id;

    let timer = RefCell::new(Timer::new(Box::new(DefaultClock)));
    let events = timer.borrow().subscribe();
    let shutdown = CancellationToken::new();
    timer.borrow_mut().start(ticket);
    println!("Enter or `stop` to finish, `switch <ticket>` to time another ticket. Ctrl-C also finishes");

    let ticker = TimerTicker::new(
        &timer,
        shutdown.clone(),
        TICK_INTERVAL,
        Box::new(DefaultClock),
    );

    let (_, _, _, session) = tokio::join!(
        detect_shutdown(shutdown.clone()),
        ticker.run(),
        render_events(&store, events, shutdown.clone()),
        read_commands(&store, &timer, shutdown.clone()),
    );
    println!();

    let saved = match session {
        Some(session) => save_session(&context.database, session, note).await?,
        None => None,
    };
    match saved {
        Some((id, hours)) => println!("Logged {} as entry {id}", format_hours(hours)),
        None => println!("Nothing to save"),
    }
    Ok(())
}

/// Logs `session` as a time entry. Sessions without any duration are dropped and give `None`.
async fn save_session(
    database: &Database,
    session: TimerSession,
    note: Option<String>,
) -> Result<Option<(EntryId, f64)>> {
    if session.is_empty() {
        warn!("Discarding empty session of ticket {}", session.ticket);
        return Ok(None);
    }
    let hours = session.hours();
    let result = database
        .update(|store| {
            Ok(store.log_time(NewEntry {
                ticket: Some(session.ticket),
                hours,
                logged_at: session.ended_at,
                note,
            })?)
        })
        .await;
    match result {
        Ok(id) => {
            info!("Saved timer session as entry {id}");
            Ok(Some((id, hours)))
        }
        Err(e) => {
            error!("Failed to save timer session {session:?}: {e:?}");
            Err(e)
        }
    }
}

/// Moves the timer to `ticket`. Switching to the ticket already being timed keeps the running
/// session and returns false.
fn apply_switch(timer: &mut Timer, ticket: TicketId) -> bool {
    if timer.active_ticket() == Some(ticket) {
        return false;
    }
    timer.start(ticket);
    true
}

fn ticket_key(store: &Store, ticket: TicketId) -> &str {
    store.ticket(ticket).map(|t| t.key.as_str()).unwrap_or_default()
}

fn timer_line(key: &str, elapsed: Duration) -> String {
    format!(
        "{} {}",
        Colour::Cyan.bold().paint(key),
        format_duration(elapsed.num_milliseconds() as f64 / 1000.)
    )
}

/// Prints the running timer in place on every tick.
async fn render_events(store: &Store, mut events: Receiver<TimerEvent>, shutdown: CancellationToken) {
    let mut stdout = std::io::stdout();
    loop {
        let event = select! {
            _ = shutdown.cancelled() => return,
            event = events.recv() => event,
        };
        match event {
            Ok(TimerEvent::Started { ticket }) => {
                print!("\n{}", timer_line(ticket_key(store, ticket), Duration::zero()));
            }
            Ok(TimerEvent::Tick { ticket, elapsed }) => {
                print!("\r{}", timer_line(ticket_key(store, ticket), elapsed));
            }
            Ok(TimerEvent::Stopped { .. }) => return,
            Err(RecvError::Lagged(skipped)) => {
                debug!("Renderer skipped {skipped} timer events");
                continue;
            }
            Err(RecvError::Closed) => return,
        }
        if let Err(e) = stdout.flush() {
            debug!("Failed to flush stdout {e}");
        }
    }
}

/// Reads commands from stdin until the session is stopped. Stops the timer on the way out, so the
/// returned session covers the last timed ticket.
async fn read_commands(
    store: &Store,
    timer: &RefCell<Timer>,
    shutdown: CancellationToken,
) -> Option<TimerSession> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Stdin closed");
                break;
            }
            Err(e) => {
                error!("Failed to read stdin {e}");
                break;
            }
        };
        match parse_session_command(&line) {
            SessionCommand::Stop => break,
            SessionCommand::Status => {
                let timer = timer.borrow();
                if let Some(ticket) = timer.active_ticket() {
                    println!("\n{}", timer_line(ticket_key(store, ticket), timer.elapsed()));
                }
            }
            SessionCommand::Switch(key) => match find_ticket(store, &key) {
                Ok(ticket) => {
                    let previous = timer.borrow().active_ticket();
                    if !apply_switch(&mut timer.borrow_mut(), ticket.id) {
                        println!("\nAlready timing {}", ticket.key);
                    } else if previous.is_some() {
                        println!("\nTime on the previous ticket is not saved");
                    }
                }
                Err(e) => println!("\n{e}"),
            },
            SessionCommand::Unknown(line) => {
                println!("\nUnknown command {line:?}. Use `stop` or `switch <ticket>`");
            }
        }
    }
    let session = timer.borrow_mut().stop();
    shutdown.cancel();
    session
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        tracker::{
            database::Database,
            entities::TicketId,
            store::{tests::ticket, Store},
            timer::{Timer, TimerSession},
        },
        utils::clock::MockClock,
    };

    use super::{apply_switch, parse_session_command, save_session, timer_line, SessionCommand};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn timer_with_moments(moments: Vec<i64>) -> Timer {
        let mut clock = MockClock::new();
        let mut moments = moments.into_iter().map(at);
        clock
            .expect_time()
            .returning(move || moments.next().expect("clock read more often than expected"));
        Timer::new(Box::new(clock))
    }

    #[test]
    fn test_switch_to_active_ticket_keeps_session() {
        let mut timer = timer_with_moments(vec![0, 600, 900]);
        timer.start(TicketId(1));
        timer.tick();

        assert!(!apply_switch(&mut timer, TicketId(1)));
        assert_eq!(timer.elapsed(), Duration::seconds(600));

        let session = timer.stop().unwrap();
        assert_eq!(session.started_at, at(0));
        assert_eq!(session.duration(), Duration::seconds(900));
    }

    #[test]
    fn test_switch_to_other_ticket_restarts() {
        let mut timer = timer_with_moments(vec![0, 300, 360]);
        timer.start(TicketId(1));

        assert!(apply_switch(&mut timer, TicketId(2)));

        let session = timer.stop().unwrap();
        assert_eq!(session.ticket, TicketId(2));
        assert_eq!(session.started_at, at(300));
    }

    async fn database_with_ticket(dir: &std::path::Path) -> Result<(Database, TicketId)> {
        let database = Database::new(dir.to_owned())?;
        let mut store = Store::new();
        let id = ticket(&mut store, "APP-1", None);
        database.save(&store).await?;
        Ok((database, id))
    }

    #[tokio::test]
    async fn test_save_session_logs_entry() -> Result<()> {
        let dir = tempdir()?;
        let (database, id) = database_with_ticket(dir.path()).await?;
        let session = TimerSession {
            ticket: id,
            started_at: at(0),
            ended_at: at(5400),
        };

        let saved = save_session(&database, session, Some(" focus ".into())).await?;

        let (entry_id, hours) = saved.unwrap();
        assert_eq!(hours, 1.5);
        let store = database.load().await?;
        let entry = store.entry(entry_id).unwrap();
        assert_eq!(entry.ticket, Some(id));
        assert_eq!(entry.hours, 1.5);
        assert_eq!(entry.logged_at, at(5400));
        assert_eq!(entry.note.as_deref(), Some("focus"));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_session_drops_empty_session() -> Result<()> {
        let dir = tempdir()?;
        let (database, id) = database_with_ticket(dir.path()).await?;

        for ended_at in [at(30), at(10)] {
            let session = TimerSession {
                ticket: id,
                started_at: at(30),
                ended_at,
            };
            assert_eq!(save_session(&database, session, None).await?, None);
        }

        assert_eq!(database.load().await?.entries().count(), 0);
        Ok(())
    }

    #[test]
    fn test_parse_session_command() {
        assert_eq!(parse_session_command(""), SessionCommand::Stop);
        assert_eq!(parse_session_command("  STOP "), SessionCommand::Stop);
        assert_eq!(parse_session_command("q"), SessionCommand::Stop);
        assert_eq!(parse_session_command("status"), SessionCommand::Status);
        assert_eq!(
            parse_session_command("switch  APP-2 "),
            SessionCommand::Switch("APP-2".into())
        );
        assert_eq!(
            parse_session_command("switch"),
            SessionCommand::Unknown("switch".into())
        );
        assert_eq!(
            parse_session_command("stop now"),
            SessionCommand::Unknown("stop now".into())
        );
    }

    #[test]
    fn test_timer_line_formats_elapsed() {
        let line = timer_line("APP-1", Duration::seconds(3725));
        assert!(line.contains("APP-1"));
        assert!(line.ends_with("1h 2min 5s"));
    }
}
