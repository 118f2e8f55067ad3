use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::debug;

use roombook::config::Config;
use roombook::form::{self, BookingForm, FormController, SubmitOutcome, SubmitPhase};
use roombook::model::{Booking, BookingId};
use roombook::schedule::{BookingStore, Scheduler};
use roombook::slot::FileStorage;

#[derive(Parser)]
#[command(name = "roombook", version)]
#[command(about = "Meeting room bookings kept in a local slot file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the slot files (overrides ROOMBOOK_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage key of the booking list (overrides ROOMBOOK_SLOT)
    #[arg(long, global = true)]
    slot: Option<String>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a booking and store it if the room is free.
    Book {
        #[arg(long, default_value = "")]
        room: String,
        /// YYYY-MM-DD
        #[arg(long, default_value = "")]
        date: String,
        /// HH:MM
        #[arg(long, default_value = "")]
        start: String,
        /// HH:MM
        #[arg(long, default_value = "")]
        end: String,
        #[arg(long, default_value = "")]
        topic: String,
        #[arg(long, default_value = "")]
        chairman: String,
        /// Requester name
        #[arg(long, default_value = "")]
        name: String,
        /// Requester phone
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// List bookings by date and start time.
    List,
    /// Show the free time of a room on a date.
    Check {
        #[arg(long)]
        room: String,
        #[arg(long)]
        date: NaiveDate,
    },
    /// List the bookable rooms.
    Rooms,
    /// Delete a booking.
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    roombook::observability::init_tracing(cli.verbose);

    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(slot) = cli.slot {
        config.slot = slot;
    }
    debug!("slot {:?} in {}", config.slot, config.data_dir.display());

    let storage = FileStorage::open(&config.data_dir)?;
    let scheduler = Scheduler::new(
        BookingStore::new(&storage, config.slot.clone()),
        config.rooms.clone(),
    );

    match cli.command {
        Commands::Book {
            room,
            date,
            start,
            end,
            topic,
            chairman,
            name,
            phone,
        } => {
            let booking_form = BookingForm {
                room,
                date,
                start_time: start,
                end_time: end,
                topic,
                chairman,
                name,
                phone,
            };
            let controller =
                FormController::new(&scheduler, Local::now().date_naive(), config.submit_delay);
            let outcome = controller
                .submit_with(&booking_form, |phase| {
                    if phase == SubmitPhase::Saving {
                        eprintln!("saving...");
                    }
                })
                .await?;
            match outcome {
                SubmitOutcome::Saved(booking) => {
                    println!("{}", form::MSG_SAVED);
                    print_booking(&booking);
                }
                SubmitOutcome::Blocked(errors) => {
                    eprintln!("{}", form::MSG_CHECK_INPUT);
                    for (field, msg) in errors.iter() {
                        eprintln!("  {field}: {msg}");
                    }
                    std::process::exit(2);
                }
            }
        }
        Commands::List => {
            let bookings = scheduler.bookings()?;
            if bookings.is_empty() {
                println!("{}", form::MSG_NO_BOOKINGS);
            }
            for booking in &bookings {
                print_booking(booking);
                println!();
            }
        }
        Commands::Check { room, date } => {
            let room = scheduler.resolve_room(&room)?;
            let free = scheduler.free_spans(&room, date)?;
            if free.is_empty() {
                println!("{room} is fully booked on {date}");
            }
            for span in free {
                println!("{span} ({} min)", span.duration_minutes());
            }
        }
        Commands::Rooms => {
            for room in config.rooms.iter() {
                println!("{room}");
            }
        }
        Commands::Delete { id, yes } => {
            let id = BookingId::from(id);
            if !yes && !confirm(&format!("delete booking {id}? [y/N] "))? {
                println!("kept {id}");
                return Ok(());
            }
            if scheduler.cancel(&id)? {
                println!("{}", form::MSG_DELETED);
            } else {
                eprintln!("no booking with id {id}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_booking(b: &Booking) {
    println!("{}  {}  {}-{}", b.room, b.date, b.start_time, b.end_time);
    println!("  id:        {}", b.id);
    println!("  topic:     {}", b.topic);
    println!("  chairman:  {}", b.chairman);
    println!("  booked by: {} ({})", b.name, b.phone);
    println!("  created:   {}", b.created_at);
}

fn confirm(prompt: &str) -> io::Result<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}
