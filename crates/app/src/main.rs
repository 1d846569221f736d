use anyhow::bail;
use chrono::Local;
use cinepay_booking::{PaymentOutcome, PaymentSettings, TicketView, ViewEvent};
use cinepay_client::{BookingClient, ClientConfig};
use cinepay_config::Config;
use cinepay_models::{PaymentSession, Ticket, WorkflowState};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::OffsetTime;

// --- CLI definition ---

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser)]
#[command(name = "cinepay")]
#[command(about = "Movie ticket reservation and payment client")]
#[command(version)]
struct Cli {
    /// Log level (overrides config)
    #[arg(short, long, global = true)]
    log_level: Option<LogLevel>,

    /// Display log timestamps in UTC (default: local time)
    #[arg(long, global = true)]
    utc: bool,

    /// Booking service base URL (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token sent with every request (overrides config)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a reserved ticket
    Show {
        /// Ticket identifier
        ticket_id: String,
    },
    /// Pay for a reserved ticket by bank transfer
    Pay {
        /// Ticket identifier
        ticket_id: String,
    },
    /// Cancel (delete) a reserved ticket
    Cancel {
        /// Ticket identifier
        ticket_id: String,
    },
}

fn merge_cli(mut config: Config, cli: &Cli) -> Config {
    if let Some(level) = &cli.log_level { config.log_level = level.to_string(); }
    if cli.utc { config.utc = true; }
    if let Some(url) = &cli.api_url { config.api_base_url = url.clone(); }
    if let Some(token) = &cli.token { config.auth_token = Some(token.clone()); }
    config
}

// --- Logging ---

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.utc {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_timer(OffsetTime::new(
                time::UtcOffset::UTC,
                time::macros::format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
                ),
            ))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_timer(LocalTimer)
            .init();
    }
}

struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

// --- Rendering ---

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

fn print_ticket(t: &Ticket) {
    println!("{}", or_na(&t.movie_name));
    println!("{}", "-".repeat(40));
    println!("{:<14} {}", "Theater:", or_na(&t.theater_name));
    println!("{:<14} {}", "Showtime:", or_na(&t.showtime));
    println!("{:<14} {}", "Seat Number:", or_na(&t.seat_number));
    println!("{:<14} {}", "Ticket Price:", t.price);
    let status = t.status.as_ref().map(ToString::to_string);
    println!("{:<14} {}", "Status:", or_na(&status));
}

fn print_payment_details(s: &PaymentSession) {
    println!("Transfer the ticket price to the virtual account below.");
    println!("{:<14} {}", "Order ID:", s.order_id);
    println!("{:<14} {}", "VA Number:", s.va_number);
}

fn render(state: &WorkflowState) -> anyhow::Result<()> {
    match state {
        WorkflowState::Idle => println!("No ticket selected."),
        WorkflowState::Loading => println!("Loading..."),
        WorkflowState::Ready(ticket) => print_ticket(ticket),
        WorkflowState::PaymentPending(session) => print_payment_details(session),
        WorkflowState::Failed(message) => bail!("{message}"),
    }
    Ok(())
}

fn drain(events: &mut UnboundedReceiver<ViewEvent>) -> Vec<ViewEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        debug!("View event: {event:?}");
        out.push(event);
    }
    out
}

// --- Main ---

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = merge_cli(Config::load(), &cli);
    init_logging(&config);

    info!("Booking service at {}", config.api_base_url);
    let client = BookingClient::new(&ClientConfig {
        base_url: config.api_base_url.clone(),
        auth_token: config.auth_token.clone(),
        timeout: config.request_timeout(),
    })?;
    let settings = PaymentSettings {
        bank: config.bank.clone(),
        unrecognized_availability: config.unrecognized_availability,
    };

    match cli.command {
        Commands::Show { ticket_id } => {
            let (view, _events) = TicketView::new(ticket_id, client, settings);
            view.load().await;
            render(&view.state())?;
        }
        Commands::Pay { ticket_id } => {
            let (view, mut events) = TicketView::new(ticket_id, client, settings);
            view.load().await;
            if let state @ (WorkflowState::Failed(_) | WorkflowState::Idle) = view.state() {
                return render(&state);
            }

            let outcome = view.pay().await;
            for event in drain(&mut events) {
                if let ViewEvent::OpenPaymentDetails(session) = event {
                    print_payment_details(&session);
                }
            }
            match outcome {
                Some(PaymentOutcome::NotAvailable(message)) => {
                    println!("Ticket {} is not available for booking: {message}", view.ticket_id());
                }
                Some(PaymentOutcome::Failed(e)) => bail!("{e}"),
                Some(PaymentOutcome::Resolved(_)) | None => {}
            }
        }
        Commands::Cancel { ticket_id } => {
            let (view, mut events) = TicketView::new(ticket_id, client, settings);
            view.cancel().await;
            if drain(&mut events).contains(&ViewEvent::Close) {
                println!("Ticket {} deleted.", view.ticket_id());
            } else {
                render(&view.state())?;
            }
        }
    }

    Ok(())
}
