use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use members_dashboard::config::init_logging;
use members_dashboard::dashboard::{Command, Dashboard, Page, Reply, View};
use members_dashboard::store::DEFAULT_PATH;
use members_dashboard::table::Sheet;

#[derive(Parser)]
#[command(name = "members-cli")]
#[command(author, version, about = "Log points and attendance in the members workbook")]
struct Cli {
    /// Workbook holding the `members` and `event_attendance` sheets
    #[arg(short, long, global = true, default_value = DEFAULT_PATH)]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the ranked leaderboard
    Leaderboard,

    /// List the sheets in the workbook and print one of them
    Sheets {
        /// Sheet to print (default: members, or the first sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Add (or with a negative value, deduct) points for a student
    #[command(alias = "log")]
    LogPoints {
        student_id: String,
        #[arg(allow_negative_numbers = true)]
        points: i64,
    },

    /// Add a new member; the id is generated when omitted
    AddMember {
        name: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        points: i64,
    },

    /// Record attendance for an event by member name
    RecordEvent {
        event: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let mut dashboard = Dashboard::new(cli.data);

    let reply = match cli.command {
        Commands::Leaderboard => {
            dashboard.handle(Command::Navigate {
                page: Page::Leaderboard,
            })
        }
        Commands::Sheets { sheet } => match sheet {
            Some(name) => dashboard.handle(Command::SelectSheet { name }),
            None => dashboard.render(),
        },
        Commands::LogPoints { student_id, points } => {
            dashboard.handle(Command::LogPoints { student_id, points })
        }
        Commands::AddMember { name, id, points } => dashboard.handle(Command::AddMember {
            student_id: id.unwrap_or_default(),
            name,
            base_points: points,
        }),
        Commands::RecordEvent { event, names } => dashboard.handle(Command::CreateEvent {
            event_name: event,
            attendees: names,
        }),
    };

    report(reply)
}

fn report(reply: Reply) -> ExitCode {
    let code = match &reply.outcome {
        Some(Err(e)) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
        Some(Ok(success)) => {
            let message = success.message();
            if !message.is_empty() {
                println!("{}", message);
            }
            ExitCode::SUCCESS
        }
        None => ExitCode::SUCCESS,
    };

    print_view(&reply.view);
    code
}

fn print_view(view: &View) {
    match view {
        View::MissingWorkbook { path } => {
            eprintln!(
                "No workbook at '{}'. Supply the file or add a member to create it.",
                path.display()
            );
        }
        View::LoadFailed { message } => eprintln!("Failed to load workbook: {}", message),
        View::NoSheets => println!("No sheets found in the workbook."),
        View::Overview {
            sheet_names,
            selected,
            table,
            ..
        } => {
            println!("Sheets: {}", sheet_names.join(", "));
            println!();
            println!("[{}]", selected);
            print_sheet(table);
        }
        View::Leaderboard { rows } => {
            println!("{:>4}  {:<12} {:<24} {:>8} {:>7}", "Rank", "StudentID", "Name", "Points", "Events");
            for row in rows {
                println!(
                    "{:>4}  {:<12} {:<24} {:>8} {:>7}",
                    row.rank, row.student_id, row.name, row.points, row.events_attended
                );
            }
        }
        View::LogPoints { members } | View::AddMember { members, .. } => print_sheet(members),
        View::Events { events, .. } => {
            for summary in events {
                println!("{}\t{}", summary.event, summary.attendees);
            }
        }
    }
}

fn print_sheet(sheet: &Sheet) {
    println!("{}", sheet.columns().join("\t"));
    for row in sheet.rows() {
        let cells: Vec<String> = row.iter().map(|c| c.as_text()).collect();
        println!("{}", cells.join("\t"));
    }
}
