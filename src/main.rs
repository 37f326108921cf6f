// Entry point and interactive menu.
//
// [1] picks a dataset, [2] sends it to the analysis service, [3] sets the
// log search term, [4] shows the dashboard, [5] exports the printable report
// with CSV/JSON companions, [6] starts over with a new file.
use chrono::Local;
use equipment_report::canvas::HtmlCanvas;
use equipment_report::config::{self, Config};
use equipment_report::derive::{self, CRITICAL_TEMPERATURE};
use equipment_report::output;
use equipment_report::report::{ReportLayout, PAGE_HEIGHT, PAGE_WIDTH};
use equipment_report::session::{Phase, Session};
use equipment_report::upload::{Dataset, HttpUploadService};
use equipment_report::util;
use std::io::{self, Write};
use std::path::Path;

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn show_notice(session: &mut Session) {
    if let Some(notice) = session.take_notice() {
        println!("Notice: {}\n", notice);
    }
}

fn handle_select(session: &mut Session) {
    let path = prompt("Dataset path (.csv): ");
    if path.is_empty() {
        println!("No file chosen.\n");
        return;
    }
    match Dataset::from_path(Path::new(&path)) {
        Ok(dataset) => {
            println!(
                "Selected {} ({} bytes)\n",
                dataset.file_name,
                util::format_int(dataset.bytes.len() as u64)
            );
            session.select_dataset(dataset);
        }
        Err(e) => eprintln!("Failed to read file: {}\n", e),
    }
}

fn handle_upload(session: &mut Session, service: &HttpUploadService) {
    let file = session
        .selected()
        .map(|d| d.file_name.clone())
        .unwrap_or_default();
    let outcome = session.upload(service, |pct| {
        print!("\rProcessing {}... {}%", file, pct);
        let _ = io::stdout().flush();
    });
    println!();
    match outcome {
        Ok(result) => println!(
            "Analysis ready: {} units, {} categories.\n",
            result.total_count,
            result.type_distribution.len()
        ),
        Err(e) => eprintln!("Analysis not loaded: {}", e),
    }
    show_notice(session);
}

fn handle_search(session: &mut Session) {
    let term = prompt("Search equipment name (empty clears): ");
    session.set_search_term(term);
    if let Some(result) = session.analysis() {
        let hits = derive::filter_by_name(&result.records, session.search_term());
        println!(
            "{} of {} records match.\n",
            util::format_int(hits.len() as u64),
            util::format_int(result.records.len() as u64)
        );
    } else {
        println!("Search saved; it applies once an analysis is loaded.\n");
    }
}

fn handle_dashboard(session: &Session, config: &Config) {
    let Some(view) = session.view() else {
        println!("Error: No analysis loaded. Run an analysis first (option 2).\n");
        return;
    };
    println!();
    for kpi in &view.kpis {
        println!("{:<14} {}", kpi.title, kpi.value);
    }
    println!("\nEquipment types:");
    for (category, count) in view.chart.categories.iter().zip(&view.chart.counts) {
        println!("  {:<20} {}", category, count);
    }

    let note = if session.search_term().is_empty() {
        format!("CRITICAL above {} °C", CRITICAL_TEMPERATURE)
    } else {
        format!("filtered by \"{}\"", session.search_term())
    };
    output::preview_table(
        "Detailed Equipment Log",
        Some(&note),
        &view.table,
        config.preview_rows,
    );
    output::preview_table(
        "Leaderboard",
        Some("lowest temperature per bar first"),
        &view.leaderboard,
        view.leaderboard.len(),
    );
    output::preview_table("History", None, &view.history, view.history.len());
}

fn handle_export(session: &Session, config: &Config) {
    let layout = ReportLayout {
        repeat_table_header: config.repeat_table_header,
        ..ReportLayout::default()
    };
    let mut canvas = HtmlCanvas::new(&config.output_dir, PAGE_WIDTH, PAGE_HEIGHT);
    match session.export_report(&mut canvas, &layout, Local::now().naive_local()) {
        Ok(path) => println!("Report saved to {}", path.display()),
        Err(e) => {
            eprintln!("Report not generated: {}\n", e);
            return;
        }
    }

    if let Some(view) = session.view() {
        let csv_path = config.output_dir.join("equipment_log.csv");
        match output::write_csv(&csv_path, &view.table) {
            Ok(()) => println!("Log table exported to {}", csv_path.display()),
            Err(e) => eprintln!("Write error: {}", e),
        }
    }
    if let Ok(summary) = session.summary() {
        let json_path = config.output_dir.join("summary.json");
        match output::write_json(&json_path, &summary) {
            Ok(()) => println!("Summary exported to {}", json_path.display()),
            Err(e) => eprintln!("Write error: {}", e),
        }
    }
    println!();
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = match config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}; using defaults.", e);
            Config::default()
        }
    };
    let service = match HttpUploadService::new(config.endpoint.clone(), config.timeout) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not set up HTTP client: {}", e);
            return;
        }
    };
    let mut session = Session::new();

    loop {
        let status = match session.phase() {
            Phase::Idle => "idle",
            Phase::Uploading { .. } => "uploading",
            Phase::Ready => "ready",
        };
        println!("Chemical Equipment Parameter Visualizer [{}]", status);
        println!("[1] Choose CSV dataset");
        println!("[2] Run analysis ({})", service.endpoint());
        println!("[3] Search equipment log");
        println!("[4] Show dashboard");
        println!("[5] Export report");
        println!("[6] Analyze new file");
        println!("[0] Exit\n");
        match prompt("Enter choice: ").as_str() {
            "1" => handle_select(&mut session),
            "2" => handle_upload(&mut session, &service),
            "3" => handle_search(&mut session),
            "4" => handle_dashboard(&session, &config),
            "5" => handle_export(&session, &config),
            "6" => {
                session.reset();
                println!("Cleared. Choose a dataset to analyze.\n");
            }
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-6.\n"),
        }
    }
}
