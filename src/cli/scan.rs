//! Scan command implementation.
//!
//! Wires the parsed command line to a [`ScanController`]: progress display,
//! Ctrl-C handling, result printing and the optional report log.

use super::{Cli, OutputFormat};
use crate::config::AppSettings;
use crate::error::CliResult;
use crate::output;
use crate::scanner::{Progress, ScanController, ScanState};
use crate::storage::{OverwritePolicy, ReportLog};
use crate::types::{PortRange, ScanReport};
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

/// Run the scan described by `cli` and print its report.
///
/// Log-file problems are reported but do not fail the command; the scan
/// results have already been printed by then.
pub async fn execute(cli: &Cli, settings: &AppSettings) -> CliResult<ScanReport> {
    let request = cli.request()?;
    let range = cli.port_range()?;
    let mut config = cli.scan_config(settings)?;
    let log = cli.report_log(settings).and_then(confirm_overwrite);

    let progress = cli.shows_progress().then(|| progress_bar(range.len()));
    if let Some(pb) = &progress {
        let pb = pb.clone();
        let verbose = cli.verbose;
        config = config.with_progress(move |p: &Progress<'_>| {
            if verbose {
                pb.println(format!("Port {} is {}", p.outcome.port(), p.outcome.state()));
            }
            if p.outcome.is_open() {
                pb.set_message(format!("found open port {}", p.outcome.port()));
            }
            pb.set_position(p.completed as u64);
        });
    }

    let controller = ScanController::tcp(config);
    let cancel = controller.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing in-flight probes");
            cancel.cancel();
        }
    });

    let header = async {
        if cli.output == OutputFormat::Plain {
            announce_target(&controller, range).await;
        }
    };
    let (result, ()) = tokio::join!(controller.run(request), header);
    interrupt.abort();
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    let report = result?;

    if !report.complete {
        output::print_warning(&format!(
            "scan stopped early; {} of {} ports were probed",
            report.scanned_count,
            report.total_ports()
        ));
    }
    output::print_results(&report, cli.output)?;

    if let Some(log) = log {
        match log.write(&report) {
            Ok(path) if cli.output == OutputFormat::Plain => {
                output::print_success(&format!("Successfully created logfile: {}", path.display()));
            }
            Ok(_) => {}
            Err(e) => output::print_error(&e.to_string()),
        }
    }

    Ok(report)
}

/// Print the header as soon as the controller has resolved the target.
async fn announce_target(controller: &ScanController, range: PortRange) {
    let mut states = controller.subscribe();
    loop {
        let state = *states.borrow_and_update();
        if state == ScanState::Scanning || state.is_terminal() {
            break;
        }
        if states.changed().await.is_err() {
            return;
        }
    }
    // A fast scan may already be finished; the target is still known then.
    if let Some(target) = controller.target() {
        if let Err(e) = output::print_scan_header(target, range) {
            tracing::debug!(error = %e, "could not print scan header");
        }
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

/// Settle what happens to an existing log file before the scan starts.
///
/// Asks on the terminal when the file exists and `--force` was not given.
/// Without a terminal the log keeps its refusing policy and the write will
/// report the conflict.
fn confirm_overwrite(log: ReportLog) -> Option<ReportLog> {
    if log.policy() == OverwritePolicy::Overwrite || !log.exists() {
        return Some(log);
    }

    let term = Term::stderr();
    if !term.is_term() {
        return Some(log);
    }

    let prompt = format!(
        "Log file {} already exists. Overwrite? [y/N] ",
        log.path().display()
    );
    if term.write_str(&prompt).is_err() {
        return Some(log);
    }
    match term.read_line() {
        Ok(answer) if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") => {
            Some(ReportLog::new(log.path(), OverwritePolicy::Overwrite))
        }
        _ => {
            output::print_warning("keeping the existing file; the report will not be logged");
            None
        }
    }
}
