use colored::Colorize;
use dtrack_policy_core::{ApplyReport, Pass, PolicyChange};

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// One-line summary of a finished run on stdout.
pub fn print_report(policy_name: &str, report: &ApplyReport, dry_run: bool) {
    if report.is_noop() {
        print_success(&format!("policy {} already up to date", policy_name.cyan()));
        return;
    }
    let verb = if dry_run { "would apply" } else { "applied" };
    let mut msg = format!(
        "policy {}: {verb} {} change(s)",
        policy_name.cyan(),
        report.changes()
    );
    match report.policy {
        PolicyChange::Created => msg.push_str(", policy created"),
        PolicyChange::Updated => msg.push_str(", attributes updated"),
        PolicyChange::Unchanged => {}
    }
    for pass in Pass::ORDER {
        let counts = report.pass(pass);
        if counts.changes() > 0 {
            msg.push_str(&format!(
                ", {}: -{} +{}",
                pass.stage(),
                counts.removed,
                counts.added
            ));
        }
    }
    if report.skipped() > 0 {
        msg.push_str(&format!(", {} skipped", report.skipped()).yellow().to_string());
    }
    print_success(&msg);
}
